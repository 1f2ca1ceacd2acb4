//! Documentation search backend

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::{with_query, Backend, HttpClient};
use crate::types::SearchResult;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Scope attribute key understood by the search API
const GUIDE_ATTRIBUTE: &str = "aws-docs-search-guide";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchBody<'a> {
    text_query: TextQuery<'a>,
    context_attributes: [ContextAttribute<'a>; 1],
    accept_suggestion_body: &'static str,
    locales: [&'static str; 1],
}

#[derive(Debug, Serialize)]
struct TextQuery<'a> {
    input: &'a str,
}

#[derive(Debug, Serialize)]
struct ContextAttribute<'a> {
    key: &'static str,
    value: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    suggestions: Vec<Suggestion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Suggestion {
    #[serde(default)]
    text_excerpt_suggestion: Option<TextExcerpt>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextExcerpt {
    #[serde(default)]
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    suggestion_body: Option<String>,
    #[serde(default)]
    context: Option<String>,
}

impl TextExcerpt {
    /// First non-empty of summary, suggestion body and context
    fn best_context(&self) -> String {
        [&self.summary, &self.suggestion_body, &self.context]
            .into_iter()
            .flatten()
            .find(|text| !text.is_empty())
            .cloned()
            .unwrap_or_default()
    }
}

/// Query the documentation search API
pub(crate) async fn search_documentation(
    config: &GatewayConfig,
    phrase: &str,
    limit: usize,
) -> Result<Vec<SearchResult>, GatewayError> {
    debug!(phrase = %phrase, "Searching documentation");

    let client = HttpClient::new(config, Backend::Documentation, config.api_timeout)?;
    let url = with_query(
        &config.search_api_url,
        &[("session", config.session_id.as_str())],
    )?;
    let body = SearchBody {
        text_query: TextQuery { input: phrase },
        context_attributes: [ContextAttribute {
            key: GUIDE_ATTRIBUTE,
            value: &config.search_guide,
        }],
        accept_suggestion_body: "RawText",
        locales: ["en_us"],
    };

    let response: SearchResponse = client.post_json(&url, &body).await?;
    Ok(parse_search_results(response, limit))
}

/// Normalize raw suggestions, ranking by position in the raw list
pub(crate) fn parse_search_results(response: SearchResponse, limit: usize) -> Vec<SearchResult> {
    response
        .suggestions
        .into_iter()
        .take(limit)
        .enumerate()
        .filter_map(|(i, suggestion)| {
            let excerpt = suggestion.text_excerpt_suggestion?;
            let context = excerpt.best_context();
            Some(SearchResult {
                rank_order: i + 1,
                url: excerpt.link,
                title: excerpt.title,
                context: Some(context),
            })
        })
        .collect()
}
