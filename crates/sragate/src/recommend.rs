//! Recommendation aggregation
//!
//! One payload per page carries four optional category groups. Missing
//! groups or items contribute nothing; only a failed fetch or an undecodable
//! body is reported, as a single synthetic record.

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::{with_query, Backend, HttpClient};
use crate::relevance::is_recommendation_related;
use crate::types::RecommendationResult;
use futures::future::join_all;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, error, warn};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RecommendationPayload {
    #[serde(default)]
    highly_rated: Option<Group<Item>>,
    #[serde(default)]
    journey: Option<Group<Intent>>,
    #[serde(default)]
    new: Option<Group<Item>>,
    #[serde(default)]
    similar: Option<Group<Item>>,
}

#[derive(Debug, Deserialize)]
struct Group<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Item {
    #[serde(default)]
    url: String,
    #[serde(default)]
    asset_title: String,
    #[serde(default, rename = "abstract")]
    summary: Option<String>,
    #[serde(default)]
    date_created: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Intent {
    #[serde(default)]
    intent: Option<String>,
    #[serde(default)]
    urls: Vec<Item>,
}

fn items<T>(group: Option<Group<T>>) -> Vec<T> {
    group.map(|g| g.items).unwrap_or_default()
}

/// Flatten the category groups in highly rated, journey, new, similar order
pub(crate) fn parse_recommendations(payload: RecommendationPayload) -> Vec<RecommendationResult> {
    let mut results = Vec::new();

    for item in items(payload.highly_rated) {
        results.push(RecommendationResult {
            url: item.url,
            title: item.asset_title,
            context: item.summary,
        });
    }

    for group in items(payload.journey) {
        let context = group
            .intent
            .filter(|intent| !intent.is_empty())
            .map(|intent| format!("Intent: {}", intent));
        for item in group.urls {
            results.push(RecommendationResult {
                url: item.url,
                title: item.asset_title,
                context: context.clone(),
            });
        }
    }

    for item in items(payload.new) {
        let context = match item.date_created.filter(|d| !d.is_empty()) {
            Some(date) => format!("New content added on {}", date),
            None => "New content".to_string(),
        };
        results.push(RecommendationResult {
            url: item.url,
            title: item.asset_title,
            context: Some(context),
        });
    }

    for item in items(payload.similar) {
        results.push(RecommendationResult {
            url: item.url,
            title: item.asset_title,
            context: Some(item.summary.unwrap_or_else(|| "Similar content".to_string())),
        });
    }

    results
}

/// Security relevant items first, then the rest in input order, up to `limit`
pub fn prioritize(results: Vec<RecommendationResult>, limit: usize) -> Vec<RecommendationResult> {
    let (mut relevant, rest): (Vec<_>, Vec<_>) = results.into_iter().partition(|r| is_recommendation_related(&r.url, &r.title, r.context.as_deref()));
    if relevant.len() < limit {
        let room = limit - relevant.len();
        relevant.extend(rest.into_iter().take(room));
    }
    relevant.truncate(limit);
    relevant
}

async fn fetch_recommendations(
    config: &GatewayConfig,
    client: &HttpClient,
    url: &str,
) -> Result<Vec<RecommendationResult>, GatewayError> {
    let target = with_query(
        &config.recommendations_api_url,
        &[("path", url), ("session", config.session_id.as_str())],
    )?;
    let payload: RecommendationPayload = client.get_json(&target).await?;
    Ok(parse_recommendations(payload))
}

fn recommendation_client(config: &GatewayConfig) -> Result<HttpClient, GatewayError> {
    HttpClient::new(config, Backend::Documentation, config.api_timeout)
}

/// Recommendations for one page
pub(crate) async fn recommend(
    config: &GatewayConfig,
    url: &str,
    limit: usize,
) -> Vec<RecommendationResult> {
    debug!(url = %url, limit, "Getting recommendations");

    let fetched = match recommendation_client(config) {
        Ok(client) => fetch_recommendations(config, &client, url).await,
        Err(e) => Err(e),
    };

    match fetched {
        Ok(results) => {
            let prioritized = prioritize(results, limit);
            debug!(url = %url, count = prioritized.len(), "Found recommendations");
            prioritized
        }
        Err(e) => {
            let message = format!("Error getting security recommendations: {}", e);
            error!("{}", message);
            vec![RecommendationResult::error(message)]
        }
    }
}

/// Recommendations for many pages, at most `config.batch_size` in flight
///
/// A page whose request fails maps to an empty list.
pub(crate) async fn recommend_many(
    config: &GatewayConfig,
    urls: &[String],
    limit: usize,
) -> HashMap<String, Vec<RecommendationResult>> {
    debug!(count = urls.len(), "Getting recommendations for multiple pages");

    let client = match recommendation_client(config) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to create recommendation client");
            return urls.iter().map(|u| (u.clone(), Vec::new())).collect();
        }
    };

    let mut results = HashMap::with_capacity(urls.len());
    for wave in urls.chunks(config.batch_size.max(1)) {
        let fetched = join_all(
            wave.iter()
                .map(|url| fetch_recommendations(config, &client, url)),
        )
        .await;

        for (url, outcome) in wave.iter().zip(fetched) {
            let entry = match outcome {
                Ok(found) => prioritize(found, limit),
                Err(e) => {
                    warn!(url = %url, error = %e, "Recommendation request failed");
                    Vec::new()
                }
            };
            results.insert(url.clone(), entry);
        }
    }
    results
}
