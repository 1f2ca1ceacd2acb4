//! Core types for the gateway

use crate::error::GatewayError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest and largest accepted result limit
pub const LIMIT_RANGE: std::ops::RangeInclusive<usize> = 1..=50;

/// Exclusive upper bound for `max_length`
pub const MAX_LENGTH_CEILING: usize = 1_000_000;

fn default_limit() -> usize {
    10
}

fn default_max_length() -> usize {
    5000
}

/// A ranked search hit from the documentation or the code host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SearchResult {
    /// Relevance position, lower is more relevant. Not necessarily contiguous.
    pub rank_order: usize,
    /// Page or GitHub URL
    pub url: String,
    /// Page title or prefixed GitHub resource title
    pub title: String,
    /// Excerpt or summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl SearchResult {
    /// The single record returned when every backend failed
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            rank_order: 1,
            url: String::new(),
            title: message.into(),
            context: None,
        }
    }
}

/// A recommended page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RecommendationResult {
    /// Page URL
    pub url: String,
    /// Page title
    pub title: String,
    /// Short description, absent when the backend has none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl RecommendationResult {
    /// The single record returned when the recommendation call failed
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            url: String::new(),
            title: message.into(),
            context: None,
        }
    }
}

/// Result of fetching one remote page
///
/// When `error_message` is set the content must not be used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentFetchOutcome {
    pub content: String,
    pub error_message: Option<String>,
}

impl ContentFetchOutcome {
    pub fn success(content: String) -> Self {
        Self {
            content,
            error_message: None,
        }
    }

    pub fn failure(message: String) -> Self {
        Self {
            content: String::new(),
            error_message: Some(message),
        }
    }

    pub fn into_result(self) -> Result<String, String> {
        match self.error_message {
            Some(message) => Err(message),
            None => Ok(self.content),
        }
    }
}

/// Caller-requested slice of a text stream, in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationWindow {
    pub start_index: usize,
    pub max_length: usize,
}

impl PaginationWindow {
    pub fn new(start_index: usize, max_length: usize) -> Self {
        Self {
            start_index,
            max_length,
        }
    }
}

impl Default for PaginationWindow {
    fn default() -> Self {
        Self::new(0, default_max_length())
    }
}

/// Classification of a URL passed to `read`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Documentation page rendered from HTML
    DocumentationHtml,
    /// Documentation source in markdown
    DocumentationMarkdown,
    /// GitHub issue
    Issue,
    /// GitHub pull request
    PullRequest,
    /// GitHub file view, read from the raw host
    RawCode,
    /// Anything else on the documentation site
    Generic,
}

impl ContentKind {
    /// Label used in the formatted read header
    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::DocumentationHtml
            | ContentKind::DocumentationMarkdown
            | ContentKind::Generic => "Documentation",
            ContentKind::Issue => "GitHub Issue",
            ContentKind::PullRequest => "Pull Request",
            ContentKind::RawCode => "Code",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentKind::DocumentationHtml => "documentation_html",
            ContentKind::DocumentationMarkdown => "documentation_markdown",
            ContentKind::Issue => "issue",
            ContentKind::PullRequest => "pull_request",
            ContentKind::RawCode => "raw_code",
            ContentKind::Generic => "generic",
        };
        f.write_str(name)
    }
}

/// Arguments of the `search` tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchRequest {
    /// Search phrase to use for finding security and compliance documentation
    pub search_phrase: String,

    /// Maximum number of results to return (1-50, default 10)
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl SearchRequest {
    pub fn new(search_phrase: impl Into<String>) -> Self {
        Self {
            search_phrase: search_phrase.into(),
            limit: default_limit(),
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.search_phrase.trim().is_empty() {
            return Err(GatewayError::InvalidArgument(
                "search_phrase must not be empty".to_string(),
            ));
        }
        validate_limit(self.limit)
    }
}

/// Arguments of the `read` tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReadRequest {
    /// URL of the documentation page, GitHub file, issue or pull request to read
    pub url: String,

    /// Maximum number of characters to return (default 5000)
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Return output starting at this character index, for continuing a truncated read
    #[serde(default)]
    pub start_index: usize,
}

impl ReadRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_length: default_max_length(),
            start_index: 0,
        }
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn start_index(mut self, start_index: usize) -> Self {
        self.start_index = start_index;
        self
    }

    pub fn window(&self) -> PaginationWindow {
        PaginationWindow::new(self.start_index, self.max_length)
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.max_length == 0 || self.max_length >= MAX_LENGTH_CEILING {
            return Err(GatewayError::InvalidArgument(format!(
                "max_length must be between 1 and {}",
                MAX_LENGTH_CEILING - 1
            )));
        }
        Ok(())
    }
}

/// Arguments of the `recommend` tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RecommendRequest {
    /// URL of the documentation page to get recommendations for
    pub url: String,

    /// Maximum number of results to return (1-50, default 10)
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl RecommendRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            limit: default_limit(),
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        validate_limit(self.limit)
    }
}

fn validate_limit(limit: usize) -> Result<(), GatewayError> {
    if LIMIT_RANGE.contains(&limit) {
        Ok(())
    } else {
        Err(GatewayError::InvalidArgument(format!(
            "limit must be between {} and {}",
            LIMIT_RANGE.start(),
            LIMIT_RANGE.end()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_defaults() {
        let req: SearchRequest = serde_json::from_str(r#"{"search_phrase":"kms"}"#).unwrap();
        assert_eq!(req.limit, 10);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_search_request_validation() {
        assert!(SearchRequest::new("").validate().is_err());
        assert!(SearchRequest::new("iam").limit(0).validate().is_err());
        assert!(SearchRequest::new("iam").limit(51).validate().is_err());
        assert!(SearchRequest::new("iam").limit(50).validate().is_ok());
    }

    #[test]
    fn test_read_request_defaults_and_window() {
        let req: ReadRequest =
            serde_json::from_str(r#"{"url":"https://github.com/a/b/issues/1"}"#).unwrap();
        assert_eq!(req.max_length, 5000);
        assert_eq!(req.start_index, 0);
        assert_eq!(req.window(), PaginationWindow::new(0, 5000));
    }

    #[test]
    fn test_read_request_validation() {
        assert!(ReadRequest::new("u").max_length(0).validate().is_err());
        assert!(ReadRequest::new("u").max_length(1_000_000).validate().is_err());
        assert!(ReadRequest::new("u").max_length(999_999).validate().is_ok());
    }

    #[test]
    fn test_search_result_serialization_omits_absent_context() {
        let json = serde_json::to_string(&SearchResult::error("boom")).unwrap();
        assert!(!json.contains("context"));
        assert!(json.contains("\"rank_order\":1"));

        let with_empty = SearchResult {
            rank_order: 2,
            url: "u".to_string(),
            title: "t".to_string(),
            context: Some(String::new()),
        };
        let json = serde_json::to_string(&with_empty).unwrap();
        assert!(json.contains("\"context\":\"\""));
    }

    #[test]
    fn test_content_kind_labels() {
        assert_eq!(ContentKind::DocumentationHtml.label(), "Documentation");
        assert_eq!(ContentKind::Issue.label(), "GitHub Issue");
        assert_eq!(ContentKind::PullRequest.label(), "Pull Request");
        assert_eq!(ContentKind::RawCode.label(), "Code");
        assert_eq!(ContentKind::PullRequest.to_string(), "pull_request");
    }

    #[test]
    fn test_fetch_outcome() {
        assert_eq!(
            ContentFetchOutcome::success("x".to_string()).into_result(),
            Ok("x".to_string())
        );
        let failed = ContentFetchOutcome::failure("boom".to_string());
        assert_eq!(failed.into_result(), Err("boom".to_string()));
    }
}
