//! Gateway configuration
//!
//! Every endpoint the gateway talks to lives here so tests can point the
//! whole pipeline at a local mock server.

use crate::retry::RetryPolicy;
use crate::DEFAULT_USER_AGENT;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Documentation site prefix accepted by `read`
pub const DOCS_PREFIX: &str = "https://docs.aws.amazon.com/";

/// Code host prefix accepted by `read`
pub const GITHUB_PREFIX: &str = "https://github.com/";

/// Raw file host used for code reads
pub const GITHUB_RAW_PREFIX: &str = "https://raw.githubusercontent.com/";

/// Code host REST API
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Documentation search API
pub const SEARCH_API_URL: &str = "https://proxy.search.docs.aws.amazon.com/search";

/// Documentation recommendation API
pub const RECOMMENDATIONS_API_URL: &str =
    "https://contentrecs-api.docs.aws.amazon.com/v1/recommendations";

/// Repositories searched alongside the documentation
pub const DEFAULT_REPOSITORIES: &[&str] = &[
    "awslabs/sra-verify",
    "aws-samples/aws-security-reference-architecture-examples",
];

/// Scope attribute restricting documentation search to the target guide
pub const SEARCH_GUIDE: &str = "AWS Security Reference Architecture";

/// Maximum concurrent recommendation requests per batch wave
pub const MAX_CONCURRENT_REQUESTS: usize = 5;

/// Header carrying the session id on documentation requests
pub const SESSION_HEADER: &str = "X-MCP-Session-Id";

/// Timeout for page fetches
const PAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for search and recommendation API calls
const API_TIMEOUT: Duration = Duration::from_secs(30);

/// Process-wide request correlation id
///
/// Generated once when the gateway is built and attached to every
/// outbound documentation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random session id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of acquiring a code-host access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// A token was supplied
    Provided(String),
    /// The user chose to continue without a token
    Declined,
    /// Token acquisition was aborted
    Cancelled,
}

impl TokenSource {
    /// Resolve from an optional value such as an environment variable
    pub fn from_optional(token: Option<String>) -> Self {
        match token {
            Some(token) if !token.trim().is_empty() => TokenSource::Provided(token),
            _ => TokenSource::Declined,
        }
    }

    /// Resolve from an interactive prompt answer; `None` means the prompt was
    /// closed without an answer
    pub fn from_prompt(answer: Option<&str>) -> Self {
        match answer.map(str::trim) {
            None => TokenSource::Cancelled,
            Some("") => TokenSource::Declined,
            Some(token) => TokenSource::Provided(token.to_string()),
        }
    }

    /// The token to attach, if any. Declined and cancelled both mean none.
    pub fn into_token(self) -> Option<String> {
        match self {
            TokenSource::Provided(token) => Some(token),
            TokenSource::Declined | TokenSource::Cancelled => None,
        }
    }
}

/// Resolved configuration shared by every component
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Documentation site URL prefix
    pub docs_prefix: String,
    /// Code host URL prefix
    pub github_prefix: String,
    /// Raw file host prefix
    pub github_raw_prefix: String,
    /// Code host REST API base URL
    pub github_api_url: String,
    /// Documentation search API URL
    pub search_api_url: String,
    /// Documentation recommendation API URL
    pub recommendations_api_url: String,
    /// Repositories searched, as `owner/name`
    pub repositories: Vec<String>,
    /// Documentation search scope attribute value
    pub search_guide: String,
    /// Name used in formatted read headers
    pub source_label: String,
    /// User-Agent sent on every request
    pub user_agent: String,
    /// Session id attached to documentation requests
    pub session_id: SessionId,
    /// Code host access token
    pub github_token: Option<String>,
    /// Timeout for page fetches
    pub page_timeout: Duration,
    /// Timeout for search and recommendation calls
    pub api_timeout: Duration,
    /// Recommendation batch width
    pub batch_size: usize,
    /// Retry policy for code-host detail requests
    pub retry: RetryPolicy,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            docs_prefix: DOCS_PREFIX.to_string(),
            github_prefix: GITHUB_PREFIX.to_string(),
            github_raw_prefix: GITHUB_RAW_PREFIX.to_string(),
            github_api_url: GITHUB_API_URL.to_string(),
            search_api_url: SEARCH_API_URL.to_string(),
            recommendations_api_url: RECOMMENDATIONS_API_URL.to_string(),
            repositories: DEFAULT_REPOSITORIES.iter().map(|r| r.to_string()).collect(),
            search_guide: SEARCH_GUIDE.to_string(),
            source_label: "AWS Security Reference Architecture".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            session_id: SessionId::generate(),
            github_token: None,
            page_timeout: PAGE_TIMEOUT,
            api_timeout: API_TIMEOUT,
            batch_size: MAX_CONCURRENT_REQUESTS,
            retry: RetryPolicy::default(),
        }
    }
}

impl GatewayConfig {
    /// True when the URL belongs to the documentation site or the code host
    pub fn is_known_source(&self, url: &str) -> bool {
        url.starts_with(&self.docs_prefix) || url.starts_with(&self.github_prefix)
    }

    /// True when the URL belongs to the code host
    pub fn is_github(&self, url: &str) -> bool {
        url.starts_with(&self.github_prefix)
    }
}

/// Builder for configuring a [`Gateway`](crate::Gateway)
#[derive(Debug, Clone, Default)]
pub struct GatewayBuilder {
    config: GatewayConfig,
}

impl GatewayBuilder {
    /// Create a builder targeting the production endpoints
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the documentation site prefix
    pub fn docs_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.docs_prefix = prefix.into();
        self
    }

    /// Set the code host prefix
    pub fn github_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.github_prefix = prefix.into();
        self
    }

    /// Set the raw file host prefix
    pub fn github_raw_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.github_raw_prefix = prefix.into();
        self
    }

    /// Set the code host API base URL
    pub fn github_api_url(mut self, url: impl Into<String>) -> Self {
        self.config.github_api_url = url.into();
        self
    }

    /// Set the documentation search API URL
    pub fn search_api_url(mut self, url: impl Into<String>) -> Self {
        self.config.search_api_url = url.into();
        self
    }

    /// Set the recommendation API URL
    pub fn recommendations_api_url(mut self, url: impl Into<String>) -> Self {
        self.config.recommendations_api_url = url.into();
        self
    }

    /// Replace the searched repository list
    pub fn repositories<I, S>(mut self, repositories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.repositories = repositories.into_iter().map(Into::into).collect();
        self
    }

    /// Set custom User-Agent
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    /// Set the code host token from an acquisition outcome
    pub fn github_token(mut self, token: TokenSource) -> Self {
        self.config.github_token = token.into_token();
        self
    }

    /// Set the page fetch timeout
    pub fn page_timeout(mut self, timeout: Duration) -> Self {
        self.config.page_timeout = timeout;
        self
    }

    /// Set the API call timeout
    pub fn api_timeout(mut self, timeout: Duration) -> Self {
        self.config.api_timeout = timeout;
        self
    }

    /// Set the recommendation batch width
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size.max(1);
        self
    }

    /// Set the retry policy for code-host detail requests
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    /// Finish configuration
    pub fn build_config(self) -> GatewayConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.repositories.len(), 2);
        assert_eq!(config.batch_size, 5);
        assert!(config.github_token.is_none());
        assert_eq!(config.page_timeout, Duration::from_secs(30));
        assert!(config.api_timeout >= config.page_timeout);
    }

    #[test]
    fn test_known_source() {
        let config = GatewayConfig::default();
        assert!(config.is_known_source(
            "https://docs.aws.amazon.com/prescriptive-guidance/latest/security-reference-architecture/welcome.html"
        ));
        assert!(config.is_known_source("https://github.com/awslabs/sra-verify"));
        assert!(!config.is_known_source("https://example.com/page.html"));
        assert!(!config.is_known_source("http://docs.aws.amazon.com/page.html"));
    }

    #[test]
    fn test_session_id_is_stable_per_config() {
        let config = GatewayConfig::default();
        let cloned = config.clone();
        assert_eq!(config.session_id, cloned.session_id);
        assert_ne!(config.session_id, SessionId::generate());
        assert_eq!(config.session_id.as_str().len(), 36);
    }

    #[test]
    fn test_token_source() {
        assert_eq!(
            TokenSource::from_optional(Some("abc".to_string())),
            TokenSource::Provided("abc".to_string())
        );
        assert_eq!(TokenSource::from_optional(None), TokenSource::Declined);
        assert_eq!(
            TokenSource::from_optional(Some("  ".to_string())),
            TokenSource::Declined
        );
        assert_eq!(TokenSource::Cancelled.into_token(), None);
        assert_eq!(
            TokenSource::Provided("t".to_string()).into_token(),
            Some("t".to_string())
        );
    }

    #[test]
    fn test_token_from_prompt() {
        assert_eq!(TokenSource::from_prompt(None), TokenSource::Cancelled);
        assert_eq!(TokenSource::from_prompt(Some("\n")), TokenSource::Declined);
        assert_eq!(
            TokenSource::from_prompt(Some(" ghp_abc\n")),
            TokenSource::Provided("ghp_abc".to_string())
        );
    }

    #[test]
    fn test_builder() {
        let config = GatewayBuilder::new()
            .docs_prefix("http://127.0.0.1:1/docs/")
            .repositories(["a/b"])
            .user_agent("TestAgent/1.0")
            .github_token(TokenSource::Provided("secret".to_string()))
            .batch_size(0)
            .build_config();

        assert_eq!(config.docs_prefix, "http://127.0.0.1:1/docs/");
        assert_eq!(config.repositories, vec!["a/b"]);
        assert_eq!(config.user_agent, "TestAgent/1.0");
        assert_eq!(config.github_token, Some("secret".to_string()));
        assert_eq!(config.batch_size, 1);
    }
}
