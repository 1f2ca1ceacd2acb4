//! Gateway entry points
//!
//! [`Gateway`] validates tool arguments and hands off to the search,
//! reader and recommendation modules. It is cheap to clone; configuration
//! and the reader registry are shared.

use crate::config::{GatewayBuilder, GatewayConfig};
use crate::error::GatewayError;
use crate::readers::ReaderRegistry;
use crate::types::{
    ContentKind, ReadRequest, RecommendRequest, RecommendationResult, SearchRequest, SearchResult,
};
use crate::{recommend, search};
use std::collections::HashMap;
use std::sync::Arc;

/// Configured search, read and recommend gateway
#[derive(Clone)]
pub struct Gateway {
    config: Arc<GatewayConfig>,
    readers: Arc<ReaderRegistry>,
}

impl Default for Gateway {
    fn default() -> Self {
        GatewayBuilder::new().build()
    }
}

impl GatewayBuilder {
    /// Build the gateway
    pub fn build(self) -> Gateway {
        Gateway::from_config(self.build_config())
    }
}

impl Gateway {
    /// Create a new gateway builder
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::new()
    }

    /// Wrap an already resolved configuration
    pub fn from_config(config: GatewayConfig) -> Self {
        Self {
            config: Arc::new(config),
            readers: Arc::new(ReaderRegistry::with_defaults()),
        }
    }

    /// The resolved configuration
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Search documentation and the code host
    ///
    /// Backend failures never surface as errors; see
    /// [`SEARCH_FAILED_MESSAGE`](crate::search::SEARCH_FAILED_MESSAGE).
    pub async fn search(&self, req: SearchRequest) -> Result<Vec<SearchResult>, GatewayError> {
        req.validate()?;
        Ok(search::search(&self.config, &req.search_phrase, req.limit).await)
    }

    /// Classify a URL into the content kind `read` would use
    pub fn classify(&self, url: &str) -> Result<ContentKind, GatewayError> {
        self.readers.classify(url, &self.config)
    }

    /// Read a URL as paginated markdown
    ///
    /// Fails only for URLs outside the accepted sources or bad arguments.
    /// Fetch failures come back as text starting with `Failed to fetch`.
    pub async fn read(&self, req: ReadRequest) -> Result<String, GatewayError> {
        req.validate()?;
        self.readers.read(&self.config, &req.url, req.window()).await
    }

    /// Recommendations related to a documentation page
    pub async fn recommend(
        &self,
        req: RecommendRequest,
    ) -> Result<Vec<RecommendationResult>, GatewayError> {
        req.validate()?;
        Ok(recommend::recommend(&self.config, &req.url, req.limit).await)
    }

    /// Recommendations for several pages, fetched in bounded waves
    pub async fn recommend_many(
        &self,
        urls: &[String],
        limit: usize,
    ) -> Result<HashMap<String, Vec<RecommendationResult>>, GatewayError> {
        RecommendRequest::new("").limit(limit).validate()?;
        Ok(recommend::recommend_many(&self.config, urls, limit).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_rejects_unknown_source() {
        let gateway = Gateway::default();
        let result = gateway
            .read(ReadRequest::new("https://example.com/page.html"))
            .await;
        assert!(matches!(result, Err(GatewayError::InvalidSource(_))));
    }

    #[tokio::test]
    async fn test_argument_validation_happens_before_io() {
        let gateway = Gateway::builder()
            .search_api_url("http://127.0.0.1:9/search")
            .build();
        assert!(matches!(
            gateway.search(SearchRequest::new("iam").limit(0)).await,
            Err(GatewayError::InvalidArgument(_))
        ));
        assert!(matches!(
            gateway
                .read(ReadRequest::new("https://docs.aws.amazon.com/a.html").max_length(0))
                .await,
            Err(GatewayError::InvalidArgument(_))
        ));
        assert!(matches!(
            gateway.recommend_many(&[], 51).await,
            Err(GatewayError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_clones_share_session() {
        let gateway = Gateway::default();
        let clone = gateway.clone();
        assert_eq!(gateway.config().session_id, clone.config().session_id);
    }

    #[test]
    fn test_classify() {
        let gateway = Gateway::default();
        assert_eq!(
            gateway
                .classify("https://github.com/awslabs/sra-verify/issues/225")
                .unwrap(),
            ContentKind::Issue
        );
    }
}
