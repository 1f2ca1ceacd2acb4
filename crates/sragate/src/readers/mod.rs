//! Reader system for the `read` operation
//!
//! Design: each reader claims a family of URLs and turns them into
//! paginated markdown. ReaderRegistry dispatches to the first matching
//! reader, so registration order is the classification priority.

mod document;
mod github;

pub use document::DocumentReader;
pub use github::{IssueReader, PullRequestReader, RawCodeReader};

use crate::config::GatewayConfig;
use crate::convert::extract_content_from_html;
use crate::error::GatewayError;
use crate::types::{ContentKind, PaginationWindow};
use async_trait::async_trait;

/// Transformation applied to a fetched body before pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentProcessor {
    /// Extract the main content and render it as markdown
    Html,
    /// Use the body as is
    Markdown,
    /// Wrap the body in a fenced code block
    Code,
}

impl ContentProcessor {
    pub fn process(&self, raw: &str) -> String {
        match self {
            ContentProcessor::Html => extract_content_from_html(raw),
            ContentProcessor::Markdown => raw.to_string(),
            ContentProcessor::Code => format!("```\n{}\n```", raw),
        }
    }
}

/// Trait for content readers
///
/// `read` never fails: fetch errors come back as a string starting with
/// `Failed to fetch`.
#[async_trait]
pub trait Reader: Send + Sync {
    /// Content kind this reader serves
    fn kind(&self) -> ContentKind;

    /// Returns true if this reader handles the URL
    ///
    /// Only called for URLs already known to belong to an accepted source.
    fn matches(&self, url: &str, config: &GatewayConfig) -> bool;

    /// Fetch, normalize and paginate the resource
    async fn read(&self, config: &GatewayConfig, url: &str, window: PaginationWindow) -> String;
}

/// Ordered list of readers
pub struct ReaderRegistry {
    readers: Vec<Box<dyn Reader>>,
}

impl Default for ReaderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ReaderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            readers: Vec::new(),
        }
    }

    /// Create a registry with the standard readers, in priority order:
    /// HTML page, markdown page, issue, pull request, code host file,
    /// then the code block passthrough for everything else.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(DocumentReader::html()));
        registry.register(Box::new(DocumentReader::markdown()));
        registry.register(Box::new(IssueReader));
        registry.register(Box::new(PullRequestReader));
        registry.register(Box::new(RawCodeReader));
        registry.register(Box::new(DocumentReader::passthrough()));
        registry
    }

    /// Register a reader after the existing ones
    pub fn register(&mut self, reader: Box<dyn Reader>) {
        self.readers.push(reader);
    }

    fn select(&self, url: &str, config: &GatewayConfig) -> Result<&dyn Reader, GatewayError> {
        if !config.is_known_source(url) {
            return Err(GatewayError::InvalidSource(url.to_string()));
        }

        self.readers
            .iter()
            .find(|reader| reader.matches(url, config))
            .map(|reader| reader.as_ref())
            .ok_or_else(|| GatewayError::InvalidSource(url.to_string()))
    }

    /// Classify a URL without fetching anything
    pub fn classify(&self, url: &str, config: &GatewayConfig) -> Result<ContentKind, GatewayError> {
        self.select(url, config).map(|reader| reader.kind())
    }

    /// Read a URL with the first matching reader
    pub async fn read(
        &self,
        config: &GatewayConfig,
        url: &str,
        window: PaginationWindow,
    ) -> Result<String, GatewayError> {
        let reader = self.select(url, config)?;
        tracing::debug!(reader = %reader.kind(), url = %url, "Using reader");
        Ok(reader.read(config, url, window).await)
    }
}
