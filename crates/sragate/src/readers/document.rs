//! Documentation page reader
//!
//! One reader type parameterized by a [`ContentProcessor`]: fetch the page,
//! transform the body, paginate.

use super::{ContentProcessor, Reader};
use crate::config::GatewayConfig;
use crate::format::{format_result, log_truncation};
use crate::http::fetch_page;
use crate::types::{ContentKind, PaginationWindow};
use async_trait::async_trait;

/// Reader for documentation pages and other plain fetches
pub struct DocumentReader {
    kind: ContentKind,
    processor: ContentProcessor,
}

impl DocumentReader {
    /// Pages ending in `.html`, rendered to markdown
    pub fn html() -> Self {
        Self {
            kind: ContentKind::DocumentationHtml,
            processor: ContentProcessor::Html,
        }
    }

    /// Pages ending in `.md`, passed through untouched
    pub fn markdown() -> Self {
        Self {
            kind: ContentKind::DocumentationMarkdown,
            processor: ContentProcessor::Markdown,
        }
    }

    /// Catch-all that returns the body as a code block
    pub fn passthrough() -> Self {
        Self {
            kind: ContentKind::Generic,
            processor: ContentProcessor::Code,
        }
    }
}

#[async_trait]
impl Reader for DocumentReader {
    fn kind(&self) -> ContentKind {
        self.kind
    }

    fn matches(&self, url: &str, _config: &GatewayConfig) -> bool {
        match self.kind {
            ContentKind::DocumentationHtml => url.ends_with(".html"),
            ContentKind::DocumentationMarkdown => url.ends_with(".md"),
            _ => true,
        }
    }

    async fn read(&self, config: &GatewayConfig, url: &str, window: PaginationWindow) -> String {
        let raw = match fetch_page(config, url).await.into_result() {
            Ok(raw) => raw,
            Err(message) => return message,
        };

        let content = self.processor.process(&raw);
        let result = format_result(
            &config.source_label,
            url,
            &content,
            window,
            self.kind.label(),
        );
        log_truncation(&content, window);
        result
    }
}
