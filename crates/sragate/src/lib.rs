//! SRA Gateway - search, read and recommend over AWS Security Reference
//! Architecture content
//!
//! This crate exposes three tool operations over the AWS documentation
//! search and recommendation APIs and the GitHub repositories that ship the
//! reference architecture code.
//!
//! ## Reader System
//!
//! `read` classifies a URL and dispatches it through the [`ReaderRegistry`].
//! The first matching reader wins:
//! - [`DocumentReader`] - documentation pages (HTML, markdown, passthrough)
//! - [`IssueReader`] / [`PullRequestReader`] - GitHub issues and pull requests
//! - [`RawCodeReader`] - GitHub files, read from the raw content host
//!
//! ## Failure model
//!
//! Only invalid arguments and URLs outside the accepted sources are returned
//! as errors. Backend failures degrade to partial results, a synthetic error
//! record, or a `Failed to fetch` string.

pub mod client;
pub mod config;
mod convert;
mod error;
mod format;
mod http;
pub mod readers;
mod recommend;
pub mod relevance;
mod retry;
pub mod search;
mod tool;
mod types;

pub use client::Gateway;
pub use config::{GatewayBuilder, GatewayConfig, SessionId, TokenSource};
pub use convert::{extract_content_from_html, is_error_marker};
pub use error::GatewayError;
pub use format::{format_result, DEFAULT_CONTENT_TYPE};
pub use readers::{
    ContentProcessor, DocumentReader, IssueReader, PullRequestReader, RawCodeReader, Reader,
    ReaderRegistry,
};
pub use retry::RetryPolicy;
pub use tool::{Tool, ToolDefinition, ToolOutput, READ_TOOL, RECOMMEND_TOOL, SEARCH_TOOL};
pub use types::{
    ContentFetchOutcome, ContentKind, PaginationWindow, ReadRequest, RecommendRequest,
    RecommendationResult, SearchRequest, SearchResult,
};

/// Default User-Agent string
pub const DEFAULT_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; sragate/",
    env!("CARGO_PKG_VERSION"),
    "; ModelContextProtocol)"
);

/// Description of the `search` tool
pub const SEARCH_DESCRIPTION: &str = r#"Search AWS Security Reference Architecture documentation and the SRA GitHub repositories.

- Returns ranked results with url, title and context
- Mixes documentation pages with GitHub code, issues and pull requests
- Lower rank_order means more relevant"#;

/// Description of the `read` tool
pub const READ_DESCRIPTION: &str = r#"Fetch an AWS documentation page, GitHub file, issue or pull request and return it as markdown.

- URLs must start with https://docs.aws.amazon.com/ or https://github.com/
- Long content is paginated; follow the start_index in the truncation notice
- Issues and pull requests include comments, commits and diffs"#;

/// Description of the `recommend` tool
pub const RECOMMEND_DESCRIPTION: &str = r#"Get security and compliance content recommendations for an AWS documentation page.

- Highly rated, journey, new and similar content
- Security related recommendations are listed first"#;

/// Extended documentation for LLM consumption (llmtxt)
pub const TOOL_LLMTXT: &str = r#"# SRA Gateway Tools

Search, read and get recommendations for AWS Security Reference Architecture
(SRA) content: the prescriptive guidance on docs.aws.amazon.com and the
`awslabs/sra-verify` and `aws-samples/aws-security-reference-architecture-examples`
repositories on GitHub.

## search
- `search_phrase` (required): what to look for, e.g. "delegated administrator"
- `limit` (optional, 1-50, default 10): maximum number of results

Returns a list of `{rank_order, url, title, context}`. GitHub results carry a
prefix in the title: `[Code]`, `[Issue]` or `[PR]`. If every backend fails the
list holds a single entry with an empty url and the error in the title.

## read
- `url` (required): documentation page or GitHub URL
- `max_length` (optional, default 5000): characters to return
- `start_index` (optional, default 0): continue a truncated read

Pages ending in `.html` are converted to markdown, `.md` files are returned
as is, GitHub issues and pull requests are assembled from the API (with
comments, commits and diffs), and other GitHub files are returned as code.
When content is cut off the output ends with a notice naming the next
`start_index`. Fetch failures return text starting with `Failed to fetch`.

## recommend
- `url` (required): documentation page to get recommendations for
- `limit` (optional, 1-50, default 10): maximum number of results

Returns `{url, title, context}` entries from four categories: Highly Rated,
Journey (context `Intent: ...`), New (context `New content added on ...`) and
Similar. To find recently released features, call it with a service's
welcome page and look at the New entries.

## Examples

```json
{"search_phrase": "security tooling account", "limit": 5}
```

```json
{"url": "https://docs.aws.amazon.com/prescriptive-guidance/latest/security-reference-architecture/welcome.html"}
```

```json
{"url": "https://github.com/awslabs/sra-verify/issues/12", "start_index": 5000}
```
"#;
