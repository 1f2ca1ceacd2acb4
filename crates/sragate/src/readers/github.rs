//! Code host readers
//!
//! Issues and pull requests are assembled from the REST API, with every GET
//! wrapped in the configured retry policy. File views are read from the raw
//! host and fall back to rendering the HTML page.

use super::{ContentProcessor, DocumentReader, Reader};
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::format::{format_result, log_truncation};
use crate::http::{fetch_failure_message, Backend, HttpClient};
use crate::types::{ContentKind, PaginationWindow};
use async_trait::async_trait;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::{debug, error, warn};

static ISSUE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^/]+)/([^/]+)/issues/(\d+)(?:$|[/?#])").expect("issue path pattern should compile")
});

static PULL_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^/]+)/([^/]+)/pull/(\d+)(?:$|[/?#])").expect("pull path pattern should compile")
});

/// An issue or pull request addressed by owner, repository and number
#[derive(Debug, Clone, PartialEq, Eq)]
struct Numbered {
    owner: String,
    repo: String,
    number: u64,
}

impl Numbered {
    fn parse(pattern: &Regex, url: &str, config: &GatewayConfig) -> Option<Self> {
        let rest = url.strip_prefix(&config.github_prefix)?;
        let caps = pattern.captures(rest)?;
        Some(Self {
            owner: caps[1].to_string(),
            repo: caps[2].to_string(),
            number: caps[3].parse().ok()?,
        })
    }

    fn api(&self, config: &GatewayConfig, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            config.github_api_url.trim_end_matches('/'),
            self.owner,
            self.repo,
            path
        )
    }
}

#[derive(Debug, Deserialize)]
struct GitHubIssue {
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    comments: u64,
}

#[derive(Debug, Deserialize)]
struct GitHubPull {
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    commits: u64,
    #[serde(default)]
    comments: u64,
}

#[derive(Debug, Deserialize)]
struct GitHubComment {
    #[serde(default)]
    user: Option<GitHubUser>,
    #[serde(default)]
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GitHubCommitRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GitHubCommit {
    sha: String,
    commit: GitHubCommitMessage,
    #[serde(default)]
    files: Vec<GitHubFile>,
}

#[derive(Debug, Deserialize)]
struct GitHubCommitMessage {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GitHubFile {
    filename: String,
    #[serde(default)]
    patch: Option<String>,
}

async fn get_with_retry<T: DeserializeOwned>(
    config: &GatewayConfig,
    client: &HttpClient,
    url: &str,
) -> Result<T, GatewayError> {
    config.retry.run(url, || client.get_json::<T>(url)).await
}

fn github_client(config: &GatewayConfig) -> Result<HttpClient, GatewayError> {
    HttpClient::new(config, Backend::GitHub, config.api_timeout)
}

/// Heading and body shared by issues and pull requests
fn title_block(title: &str, body: Option<&str>) -> String {
    format!("# {}\n\n{}", title, body.unwrap_or_default())
}

/// Fetch the comment list and render it; failures yield no section
async fn comments_section(
    config: &GatewayConfig,
    client: &HttpClient,
    target: &Numbered,
) -> String {
    let url = target.api(config, &format!("issues/{}/comments", target.number));
    match get_with_retry::<Vec<GitHubComment>>(config, client, &url).await {
        Ok(comments) => render_comments(&comments),
        Err(e) => {
            error!(url = %url, error = %e, "Failed to fetch comments");
            String::new()
        }
    }
}

fn render_comments(comments: &[GitHubComment]) -> String {
    let mut out = String::from("\n\n## Comments\n\n");
    for comment in comments {
        let user = comment
            .user
            .as_ref()
            .map(|u| u.login.as_str())
            .unwrap_or("unknown");
        out.push_str(&format!(
            "{}: {}\n\n",
            user,
            comment.body.as_deref().unwrap_or_default()
        ));
    }
    out
}

/// Fetch the commit list and each commit's detail; failures yield no section
async fn commits_section(config: &GatewayConfig, client: &HttpClient, target: &Numbered) -> String {
    let url = target.api(config, &format!("pulls/{}/commits", target.number));
    let refs = match get_with_retry::<Vec<GitHubCommitRef>>(config, client, &url).await {
        Ok(refs) => refs,
        Err(e) => {
            error!(url = %url, error = %e, "Failed to fetch commit list");
            return String::new();
        }
    };

    let mut out = String::from("\n\n## Commits\n\n");
    for commit_ref in &refs {
        let detail_url = target.api(config, &format!("commits/{}", commit_ref.sha));
        match get_with_retry::<GitHubCommit>(config, client, &detail_url).await {
            Ok(commit) => out.push_str(&render_commit(&commit)),
            Err(e) => {
                error!(url = %detail_url, error = %e, "Failed to fetch commit");
            }
        }
    }
    out
}

fn render_commit(commit: &GitHubCommit) -> String {
    let mut out = format!("### Commit {}\n\n{}\n\n", commit.sha, commit.commit.message);
    if commit.files.is_empty() {
        out.push_str("No files were changed in this commit.\n\n");
        return out;
    }
    for file in &commit.files {
        out.push_str(&format!("#### {}\n\n", file.filename));
        match &file.patch {
            Some(patch) => out.push_str(&format!("```diff\n{}\n```\n\n", patch)),
            None => out.push_str("No diff available.\n\n"),
        }
    }
    out
}

fn paginate(
    config: &GatewayConfig,
    url: &str,
    content: &str,
    window: PaginationWindow,
    kind: ContentKind,
) -> String {
    let result = format_result(&config.source_label, url, content, window, kind.label());
    log_truncation(content, window);
    result
}

fn read_failure(url: &str, err: &GatewayError) -> String {
    let message = fetch_failure_message(url, err);
    error!("{}", message);
    message
}

/// Reader for code host issues
pub struct IssueReader;

#[async_trait]
impl Reader for IssueReader {
    fn kind(&self) -> ContentKind {
        ContentKind::Issue
    }

    fn matches(&self, url: &str, config: &GatewayConfig) -> bool {
        Numbered::parse(&ISSUE_PATH, url, config).is_some()
    }

    async fn read(&self, config: &GatewayConfig, url: &str, window: PaginationWindow) -> String {
        let Some(target) = Numbered::parse(&ISSUE_PATH, url, config) else {
            return format!("Failed to fetch {}: not an issue URL", url);
        };
        let client = match github_client(config) {
            Ok(client) => client,
            Err(e) => return read_failure(url, &e),
        };

        let issue_url = target.api(config, &format!("issues/{}", target.number));
        let issue: GitHubIssue = match get_with_retry(config, &client, &issue_url).await {
            Ok(issue) => issue,
            Err(e) => return read_failure(url, &e),
        };
        debug!(url = %url, comments = issue.comments, "Fetched issue");

        let mut content = title_block(&issue.title, issue.body.as_deref());
        if issue.comments > 0 {
            content.push_str(&comments_section(config, &client, &target).await);
        }

        paginate(config, url, &content, window, self.kind())
    }
}

/// Reader for code host pull requests
pub struct PullRequestReader;

#[async_trait]
impl Reader for PullRequestReader {
    fn kind(&self) -> ContentKind {
        ContentKind::PullRequest
    }

    fn matches(&self, url: &str, config: &GatewayConfig) -> bool {
        Numbered::parse(&PULL_PATH, url, config).is_some()
    }

    async fn read(&self, config: &GatewayConfig, url: &str, window: PaginationWindow) -> String {
        let Some(target) = Numbered::parse(&PULL_PATH, url, config) else {
            return format!("Failed to fetch {}: not a pull request URL", url);
        };
        let client = match github_client(config) {
            Ok(client) => client,
            Err(e) => return read_failure(url, &e),
        };

        let pull_url = target.api(config, &format!("pulls/{}", target.number));
        let pull: GitHubPull = match get_with_retry(config, &client, &pull_url).await {
            Ok(pull) => pull,
            Err(e) => return read_failure(url, &e),
        };
        debug!(
            url = %url,
            commits = pull.commits,
            comments = pull.comments,
            "Fetched pull request"
        );

        let mut content = title_block(&pull.title, pull.body.as_deref());
        if pull.commits > 0 {
            content.push_str(&commits_section(config, &client, &target).await);
        }
        if pull.comments > 0 {
            content.push_str(&comments_section(config, &client, &target).await);
        }

        paginate(config, url, &content, window, self.kind())
    }
}

/// Reader for files on the code host
///
/// `https://github.com/o/r/blob/main/x.py` is read from
/// `https://raw.githubusercontent.com/o/r/main/x.py`.
pub struct RawCodeReader;

impl RawCodeReader {
    pub fn raw_url(url: &str, config: &GatewayConfig) -> String {
        url.replacen(&config.github_prefix, &config.github_raw_prefix, 1)
            .replacen("/blob/", "/", 1)
    }
}

#[async_trait]
impl Reader for RawCodeReader {
    fn kind(&self) -> ContentKind {
        ContentKind::RawCode
    }

    fn matches(&self, url: &str, config: &GatewayConfig) -> bool {
        config.is_github(url)
    }

    async fn read(&self, config: &GatewayConfig, url: &str, window: PaginationWindow) -> String {
        let raw_url = Self::raw_url(url, config);

        let fetched = match github_client(config) {
            Ok(client) => config.retry.run(&raw_url, || client.get_text(&raw_url)).await,
            Err(e) => Err(e),
        };

        match fetched {
            Ok(raw) => {
                let content = ContentProcessor::Code.process(&raw);
                paginate(config, url, &content, window, self.kind())
            }
            Err(e) => {
                warn!(url = %raw_url, error = %e, "Raw fetch failed, rendering the HTML page instead");
                DocumentReader::html().read(config, url, window).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_issue_and_pull_urls() {
        let config = GatewayConfig::default();
        assert_eq!(
            Numbered::parse(&ISSUE_PATH, "https://github.com/awslabs/sra-verify/issues/225", &config),
            Some(Numbered {
                owner: "awslabs".to_string(),
                repo: "sra-verify".to_string(),
                number: 225
            })
        );
        assert!(Numbered::parse(&ISSUE_PATH, "https://github.com/a/b/issues/12?x=1", &config).is_some());
        assert!(Numbered::parse(&ISSUE_PATH, "https://github.com/a/b/issues/12abc", &config).is_none());
        assert!(Numbered::parse(&ISSUE_PATH, "https://github.com/a/b/issues/", &config).is_none());
        assert!(Numbered::parse(&ISSUE_PATH, "https://github.com/a/b/pull/12", &config).is_none());
        assert!(Numbered::parse(&PULL_PATH, "https://github.com/a/b/pull/167/commits", &config).is_some());
        assert!(Numbered::parse(&PULL_PATH, "https://docs.aws.amazon.com/a/b/pull/1", &config).is_none());
    }

    #[test]
    fn test_api_urls() {
        let config = GatewayConfig::default();
        let target = Numbered {
            owner: "o".to_string(),
            repo: "r".to_string(),
            number: 7,
        };
        assert_eq!(
            target.api(&config, "pulls/7/commits"),
            "https://api.github.com/repos/o/r/pulls/7/commits"
        );
    }

    #[test]
    fn test_raw_url() {
        let config = GatewayConfig::default();
        assert_eq!(
            RawCodeReader::raw_url(
                "https://github.com/awslabs/sra-verify/blob/main/sraverify/main.py",
                &config
            ),
            "https://raw.githubusercontent.com/awslabs/sra-verify/main/sraverify/main.py"
        );
    }

    #[test]
    fn test_render_comments() {
        let comments: Vec<GitHubComment> = serde_json::from_str(
            r#"[{"user":{"login":"alice"},"body":"Looks good"},{"user":null,"body":null}]"#,
        )
        .unwrap();
        assert_eq!(
            render_comments(&comments),
            "\n\n## Comments\n\nalice: Looks good\n\nunknown: \n\n"
        );
    }

    #[test]
    fn test_render_commit() {
        let with_files: GitHubCommit = serde_json::from_str(
            r#"{"sha":"abc123","commit":{"message":"Fix check"},"files":[{"filename":"a.py","patch":"@@ -1 +1 @@"}]}"#,
        )
        .unwrap();
        let rendered = render_commit(&with_files);
        assert!(rendered.starts_with("### Commit abc123\n\nFix check\n\n"));
        assert!(rendered.contains("#### a.py\n\n```diff\n@@ -1 +1 @@\n```"));

        let empty: GitHubCommit =
            serde_json::from_str(r#"{"sha":"def","commit":{"message":"Empty"}}"#).unwrap();
        assert!(render_commit(&empty).contains("No files were changed in this commit."));
    }

    #[test]
    fn test_title_block() {
        assert_eq!(title_block("Bug", Some("Details")), "# Bug\n\nDetails");
        assert_eq!(title_block("Bug", None), "# Bug\n\n");
    }
}
