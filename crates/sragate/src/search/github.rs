//! Code host search backend
//!
//! Each repository gets three sub-searches (code, issues, pull requests).
//! Results are joined positionally and ranked by one running counter, so
//! completion order never changes the ranking.

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::{with_query, Backend, HttpClient};
use crate::types::SearchResult;
use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, error, warn};

/// Characters of an issue or pull request body kept as context
const BODY_EXCERPT_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubSearch {
    Code,
    Issues,
    PullRequests,
}

impl SubSearch {
    fn endpoint(&self) -> &'static str {
        match self {
            SubSearch::Code => "search/code",
            SubSearch::Issues | SubSearch::PullRequests => "search/issues",
        }
    }

    fn query(&self, phrase: &str, repo: &str) -> String {
        match self {
            SubSearch::Code => format!("{} repo:{}", phrase, repo),
            SubSearch::Issues => format!("{} repo:{} is:issue", phrase, repo),
            SubSearch::PullRequests => format!("{} repo:{} is:pr", phrase, repo),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            SubSearch::Code => "code",
            SubSearch::Issues => "issues",
            SubSearch::PullRequests => "pull requests",
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchPage<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct CodeItem {
    #[serde(default)]
    name: String,
    #[serde(default)]
    path: String,
    #[serde(default)]
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct IssueItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    html_url: String,
}

/// A normalized hit before ranking
#[derive(Debug, Clone, PartialEq, Eq)]
struct Hit {
    url: String,
    title: String,
    context: String,
}

/// Ranked code host results plus whether any sub-search answered
#[derive(Debug, Default)]
pub(crate) struct GitHubSearchOutcome {
    pub results: Vec<SearchResult>,
    pub any_succeeded: bool,
}

fn excerpt(body: Option<&str>) -> String {
    let body = body.unwrap_or_default();
    if body.chars().count() > BODY_EXCERPT_CHARS {
        let mut cut: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
        cut.push_str("...");
        cut
    } else {
        body.to_string()
    }
}

async fn fetch_items<T: DeserializeOwned>(
    config: &GatewayConfig,
    client: &HttpClient,
    kind: SubSearch,
    phrase: &str,
    repo: &str,
    limit: usize,
) -> Result<Vec<T>, GatewayError> {
    let base = format!(
        "{}/{}",
        config.github_api_url.trim_end_matches('/'),
        kind.endpoint()
    );
    let per_page = limit.to_string();
    let query = kind.query(phrase, repo);
    let url = with_query(&base, &[("q", query.as_str()), ("per_page", per_page.as_str())])?;
    let page: SearchPage<T> = client.get_json(&url).await?;
    Ok(page.items)
}

async fn sub_search(
    config: &GatewayConfig,
    client: &HttpClient,
    kind: SubSearch,
    phrase: &str,
    repo: &str,
    limit: usize,
) -> Result<Vec<Hit>, GatewayError> {
    let hits = match kind {
        SubSearch::Code => fetch_items::<CodeItem>(config, client, kind, phrase, repo, limit)
            .await?
            .into_iter()
            .map(|item| Hit {
                url: item.html_url,
                title: format!("[Code] {} - {}", item.name, repo),
                context: item.path,
            })
            .collect(),
        SubSearch::Issues | SubSearch::PullRequests => {
            let tag = if kind == SubSearch::Issues { "[Issue]" } else { "[PR]" };
            fetch_items::<IssueItem>(config, client, kind, phrase, repo, limit)
                .await?
                .into_iter()
                .map(|item| Hit {
                    context: excerpt(item.body.as_deref()),
                    url: item.html_url,
                    title: format!("{} {} - {}", tag, item.title, repo),
                })
                .collect()
        }
    };
    Ok(hits)
}

/// Run the three sub-searches of one repository, in code, issues, PRs order
async fn search_repository(
    config: &GatewayConfig,
    client: &HttpClient,
    phrase: &str,
    repo: &str,
    limit: usize,
) -> [Result<Vec<Hit>, GatewayError>; 3] {
    let (code, issues, pulls) = futures::join!(
        sub_search(config, client, SubSearch::Code, phrase, repo, limit),
        sub_search(config, client, SubSearch::Issues, phrase, repo, limit),
        sub_search(config, client, SubSearch::PullRequests, phrase, repo, limit)
    );
    [code, issues, pulls]
}

/// Search every configured repository
pub(crate) async fn search_repositories(
    config: &GatewayConfig,
    phrase: &str,
    limit: usize,
) -> GitHubSearchOutcome {
    let client = match HttpClient::new(config, Backend::GitHub, config.api_timeout) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to create GitHub client");
            return GitHubSearchOutcome::default();
        }
    };

    let per_repo = join_all(
        config
            .repositories
            .iter()
            .map(|repo| search_repository(config, &client, phrase, repo, limit)),
    )
    .await;

    rank_hits(&config.repositories, per_repo)
}

fn rank_hits(
    repositories: &[String],
    per_repo: Vec<[Result<Vec<Hit>, GatewayError>; 3]>,
) -> GitHubSearchOutcome {
    let kinds = [SubSearch::Code, SubSearch::Issues, SubSearch::PullRequests];
    let mut outcome = GitHubSearchOutcome::default();
    let mut rank = 0;

    for (repo, searches) in repositories.iter().zip(per_repo) {
        let mut repo_answered = false;
        for (kind, result) in kinds.iter().zip(searches) {
            match result {
                Ok(hits) => {
                    repo_answered = true;
                    debug!(repo = %repo, kind = kind.name(), count = hits.len(), "GitHub search results");
                    for hit in hits {
                        rank += 1;
                        outcome.results.push(SearchResult {
                            rank_order: rank,
                            url: hit.url,
                            title: hit.title,
                            context: Some(hit.context),
                        });
                    }
                }
                Err(e) => {
                    warn!(repo = %repo, kind = kind.name(), error = %e, "GitHub search failed");
                }
            }
        }
        if repo_answered {
            outcome.any_succeeded = true;
        } else {
            error!(repo = %repo, "Every GitHub search failed for repository");
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(title: &str) -> Hit {
        Hit {
            url: format!("https://github.com/{}", title),
            title: title.to_string(),
            context: String::new(),
        }
    }

    #[test]
    fn test_queries() {
        assert_eq!(SubSearch::Code.query("kms", "a/b"), "kms repo:a/b");
        assert_eq!(SubSearch::Issues.query("kms", "a/b"), "kms repo:a/b is:issue");
        assert_eq!(SubSearch::PullRequests.query("kms", "a/b"), "kms repo:a/b is:pr");
        assert_eq!(SubSearch::PullRequests.endpoint(), "search/issues");
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt(None), "");
        assert_eq!(excerpt(Some("short")), "short");
        let long = "x".repeat(250);
        let cut = excerpt(Some(&long));
        assert_eq!(cut.chars().count(), 203);
        assert!(cut.ends_with("..."));
        assert_eq!(excerpt(Some(&"y".repeat(200))), "y".repeat(200));
    }

    #[test]
    fn test_rank_counter_runs_across_kinds_and_repositories() {
        let repos = vec!["a/one".to_string(), "b/two".to_string()];
        let per_repo = vec![
            [Ok(vec![hit("c1"), hit("c2")]), Ok(vec![hit("i1")]), Ok(vec![])],
            [Ok(vec![]), Ok(vec![]), Ok(vec![hit("p1")])],
        ];
        let outcome = rank_hits(&repos, per_repo);
        let ranked: Vec<_> = outcome
            .results
            .iter()
            .map(|r| (r.rank_order, r.title.as_str()))
            .collect();
        assert_eq!(ranked, vec![(1, "c1"), (2, "c2"), (3, "i1"), (4, "p1")]);
        assert!(outcome.any_succeeded);
    }

    #[test]
    fn test_failed_sub_search_does_not_abort_siblings() {
        let repos = vec!["a/one".to_string(), "b/two".to_string()];
        let per_repo = vec![
            [Err(GatewayError::Timeout), Ok(vec![hit("i1")]), Err(GatewayError::Timeout)],
            [Err(GatewayError::Timeout), Err(GatewayError::Timeout), Err(GatewayError::Timeout)],
        ];
        let outcome = rank_hits(&repos, per_repo);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].rank_order, 1);
        assert!(outcome.any_succeeded);
    }

    #[test]
    fn test_all_failed() {
        let repos = vec!["a/one".to_string()];
        let per_repo = vec![[
            Err(GatewayError::Timeout),
            Err(GatewayError::Timeout),
            Err(GatewayError::Timeout),
        ]];
        let outcome = rank_hits(&repos, per_repo);
        assert!(outcome.results.is_empty());
        assert!(!outcome.any_succeeded);
    }

    #[test]
    fn test_item_parsing_tolerates_missing_fields() {
        let page: SearchPage<IssueItem> =
            serde_json::from_str(r#"{"items":[{"title":"t"}]}"#).unwrap();
        assert_eq!(page.items[0].html_url, "");
        assert!(page.items[0].body.is_none());
        let empty: SearchPage<CodeItem> = serde_json::from_str("{}").unwrap();
        assert!(empty.items.is_empty());
    }
}
