//! Search aggregation over the documentation and code host backends
//!
//! Both backends are queried concurrently and merged after both finish.
//! Documentation hits are filtered for security relevance, then the result
//! budget is split between the two sources, favoring code host content.

mod docs;
mod github;

use crate::config::GatewayConfig;
use crate::relevance::{is_security_related, SECURITY_KEYWORDS};
use crate::types::SearchResult;
use tracing::{debug, error};

/// Title of the synthetic record returned when every backend failed
///
/// Only failures count: backends that answer with no hits yield `[]`.
pub const SEARCH_FAILED_MESSAGE: &str =
    "Failed to retrieve search results from both AWS documentation and GitHub repositories";

/// Split `limit` into (documentation, code host) allocations
///
/// Even limits split evenly. Odd limits give the code host one more than
/// half and documentation one fewer.
pub fn split_budget(limit: usize) -> (usize, usize) {
    let half = limit / 2;
    if limit % 2 == 0 {
        (half, half)
    } else {
        (half.saturating_sub(1), half + 1)
    }
}

/// Keep security related documentation hits; pad with the rest while fewer
/// than `limit` have been kept
pub fn filter_documentation(results: Vec<SearchResult>, limit: usize) -> Vec<SearchResult> {
    let mut kept = Vec::with_capacity(results.len());
    for result in results {
        let related = is_security_related(
            SECURITY_KEYWORDS,
            &result.url,
            &result.title,
            result.context.as_deref(),
        );
        if related || kept.len() < limit {
            kept.push(result);
        }
    }
    kept
}

/// Filter, budget and order the two result lists
pub fn merge_results(
    docs: Vec<SearchResult>,
    github: Vec<SearchResult>,
    limit: usize,
) -> Vec<SearchResult> {
    let filtered = filter_documentation(docs, limit);
    let (docs_limit, mut github_limit) = split_budget(limit);
    if docs_limit > filtered.len() {
        github_limit = limit - filtered.len();
    }

    let mut combined: Vec<SearchResult> = filtered.into_iter().take(docs_limit).collect();
    combined.extend(github.into_iter().take(github_limit));
    combined.sort_by_key(|result| result.rank_order);
    combined
}

/// Search both backends and merge the results
pub(crate) async fn search(config: &GatewayConfig, phrase: &str, limit: usize) -> Vec<SearchResult> {
    debug!(phrase = %phrase, limit, "Searching");

    let (docs, github) = futures::join!(
        docs::search_documentation(config, phrase, limit),
        github::search_repositories(config, phrase, limit)
    );

    let docs_failed = docs.is_err();
    let docs = docs.unwrap_or_else(|e| {
        error!(error = %e, "Error searching documentation");
        Vec::new()
    });

    if docs_failed && !github.any_succeeded {
        error!("{}", SEARCH_FAILED_MESSAGE);
        return vec![SearchResult::error(SEARCH_FAILED_MESSAGE)];
    }

    debug!(
        docs = docs.len(),
        github = github.results.len(),
        "Merging search results"
    );
    merge_results(docs, github.results, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(rank: usize, title: &str) -> SearchResult {
        SearchResult {
            rank_order: rank,
            url: format!("https://example.com/{}", rank),
            title: title.to_string(),
            context: Some(String::new()),
        }
    }

    #[test]
    fn test_split_budget() {
        assert_eq!(split_budget(10), (5, 5));
        assert_eq!(split_budget(4), (2, 2));
        assert_eq!(split_budget(7), (2, 4));
        assert_eq!(split_budget(1), (0, 1));
        assert_eq!(split_budget(3), (0, 2));
    }

    #[test]
    fn test_filter_pads_with_unrelated_until_limit() {
        let docs = vec![
            result(1, "Billing"),
            result(2, "Pricing"),
            result(3, "IAM roles"),
            result(4, "Cost"),
        ];
        let kept = filter_documentation(docs, 2);
        let titles: Vec<_> = kept.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Billing", "Pricing", "IAM roles"]);
    }

    #[test]
    fn test_merge_limit_four() {
        let docs = vec![
            result(1, "Security d1"),
            result(2, "Security d2"),
            result(3, "Security d3"),
        ];
        let github = vec![
            result(1, "[Code] g1"),
            result(2, "[Code] g2"),
            result(3, "[Issue] g3"),
            result(4, "[PR] g4"),
        ];
        let merged = merge_results(docs, github, 4);
        assert_eq!(merged.len(), 4);
        let titles: Vec<_> = merged.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Security d1", "[Code] g1", "Security d2", "[Code] g2"]
        );
        assert!(merged.windows(2).all(|w| w[0].rank_order <= w[1].rank_order));
    }

    #[test]
    fn test_shortfall_moves_to_code_host() {
        let docs = vec![result(1, "Security d1")];
        let github: Vec<_> = (1..=10).map(|i| result(i, "[Code] g")).collect();
        let merged = merge_results(docs, github, 10);
        assert_eq!(merged.len(), 10);
        assert_eq!(merged.iter().filter(|r| r.title.starts_with("[Code]")).count(), 9);
    }

    #[test]
    fn test_merge_with_no_results() {
        assert!(merge_results(Vec::new(), Vec::new(), 10).is_empty());
    }
}
