//! Keyword relevance heuristics

/// Keywords marking a search hit as security or compliance content
pub const SECURITY_KEYWORDS: &[&str] = &[
    "security",
    "compliance",
    "governance",
    "audit",
    "protection",
    "sra",
    "reference architecture",
    "securityhub",
    "iam",
    "identity",
    "permission",
    "encryption",
    "kms",
    "guard",
    "firewall",
    "waf",
    "shield",
    "detective",
    "inspector",
    "macie",
];

/// Keywords recommendations match on top of [`SECURITY_KEYWORDS`]
pub const RECOMMENDATION_EXTRA_KEYWORDS: &[&str] = &["security incident response"];

/// Case-insensitive match of any keyword against url, title or context
pub fn is_security_related(
    keywords: &[&str],
    url: &str,
    title: &str,
    context: Option<&str>,
) -> bool {
    matches_any(keywords.iter(), url, title, context)
}

/// Relevance check for recommendations, using the extended keyword list
pub fn is_recommendation_related(url: &str, title: &str, context: Option<&str>) -> bool {
    let keywords = SECURITY_KEYWORDS
        .iter()
        .chain(RECOMMENDATION_EXTRA_KEYWORDS);
    matches_any(keywords, url, title, context)
}

fn matches_any<'k>(
    mut keywords: impl Iterator<Item = &'k &'k str>,
    url: &str,
    title: &str,
    context: Option<&str>,
) -> bool {
    let url = url.to_lowercase();
    let title = title.to_lowercase();
    let context = context.map(str::to_lowercase);

    keywords.any(|keyword| {
        url.contains(keyword)
            || title.contains(keyword)
            || context.as_deref().is_some_and(|c| c.contains(keyword))
    })
}
