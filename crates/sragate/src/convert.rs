//! HTML to markdown extraction for documentation pages
//!
//! Picks the main content region of a page, deletes navigation chrome inside
//! it, and renders what is left as markdown. Never fails: every error path
//! returns a marker string starting with `<e>`.

use ego_tree::NodeId;
use htmd::options::{BrStyle, HeadingStyle, Options};
use htmd::HtmlToMarkdown;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

/// Returned for empty input
pub const EMPTY_CONTENT_MARKER: &str = "<e>Empty HTML content</e>";

/// Returned when conversion produced nothing
pub const SIMPLIFY_FAILED_MARKER: &str = "<e>Page failed to be simplified from HTML</e>";

/// Prefix shared by every extractor failure
pub const ERROR_MARKER: &str = "<e>";

/// Main content candidates, most specific first
pub const CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    "#main-content",
    ".main-content",
    "#content",
    ".content",
    "div[role='main']",
    "#awsdocs-content",
    ".awsui-article",
];

/// Chrome removed from the selected region
pub const NAV_SELECTORS: &[&str] = &[
    "noscript",
    ".prev-next",
    "#main-col-footer",
    ".awsdocs-page-utilities",
    "#quick-feedback-yes",
    "#quick-feedback-no",
    ".page-loading-indicator",
    "#tools-panel",
    ".doc-cookie-banner",
    "awsdocs-copyright",
    "awsdocs-thumb-feedback",
    ".breadcrumb",
    "#breadcrumbs",
    ".pagination",
    "[aria-label='Breadcrumbs']",
];

/// Tags dropped with their contents wherever they appear
pub const DROPPED_TAGS: &[&str] = &["script", "style", "noscript", "meta", "link"];

/// Tags removed while their children stay in place
pub const UNWRAPPED_TAGS: &[&str] = &[
    "footer",
    "nav",
    "aside",
    "header",
    "awsdocs-cookie-consent-container",
    "awsdocs-feedback-container",
    "awsdocs-page-header",
    "awsdocs-page-header-container",
    "awsdocs-filter-selector",
    "awsdocs-breadcrumb-container",
    "awsdocs-page-footer",
    "awsdocs-page-footer-container",
    "awsdocs-footer",
    "cloudscape-board",
    "cloudscape-board-item",
];

/// Extract the main content of a documentation page as markdown
pub fn extract_content_from_html(html: &str) -> String {
    if html.is_empty() {
        return EMPTY_CONTENT_MARKER.to_string();
    }

    let region = select_main_content(html);

    match render_markdown(&region) {
        Ok(markdown) if markdown.trim().is_empty() => SIMPLIFY_FAILED_MARKER.to_string(),
        Ok(markdown) => markdown,
        Err(e) => {
            warn!(error = %e, "HTML conversion failed");
            format!("<e>Error converting HTML to Markdown: {}</e>", e)
        }
    }
}

/// Serialize the main content region with navigation elements removed and
/// structural wrappers unwrapped
///
/// `Html` is not `Send`; keep it inside this synchronous function.
fn select_main_content(html: &str) -> String {
    let mut document = Html::parse_document(html);

    let region_id = CONTENT_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| document.select(&selector).next().map(|el| el.id()))
        .or_else(|| {
            Selector::parse("body")
                .ok()
                .and_then(|body| document.select(&body).next().map(|el| el.id()))
        })
        .unwrap_or_else(|| document.root_element().id());

    let (doomed, wrappers): (Vec<_>, Vec<_>) =
        match document.tree.get(region_id).and_then(ElementRef::wrap) {
            Some(region) => (
                matching_ids(region, NAV_SELECTORS)
                    .filter(|id| *id != region_id)
                    .collect(),
                matching_ids(region, UNWRAPPED_TAGS)
                    .filter(|id| *id != region_id)
                    .collect(),
            ),
            None => (Vec::new(), Vec::new()),
        };

    for id in doomed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    // Hoist children in front of the wrapper, then drop the empty wrapper
    for id in wrappers {
        let Some(wrapper) = document.tree.get(id) else {
            continue;
        };
        if wrapper.parent().is_none() {
            continue;
        }
        let children: Vec<_> = wrapper.children().map(|child| child.id()).collect();
        if let Some(mut node) = document.tree.get_mut(id) {
            for child in children {
                node.insert_id_before(child);
            }
            node.detach();
        }
    }

    document
        .tree
        .get(region_id)
        .and_then(ElementRef::wrap)
        .map(|region| region.html())
        .unwrap_or_default()
}

fn matching_ids<'a>(
    region: ElementRef<'a>,
    selectors: &'a [&'a str],
) -> impl Iterator<Item = NodeId> + 'a {
    selectors
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .flat_map(move |selector| region.select(&selector).map(|el| el.id()).collect::<Vec<_>>())
}

fn render_markdown(html: &str) -> std::io::Result<String> {
    let converter = HtmlToMarkdown::builder()
        .skip_tags(DROPPED_TAGS.to_vec())
        .options(Options {
            heading_style: HeadingStyle::Atx,
            br_style: BrStyle::TwoSpaces,
            ..Default::default()
        })
        .build();
    converter.convert(html)
}

/// True when `text` is one of the extractor's failure markers
pub fn is_error_marker(text: &str) -> bool {
    text.starts_with(ERROR_MARKER)
}
