//! Pagination of read results
//!
//! Lengths and offsets are counted in characters, never bytes, so a window
//! boundary can't split a multi-byte code point.

use crate::types::PaginationWindow;
use tracing::debug;

/// Content type used when a reader does not specify one
pub const DEFAULT_CONTENT_TYPE: &str = "Documentation";

/// Slice `content` to the requested window and wrap it with a header and,
/// when more content remains, a continuation notice.
pub fn format_result(
    source_label: &str,
    url: &str,
    content: &str,
    window: PaginationWindow,
    content_type: &str,
) -> String {
    let header = format!("{} {} from {}:\n\n", source_label, content_type, url);
    let total = content.chars().count();

    if window.start_index >= total {
        return no_more_content(header);
    }

    let slice: String = content
        .chars()
        .skip(window.start_index)
        .take(window.max_length)
        .collect();

    if slice.is_empty() {
        return no_more_content(header);
    }

    let slice_len = slice.chars().count();
    let next_start = window.start_index + slice_len;

    let mut output = header;
    output.push_str(&slice);

    if next_start < total {
        output.push_str(&format!(
            "\n\n<e>Content truncated. Call the read tool with start_index={} to get more content.</e>",
            next_start
        ));
    }

    output
}

fn no_more_content(mut header: String) -> String {
    header.push_str("<e>No more content available.</e>");
    header
}

/// Log when a read returns less than the whole document
pub fn log_truncation(content: &str, window: PaginationWindow) {
    let total = content.chars().count();
    let end = window.start_index.saturating_add(window.max_length);
    if total > end {
        debug!(truncated_at = end, total, "Content truncated");
    }
}
