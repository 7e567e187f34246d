//! Download filename derived from the user-supplied title.

use std::sync::LazyLock;

use regex::Regex;

/// Title used when the request omits one, and fallback filename stem.
pub const DEFAULT_TITLE: &str = "Horror Short";

/// Anything that is not a letter, digit, space, underscore or hyphen.
static ILLEGAL_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N} _-]").expect("valid regex"));

/// Strip characters unsafe for a filename and trim the result.
///
/// # Examples
///
/// ```
/// use storyreel_core::naming::sanitize_title;
///
/// assert_eq!(sanitize_title("My Title! #1"), "My Title 1");
/// assert_eq!(sanitize_title("!!!"), "Horror Short");
/// ```
pub fn sanitize_title(title: &str) -> String {
    let cleaned = ILLEGAL_CHARS_RE.replace_all(title, "");
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        trimmed.to_string()
    }
}

/// `<sanitized title>.mp4`
pub fn output_filename(title: &str) -> String {
    format!("{}.mp4", sanitize_title(title))
}
