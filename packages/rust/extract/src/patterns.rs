//! Label patterns and text cleanup shared by the extractors.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

/// Runs of whitespace (including newlines) inside anchor text.
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Compile the pattern matching `"<label>:"` and capturing the rest of the line.
///
/// Whitespace after the colon never crosses a line break, so a label at the
/// end of a line captures an empty value instead of the next line.
pub(crate) fn label_pattern(label: &str) -> Option<Regex> {
    let pattern = format!(r"{}:[ \t]*([^\r\n]*)", regex::escape(label));
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(label, error = %e, "label pattern failed to compile, field will be empty");
            None
        }
    }
}

/// If `line` starts with `"<label>:"` (ignoring leading whitespace), return
/// the trimmed remainder.
pub(crate) fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    line.trim_start()
        .strip_prefix(label)?
        .strip_prefix(':')
        .map(str::trim)
}

/// Collapse internal whitespace runs to single spaces and trim the ends.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}
