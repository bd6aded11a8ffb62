//! Prompt sanitization.
//!
//! Incoming prompt text is reduced to a blunt allow-list before routing
//! and before being recorded into history: markup tags are stripped
//! (including their enclosed content for paired tags), every character
//! outside word characters, whitespace, and basic punctuation is dropped,
//! and whitespace runs are collapsed. This is the system's only defense
//! against injection-style payloads riding along in the prompt, so it is
//! applied uniformly regardless of which agent the prompt targets.

use once_cell::sync::Lazy;
use regex::Regex;

/// `<tag>content</tag>` blocks. The regex crate has no backreferences, so
/// this matches any paired open/close tag with tag-free content between
/// them, which covers the markup payloads the filter is aimed at. Tags
/// must open with a letter; a bare `<` in comparison text is not a tag
/// and falls through to the character filter instead.
static TAG_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<[A-Za-z][^<>]*>[^<]*</[A-Za-z][^<>]*>").expect("tag block pattern is valid")
});

/// Any remaining lone `<tag>` or `</tag>`.
static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?[A-Za-z][^<>]*>").expect("tag pattern is valid"));

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

fn is_allowed(c: char) -> bool {
    c.is_alphanumeric()
        || c == '_'
        || c.is_whitespace()
        || matches!(c, '.' | ',' | '!' | '?' | '-' | '/')
}

/// Sanitize a raw prompt.
///
/// # Example
///
/// ```rust
/// use ensemble_core::sanitize_prompt;
///
/// assert_eq!(
///     sanitize_prompt("<script>alert(1)</script> generate ui"),
///     "generate ui"
/// );
/// assert_eq!(
///     sanitize_prompt("list files && rm -rf /"),
///     "list files rm -rf /"
/// );
/// ```
pub fn sanitize_prompt(raw: &str) -> String {
    let stripped = TAG_BLOCK_RE.replace_all(raw, " ");
    let stripped = TAG_RE.replace_all(&stripped, " ");
    let filtered: String = stripped.chars().filter(|c| is_allowed(*c)).collect();
    WHITESPACE_RE
        .replace_all(filtered.trim(), " ")
        .into_owned()
}
