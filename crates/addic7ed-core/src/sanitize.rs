//! String sanitization shared by subtitle providers
//!
//! Normalizes series names and release groups so that values scraped from
//! different sites compare equal.

use std::sync::LazyLock;

use regex::Regex;

/// Characters replaced by a single space
const SPACED_CHARACTERS: [char; 6] = ['-', ':', '(', ')', '.', ','];

/// Characters removed outright
const REMOVED_CHARACTERS: [char; 1] = ['\''];

static BRACKETED_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\w+\]").expect("bracketed tag regex should be valid"));

/// Sanitizes a string for comparison
///
/// Replaces `- : ( ) . ,` with spaces, drops apostrophes, collapses
/// whitespace, trims and lower-cases.
///
/// # Example
/// ```
/// use addic7ed_core::sanitize::sanitize;
/// assert_eq!(sanitize("The Wire (US)"), "the wire us");
/// ```
pub fn sanitize(string: &str) -> String {
    sanitize_ignoring(string, &[])
}

/// Same as [`sanitize`], leaving every character in `ignore` untouched
pub fn sanitize_ignoring(string: &str, ignore: &[char]) -> String {
    let replaced: String = string
        .chars()
        .filter(|c| !(REMOVED_CHARACTERS.contains(c) && !ignore.contains(c)))
        .map(|c| {
            if SPACED_CHARACTERS.contains(&c) && !ignore.contains(&c) {
                ' '
            } else {
                c
            }
        })
        .collect();

    replaced
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Optional form of [`sanitize_ignoring`]; `None` stays `None`
pub fn sanitize_opt(string: Option<&str>, ignore: &[char]) -> Option<String> {
    string.map(|s| sanitize_ignoring(s, ignore))
}

/// Sanitizes a release group
///
/// Removes bracketed tags such as `[x264]`, trims and upper-cases.
///
/// # Example
/// ```
/// use addic7ed_core::sanitize::sanitize_release_group;
/// assert_eq!(sanitize_release_group("GROUP[x264]"), "GROUP");
/// ```
pub fn sanitize_release_group(string: &str) -> String {
    BRACKETED_TAG
        .replace_all(string, "")
        .trim()
        .to_uppercase()
}

/// Optional form of [`sanitize_release_group`]; `None` stays `None`
pub fn sanitize_release_group_opt(string: Option<&str>) -> Option<String> {
    string.map(sanitize_release_group)
}

/// Whether `actual` matches `title` or one of `alternative_titles`
///
/// Also accepts `actual` made of `title` followed by an alternative,
/// e.g. "The Wire US" for title "The Wire" and alternative "US".
pub fn matches_title<S: AsRef<str>>(actual: &str, title: &str, alternative_titles: &[S]) -> bool {
    let actual = sanitize(actual);
    let title = sanitize(title);
    if actual == title {
        return true;
    }

    let alternatives: Vec<String> = alternative_titles
        .iter()
        .map(|t| sanitize(t.as_ref()))
        .collect();
    if alternatives.contains(&actual) {
        return true;
    }

    match actual.strip_prefix(&title) {
        Some(rest) => alternatives.iter().any(|alt| alt == rest.trim()),
        None => false,
    }
}
