//! Show catalog and show search parsers for Addic7ed
//!
//! Extracts show ids from `shows.php` and from the `srch.php` suggestion.

use std::collections::HashMap;

use scraper::Html;

use super::{element_text, selector};
use crate::error::Result;
use crate::sanitize::sanitize;
use crate::url::extract_show_id;

/// First show suggested by the search page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSuggestion {
    /// Numeric show id
    pub show_id: u32,

    /// Suggested show name, as displayed (e.g., "The Wire (2002)")
    pub title: String,
}

/// Parses the show catalog page into a map of sanitized name -> show id
///
/// # Arguments
/// * `html` - Raw HTML string from `shows.php`
///
/// # Returns
/// Map keyed by [`sanitize`]d show name, empty if no shows found
///
/// # Errors
/// Returns `ParseError` if a selector cannot be compiled
pub fn parse_show_ids(html: &str) -> Result<HashMap<String, u32>> {
    let document = Html::parse_document(html);
    let show_selector = selector(r#"td.vr > h3 > a[href^="/show/"]"#)?;

    let mut show_ids = HashMap::new();
    for show in document.select(&show_selector) {
        let Some(show_id) = show.value().attr("href").and_then(extract_show_id) else {
            continue;
        };
        show_ids.insert(sanitize(&element_text(&show)), show_id);
    }

    Ok(show_ids)
}

/// Parses the search page and returns its first suggestion
///
/// # Arguments
/// * `html` - Raw HTML string from `srch.php`
///
/// # Returns
/// `Some(SearchSuggestion)` for the first show link, `None` if there is none
///
/// # Errors
/// Returns `ParseError` if a selector cannot be compiled
pub fn parse_search_suggestion(html: &str) -> Result<Option<SearchSuggestion>> {
    let document = Html::parse_document(html);
    let link_selector = selector(r#"span.titulo > a[href^="/show/"]"#)?;
    let title_selector = selector("i")?;

    let Some(link) = document.select(&link_selector).next() else {
        return Ok(None);
    };
    let Some(show_id) = link.value().attr("href").and_then(extract_show_id) else {
        return Ok(None);
    };

    // the show name sits in an <i>; fall back to the whole link text
    let title = link
        .select(&title_selector)
        .next()
        .map(|i| element_text(&i))
        .unwrap_or_else(|| element_text(&link));

    Ok(Some(SearchSuggestion {
        show_id,
        title: title.trim().to_string(),
    }))
}
