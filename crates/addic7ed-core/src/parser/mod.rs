//! HTML parsers for Addic7ed
//!
//! Contains modules for parsing different page types.

pub mod season;
pub mod shows;

pub use season::parse_season_page;
pub use shows::{SearchSuggestion, parse_search_suggestion, parse_show_ids};

use scraper::{ElementRef, Selector};

use crate::error::{Addic7edError, Result};

/// Compiles a CSS selector, mapping failures to `ParseError`
pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| Addic7edError::ParseError(format!("Invalid selector: {:?}", e)))
}

/// All text below an element, concatenated
pub(crate) fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>()
}
