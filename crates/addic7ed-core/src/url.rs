//! URL helper functions for Addic7ed
//!
//! Provides functions for building catalog, search, season and download
//! URLs against a base URL ending with `/`.

/// Default site root
pub const BASE_URL: &str = "https://www.addic7ed.com/";

/// Builds the full show catalog URL
///
/// # Example
/// ```
/// use addic7ed_core::url::{build_shows_url, BASE_URL};
/// assert_eq!(build_shows_url(BASE_URL), "https://www.addic7ed.com/shows.php");
/// ```
pub fn build_shows_url(base: &str) -> String {
    format!("{}shows.php", base)
}

/// Builds the show search URL for a given query
///
/// # Example
/// ```
/// use addic7ed_core::url::{build_search_url, BASE_URL};
/// let url = build_search_url(BASE_URL, "the wire 2002");
/// assert_eq!(url, "https://www.addic7ed.com/srch.php?search=the%20wire%202002&Submit=Search");
/// ```
pub fn build_search_url(base: &str, query: &str) -> String {
    let encoded = urlencoding::encode(query);
    format!("{}srch.php?search={}&Submit=Search", base, encoded)
}

/// Builds the season listing URL of a show
///
/// # Example
/// ```
/// use addic7ed_core::url::{build_season_url, BASE_URL};
/// assert_eq!(build_season_url(BASE_URL, 1245, 3), "https://www.addic7ed.com/show/1245?season=3");
/// ```
pub fn build_season_url(base: &str, show_id: u32, season: u32) -> String {
    format!("{}show/{}?season={}", base, show_id, season)
}

/// Joins a site-relative link (with or without leading `/`) onto the base
///
/// # Example
/// ```
/// use addic7ed_core::url::{build_site_url, BASE_URL};
/// assert_eq!(build_site_url(BASE_URL, "/updated/1/123/0"), "https://www.addic7ed.com/updated/1/123/0");
/// ```
pub fn build_site_url(base: &str, link: &str) -> String {
    format!("{}{}", base, link.trim_start_matches('/'))
}

/// Extracts the numeric show id from a `/show/<id>` href
///
/// # Returns
/// `Some(id)` if the href has the expected shape, `None` otherwise
///
/// # Example
/// ```
/// use addic7ed_core::url::extract_show_id;
/// assert_eq!(extract_show_id("/show/1245"), Some(1245));
/// assert_eq!(extract_show_id("/serie/x"), None);
/// ```
pub fn extract_show_id(href: &str) -> Option<u32> {
    let id = href.strip_prefix("/show/")?;
    let id = id.split(['?', '/']).next().unwrap_or(id);
    id.parse().ok()
}

/// Makes sure a configured base URL ends with a single `/`
pub fn normalize_base_url(base: &str) -> String {
    format!("{}/", base.trim_end_matches('/'))
}
