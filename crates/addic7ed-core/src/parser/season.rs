//! Season page parser for Addic7ed
//!
//! Parses `show/<id>?season=<n>` and extracts one subtitle per
//! completed row.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};
use tracing::{debug, warn};

use super::{element_text, selector};
use crate::error::{Addic7edError, Result};
use crate::language::Language;
use crate::types::Subtitle;
use crate::url::build_site_url;

static SERIES_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<series>[ \w'.:(),*&!?-]+?)(?: \((?P<year>\d{4})\))?$")
        .expect("series year regex should be valid")
});

const HEADER_SUFFIX: &str = " subtitles";
const COMPLETED: &str = "Completed";

/// Minimum number of cells in a subtitle row
const ROW_CELLS: usize = 10;

/// Parses a season page into subtitle records
///
/// Rows whose status is not `Completed` are skipped, as are rows in a
/// language the provider cannot map.
///
/// # Arguments
/// * `html` - Raw HTML string from the season page
/// * `base` - Site root used to build page links
///
/// # Errors
/// - `ElementNotFound` if the page header or a row link is missing
/// - `ParseError` if the header or a row cannot be read
pub fn parse_season_page(html: &str, base: &str) -> Result<Vec<Subtitle>> {
    let document = Html::parse_document(html);
    let header_selector = selector("#header font")?;
    let row_selector = selector("tr.epeven")?;
    let cell_selector = selector("td")?;
    let link_selector = selector("a[href]")?;

    let header = document
        .select(&header_selector)
        .next()
        .ok_or_else(|| Addic7edError::ElementNotFound("#header font".to_string()))?;
    let (series, year) = parse_header(&element_text(&header))?;

    let mut subtitles = Vec::new();
    for row in document.select(&row_selector) {
        let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
        if cells.len() < ROW_CELLS {
            return Err(Addic7edError::ParseError(format!(
                "Subtitle row has {} cells, expected at least {}",
                cells.len(),
                ROW_CELLS
            )));
        }

        let status = element_text(&cells[5]);
        let status = status.trim();
        if status != COMPLETED {
            debug!("Ignoring subtitle with status {}", status);
            continue;
        }

        let language_name = element_text(&cells[3]);
        let Some(language) = Language::from_addic7ed(&language_name) else {
            warn!("Ignoring subtitle in unknown language {:?}", language_name.trim());
            continue;
        };

        let page_href = first_href(&cells[2], &link_selector)?;
        let download_href = first_href(&cells[9], &link_selector)?;

        let subtitle = Subtitle {
            language,
            hearing_impaired: !element_text(&cells[6]).trim().is_empty(),
            page_link: build_site_url(base, page_href),
            series: series.clone(),
            season: parse_number(&cells[0], "season")?,
            episode: parse_number(&cells[1], "episode")?,
            title: element_text(&cells[2]).trim().to_string(),
            year,
            version: element_text(&cells[4]).trim().to_string(),
            download_link: download_href.trim_start_matches('/').to_string(),
            content: None,
        };

        debug!("Found subtitle {}", subtitle.info());
        subtitles.push(subtitle);
    }

    Ok(subtitles)
}

/// Splits "Name (YYYY) subtitles" into the series name and optional year
fn parse_header(text: &str) -> Result<(String, Option<i32>)> {
    let text = text.trim();
    let text = text.strip_suffix(HEADER_SUFFIX).unwrap_or(text);

    let captures = SERIES_YEAR
        .captures(text)
        .ok_or_else(|| Addic7edError::ParseError(format!("Unexpected page header: {:?}", text)))?;

    let series = captures
        .name("series")
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    let year = captures.name("year").and_then(|m| m.as_str().parse().ok());

    Ok((series, year))
}

fn first_href<'a>(cell: &ElementRef<'a>, link_selector: &scraper::Selector) -> Result<&'a str> {
    cell.select(link_selector)
        .next()
        .and_then(|a| a.value().attr("href"))
        .ok_or_else(|| Addic7edError::ElementNotFound("subtitle row link".to_string()))
}

fn parse_number(cell: &ElementRef, what: &str) -> Result<u32> {
    let text = element_text(cell);
    text.trim()
        .parse()
        .map_err(|_| Addic7edError::ParseError(format!("Invalid {} number: {:?}", what, text.trim())))
}
