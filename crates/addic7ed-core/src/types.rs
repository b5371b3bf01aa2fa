//! Core data types for the Addic7ed scraper
//!
//! Contains the subtitle record, the episode being looked up and the
//! properties a subtitle can match.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::language::Language;
use crate::sanitize::{matches_title, sanitize, sanitize_release_group};

/// Represents one subtitle row from an Addic7ed season page
///
/// Identity is the download link. `content` stays `None` until
/// the subtitle is downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtitle {
    /// Subtitle language
    pub language: Language,

    /// Whether the subtitle is for the hearing impaired
    pub hearing_impaired: bool,

    /// Full URL to the episode page
    pub page_link: String,

    /// Series name as shown in the page header
    pub series: String,

    /// Season number
    pub season: u32,

    /// Episode number
    pub episode: u32,

    /// Episode title
    pub title: String,

    /// Series year when the site disambiguates by year
    pub year: Option<i32>,

    /// Release version (e.g., "LOL", "720p WEB-DL")
    pub version: String,

    /// Download path relative to the site root (e.g., "updated/1/12345/0")
    pub download_link: String,

    /// Subtitle file content, line endings normalized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<u8>>,
}

/// Property of an episode matched by a subtitle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Match {
    Series,
    Season,
    Episode,
    Title,
    Year,
    ReleaseGroup,
    Resolution,
}

impl Subtitle {
    /// Unique identifier of the subtitle
    pub fn id(&self) -> &str {
        &self.download_link
    }

    /// One-line summary, e.g. "The Wire (2002) s01e02 - Detail - LOL"
    pub fn info(&self) -> String {
        let mut info = self.series.clone();
        if let Some(year) = self.year {
            info.push_str(&format!(" ({})", year));
        }
        info.push_str(&format!(" s{:02}e{:02}", self.season, self.episode));
        if !self.title.is_empty() {
            info.push_str(" - ");
            info.push_str(&self.title);
        }
        if !self.version.is_empty() {
            info.push_str(" - ");
        }
        info.push_str(&self.version);
        info
    }

    /// Properties of `episode` this subtitle matches
    pub fn matches(&self, episode: &Episode) -> HashSet<Match> {
        let mut matches = HashSet::new();

        if matches_title(&self.series, &episode.series, &episode.alternative_series) {
            matches.insert(Match::Series);
        }
        if self.season == episode.season {
            matches.insert(Match::Season);
        }
        if self.episode == episode.episode {
            matches.insert(Match::Episode);
        }
        if let Some(title) = &episode.title
            && !self.title.is_empty()
            && sanitize(title) == sanitize(&self.title)
        {
            matches.insert(Match::Title);
        }
        if episode.year.is_some() && episode.year == self.year {
            matches.insert(Match::Year);
        }
        if let Some(group) = &episode.release_group {
            let group = sanitize_release_group(group);
            let version = sanitize_release_group(&self.version);
            if !group.is_empty() && (group == version || version.contains(&group)) {
                matches.insert(Match::ReleaseGroup);
            }
        }
        if let Some(resolution) = &episode.resolution
            && !self.version.is_empty()
            && self.version.to_lowercase().contains(&resolution.to_lowercase())
        {
            matches.insert(Match::Resolution);
        }

        matches
    }
}

/// Normalizes CRLF line endings to LF
pub fn fix_line_ending(content: &[u8]) -> Vec<u8> {
    let mut fixed = Vec::with_capacity(content.len());
    let mut bytes = content.iter().peekable();
    while let Some(&byte) = bytes.next() {
        if byte == b'\r' && bytes.peek() == Some(&&b'\n') {
            continue;
        }
        fixed.push(byte);
    }
    fixed
}

/// A TV episode to look up subtitles for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    /// Series name
    pub series: String,

    /// Season number
    pub season: u32,

    /// Episode number
    pub episode: u32,

    /// Episode title, if known
    pub title: Option<String>,

    /// Series year, if known
    pub year: Option<i32>,

    /// Country code of the series (e.g., "US"), if known
    pub country: Option<String>,

    /// Other names of the series
    pub alternative_series: Vec<String>,

    /// Screen size (e.g., "720p"), if known
    pub resolution: Option<String>,

    /// Release group, if known
    pub release_group: Option<String>,
}

impl Episode {
    /// Creates an episode with only series, season and episode set
    pub fn new(series: &str, season: u32, episode: u32) -> Self {
        Self {
            series: series.to_string(),
            season,
            episode,
            ..Default::default()
        }
    }

    /// Series name followed by every alternative name
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.series.as_str()).chain(self.alternative_series.iter().map(String::as_str))
    }
}
