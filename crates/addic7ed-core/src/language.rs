//! Language codes and Addic7ed language-name conversion

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Addic7edError;

/// Subtitle language as an ISO 639-3 code with an optional country
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Language {
    /// ISO 639-3 code (e.g., "eng")
    pub alpha3: String,

    /// ISO 3166-1 alpha-2 country (e.g., "BR")
    pub country: Option<String>,
}

/// Site name -> (alpha3, country)
const ADDIC7ED_NAMES: &[(&str, &str, Option<&str>)] = &[
    ("Arabic", "ara", None),
    ("Azerbaijani", "aze", None),
    ("Bengali", "ben", None),
    ("Bosnian", "bos", None),
    ("Bulgarian", "bul", None),
    ("Català", "cat", None),
    ("Catalan", "cat", None),
    ("Chinese (Simplified)", "zho", None),
    ("Chinese (Traditional)", "zho", None),
    ("Croatian", "hrv", None),
    ("Czech", "ces", None),
    ("Danish", "dan", None),
    ("Dutch", "nld", None),
    ("English", "eng", None),
    ("Euskera", "eus", None),
    ("Finnish", "fin", None),
    ("French", "fra", None),
    ("French (Canadian)", "fra", None),
    ("Galego", "glg", None),
    ("German", "deu", None),
    ("Greek", "ell", None),
    ("Hebrew", "heb", None),
    ("Hungarian", "hun", None),
    ("Armenian", "hye", None),
    ("Indonesian", "ind", None),
    ("Italian", "ita", None),
    ("Japanese", "jpn", None),
    ("Korean", "kor", None),
    ("Macedonian", "mkd", None),
    ("Malay", "msa", None),
    ("Norwegian", "nor", None),
    ("Persian", "fas", None),
    ("Polish", "pol", None),
    ("Portuguese", "por", None),
    ("Portuguese (Brazilian)", "por", Some("BR")),
    ("Romanian", "ron", None),
    ("Russian", "rus", None),
    ("Serbian (Cyrillic)", "srp", None),
    ("Serbian (Latin)", "srp", None),
    ("Slovak", "slk", None),
    ("Slovenian", "slv", None),
    ("Spanish", "spa", None),
    ("Spanish (Latin America)", "spa", None),
    ("Spanish (Spain)", "spa", None),
    ("Albanian", "sqi", None),
    ("Swedish", "swe", None),
    ("Thai", "tha", None),
    ("Turkish", "tur", None),
    ("Ukrainian", "ukr", None),
    ("Vietnamese", "vie", None),
];

/// Languages served by Addic7ed
const SUPPORTED: &[&str] = &[
    "ara", "aze", "ben", "bos", "bul", "cat", "ces", "dan", "deu", "ell", "eng", "eus", "fas",
    "fin", "fra", "glg", "heb", "hrv", "hun", "hye", "ind", "ita", "jpn", "kor", "mkd", "msa",
    "nld", "nor", "pol", "por", "ron", "rus", "slk", "slv", "spa", "sqi", "srp", "swe", "tha",
    "tur", "ukr", "vie", "zho",
];

impl Language {
    /// Creates a language without a country
    pub fn new(alpha3: &str) -> Self {
        Self {
            alpha3: alpha3.to_string(),
            country: None,
        }
    }

    /// Creates a language with a country
    pub fn with_country(alpha3: &str, country: &str) -> Self {
        Self {
            alpha3: alpha3.to_string(),
            country: Some(country.to_string()),
        }
    }

    /// Converts a language name as shown on Addic7ed
    ///
    /// # Example
    /// ```
    /// use addic7ed_core::Language;
    /// let lang = Language::from_addic7ed("Portuguese (Brazilian)").unwrap();
    /// assert_eq!(lang.to_string(), "por-BR");
    /// ```
    pub fn from_addic7ed(name: &str) -> Option<Self> {
        let name = name.trim();
        ADDIC7ED_NAMES
            .iter()
            .find(|(site_name, _, _)| *site_name == name)
            .map(|(_, alpha3, country)| Self {
                alpha3: alpha3.to_string(),
                country: country.map(str::to_string),
            })
    }
}

/// Every language the provider can return
pub fn addic7ed_languages() -> Vec<Language> {
    let mut languages: Vec<Language> = SUPPORTED.iter().map(|code| Language::new(code)).collect();
    languages.push(Language::with_country("por", "BR"));
    languages
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.country {
            Some(country) => write!(f, "{}-{}", self.alpha3, country),
            None => write!(f, "{}", self.alpha3),
        }
    }
}

impl FromStr for Language {
    type Err = Addic7edError;

    /// Parses `eng` or `por-BR`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (alpha3, country) = match s.split_once('-') {
            Some((code, country)) => (code, Some(country)),
            None => (s, None),
        };

        if alpha3.len() != 3 || !alpha3.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Addic7edError::ParseError(format!(
                "Invalid language code: {}",
                s
            )));
        }

        Ok(Self {
            alpha3: alpha3.to_lowercase(),
            country: country.map(|c| c.to_uppercase()),
        })
    }
}
