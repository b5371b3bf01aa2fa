//! Error types for the Addic7ed scraper
//!
//! Provides a comprehensive error enum with human-readable messages
//! and string serialization for front ends.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Body returned by Addic7ed when it refuses to serve a page.
pub const SERVER_BUSY_MESSAGE: &str = "Server too busy. Please try again later.";

/// Error type for all Addic7ed scraper operations
#[derive(Error, Debug)]
pub enum Addic7edError {
    /// Request did not complete within the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Site answered with its busy page
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Server answered with a 4xx or 5xx status
    #[error("{message}")]
    HttpStatus { status: u16, message: String },

    /// Browser cookies could not be obtained
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Site served an HTML page where a subtitle file was expected
    #[error("Download limit exceeded")]
    DownloadLimitExceeded,

    /// Connection, TLS or body transfer failure
    #[error("HTTP transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Failed to parse HTML content
    #[error("Failed to parse HTML: {0}")]
    ParseError(String),

    /// Expected HTML element was not found
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Configuration value cannot be used (e.g., a non-ASCII header)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Provider used before `initialize` or after `terminate`
    #[error("Provider is not initialized")]
    NotInitialized,

    /// Local file access failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Browser cookie database could not be read
    #[error("Cookie store error: {0}")]
    Cookies(#[from] rusqlite::Error),
}

impl From<reqwest::Error> for Addic7edError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            let url = error
                .url()
                .map(|u| u.to_string())
                .unwrap_or_else(|| "<unknown>".to_string());
            Addic7edError::Timeout(url)
        } else {
            Addic7edError::Transport(error)
        }
    }
}

impl Serialize for Addic7edError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias for Addic7ed operations
pub type Result<T> = std::result::Result<T, Addic7edError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_parse_error() {
        let error = Addic7edError::ParseError("missing header".to_string());
        assert_eq!(error.to_string(), "Failed to parse HTML: missing header");
    }

    #[test]
    fn test_error_display_http_status() {
        let error = Addic7edError::HttpStatus {
            status: 404,
            message: "404 Client Error: Not Found for url: https://www.addic7ed.com/x".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "404 Client Error: Not Found for url: https://www.addic7ed.com/x"
        );
    }

    #[test]
    fn test_error_display_service_unavailable() {
        let error = Addic7edError::ServiceUnavailable(SERVER_BUSY_MESSAGE.to_string());
        assert_eq!(
            error.to_string(),
            "Service unavailable: Server too busy. Please try again later."
        );
    }

    #[test]
    fn test_error_display_download_limit() {
        assert_eq!(
            Addic7edError::DownloadLimitExceeded.to_string(),
            "Download limit exceeded"
        );
    }

    #[test]
    fn test_error_display_authentication() {
        let error = Addic7edError::Authentication("missing PHPSESSID".to_string());
        assert_eq!(error.to_string(), "Authentication failed: missing PHPSESSID");
    }

    #[test]
    fn test_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error: Addic7edError = io.into();
        assert!(matches!(error, Addic7edError::Io(_)));
    }

    #[test]
    fn test_error_serialize() {
        let error = Addic7edError::NotInitialized;
        let json = serde_json::to_string(&error).expect("Serialization should succeed");
        assert_eq!(json, "\"Provider is not initialized\"");
    }

    #[test]
    fn test_error_serialize_with_message() {
        let error = Addic7edError::Timeout("https://www.addic7ed.com/shows.php".to_string());
        let json = serde_json::to_string(&error).expect("Serialization should succeed");
        assert_eq!(json, "\"Request timed out: https://www.addic7ed.com/shows.php\"");
    }
}
