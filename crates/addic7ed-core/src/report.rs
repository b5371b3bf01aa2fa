//! Error classification for log routing
//!
//! Maps every [`Addic7edError`] onto a small closed set of categories and
//! logs a matching message. Nothing here retries or recovers.

use std::error::Error as StdError;

use tracing::error;

use crate::error::Addic7edError;

/// Coarse failure category used to pick a log message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The request ran out of time
    Timeout,
    /// The site reported itself unavailable
    ServiceUnavailable,
    /// The site answered with an error status
    Http { status: u16 },
    /// Connection or TLS failure; `timed_out` when the message reports a read timeout
    Transport { timed_out: bool },
    /// Anything else
    Unexpected,
}

impl ErrorCategory {
    /// Whether the full error detail belongs in the log line
    pub fn wants_detail(&self) -> bool {
        match self {
            ErrorCategory::Timeout | ErrorCategory::ServiceUnavailable => false,
            ErrorCategory::Http { status } => !(500..600).contains(status),
            ErrorCategory::Transport { timed_out } => !timed_out,
            ErrorCategory::Unexpected => true,
        }
    }
}

impl Addic7edError {
    /// Classify this error for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            Addic7edError::Timeout(_) => ErrorCategory::Timeout,
            Addic7edError::ServiceUnavailable(_) => ErrorCategory::ServiceUnavailable,
            Addic7edError::HttpStatus { status, .. } => ErrorCategory::Http { status: *status },
            Addic7edError::Transport(e) => ErrorCategory::Transport {
                timed_out: mentions_timeout(e),
            },
            _ => ErrorCategory::Unexpected,
        }
    }
}

fn mentions_timeout(error: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(error);
    while let Some(e) = current {
        if e.to_string().contains("timed out") {
            return true;
        }
        current = e.source();
    }
    false
}

/// Log `err` with the message for its category, followed by `msg`
pub fn handle_error(err: &Addic7edError, msg: &str) {
    let category = err.category();
    match category {
        ErrorCategory::Timeout => error!("Request timed out. {}", msg),
        ErrorCategory::ServiceUnavailable => error!("Service unavailable. {}", msg),
        ErrorCategory::Http { status } => {
            if category.wants_detail() {
                error!(error = ?err, "HTTP error {}. {}", status, msg);
            } else {
                error!("HTTP error {}. {}", status, msg);
            }
        }
        ErrorCategory::Transport { .. } => {
            if category.wants_detail() {
                error!(error = ?err, "Transport error {}. {}", err, msg);
            } else {
                error!("Transport error {}. {}", err, msg);
            }
        }
        ErrorCategory::Unexpected => error!(error = ?err, "Unexpected error. {}", msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_timeout() {
        let err = Addic7edError::Timeout("https://www.addic7ed.com/".to_string());
        assert_eq!(err.category(), ErrorCategory::Timeout);
        assert!(!err.category().wants_detail());
    }

    #[test]
    fn test_category_service_unavailable() {
        let err = Addic7edError::ServiceUnavailable("busy".to_string());
        assert_eq!(err.category(), ErrorCategory::ServiceUnavailable);
    }

    #[test]
    fn test_category_http_client_error_has_detail() {
        let err = Addic7edError::HttpStatus {
            status: 404,
            message: "404 Client Error".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Http { status: 404 });
        assert!(err.category().wants_detail());
    }

    #[test]
    fn test_category_http_server_error_suppresses_detail() {
        let err = Addic7edError::HttpStatus {
            status: 503,
            message: "503 Server Error".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Http { status: 503 });
        assert!(!err.category().wants_detail());
    }

    #[test]
    fn test_transport_timeout_flavor() {
        assert!(!ErrorCategory::Transport { timed_out: true }.wants_detail());
        assert!(ErrorCategory::Transport { timed_out: false }.wants_detail());
    }

    #[test]
    fn test_mentions_timeout_walks_sources() {
        let inner = std::io::Error::new(std::io::ErrorKind::TimedOut, "The read operation timed out");
        let outer = std::io::Error::other(inner);
        assert!(mentions_timeout(&outer));

        let plain = std::io::Error::other("handshake failure");
        assert!(!mentions_timeout(&plain));
    }

    #[test]
    fn test_category_unexpected() {
        assert_eq!(
            Addic7edError::DownloadLimitExceeded.category(),
            ErrorCategory::Unexpected
        );
        assert_eq!(
            Addic7edError::ParseError("x".to_string()).category(),
            ErrorCategory::Unexpected
        );
    }

    #[test]
    fn test_handle_error_does_not_panic() {
        handle_error(&Addic7edError::NotInitialized, "Provider addic7ed");
        handle_error(
            &Addic7edError::HttpStatus {
                status: 500,
                message: "500 Server Error".to_string(),
            },
            "Provider addic7ed",
        );
    }
}
