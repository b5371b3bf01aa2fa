//! Addic7ed Scraper Core Library
//!
//! Provides an async API for listing and downloading TV episode subtitles
//! from Addic7ed, plus the hashing and sanitization helpers shared by
//! subtitle providers.
//!
//! # Overview
//!
//! This crate provides a complete scraping solution for Addic7ed with:
//! - Throttled HTTP session that presents itself as desktop Firefox
//! - Login through a session id or the cookies of a local Firefox profile
//! - HTML parsers for the show catalog, show search and season pages
//! - Expiring show id cache that can be shared between providers
//! - Whole-file video hashes (OpenSubtitles, TheSubDB, NapiProjekt, Shooter)
//!
//! # Example
//!
//! ```no_run
//! use addic7ed_core::{Addic7edProvider, Episode, Language, ProviderConfig, Result, SubtitleProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut provider = Addic7edProvider::new(ProviderConfig::default());
//!     provider.initialize()?;
//!
//!     let episode = Episode::new("The Big Bang Theory", 7, 5);
//!     let mut subtitles = provider
//!         .list_subtitles(&episode, &[Language::new("eng")])
//!         .await?;
//!
//!     for subtitle in &subtitles {
//!         println!("{} [{}]", subtitle.info(), subtitle.language);
//!     }
//!
//!     if let Some(subtitle) = subtitles.first_mut() {
//!         provider.download_subtitle(subtitle).await?;
//!     }
//!
//!     provider.terminate();
//!     Ok(())
//! }
//! ```
//!
//! # Throttling
//!
//! Every session waits at least [`ClientConfig::min_request_interval`]
//! (5 seconds by default) between two requests. Addic7ed bans clients that
//! go faster, so lower it only against a test server.

pub mod cache;
mod client;
mod error;
pub mod firefox;
pub mod hash;
mod language;
pub mod parser;
mod provider;
mod report;
pub mod sanitize;
mod types;
pub mod url;

// Re-export client types
pub use client::{ClientConfig, FIREFOX_USER_AGENT, Impersonate, RateLimiter, Response, Session};

// Re-export error types
pub use error::{Addic7edError, Result, SERVER_BUSY_MESSAGE};

// Re-export error classification
pub use report::{ErrorCategory, handle_error};

// Re-export the provider API
pub use provider::{Addic7edProvider, DOMAIN, ProviderConfig, SubtitleProvider};

// Re-export data types
pub use language::{Language, addic7ed_languages};
pub use types::{Episode, Match, Subtitle, fix_line_ending};

// Re-export helpers for convenience
pub use cache::ShowIdCache;
pub use hash::{VideoHashes, hash_napiprojekt, hash_opensubtitles, hash_shooter, hash_thesubdb};
pub use sanitize::{matches_title, sanitize, sanitize_release_group, sanitize_release_group_opt};
