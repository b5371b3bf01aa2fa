//! Addic7ed subtitle provider
//!
//! Combines the HTTP session, the show id cache and the HTML parsers into
//! the provider lifecycle: initialize, list, download, terminate.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::cache::ShowIdCache;
use crate::client::{ClientConfig, Session};
use crate::error::{Addic7edError, Result, SERVER_BUSY_MESSAGE};
use crate::firefox::{
    ADDIC7ED_COOKIES, cookie_string, cookies_for_domain, default_profile_dir, firefox_user_agent,
};
use crate::language::{Language, addic7ed_languages};
use crate::parser::{parse_search_suggestion, parse_season_page, parse_show_ids};
use crate::sanitize::sanitize;
use crate::types::{Episode, Subtitle, fix_line_ending};
use crate::url::{build_search_url, build_season_url, build_shows_url, build_site_url};

/// Host whose browser cookies are used
pub const DOMAIN: &str = "www.addic7ed.com";

/// A pluggable source of subtitles
pub trait SubtitleProvider {
    /// Short provider name
    fn name(&self) -> &'static str;

    /// Languages this provider can return
    fn languages(&self) -> Vec<Language>;

    /// Open the session; must be called before any query
    fn initialize(&mut self) -> Result<()>;

    /// Release the session
    fn terminate(&mut self);

    /// Subtitles for `episode` in any of `languages`
    fn list_subtitles(
        &self,
        episode: &Episode,
        languages: &[Language],
    ) -> impl Future<Output = Result<Vec<Subtitle>>>;

    /// Fetch the content of `subtitle`
    fn download_subtitle(&self, subtitle: &mut Subtitle) -> impl Future<Output = Result<()>>;
}

/// Configuration for the Addic7ed provider
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    /// Session id of a logged-in account
    pub phpsessid: Option<String>,
    /// Take login cookies and User-Agent from Firefox (ignored if `phpsessid` is set)
    pub firefox_cookies: bool,
    /// Firefox profile to read; the default profile when `None`
    pub firefox_profile: Option<PathBuf>,
    /// HTTP session settings
    pub client: ClientConfig,
}

/// Subtitle provider for Addic7ed
///
/// # Example
/// ```no_run
/// # async fn example() -> addic7ed_core::Result<()> {
/// use addic7ed_core::{Addic7edProvider, Episode, Language, ProviderConfig, SubtitleProvider};
/// let mut provider = Addic7edProvider::new(ProviderConfig::default());
/// provider.initialize()?;
/// let episode = Episode::new("The Wire", 1, 2);
/// let mut subtitles = provider.list_subtitles(&episode, &[Language::new("eng")]).await?;
/// if let Some(subtitle) = subtitles.first_mut() {
///     provider.download_subtitle(subtitle).await?;
/// }
/// provider.terminate();
/// # Ok(())
/// # }
/// ```
pub struct Addic7edProvider {
    config: ProviderConfig,
    cache: Arc<ShowIdCache>,
    session: Option<Session>,
}

impl Addic7edProvider {
    /// Create an uninitialized provider with its own show id cache
    pub fn new(config: ProviderConfig) -> Self {
        Self::with_cache(config, Arc::new(ShowIdCache::default()))
    }

    /// Create an uninitialized provider sharing `cache`
    pub fn with_cache(config: ProviderConfig, cache: Arc<ShowIdCache>) -> Self {
        Self {
            config,
            cache,
            session: None,
        }
    }

    /// Whether `initialize` succeeded and `terminate` was not called since
    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    /// The open HTTP session, shared by every request of this provider
    ///
    /// # Errors
    /// Returns `NotInitialized` before `initialize` and after `terminate`
    pub fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(Addic7edError::NotInitialized)
    }

    /// Session settings with cookies and User-Agent resolved
    fn session_config(&self) -> Result<ClientConfig> {
        let mut client = self.config.client.clone();

        if let Some(phpsessid) = &self.config.phpsessid {
            client.cookie = Some(format!("PHPSESSID={}", phpsessid));
        } else if self.config.firefox_cookies {
            info!("Using cookies from Firefox");
            let profile = match &self.config.firefox_profile {
                Some(profile) => profile.clone(),
                None => default_profile_dir().map_err(firefox_auth_error)?,
            };

            let cookies = cookies_for_domain(&profile, DOMAIN).map_err(firefox_auth_error)?;
            client.cookie = Some(cookie_string(&cookies, &ADDIC7ED_COOKIES).map_err(firefox_auth_error)?);

            match firefox_user_agent(&profile) {
                Ok(user_agent) => client.user_agent = user_agent,
                Err(e) => warn!(
                    "Unable to determine Firefox's User-Agent ({}): requests will be sent with the default one",
                    e
                ),
            }
        }

        Ok(client)
    }

    /// Get the map of sanitized show name -> show id from `shows.php`
    ///
    /// Served from the cache while it is fresh.
    pub async fn get_show_ids(&self) -> Result<Arc<HashMap<String, u32>>> {
        if let Some(show_ids) = self.cache.catalog().await {
            return Ok(show_ids);
        }

        let session = self.session()?;
        info!("Getting show ids");
        let response = session.get(&build_shows_url(session.base_url())).await?;
        let show_ids = parse_show_ids(&String::from_utf8_lossy(&response.content))?;
        debug!("Found {} show ids", show_ids.len());

        Ok(self.cache.store_catalog(show_ids).await)
    }

    /// Search the show id of `series` (and `year`) with the site search
    ///
    /// # Returns
    /// `Some(id)` only when the first suggestion matches the query
    pub async fn search_show_id(&self, series: &str, year: Option<i32>) -> Result<Option<u32>> {
        if let Some(cached) = self.cache.search(series, year).await {
            return Ok(cached);
        }

        // the site search does not handle quotes
        let query_series = series.replace('\'', " ");
        let series_year = match year {
            Some(year) => format!("{} {}", query_series, year),
            None => query_series,
        };

        let session = self.session()?;
        info!("Searching show ids with {:?}", series_year);
        let response = session
            .get(&build_search_url(session.base_url(), &series_year))
            .await?;
        let suggestion = parse_search_suggestion(&String::from_utf8_lossy(&response.content))?;

        let show_id = match suggestion {
            None => {
                warn!("Show id not found: no suggestion");
                None
            }
            Some(s) if sanitize(&s.title.replace('\'', " ")) != sanitize(&series_year) => {
                warn!("Show id not found: suggestion does not match");
                None
            }
            Some(s) => {
                debug!("Found show id {}", s.show_id);
                Some(s.show_id)
            }
        };

        self.cache.store_search(series, year, show_id).await;
        Ok(show_id)
    }

    /// Get the best matching show id for `series`, `year` and `country_code`
    ///
    /// Looks in [`get_show_ids`](Self::get_show_ids) with the country, then
    /// with the year, then the bare name, and falls back on
    /// [`search_show_id`](Self::search_show_id).
    pub async fn get_show_id(
        &self,
        series: &str,
        year: Option<i32>,
        country_code: Option<&str>,
    ) -> Result<Option<u32>> {
        let series_sanitized = sanitize(series);
        let show_ids = self.get_show_ids().await?;
        let mut show_id = None;

        if let Some(country) = country_code {
            debug!("Getting show id with country");
            show_id = show_ids
                .get(&format!("{} {}", series_sanitized, country.to_lowercase()))
                .copied();
        }

        if show_id.is_none()
            && let Some(year) = year
        {
            debug!("Getting show id with year");
            show_id = show_ids.get(&format!("{} {}", series_sanitized, year)).copied();
        }

        if show_id.is_none() {
            debug!("Getting show id");
            show_id = show_ids.get(&series_sanitized).copied();
        }

        if show_id.is_none() {
            warn!("Series {} not found in show ids", series);
            show_id = self.search_show_id(series, None).await?;
        }

        Ok(show_id)
    }

    /// Get every completed subtitle of one season of a show
    ///
    /// # Returns
    /// Subtitles in page order, empty when the site sends no data
    ///
    /// # Errors
    /// - `ServiceUnavailable` if the site answers with its busy page
    /// - `ParseError` / `ElementNotFound` if the page layout is not recognized
    pub async fn query(&self, show_id: u32, season: u32) -> Result<Vec<Subtitle>> {
        let session = self.session()?;
        info!("Getting the page of show id {}, season {}", show_id, season);
        let response = session
            .get(&build_season_url(session.base_url(), show_id, season))
            .await?;

        // 304 Not Modified comes back with an empty body
        if response.is_empty() {
            debug!("No data returned from provider");
            return Ok(Vec::new());
        }

        if response.content.ends_with(SERVER_BUSY_MESSAGE.as_bytes()) {
            return Err(Addic7edError::ServiceUnavailable(SERVER_BUSY_MESSAGE.to_string()));
        }

        parse_season_page(&String::from_utf8_lossy(&response.content), session.base_url())
    }
}

impl SubtitleProvider for Addic7edProvider {
    fn name(&self) -> &'static str {
        "addic7ed"
    }

    fn languages(&self) -> Vec<Language> {
        addic7ed_languages()
    }

    fn initialize(&mut self) -> Result<()> {
        let client = self.session_config()?;
        self.session = Some(Session::with_config(&client)?);
        Ok(())
    }

    fn terminate(&mut self) {
        if self.session.take().is_some() {
            debug!("Session released");
        }
    }

    async fn list_subtitles(&self, episode: &Episode, languages: &[Language]) -> Result<Vec<Subtitle>> {
        let mut show_id = None;
        for title in episode.titles() {
            show_id = self
                .get_show_id(title, episode.year, episode.country.as_deref())
                .await?;
            if show_id.is_some() {
                break;
            }
        }

        let Some(show_id) = show_id else {
            error!("No show id found for {:?} (year {:?})", episode.series, episode.year);
            return Ok(Vec::new());
        };

        let subtitles = self
            .query(show_id, episode.season)
            .await?
            .into_iter()
            .filter(|s| languages.contains(&s.language) && s.episode == episode.episode)
            .collect();

        Ok(subtitles)
    }

    async fn download_subtitle(&self, subtitle: &mut Subtitle) -> Result<()> {
        let session = self.session()?;
        info!("Downloading subtitle {}", subtitle.info());
        let response = session
            .get(&build_site_url(session.base_url(), &subtitle.download_link))
            .await?;

        if response.is_empty() {
            debug!("Unable to download subtitle. No data returned from provider");
            return Ok(());
        }

        if response.content_type().starts_with("text/html") {
            return Err(Addic7edError::DownloadLimitExceeded);
        }

        subtitle.content = Some(fix_line_ending(&response.content));
        Ok(())
    }
}

fn firefox_auth_error(e: Addic7edError) -> Addic7edError {
    match e {
        Addic7edError::Authentication(_) => e,
        other => Addic7edError::Authentication(format!(
            "Could not obtain Addic7ed cookies from Firefox: {}",
            other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn offline_config() -> ProviderConfig {
        ProviderConfig {
            client: ClientConfig {
                min_request_interval: Duration::ZERO,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_provider_lifecycle() {
        let mut provider = Addic7edProvider::new(offline_config());
        assert!(!provider.is_initialized());
        provider.initialize().unwrap();
        assert!(provider.is_initialized());
        provider.terminate();
        assert!(!provider.is_initialized());
    }

    #[test]
    fn test_session_follows_lifecycle() {
        let mut provider = Addic7edProvider::new(ProviderConfig {
            client: ClientConfig {
                base_url: "http://127.0.0.1:9999".to_string(),
                ..offline_config().client
            },
            ..offline_config()
        });
        assert!(matches!(provider.session(), Err(Addic7edError::NotInitialized)));

        provider.initialize().unwrap();
        assert_eq!(provider.session().unwrap().base_url(), "http://127.0.0.1:9999/");

        provider.terminate();
        assert!(matches!(provider.session(), Err(Addic7edError::NotInitialized)));
    }

    #[test]
    fn test_provider_metadata() {
        let provider = Addic7edProvider::new(ProviderConfig::default());
        assert_eq!(provider.name(), "addic7ed");
        assert!(provider.languages().contains(&Language::new("eng")));
    }

    #[test]
    fn test_session_config_phpsessid() {
        let config = ProviderConfig {
            phpsessid: Some("abc123".to_string()),
            firefox_cookies: true,
            ..offline_config()
        };
        let provider = Addic7edProvider::new(config);
        let client = provider.session_config().unwrap();
        assert_eq!(client.cookie.as_deref(), Some("PHPSESSID=abc123"));
    }

    #[test]
    fn test_session_config_without_login() {
        let provider = Addic7edProvider::new(offline_config());
        assert_eq!(provider.session_config().unwrap().cookie, None);
    }

    #[test]
    fn test_session_config_firefox() {
        let profile = tempfile::tempdir().unwrap();
        let conn = rusqlite::Connection::open(profile.path().join("cookies.sqlite")).unwrap();
        conn.execute_batch(
            "CREATE TABLE moz_cookies (id INTEGER PRIMARY KEY, name TEXT, value TEXT, host TEXT);
             INSERT INTO moz_cookies (name, value, host) VALUES ('PHPSESSID', 'sess', 'www.addic7ed.com');
             INSERT INTO moz_cookies (name, value, host) VALUES ('wikisubtitlesuser', '7', '.addic7ed.com');
             INSERT INTO moz_cookies (name, value, host) VALUES ('wikisubtitlespass', 'pw', '.addic7ed.com');",
        )
        .unwrap();
        drop(conn);
        std::fs::write(
            profile.path().join("compatibility.ini"),
            "[Compatibility]\nLastVersion=130.0_20240829135915/20240829135915\n",
        )
        .unwrap();

        let config = ProviderConfig {
            firefox_cookies: true,
            firefox_profile: Some(profile.path().to_path_buf()),
            ..offline_config()
        };
        let client = Addic7edProvider::new(config).session_config().unwrap();
        assert_eq!(
            client.cookie.as_deref(),
            Some("wikisubtitlesuser=7; wikisubtitlespass=pw; PHPSESSID=sess")
        );
        assert!(client.user_agent.contains("Firefox/130.0"));
    }

    #[test]
    fn test_session_config_firefox_without_cookies() {
        let profile = tempfile::tempdir().unwrap();
        let config = ProviderConfig {
            firefox_cookies: true,
            firefox_profile: Some(profile.path().to_path_buf()),
            ..offline_config()
        };
        let mut provider = Addic7edProvider::new(config);
        match provider.initialize() {
            Err(Addic7edError::Authentication(msg)) => {
                assert!(msg.starts_with("Could not obtain Addic7ed cookies from Firefox"));
            }
            other => panic!("Expected Authentication error, got {:?}", other.err()),
        }
        assert!(!provider.is_initialized());
    }

    #[tokio::test]
    async fn test_operations_require_initialize() {
        let provider = Addic7edProvider::new(offline_config());
        assert!(matches!(provider.get_show_ids().await, Err(Addic7edError::NotInitialized)));
        assert!(matches!(provider.query(1, 1).await, Err(Addic7edError::NotInitialized)));
        assert!(matches!(
            provider.search_show_id("lost", None).await,
            Err(Addic7edError::NotInitialized)
        ));

        let mut subtitle = Subtitle {
            language: Language::new("eng"),
            hearing_impaired: false,
            page_link: String::new(),
            series: "Lost".to_string(),
            season: 1,
            episode: 1,
            title: String::new(),
            year: None,
            version: String::new(),
            download_link: "updated/1/1/0".to_string(),
            content: None,
        };
        assert!(matches!(
            provider.download_subtitle(&mut subtitle).await,
            Err(Addic7edError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_cached_catalog_needs_no_session() {
        let cache = Arc::new(ShowIdCache::default());
        let mut show_ids = HashMap::new();
        show_ids.insert("the wire".to_string(), 1245);
        show_ids.insert("shameless us".to_string(), 300);
        show_ids.insert("doctor who 2005".to_string(), 44);
        cache.store_catalog(show_ids).await;

        let provider = Addic7edProvider::with_cache(offline_config(), cache);
        assert_eq!(provider.get_show_id("The Wire", None, None).await.unwrap(), Some(1245));
        assert_eq!(provider.get_show_id("Shameless", None, Some("US")).await.unwrap(), Some(300));
        assert_eq!(provider.get_show_id("Doctor Who", Some(2005), None).await.unwrap(), Some(44));
    }
}
