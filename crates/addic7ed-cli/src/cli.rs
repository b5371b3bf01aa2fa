//! Command line definition for the Addic7ed scraper
//!
//! Every command can print JSON for scripting.
//!
//! # Examples
//!
//! ```bash
//! addic7ed hash "The.Wire.S01E02.720p.mkv"
//! addic7ed search "The Wire" 1 2 --lang eng --lang fra
//! addic7ed --phpsessid abc123 download "The Wire" 1 2 --output ~/subs
//! ```

use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use addic7ed_core::{ClientConfig, Episode, Language, ProviderConfig};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

/// Exit codes, stable for scripting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Network or site error
    NetworkError = 3,
    /// No show or subtitle found
    NotFound = 4,
    /// Daily download limit reached
    LimitExceeded = 5,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

/// Search and download TV subtitles from Addic7ed
#[derive(Parser, Debug)]
#[command(
    name = "addic7ed",
    version,
    about = "Search and download TV subtitles from Addic7ed",
    after_help = "EXAMPLES:\n\
                  addic7ed search \"The Wire\" 1 2              List English subtitles\n\
                  addic7ed download \"The Wire\" 1 2 -o subs    Download the best match\n\
                  addic7ed hash episode.mkv --json            Print video hashes"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Log more (-v debug, -vv trace); RUST_LOG overrides
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Session id of a logged-in Addic7ed account
    #[arg(long, global = true, env = "ADDIC7ED_PHPSESSID")]
    pub phpsessid: Option<String>,

    /// Log in with the Addic7ed cookies of the local Firefox
    #[arg(long, global = true)]
    pub firefox: bool,

    /// Firefox profile directory (default profile if omitted)
    #[arg(long, global = true, requires = "firefox")]
    pub firefox_profile: Option<PathBuf>,

    /// Seconds between two requests to the site
    #[arg(long, global = true, default_value = "5")]
    pub interval: u64,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value = "30")]
    pub timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }

    /// Default log filter for the verbosity flag
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "addic7ed_core=debug,addic7ed=debug,info",
            _ => "trace",
        }
    }

    /// Provider settings from the login and throttling flags
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            phpsessid: self.phpsessid.clone(),
            firefox_cookies: self.firefox,
            firefox_profile: self.firefox_profile.clone(),
            client: ClientConfig {
                timeout_secs: self.timeout,
                min_request_interval: Duration::from_secs(self.interval),
                ..Default::default()
            },
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute the subtitle-site hashes of a video file
    Hash(HashCmd),

    /// List subtitles for an episode
    #[command(visible_alias = "s")]
    Search(SearchCmd),

    /// Download subtitles for an episode
    #[command(visible_alias = "dl")]
    Download(DownloadCmd),

    /// List the languages Addic7ed provides
    Languages,
}

#[derive(Args, Debug)]
pub struct HashCmd {
    /// Video file
    #[arg(required = true)]
    pub file: PathBuf,
}

/// Episode selection shared by `search` and `download`
#[derive(Args, Debug)]
pub struct EpisodeArgs {
    /// Series name
    pub series: String,

    /// Season number
    pub season: u32,

    /// Episode number
    pub episode: u32,

    /// Series year, for shows that share a name
    #[arg(long, short = 'y')]
    pub year: Option<i32>,

    /// Series country code (e.g. US, UK)
    #[arg(long)]
    pub country: Option<String>,

    /// Other name of the series (repeatable)
    #[arg(long = "alt")]
    pub alternative_series: Vec<String>,

    /// Episode title, used to rank results
    #[arg(long)]
    pub title: Option<String>,

    /// Release group of the video, used to rank results
    #[arg(long, short = 'g')]
    pub release_group: Option<String>,

    /// Screen size of the video (e.g. 720p), used to rank results
    #[arg(long, short = 'r')]
    pub resolution: Option<String>,

    /// Subtitle language as ISO 639-3, optionally with country (e.g. eng, por-BR)
    #[arg(long = "lang", short = 'l', default_value = "eng")]
    pub languages: Vec<String>,
}

impl EpisodeArgs {
    pub fn to_episode(&self) -> Episode {
        Episode {
            year: self.year,
            country: self.country.clone(),
            alternative_series: self.alternative_series.clone(),
            title: self.title.clone(),
            release_group: self.release_group.clone(),
            resolution: self.resolution.clone(),
            ..Episode::new(&self.series, self.season, self.episode)
        }
    }

    /// Parse the `--lang` values
    pub fn to_languages(&self) -> addic7ed_core::Result<Vec<Language>> {
        self.languages.iter().map(|l| l.parse()).collect()
    }
}

#[derive(Args, Debug)]
pub struct SearchCmd {
    #[command(flatten)]
    pub episode: EpisodeArgs,
}

#[derive(Args, Debug)]
pub struct DownloadCmd {
    #[command(flatten)]
    pub episode: EpisodeArgs,

    /// Directory to write subtitles to
    #[arg(long, short = 'o', default_value = ".")]
    pub output: PathBuf,

    /// Download every match instead of the best one
    #[arg(long, short = 'a')]
    pub all: bool,
}

/// JSON envelope for command output
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonError>,
}

#[derive(Debug, Serialize)]
pub struct JsonError {
    pub message: String,
    pub code: u8,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl JsonOutput<()> {
    pub fn error_msg(message: &str, code: ExitCode) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(JsonError {
                message: message.to_string(),
                code: code as u8,
            }),
        }
    }
}

/// Prints command results as JSON or plain text
pub struct Output {
    pub json: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
        }
    }

    /// Print `data` in the JSON envelope, or `text` for a terminal
    pub fn print<T: Serialize>(&self, data: T, text: impl FnOnce(&T) -> String) -> ExitCode {
        if !self.json {
            println!("{}", text(&data));
            return ExitCode::Success;
        }

        match serde_json::to_string_pretty(&JsonOutput::success(data)) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::Success
            }
            Err(e) => self.error(format!("Failed to serialize: {}", e), ExitCode::Error),
        }
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            if let Ok(json) = serde_json::to_string_pretty(&JsonOutput::error_msg(&msg, code)) {
                eprintln!("{}", json);
            }
        } else {
            eprintln!("Error: {}", msg);
        }
        code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search() {
        let cli = Cli::try_parse_from([
            "addic7ed", "search", "The Wire", "1", "2", "--lang", "eng", "--lang", "por-BR", "-y",
            "2002",
        ])
        .unwrap();

        let Command::Search(cmd) = cli.command else {
            panic!("Expected search command");
        };
        let episode = cmd.episode.to_episode();
        assert_eq!(episode.series, "The Wire");
        assert_eq!(episode.season, 1);
        assert_eq!(episode.episode, 2);
        assert_eq!(episode.year, Some(2002));
        assert_eq!(
            cmd.episode.to_languages().unwrap(),
            vec![Language::new("eng"), Language::with_country("por", "BR")]
        );
    }

    #[test]
    fn test_default_language() {
        let cli = Cli::try_parse_from(["addic7ed", "download", "Lost", "1", "1"]).unwrap();
        let Command::Download(cmd) = cli.command else {
            panic!("Expected download command");
        };
        assert_eq!(cmd.episode.to_languages().unwrap(), vec![Language::new("eng")]);
        assert_eq!(cmd.output, PathBuf::from("."));
        assert!(!cmd.all);
    }

    #[test]
    fn test_global_login_flags() {
        let cli = Cli::try_parse_from([
            "addic7ed", "search", "Lost", "1", "1", "--phpsessid", "abc", "--interval", "0",
        ])
        .unwrap();
        let config = cli.provider_config();
        assert_eq!(config.phpsessid.as_deref(), Some("abc"));
        assert_eq!(config.client.min_request_interval, Duration::ZERO);
        assert!(!config.firefox_cookies);
    }

    #[test]
    fn test_firefox_profile_requires_firefox() {
        assert!(
            Cli::try_parse_from(["addic7ed", "languages", "--firefox-profile", "/tmp/p"]).is_err()
        );
    }

    #[test]
    fn test_bad_season_rejected() {
        assert!(Cli::try_parse_from(["addic7ed", "search", "Lost", "one", "1"]).is_err());
    }

    #[test]
    fn test_json_error_envelope() {
        let json = serde_json::to_value(JsonOutput::error_msg("boom", ExitCode::NotFound)).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["message"], "boom");
        assert_eq!(json["error"]["code"], 4);
        assert!(json.get("data").is_none());
    }
}
