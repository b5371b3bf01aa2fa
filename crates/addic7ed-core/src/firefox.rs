//! Firefox profile access
//!
//! Reads site cookies from a Firefox profile and derives the matching
//! User-Agent, so requests look like they come from the user's browser.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::debug;

use crate::error::{Addic7edError, Result};

/// Cookies Addic7ed needs for a logged-in session, in the order Firefox sends them
pub const ADDIC7ED_COOKIES: [&str; 3] = ["wikisubtitlesuser", "wikisubtitlespass", "PHPSESSID"];

/// Firefox data directory for the current platform
pub fn firefox_root() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        dirs::config_dir().map(|d| d.join("Mozilla").join("Firefox"))
    } else if cfg!(target_os = "macos") {
        dirs::config_dir().map(|d| d.join("Firefox"))
    } else {
        dirs::home_dir().map(|d| d.join(".mozilla").join("firefox"))
    }
}

/// Directory of the default Firefox profile
///
/// # Errors
/// - `Io` if the Firefox directory or `profiles.ini` cannot be read
/// - `InvalidConfig` if no profile is listed
pub fn default_profile_dir() -> Result<PathBuf> {
    let root = firefox_root()
        .ok_or_else(|| Addic7edError::InvalidConfig("Cannot locate home directory".to_string()))?;
    let ini = fs::read_to_string(root.join("profiles.ini"))?;
    profile_from_ini(&root, &ini).ok_or_else(|| {
        Addic7edError::InvalidConfig(format!("No Firefox profile in {}", root.display()))
    })
}

/// Picks the default profile out of `profiles.ini`
///
/// Prefers the install default, then a profile flagged `Default=1`,
/// then the first profile.
fn profile_from_ini(root: &Path, ini: &str) -> Option<PathBuf> {
    let sections = parse_ini(ini);

    let install_default = sections
        .iter()
        .filter(|(name, _)| name.starts_with("Install"))
        .find_map(|(_, keys)| keys.get("Default"));
    if let Some(path) = install_default {
        return Some(root.join(path));
    }

    let profiles: Vec<&HashMap<String, String>> = sections
        .iter()
        .filter(|(name, _)| name.starts_with("Profile"))
        .map(|(_, keys)| keys)
        .collect();
    let profile = profiles
        .iter()
        .find(|keys| keys.get("Default").map(String::as_str) == Some("1"))
        .or_else(|| profiles.first())?;

    let path = profile.get("Path")?;
    if profile.get("IsRelative").map(String::as_str) == Some("0") {
        Some(PathBuf::from(path))
    } else {
        Some(root.join(path))
    }
}

fn parse_ini(ini: &str) -> Vec<(String, HashMap<String, String>)> {
    let mut sections: Vec<(String, HashMap<String, String>)> = Vec::new();
    for line in ini.lines().map(str::trim) {
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            sections.push((name.to_string(), HashMap::new()));
        } else if let Some((key, value)) = line.split_once('=')
            && let Some((_, keys)) = sections.last_mut()
        {
            keys.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    sections
}

/// Reads every cookie whose host ends with `domain` (without `www.`)
///
/// Works on a copy of `cookies.sqlite`, since a running Firefox keeps the
/// original locked.
pub fn cookies_for_domain(profile: &Path, domain: &str) -> Result<HashMap<String, String>> {
    let dir = tempfile::tempdir()?;
    let copy = dir.path().join("cookies.sqlite");
    fs::copy(profile.join("cookies.sqlite"), &copy)?;
    let wal = profile.join("cookies.sqlite-wal");
    if wal.exists() {
        fs::copy(&wal, dir.path().join("cookies.sqlite-wal"))?;
    }

    let host = domain.trim_start_matches("www.");
    let conn = Connection::open(&copy)?;
    let mut stmt = conn.prepare("SELECT name, value FROM moz_cookies WHERE host LIKE ?1")?;
    let rows = stmt.query_map([format!("%{}", host)], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut cookies = HashMap::new();
    for row in rows {
        let (name, value) = row?;
        cookies.insert(name, value);
    }

    debug!("Read {} Firefox cookies for {}", cookies.len(), host);
    Ok(cookies)
}

/// Joins the `wanted` cookies into a Cookie header value, in order
///
/// # Errors
/// Returns `Authentication` naming the first missing cookie
pub fn cookie_string(cookies: &HashMap<String, String>, wanted: &[&str]) -> Result<String> {
    let pairs = wanted
        .iter()
        .map(|name| {
            cookies
                .get(*name)
                .map(|value| format!("{}={}", name, value))
                .ok_or_else(|| Addic7edError::Authentication(format!("Missing cookie {}", name)))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(pairs.join("; "))
}

/// User-Agent of the Firefox version that last ran `profile`
///
/// The version comes from `LastVersion` in `compatibility.ini`.
pub fn firefox_user_agent(profile: &Path) -> Result<String> {
    let ini = fs::read_to_string(profile.join("compatibility.ini"))?;
    let major = parse_ini(&ini)
        .into_iter()
        .find_map(|(_, mut keys)| keys.remove("LastVersion"))
        .and_then(|version| {
            version
                .split(['.', '_'])
                .next()
                .and_then(|major| major.parse::<u32>().ok())
        })
        .ok_or_else(|| {
            Addic7edError::InvalidConfig(format!("No Firefox version in {}", profile.display()))
        })?;

    Ok(format!(
        "Mozilla/5.0 ({}; rv:{major}.0) Gecko/20100101 Firefox/{major}.0",
        platform()
    ))
}

fn platform() -> &'static str {
    if cfg!(target_os = "windows") {
        "Windows NT 10.0; Win64; x64"
    } else if cfg!(target_os = "macos") {
        "Macintosh; Intel Mac OS X 10.15"
    } else {
        "X11; Linux x86_64"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie_db(profile: &Path, rows: &[(&str, &str, &str)]) {
        let conn = Connection::open(profile.join("cookies.sqlite")).unwrap();
        conn.execute(
            "CREATE TABLE moz_cookies (id INTEGER PRIMARY KEY, name TEXT, value TEXT, host TEXT)",
            [],
        )
        .unwrap();
        for (name, value, host) in rows {
            conn.execute(
                "INSERT INTO moz_cookies (name, value, host) VALUES (?1, ?2, ?3)",
                [name, value, host],
            )
            .unwrap();
        }
    }

    #[test]
    fn test_profile_from_ini_install_default() {
        let ini = "[Profile0]\nName=default\nIsRelative=1\nPath=Profiles/old.default\nDefault=1\n\n\
                   [Install308046B0AF4A39CB]\nDefault=Profiles/new.default-release\nLocked=1\n";
        let root = Path::new("/ff");
        assert_eq!(
            profile_from_ini(root, ini),
            Some(PathBuf::from("/ff/Profiles/new.default-release"))
        );
    }

    #[test]
    fn test_profile_from_ini_flagged_profile() {
        let ini = "[General]\nStartWithLastProfile=1\n\n\
                   [Profile0]\nIsRelative=1\nPath=Profiles/a\n\n\
                   [Profile1]\nIsRelative=0\nPath=/abs/b\nDefault=1\n";
        assert_eq!(profile_from_ini(Path::new("/ff"), ini), Some(PathBuf::from("/abs/b")));
    }

    #[test]
    fn test_profile_from_ini_empty() {
        assert_eq!(profile_from_ini(Path::new("/ff"), "[General]\nVersion=2\n"), None);
    }

    #[test]
    fn test_cookies_for_domain() {
        let profile = tempfile::tempdir().unwrap();
        cookie_db(
            profile.path(),
            &[
                ("PHPSESSID", "sess", "www.addic7ed.com"),
                ("wikisubtitlesuser", "42", ".addic7ed.com"),
                ("wikisubtitlespass", "hash", ".addic7ed.com"),
                ("other", "x", "example.com"),
            ],
        );

        let cookies = cookies_for_domain(profile.path(), "www.addic7ed.com").unwrap();
        assert_eq!(cookies.len(), 3);
        assert_eq!(cookies.get("PHPSESSID").map(String::as_str), Some("sess"));
        assert!(!cookies.contains_key("other"));

        assert_eq!(
            cookie_string(&cookies, &ADDIC7ED_COOKIES).unwrap(),
            "wikisubtitlesuser=42; wikisubtitlespass=hash; PHPSESSID=sess"
        );
    }

    #[test]
    fn test_cookies_for_domain_missing_database() {
        let profile = tempfile::tempdir().unwrap();
        assert!(matches!(
            cookies_for_domain(profile.path(), "www.addic7ed.com"),
            Err(Addic7edError::Io(_))
        ));
    }

    #[test]
    fn test_cookie_string_missing() {
        let mut cookies = HashMap::new();
        cookies.insert("PHPSESSID".to_string(), "sess".to_string());
        match cookie_string(&cookies, &ADDIC7ED_COOKIES) {
            Err(Addic7edError::Authentication(msg)) => assert!(msg.contains("wikisubtitlesuser")),
            other => panic!("Expected Authentication error, got {:?}", other),
        }
    }

    #[test]
    fn test_firefox_user_agent() {
        let profile = tempfile::tempdir().unwrap();
        fs::write(
            profile.path().join("compatibility.ini"),
            "[Compatibility]\nLastVersion=128.0.3_20240704121409/20240704121409\nLastOSABI=Linux_x86_64-gcc3\n",
        )
        .unwrap();

        let ua = firefox_user_agent(profile.path()).unwrap();
        assert!(ua.starts_with("Mozilla/5.0 ("));
        assert!(ua.ends_with("; rv:128.0) Gecko/20100101 Firefox/128.0"));
    }

    #[test]
    fn test_firefox_user_agent_without_version() {
        let profile = tempfile::tempdir().unwrap();
        fs::write(profile.path().join("compatibility.ini"), "[Compatibility]\n").unwrap();
        assert!(matches!(
            firefox_user_agent(profile.path()),
            Err(Addic7edError::InvalidConfig(_))
        ));
    }
}
