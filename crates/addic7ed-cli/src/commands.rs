//! CLI command handlers
//!
//! Each handler takes its parsed arguments and the output sink and returns
//! the process exit code.

use std::cmp::Reverse;
use std::path::{Path, PathBuf};

use addic7ed_core::{
    Addic7edError, Addic7edProvider, Episode, Language, ProviderConfig, Subtitle, SubtitleProvider,
    VideoHashes, addic7ed_languages, handle_error,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::cli::{DownloadCmd, ExitCode, HashCmd, Output, SearchCmd};

/// Exit code for a failed provider call
fn exit_code(err: &Addic7edError) -> ExitCode {
    match err {
        Addic7edError::DownloadLimitExceeded => ExitCode::LimitExceeded,
        Addic7edError::Timeout(_)
        | Addic7edError::ServiceUnavailable(_)
        | Addic7edError::HttpStatus { .. }
        | Addic7edError::Transport(_) => ExitCode::NetworkError,
        Addic7edError::InvalidConfig(_) | Addic7edError::InvalidUrl(_) => ExitCode::InvalidArgs,
        _ => ExitCode::Error,
    }
}

fn fail(output: &Output, err: Addic7edError, msg: &str) -> ExitCode {
    handle_error(&err, msg);
    output.error(format!("{}: {}", msg, err), exit_code(&err))
}

// =============================================================================
// Hash Command
// =============================================================================

#[derive(Debug, Serialize)]
struct HashReport {
    file: PathBuf,
    #[serde(flatten)]
    hashes: VideoHashes,
}

pub async fn hash_cmd(cmd: HashCmd, output: &Output) -> ExitCode {
    let file = cmd.file.clone();
    let hashes = match tokio::task::spawn_blocking(move || VideoHashes::compute(&file)).await {
        Ok(Ok(hashes)) => hashes,
        Ok(Err(e)) => {
            return output.error(
                format!("Cannot hash {}: {}", cmd.file.display(), e),
                ExitCode::Error,
            );
        }
        Err(e) => return output.error(format!("Hashing task failed: {}", e), ExitCode::Error),
    };

    let report = HashReport {
        file: cmd.file,
        hashes,
    };
    output.print(report, |r| {
        let show = |h: &Option<String>| h.clone().unwrap_or_else(|| "-".to_string());
        format!(
            "opensubtitles  {}\nthesubdb       {}\nnapiprojekt    {}\nshooter        {}",
            show(&r.hashes.opensubtitles),
            show(&r.hashes.thesubdb),
            show(&r.hashes.napiprojekt),
            show(&r.hashes.shooter),
        )
    })
}

// =============================================================================
// Search Command
// =============================================================================

/// Subtitle with the number of episode properties it matches
#[derive(Debug, Serialize)]
struct RankedSubtitle {
    score: usize,
    #[serde(flatten)]
    subtitle: Subtitle,
}

/// Best matches first; ties keep page order
fn rank(subtitles: Vec<Subtitle>, episode: &Episode) -> Vec<RankedSubtitle> {
    let mut ranked: Vec<RankedSubtitle> = subtitles
        .into_iter()
        .map(|subtitle| RankedSubtitle {
            score: subtitle.matches(episode).len(),
            subtitle,
        })
        .collect();
    ranked.sort_by_key(|r| Reverse(r.score));
    ranked
}

/// Open a provider, list and rank subtitles for the episode
async fn find_subtitles(
    config: ProviderConfig,
    episode: &Episode,
    languages: &[Language],
) -> addic7ed_core::Result<(Addic7edProvider, Vec<RankedSubtitle>)> {
    let mut provider = Addic7edProvider::new(config);
    provider.initialize()?;
    let subtitles = provider.list_subtitles(episode, languages).await?;
    debug!("Provider returned {} subtitles", subtitles.len());
    Ok((provider, rank(subtitles, episode)))
}

pub async fn search_cmd(cmd: SearchCmd, config: ProviderConfig, output: &Output) -> ExitCode {
    let languages = match cmd.episode.to_languages() {
        Ok(languages) => languages,
        Err(e) => return output.error(e.to_string(), ExitCode::InvalidArgs),
    };
    let episode = cmd.episode.to_episode();

    let (mut provider, ranked) = match find_subtitles(config, &episode, &languages).await {
        Ok(found) => found,
        Err(e) => return fail(output, e, "Search failed"),
    };
    provider.terminate();

    if ranked.is_empty() {
        return output.error(
            format!("No subtitles found for {} s{:02}e{:02}", episode.series, episode.season, episode.episode),
            ExitCode::NotFound,
        );
    }

    output.print(ranked, |ranked| {
        ranked
            .iter()
            .map(|r| {
                let hi = if r.subtitle.hearing_impaired { " [HI]" } else { "" };
                format!("{:>2}  {:<7} {}{}", r.score, r.subtitle.language.to_string(), r.subtitle.info(), hi)
            })
            .collect::<Vec<_>>()
            .join("\n")
    })
}

// =============================================================================
// Download Command
// =============================================================================

/// File name for a downloaded subtitle, e.g. "The Wire - s01e02 - LOL.eng.srt"
fn subtitle_file_name(subtitle: &Subtitle) -> String {
    let mut stem = format!("{} - s{:02}e{:02}", subtitle.series, subtitle.season, subtitle.episode);
    if !subtitle.version.is_empty() {
        stem.push_str(" - ");
        stem.push_str(&subtitle.version);
    }
    if subtitle.hearing_impaired {
        stem.push_str(".hi");
    }
    let name = format!("{}.{}.srt", stem, subtitle.language);
    name.chars()
        .map(|c| if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') { '_' } else { c })
        .collect()
}

#[derive(Debug, Serialize)]
struct Saved {
    path: PathBuf,
    id: String,
    language: Language,
    version: String,
}

async fn save(dir: &Path, subtitle: &Subtitle) -> std::io::Result<Option<PathBuf>> {
    let Some(content) = &subtitle.content else {
        return Ok(None);
    };
    let path = dir.join(subtitle_file_name(subtitle));
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(&path, content).await?;
    info!("Saved {}", path.display());
    Ok(Some(path))
}

pub async fn download_cmd(cmd: DownloadCmd, config: ProviderConfig, output: &Output) -> ExitCode {
    let languages = match cmd.episode.to_languages() {
        Ok(languages) => languages,
        Err(e) => return output.error(e.to_string(), ExitCode::InvalidArgs),
    };
    let episode = cmd.episode.to_episode();

    let (mut provider, ranked) = match find_subtitles(config, &episode, &languages).await {
        Ok(found) => found,
        Err(e) => return fail(output, e, "Search failed"),
    };

    let wanted: Vec<Subtitle> = if cmd.all {
        ranked.into_iter().map(|r| r.subtitle).collect()
    } else {
        ranked.into_iter().take(1).map(|r| r.subtitle).collect()
    };

    if wanted.is_empty() {
        provider.terminate();
        return output.error(
            format!("No subtitles found for {} s{:02}e{:02}", episode.series, episode.season, episode.episode),
            ExitCode::NotFound,
        );
    }

    let mut saved = Vec::new();
    for mut subtitle in wanted {
        if let Err(e) = provider.download_subtitle(&mut subtitle).await {
            provider.terminate();
            return fail(output, e, "Download failed");
        }

        match save(&cmd.output, &subtitle).await {
            Ok(Some(path)) => saved.push(Saved {
                path,
                id: subtitle.id().to_string(),
                language: subtitle.language.clone(),
                version: subtitle.version.clone(),
            }),
            Ok(None) => debug!("No content for {}", subtitle.info()),
            Err(e) => {
                provider.terminate();
                return output.error(
                    format!("Cannot write to {}: {}", cmd.output.display(), e),
                    ExitCode::Error,
                );
            }
        }
    }
    provider.terminate();

    if saved.is_empty() {
        return output.error("The site returned no subtitle content", ExitCode::NotFound);
    }

    output.print(saved, |saved| {
        saved
            .iter()
            .map(|s| s.path.display().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    })
}

// =============================================================================
// Languages Command
// =============================================================================

pub fn languages_cmd(output: &Output) -> ExitCode {
    output.print(addic7ed_languages(), |languages| {
        languages
            .iter()
            .map(Language::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    })
}
