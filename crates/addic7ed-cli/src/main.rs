//! Addic7ed command line client
//!
//! # Usage
//!
//! ```bash
//! addic7ed search "The Big Bang Theory" 7 5 --lang eng
//! addic7ed --firefox download "The Big Bang Theory" 7 5 -g DIMENSION
//! addic7ed hash movie.mkv
//! ```

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, Output};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // logs go to stderr so stdout stays parseable
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let output = Output::new(&cli);
    let config = cli.provider_config();

    let code = match cli.command {
        Command::Hash(cmd) => commands::hash_cmd(cmd, &output).await,
        Command::Search(cmd) => commands::search_cmd(cmd, config, &output).await,
        Command::Download(cmd) => commands::download_cmd(cmd, config, &output).await,
        Command::Languages => commands::languages_cmd(&output),
    };
    code.into()
}
