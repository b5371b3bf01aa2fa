//! Debug script to inspect an Addic7ed season page
//!
//! Run with: cargo run --example debug_season -p addic7ed-core -- "The Wire" 1

use addic7ed_core::parser::parse_season_page;
use addic7ed_core::url::build_season_url;
use addic7ed_core::{Addic7edProvider, ProviderConfig, SubtitleProvider};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let series = args.next().unwrap_or_else(|| "The Big Bang Theory".to_string());
    let season: u32 = args.next().as_deref().unwrap_or("1").parse()?;

    let mut provider = Addic7edProvider::new(ProviderConfig::default());
    provider.initialize()?;

    println!("Looking up show id for '{}'...", series);
    let Some(show_id) = provider.get_show_id(&series, None, None).await? else {
        println!("No show id found!");
        return Ok(());
    };
    println!("Show id: {}\n", show_id);

    // same session as the provider: same cookies, same throttle
    let session = provider.session()?;
    let url = build_season_url(session.base_url(), show_id, season);
    println!("Fetching {}...", url);
    let response = session.get(&url).await?;
    let html = String::from_utf8_lossy(&response.content);

    // Save HTML to file for inspection
    std::fs::write("debug_season.html", html.as_bytes())?;
    println!("HTML saved to debug_season.html ({} bytes)\n", response.content.len());

    match parse_season_page(&html, session.base_url()) {
        Ok(subtitles) => {
            println!("Parsed {} subtitles:\n", subtitles.len());
            for subtitle in subtitles.iter().take(10) {
                println!("{} [{}]", subtitle.info(), subtitle.language);
                println!("   Page: {}", subtitle.page_link);
                println!("   Download: {}", subtitle.download_link);
            }
        }
        Err(e) => println!("✗ Failed to parse season page: {}", e),
    }

    Ok(())
}
