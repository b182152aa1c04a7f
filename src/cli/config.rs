use clap::{Args, Subcommand};

use crate::config::env::EnvParser;
use crate::config::Config as AppConfig;
use crate::error::Result;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// List SONGSCRAPE_* environment variables currently set
    Env,
}

pub async fn execute(args: ConfigArgs, config: &AppConfig) -> Result<()> {
    match args.command {
        ConfigCommands::Show => {
            println!("Current configuration:");
            println!("  storage_path: {}", config.storage_path.display());
            println!("  storage_key: {}", config.storage_key);
            println!("  start_url: {:?}", config.start_url);
            println!("  default_genre: {}", config.default_genre);
            println!("  genre_path_prefix: {}", config.genre_path_prefix);
            println!("  user_agent: {}", config.user_agent);
            println!("  request_timeout_seconds: {}", config.request_timeout_seconds);

            let crawl = &config.crawl;
            println!("  crawl.first_artist_index: {}", crawl.first_artist_index);
            println!("  crawl.max_artists: {}", crawl.max_artists);
            println!("  crawl.max_titles: {}", crawl.max_titles);
            println!(
                "  crawl.tick_interval_ms: {}-{}",
                crawl.tick_interval_ms.min, crawl.tick_interval_ms.max
            );
            println!(
                "  crawl.open_track_delay_ms: {}-{}",
                crawl.open_track_delay_ms.min, crawl.open_track_delay_ms.max
            );
            println!("  crawl.extract_delay_ms: {}", crawl.extract_delay_ms);
            println!("  crawl.return_delay_ms: {}", crawl.return_delay_ms);

            for (name, selector) in config.selectors.all() {
                println!("  selectors.{}: {}", name, selector);
            }
        }

        ConfigCommands::Path => {
            let config_path = AppConfig::config_path()?;
            println!("{}", config_path.display());
        }

        ConfigCommands::Env => {
            let vars = EnvParser::get_all_vars();
            if vars.is_empty() {
                println!("No SONGSCRAPE_* environment variables set");
            }
            for (key, value) in vars {
                println!("{}={}", key, value);
            }
        }
    }

    Ok(())
}
