use clap::{Parser, Subcommand};

mod cli;
mod config;
mod core;
mod error;
mod services;
mod utils;

use cli::*;
use config::Config;
use error::Result;
use services::SimpleServices;

#[derive(Parser)]
#[command(name = "songscrape")]
#[command(about = "Collect song lyrics from a music catalog as SQL insert statements")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Config file path (optional)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the insert statement for the track shown on a page
    Extract(extract::ExtractArgs),

    /// Walk an artist listing and collect statements for each artist's top tracks
    Crawl(crawl::CrawlArgs),

    /// Print the statements persisted by the last crawl
    Dump(dump::DumpArgs),

    /// Show configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    utils::logging::init_logging(cli.verbose, cli.quiet)
        .map_err(error::ScrapeError::Internal)?;

    // Load configuration
    let config = Config::load(cli.config.as_deref())?;

    // Initialize services
    let services = SimpleServices::new(config);

    // Execute command with services
    let config = services.config();
    match cli.command {
        Commands::Extract(args) => extract::execute(args, &services).await,
        Commands::Crawl(args) => crawl::execute(args, &services).await,
        Commands::Dump(args) => dump::execute(args, &services).await,
        Commands::Config(args) => cli::config::execute(args, &config).await,
    }
}
