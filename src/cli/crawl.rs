use clap::Args;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::{Config, ConfigValidator};
use crate::core::driver::CrawlDriver;
use crate::core::storage::render_dump;
use crate::error::{Result, ScrapeError};
use crate::services::SimpleServices;
use crate::utils::progress::{crawl_span, ProgressUtils};

#[derive(Args)]
pub struct CrawlArgs {
    /// Artist listing to start from (URL or saved HTML snapshot); defaults to `start_url`
    #[arg(value_name = "START")]
    start: Option<String>,

    /// Index of the first artist to visit
    #[arg(long = "from", value_name = "INDEX")]
    from: Option<usize>,

    /// Stop before this artist index
    #[arg(long)]
    max_artists: Option<usize>,

    /// Top tracks to open per artist
    #[arg(long)]
    max_titles: Option<usize>,

    /// Keep appending to the batch a previous crawl persisted
    #[arg(long)]
    resume: bool,

    /// Seed for the randomized delays
    #[arg(long)]
    seed: Option<u64>,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Write the final dump to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn execute(args: CrawlArgs, services: &SimpleServices) -> Result<()> {
    let config = apply_overrides(&services.config(), &args)?;
    let start = start_location(&config, args.start.as_deref())?;

    let storage = services.open_storage()?;
    let previous = storage.load_rows(&config.storage_key)?;

    let seed_rows = if args.resume {
        info!("Resuming with {} stored statements", previous.len());
        previous
    } else {
        if !previous.is_empty() {
            info!("Previous batch has {} statements", previous.len());
            print!("{}", render_dump(&previous));
        }
        Vec::new()
    };

    let page = services.open_page(&start).await?;
    info!("Crawling artists from {}", start);

    let progress = if args.no_progress {
        ProgressUtils::hidden()
    } else {
        ProgressUtils::create_crawl_progress(crawl_span(
            config.crawl.first_artist_index,
            config.crawl.max_artists,
        ))
    };

    let mut driver = CrawlDriver::new(
        page,
        storage,
        config.storage_key.clone(),
        services.create_extractor(),
        config.selectors.clone(),
        config.crawl.clone(),
    )
    .with_rows(seed_rows)
    .with_progress(progress);

    if let Some(seed) = args.seed {
        driver = driver.with_seed(seed);
    }

    let report = driver.run().await;

    if report.interrupted {
        warn!("Crawl interrupted; dumping what was collected");
    }
    super::emit(args.output.as_deref(), &report.dump)?;

    eprintln!(
        "Visited {} artists in {} ticks: {} statements added, {} skipped",
        report.artists_visited, report.ticks, report.records, report.skipped
    );

    Ok(())
}

/// Copy of `config` with the command line bounds applied and re-validated.
fn apply_overrides(config: &Config, args: &CrawlArgs) -> Result<Config> {
    let mut config = config.clone();

    if let Some(from) = args.from {
        config.crawl.first_artist_index = from;
    }
    if let Some(max_artists) = args.max_artists {
        config.crawl.max_artists = max_artists;
    }
    if let Some(max_titles) = args.max_titles {
        config.crawl.max_titles = max_titles;
    }
    config.validate()?;

    if config.crawl.first_artist_index >= config.crawl.max_artists {
        warn!(
            "First artist index {} is not below max_artists {}; nothing will be visited",
            config.crawl.first_artist_index, config.crawl.max_artists
        );
    }

    Ok(config)
}

fn start_location(config: &Config, start: Option<&str>) -> Result<String> {
    let location = start
        .map(str::to_string)
        .or_else(|| config.start_url.clone())
        .ok_or_else(|| {
            ScrapeError::Validation(
                "No start page given; pass one or set start_url in the config".to_string(),
            )
        })?;

    ConfigValidator::validate_location(&location, "start")?;
    Ok(location)
}
