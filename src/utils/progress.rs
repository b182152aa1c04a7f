use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Centralized progress bar creation utilities
pub struct ProgressUtils;

impl ProgressUtils {
    /// Progress over the artists a crawl will visit
    pub fn create_crawl_progress(total: u64) -> ProgressBar {
        let pb = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr());
        pb.set_style(
            ProgressStyle::default_bar()
                .template("🎵 [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("valid crawl template")
                .progress_chars("#>-"),
        );
        pb
    }

    /// Progress bar that draws nothing, for quiet runs
    pub fn hidden() -> ProgressBar {
        ProgressBar::hidden()
    }
}

/// Artists a crawl can visit at most, given its bounds
pub fn crawl_span(first_artist_index: usize, max_artists: usize) -> u64 {
    max_artists.saturating_sub(first_artist_index) as u64
}
