//! Artist crawl driver
//!
//! A single-threaded event loop over one queue of deadlines. The repeating
//! artist tick and every per-artist action share the queue, so all page reads
//! and state changes happen on one timeline and need no locking.

use indicatif::ProgressBar;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::future::Future;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{CrawlConfig, Selectors};
use crate::core::extract::{SidebarExtractor, SkipReason};
use crate::core::page::{Page, Query};
use crate::core::schedule::{Action, ScheduledAction, Timeline};
use crate::core::song::SongRecord;
use crate::core::storage::{render_dump, LocalStorage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Idle,
    SelectingArtist,
    OpeningTracks,
    ExtractingLyrics,
    Persisting,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Tick,
    Run(Action),
}

#[derive(Debug)]
struct Pending {
    deadline: Instant,
    seq: u64,
    event: Event,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    // reversed so the heap pops the earliest deadline, then the earliest insert
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug, Default)]
struct EventQueue {
    heap: BinaryHeap<Pending>,
    next_seq: u64,
}

impl EventQueue {
    fn push(&mut self, deadline: Instant, event: Event) {
        self.heap.push(Pending {
            deadline,
            seq: self.next_seq,
            event,
        });
        self.next_seq += 1;
    }

    fn pop(&mut self) -> Option<Pending> {
        self.heap.pop()
    }
}

enum TickOutcome {
    Visiting(Vec<ScheduledAction>),
    Skipped,
    Finished,
}

#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    pub ticks: usize,
    pub artists_visited: usize,
    pub records: usize,
    pub skipped: usize,
    pub interrupted: bool,
    /// Newline-joined statements read back from storage
    pub dump: String,
}

pub struct CrawlDriver<P: Page> {
    page: P,
    storage: LocalStorage,
    storage_key: String,
    extractor: SidebarExtractor,
    selectors: Selectors,
    settings: CrawlConfig,
    rng: StdRng,
    progress: Option<ProgressBar>,

    state: CrawlState,
    next_index: usize,
    rows: Vec<String>,
    prev_title: Option<String>,
    /// History depth of the listing, taken right before the artist click
    listing_depth: Option<usize>,
    report: CrawlReport,
}

impl<P: Page> CrawlDriver<P> {
    pub fn new(
        page: P,
        storage: LocalStorage,
        storage_key: String,
        extractor: SidebarExtractor,
        selectors: Selectors,
        settings: CrawlConfig,
    ) -> Self {
        let next_index = settings.first_artist_index;
        Self {
            page,
            storage,
            storage_key,
            extractor,
            selectors,
            settings,
            rng: StdRng::from_entropy(),
            progress: None,
            state: CrawlState::Idle,
            next_index,
            rows: Vec::new(),
            prev_title: None,
            listing_depth: None,
            report: CrawlReport::default(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Continue from statements a previous run left behind.
    pub fn with_rows(mut self, rows: Vec<String>) -> Self {
        self.rows = rows;
        self
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    /// Crawl until the artist bound is reached or Ctrl-C is pressed.
    pub async fn run(&mut self) -> CrawlReport {
        let interrupt = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Cannot listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        };
        self.run_until(interrupt).await
    }

    /// Crawl until the artist bound is reached or `shutdown` resolves.
    ///
    /// Actions still queued from the last artist keep firing after the final
    /// dump; their rows reach storage but not the returned dump. `shutdown`
    /// also cuts that drain short.
    pub async fn run_until<F: Future<Output = ()>>(&mut self, shutdown: F) -> CrawlReport {
        tokio::pin!(shutdown);

        let interval = self.settings.tick_interval_ms.sample(&mut self.rng);
        info!("Visiting a new artist every {} ms", interval.as_millis());

        let mut queue = EventQueue::default();
        queue.push(Instant::now() + interval, Event::Tick);
        let mut finished = false;

        while let Some(pending) = queue.pop() {
            tokio::select! {
                _ = tokio::time::sleep_until(pending.deadline) => {}
                _ = &mut shutdown => {
                    self.report.interrupted = true;
                    if finished {
                        warn!("Interrupted; dropping {} late actions", queue.heap.len() + 1);
                    } else {
                        warn!("Interrupted; saving {} rows", self.rows.len());
                        self.finish();
                    }
                    return self.report.clone();
                }
            }

            match pending.event {
                Event::Tick => {
                    self.report.ticks += 1;
                    match self.on_tick().await {
                        TickOutcome::Visiting(plan) => {
                            let origin = Instant::now();
                            for scheduled in plan {
                                queue.push(origin + scheduled.at, Event::Run(scheduled.action));
                            }
                            queue.push(pending.deadline + interval, Event::Tick);
                        }
                        TickOutcome::Skipped => {
                            queue.push(pending.deadline + interval, Event::Tick);
                        }
                        TickOutcome::Finished => {
                            finished = true;
                            self.finish();
                        }
                    }
                }
                Event::Run(action) => {
                    if finished {
                        warn!("{:?} fired after the crawl finished", action);
                    }
                    self.on_action(action).await;
                }
            }
        }

        self.report.clone()
    }

    async fn on_tick(&mut self) -> TickOutcome {
        self.state = CrawlState::SelectingArtist;
        let index = self.next_index;
        self.next_index += 1;

        let artists = match self.page.find_all(&Query::new(self.selectors.artist_links.as_str())) {
            Ok(artists) => artists,
            Err(e) => {
                warn!("Cannot read artist listing: {}", e);
                Vec::new()
            }
        };
        info!("Opening artist {} ({} in listing)", index, artists.len());

        if index + 1 > artists.len() || index + 1 > self.settings.max_artists {
            let reason = SkipReason::OutOfBounds {
                index,
                available: artists.len(),
                limit: self.settings.max_artists,
            };
            info!("Stopping: {}", reason);
            return TickOutcome::Finished;
        }

        let artist = &artists[index];
        let name = artist.describe();
        if name.is_empty() || artist.target.is_none() {
            warn!("Empty artist at {}", index);
            self.report.skipped += 1;
            return TickOutcome::Skipped;
        }

        info!("Clicking on {}", name);
        let checkpoint = self.page.history_depth();
        if let Some(ref progress) = self.progress {
            progress.set_message(name.clone());
        }
        if let Err(e) = self.page.click(artist).await {
            warn!("Cannot open artist {}: {}", name, e);
            self.report.skipped += 1;
            return TickOutcome::Skipped;
        }

        self.listing_depth = Some(checkpoint);
        self.report.artists_visited += 1;
        if let Some(ref progress) = self.progress {
            progress.inc(1);
        }

        self.state = CrawlState::OpeningTracks;
        let plan = Timeline::plan_artist_visit(&self.settings.visit_timing(), &mut self.rng);
        debug!("Planned visit ends after {} ms", plan.cursor().as_millis());
        TickOutcome::Visiting(plan.into_actions())
    }

    async fn on_action(&mut self, action: Action) {
        match action {
            Action::OpenTrack(slot) => self.open_track(slot).await,
            Action::ExtractLyrics => {
                if let Err(reason) = self.extract_lyrics() {
                    warn!("Skipping extraction: {}", reason);
                    self.report.skipped += 1;
                }
            }
            Action::ReturnToListing => self.return_to_listing().await,
        }
    }

    async fn open_track(&mut self, slot: usize) {
        self.state = CrawlState::OpeningTracks;
        info!("Opening track {}", slot);

        let tracks = match self.page.find_all(&Query::new(self.selectors.top_tracks.as_str())) {
            Ok(tracks) => tracks,
            Err(e) => {
                warn!("Cannot read top tracks: {}", e);
                return;
            }
        };

        if tracks.is_empty() {
            warn!("{}", SkipReason::MissingElement { what: "top tracks".to_string() });
            return;
        }
        if slot + 1 > tracks.len() {
            warn!("We have only {} tracks", tracks.len());
            return;
        }

        if let Err(e) = self.page.click(&tracks[slot]).await {
            warn!("Cannot open track {}: {}", slot, e);
        }
    }

    fn extract_lyrics(&mut self) -> Result<(), SkipReason> {
        self.state = CrawlState::ExtractingLyrics;

        let song = self.extractor.extract(&self.page).map_err(|e| SkipReason::MissingElement {
            what: e.to_string(),
        })?;
        self.accept(song)?;
        info!("Total count {}", self.rows.len());
        Ok(())
    }

    /// Apply the empty-field and stale-title guards, then append the statement.
    pub fn accept(&mut self, song: SongRecord) -> Result<(), SkipReason> {
        let missing = song.missing_fields();
        if !missing.is_empty() {
            return Err(SkipReason::EmptyFields { fields: missing });
        }

        if self.prev_title.as_deref() == Some(song.title.as_str()) {
            return Err(SkipReason::StaleTitle { title: song.title });
        }

        let sql = song.to_insert_sql();
        debug!("{}", sql);
        self.rows.push(sql);
        self.prev_title = Some(song.title);
        self.report.records += 1;
        Ok(())
    }

    async fn return_to_listing(&mut self) {
        self.state = CrawlState::Persisting;
        self.persist();

        // track clicks may have stacked pages on top of the artist page
        let result = match self.listing_depth.take() {
            Some(depth) if self.page.history_depth() > depth => {
                self.page.navigate_back_to(depth).await
            }
            _ => self.page.navigate_back().await,
        };
        if let Err(e) = result {
            warn!("Cannot return to the artist listing: {}", e);
        }
        self.state = CrawlState::Idle;
    }

    fn persist(&self) {
        if let Err(e) = self.storage.save_rows(&self.storage_key, &self.rows) {
            warn!("Failed to persist {} rows: {}", self.rows.len(), e);
        }
    }

    fn finish(&mut self) {
        self.state = CrawlState::Persisting;
        self.persist();

        let rows = match self.storage.load_rows(&self.storage_key) {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Cannot read back persisted rows, dumping from memory: {}", e);
                self.rows.clone()
            }
        };

        if let Some(ref progress) = self.progress {
            progress.finish_with_message(format!("{} statements", rows.len()));
        }

        self.report.dump = render_dump(&rows);
        self.state = CrawlState::Done;
        info!("Crawl finished with {} statements", rows.len());
    }
}
