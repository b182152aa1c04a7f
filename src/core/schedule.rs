//! Per-artist action plan built on an accumulating delay cursor
//!
//! Every action scheduled during one artist visit is placed at the sum of all
//! delays scheduled before it, plus its own. This keeps "open track N" and
//! "extract metadata" strictly ordered no matter how the jitter falls.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Inclusive range of milliseconds a randomized delay is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min: u64,
    pub max: u64,
}

impl DelayRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let millis = if self.max > self.min {
            rng.gen_range(self.min..=self.max)
        } else {
            self.min
        };
        Duration::from_millis(millis)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Click the n-th top track of the current artist
    OpenTrack(usize),
    ExtractLyrics,
    /// Persist the batch and go back to the artist listing
    ReturnToListing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledAction {
    /// Offset from the moment the plan was started
    pub at: Duration,
    pub action: Action,
}

#[derive(Debug, Clone, Copy)]
pub struct VisitTiming {
    pub max_titles: usize,
    pub open_track_delay: DelayRange,
    pub extract_delay: Duration,
    pub return_delay: Duration,
}

#[derive(Debug, Default)]
pub struct Timeline {
    cursor: Duration,
    queue: Vec<ScheduledAction>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the cursor by `delay` and schedule `action` at the new position.
    pub fn call_with_timeout(&mut self, action: Action, delay: Duration) {
        self.cursor += delay;
        self.queue.push(ScheduledAction {
            at: self.cursor,
            action,
        });
    }

    pub fn cursor(&self) -> Duration {
        self.cursor
    }

    pub fn actions(&self) -> &[ScheduledAction] {
        &self.queue
    }

    pub fn into_actions(self) -> Vec<ScheduledAction> {
        self.queue
    }

    /// The full action plan for one artist visit.
    pub fn plan_artist_visit<R: Rng + ?Sized>(timing: &VisitTiming, rng: &mut R) -> Self {
        let mut timeline = Self::new();

        for slot in 0..timing.max_titles {
            timeline.call_with_timeout(Action::OpenTrack(slot), timing.open_track_delay.sample(rng));
            timeline.call_with_timeout(Action::ExtractLyrics, timing.extract_delay);
        }
        timeline.call_with_timeout(Action::ReturnToListing, timing.return_delay);

        timeline
    }
}
