// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Scan Driver
//!
//! Walks every candidate pair of one or two address books, removes
//! redundant records automatically where allowed, and queues the remaining
//! duplicates for review.
//!
//! The driver is a state machine:
//!
//! ```text
//! Idle -> Scanning -> AwaitingReview -> Done
//!                  \________________/
//! ```
//!
//! Scanning is cooperative: after each time slice the driver yields to the
//! runtime and honours stop requests. Review commands (`advance`, `retreat`,
//! `apply`, `stop`) are only accepted while awaiting review.

pub mod events;

pub use events::{CallbackHandler, EventDispatcher, EventHandler, ScanEvent};

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::card::{is_virtual, FieldMap, Record};
use crate::finder::{matcher, Comparison, DuplicateFinder, MatchReason, MergeResult};
use crate::finder::ViewCache;
use crate::preferences::Preferences;
use crate::store::{RecordStore, StoreError};

/// Default interval between cooperative yields.
pub const DEFAULT_TIME_SLICE: Duration = Duration::from_millis(100);

/// Scan driver errors.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Record store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),

    #[error("Invalid scan state: expected {expected}, was {actual}")]
    InvalidState {
        expected: ScanState,
        actual: ScanState,
    },

    #[error("No pair awaiting review")]
    NoCurrentPair,

    #[error("Both sides of the pair are record {0}")]
    SameRecord(String),

    #[error("Failed to apply merge: {0}")]
    Apply(#[source] StoreError),
}

/// State of a scan session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScanState {
    Idle,
    Scanning,
    AwaitingReview,
    Done,
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ScanState::Idle => "idle",
            ScanState::Scanning => "scanning",
            ScanState::AwaitingReview => "awaiting review",
            ScanState::Done => "done",
        };
        f.write_str(text)
    }
}

/// One side of a duplicate pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    First,
    Second,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }
}

/// Positions of two duplicate records in the first and second collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DuplicatePair {
    pub first: usize,
    pub second: usize,
    pub reason: MatchReason,
}

impl DuplicatePair {
    pub fn index(&self, side: Side) -> usize {
        match side {
            Side::First => self.first,
            Side::Second => self.second,
        }
    }
}

/// Scan tuning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanOptions {
    /// How long the scan runs before yielding to the runtime.
    pub time_slice: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            time_slice: DEFAULT_TIME_SLICE,
        }
    }
}

impl ScanOptions {
    pub fn with_time_slice(mut self, time_slice: Duration) -> Self {
        self.time_slice = time_slice;
        self
    }
}

/// Requests a running scan to stop at its next yield.
#[derive(Clone, Debug, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.stopped.store(false, Ordering::SeqCst);
    }
}

/// End-of-session statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Records in the scanned books when the scan started.
    pub before: usize,
    /// Records left after removals.
    pub after: usize,
    pub removed_manually: usize,
    pub removed_automatically: usize,
    /// Records updated with merged values.
    pub changed: usize,
    /// Pairs skipped during review.
    pub skipped: usize,
}

/// Number of pairs examined for collections of the given sizes.
///
/// A single collection is paired with itself without repeats.
pub fn total_pairs(first: usize, second: Option<usize>) -> u64 {
    let first = first as u64;
    match second {
        Some(second) => first * second as u64,
        None => first * first.saturating_sub(1) / 2,
    }
}

/// The loaded records; deleted ones become `None` so positions stay valid.
#[derive(Default)]
struct Collections {
    first: Vec<Option<Record>>,
    /// `None` when both sides are the same book.
    second: Option<Vec<Option<Record>>>,
}

impl Collections {
    fn side(&self, side: Side) -> &[Option<Record>] {
        match (side, &self.second) {
            (Side::Second, Some(second)) => second,
            _ => &self.first,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut Vec<Option<Record>> {
        match (side, &mut self.second) {
            (Side::Second, Some(second)) => second,
            _ => &mut self.first,
        }
    }

    fn get(&self, side: Side, index: usize) -> Option<&Record> {
        self.side(side).get(index).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, side: Side, index: usize) -> Option<&mut Record> {
        self.side_mut(side).get_mut(index).and_then(Option::as_mut)
    }

    fn remove(&mut self, side: Side, index: usize) {
        if let Some(slot) = self.side_mut(side).get_mut(index) {
            *slot = None;
        }
    }

    fn is_live(&self, pair: &DuplicatePair) -> bool {
        self.get(Side::First, pair.first).is_some() && self.get(Side::Second, pair.second).is_some()
    }
}

/// Drives a duplicate scan against a record store.
pub struct ScanDriver<'a, S: RecordStore + ?Sized> {
    store: &'a S,
    finder: DuplicateFinder,
    options: ScanOptions,
    events: EventDispatcher,
    stop: StopHandle,
    state: ScanState,
    collections: Collections,
    cache: ViewCache,
    queue: Vec<DuplicatePair>,
    position: usize,
    /// Queue position whose kept record was updated but whose other record
    /// could not be deleted yet.
    updated_at: Option<usize>,
    stats: ScanSummary,
}

impl<'a, S: RecordStore + ?Sized> ScanDriver<'a, S> {
    /// Creates an idle driver.
    pub fn new(store: &'a S, preferences: Preferences) -> Self {
        ScanDriver {
            store,
            finder: DuplicateFinder::new(preferences),
            options: ScanOptions::default(),
            events: EventDispatcher::new(),
            stop: StopHandle::default(),
            state: ScanState::Idle,
            collections: Collections::default(),
            cache: ViewCache::new(),
            queue: Vec::new(),
            position: 0,
            updated_at: None,
            stats: ScanSummary::default(),
        }
    }

    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Registers an event handler.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.events.add_handler(handler);
        self
    }

    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.events.add_handler(handler);
    }

    /// Returns a handle that stops the scan from another task.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn finder(&self) -> &DuplicateFinder {
        &self.finder
    }

    /// Returns the pairs queued for review, in discovery order.
    pub fn queued(&self) -> &[DuplicatePair] {
        &self.queue
    }

    /// Returns the queue index of the pair under review.
    pub fn position(&self) -> Option<usize> {
        (self.state == ScanState::AwaitingReview).then_some(self.position)
    }

    /// Returns a loaded record that has not been deleted.
    pub fn record(&self, side: Side, index: usize) -> Option<&Record> {
        self.collections.get(side, index)
    }

    /// Returns the session statistics.
    pub fn summary(&self) -> ScanSummary {
        let removed = self.stats.removed_manually + self.stats.removed_automatically;
        ScanSummary {
            after: self.stats.before.saturating_sub(removed),
            ..self.stats
        }
    }

    /// Scans one book against itself, or two books against each other.
    ///
    /// Returns the state the scan ended in: `AwaitingReview` if pairs were
    /// queued, `Done` otherwise or when stopped. A book that cannot be
    /// listed ends the session with [`ScanError::StoreUnavailable`].
    pub async fn run(
        &mut self,
        first_book: &str,
        second_book: Option<&str>,
    ) -> Result<ScanState, ScanError> {
        if !matches!(self.state, ScanState::Idle | ScanState::Done) {
            return Err(ScanError::InvalidState {
                expected: ScanState::Idle,
                actual: self.state,
            });
        }
        self.stop.reset();
        self.queue.clear();
        self.position = 0;
        self.updated_at = None;
        self.stats = ScanSummary::default();
        self.cache.clear();
        self.set_state(ScanState::Scanning);

        let second_book = second_book.filter(|book| *book != first_book);
        if let Err(err) = self.load(first_book, second_book).await {
            self.collections = Collections::default();
            self.set_state(ScanState::Done);
            return Err(ScanError::StoreUnavailable(err));
        }

        let first_len = self.collections.first.len();
        let second_len = self.collections.second.as_ref().map(Vec::len);
        self.stats.before = first_len + second_len.unwrap_or(0);
        let total = total_pairs(first_len, second_len);
        info!(
            first_book,
            second_book = second_book.unwrap_or(first_book),
            records = self.stats.before,
            pairs = total,
            "scan started"
        );

        let stopped = self.scan_pairs(first_len, second_len, total).await;

        if stopped {
            info!("scan stopped");
            self.queue.clear();
            self.set_state(ScanState::Done);
        } else {
            match (0..self.queue.len()).find(|&i| self.collections.is_live(&self.queue[i])) {
                Some(position) => {
                    self.position = position;
                    self.set_state(ScanState::AwaitingReview);
                }
                None => self.set_state(ScanState::Done),
            }
            info!(
                queued = self.queue.len(),
                removed = self.stats.removed_automatically,
                "scan finished"
            );
        }
        Ok(self.state)
    }

    async fn load(&mut self, first_book: &str, second_book: Option<&str>) -> Result<(), StoreError> {
        let first = self.store.list(first_book).await?;
        let second = match second_book {
            Some(book) => Some(self.store.list(book).await?),
            None => None,
        };
        self.collections = Collections {
            first: first.into_iter().map(Some).collect(),
            second: second.map(|records| records.into_iter().map(Some).collect()),
        };
        Ok(())
    }

    // Row-major walk over all pairs. Returns true if stopped.
    async fn scan_pairs(&mut self, first_len: usize, second_len: Option<usize>, total: u64) -> bool {
        let shared = second_len.is_none();
        let second_len = second_len.unwrap_or(first_len);
        let mut checked = 0;
        let mut slice_start = Instant::now();

        for i in 0..first_len {
            let start = if shared { i + 1 } else { 0 };
            for j in start..second_len {
                checked += 1;
                if slice_start.elapsed() >= self.options.time_slice {
                    self.events.dispatch(ScanEvent::Progress { checked, total });
                    tokio::task::yield_now().await;
                    if self.stop.is_stopped() {
                        return true;
                    }
                    slice_start = Instant::now();
                }
                self.check_pair(i, j).await;
            }
        }

        self.events.dispatch(ScanEvent::Progress { checked, total });
        false
    }

    async fn check_pair(&mut self, i: usize, j: usize) {
        let (Some(a), Some(b)) = (
            self.collections.get(Side::First, i),
            self.collections.get(Side::Second, j),
        ) else {
            return;
        };

        let normalizer = self.finder.normalizer();
        let views = match self.cache.get_or_build(normalizer, a) {
            Ok(view_a) => self
                .cache
                .get_or_build(normalizer, b)
                .map(|view_b| (view_a, view_b)),
            Err(err) => Err(err),
        };
        let (view_a, view_b) = match views {
            Ok(views) => views,
            Err(err) => {
                warn!(first = i, second = j, "skipping pair: {}", err);
                return;
            }
        };
        let Some(reason) = matcher::match_reason(&view_a, &view_b) else {
            return;
        };

        let pair = DuplicatePair {
            first: i,
            second: j,
            reason,
        };
        debug!(first = i, second = j, %reason, "duplicate found");
        self.events.dispatch(ScanEvent::DuplicateFound { pair });

        if self.finder.preferences().auto_remove_duplicates && self.auto_remove(&pair).await {
            return;
        }
        self.queue.push(pair);
    }

    // Removes the less preferred record of a pair. Returns false if the pair
    // needs review instead.
    async fn auto_remove(&mut self, pair: &DuplicatePair) -> bool {
        let (Some(a), Some(b)) = (
            self.collections.get(Side::First, pair.first),
            self.collections.get(Side::Second, pair.second),
        ) else {
            return false;
        };
        let comparison = self.finder.compare(a, b);
        if !comparison.allows_removal() {
            return false;
        }
        let side = if comparison.prefers_removing_first() {
            Side::First
        } else {
            Side::Second
        };
        if side == Side::First && self.finder.preferences().preserve_first_on_auto_remove {
            return false;
        }

        let victim = if side == Side::First { a } else { b };
        let (record_id, book) = (victim.id().to_string(), victim.book().to_string());
        match self.store.delete(&record_id).await {
            Ok(()) => {
                self.collections.remove(side, pair.index(side));
                self.cache.invalidate(&book, &record_id);
                self.stats.removed_automatically += 1;
                debug!(record_id, "removed automatically");
                self.events
                    .dispatch(ScanEvent::AutoRemoved { side, record_id });
                true
            }
            Err(err) => {
                warn!("automatic removal failed, queueing for review: {}", err);
                false
            }
        }
    }

    /// Returns the pair under review.
    pub fn current(&self) -> Option<DuplicatePair> {
        if self.state != ScanState::AwaitingReview {
            return None;
        }
        self.queue
            .get(self.position)
            .copied()
            .filter(|pair| self.collections.is_live(pair))
    }

    /// Returns both records of the pair under review.
    pub fn current_pair(&self) -> Result<(&Record, &Record), ScanError> {
        self.require_review()?;
        let pair = self.current().ok_or(ScanError::NoCurrentPair)?;
        match (
            self.collections.get(Side::First, pair.first),
            self.collections.get(Side::Second, pair.second),
        ) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(ScanError::NoCurrentPair),
        }
    }

    /// Skips the pair under review.
    pub fn advance(&mut self) -> Result<ScanState, ScanError> {
        let pair = self.require_current()?;
        self.stats.skipped += 1;
        self.events.dispatch(ScanEvent::PairSkipped { pair });
        self.move_forward();
        Ok(self.state)
    }

    /// Goes back to the previous pair that is still live. Returns false if
    /// there is none.
    pub fn retreat(&mut self) -> Result<bool, ScanError> {
        self.require_review()?;
        let previous = (0..self.position)
            .rev()
            .find(|&i| self.collections.is_live(&self.queue[i]));
        match previous {
            Some(position) => {
                self.position = position;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Compares the two records under review.
    pub fn compare_current(&self) -> Result<Comparison, ScanError> {
        let (a, b) = self.current_pair()?;
        Ok(self.finder.compare(a, b))
    }

    /// Computes the merge of the pair under review without applying it.
    pub fn preview_merge(&self, keep: Side) -> Result<MergeResult, ScanError> {
        let (a, b) = self.current_pair()?;
        let (kept, other) = match keep {
            Side::First => (a, b),
            Side::Second => (b, a),
        };
        Ok(self.finder.merge(kept, other))
    }

    /// Merges the pair under review into the kept side, deletes the other
    /// record and moves on.
    pub async fn apply(&mut self, keep: Side) -> Result<ScanState, ScanError> {
        let fields = self.preview_merge(keep)?.into_fields();
        self.apply_fields(keep, fields).await
    }

    /// Like [`ScanDriver::apply`], with an explicit field map for the kept
    /// record.
    ///
    /// On failure the position does not change, so the pair can be retried
    /// or skipped. A pair counts as changed only once both the update and
    /// the delete have succeeded.
    pub async fn apply_fields(&mut self, keep: Side, fields: FieldMap) -> Result<ScanState, ScanError> {
        let pair = self.require_current()?;
        let remove = keep.other();
        let (Some(kept), Some(removed)) = (
            self.collections.get(keep, pair.index(keep)),
            self.collections.get(remove, pair.index(remove)),
        ) else {
            return Err(ScanError::NoCurrentPair);
        };
        if kept.id() == removed.id() && kept.book() == removed.book() {
            return Err(ScanError::SameRecord(kept.id().to_string()));
        }

        let changes: FieldMap = fields
            .into_iter()
            .filter(|(field, value)| !is_virtual(field) && kept.property(field) != *value)
            .collect();
        let (kept_id, kept_book) = (kept.id().to_string(), kept.book().to_string());
        let (removed_id, removed_book) = (removed.id().to_string(), removed.book().to_string());

        if !changes.is_empty() {
            self.store
                .update(&kept_id, &changes)
                .await
                .map_err(ScanError::Apply)?;
            if let Some(record) = self.collections.get_mut(keep, pair.index(keep)) {
                record.apply(&changes);
            }
            self.cache.invalidate(&kept_book, &kept_id);
            self.updated_at = Some(self.position);
        }

        self.store
            .delete(&removed_id)
            .await
            .map_err(ScanError::Apply)?;
        if self.updated_at.take() == Some(self.position) {
            self.stats.changed += 1;
        }
        self.collections.remove(remove, pair.index(remove));
        self.cache.invalidate(&removed_book, &removed_id);
        self.stats.removed_manually += 1;
        self.events.dispatch(ScanEvent::Applied {
            kept_id,
            removed_id,
        });

        self.move_forward();
        Ok(self.state)
    }

    /// Ends the session, dropping queued pairs. Removals already made stay.
    pub fn stop(&mut self) {
        self.stop.stop();
        self.queue.clear();
        self.position = 0;
        self.updated_at = None;
        if self.state != ScanState::Done {
            self.set_state(ScanState::Done);
        }
    }

    fn require_review(&self) -> Result<(), ScanError> {
        if self.state == ScanState::AwaitingReview {
            Ok(())
        } else {
            Err(ScanError::InvalidState {
                expected: ScanState::AwaitingReview,
                actual: self.state,
            })
        }
    }

    fn require_current(&self) -> Result<DuplicatePair, ScanError> {
        self.require_review()?;
        self.current().ok_or(ScanError::NoCurrentPair)
    }

    // Moves to the next live pair, or finishes the review.
    fn move_forward(&mut self) {
        self.updated_at = None;
        let next = (self.position + 1..self.queue.len())
            .find(|&i| self.collections.is_live(&self.queue[i]));
        match next {
            Some(position) => self.position = position,
            None => {
                self.position = self.queue.len();
                self.set_state(ScanState::Done);
                let summary = self.summary();
                info!(
                    before = summary.before,
                    after = summary.after,
                    changed = summary.changed,
                    skipped = summary.skipped,
                    "review finished"
                );
            }
        }
    }

    fn set_state(&mut self, state: ScanState) {
        self.state = state;
        self.events.dispatch(ScanEvent::StateChanged { state });
    }
}
