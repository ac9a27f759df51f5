//! Study session management for spaced repetition practice.
//! Drives one queue of due cards: rating, re-queueing failed cards and
//! session statistics.

use super::scheduler::{self, QueueItem, Scheduler};
use super::{Deck, Flashcard, Quality, ReviewData};
use crate::error::{SchedulerError, StoreError};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

/// Persistence collaborator: a single fire-and-forget "update card review
/// data by id" operation. The session never reads back a confirmation.
pub trait ReviewStore {
    fn update_review_data(&self, card_id: i64, data: &ReviewData) -> Result<(), StoreError>;
}

/// Counters accumulated over one session, one per rating button.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub again: u32,
    pub hard: u32,
    pub good: u32,
    pub easy: u32,
}

impl SessionStats {
    pub fn total(&self) -> u32 {
        self.again + self.hard + self.good + self.easy
    }

    /// Share of Good/Easy answers; 0.0 when nothing was rated.
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        f64::from(self.good + self.easy) / f64::from(total)
    }

    fn record(&mut self, quality: Quality) {
        match quality {
            Quality::Again => self.again += 1,
            Quality::Hard => self.hard += 1,
            Quality::Good => self.good += 1,
            Quality::Easy => self.easy += 1,
        }
    }
}

/// Final report handed to the caller when the session ends.
#[derive(Clone, Copy, Debug)]
pub struct SessionSummary {
    pub stats: SessionStats,
    pub total: u32,
    pub accuracy: f64,
    /// Distinct cards rated; what the daily goal counts.
    pub unique_cards: usize,
}

/// Manages one study session over a private snapshot of a deck.
///
/// The queue holds indices into the snapshot, so an Again-rated card can be
/// re-inserted ahead of the cursor without invalidating anything - the
/// re-queued entry sees the already-updated review state. Ratings are
/// committed per card as they happen; dropping the session cancels the
/// remainder but keeps every review already persisted.
pub struct StudySession<S: ReviewStore> {
    pub deck_name: String,
    cards: Vec<Flashcard>,
    queue: Vec<QueueItem>,
    position: usize,
    show_definition: bool,
    scheduler: Scheduler,
    store: S,
    stats: SessionStats,
    counted_cards: HashSet<i64>,
    finished: bool,
    rng: StdRng,
}

impl<S: ReviewStore> StudySession<S> {
    /// Starts a session from whatever the deck has due right now, shuffled.
    /// Returns `None` when nothing is due - a normal condition, not an
    /// error.
    pub fn start(deck: &Deck, scheduler: Scheduler, store: S, now: DateTime<Utc>) -> Option<Self> {
        Self::start_with_rng(deck, scheduler, store, now, StdRng::from_os_rng())
    }

    /// Same as [`StudySession::start`] with a caller-supplied RNG, which
    /// makes shuffle order and re-queue offsets deterministic in tests.
    pub fn start_with_rng(
        deck: &Deck,
        scheduler: Scheduler,
        store: S,
        now: DateTime<Utc>,
        mut rng: StdRng,
    ) -> Option<Self> {
        let mut queue = scheduler::select_queue(deck, scheduler.settings(), now);
        if queue.is_empty() {
            log::info!("deck '{}': nothing due for review", deck.name);
            return None;
        }
        queue.shuffle(&mut rng);

        Some(Self {
            deck_name: deck.name.clone(),
            cards: deck.cards.clone(),
            queue,
            position: 0,
            show_definition: false,
            scheduler,
            store,
            stats: SessionStats::default(),
            counted_cards: HashSet::new(),
            finished: false,
            rng,
        })
    }

    pub fn current_card(&self) -> Option<&Flashcard> {
        self.queue
            .get(self.position)
            .map(|item| &self.cards[item.card_index])
    }

    /// Flips the answer side. Pure UI state, no scheduling effect.
    pub fn toggle_definition(&mut self) {
        self.show_definition = !self.show_definition;
    }

    pub fn definition_shown(&self) -> bool {
        self.show_definition
    }

    /// Rates the current card: runs the configured algorithm, hands the new
    /// state to the store, updates the in-memory snapshot and statistics,
    /// re-queues the card if it was failed, then advances.
    ///
    /// A storage failure is logged and otherwise ignored - persistence is
    /// eventually consistent and must never interrupt studying.
    pub fn rate(&mut self, quality: Quality, now: DateTime<Utc>) -> Result<(), SchedulerError> {
        let Some(item) = self.queue.get(self.position).copied() else {
            return Ok(());
        };

        let card_id = self.cards[item.card_index].id;
        let current = self.cards[item.card_index]
            .review_data
            .clone()
            .unwrap_or_default();
        let updated = self.scheduler.next_review(&current, quality, now)?;

        if let Err(err) = self.store.update_review_data(card_id, &updated) {
            log::warn!("failed to persist review for card {card_id}: {err}");
        }
        self.cards[item.card_index].review_data = Some(updated);

        self.stats.record(quality);
        self.counted_cards.insert(card_id);

        if quality == Quality::Again {
            self.requeue(item);
        }

        self.position += 1;
        self.show_definition = false;
        if self.position >= self.queue.len() {
            self.finished = true;
        }
        Ok(())
    }

    /// Re-inserts a failed card 3-8 positions ahead (clamped to the queue
    /// end) so it resurfaces later in the same session without immediately
    /// repeating.
    fn requeue(&mut self, item: QueueItem) {
        let offset = self
            .rng
            .random_range(3..=8)
            .min(self.queue.len() - self.position);
        self.queue.insert(self.position + offset, item);
    }

    /// "What would happen if rated X": the same dispatcher call as
    /// [`StudySession::rate`] with identical inputs, but nothing is
    /// persisted or mutated. Used to label the rating buttons.
    pub fn interval_preview(
        &self,
        quality: Quality,
        now: DateTime<Utc>,
    ) -> Result<String, SchedulerError> {
        let Some(item) = self.queue.get(self.position) else {
            return Ok(String::new());
        };

        let current = self.cards[item.card_index]
            .review_data
            .clone()
            .unwrap_or_default();
        let preview = self.scheduler.next_review(&current, quality, now)?;
        let due = preview.next_review.unwrap_or(now);
        Ok(scheduler::format_interval(now, due))
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// (1-based position, queue length) for the progress display. The
    /// length grows as failed cards are re-queued.
    pub fn progress(&self) -> (usize, usize) {
        ((self.position + 1).min(self.queue.len()), self.queue.len())
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Distinct cards rated this session; a card re-queued after Again is
    /// not double-counted toward the daily goal.
    pub fn unique_cards_reviewed(&self) -> usize {
        self.counted_cards.len()
    }

    /// Final statistics report. Meaningful once [`StudySession::is_finished`],
    /// but callable at any point.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            stats: self.stats,
            total: self.stats.total(),
            accuracy: self.stats.accuracy(),
            unique_cards: self.counted_cards.len(),
        }
    }
}
