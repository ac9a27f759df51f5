//! Algorithm dispatch and due-card queue building.

use super::memory_model::{self, FsrsModel, MemoryModel};
use super::{Algorithm, Deck, Quality, ReviewData, Settings, sm2};
use crate::error::SchedulerError;
use chrono::{DateTime, Utc};

/// Where a queue entry came from; determines ordering and which daily cap
/// applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueOrigin {
    Learning,
    Due,
    New,
}

/// One study-queue slot: an index into the deck's card list plus the pool
/// it was selected from.
#[derive(Clone, Copy, Debug)]
pub struct QueueItem {
    pub card_index: usize,
    pub origin: QueueOrigin,
}

/// Routes reviews through the configured algorithm. Everything downstream
/// of this type is algorithm-agnostic.
pub struct Scheduler {
    settings: Settings,
    model: Box<dyn MemoryModel>,
}

impl Scheduler {
    /// Builds a scheduler whose memory-model path is backed by the `fsrs`
    /// crate. Fails only when configured model parameters are rejected.
    pub fn new(settings: Settings) -> Result<Self, SchedulerError> {
        let model = Box::new(FsrsModel::from_settings(&settings)?);
        Ok(Self { settings, model })
    }

    /// Builds a scheduler around an injected memory-model implementation.
    pub fn with_model(settings: Settings, model: Box<dyn MemoryModel>) -> Self {
        Self { settings, model }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// `(state, quality, now) -> new state` through the configured
    /// algorithm. Deterministic for fixed inputs on both paths.
    pub fn next_review(
        &self,
        review_data: &ReviewData,
        quality: Quality,
        now: DateTime<Utc>,
    ) -> Result<ReviewData, SchedulerError> {
        match self.settings.algorithm {
            Algorithm::Sm2 => Ok(sm2::calculate_next_review(
                review_data,
                quality,
                &self.settings,
                now,
            )),
            Algorithm::MemoryModel => memory_model::calculate_next_review(
                self.model.as_ref(),
                review_data,
                quality,
                now,
            ),
        }
    }
}

/// Builds the ordered study queue for one deck.
///
/// Non-suspended cards partition into new (never reviewed), learning (in a
/// learning phase and due) and due review cards; anything not yet due is
/// left out entirely. The new and due pools are capped by the possibly
/// deck-overridden daily limits (0 = unlimited, first cards in deck order
/// win); learning cards are in-progress work and are never capped. Output
/// order is learning, then due, then new - most time-sensitive first.
pub fn select_queue(deck: &Deck, settings: &Settings, now: DateTime<Utc>) -> Vec<QueueItem> {
    let settings = match &deck.settings {
        Some(overrides) => settings.with_overrides(overrides),
        None => settings.clone(),
    };

    let mut learning = Vec::new();
    let mut due = Vec::new();
    let mut fresh = Vec::new();

    for (index, card) in deck.cards.iter().enumerate() {
        if card.suspended {
            continue;
        }
        match &card.review_data {
            None => fresh.push(index),
            Some(data) => match data.next_review {
                None => fresh.push(index),
                Some(next_review) if next_review <= now => {
                    if data.is_learning {
                        learning.push(index);
                    } else {
                        due.push(index);
                    }
                }
                Some(_) => {}
            },
        }
    }

    apply_cap(&mut due, settings.max_reviews_per_day);
    apply_cap(&mut fresh, settings.new_cards_per_day);

    let tag = |origin: QueueOrigin| {
        move |card_index: usize| QueueItem { card_index, origin }
    };
    learning
        .into_iter()
        .map(tag(QueueOrigin::Learning))
        .chain(due.into_iter().map(tag(QueueOrigin::Due)))
        .chain(fresh.into_iter().map(tag(QueueOrigin::New)))
        .collect()
}

fn apply_cap(pool: &mut Vec<usize>, cap: usize) {
    if cap > 0 {
        pool.truncate(cap);
    }
}

/// Review-status counts for a deck's badge display. Learning cards are
/// counted whether or not they are due yet; graduated cards that are not
/// due fall into no category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeckReviewStats {
    pub new_cards: usize,
    pub learning_cards: usize,
    pub due_cards: usize,
}

pub fn deck_review_stats(deck: &Deck, now: DateTime<Utc>) -> DeckReviewStats {
    let mut stats = DeckReviewStats::default();
    for card in &deck.cards {
        match &card.review_data {
            None => stats.new_cards += 1,
            Some(data) => match data.next_review {
                None => stats.new_cards += 1,
                Some(_) if data.is_learning => stats.learning_cards += 1,
                Some(next_review) if next_review <= now => stats.due_cards += 1,
                Some(_) => {}
            },
        }
    }
    stats
}

/// Compact label for the time until `due`, as shown on the rating buttons
/// ("1m", "2h", "6d", "3mo", "1y").
pub fn format_interval(now: DateTime<Utc>, due: DateTime<Utc>) -> String {
    let minutes = (due - now).num_minutes().max(1);
    if minutes < 60 {
        return format!("{minutes}m");
    }

    let days = minutes / (60 * 24);
    if days < 1 {
        format!("{}h", (minutes as f64 / 60.0).round() as i64)
    } else if days < 30 {
        format!("{days}d")
    } else if days < 365 {
        format!("{}mo", (days as f64 / 30.0).round() as i64)
    } else {
        format!("{}y", (days as f64 / 365.0).round() as i64)
    }
}
