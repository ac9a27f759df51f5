//! Adapter for an external memory-model scheduling algorithm.
//!
//! The engine never computes stability or difficulty itself. It talks to a
//! [`MemoryModel`]: given a card's opaque prior state (or none, on first
//! use), the model returns the would-be state and due date for every
//! possible rating, and the adapter picks the branch matching the learner's
//! answer. [`FsrsModel`] plugs in the `fsrs` crate as that collaborator.

use super::review_data::{ReviewData, ReviewLogEntry};
use super::{Quality, Settings};
use crate::error::SchedulerError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Difficulty assigned when migrating SM-2 data without a stored model
/// state; mid-scale on the model's 1-10 range.
const MIGRATION_DIFFICULTY: f32 = 5.0;

/// Rating scale used by the external algorithm.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelRating {
    Again = 1,
    Hard = 2,
    Good = 3,
    Easy = 4,
}

impl From<Quality> for ModelRating {
    fn from(quality: Quality) -> Self {
        match quality {
            Quality::Again => ModelRating::Again,
            Quality::Hard => ModelRating::Hard,
            Quality::Good => ModelRating::Good,
            Quality::Easy => ModelRating::Easy,
        }
    }
}

/// Scheduling phase as the external algorithm tracks it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelPhase {
    New,
    Learning,
    Review,
    Relearning,
}

impl ModelPhase {
    /// New, Learning and Relearning all count as "learning" for the engine;
    /// only Review maps to a graduated card.
    pub fn is_learning(self) -> bool {
        !matches!(self, ModelPhase::Review)
    }
}

/// Internal card state owned by the external algorithm. Stored verbatim as
/// the card's `memory_state` blob; timestamps serialize as RFC 3339 strings
/// and are restored on the way back in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCardState {
    pub due: DateTime<Utc>,
    pub stability: f32,
    pub difficulty: f32,
    pub scheduled_days: u32,
    pub reps: u32,
    pub lapses: u32,
    pub phase: ModelPhase,
    pub last_review: Option<DateTime<Utc>>,
}

/// The would-be outcome for every possible rating.
#[derive(Clone, Debug)]
pub struct ModelSchedule {
    pub again: ModelCardState,
    pub hard: ModelCardState,
    pub good: ModelCardState,
    pub easy: ModelCardState,
}

impl ModelSchedule {
    pub fn branch(&self, rating: ModelRating) -> &ModelCardState {
        match rating {
            ModelRating::Again => &self.again,
            ModelRating::Hard => &self.hard,
            ModelRating::Good => &self.good,
            ModelRating::Easy => &self.easy,
        }
    }
}

/// Black-box contract for a pluggable memory-model algorithm: one call
/// computes the outcome of all four ratings at `now`.
pub trait MemoryModel {
    fn repeat(
        &self,
        state: Option<&ModelCardState>,
        now: DateTime<Utc>,
    ) -> Result<ModelSchedule, SchedulerError>;
}

/// Memory-model counterpart of [`super::sm2::calculate_next_review`]:
/// same shape of transition, with the actual scheduling delegated to the
/// injected algorithm.
pub fn calculate_next_review(
    model: &dyn MemoryModel,
    review_data: &ReviewData,
    quality: Quality,
    now: DateTime<Utc>,
) -> Result<ReviewData, SchedulerError> {
    let prior = restore_model_state(review_data, now);
    let schedule = model.repeat(prior.as_ref(), now)?;
    let outcome = schedule.branch(quality.into()).clone();

    let is_learning = outcome.phase.is_learning();
    let interval = i64::from(outcome.scheduled_days);

    let mut review_history = review_data.review_history.clone();
    review_history.push(ReviewLogEntry {
        timestamp: now,
        quality,
        interval,
        is_learning,
    });

    Ok(ReviewData {
        interval,
        // The model tracks difficulty itself; ease rides along untouched
        ease_factor: review_data.ease_factor,
        repetitions: outcome.reps,
        step: 0,
        is_learning,
        next_review: Some(outcome.due),
        last_review: Some(now),
        review_history,
        memory_state: serde_json::to_value(&outcome).ok(),
    })
}

/// Restores the external algorithm's state from the stored blob, falling
/// back to a best-effort migration from the SM-2 fields when the blob is
/// missing or unreadable. Scheduling never fails on a corrupt blob.
fn restore_model_state(review_data: &ReviewData, now: DateTime<Utc>) -> Option<ModelCardState> {
    if let Some(blob) = &review_data.memory_state {
        match serde_json::from_value::<ModelCardState>(blob.clone()) {
            Ok(state) => return Some(state),
            Err(err) => {
                log::warn!("unreadable memory state, re-migrating from SM-2 data: {err}");
            }
        }
    }
    migrate_from_sm2(review_data, now)
}

/// One-time approximation of a model state for a card with SM-2 history but
/// no blob yet: graduated cards seed stability from their current interval,
/// learning and new cards start cold.
fn migrate_from_sm2(review_data: &ReviewData, now: DateTime<Utc>) -> Option<ModelCardState> {
    let last_review = review_data.last_review?;
    if review_data.is_learning || review_data.interval <= 0 {
        return None;
    }
    Some(ModelCardState {
        due: review_data.next_review.unwrap_or(now),
        stability: review_data.interval as f32,
        difficulty: MIGRATION_DIFFICULTY,
        scheduled_days: review_data.interval as u32,
        reps: review_data.repetitions,
        lapses: 0,
        phase: ModelPhase::Review,
        last_review: Some(last_review),
    })
}

/// The `fsrs` crate plugged in as the memory model.
pub struct FsrsModel {
    inner: fsrs::FSRS,
    desired_retention: f32,
}

impl FsrsModel {
    /// Builds the model from resolved settings. Fails only when the
    /// configured parameter blob is present but rejected by the algorithm.
    pub fn from_settings(settings: &Settings) -> Result<Self, SchedulerError> {
        let params: Vec<f32> = settings
            .memory_model_params
            .as_ref()
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_f64)
                    .map(|p| p as f32)
                    .collect()
            })
            .unwrap_or_default();

        let inner = fsrs::FSRS::new(Some(params.as_slice()))
            .map_err(|err| SchedulerError::MemoryModel(err.to_string()))?;

        Ok(Self {
            inner,
            desired_retention: settings.desired_retention as f32,
        })
    }
}

impl MemoryModel for FsrsModel {
    fn repeat(
        &self,
        state: Option<&ModelCardState>,
        now: DateTime<Utc>,
    ) -> Result<ModelSchedule, SchedulerError> {
        let memory = state.map(|s| fsrs::MemoryState {
            stability: s.stability,
            difficulty: s.difficulty,
        });
        let elapsed_days = state
            .and_then(|s| s.last_review)
            .map(|last| (now - last).num_days().max(0) as u32)
            .unwrap_or(0);

        let next = self
            .inner
            .next_states(memory, self.desired_retention, elapsed_days)
            .map_err(|err| SchedulerError::MemoryModel(err.to_string()))?;

        let phase = state.map(|s| s.phase).unwrap_or(ModelPhase::New);
        let reps = state.map(|s| s.reps).unwrap_or(0);
        let lapses = state.map(|s| s.lapses).unwrap_or(0);

        let build = |item: &fsrs::ItemState, rating: ModelRating| {
            let interval = item.interval.round().max(1.0) as u32;
            ModelCardState {
                due: now + Duration::days(i64::from(interval)),
                stability: item.memory.stability,
                difficulty: item.memory.difficulty,
                scheduled_days: interval,
                reps: reps + 1,
                lapses: lapses + u32::from(rating == ModelRating::Again),
                phase: next_phase(phase, rating),
                last_review: Some(now),
            }
        };

        Ok(ModelSchedule {
            again: build(&next.again, ModelRating::Again),
            hard: build(&next.hard, ModelRating::Hard),
            good: build(&next.good, ModelRating::Good),
            easy: build(&next.easy, ModelRating::Easy),
        })
    }
}

/// Phase chart of ts-fsrs style schedulers: Easy graduates a new card
/// immediately, Good graduates a learning card, Again sends a review card
/// into relearning.
fn next_phase(current: ModelPhase, rating: ModelRating) -> ModelPhase {
    match (current, rating) {
        (ModelPhase::New, ModelRating::Easy) => ModelPhase::Review,
        (ModelPhase::New, _) => ModelPhase::Learning,
        (ModelPhase::Learning | ModelPhase::Relearning, ModelRating::Again | ModelRating::Hard) => {
            current
        }
        (ModelPhase::Learning | ModelPhase::Relearning, _) => ModelPhase::Review,
        (ModelPhase::Review, ModelRating::Again) => ModelPhase::Relearning,
        (ModelPhase::Review, _) => ModelPhase::Review,
    }
}
