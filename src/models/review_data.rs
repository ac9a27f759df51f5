//! Per-card spaced repetition state.

use super::Quality;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ease factor assigned to a card that has never been reviewed.
pub const INITIAL_EASE_FACTOR: f64 = 2.5;

/// The ease factor never drops below this.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// One line of the append-only review audit trail. Never pruned by the
/// engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLogEntry {
    pub timestamp: DateTime<Utc>,
    pub quality: Quality,
    /// Interval (days) resulting from this review; 0 while learning.
    pub interval: i64,
    pub is_learning: bool,
}

/// Scheduling state attached to a card once it has been rated at least once.
///
/// `interval` counts days since the last graduation and stays 0 while the
/// card is in a learning phase. `step` indexes into the active learning
/// steps and is only meaningful while `is_learning` is set.
/// `next_review == None` means "new card, eligible any time".
///
/// Serialized camelCase so the JSON documents the external store already
/// holds keep deserializing; `step` and `is_learning` default for records
/// written before learning steps existed.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewData {
    pub interval: i64,
    pub ease_factor: f64,
    /// Successful review-phase answers since the last lapse.
    pub repetitions: u32,
    #[serde(default)]
    pub step: usize,
    #[serde(default = "default_is_learning")]
    pub is_learning: bool,
    pub next_review: Option<DateTime<Utc>>,
    pub last_review: Option<DateTime<Utc>>,
    #[serde(default)]
    pub review_history: Vec<ReviewLogEntry>,
    /// Opaque state owned by the external memory-model algorithm. Never
    /// interpreted by this engine, only round-tripped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_state: Option<serde_json::Value>,
}

fn default_is_learning() -> bool {
    true
}

impl ReviewData {
    /// State for a card that has never been rated: first learning step,
    /// eligible any time.
    pub fn new() -> Self {
        Self {
            interval: 0,
            ease_factor: INITIAL_EASE_FACTOR,
            repetitions: 0,
            step: 0,
            is_learning: true,
            next_review: None,
            last_review: None,
            review_history: Vec::new(),
            memory_state: None,
        }
    }
}

impl Default for ReviewData {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_card_defaults() {
        let data = ReviewData::new();
        assert_eq!(data.interval, 0);
        assert_eq!(data.ease_factor, INITIAL_EASE_FACTOR);
        assert_eq!(data.repetitions, 0);
        assert_eq!(data.step, 0);
        assert!(data.is_learning);
        assert!(data.next_review.is_none());
        assert!(data.review_history.is_empty());
        assert!(data.memory_state.is_none());
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let json = serde_json::to_string(&ReviewData::new()).unwrap();
        assert!(json.contains("\"easeFactor\""));
        assert!(json.contains("\"nextReview\""));
        assert!(json.contains("\"reviewHistory\""));
        assert!(!json.contains("\"memoryState\""));
    }

    #[test]
    fn test_legacy_records_without_steps_still_parse() {
        // Records written before learning steps existed lack step/isLearning
        let json = r#"{
            "interval": 6,
            "easeFactor": 2.36,
            "repetitions": 2,
            "nextReview": "2026-03-01T09:00:00Z",
            "lastReview": "2026-02-23T09:00:00Z"
        }"#;
        let data: ReviewData = serde_json::from_str(json).unwrap();
        assert_eq!(data.step, 0);
        assert!(data.is_learning);
        assert!(data.review_history.is_empty());
    }
}
