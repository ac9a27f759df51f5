//! Resolving raw key/value configuration into typed scheduler settings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Learning step durations (minutes) used when none are configured.
pub const DEFAULT_LEARNING_STEPS: [u32; 2] = [1, 10];

const DEFAULT_NEW_CARDS_PER_DAY: usize = 20;
const DEFAULT_MAX_REVIEWS_PER_DAY: usize = 100;
const DEFAULT_DESIRED_RETENTION: f64 = 0.9;

/// Which scheduling algorithm reviews are routed through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Algorithm {
    #[default]
    Sm2,
    MemoryModel,
}

/// Fully resolved scheduler configuration, immutable for the duration of a
/// study session.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Multiplier applied to graduated intervals (1.0 = 100%).
    pub interval_multiplier: f64,
    /// Learning step durations in minutes; ordered, never empty.
    pub learning_steps: Vec<u32>,
    /// Cap on new cards per study queue; 0 = unlimited.
    pub new_cards_per_day: usize,
    /// Cap on due review cards per study queue; 0 = unlimited.
    pub max_reviews_per_day: usize,
    pub algorithm: Algorithm,
    /// Target recall probability for the memory-model path.
    pub desired_retention: f64,
    /// Opaque parameter blob handed to the memory-model implementation.
    pub memory_model_params: Option<Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval_multiplier: 1.0,
            learning_steps: DEFAULT_LEARNING_STEPS.to_vec(),
            new_cards_per_day: DEFAULT_NEW_CARDS_PER_DAY,
            max_reviews_per_day: DEFAULT_MAX_REVIEWS_PER_DAY,
            algorithm: Algorithm::Sm2,
            desired_retention: DEFAULT_DESIRED_RETENTION,
            memory_model_params: None,
        }
    }
}

impl Settings {
    /// Resolves raw key/value configuration, substituting defaults for any
    /// missing or malformed field. Never fails: the result is always usable.
    ///
    /// `intervalMod` is stored as a percentage (100 = no scaling), matching
    /// what the settings screen writes.
    pub fn resolve(raw: &Value) -> Self {
        let defaults = Settings::default();

        let interval_multiplier = raw
            .get("intervalMod")
            .and_then(Value::as_f64)
            .filter(|percent| *percent > 0.0)
            .map(|percent| percent / 100.0)
            .unwrap_or(defaults.interval_multiplier);

        let learning_steps = raw
            .get("learningSteps")
            .map(parse_learning_steps)
            .unwrap_or(defaults.learning_steps);

        let new_cards_per_day = raw
            .get("newCards")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(defaults.new_cards_per_day);

        let max_reviews_per_day = raw
            .get("maxReviews")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(defaults.max_reviews_per_day);

        let algorithm = match raw.get("algorithm").and_then(Value::as_str) {
            Some("memoryModel") | Some("fsrs") => Algorithm::MemoryModel,
            _ => Algorithm::Sm2,
        };

        let desired_retention = raw
            .get("targetRetention")
            .and_then(Value::as_f64)
            .filter(|r| *r > 0.0 && *r < 1.0)
            .unwrap_or(defaults.desired_retention);

        Settings {
            interval_multiplier,
            learning_steps,
            new_cards_per_day,
            max_reviews_per_day,
            algorithm,
            desired_retention,
            memory_model_params: raw.get("memoryModelParams").cloned(),
        }
    }

    /// Applies a deck's field-by-field overrides on top of these settings.
    pub fn with_overrides(&self, overrides: &DeckOverrides) -> Self {
        let mut settings = self.clone();
        if let Some(new_cards) = overrides.new_cards_per_day {
            settings.new_cards_per_day = new_cards;
        }
        if let Some(max_reviews) = overrides.max_reviews_per_day {
            settings.max_reviews_per_day = max_reviews;
        }
        settings
    }
}

/// Per-deck limit overrides; unset fields fall through to the globals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeckOverrides {
    pub new_cards_per_day: Option<usize>,
    pub max_reviews_per_day: Option<usize>,
}

/// Parses learning steps from a "1, 10" style string (or an already-split
/// array), keeping positive integers only. An empty result falls back to
/// the default steps so the engine never sees an empty list.
fn parse_learning_steps(value: &Value) -> Vec<u32> {
    let steps: Vec<u32> = match value {
        Value::String(text) => text
            .split(',')
            .filter_map(|part| part.trim().parse::<i64>().ok())
            .filter(|minutes| *minutes > 0)
            .map(|minutes| minutes as u32)
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_i64)
            .filter(|minutes| *minutes > 0)
            .map(|minutes| minutes as u32)
            .collect(),
        _ => Vec::new(),
    };

    if steps.is_empty() {
        DEFAULT_LEARNING_STEPS.to_vec()
    } else {
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_config_gives_defaults() {
        let settings = Settings::resolve(&json!({}));
        assert_eq!(settings.interval_multiplier, 1.0);
        assert_eq!(settings.learning_steps, vec![1, 10]);
        assert_eq!(settings.new_cards_per_day, 20);
        assert_eq!(settings.max_reviews_per_day, 100);
        assert_eq!(settings.algorithm, Algorithm::Sm2);
        assert_eq!(settings.desired_retention, 0.9);
    }

    #[test]
    fn test_non_object_config_gives_defaults() {
        let settings = Settings::resolve(&Value::Null);
        assert_eq!(settings.new_cards_per_day, 20);
        assert_eq!(settings.learning_steps, vec![1, 10]);
    }

    #[test]
    fn test_interval_mod_is_a_percentage() {
        let settings = Settings::resolve(&json!({ "intervalMod": 150 }));
        assert_eq!(settings.interval_multiplier, 1.5);
    }

    #[test]
    fn test_negative_interval_mod_falls_back() {
        let settings = Settings::resolve(&json!({ "intervalMod": -50 }));
        assert_eq!(settings.interval_multiplier, 1.0);
    }

    #[test]
    fn test_learning_steps_parse_permissively() {
        let settings = Settings::resolve(&json!({ "learningSteps": "5, 0, x, 15" }));
        assert_eq!(settings.learning_steps, vec![5, 15]);
    }

    #[test]
    fn test_garbage_learning_steps_fall_back() {
        let settings = Settings::resolve(&json!({ "learningSteps": "a, -3" }));
        assert_eq!(settings.learning_steps, vec![1, 10]);

        let settings = Settings::resolve(&json!({ "learningSteps": 42 }));
        assert_eq!(settings.learning_steps, vec![1, 10]);
    }

    #[test]
    fn test_learning_steps_accept_arrays() {
        let settings = Settings::resolve(&json!({ "learningSteps": [1, 10, 60] }));
        assert_eq!(settings.learning_steps, vec![1, 10, 60]);
    }

    #[test]
    fn test_zero_limits_mean_unlimited_and_survive() {
        let settings = Settings::resolve(&json!({ "newCards": 0, "maxReviews": 0 }));
        assert_eq!(settings.new_cards_per_day, 0);
        assert_eq!(settings.max_reviews_per_day, 0);
    }

    #[test]
    fn test_algorithm_selection() {
        let settings = Settings::resolve(&json!({ "algorithm": "memoryModel" }));
        assert_eq!(settings.algorithm, Algorithm::MemoryModel);

        let settings = Settings::resolve(&json!({ "algorithm": "fsrs" }));
        assert_eq!(settings.algorithm, Algorithm::MemoryModel);

        let settings = Settings::resolve(&json!({ "algorithm": "anything-else" }));
        assert_eq!(settings.algorithm, Algorithm::Sm2);
    }

    #[test]
    fn test_deck_overrides_apply_field_by_field() {
        let settings = Settings::default();
        let overrides = DeckOverrides {
            new_cards_per_day: Some(5),
            max_reviews_per_day: None,
        };

        let merged = settings.with_overrides(&overrides);
        assert_eq!(merged.new_cards_per_day, 5);
        assert_eq!(merged.max_reviews_per_day, 100);
    }
}
