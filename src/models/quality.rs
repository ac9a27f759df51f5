//! Recall quality ratings emitted by the learner.

use crate::error::SchedulerError;
use serde::{Deserialize, Serialize};

/// How well the learner recalled a card.
///
/// The numeric codes come from the classic 0-5 SuperMemo scale; only these
/// four are ever emitted by the rating buttons, and the gaps are kept so
/// persisted review history stays compatible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Quality {
    /// Complete blackout, the card must be relearned.
    Again = 0,
    /// Recalled with serious difficulty.
    Hard = 2,
    /// Correct recall.
    Good = 3,
    /// Effortless recall.
    Easy = 5,
}

impl Quality {
    /// The persisted numeric code.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Good and Easy advance learning steps and grow review intervals.
    pub fn is_correct(self) -> bool {
        matches!(self, Quality::Good | Quality::Easy)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality as u8
    }
}

impl TryFrom<u8> for Quality {
    type Error = SchedulerError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Quality::Again),
            2 => Ok(Quality::Hard),
            3 => Ok(Quality::Good),
            5 => Ok(Quality::Easy),
            other => Err(SchedulerError::InvalidQuality(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_preserved() {
        assert_eq!(Quality::Again.code(), 0);
        assert_eq!(Quality::Hard.code(), 2);
        assert_eq!(Quality::Good.code(), 3);
        assert_eq!(Quality::Easy.code(), 5);
    }

    #[test]
    fn test_try_from_valid_codes() {
        assert_eq!(Quality::try_from(0).unwrap(), Quality::Again);
        assert_eq!(Quality::try_from(2).unwrap(), Quality::Hard);
        assert_eq!(Quality::try_from(3).unwrap(), Quality::Good);
        assert_eq!(Quality::try_from(5).unwrap(), Quality::Easy);
    }

    #[test]
    fn test_try_from_rejects_unmapped_codes() {
        for code in [1u8, 4, 6, 255] {
            assert!(matches!(
                Quality::try_from(code),
                Err(SchedulerError::InvalidQuality(c)) if c == code
            ));
        }
    }

    #[test]
    fn test_serde_round_trips_as_number() {
        let json = serde_json::to_string(&Quality::Easy).unwrap();
        assert_eq!(json, "5");
        let back: Quality = serde_json::from_str("3").unwrap();
        assert_eq!(back, Quality::Good);
        assert!(serde_json::from_str::<Quality>("4").is_err());
    }
}
