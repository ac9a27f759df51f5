//! Flashcard is a pair <term, definition> plus its scheduling state.
use super::ReviewData;
use serde::{Deserialize, Serialize};

/// A single card. `review_data` is absent until the card is rated for the
/// first time; absent means "new". Suspended cards never enter a study
/// queue.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: i64,
    pub term: String,
    pub definition: String,
    #[serde(default)]
    pub suspended: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_data: Option<ReviewData>,
}

impl Flashcard {
    pub fn new(id: i64, term: &str, definition: &str) -> Self {
        Self {
            id,
            term: term.to_string(),
            definition: definition.to_string(),
            suspended: false,
            review_data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_card_has_no_review_data() {
        let card = Flashcard::new(1, "hello", "cześć");
        assert_eq!(card.term, "hello");
        assert_eq!(card.definition, "cześć");
        assert!(!card.suspended);
        assert!(card.review_data.is_none());
    }

    #[test]
    fn test_cards_without_flags_still_parse() {
        let card: Flashcard =
            serde_json::from_str(r#"{"id": 7, "term": "hello", "definition": "cześć"}"#).unwrap();
        assert!(!card.suspended);
        assert!(card.review_data.is_none());
    }
}
