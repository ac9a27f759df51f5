//! Deck is a set of flashcards with optional per-deck limit overrides.
use super::{DeckOverrides, Flashcard};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub name: String,
    pub cards: Vec<Flashcard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<DeckOverrides>,
}

impl Default for Deck {
    fn default() -> Self {
        Self {
            name: "My Deck".to_string(),
            cards: Vec::new(),
            settings: None,
        }
    }
}
