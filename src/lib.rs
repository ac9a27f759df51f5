pub mod database;
pub mod error;
pub mod models;

pub use error::{SchedulerError, StoreError};
pub use models::{
    Deck, DeckSet, Flashcard, Quality, ReviewData, Scheduler, Settings, StudySession,
};
