pub mod deck;
pub mod deck_set;
pub mod flashcard;
pub mod learning_session;
pub mod memory_model;
pub mod quality;
pub mod review_data;
pub mod scheduler;
pub mod settings;
pub mod sm2;

pub use deck::Deck;
pub use deck_set::DeckSet;
pub use flashcard::Flashcard;
pub use learning_session::{ReviewStore, SessionStats, SessionSummary, StudySession};
pub use memory_model::{FsrsModel, MemoryModel};
pub use quality::Quality;
pub use review_data::{ReviewData, ReviewLogEntry};
pub use scheduler::{QueueItem, QueueOrigin, Scheduler, select_queue};
pub use settings::{Algorithm, DeckOverrides, Settings};
