//! Database operations for the flashcard store.
//!
//! Handles SQLite initialization, CRUD operations for decks and flashcards,
//! review-state persistence and the raw settings rows the settings resolver
//! reads. Review state is stored as one JSON document per card, the same
//! shape the cloud store holds.

use crate::error::StoreError;
use crate::models::learning_session::ReviewStore;
use crate::models::{Deck, DeckOverrides, DeckSet, Flashcard, ReviewData};
use rusqlite::{Connection, OptionalExtension, Result, params};
use std::sync::{Arc, Mutex};

const SETTINGS_KEY: &str = "settings";

/// Opens the database at `path` and creates the required tables.
pub fn init_database(path: &str) -> Result<Connection> {
    let conn = Connection::open(path)?;
    create_tables(&conn)?;
    Ok(conn)
}

/// In-memory database, used by tests.
pub fn init_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    create_tables(&conn)?;
    Ok(conn)
}

fn create_tables(conn: &Connection) -> Result<()> {
    // Decks carry their optional per-deck limit overrides as JSON
    conn.execute(
        "CREATE TABLE IF NOT EXISTS decks (
            name TEXT PRIMARY KEY,
            settings TEXT
        )",
        (),
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS flashcards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            deck_name TEXT NOT NULL,
            term TEXT NOT NULL,
            definition TEXT NOT NULL,
            suspended INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (deck_name) REFERENCES decks(name),
            UNIQUE(deck_name, term)
        )",
        (),
    )?;

    // One JSON document per rated card; no row means "new card"
    conn.execute(
        "CREATE TABLE IF NOT EXISTS review_data (
            flashcard_id INTEGER PRIMARY KEY,
            data TEXT NOT NULL,
            FOREIGN KEY (flashcard_id) REFERENCES flashcards(id) ON DELETE CASCADE
        )",
        (),
    )?;

    // Key-value rows backing the raw settings the resolver consumes
    conn.execute(
        "CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Creates a new deck in the database
pub fn new_deck(name: &str, conn: &Connection) -> Result<()> {
    conn.execute("INSERT INTO decks (name) VALUES (?1)", params![name])?;
    Ok(())
}

/// Stores or clears a deck's per-deck limit overrides.
pub fn set_deck_settings(
    name: &str,
    overrides: Option<&DeckOverrides>,
    conn: &Connection,
) -> Result<()> {
    let json = overrides.map(to_json).transpose()?;
    conn.execute(
        "UPDATE decks SET settings = ?1 WHERE name = ?2",
        params![json, name],
    )?;
    Ok(())
}

/// Adds a flashcard to a deck and returns its id. Review data stays absent
/// until the card is rated for the first time. Duplicates (same deck + term)
/// are ignored.
pub fn add_flashcard(
    deck_name: &str,
    term: &str,
    definition: &str,
    conn: &Connection,
) -> Result<i64> {
    conn.execute(
        "INSERT OR IGNORE INTO flashcards (deck_name, term, definition) VALUES (?1, ?2, ?3)",
        params![deck_name, term, definition],
    )?;

    conn.query_row(
        "SELECT id FROM flashcards WHERE deck_name = ?1 AND term = ?2",
        params![deck_name, term],
        |row| row.get(0),
    )
}

/// Suspends or resumes a card; suspended cards never enter a study queue.
pub fn set_card_suspended(card_id: i64, suspended: bool, conn: &Connection) -> Result<()> {
    conn.execute(
        "UPDATE flashcards SET suspended = ?1 WHERE id = ?2",
        params![suspended, card_id],
    )?;
    Ok(())
}

/// Writes a card's review state after a rating.
pub fn update_review_data(card_id: i64, data: &ReviewData, conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO review_data (flashcard_id, data) VALUES (?1, ?2)",
        params![card_id, to_json(data)?],
    )?;
    Ok(())
}

/// Reads a card's review state; `None` means the card is new.
pub fn get_review_data(card_id: i64, conn: &Connection) -> Result<Option<ReviewData>> {
    let json: Option<String> = conn
        .query_row(
            "SELECT data FROM review_data WHERE flashcard_id = ?1",
            params![card_id],
            |row| row.get(0),
        )
        .optional()?;

    Ok(json.as_deref().and_then(parse_review_data))
}

/// Retrieves all flashcards for a given deck, review state attached.
pub fn get_flashcards_for_deck(deck_name: &str, conn: &Connection) -> Result<Vec<Flashcard>> {
    let mut stmt = conn.prepare(
        "SELECT f.id, f.term, f.definition, f.suspended, r.data
         FROM flashcards f
         LEFT JOIN review_data r ON f.id = r.flashcard_id
         WHERE f.deck_name = ?1
         ORDER BY f.id",
    )?;

    let cards = stmt
        .query_map(params![deck_name], |row| {
            let data: Option<String> = row.get(4)?;
            Ok(Flashcard {
                id: row.get(0)?,
                term: row.get(1)?,
                definition: row.get(2)?,
                suspended: row.get(3)?,
                review_data: data.as_deref().and_then(parse_review_data),
            })
        })?
        .collect::<Result<Vec<Flashcard>>>()?;

    Ok(cards)
}

/// Loads all decks with their flashcards and review state into memory.
pub fn load_all_decks(conn: &Connection) -> Result<DeckSet> {
    let mut stmt = conn.prepare("SELECT name, settings FROM decks")?;
    let deck_rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })?
        .collect::<Result<Vec<_>>>()?;

    let mut decks = Vec::new();
    for (name, settings_json) in deck_rows {
        let cards = get_flashcards_for_deck(&name, conn)?;
        let settings = settings_json
            .as_deref()
            .and_then(|json| serde_json::from_str::<DeckOverrides>(json).ok());

        decks.push(Deck {
            name,
            cards,
            settings,
        });
    }

    Ok(DeckSet { decks })
}

/// Raw settings for the resolver. Missing or unreadable rows come back as
/// `null`, which the resolver turns into full defaults.
pub fn load_raw_settings(conn: &Connection) -> Result<serde_json::Value> {
    let json: Option<String> = conn
        .query_row(
            "SELECT value FROM app_state WHERE key = ?1",
            params![SETTINGS_KEY],
            |row| row.get(0),
        )
        .optional()?;

    Ok(json
        .as_deref()
        .and_then(|text| serde_json::from_str(text).ok())
        .unwrap_or(serde_json::Value::Null))
}

pub fn save_raw_settings(raw: &serde_json::Value, conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO app_state (key, value) VALUES (?1, ?2)",
        params![SETTINGS_KEY, raw.to_string()],
    )?;
    Ok(())
}

/// Corrupt review-state JSON is treated as "new card" rather than an error.
fn parse_review_data(json: &str) -> Option<ReviewData> {
    match serde_json::from_str(json) {
        Ok(data) => Some(data),
        Err(err) => {
            log::warn!("discarding unreadable review data: {err}");
            None
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|err| rusqlite::Error::ToSqlConversionFailure(Box::new(err)))
}

/// Shared-connection handle implementing the study session's persistence
/// collaborator.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

impl ReviewStore for SqliteStore {
    fn update_review_data(&self, card_id: i64, data: &ReviewData) -> Result<(), StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError("connection lock poisoned".to_string()))?;
        update_review_data(card_id, data, &conn).map_err(|err| StoreError(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn seeded() -> (Connection, i64) {
        let conn = init_in_memory().unwrap();
        new_deck("Polish Vocabulary", &conn).unwrap();
        let id = add_flashcard("Polish Vocabulary", "cześć", "hello", &conn).unwrap();
        (conn, id)
    }

    #[test]
    fn test_new_cards_have_no_review_data() {
        let (conn, id) = seeded();
        assert!(get_review_data(id, &conn).unwrap().is_none());

        let cards = get_flashcards_for_deck("Polish Vocabulary", &conn).unwrap();
        assert_eq!(cards.len(), 1);
        assert!(cards[0].review_data.is_none());
        assert!(!cards[0].suspended);
    }

    #[test]
    fn test_review_data_round_trips() {
        let (conn, id) = seeded();
        let data = ReviewData {
            interval: 6,
            repetitions: 2,
            is_learning: false,
            next_review: Some(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()),
            last_review: Some(Utc.with_ymd_and_hms(2026, 2, 23, 9, 0, 0).unwrap()),
            ..ReviewData::new()
        };

        update_review_data(id, &data, &conn).unwrap();
        let loaded = get_review_data(id, &conn).unwrap().unwrap();
        assert_eq!(loaded.interval, 6);
        assert_eq!(loaded.repetitions, 2);
        assert!(!loaded.is_learning);
        assert_eq!(loaded.next_review, data.next_review);
    }

    #[test]
    fn test_corrupt_review_data_reads_as_new_card() {
        let (conn, id) = seeded();
        conn.execute(
            "INSERT INTO review_data (flashcard_id, data) VALUES (?1, ?2)",
            params![id, "{not json"],
        )
        .unwrap();

        assert!(get_review_data(id, &conn).unwrap().is_none());
    }

    #[test]
    fn test_suspend_flag_round_trips() {
        let (conn, id) = seeded();
        set_card_suspended(id, true, &conn).unwrap();

        let cards = get_flashcards_for_deck("Polish Vocabulary", &conn).unwrap();
        assert!(cards[0].suspended);
    }

    #[test]
    fn test_load_all_decks_with_overrides() {
        let (conn, _id) = seeded();
        let overrides = DeckOverrides {
            new_cards_per_day: Some(5),
            max_reviews_per_day: None,
        };
        set_deck_settings("Polish Vocabulary", Some(&overrides), &conn).unwrap();

        let deck_set = load_all_decks(&conn).unwrap();
        assert_eq!(deck_set.decks.len(), 1);
        let deck = &deck_set.decks[0];
        assert_eq!(deck.cards.len(), 1);
        assert_eq!(deck.settings.unwrap().new_cards_per_day, Some(5));
    }

    #[test]
    fn test_duplicate_flashcards_are_ignored() {
        let (conn, id) = seeded();
        let again = add_flashcard("Polish Vocabulary", "cześć", "hello", &conn).unwrap();
        assert_eq!(id, again);
        assert_eq!(
            get_flashcards_for_deck("Polish Vocabulary", &conn)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_raw_settings_round_trip_and_default() {
        let conn = init_in_memory().unwrap();
        assert_eq!(load_raw_settings(&conn).unwrap(), serde_json::Value::Null);

        let raw = json!({ "newCards": 10, "learningSteps": "1, 10, 60" });
        save_raw_settings(&raw, &conn).unwrap();
        assert_eq!(load_raw_settings(&conn).unwrap(), raw);
    }

    #[test]
    fn test_sqlite_store_implements_the_session_collaborator() {
        let (conn, id) = seeded();
        let store = SqliteStore::new(Arc::new(Mutex::new(conn)));

        let mut data = ReviewData::new();
        data.step = 1;
        ReviewStore::update_review_data(&store, id, &data).unwrap();

        let conn = store.conn.lock().unwrap();
        let loaded = get_review_data(id, &conn).unwrap().unwrap();
        assert_eq!(loaded.step, 1);
    }
}
