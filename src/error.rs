//! Error types for the scheduling engine.

use thiserror::Error;

/// Failures the scheduling engine can surface to callers.
///
/// Malformed settings and corrupt memory-model blobs are deliberately *not*
/// represented here: both fall back to defaults so a user is never blocked
/// from studying. An empty study queue is likewise a normal condition, not
/// an error.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A rating code outside {0, 2, 3, 5} reached the scheduling engine.
    /// Callers must map UI input to [`crate::models::Quality`] first.
    #[error("invalid quality rating: {0} (expected 0, 2, 3 or 5)")]
    InvalidQuality(u8),

    /// The injected memory-model algorithm failed to produce a schedule.
    #[error("memory model error: {0}")]
    MemoryModel(String),
}

/// Failure reported by the persistence collaborator.
///
/// Review writes are fire-and-forget; sessions log these as warnings and
/// keep going with the in-memory state already applied.
#[derive(Debug, Error)]
#[error("storage error: {0}")]
pub struct StoreError(pub String);
