use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use freebusy_types::CodecError;

use crate::engine::EngineError;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The sentinel (all-zero) identifier was used where a real one is
    /// required.
    #[error("resource id cannot be the zero-value sentinel")]
    ZeroId,

    /// A more recent state for this identifier is already persisted; the
    /// caller's data is stale.
    #[error("a more recent version is already stored: stored since {stored}, submitted {submitted}")]
    Conflict {
        stored: DateTime<FixedOffset>,
        submitted: DateTime<FixedOffset>,
    },

    /// The stored record failed to decode.
    #[error("decoding stored record: {0}")]
    Corrupt(#[source] CodecError),

    /// Transaction failure from the key-value engine.
    #[error("engine transaction failed: {0}")]
    Engine(#[from] EngineError),
}

impl StoreError {
    /// True for a stale-write conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }

    /// True for a sentinel-identifier rejection.
    pub fn is_zero_value(&self) -> bool {
        matches!(self, StoreError::ZeroId)
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Returns `true` if `err`, or any error in its cause chain, is a
/// stale-write conflict. Wrapping is unwrapped transparently.
pub fn is_conflict(err: &(dyn std::error::Error + 'static)) -> bool {
    causes(err).any(|e| {
        e.downcast_ref::<StoreError>()
            .is_some_and(StoreError::is_conflict)
    })
}

/// Returns `true` if `err`, or any error in its cause chain, is a
/// sentinel-identifier rejection.
pub fn is_zero_value(err: &(dyn std::error::Error + 'static)) -> bool {
    causes(err).any(|e| {
        e.downcast_ref::<StoreError>()
            .is_some_and(StoreError::is_zero_value)
    })
}

fn causes<'a>(
    err: &'a (dyn std::error::Error + 'static),
) -> impl Iterator<Item = &'a (dyn std::error::Error + 'static)> {
    std::iter::successors(Some(err), |e| e.source())
}
