//! The transactional key-value boundary the store runs against.
//!
//! Any backend (in-memory, embedded database, remote service) implements
//! [`Engine`] to provide closure-scoped transactions over named collections
//! of raw byte keys and values.

use thiserror::Error;

/// Errors from the key-value engine itself.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Backend-specific failure (corrupt file, closed handle, ...).
    #[error("engine backend error: {0}")]
    Backend(String),

    /// I/O error from the underlying storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Handle to an exclusive update transaction on one collection.
pub trait UpdateTransaction {
    /// Read the record for `key`, or `None` if absent.
    fn get(&self, key: &[u8]) -> EngineResult<Option<Vec<u8>>>;

    /// Write the record for `key`, replacing any prior value. The write
    /// becomes visible only if the transaction commits.
    fn put(&mut self, key: &[u8], value: &[u8]) -> EngineResult<()>;
}

/// Handle to a read-only transaction on one collection.
pub trait ReadTransaction {
    /// Read the record for `key`, or `None` if absent.
    fn get(&self, key: &[u8]) -> EngineResult<Option<Vec<u8>>>;
}

/// Transactional key-value engine.
///
/// Implementations must satisfy these invariants:
/// - `update` transactions are serialized against each other: the closure
///   observes the latest committed state and no other update runs until it
///   returns. A read-modify-write sequence inside one closure is atomic.
/// - A closure error aborts the transaction; staged writes are discarded.
/// - `view` transactions see a consistent snapshot, isolated from
///   concurrent updates.
/// - Keys and values are raw byte strings; the engine never interprets them.
pub trait Engine: Send + Sync {
    /// Run `f` inside one exclusive update transaction on `collection`.
    fn update<E, F>(&self, collection: &str, f: F) -> Result<(), E>
    where
        E: From<EngineError>,
        F: FnOnce(&mut dyn UpdateTransaction) -> Result<(), E>;

    /// Run `f` inside a read-only snapshot transaction on `collection`.
    fn view<E, F>(&self, collection: &str, f: F) -> Result<(), E>
    where
        E: From<EngineError>,
        F: FnOnce(&dyn ReadTransaction) -> Result<(), E>;
}
