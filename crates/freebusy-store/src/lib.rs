//! Conflict-aware persistence for freebusy resources.
//!
//! The store keeps the single most recent [`Resource`](freebusy_types::Resource)
//! per identifier in a transactional key-value engine. Writes are optimistic:
//! inside one exclusive engine transaction the latest stored record is read,
//! its timestamp compared, and the new record written — a save carrying an
//! older timestamp than what is stored is rejected as a conflict.
//!
//! # Key Types
//!
//! - [`ResourceStore`] — the save/get contract over any [`Engine`]
//! - [`Engine`], [`UpdateTransaction`], [`ReadTransaction`] — the
//!   key-value boundary backends implement
//! - [`MemoryEngine`] — lock-based in-memory engine for tests and embedding
//! - [`StoreError`] — error taxonomy, with [`is_conflict`] / [`is_zero_value`]
//!   predicates that look through cause chains

pub mod engine;
pub mod error;
pub mod memory;
pub mod store;

pub use engine::{Engine, EngineError, EngineResult, ReadTransaction, UpdateTransaction};
pub use error::{is_conflict, is_zero_value, StoreError, StoreResult};
pub use memory::MemoryEngine;
pub use store::ResourceStore;
