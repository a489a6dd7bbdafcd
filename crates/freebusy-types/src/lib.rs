//! Foundation types for freebusy.
//!
//! This crate provides the occupancy-tracking value types and their wire
//! codecs. Every other freebusy crate depends on `freebusy-types`.
//!
//! # Key Types
//!
//! - [`ResourceId`] — 128-bit identifier, UUIDv4 layout when freshly generated
//! - [`Status`] — occupancy level (free / busy / occupied)
//! - [`Resource`] — identifier + status + timestamp + label, with three
//!   independent wire forms (single-line text, JSON, versioned binary)
//! - [`CodecError`] — length / format / range error taxonomy with
//!   field-context wrapping

pub mod error;
pub mod id;
pub mod resource;
pub mod status;

pub use error::{CodecError, CodecResult};
pub use id::ResourceId;
pub use resource::{Resource, BINARY_LEN, BINARY_MAGIC, BINARY_VERSION};
pub use status::Status;
