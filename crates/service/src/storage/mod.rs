//! Storage abstractions for the service layer
//!
//! Snapshot persistence for the credential table, kept behind a trait so the
//! on-disk format and replacement strategy can change independently of the
//! in-memory store.

pub mod snapshot;

pub use snapshot::{JsonFileSnapshot, SnapshotCodec, DEFAULT_FILE_MODE};
