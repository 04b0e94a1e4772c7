//! Core types for the Quill sync engine
//!
//! This crate provides:
//! - BLAKE3 content hashing (`ContentHash`)
//! - Snapshot types (`FileEntry`, path-keyed `Snapshot`)
//! - Directory scanning into snapshots

pub mod hash;
pub mod snapshot;

// Re-exports
pub use hash::{hash_bytes, hash_file, ContentHash};
pub use snapshot::{FileEntry, Snapshot, STATE_DIR};
