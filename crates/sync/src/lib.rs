//! Sync engine: planning, stores, normalization, and the sync session
//!
//! This crate provides:
//! - The manifest differ (`compute_sync_plan`, `SyncPlan`)
//! - Durable manifest storage with atomic replace (`ManifestStore`)
//! - The versioned base-document store (`BaseStore`)
//! - The frontmatter normalizer (`normalize_post_frontmatter`)
//! - Engine configuration (`EngineConfig`)
//! - The end-to-end per-sync transaction (`SyncSession`)

pub mod base_store;
pub mod config;
pub mod manifest;
pub mod normalize;
pub mod plan;
pub mod session;

// Re-exports
pub use base_store::BaseStore;
pub use config::EngineConfig;
pub use manifest::{Manifest, ManifestStore};
pub use normalize::normalize_post_frontmatter;
pub use plan::{compute_sync_plan, ChangeType, Conflict, SyncPlan, CONFLICT_ACTION};
pub use session::{MergeStatus, PathOutcome, SyncReport, SyncSession};
