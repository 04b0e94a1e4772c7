//! Three-way merging of markdown posts
//!
//! This crate provides:
//! - The ordered frontmatter model (`FrontmatterMap`, `Value`)
//! - Document split/serialize (`split_document`, `serialize_document`)
//! - Semantic frontmatter merge (`merge_frontmatter`)
//! - Text body merge via an external diff3 tool (`merge_file`)
//! - Conflict marker utilities
//! - The per-post orchestrator (`merge_post_file`)
//!
//! Conflicts are data, not control flow: both merge functions return
//! conflict evidence as part of their result and never raise for it. Only
//! a failing external merge tool is an error.

pub mod body;
pub mod document;
pub mod fields;
pub mod frontmatter;
pub mod markers;
pub mod post;

// Re-exports
pub use body::{merge_file, merge_file_with, BodyMergeOptions, MergeToolError};
pub use document::{serialize_document, split_document, split_document_lossy, Document, DocumentError};
pub use fields::{merge_frontmatter, MergeOutcome};
pub use frontmatter::{FrontmatterMap, Value, CONFLICT_TRACKED_KEYS, RECOGNIZED_KEYS};
pub use post::{merge_post_file, merge_post_file_with, PostMergeResult};
