//! Label taxonomy for the Quill sync engine
//!
//! This crate provides:
//! - The label edge model (`child -> parent` pairs)
//! - Cycle breaking that keeps the taxonomy a DAG (`break_cycles`)
//! - Taxonomy config loading with human-readable warnings

pub mod config;
pub mod dag;

// Re-exports
pub use config::Taxonomy;
pub use dag::{break_cycles, LabelEdge};
