//! Taxonomy config loading
//!
//! The taxonomy lives in a TOML file edited by users:
//!
//! ```toml
//! [[labels]]
//! id = "rust"
//! parents = ["programming"]
//!
//! [[labels]]
//! id = "programming"
//! ```
//!
//! Loading interns the declared labels, skips edges whose parent is not a
//! declared label, and runs cycle breaking so the accepted edge set is
//! always a DAG. Every skipped or dropped edge becomes a warning string
//! meant for display, never for programmatic branching.

use crate::dag::{break_cycles, LabelEdge};
use ahash::AHashSet;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// One `[[labels]]` entry in the taxonomy file
#[derive(Debug, Clone, Deserialize)]
struct LabelDecl {
    /// Stable label identifier
    id: String,
    /// Parent label ids (a label may sit under several parents)
    #[serde(default)]
    parents: Vec<String>,
}

/// Raw shape of the taxonomy TOML file
#[derive(Debug, Default, Deserialize)]
struct TaxonomyFile {
    #[serde(default)]
    labels: Vec<LabelDecl>,
}

/// A validated label taxonomy: declared labels plus an acyclic edge set
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    /// Declared label ids, in declaration order
    pub labels: Vec<String>,
    /// Accepted `child -> parent` edges (always a DAG)
    pub edges: Vec<LabelEdge>,
}

impl Taxonomy {
    /// Parse and validate a taxonomy from TOML text
    ///
    /// Returns the taxonomy together with display warnings: one per edge
    /// whose parent is not a declared label, and one per edge dropped to
    /// break a cycle.
    pub fn from_toml_str(text: &str) -> Result<(Self, Vec<String>)> {
        let file: TaxonomyFile = toml::from_str(text).context("Failed to parse taxonomy")?;

        let mut warnings = Vec::new();
        let mut declared: AHashSet<&str> = AHashSet::new();
        let mut labels = Vec::new();
        for decl in &file.labels {
            if declared.insert(decl.id.as_str()) {
                labels.push(decl.id.clone());
            } else {
                warnings.push(format!("label '{}' is declared more than once", decl.id));
            }
        }

        let mut candidates = Vec::new();
        for decl in &file.labels {
            for parent in &decl.parents {
                if declared.contains(parent.as_str()) {
                    candidates.push(LabelEdge::new(decl.id.clone(), parent.clone()));
                } else {
                    warnings.push(format!(
                        "label '{}' references unknown parent '{}'; edge skipped",
                        decl.id, parent
                    ));
                }
            }
        }

        let (edges, dropped) = break_cycles(candidates);
        for edge in &dropped {
            warnings.push(format!(
                "label edge '{}' dropped: closes a cycle in the taxonomy",
                edge
            ));
        }

        if !dropped.is_empty() {
            tracing::warn!(dropped = dropped.len(), "taxonomy contained cycles");
        }

        Ok((Self { labels, edges }, warnings))
    }

    /// Load and validate the taxonomy file at `path`
    ///
    /// A missing file is an empty taxonomy, not an error, so a fresh
    /// content root works without any configuration.
    pub fn load(path: &Path) -> Result<(Self, Vec<String>)> {
        if !path.exists() {
            return Ok((Self::default(), Vec::new()));
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read taxonomy file {}", path.display()))?;
        Self::from_toml_str(&text)
    }
}
