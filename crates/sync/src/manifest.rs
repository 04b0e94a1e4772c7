//! Durable manifest storage
//!
//! The manifest is the single piece of durable state the engine owns: the
//! server's record of file hashes as of the last successful sync, plus the
//! sync token under which that generation's base documents were stored. It
//! lives as pretty-printed JSON under the state directory and is replaced
//! atomically, so a crash mid-sync always leaves the previous manifest
//! intact.

use anyhow::{Context, Result};
use quill_core::{Snapshot, STATE_DIR};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use ulid::Ulid;

/// The manifest file name inside the state directory
const MANIFEST_FILE: &str = "manifest.json";

/// The last-sync record: a snapshot plus the token of its base generation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Token under which the base documents for this generation were stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<Ulid>,
    /// File hashes as of the last successful sync
    pub entries: Snapshot,
}

/// Loads and atomically replaces the manifest file
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    /// Store rooted at a content directory's state dir
    pub fn new(content_root: &Path) -> Self {
        Self {
            path: content_root.join(STATE_DIR).join(MANIFEST_FILE),
        }
    }

    /// Path of the manifest file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the manifest; a missing file is an empty manifest with no token
    pub fn load(&self) -> Result<Manifest> {
        if !self.path.exists() {
            return Ok(Manifest::default());
        }

        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read manifest {}", self.path.display()))?;
        serde_json::from_str(&text).context("Failed to parse manifest")
    }

    /// Replace the manifest as a single atomic unit
    ///
    /// Writes to a uniquely named temp file in the same directory and
    /// renames it over the manifest, so readers only ever see the old or
    /// the new generation, never a partial write.
    pub fn replace(&self, manifest: &Manifest) -> Result<()> {
        let parent = self
            .path
            .parent()
            .context("Manifest path has no parent directory")?;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create state dir {}", parent.display()))?;

        let json = serde_json::to_string_pretty(manifest).context("Failed to encode manifest")?;

        let mut temp = tempfile::NamedTempFile::new_in(parent)
            .context("Failed to create manifest temp file")?;
        temp.write_all(json.as_bytes())
            .context("Failed to write manifest temp file")?;
        temp.as_file()
            .sync_all()
            .context("Failed to flush manifest temp file")?;
        temp.persist(&self.path)
            .with_context(|| format!("Failed to replace manifest {}", self.path.display()))?;

        tracing::debug!(
            entries = manifest.entries.len(),
            token = ?manifest.token,
            "replaced manifest"
        );
        Ok(())
    }
}
