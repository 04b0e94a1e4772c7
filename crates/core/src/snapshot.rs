//! Snapshot representation of a content tree
//!
//! A snapshot maps relative paths to `FileEntry` values and represents one
//! party's view of the content tree: the client's claimed local state, the
//! server's live state, or the manifest recorded at the last sync.

use crate::hash::{hash_file, ContentHash};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

/// Name of the engine state directory, excluded from every snapshot
pub const STATE_DIR: &str = ".quill";

/// A single file as seen by one snapshot
///
/// Immutable value keyed by `path` within its snapshot. Classification only
/// ever compares `content_hash`; `size` and `mtime_ms` are informational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Relative unix-style path from the content root
    pub path: String,
    /// BLAKE3 digest of the file content
    pub content_hash: ContentHash,
    /// File size in bytes
    pub size: u64,
    /// Modification time (unix milliseconds)
    pub mtime_ms: u64,
}

impl FileEntry {
    /// Create a new entry
    pub fn new(path: impl Into<String>, content_hash: ContentHash, size: u64, mtime_ms: u64) -> Self {
        Self {
            path: path.into(),
            content_hash,
            size,
            mtime_ms,
        }
    }
}

/// A path-keyed view of a content tree at a point in time
///
/// Backed by a `BTreeMap` so iteration order is always path-sorted, which
/// keeps everything derived from a snapshot deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    entries: BTreeMap<String, FileEntry>,
}

impl Snapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from entries (paths taken from each entry)
    pub fn from_entries(entries: impl IntoIterator<Item = FileEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|e| (e.path.clone(), e))
                .collect(),
        }
    }

    /// Insert an entry, keyed by its path
    pub fn insert(&mut self, entry: FileEntry) {
        self.entries.insert(entry.path.clone(), entry);
    }

    /// Get an entry by path
    pub fn get(&self, path: &str) -> Option<&FileEntry> {
        self.entries.get(path)
    }

    /// Whether the snapshot contains a path
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Remove an entry by path
    pub fn remove(&mut self, path: &str) -> Option<FileEntry> {
        self.entries.remove(path)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in path order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FileEntry)> {
        self.entries.iter()
    }

    /// All paths in sorted order
    pub fn paths(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Scan a content root into a snapshot
    ///
    /// Walks the directory, hashing every regular file. The engine state
    /// directory and VCS/system directories are skipped.
    pub fn scan(root: &Path) -> Result<Self> {
        let mut snapshot = Self::new();

        for entry in WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !should_ignore(e.path()))
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let rel_path = entry
                .path()
                .strip_prefix(root)
                .context("Scanned file outside content root")?;
            let path = to_unix_path(rel_path);

            let metadata = entry.metadata()?;
            let mtime_ms = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0);

            let content_hash = hash_file(entry.path())
                .with_context(|| format!("Failed to hash {}", entry.path().display()))?;

            snapshot.insert(FileEntry::new(path, content_hash, metadata.len(), mtime_ms));
        }

        tracing::debug!(files = snapshot.len(), root = %root.display(), "scanned content root");
        Ok(snapshot)
    }
}

/// Convert a relative path to unix-style separators
fn to_unix_path(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(&component.as_os_str().to_string_lossy());
    }
    out
}

/// Check if a path should be excluded from snapshots
fn should_ignore(path: &Path) -> bool {
    for component in path.components() {
        if let Some(comp_str) = component.as_os_str().to_str() {
            match comp_str {
                STATE_DIR | ".git" | ".jj" | ".cache" | "node_modules" => return true,
                _ => {}
            }
        }
    }
    false
}
