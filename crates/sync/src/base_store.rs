//! Versioned base-document store
//!
//! Three-way merges need the common ancestor of each post. After every
//! successful sync the engine writes the post contents of the agreed state
//! into a sled database under a fresh ULID token; presenting that token at
//! the next sync resolves the bases. A token that cannot be resolved, or a
//! path missing under it, simply yields no base and the merge proceeds
//! without an ancestor.

use anyhow::{Context, Result};
use quill_core::{hash_bytes, ContentHash};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use ulid::Ulid;

/// Key separator between token and path; paths never contain NUL
const KEY_SEP: u8 = 0;

/// One stored base document
#[derive(Debug, Serialize, Deserialize)]
struct BaseRecord {
    content_hash: ContentHash,
    content: String,
}

/// sled-backed store of base documents, keyed by `(token, path)`
pub struct BaseStore {
    db: sled::Db,
}

impl BaseStore {
    /// Open or create the store at `path`
    pub fn open(path: &Path) -> Result<Self> {
        let db = sled::open(path)
            .with_context(|| format!("Failed to open base store {}", path.display()))?;
        Ok(Self { db })
    }

    fn key(token: &Ulid, path: &str) -> Vec<u8> {
        let mut key = token.to_string().into_bytes();
        key.push(KEY_SEP);
        key.extend_from_slice(path.as_bytes());
        key
    }

    /// Record one base document under a generation token
    pub fn record(&self, token: &Ulid, path: &str, content: &str) -> Result<()> {
        let record = BaseRecord {
            content_hash: hash_bytes(content.as_bytes()),
            content: content.to_string(),
        };
        let value = bincode::serialize(&record).context("Failed to encode base record")?;
        self.db.insert(Self::key(token, path), value)?;
        Ok(())
    }

    /// Flush pending writes to disk
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    /// Resolve the base document stored for `(token, path)`
    ///
    /// Returns `None` for an unknown token or path, and also when the
    /// stored record fails its integrity check; merging without a base is
    /// always safer than merging against a corrupt one.
    pub fn get(&self, token: &Ulid, path: &str) -> Result<Option<String>> {
        let value = match self.db.get(Self::key(token, path))? {
            Some(value) => value,
            None => return Ok(None),
        };

        let record: BaseRecord =
            bincode::deserialize(&value).context("Failed to decode base record")?;
        if record.content_hash != hash_bytes(record.content.as_bytes()) {
            tracing::warn!(%token, path, "base record failed integrity check");
            return Ok(None);
        }
        Ok(Some(record.content))
    }

    /// All generation tokens present in the store, oldest first
    pub fn tokens(&self) -> Result<Vec<Ulid>> {
        let mut tokens = BTreeSet::new();
        for item in self.db.iter() {
            let (key, _) = item?;
            let sep = match key.iter().position(|&b| b == KEY_SEP) {
                Some(sep) => sep,
                None => continue,
            };
            if let Ok(text) = std::str::from_utf8(&key[..sep]) {
                if let Ok(token) = Ulid::from_string(text) {
                    tokens.insert(token);
                }
            }
        }
        Ok(tokens.into_iter().collect())
    }

    /// Drop all but the newest `keep_latest` generations
    ///
    /// Returns the number of records removed. Clients holding a pruned
    /// token fall back to base-less merges on their next sync.
    pub fn prune(&self, keep_latest: usize) -> Result<usize> {
        let tokens = self.tokens()?;
        if tokens.len() <= keep_latest {
            return Ok(0);
        }

        let mut removed = 0;
        for token in &tokens[..tokens.len() - keep_latest] {
            let mut prefix = token.to_string().into_bytes();
            prefix.push(KEY_SEP);

            for item in self.db.scan_prefix(&prefix) {
                let (key, _) = item?;
                self.db.remove(key)?;
                removed += 1;
            }
        }
        self.db.flush()?;

        tracing::debug!(removed, kept = keep_latest, "pruned base generations");
        Ok(removed)
    }
}
