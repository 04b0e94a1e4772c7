//! Manifest diffing
//!
//! Three snapshots meet at every sync: the client's claimed local state,
//! the manifest recorded at the last successful sync, and the server's
//! current live state. `compute_sync_plan` classifies every path that
//! appears in any of the three into exactly one bucket. It is a pure
//! function of its inputs; nothing here touches the filesystem.

use quill_core::{FileEntry, Snapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Action attached to every conflict entry
pub const CONFLICT_ACTION: &str = "merge";

/// How a conflicted path got into that state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// Both sides edited the file since the last sync
    Conflict,
    /// One side edited the file, the other deleted it
    DeleteModifyConflict,
}

/// One path the plan could not resolve automatically
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub path: String,
    pub change_type: ChangeType,
    /// Always `"merge"`; conflicts are resolved by merging, never by picking
    pub action: String,
}

impl Conflict {
    fn new(path: impl Into<String>, change_type: ChangeType) -> Self {
        Self {
            path: path.into(),
            change_type,
            action: CONFLICT_ACTION.to_string(),
        }
    }
}

/// Partition of all known paths into sync actions
///
/// The six buckets are pairwise disjoint and their union is
/// `paths(client) ∪ paths(manifest) ∪ paths(server)`. Every bucket is
/// path-sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPlan {
    /// Client-side changes the server does not have yet
    pub to_upload: Vec<String>,
    /// Server-side changes the client does not have yet
    pub to_download: Vec<String>,
    /// Paths the client deleted; delete on the server
    pub to_delete_remote: Vec<String>,
    /// Paths the server deleted; delete on the client
    pub to_delete_local: Vec<String>,
    /// Paths needing a three-way merge
    pub conflicts: Vec<Conflict>,
    /// Paths already in agreement
    pub no_change: Vec<String>,
}

impl SyncPlan {
    /// True when the plan requires no action at all
    pub fn is_noop(&self) -> bool {
        self.to_upload.is_empty()
            && self.to_download.is_empty()
            && self.to_delete_remote.is_empty()
            && self.to_delete_local.is_empty()
            && self.conflicts.is_empty()
    }

    /// Total number of classified paths across all buckets
    pub fn total_paths(&self) -> usize {
        self.to_upload.len()
            + self.to_download.len()
            + self.to_delete_remote.len()
            + self.to_delete_local.len()
            + self.conflicts.len()
            + self.no_change.len()
    }

    /// Paths in the conflict bucket, in path order
    pub fn conflict_paths(&self) -> impl Iterator<Item = &str> {
        self.conflicts.iter().map(|c| c.path.as_str())
    }
}

/// Classify every known path into a sync plan
///
/// Per path, the membership triplet `(client, manifest, server)` decides
/// the bucket; when all three are present the hashes against the manifest
/// decide who changed. Deleting on one side while the other side kept
/// editing is a delete-modify conflict rather than a silent delete, in
/// either direction.
pub fn compute_sync_plan(client: &Snapshot, manifest: &Snapshot, server: &Snapshot) -> SyncPlan {
    let mut plan = SyncPlan::default();

    let paths: BTreeSet<&String> = client
        .paths()
        .chain(manifest.paths())
        .chain(server.paths())
        .collect();

    for path in paths {
        let triplet = (client.get(path), manifest.get(path), server.get(path));
        match triplet {
            (Some(c), Some(m), Some(s)) => {
                let client_changed = changed(c, m);
                let server_changed = changed(s, m);
                match (client_changed, server_changed) {
                    (false, false) => plan.no_change.push(path.clone()),
                    (true, false) => plan.to_upload.push(path.clone()),
                    (false, true) => plan.to_download.push(path.clone()),
                    (true, true) if c.content_hash == s.content_hash => {
                        // Convergent edit: both sides arrived at the same bytes
                        plan.no_change.push(path.clone())
                    }
                    (true, true) => plan
                        .conflicts
                        .push(Conflict::new(path.clone(), ChangeType::Conflict)),
                }
            }

            // Never synced, exists on one side only
            (Some(_), None, None) => plan.to_upload.push(path.clone()),
            (None, None, Some(_)) => plan.to_download.push(path.clone()),

            // Server deleted it; did the client keep editing?
            (Some(c), Some(m), None) => {
                if changed(c, m) {
                    plan.conflicts
                        .push(Conflict::new(path.clone(), ChangeType::DeleteModifyConflict));
                } else {
                    plan.to_delete_local.push(path.clone());
                }
            }

            // Client deleted it; did the server keep editing?
            (None, Some(m), Some(s)) => {
                if changed(s, m) {
                    plan.conflicts
                        .push(Conflict::new(path.clone(), ChangeType::DeleteModifyConflict));
                } else {
                    plan.to_delete_remote.push(path.clone());
                }
            }

            // Added independently on both sides
            (Some(c), None, Some(s)) => {
                if c.content_hash == s.content_hash {
                    plan.no_change.push(path.clone());
                } else {
                    plan.conflicts
                        .push(Conflict::new(path.clone(), ChangeType::Conflict));
                }
            }

            // Both sides deleted it
            (None, Some(_), None) => plan.no_change.push(path.clone()),

            // Paths come from the union of the three snapshots
            (None, None, None) => {}
        }
    }

    tracing::debug!(
        upload = plan.to_upload.len(),
        download = plan.to_download.len(),
        delete_remote = plan.to_delete_remote.len(),
        delete_local = plan.to_delete_local.len(),
        conflicts = plan.conflicts.len(),
        no_change = plan.no_change.len(),
        "computed sync plan"
    );
    plan
}

fn changed(entry: &FileEntry, manifest_entry: &FileEntry) -> bool {
    entry.content_hash != manifest_entry.content_hash
}
