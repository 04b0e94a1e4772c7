//! The per-sync transaction
//!
//! A sync session reconciles a client content directory against the server
//! content root in one linear pass: load the manifest, scan both sides,
//! compute the plan, apply uploads/downloads/deletes, merge every conflict
//! path against its stored base, normalize fresh uploads, and finally
//! commit by writing a new base generation and atomically replacing the
//! manifest.
//!
//! Per-path failures never abort the session: I/O problems become
//! warnings, merge tool failures become `Failed` outcomes that keep the
//! path's old manifest record so the next sync re-detects the conflict.
//! The manifest is replaced exactly once at the end, or not at all.

use crate::base_store::BaseStore;
use crate::config::EngineConfig;
use crate::manifest::{Manifest, ManifestStore};
use crate::normalize::{is_post_path, normalize_post_frontmatter};
use crate::plan::{compute_sync_plan, Conflict, SyncPlan};
use anyhow::{Context, Result};
use chrono::Utc;
use merge::{merge_post_file_with, BodyMergeOptions};
use quill_core::{Snapshot, STATE_DIR};
use serde::Serialize;
use std::path::{Path, PathBuf};
use ulid::Ulid;

/// Base store file name inside the state directory
const BASE_DB: &str = "base.db";

/// Base generations kept after pruning
const KEEP_BASE_GENERATIONS: usize = 8;

/// How one conflicted path ended up after merging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStatus {
    /// Merged cleanly, no conflicts left
    Merged,
    /// Merged, but conflict evidence remains for the user
    Conflicted,
    /// The merge tool failed; the path was left as it was
    Failed,
}

/// Result of processing one conflicted path
#[derive(Debug, Clone, Serialize)]
pub struct PathOutcome {
    pub path: String,
    pub status: MergeStatus,
    /// Tracked frontmatter keys both sides changed to different values
    pub field_conflicts: Vec<String>,
    /// True when conflict markers remain in the written content
    pub body_conflicted: bool,
    /// Merge tool failure message, for `Failed` outcomes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PathOutcome {
    fn failed(path: &str, message: String) -> Self {
        Self {
            path: path.to_string(),
            status: MergeStatus::Failed,
            field_conflicts: Vec::new(),
            body_conflicted: false,
            error: Some(message),
        }
    }
}

/// Everything one sync produced
#[derive(Debug, Serialize)]
pub struct SyncReport {
    pub plan: SyncPlan,
    pub outcomes: Vec<PathOutcome>,
    pub warnings: Vec<String>,
    /// Token of the base generation recorded by this sync
    pub token: Ulid,
}

/// A sync engine bound to one server content root
pub struct SyncSession {
    server_root: PathBuf,
    config: EngineConfig,
    manifest_store: ManifestStore,
    base_store: BaseStore,
}

impl SyncSession {
    /// Open the engine state under a server content root
    pub fn open(server_root: &Path) -> Result<Self> {
        let config = EngineConfig::load(server_root)?;
        let manifest_store = ManifestStore::new(server_root);
        let base_store = BaseStore::open(&server_root.join(STATE_DIR).join(BASE_DB))?;
        Ok(Self {
            server_root: server_root.to_path_buf(),
            config,
            manifest_store,
            base_store,
        })
    }

    /// The engine configuration in effect
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The current manifest
    pub fn manifest(&self) -> Result<Manifest> {
        self.manifest_store.load()
    }

    /// Compute the sync plan for a client directory without applying it
    pub fn plan(&self, client_root: &Path) -> Result<SyncPlan> {
        let manifest = self.manifest_store.load()?;
        let client = Snapshot::scan(client_root)?;
        let server = Snapshot::scan(&self.server_root)?;
        Ok(compute_sync_plan(&client, &manifest.entries, &server))
    }

    /// Run one full sync against a client directory
    pub fn sync(&self, client_root: &Path) -> Result<SyncReport> {
        let manifest = self.manifest_store.load()?;
        let client = Snapshot::scan(client_root)?;
        let server = Snapshot::scan(&self.server_root)?;
        let plan = compute_sync_plan(&client, &manifest.entries, &server);

        let mut warnings = Vec::new();
        let mut outcomes = Vec::new();
        let mut uploaded = Vec::new();

        for path in &plan.to_upload {
            match copy_file(client_root, &self.server_root, path) {
                Ok(()) => uploaded.push(path.clone()),
                Err(error) => warnings.push(format!("upload of '{}' failed: {:#}", path, error)),
            }
        }
        for path in &plan.to_download {
            if let Err(error) = copy_file(&self.server_root, client_root, path) {
                warnings.push(format!("download of '{}' failed: {:#}", path, error));
            }
        }
        for path in &plan.to_delete_remote {
            if let Err(error) = remove_file(&self.server_root, path) {
                warnings.push(format!("server delete of '{}' failed: {:#}", path, error));
            }
        }
        for path in &plan.to_delete_local {
            if let Err(error) = remove_file(client_root, path) {
                warnings.push(format!("client delete of '{}' failed: {:#}", path, error));
            }
        }

        let options = self.config.body_merge_options();
        for conflict in &plan.conflicts {
            outcomes.push(self.merge_conflict(client_root, conflict, &manifest, &options, &mut warnings));
        }

        // Non-post uploads (assets, taxonomy file) carry no frontmatter;
        // only posts go through normalization.
        let uploaded_posts: Vec<String> = uploaded
            .into_iter()
            .filter(|path| is_post_path(path, &self.config.posts_dir))
            .collect();
        warnings.extend(normalize_post_frontmatter(
            &uploaded_posts,
            &manifest.entries,
            &self.server_root,
            &self.config.default_author,
            &self.config.posts_dir,
            Utc::now(),
        ));
        // Normalization may have rewritten uploads on the server; mirror
        // them back so both sides converge on the normalized bytes.
        for path in &uploaded_posts {
            if let Err(error) = copy_file(&self.server_root, client_root, path) {
                warnings.push(format!("copy-back of '{}' failed: {:#}", path, error));
            }
        }

        self.commit(&manifest, plan, outcomes, warnings)
    }

    /// Record the new base generation and atomically replace the manifest
    fn commit(
        &self,
        old_manifest: &Manifest,
        plan: SyncPlan,
        outcomes: Vec<PathOutcome>,
        mut warnings: Vec<String>,
    ) -> Result<SyncReport> {
        let mut entries = Snapshot::scan(&self.server_root)?;

        // A failed merge keeps its old manifest record so the next sync
        // classifies the path as conflicted again instead of synced.
        for outcome in &outcomes {
            if outcome.status == MergeStatus::Failed {
                match old_manifest.entries.get(&outcome.path) {
                    Some(old) => entries.insert(old.clone()),
                    None => {
                        entries.remove(&outcome.path);
                    }
                }
            }
        }

        let token = Ulid::new();
        for (path, _) in entries.iter() {
            if !is_post_path(path, &self.config.posts_dir) {
                continue;
            }
            let text = std::fs::read_to_string(self.server_root.join(path))
                .with_context(|| format!("Failed to read '{}' for the base generation", path))?;
            self.base_store.record(&token, path, &text)?;
        }
        self.base_store.flush()?;
        if let Err(error) = self.base_store.prune(KEEP_BASE_GENERATIONS) {
            warnings.push(format!("base store pruning failed: {:#}", error));
        }

        self.manifest_store.replace(&Manifest {
            token: Some(token),
            entries,
        })?;

        tracing::info!(
            %token,
            conflicts = outcomes.len(),
            warnings = warnings.len(),
            "sync committed"
        );
        Ok(SyncReport {
            plan,
            outcomes,
            warnings,
            token,
        })
    }

    fn merge_conflict(
        &self,
        client_root: &Path,
        conflict: &Conflict,
        manifest: &Manifest,
        options: &BodyMergeOptions,
        warnings: &mut Vec<String>,
    ) -> PathOutcome {
        let path = &conflict.path;
        let server_doc = match read_optional(&self.server_root.join(path)) {
            Ok(doc) => doc,
            Err(error) => return PathOutcome::failed(path, format!("{:#}", error)),
        };
        let client_doc = match read_optional(&client_root.join(path)) {
            Ok(doc) => doc,
            Err(error) => return PathOutcome::failed(path, format!("{:#}", error)),
        };

        match (server_doc, client_doc) {
            (Some(server_doc), Some(client_doc)) => {
                let base = self.resolve_base(manifest, path, warnings);
                match merge_post_file_with(base.as_deref(), &server_doc, &client_doc, options) {
                    Ok(result) => {
                        if let Err(error) =
                            self.write_both(client_root, path, &result.merged_content)
                        {
                            return PathOutcome::failed(path, format!("{:#}", error));
                        }
                        let status = if result.is_conflicted() {
                            MergeStatus::Conflicted
                        } else {
                            MergeStatus::Merged
                        };
                        PathOutcome {
                            path: path.clone(),
                            status,
                            field_conflicts: result.field_conflicts,
                            body_conflicted: result.body_conflicted,
                            error: None,
                        }
                    }
                    Err(error) => {
                        tracing::error!(path, %error, "merge tool failed");
                        PathOutcome::failed(path, error.to_string())
                    }
                }
            }

            // Delete-modify: the surviving side's content stands on both
            // sides, reported as conflicted so the user reviews it.
            (Some(survivor), None) | (None, Some(survivor)) => {
                if let Err(error) = self.write_both(client_root, path, &survivor) {
                    return PathOutcome::failed(path, format!("{:#}", error));
                }
                PathOutcome {
                    path: path.clone(),
                    status: MergeStatus::Conflicted,
                    field_conflicts: Vec::new(),
                    body_conflicted: true,
                    error: None,
                }
            }

            (None, None) => {
                PathOutcome::failed(path, "content missing on both sides".to_string())
            }
        }
    }

    fn resolve_base(
        &self,
        manifest: &Manifest,
        path: &str,
        warnings: &mut Vec<String>,
    ) -> Option<String> {
        let token = manifest.token?;
        match self.base_store.get(&token, path) {
            Ok(base) => base,
            Err(error) => {
                warnings.push(format!("base lookup for '{}' failed: {:#}", path, error));
                None
            }
        }
    }

    fn write_both(&self, client_root: &Path, path: &str, content: &str) -> Result<()> {
        write_under(&self.server_root, path, content)?;
        write_under(client_root, path, content)
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(error) => {
            Err(error).with_context(|| format!("Failed to read {}", path.display()))
        }
    }
}

fn write_under(root: &Path, path: &str, content: &str) -> Result<()> {
    let file = root.join(path);
    if let Some(parent) = file.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&file, content).with_context(|| format!("Failed to write {}", file.display()))
}

fn copy_file(from_root: &Path, to_root: &Path, path: &str) -> Result<()> {
    let from = from_root.join(path);
    let to = to_root.join(path);
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::copy(&from, &to)
        .with_context(|| format!("Failed to copy {} to {}", from.display(), to.display()))?;
    Ok(())
}

fn remove_file(root: &Path, path: &str) -> Result<()> {
    match std::fs::remove_file(root.join(path)) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(error) => {
            Err(error).with_context(|| format!("Failed to delete '{}'", path))
        }
    }
}
