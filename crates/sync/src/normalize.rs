//! Post-upload frontmatter normalization
//!
//! After uploads land on the server, each post gets its required metadata
//! backfilled: timestamps and a default author for new posts, a refreshed
//! `modified_at` for edited ones. Everything that goes wrong for a single
//! path (escaping the root, not a post, malformed frontmatter, I/O) becomes
//! a warning string and the rest of the batch proceeds. Files are rewritten
//! only when a field actually changed.

use chrono::{DateTime, SecondsFormat, Utc};
use merge::{serialize_document, split_document, FrontmatterMap, Value, RECOGNIZED_KEYS};
use quill_core::Snapshot;
use std::path::{Component, Path};

/// Normalize frontmatter of freshly uploaded posts
///
/// `uploaded_paths` are manifest-relative paths already written under
/// `content_root`. `old_manifest` decides whether a path is a brand-new
/// post or an edit. Returns display warnings; never fails as a whole.
pub fn normalize_post_frontmatter(
    uploaded_paths: &[String],
    old_manifest: &Snapshot,
    content_root: &Path,
    default_author: &str,
    posts_dir: &str,
    now: DateTime<Utc>,
) -> Vec<String> {
    let mut warnings = Vec::new();
    let now_text = now.to_rfc3339_opts(SecondsFormat::Secs, true);

    for path in uploaded_paths {
        if escapes_root(path) {
            warnings.push(format!("path '{}' escapes the content root; skipped", path));
            continue;
        }
        if !is_post_path(path, posts_dir) {
            warnings.push(format!("path '{}' is not a markdown post; skipped", path));
            continue;
        }

        let file_path = content_root.join(path);
        let text = match std::fs::read_to_string(&file_path) {
            Ok(text) => text,
            Err(error) => {
                warnings.push(format!("failed to read '{}': {}; skipped", path, error));
                continue;
            }
        };

        let mut doc = match split_document(&text) {
            Ok(doc) => doc,
            Err(error) => {
                warnings.push(format!(
                    "frontmatter in '{}' did not parse: {}; skipped",
                    path, error
                ));
                continue;
            }
        };

        for key in doc.frontmatter.keys() {
            if !RECOGNIZED_KEYS.contains(&key) {
                warnings.push(format!("unrecognized frontmatter key '{}' in '{}'", key, path));
            }
        }

        let changed = if old_manifest.contains(path) {
            normalize_edited(&mut doc.frontmatter, &now_text)
        } else {
            normalize_new(&mut doc.frontmatter, &now_text, default_author)
        };

        if changed {
            if let Err(error) = std::fs::write(&file_path, serialize_document(&doc)) {
                warnings.push(format!("failed to write '{}': {}", path, error));
            } else {
                tracing::debug!(path, "normalized frontmatter");
            }
        }
    }

    warnings
}

/// Brand-new post: backfill timestamps (equal) and the default author
fn normalize_new(frontmatter: &mut FrontmatterMap, now_text: &str, default_author: &str) -> bool {
    let mut changed = backfill(frontmatter, "created_at", now_text);
    changed |= backfill(frontmatter, "modified_at", now_text);
    changed |= backfill(frontmatter, "author", default_author);
    changed
}

/// Edited post: always refresh `modified_at`, backfill `created_at`,
/// never touch `author`
fn normalize_edited(frontmatter: &mut FrontmatterMap, now_text: &str) -> bool {
    let mut changed = backfill(frontmatter, "created_at", now_text);
    if frontmatter.get("modified_at") != Some(&Value::scalar(now_text)) {
        frontmatter.set("modified_at", Value::scalar(now_text));
        changed = true;
    }
    changed
}

fn backfill(frontmatter: &mut FrontmatterMap, key: &str, value: &str) -> bool {
    if frontmatter.contains(key) {
        return false;
    }
    frontmatter.set(key, Value::scalar(value));
    true
}

/// A path escapes the root if it is absolute or climbs out of it
fn escapes_root(path: &str) -> bool {
    Path::new(path).components().any(|component| {
        matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

/// Posts live under the posts directory with a markdown extension
pub(crate) fn is_post_path(path: &str, posts_dir: &str) -> bool {
    let Some(rest) = path.strip_prefix(posts_dir) else {
        return false;
    };
    rest.starts_with('/') && path.ends_with(".md")
}
