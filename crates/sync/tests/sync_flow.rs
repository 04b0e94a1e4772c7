//! Multi-sync lifecycle tests
//!
//! Drives a server content root and a client directory through several
//! syncs in a row: initial upload, independent edits, a conflict written
//! out as markers, manual resolution, and deletes. Requires `git` on PATH,
//! like the default engine configuration.

use std::path::Path;
use sync::{MergeStatus, SyncSession};
use tempfile::TempDir;

fn write(root: &Path, path: &str, text: &str) {
    let file = root.join(path);
    std::fs::create_dir_all(file.parent().unwrap()).unwrap();
    std::fs::write(file, text).unwrap();
}

fn read(root: &Path, path: &str) -> String {
    std::fs::read_to_string(root.join(path)).unwrap()
}

#[test]
fn test_initial_upload_normalizes_posts_only() {
    let server = TempDir::new().unwrap();
    let client = TempDir::new().unwrap();
    write(client.path(), "posts/hello.md", "---\ntitle: Hello\n---\nbody\n");
    write(client.path(), "labels.toml", "[[labels]]\nid = \"rust\"\n");

    let session = SyncSession::open(server.path()).unwrap();
    let report = session.sync(client.path()).unwrap();

    assert!(report.warnings.is_empty());
    assert_eq!(
        report.plan.to_upload,
        vec!["labels.toml", "posts/hello.md"]
    );

    // The post was normalized on both sides, the asset copied verbatim
    let post = read(server.path(), "posts/hello.md");
    assert!(post.contains("author: unknown"));
    assert!(post.contains("created_at:"));
    assert_eq!(post, read(client.path(), "posts/hello.md"));
    assert_eq!(
        read(server.path(), "labels.toml"),
        "[[labels]]\nid = \"rust\"\n"
    );

    let manifest = session.manifest().unwrap();
    assert_eq!(manifest.token, Some(report.token));
    assert_eq!(manifest.entries.len(), 2);
}

#[test]
fn test_each_sync_rotates_the_base_generation() {
    let server = TempDir::new().unwrap();
    let client = TempDir::new().unwrap();
    write(client.path(), "posts/a.md", "---\ntitle: A\n---\nbody\n");

    let session = SyncSession::open(server.path()).unwrap();
    let first = session.sync(client.path()).unwrap();

    let text = read(client.path(), "posts/a.md").replace("body", "edited");
    write(client.path(), "posts/a.md", &text);
    let second = session.sync(client.path()).unwrap();

    assert_ne!(first.token, second.token);
    assert_eq!(session.manifest().unwrap().token, Some(second.token));
}

#[test]
fn test_changes_flow_both_ways_in_one_sync() {
    let server = TempDir::new().unwrap();
    let client = TempDir::new().unwrap();
    write(client.path(), "posts/a.md", "---\ntitle: A\n---\nbody a\n");

    let session = SyncSession::open(server.path()).unwrap();
    session.sync(client.path()).unwrap();

    // Client authors a new post while the server edits the existing one
    write(client.path(), "posts/b.md", "---\ntitle: B\n---\nbody b\n");
    let edited = read(server.path(), "posts/a.md").replace("body a", "edited a");
    write(server.path(), "posts/a.md", &edited);

    let report = session.sync(client.path()).unwrap();
    assert_eq!(report.plan.to_upload, vec!["posts/b.md"]);
    assert_eq!(report.plan.to_download, vec!["posts/a.md"]);

    assert!(read(client.path(), "posts/a.md").contains("edited a"));
    assert!(read(server.path(), "posts/b.md").contains("body b"));

    // Everything agreed on, the next sync has nothing to do
    assert!(session.sync(client.path()).unwrap().plan.is_noop());
}

#[test]
fn test_conflict_markers_then_manual_resolution() {
    let server = TempDir::new().unwrap();
    let client = TempDir::new().unwrap();
    write(
        client.path(),
        "posts/a.md",
        "---\ntitle: Draft\n---\nline1\nline2\nline3\n",
    );

    let session = SyncSession::open(server.path()).unwrap();
    session.sync(client.path()).unwrap();

    // Same line edited to different text on each side, plus a title fight
    let server_text = read(server.path(), "posts/a.md")
        .replace("title: Draft", "title: Server Draft")
        .replace("line2", "server line2");
    write(server.path(), "posts/a.md", &server_text);
    let client_text = read(client.path(), "posts/a.md")
        .replace("title: Draft", "title: Client Draft")
        .replace("line2", "client line2");
    write(client.path(), "posts/a.md", &client_text);

    let report = session.sync(client.path()).unwrap();
    assert_eq!(report.outcomes.len(), 1);
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.status, MergeStatus::Conflicted);
    assert_eq!(outcome.field_conflicts, vec!["title"]);
    assert!(outcome.body_conflicted);

    // Both sides hold the same marker text and agree with the manifest
    let conflicted = read(server.path(), "posts/a.md");
    assert!(conflicted.contains("<<<<<<<"));
    assert!(conflicted.contains("server line2"));
    assert!(conflicted.contains("client line2"));
    assert_eq!(conflicted, read(client.path(), "posts/a.md"));
    assert!(session.sync(client.path()).unwrap().plan.is_noop());

    // The user resolves on the client; the resolution uploads
    write(
        client.path(),
        "posts/a.md",
        "---\ntitle: Server Draft\nauthor: unknown\n---\nline1\nresolved line2\nline3\n",
    );
    let resolved = session.sync(client.path()).unwrap();
    assert_eq!(resolved.plan.to_upload, vec!["posts/a.md"]);

    let final_text = read(server.path(), "posts/a.md");
    assert!(final_text.contains("resolved line2"));
    assert!(!final_text.contains("<<<<<<<"));
    assert_eq!(final_text, read(client.path(), "posts/a.md"));
}

#[test]
fn test_deletes_propagate_in_both_directions() {
    let server = TempDir::new().unwrap();
    let client = TempDir::new().unwrap();
    write(client.path(), "posts/a.md", "---\ntitle: A\n---\nbody\n");
    write(client.path(), "posts/b.md", "---\ntitle: B\n---\nbody\n");

    let session = SyncSession::open(server.path()).unwrap();
    session.sync(client.path()).unwrap();

    // Client retires one post, the server the other
    std::fs::remove_file(client.path().join("posts/a.md")).unwrap();
    std::fs::remove_file(server.path().join("posts/b.md")).unwrap();

    let report = session.sync(client.path()).unwrap();
    assert_eq!(report.plan.to_delete_remote, vec!["posts/a.md"]);
    assert_eq!(report.plan.to_delete_local, vec!["posts/b.md"]);

    assert!(!server.path().join("posts/a.md").exists());
    assert!(!client.path().join("posts/b.md").exists());

    let manifest = session.manifest().unwrap();
    assert!(!manifest.entries.contains("posts/a.md"));
    assert!(!manifest.entries.contains("posts/b.md"));
}
