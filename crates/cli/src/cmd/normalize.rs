//! Normalize frontmatter of existing posts

use crate::util;
use anyhow::{Context, Result};
use chrono::Utc;
use owo_colors::OwoColorize;
use sync::{normalize_post_frontmatter, SyncSession};

pub fn run(paths: &[String]) -> Result<()> {
    if paths.is_empty() {
        anyhow::bail!("No paths given. Usage: quill normalize <paths>...");
    }

    let content_root = util::find_content_root().context("Failed to find content root")?;
    let session = SyncSession::open(&content_root)?;
    let manifest = session.manifest()?;
    let config = session.config();

    let warnings = normalize_post_frontmatter(
        paths,
        &manifest.entries,
        &content_root,
        &config.default_author,
        &config.posts_dir,
        Utc::now(),
    );

    // Warnings name the paths that were skipped; unrecognized-key warnings
    // still let the path through, so count skips rather than warnings.
    let skipped = warnings.iter().filter(|w| w.ends_with("skipped")).count();
    util::print_warnings(&warnings);

    if skipped < paths.len() {
        println!(
            "{}",
            format!("Normalized frontmatter for {} post(s)", paths.len() - skipped).green()
        );
    }
    Ok(())
}
