//! Show manifest and configuration status

use crate::util;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use sync::SyncSession;
use taxonomy::Taxonomy;

pub fn run() -> Result<()> {
    let content_root = util::find_content_root().context("Failed to find content root")?;
    let session = SyncSession::open(&content_root)?;
    let manifest = session.manifest()?;
    let config = session.config();

    println!("{}", "Content Root Status".bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();

    println!("Content root:  {}", content_root.display().to_string().cyan());
    println!();

    println!("Manifest:");
    println!("  Tracked files: {}", manifest.entries.len());
    match manifest.token {
        Some(token) => println!("  Sync token:    {}", token.to_string().yellow()),
        None => println!("  Sync token:    {}", "none (never synced)".dimmed()),
    }
    println!();

    println!("Configuration:");
    println!("  Posts dir:      {}/", config.posts_dir);
    println!("  Default author: {}", config.default_author);
    println!("  Labels file:    {}", config.labels_file);
    println!(
        "  Merge tool:     {} ({}s timeout)",
        config.merge_tool, config.merge_timeout_secs
    );
    println!();

    let (taxonomy, warnings) = Taxonomy::load(&config.labels_path(&content_root))?;
    println!("Taxonomy:");
    println!("  Labels: {}", taxonomy.labels.len());
    println!("  Edges:  {}", taxonomy.edges.len());
    if !warnings.is_empty() {
        println!("  {}", format!("{} warning(s), see 'quill labels'", warnings.len()).yellow());
    }

    Ok(())
}
