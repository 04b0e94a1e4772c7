//! Run one sync against a client directory

use crate::util;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::Path;
use sync::{MergeStatus, SyncSession};

pub fn run(client_dir: &Path, json: bool) -> Result<()> {
    let content_root = util::find_content_root().context("Failed to find content root")?;
    if !client_dir.is_dir() {
        anyhow::bail!("Client directory {} does not exist", client_dir.display());
    }

    let session = SyncSession::open(&content_root)?;
    let report = session.sync(client_dir)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    util::print_plan(&report.plan);

    if !report.outcomes.is_empty() {
        println!();
        println!("{}", "Merge results:".bold());
        for outcome in &report.outcomes {
            match outcome.status {
                MergeStatus::Merged => {
                    println!("  {} {} merged cleanly", "✓".green(), outcome.path);
                }
                MergeStatus::Conflicted => {
                    println!("  {} {} has conflicts", "!".yellow(), outcome.path);
                    if outcome.body_conflicted {
                        println!("      body: conflict markers written");
                    }
                    for key in &outcome.field_conflicts {
                        println!("      frontmatter: '{}' differs on both sides", key);
                    }
                }
                MergeStatus::Failed => {
                    let message = outcome.error.as_deref().unwrap_or("unknown error");
                    println!("  {} {} failed: {}", "✗".red(), outcome.path, message);
                }
            }
        }
    }

    if !report.warnings.is_empty() {
        println!();
        util::print_warnings(&report.warnings);
    }

    println!();
    println!("Sync token: {}", report.token.to_string().yellow());

    let conflicted = report
        .outcomes
        .iter()
        .filter(|o| o.status != MergeStatus::Merged)
        .count();
    if conflicted > 0 {
        println!(
            "{}",
            format!("{} path(s) need review before the next edit", conflicted).yellow()
        );
    } else {
        println!("{}", "Sync complete".green());
    }

    Ok(())
}
