//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use quill_core::STATE_DIR;
use std::path::PathBuf;
use sync::{ChangeType, SyncPlan};

/// Find the content root by walking up from cwd to find .quill/
pub fn find_content_root() -> Result<PathBuf> {
    let mut current = std::env::current_dir().context("Failed to get current directory")?;

    loop {
        let state_dir = current.join(STATE_DIR);
        if state_dir.exists() && state_dir.is_dir() {
            tracing::debug!(root = %current.display(), "found content root");
            return Ok(current);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => anyhow::bail!("Not a Quill content root (no {} directory found)", STATE_DIR),
        }
    }
}

/// Display a sync plan, one bucket at a time
pub fn print_plan(plan: &SyncPlan) {
    if plan.is_noop() {
        println!("{}", "Everything in sync, nothing to do".green());
        if !plan.no_change.is_empty() {
            println!("  {}", format!("{} unchanged", plan.no_change.len()).dimmed());
        }
        return;
    }

    print_bucket("Upload to server:", &plan.to_upload);
    print_bucket("Download to client:", &plan.to_download);
    print_bucket("Delete on server:", &plan.to_delete_remote);
    print_bucket("Delete on client:", &plan.to_delete_local);

    if !plan.conflicts.is_empty() {
        println!("Merge:");
        for conflict in &plan.conflicts {
            let kind = match conflict.change_type {
                ChangeType::Conflict => "edit/edit",
                ChangeType::DeleteModifyConflict => "delete/modify",
            };
            println!("  {} {} {}", "!".yellow(), conflict.path, format!("({})", kind).dimmed());
        }
    }

    if !plan.no_change.is_empty() {
        println!("{}", format!("{} unchanged", plan.no_change.len()).dimmed());
    }
}

fn print_bucket(heading: &str, paths: &[String]) {
    if paths.is_empty() {
        return;
    }
    println!("{}", heading);
    for path in paths {
        println!("  {} {}", "-".cyan(), path);
    }
}

/// Display warning strings, if any
pub fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        println!("{} {}", "warning:".yellow().bold(), warning);
    }
}
