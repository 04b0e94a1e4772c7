//! Three-way merge a single post file
//!
//! Prints the merged document to stdout, the conflict summary to stderr,
//! and exits non-zero when conflict evidence remains. Follows the exit
//! convention of `git merge-file` so the command composes in scripts.

use anyhow::{Context, Result};
use merge::merge_post_file;
use owo_colors::OwoColorize;
use std::path::Path;

pub fn run(base: Option<&Path>, server: &Path, client: &Path, json: bool) -> Result<()> {
    let base_doc = match base {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read base {}", path.display()))?,
        ),
        None => None,
    };
    let server_doc = std::fs::read_to_string(server)
        .with_context(|| format!("Failed to read server version {}", server.display()))?;
    let client_doc = std::fs::read_to_string(client)
        .with_context(|| format!("Failed to read client version {}", client.display()))?;

    let result = merge_post_file(base_doc.as_deref(), &server_doc, &client_doc)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", result.merged_content);

        if result.body_conflicted {
            eprintln!("{} body has conflict markers", "!".yellow());
        }
        for key in &result.field_conflicts {
            eprintln!("{} frontmatter '{}' differs on both sides", "!".yellow(), key);
        }
    }

    if result.is_conflicted() {
        std::process::exit(1);
    }
    Ok(())
}
