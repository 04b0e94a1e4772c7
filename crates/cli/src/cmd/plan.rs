//! Show the sync plan for a client directory

use crate::util;
use anyhow::{Context, Result};
use std::path::Path;
use sync::SyncSession;

pub fn run(client_dir: &Path, json: bool) -> Result<()> {
    let content_root = util::find_content_root().context("Failed to find content root")?;
    if !client_dir.is_dir() {
        anyhow::bail!("Client directory {} does not exist", client_dir.display());
    }

    let session = SyncSession::open(&content_root)?;
    let plan = session.plan(client_dir)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    util::print_plan(&plan);
    Ok(())
}
