//! Initialize a Quill content root

use anyhow::Result;
use quill_core::STATE_DIR;
use std::env;
use sync::EngineConfig;

pub fn run() -> Result<()> {
    let current_dir = env::current_dir()?;

    let state_dir = current_dir.join(STATE_DIR);
    if state_dir.is_dir() {
        println!("Error: Quill content root already initialized");
        println!("Location: {}", state_dir.display());
        std::process::exit(1);
    }

    println!("Initializing Quill content root at {}", current_dir.display());

    let config_path = EngineConfig::write_default(&current_dir)?;
    let config = EngineConfig::load(&current_dir)?;
    std::fs::create_dir_all(current_dir.join(&config.posts_dir))?;

    println!("Successfully initialized Quill content root");
    println!();
    println!("Created:");
    println!("  - {}/             (engine state, never synced)", STATE_DIR);
    println!("  - {}  (engine configuration)", config_path.display());
    println!("  - {}/             (markdown posts)", config.posts_dir);
    println!();
    println!("Next steps:");
    println!("  - Run 'quill status' to check the content root");
    println!("  - Run 'quill sync <client_dir>' to synchronize a client directory");
    Ok(())
}
