//! Validate the label taxonomy

use crate::util;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use sync::EngineConfig;
use taxonomy::Taxonomy;

pub fn run() -> Result<()> {
    let content_root = util::find_content_root().context("Failed to find content root")?;
    let config = EngineConfig::load(&content_root)?;
    let labels_path = config.labels_path(&content_root);

    let (taxonomy, warnings) = Taxonomy::load(&labels_path)?;

    if taxonomy.labels.is_empty() {
        println!("No labels declared ({})", labels_path.display().to_string().dimmed());
        return Ok(());
    }

    println!("{}", "Label Taxonomy".bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();

    for label in &taxonomy.labels {
        let parents: Vec<&str> = taxonomy
            .edges
            .iter()
            .filter(|edge| edge.child == *label)
            .map(|edge| edge.parent.as_str())
            .collect();
        if parents.is_empty() {
            println!("  {}", label.cyan());
        } else {
            println!("  {} {}", label.cyan(), format!("-> {}", parents.join(", ")).dimmed());
        }
    }
    println!();
    println!(
        "{} label(s), {} parent edge(s)",
        taxonomy.labels.len(),
        taxonomy.edges.len()
    );

    if !warnings.is_empty() {
        println!();
        util::print_warnings(&warnings);
    } else {
        println!("{}", "Taxonomy is a valid DAG".green());
    }

    Ok(())
}
