//! Quill CLI - quill command

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;
mod util;

/// Quill - Sync engine for markdown blog content
#[derive(Parser)]
#[command(name = "quill")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a Quill content root in the current directory
    Init,
    /// Show manifest and configuration status
    Status,
    /// Show what a sync against a client directory would do
    Plan {
        /// Client content directory
        client_dir: PathBuf,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Synchronize a client directory against the content root
    Sync {
        /// Client content directory
        client_dir: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Three-way merge a single post file
    Merge {
        /// Server version of the post
        server: PathBuf,
        /// Client version of the post
        client: PathBuf,

        /// Common ancestor version (omit to merge without a base)
        #[arg(short, long)]
        base: Option<PathBuf>,

        /// Print the full merge result as JSON instead of the merged text
        #[arg(long)]
        json: bool,
    },
    /// Validate the label taxonomy
    Labels,
    /// Normalize frontmatter of the given posts
    Normalize {
        /// Content-root-relative post paths
        paths: Vec<String>,
    },
}

fn main() -> Result<()> {
    // Log to stderr so stdout stays clean for command output
    let filter = EnvFilter::try_from_env("QUILL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => cmd::init::run(),
        Commands::Status => cmd::status::run(),
        Commands::Plan { client_dir, json } => cmd::plan::run(&client_dir, json),
        Commands::Sync { client_dir, json } => cmd::sync::run(&client_dir, json),
        Commands::Merge {
            server,
            client,
            base,
            json,
        } => cmd::merge::run(base.as_deref(), &server, &client, json),
        Commands::Labels => cmd::labels::run(),
        Commands::Normalize { paths } => cmd::normalize::run(&paths),
    }
}
