//! Engine configuration
//!
//! Configuration lives in `.quill/config.toml` under the server content
//! root, next to the manifest and base store, so it is never swept into a
//! content snapshot. A missing file means defaults; a malformed file is an
//! error.

use anyhow::{Context, Result};
use merge::BodyMergeOptions;
use quill_core::STATE_DIR;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file name inside the state directory
const CONFIG_FILE: &str = "config.toml";

/// Default contents written by `quill init`
pub const DEFAULT_CONFIG_TOML: &str = "\
# Quill engine configuration

# Directory (relative to the content root) that holds markdown posts
posts_dir = \"posts\"

# Author backfilled into posts uploaded without one
default_author = \"unknown\"

# Label taxonomy file, relative to the content root
labels_file = \"labels.toml\"

# External three-way merge tool and its per-invocation timeout
merge_tool = \"git\"
merge_timeout_secs = 10
";

/// Engine settings loaded from `.quill/config.toml`
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Directory under the content root holding markdown posts
    pub posts_dir: String,
    /// Author backfilled by the normalizer when a post has none
    pub default_author: String,
    /// Taxonomy file, relative to the content root
    pub labels_file: String,
    /// External merge tool executable
    pub merge_tool: String,
    /// Timeout for one merge tool invocation
    pub merge_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            posts_dir: "posts".to_string(),
            default_author: "unknown".to_string(),
            labels_file: "labels.toml".to_string(),
            merge_tool: "git".to_string(),
            merge_timeout_secs: 10,
        }
    }
}

impl EngineConfig {
    /// Path of the config file under a content root
    pub fn path(content_root: &Path) -> PathBuf {
        content_root.join(STATE_DIR).join(CONFIG_FILE)
    }

    /// Load configuration for a content root; a missing file is defaults
    pub fn load(content_root: &Path) -> Result<Self> {
        let path = Self::path(content_root);
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// Write the commented default config file (used by `quill init`)
    pub fn write_default(content_root: &Path) -> Result<PathBuf> {
        let path = Self::path(content_root);
        let parent = path.parent().context("Config path has no parent directory")?;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create state dir {}", parent.display()))?;
        std::fs::write(&path, DEFAULT_CONFIG_TOML)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        Ok(path)
    }

    /// Body merge options derived from this config
    pub fn body_merge_options(&self) -> BodyMergeOptions {
        BodyMergeOptions {
            tool: self.merge_tool.clone(),
            timeout: Duration::from_secs(self.merge_timeout_secs),
        }
    }

    /// Absolute path of the taxonomy file
    pub fn labels_path(&self, content_root: &Path) -> PathBuf {
        content_root.join(&self.labels_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_is_defaults() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig::load(dir.path()).unwrap();
        assert_eq!(config.posts_dir, "posts");
        assert_eq!(config.default_author, "unknown");
        assert_eq!(config.merge_tool, "git");
        assert_eq!(config.merge_timeout_secs, 10);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let state = dir.path().join(STATE_DIR);
        std::fs::create_dir_all(&state).unwrap();
        std::fs::write(state.join(CONFIG_FILE), "default_author = \"ana\"\n").unwrap();

        let config = EngineConfig::load(dir.path()).unwrap();
        assert_eq!(config.default_author, "ana");
        assert_eq!(config.posts_dir, "posts");
    }

    #[test]
    fn test_unknown_key_is_an_error() {
        let dir = TempDir::new().unwrap();
        let state = dir.path().join(STATE_DIR);
        std::fs::create_dir_all(&state).unwrap();
        std::fs::write(state.join(CONFIG_FILE), "defualt_author = \"typo\"\n").unwrap();

        assert!(EngineConfig::load(dir.path()).is_err());
    }

    #[test]
    fn test_default_file_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = EngineConfig::write_default(dir.path()).unwrap();
        assert!(path.exists());

        let config = EngineConfig::load(dir.path()).unwrap();
        assert_eq!(config.posts_dir, "posts");
        assert_eq!(config.merge_tool, "git");
    }

    #[test]
    fn test_merge_options_derived_from_config() {
        let config = EngineConfig {
            merge_tool: "diff3".to_string(),
            merge_timeout_secs: 3,
            ..EngineConfig::default()
        };
        let options = config.body_merge_options();
        assert_eq!(options.tool, "diff3");
        assert_eq!(options.timeout, Duration::from_secs(3));
    }
}
