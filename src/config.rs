//! Startup configuration: the program search path.
//!
//! The configuration file holds a single line of whitespace-separated
//! directories, searched in order when a command is not found as typed.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "shell-config";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellConfig {
    /// Directories to search for programs, in priority order. May be empty.
    pub search_paths: Vec<PathBuf>,
}

impl ShellConfig {
    /// Parse configuration text. Only the first line is significant.
    pub fn parse(contents: &str) -> Self {
        let search_paths = contents
            .lines()
            .next()
            .unwrap_or_default()
            .split_whitespace()
            .map(PathBuf::from)
            .collect();
        Self { search_paths }
    }
}

/// Helper to resolve a default config path.
pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

/// Load the configuration at `path`.
///
/// A missing file is not an error and yields an empty search path.
pub fn load_config(path: impl AsRef<Path>) -> Result<ShellConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::info!(path = %path.display(), "no config file, search path is empty");
        return Ok(ShellConfig::default());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("can't read config file {}", path.display()))?;
    let config = ShellConfig::parse(&contents);
    tracing::info!(path = %path.display(), dirs = ?config.search_paths, "loaded search path");
    Ok(config)
}
