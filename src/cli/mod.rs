//! Command-line interface for WIKAI.
//!
//! Thin consumer of the library: every command opens the Commons through
//! [`Context`] and calls the public store or observer API.

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use wikai::config::Config;
use wikai::storage::PatternStore;

/// Individual CLI command implementations.
pub mod commands;

mod format;

pub use format::{print_pattern_row, stability_label, OutputFormat};

/// Options shared by every command.
pub struct Context {
    /// Overrides the configured patterns directory
    pub patterns_dir: Option<PathBuf>,
}

impl Context {
    /// Loads configuration, applying the command-line directory override.
    pub fn config(&self) -> Result<Config> {
        let mut config = Config::load()?;
        if let Some(dir) = &self.patterns_dir {
            config.patterns_dir = Some(dir.clone());
        }
        Ok(config)
    }

    /// Opens the Commons selected by the configuration.
    pub fn open_store(&self) -> Result<PatternStore> {
        let dir = self.config()?.patterns_dir()?;
        PatternStore::open(&dir)
            .with_context(|| format!("Failed to open patterns directory {}", dir.display()))
    }
}
