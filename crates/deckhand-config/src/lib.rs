//! Configuration management system for deckhand
//!
//! This crate loads the deckhand settings (workspace, targets, logging,
//! prompts and operation defaults) from YAML, TOML or JSON files with
//! environment variable overrides, validates them, and turns the configured
//! targets into the immutable, indexed list the engine works on.
//!
//! # Examples
//!
//! ```rust,no_run
//! use deckhand_config::ConfigBuilder;
//! use deckhand_types::WorkspaceId;
//!
//! let config = ConfigBuilder::new()
//!     .add_source_file("deckhand.yaml")
//!     .add_env_prefix("DECKHAND")
//!     .build()
//!     .expect("Failed to load configuration");
//!
//! for target in config.materialize_targets(&WorkspaceId::new("/srv/project")) {
//!     println!("{} -> {}", target.index, target.type_or_default());
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use deckhand_types::{Target, WorkspaceId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

pub mod builder;
pub mod error;
pub mod loader;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

/// Main configuration structure for deckhand
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Workspace settings
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    /// Configured targets, in declaration order
    #[serde(default)]
    pub targets: Vec<Target>,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Interactive prompt configuration
    #[serde(default)]
    pub ui: UiConfig,
    /// Built-in operation settings
    #[serde(default)]
    pub operations: OperationsConfig,
}

impl Config {
    /// Build the immutable target list for a workspace.
    ///
    /// Each target gets its declaration position as `index` and a handle to
    /// the workspace it belongs to.
    pub fn materialize_targets(&self, workspace: &WorkspaceId) -> Vec<Arc<Target>> {
        self.targets
            .iter()
            .enumerate()
            .map(|(index, target)| {
                Arc::new(
                    target
                        .clone()
                        .with_index(index)
                        .with_workspace(workspace.clone()),
                )
            })
            .collect()
    }
}

/// Workspace settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Display name of the workspace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Root directory (defaults to the current directory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatting
    #[serde(default)]
    pub json_format: bool,
    /// Enable colored output
    #[serde(default = "default_true")]
    pub colored_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            colored_output: true,
        }
    }
}

/// Interactive prompt configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Use a fuzzy-searchable chooser instead of a plain list
    #[serde(default = "default_true")]
    pub fuzzy_select: bool,
    /// Show the workspace path as detail line of target choices
    #[serde(default = "default_true")]
    pub show_workspace_path: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            fuzzy_select: true,
            show_workspace_path: true,
        }
    }
}

/// Built-in operation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationsConfig {
    /// Command used by `open` operations instead of the platform opener
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_command: Option<String>,
    /// Upper bound for `wait` operations in milliseconds
    #[serde(default = "default_wait_max_ms")]
    pub wait_max_ms: u64,
}

impl Default for OperationsConfig {
    fn default() -> Self {
        Self {
            open_command: None,
            wait_max_ms: default_wait_max_ms(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_true() -> bool {
    true
}

fn default_wait_max_ms() -> u64 {
    60_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_materialize_targets_assigns_index_and_workspace() {
        let config = Config {
            targets: vec![Target::new("Prod", "local"), Target::default()],
            ..Config::default()
        };
        let workspace = WorkspaceId::new("/srv/project");

        let targets = config.materialize_targets(&workspace);
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].index, 0);
        assert_eq!(targets[1].index, 1);
        assert!(targets.iter().all(|t| t.workspace == workspace));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.targets.is_empty());
        assert_eq!(config.logging.level, "warn");
        assert!(config.ui.fuzzy_select);
        assert_eq!(config.operations.wait_max_ms, 60_000);
    }
}
