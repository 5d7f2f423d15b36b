//! Target orchestration engine for deckhand
//!
//! This crate runs the operation chains attached to deployment targets and
//! dispatches file transfers to the plugins able to handle a target.
//!
//! # Features
//!
//! - **Operation chains**: before-deploy and after-deployed hooks with abort support
//! - **Plugin resolution**: type and capability based, with wildcard plugins
//! - **Transfer dispatch**: per-file progress and outcome reporting
//! - **Target selection**: interactive choice with single-target shortcut
//!
//! # Examples
//!
//! ```rust,no_run
//! use deckhand_engine::DeployEngine;
//! use deckhand_types::{FileSystem, UserInterface, Workspace};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! # async fn example(
//! #     workspace: Arc<dyn Workspace>,
//! #     file_system: Arc<dyn FileSystem>,
//! #     ui: Arc<dyn UserInterface>,
//! # ) -> deckhand_types::Result<()> {
//! let engine = DeployEngine::builder(workspace)
//!     .with_file_system(file_system)
//!     .with_user_interface(ui)
//!     .build()?;
//!
//! let deployed = engine
//!     .deploy_files(&[PathBuf::from("index.html")], None)
//!     .await?;
//! println!("Deployed: {}", deployed);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod dispatcher;
pub mod engine;
pub mod operations;
pub mod registry;
pub mod selection;
pub mod targets;

#[cfg(test)]
mod test_support;

pub use dispatcher::TransferDispatcher;
pub use engine::{DeployEngine, EngineBuilder};
pub use operations::{OperationChain, OperationExecutors, WaitExecutor, WAIT_OPERATION_TYPE};
pub use registry::PluginRegistry;
pub use selection::select_and_run;
pub use targets::{find_targets_by_name, target_choice, target_name, unknown_target_names};
