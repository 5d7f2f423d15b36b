//! deckhand testing suite
//!
//! This crate provides the integration tests of the deckhand project and
//! the in-memory collaborators they run against.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Shared fakes for workspaces, plugins, executors and prompts
pub mod test_utils;
