//! Building blocks of the `deckhand` command line tool
//!
//! The binary wires these into a [`deckhand_engine::DeployEngine`]: a
//! workspace rooted on the local file system, the built-in `local` transfer
//! plugin, the `open` operation executor, and terminal front ends for
//! prompts and transfer output.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod display;
pub mod json_output;
pub mod open;
pub mod plugins;
pub mod prompt;
pub mod workspace;

pub use open::OpenExecutor;
pub use plugins::LocalPlugin;
pub use prompt::TerminalUi;
pub use workspace::{LocalWorkspace, TokioFileSystem};
