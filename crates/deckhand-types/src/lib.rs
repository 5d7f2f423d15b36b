//! Core type system and error handling for deckhand
//!
//! This crate provides the foundational types shared by every deckhand crate:
//!
//! - **Target model**: targets, operation values and inclusion conditions
//! - **Transfers**: per-file descriptors with before/completion callbacks
//! - **Operation contexts**: the linked history of an operation chain
//! - **Traits**: the collaborator seams (plugins, executors, workspace, UI)
//! - **Error handling**: the error taxonomy shared by the engine and its collaborators
//!
//! # Features
//!
//! - `std` (default): Enable standard library features
//! - `serde`: Enable (de)serialization of the target model
//!
//! # Examples
//!
//! ```rust
//! use deckhand_types::{OperationValue, Target, TargetOperation};
//!
//! let target = Target::new("Prod", "sftp").with_deployed(["https://example.com"]);
//! let operation = OperationValue::from("https://example.com").normalize();
//!
//! assert_eq!(target.normalized_name(), "prod");
//! assert_eq!(
//!     operation,
//!     Some(TargetOperation::new("open").with_target("https://example.com"))
//! );
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod messages;
pub mod operation;
pub mod result;
pub mod target;
pub mod traits;
pub mod transfer;

// Re-export commonly used types
pub use error::Error;
pub use operation::{OperationContext, OperationResult};
pub use result::Result;
pub use target::{
    filter_conditional_items, normalize_string, Condition, Conditional, DeployEvent,
    OperationValue, OperationValues, OptionValue, Target, TargetOperation, WorkspaceId,
    DEFAULT_TARGET_TYPE, OPEN_OPERATION_TYPE,
};
pub use traits::*;
pub use transfer::{
    BeforeTransferFn, CompletionFn, FileOutcome, FileTransferDescriptor, NameAndPath,
    TransferContext, TransferDirection,
};
