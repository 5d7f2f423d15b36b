//! Collaborator traits
//!
//! The engine only orchestrates. Transfers, resource opening, prompting,
//! persistence and naming all happen behind these seams, so each can be
//! swapped (or faked in tests) independently.

use crate::{
    messages, Condition, Error, NameAndPath, OperationContext, OperationResult, Result, Target,
    TransferContext, TransferDirection, WorkspaceId,
};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Capability provider that performs the actual file transfers
#[async_trait]
pub trait TransferPlugin: Send + Sync {
    /// Type tag the plugin handles (`""` matches every target)
    fn plugin_type(&self) -> &str;

    /// Whether the plugin can pull files from a target
    fn can_download(&self) -> bool {
        false
    }

    /// Whether the plugin can push files to a target
    fn can_upload(&self) -> bool {
        false
    }

    /// Whether the plugin provides the capability a direction needs
    fn supports(&self, direction: TransferDirection) -> bool {
        match direction {
            TransferDirection::Download => self.can_download(),
            TransferDirection::Upload => self.can_upload(),
        }
    }

    /// Pull a batch of files.
    ///
    /// Implementations must process the descriptors one after another and
    /// complete each of them exactly once.
    async fn download_files(&self, context: TransferContext) -> Result<()> {
        drop(context);
        Err(Error::unsupported(self.plugin_type(), "download"))
    }

    /// Push a batch of files (same contract as [`download_files`](Self::download_files))
    async fn upload_files(&self, context: TransferContext) -> Result<()> {
        drop(context);
        Err(Error::unsupported(self.plugin_type(), "upload"))
    }

    /// Run the batch in the given direction
    async fn transfer_files(&self, context: TransferContext) -> Result<()> {
        match context.direction {
            TransferDirection::Download => self.download_files(context).await,
            TransferDirection::Upload => self.upload_files(context).await,
        }
    }
}

/// Executor for one kind of target operation
#[async_trait]
pub trait OperationExecutor: Send + Sync {
    /// Run the operation described by the context
    async fn execute(&self, context: Arc<OperationContext>) -> Result<OperationResult>;
}

/// Line-oriented output channel for user-facing transfer messages
pub trait OutputSink: Send + Sync {
    /// Append text without a line break
    fn append(&self, text: &str);

    /// Append text followed by a line break
    fn append_line(&self, text: &str);
}

/// Workspace the engine runs in
pub trait Workspace: Send + Sync {
    /// Handle targets carry to reference this workspace
    fn id(&self) -> &WorkspaceId;

    /// Root directory
    fn root_path(&self) -> &Path;

    /// Whether the workspace is shutting down
    fn is_finalizing(&self) -> bool;

    /// Targets that currently qualify (conditions applied)
    fn list_targets(&self) -> Vec<Arc<Target>>;

    /// Resolve a file's name and workspace-relative directory
    fn resolve_name_and_path(&self, file: &Path) -> Option<NameAndPath>;

    /// Sink for user-facing transfer output
    fn output(&self) -> &dyn OutputSink;

    /// Whether the workspace may operate on the target
    fn owns_target(&self, target: &Target) -> bool {
        &target.workspace == self.id()
    }

    /// Evaluate an inclusion condition
    fn check_condition(&self, condition: &Condition) -> bool {
        condition.evaluate()
    }

    /// Render a message of the catalog
    fn translate(&self, key: &str, args: &[String]) -> String {
        messages::translate(key, args)
    }
}

/// Filesystem writes used to persist downloaded files
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Write the full content of a file, replacing it
    async fn write_file(&self, path: &Path, data: &[u8]) -> Result<()>;
}

/// Entry of an interactive choice list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceItem {
    /// Main label
    pub label: String,
    /// Secondary text next to the label
    pub description: String,
    /// Extra line under the label
    pub detail: String,
}

/// Interactive prompts
#[async_trait]
pub trait UserInterface: Send + Sync {
    /// Let the user pick one item; `None` when the prompt was dismissed
    async fn show_choice(&self, items: &[ChoiceItem], placeholder: &str) -> Result<Option<usize>>;

    /// Show a warning
    async fn show_warning(&self, message: &str);
}
