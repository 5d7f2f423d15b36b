//! File transfer descriptors and contexts handed to plugins

use crate::{Error, Target};
use futures::future::BoxFuture;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Direction of a transfer, which doubles as the plugin capability it needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferDirection {
    /// Pull files from the target into the workspace
    Download,
    /// Push workspace files to the target
    Upload,
}

impl TransferDirection {
    /// Capability name used in log lines and errors
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Download => "download",
            Self::Upload => "upload",
        }
    }
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name and workspace-relative directory of a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameAndPath {
    /// File name
    pub name: String,
    /// Directory relative to the workspace root, `/`-separated, no leading slash
    pub path: String,
}

impl NameAndPath {
    /// Create a new name/path pair
    pub fn new<N: Into<String>, P: Into<String>>(name: N, path: P) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Full relative path (`path/name`)
    pub fn relative_path(&self) -> String {
        let dir = self.path.trim_matches('/');
        if dir.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", dir, self.name)
        }
    }
}

/// Result of a single file transfer: an error, or the downloaded content
pub type FileOutcome = std::result::Result<Option<Vec<u8>>, Error>;

/// Callback invoked right before a file's transfer starts
pub type BeforeTransferFn = Arc<dyn Fn(&Path) + Send + Sync>;

/// Callback invoked once a file's transfer has finished.
///
/// `Sync` so that plugins may hold a `&FileTransferDescriptor` across awaits.
pub type CompletionFn = Box<dyn FnOnce(FileOutcome) -> BoxFuture<'static, ()> + Send + Sync>;

/// One file of a transfer batch
pub struct FileTransferDescriptor {
    path: PathBuf,
    name_and_path: NameAndPath,
    on_before: Option<BeforeTransferFn>,
    on_complete: Option<CompletionFn>,
}

impl FileTransferDescriptor {
    /// Create a descriptor without callbacks
    pub fn new<P: Into<PathBuf>>(path: P, name_and_path: NameAndPath) -> Self {
        Self {
            path: path.into(),
            name_and_path,
            on_before: None,
            on_complete: None,
        }
    }

    /// Attach the before-transfer callback
    pub fn on_before(mut self, callback: BeforeTransferFn) -> Self {
        self.on_before = Some(callback);
        self
    }

    /// Attach the completion callback
    pub fn on_complete(mut self, callback: CompletionFn) -> Self {
        self.on_complete = Some(callback);
        self
    }

    /// Local path of the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolved name and relative directory
    pub fn name_and_path(&self) -> &NameAndPath {
        &self.name_and_path
    }

    /// Signal that the transfer of this file is about to start
    pub fn begin(&self) {
        if let Some(callback) = &self.on_before {
            callback(&self.path);
        }
    }

    /// Report the outcome of this file's transfer.
    ///
    /// Consumes the descriptor, so the completion callback fires at most once.
    pub async fn complete(self, outcome: FileOutcome) {
        if let Some(callback) = self.on_complete {
            callback(outcome).await;
        }
    }
}

impl fmt::Debug for FileTransferDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileTransferDescriptor")
            .field("path", &self.path)
            .field("name_and_path", &self.name_and_path)
            .field("on_before", &self.on_before.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

/// Batch handed to a plugin
#[derive(Debug)]
pub struct TransferContext {
    /// Files of the batch, in dispatch order
    pub files: Vec<FileTransferDescriptor>,
    /// Target the batch is transferred to or from
    pub target: Arc<Target>,
    /// Transfer direction
    pub direction: TransferDirection,
}
