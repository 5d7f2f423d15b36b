//! Workspace backed by a directory on the local file system

use async_trait::async_trait;
use deckhand_types::{
    filter_conditional_items, Error, FileSystem, NameAndPath, OutputSink, Result, Target,
    Workspace, WorkspaceId,
};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Directory workspace with its configured targets
pub struct LocalWorkspace {
    id: WorkspaceId,
    root: PathBuf,
    targets: Vec<Arc<Target>>,
    finalizing: AtomicBool,
    output: Box<dyn OutputSink>,
}

impl LocalWorkspace {
    /// Create a workspace rooted at `root`.
    ///
    /// `targets` must have been materialized with this workspace's id.
    pub fn new(root: PathBuf, targets: Vec<Arc<Target>>, output: Box<dyn OutputSink>) -> Self {
        Self {
            id: Self::id_for(&root),
            root,
            targets,
            finalizing: AtomicBool::new(false),
            output,
        }
    }

    /// Workspace id derived from a root directory
    pub fn id_for(root: &Path) -> WorkspaceId {
        WorkspaceId::new(root.display().to_string())
    }

    /// Mark the workspace as shutting down
    pub fn finalize(&self) {
        debug!("Workspace '{}' is finalizing", self.id);
        self.finalizing.store(true, Ordering::SeqCst);
    }

    /// All configured targets, conditions not applied
    pub fn all_targets(&self) -> &[Arc<Target>] {
        &self.targets
    }

    /// Make a path absolute against the current directory
    pub fn absolutize(path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Ok(std::env::current_dir()?.join(path))
        }
    }
}

impl Workspace for LocalWorkspace {
    fn id(&self) -> &WorkspaceId {
        &self.id
    }

    fn root_path(&self) -> &Path {
        &self.root
    }

    fn is_finalizing(&self) -> bool {
        self.finalizing.load(Ordering::SeqCst)
    }

    fn list_targets(&self) -> Vec<Arc<Target>> {
        filter_conditional_items(self.targets.iter().cloned(), |c| self.check_condition(c))
    }

    fn resolve_name_and_path(&self, file: &Path) -> Option<NameAndPath> {
        let relative = file.strip_prefix(&self.root).ok()?;

        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => return None,
            }
        }

        let name = parts.pop()?;
        Some(NameAndPath::new(name, parts.join("/")))
    }

    fn output(&self) -> &dyn OutputSink {
        self.output.as_ref()
    }
}

/// File system writes through tokio
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioFileSystem;

#[async_trait]
impl FileSystem for TokioFileSystem {
    async fn write_file(&self, path: &Path, data: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, data)
            .await
            .map_err(|e| Error::Io {
                message: format!("Failed to write '{}': {}", path.display(), e),
            })
    }
}
