//! Built-in `local` transfer plugin
//!
//! Mirrors workspace files into the directory given by a target's `dir`
//! option, keeping their workspace-relative layout.

use async_trait::async_trait;
use deckhand_types::{
    Error, FileTransferDescriptor, Result, Target, TransferContext, TransferPlugin,
    DEFAULT_TARGET_TYPE,
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Copies files between the workspace and a local directory
#[derive(Debug, Clone)]
pub struct LocalPlugin {
    workspace_root: PathBuf,
}

impl LocalPlugin {
    /// Create the plugin; relative `dir` options resolve against `workspace_root`
    pub fn new(workspace_root: PathBuf) -> Self {
        Self { workspace_root }
    }

    fn target_dir(&self, target: &Target) -> Result<PathBuf> {
        let dir = target
            .option("dir")
            .map(|v| v.as_str().trim().to_string())
            .filter(|d| !d.is_empty())
            .ok_or_else(|| {
                Error::config(format!(
                    "Target '{}' has no 'dir' option",
                    target.name.as_deref().unwrap_or_default()
                ))
            })?;

        let dir = PathBuf::from(dir);
        Ok(if dir.is_absolute() {
            dir
        } else {
            self.workspace_root.join(dir)
        })
    }

    fn remote_path(dir: &Path, file: &FileTransferDescriptor) -> PathBuf {
        file.name_and_path()
            .relative_path()
            .split('/')
            .fold(dir.to_path_buf(), |path, part| path.join(part))
    }

    async fn copy_in(source: PathBuf) -> Result<Option<Vec<u8>>> {
        debug!("Reading '{}'", source.display());
        tokio::fs::read(&source)
            .await
            .map(Some)
            .map_err(|e| Error::Io {
                message: format!("Failed to read '{}': {}", source.display(), e),
            })
    }

    async fn copy_out(source: PathBuf, destination: PathBuf) -> Result<Option<Vec<u8>>> {
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        debug!(
            "Copying '{}' to '{}'",
            source.display(),
            destination.display()
        );
        tokio::fs::copy(&source, &destination)
            .await
            .map(|_| None)
            .map_err(|e| Error::Io {
                message: format!("Failed to write '{}': {}", destination.display(), e),
            })
    }
}

#[async_trait]
impl TransferPlugin for LocalPlugin {
    fn plugin_type(&self) -> &str {
        DEFAULT_TARGET_TYPE
    }

    fn can_download(&self) -> bool {
        true
    }

    fn can_upload(&self) -> bool {
        true
    }

    async fn download_files(&self, context: TransferContext) -> Result<()> {
        let dir = self.target_dir(&context.target)?;
        for file in context.files {
            file.begin();
            let outcome = Self::copy_in(Self::remote_path(&dir, &file)).await;
            file.complete(outcome).await;
        }
        Ok(())
    }

    async fn upload_files(&self, context: TransferContext) -> Result<()> {
        let dir = self.target_dir(&context.target)?;
        for file in context.files {
            file.begin();
            let destination = Self::remote_path(&dir, &file);
            let outcome = Self::copy_out(file.path().to_path_buf(), destination).await;
            file.complete(outcome).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckhand_types::{FileOutcome, NameAndPath, TransferDirection};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Descriptors whose outcomes land in the returned list
    fn collect_outcomes(
        files: Vec<(PathBuf, NameAndPath)>,
    ) -> (Vec<FileTransferDescriptor>, Arc<Mutex<Vec<FileOutcome>>>) {
        let outcomes = Arc::new(Mutex::new(Vec::new()));
        let descriptors = files
            .into_iter()
            .map(|(path, name_and_path)| {
                let outcomes = Arc::clone(&outcomes);
                FileTransferDescriptor::new(path, name_and_path).on_complete(Box::new(
                    move |outcome| {
                        Box::pin(async move {
                            outcomes.lock().unwrap().push(outcome);
                        })
                    },
                ))
            })
            .collect();
        (descriptors, outcomes)
    }

    fn target(dir: &Path) -> Arc<Target> {
        Arc::new(Target::new("mirror", "local").with_option("dir", dir.display().to_string()))
    }

    #[tokio::test]
    async fn test_upload_keeps_relative_layout() {
        let workspace = TempDir::new().unwrap();
        let remote = TempDir::new().unwrap();
        let source = workspace.path().join("css/site.css");
        tokio::fs::create_dir_all(source.parent().unwrap()).await.unwrap();
        tokio::fs::write(&source, b"body {}").await.unwrap();

        let (files, outcomes) =
            collect_outcomes(vec![(source, NameAndPath::new("site.css", "css"))]);
        let plugin = LocalPlugin::new(workspace.path().to_path_buf());
        plugin
            .transfer_files(TransferContext {
                files,
                target: target(remote.path()),
                direction: TransferDirection::Upload,
            })
            .await
            .unwrap();

        let copied = tokio::fs::read(remote.path().join("css/site.css")).await.unwrap();
        assert_eq!(copied, b"body {}");
        assert_eq!(outcomes.lock().unwrap().clone(), vec![Ok(None)]);
    }

    #[tokio::test]
    async fn test_download_returns_content() {
        let workspace = TempDir::new().unwrap();
        let remote = TempDir::new().unwrap();
        tokio::fs::write(remote.path().join("a.txt"), b"remote").await.unwrap();

        let (files, outcomes) = collect_outcomes(vec![
            (workspace.path().join("a.txt"), NameAndPath::new("a.txt", "")),
            (workspace.path().join("b.txt"), NameAndPath::new("b.txt", "")),
        ]);
        let plugin = LocalPlugin::new(workspace.path().to_path_buf());
        plugin
            .transfer_files(TransferContext {
                files,
                target: target(remote.path()),
                direction: TransferDirection::Download,
            })
            .await
            .unwrap();

        let outcomes = outcomes.lock().unwrap().clone();
        assert_eq!(outcomes[0], Ok(Some(b"remote".to_vec())));
        assert!(matches!(outcomes[1], Err(Error::Io { .. })));
    }

    #[tokio::test]
    async fn test_missing_dir_option_fails() {
        let plugin = LocalPlugin::new(PathBuf::from("/srv/project"));
        let result = plugin
            .transfer_files(TransferContext {
                files: Vec::new(),
                target: Arc::new(Target::new("mirror", "local")),
                direction: TransferDirection::Upload,
            })
            .await;
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_relative_dir_resolves_against_workspace() {
        let plugin = LocalPlugin::new(PathBuf::from("/srv/project"));
        let target = Target::new("mirror", "local").with_option("dir", "out/site");
        assert_eq!(
            plugin.target_dir(&target).unwrap(),
            PathBuf::from("/srv/project/out/site")
        );
    }
}
