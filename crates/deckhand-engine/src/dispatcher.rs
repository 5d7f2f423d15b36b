//! File transfer dispatch
//!
//! The dispatcher resolves the plugins for a target, wraps every file into a
//! [`FileTransferDescriptor`] whose callbacks report progress to the
//! workspace output, and hands the batch to each plugin in turn.

use crate::registry::PluginRegistry;
use crate::targets::target_name;
use deckhand_types::{
    CompletionFn, FileOutcome, FileSystem, FileTransferDescriptor, Result, Target,
    TransferContext, TransferDirection, TransferPlugin, UserInterface, Workspace,
};
use futures::FutureExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Dispatches file batches to transfer plugins
pub struct TransferDispatcher {
    workspace: Arc<dyn Workspace>,
    plugins: Arc<PluginRegistry>,
    file_system: Arc<dyn FileSystem>,
    ui: Arc<dyn UserInterface>,
}

impl TransferDispatcher {
    /// Create a dispatcher
    pub fn new(
        workspace: Arc<dyn Workspace>,
        plugins: Arc<PluginRegistry>,
        file_system: Arc<dyn FileSystem>,
        ui: Arc<dyn UserInterface>,
    ) -> Self {
        Self {
            workspace,
            plugins,
            file_system,
            ui,
        }
    }

    /// Transfer `files` from or to `target`.
    ///
    /// Every matching plugin gets its own attempt with a fresh batch. A
    /// failing plugin is reported and the next one still runs. When no
    /// plugin matches, the user is warned and nothing is transferred.
    /// `position` is the 1-based target number used in diagnostics.
    pub async fn transfer(
        &self,
        files: &[PathBuf],
        target: Arc<Target>,
        direction: TransferDirection,
        position: Option<usize>,
    ) {
        let name = target_name(&target, self.workspace.as_ref());
        let plugins = self.plugins.resolve(&target, direction);

        if plugins.is_empty() {
            let message = self.workspace.translate("plugins.noneMatching", &[name.clone()]);
            warn!(
                "No plugin can {} files for target '{}' (type '{}')",
                direction,
                name,
                target.type_or_default()
            );
            self.ui.show_warning(&message).await;
            return;
        }

        info!(
            "Dispatching {} file(s) for {} with target '{}'{} to {} plugin(s)",
            files.len(),
            direction,
            name,
            position.map(|p| format!(" (#{})", p)).unwrap_or_default(),
            plugins.len()
        );

        for plugin in plugins {
            if let Err(e) = self
                .transfer_with_plugin(plugin.as_ref(), files, &target, &name, direction)
                .await
            {
                if e.is_recoverable() {
                    warn!(
                        "Plugin '{}' could not {} files for '{}': {}",
                        plugin.plugin_type(),
                        direction,
                        name,
                        e
                    );
                } else {
                    error!(
                        "Plugin '{}' failed to {} files for '{}': {}",
                        plugin.plugin_type(),
                        direction,
                        name,
                        e
                    );
                }
                self.workspace.output().append_line(&self.workspace.translate(
                    "transfer.pluginFailed",
                    &[plugin.plugin_type().to_string(), e.to_string()],
                ));
            }
        }
    }

    async fn transfer_with_plugin(
        &self,
        plugin: &dyn TransferPlugin,
        files: &[PathBuf],
        target: &Arc<Target>,
        name: &str,
        direction: TransferDirection,
    ) -> Result<()> {
        let batch = files.len() > 1;
        let keys = MessageKeys::for_direction(direction);
        let output = self.workspace.output();
        // Set while a per-file line waits for its [OK] / [ERROR] suffix
        let open_line = Arc::new(AtomicBool::new(false));

        let descriptors = self.descriptors(files, batch, direction, keys, &open_line);

        if batch {
            output.append_line(&self.workspace.translate(
                keys.start_batch,
                &[descriptors.len().to_string(), name.to_string()],
            ));
        } else if let Some(descriptor) = descriptors.first() {
            output.append(&self.workspace.translate(
                keys.file,
                &[
                    descriptor.name_and_path().relative_path(),
                    name.to_string(),
                ],
            ));
            open_line.store(true, Ordering::SeqCst);
        }

        debug!(
            "Handing {} file(s) to plugin '{}'",
            descriptors.len(),
            plugin.plugin_type()
        );
        let context = TransferContext {
            files: descriptors,
            target: Arc::clone(target),
            direction,
        };
        if let Err(e) = plugin.transfer_files(context).await {
            if open_line.swap(false, Ordering::SeqCst) {
                output.append_line("");
            }
            return Err(e);
        }

        if batch {
            output.append_line(
                &self
                    .workspace
                    .translate(keys.finished_batch, &[name.to_string()]),
            );
        }
        Ok(())
    }

    fn descriptors(
        &self,
        files: &[PathBuf],
        batch: bool,
        direction: TransferDirection,
        keys: MessageKeys,
        open_line: &Arc<AtomicBool>,
    ) -> Vec<FileTransferDescriptor> {
        let mut descriptors = Vec::with_capacity(files.len());

        for file in files {
            let Some(name_and_path) = self.workspace.resolve_name_and_path(file) else {
                warn!("Could not resolve '{}' inside the workspace", file.display());
                self.workspace.output().append_line(&self.workspace.translate(
                    "transfer.unresolvedFile",
                    &[file.display().to_string()],
                ));
                continue;
            };

            let mut descriptor = FileTransferDescriptor::new(file.clone(), name_and_path.clone());

            if batch {
                let workspace = Arc::clone(&self.workspace);
                let open_line = Arc::clone(open_line);
                let message = self
                    .workspace
                    .translate(keys.file_in_batch, &[name_and_path.relative_path()]);
                descriptor = descriptor.on_before(Arc::new(move |_: &Path| {
                    workspace.output().append(&message);
                    open_line.store(true, Ordering::SeqCst);
                }));
            }

            descriptors.push(descriptor.on_complete(self.completion(
                file.clone(),
                direction,
                Arc::clone(open_line),
            )));
        }

        descriptors
    }

    /// Completion callback persisting downloaded data and reporting the outcome
    fn completion(
        &self,
        path: PathBuf,
        direction: TransferDirection,
        open_line: Arc<AtomicBool>,
    ) -> CompletionFn {
        let workspace = Arc::clone(&self.workspace);
        let file_system = Arc::clone(&self.file_system);

        Box::new(move |outcome: FileOutcome| {
            async move {
                let result = match outcome {
                    Ok(Some(data)) if direction == TransferDirection::Download => {
                        file_system.write_file(&path, &data).await
                    }
                    Ok(_) => Ok(()),
                    Err(e) => Err(e),
                };

                match result {
                    Ok(()) => {
                        debug!("Transferred '{}'", path.display());
                        workspace
                            .output()
                            .append_line(&workspace.translate("transfer.ok", &[]));
                    }
                    Err(e) => {
                        error!("Transfer of '{}' failed: {}", path.display(), e);
                        workspace
                            .output()
                            .append_line(&workspace.translate("transfer.error", &[e.to_string()]));
                    }
                }
                open_line.store(false, Ordering::SeqCst);
            }
            .boxed()
        })
    }
}

/// Message catalog keys of one transfer direction
#[derive(Debug, Clone, Copy)]
struct MessageKeys {
    start_batch: &'static str,
    finished_batch: &'static str,
    file: &'static str,
    file_in_batch: &'static str,
}

impl MessageKeys {
    fn for_direction(direction: TransferDirection) -> Self {
        match direction {
            TransferDirection::Download => Self {
                start_batch: "pull.startBatch",
                finished_batch: "pull.finishedBatch",
                file: "pull.file",
                file_in_batch: "pull.fileInBatch",
            },
            TransferDirection::Upload => Self {
                start_batch: "deploy.startBatch",
                finished_batch: "deploy.finishedBatch",
                file: "deploy.file",
                file_in_batch: "deploy.fileInBatch",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FixedUi, MemoryFs, TestWorkspace};
    use async_trait::async_trait;
    use deckhand_types::Error;
    use std::sync::Mutex;

    /// Plugin answering every file with a fixed outcome
    struct ScriptedPlugin {
        plugin_type: &'static str,
        outcome: FileOutcome,
        fail_after: bool,
        batches: Mutex<Vec<Vec<PathBuf>>>,
    }

    impl ScriptedPlugin {
        fn new(plugin_type: &'static str, outcome: FileOutcome) -> Arc<Self> {
            Arc::new(Self {
                plugin_type,
                outcome,
                fail_after: false,
                batches: Mutex::default(),
            })
        }

        fn failing(plugin_type: &'static str) -> Arc<Self> {
            Arc::new(Self {
                plugin_type,
                outcome: Ok(None),
                fail_after: true,
                batches: Mutex::default(),
            })
        }

        fn batches(&self) -> Vec<Vec<PathBuf>> {
            self.batches.lock().unwrap().clone()
        }

        async fn run(&self, context: TransferContext) -> Result<()> {
            self.batches
                .lock()
                .unwrap()
                .push(context.files.iter().map(|f| f.path().to_path_buf()).collect());
            for file in context.files {
                file.begin();
                file.complete(self.outcome.clone()).await;
            }
            if self.fail_after {
                return Err(Error::transfer("connection reset"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl TransferPlugin for ScriptedPlugin {
        fn plugin_type(&self) -> &str {
            self.plugin_type
        }

        fn can_download(&self) -> bool {
            true
        }

        fn can_upload(&self) -> bool {
            true
        }

        async fn download_files(&self, context: TransferContext) -> Result<()> {
            self.run(context).await
        }

        async fn upload_files(&self, context: TransferContext) -> Result<()> {
            self.run(context).await
        }
    }

    struct Fixture {
        workspace: Arc<TestWorkspace>,
        fs: Arc<MemoryFs>,
        ui: Arc<FixedUi>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                workspace: Arc::new(TestWorkspace::new()),
                fs: Arc::new(MemoryFs::default()),
                ui: Arc::new(FixedUi::default()),
            }
        }

        fn dispatcher(&self, plugins: PluginRegistry) -> TransferDispatcher {
            TransferDispatcher::new(
                self.workspace.clone(),
                Arc::new(plugins),
                self.fs.clone(),
                self.ui.clone(),
            )
        }

        fn lines(&self) -> Vec<String> {
            self.workspace.sink.lines()
        }
    }

    fn target() -> Arc<Target> {
        Arc::new(Target::new("Prod", "sftp"))
    }

    #[tokio::test]
    async fn test_single_download_is_persisted_and_terse() {
        let fixture = Fixture::new();
        let plugin = ScriptedPlugin::new("sftp", Ok(Some(b"remote".to_vec())));
        let dispatcher = fixture.dispatcher(PluginRegistry::new().with_plugin(plugin.clone()));

        dispatcher
            .transfer(
                &[PathBuf::from("/ws/src/a.txt")],
                target(),
                TransferDirection::Download,
                Some(1),
            )
            .await;

        assert_eq!(
            fixture.lines(),
            vec!["Pulling file 'src/a.txt' from 'Prod'... [OK]".to_string()]
        );
        let writes = fixture.fs.writes.lock().unwrap().clone();
        assert_eq!(
            writes,
            vec![(PathBuf::from("/ws/src/a.txt"), b"remote".to_vec())]
        );
    }

    #[tokio::test]
    async fn test_batch_logs_banners_and_per_file_lines() {
        let fixture = Fixture::new();
        let plugin = ScriptedPlugin::new("sftp", Ok(None));
        let dispatcher = fixture.dispatcher(PluginRegistry::new().with_plugin(plugin.clone()));

        dispatcher
            .transfer(
                &[PathBuf::from("/ws/a.txt"), PathBuf::from("/ws/b.txt")],
                target(),
                TransferDirection::Upload,
                None,
            )
            .await;

        assert_eq!(
            fixture.lines(),
            vec![
                "Start deploying 2 files to 'Prod'...".to_string(),
                "  Deploying file 'a.txt'... [OK]".to_string(),
                "  Deploying file 'b.txt'... [OK]".to_string(),
                "Finished deploying to 'Prod'.".to_string(),
            ]
        );
        assert!(fixture.fs.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_ignores_returned_data() {
        let fixture = Fixture::new();
        let plugin = ScriptedPlugin::new("sftp", Ok(Some(b"echo".to_vec())));
        let dispatcher = fixture.dispatcher(PluginRegistry::new().with_plugin(plugin));

        dispatcher
            .transfer(
                &[PathBuf::from("/ws/a.txt")],
                target(),
                TransferDirection::Upload,
                None,
            )
            .await;

        assert!(fixture.fs.writes.lock().unwrap().is_empty());
        assert_eq!(
            fixture.lines(),
            vec!["Deploying file 'a.txt' to 'Prod'... [OK]".to_string()]
        );
    }

    #[tokio::test]
    async fn test_file_error_is_reported() {
        let fixture = Fixture::new();
        let plugin = ScriptedPlugin::new("sftp", Err(Error::transfer("permission denied")));
        let dispatcher = fixture.dispatcher(PluginRegistry::new().with_plugin(plugin));

        dispatcher
            .transfer(
                &[PathBuf::from("/ws/a.txt")],
                target(),
                TransferDirection::Download,
                None,
            )
            .await;

        let lines = fixture.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Pulling file 'a.txt' from 'Prod'... [ERROR: "));
        assert!(lines[0].contains("permission denied"));
    }

    #[tokio::test]
    async fn test_persist_failure_is_reported() {
        let mut fixture = Fixture::new();
        fixture.fs = Arc::new(MemoryFs {
            fail: true,
            ..MemoryFs::default()
        });
        let plugin = ScriptedPlugin::new("sftp", Ok(Some(b"data".to_vec())));
        let dispatcher = fixture.dispatcher(PluginRegistry::new().with_plugin(plugin));

        dispatcher
            .transfer(
                &[PathBuf::from("/ws/a.txt")],
                target(),
                TransferDirection::Download,
                None,
            )
            .await;

        let lines = fixture.lines();
        assert!(lines[0].contains("[ERROR: "));
        assert!(lines[0].contains("disk full"));
    }

    #[tokio::test]
    async fn test_no_matching_plugin_warns() {
        let fixture = Fixture::new();
        let plugin = ScriptedPlugin::new("ftp", Ok(None));
        let dispatcher = fixture.dispatcher(PluginRegistry::new().with_plugin(plugin.clone()));

        dispatcher
            .transfer(
                &[PathBuf::from("/ws/a.txt")],
                target(),
                TransferDirection::Download,
                None,
            )
            .await;

        assert!(plugin.batches().is_empty());
        assert_eq!(
            fixture.ui.warnings.lock().unwrap().clone(),
            vec!["No matching plugins found for target 'Prod'!".to_string()]
        );
    }

    #[tokio::test]
    async fn test_every_matching_plugin_gets_a_fresh_batch() {
        let fixture = Fixture::new();
        let failing = ScriptedPlugin::failing("sftp");
        let wildcard = ScriptedPlugin::new("", Ok(None));
        let dispatcher = fixture.dispatcher(
            PluginRegistry::new()
                .with_plugin(failing.clone())
                .with_plugin(wildcard.clone()),
        );
        let files = vec![PathBuf::from("/ws/a.txt")];

        dispatcher
            .transfer(&files, target(), TransferDirection::Upload, None)
            .await;

        assert_eq!(failing.batches(), vec![files.clone()]);
        assert_eq!(wildcard.batches(), vec![files]);
        let lines = fixture.lines();
        assert!(lines
            .iter()
            .any(|l| l.contains("[ERROR] Plugin 'sftp' failed") && l.contains("connection reset")));
    }

    #[tokio::test]
    async fn test_unresolvable_files_are_dropped() {
        let fixture = Fixture::new();
        let plugin = ScriptedPlugin::new("sftp", Ok(None));
        let dispatcher = fixture.dispatcher(PluginRegistry::new().with_plugin(plugin.clone()));

        dispatcher
            .transfer(
                &[PathBuf::from("/elsewhere/x.txt"), PathBuf::from("/ws/a.txt")],
                target(),
                TransferDirection::Upload,
                None,
            )
            .await;

        assert_eq!(plugin.batches(), vec![vec![PathBuf::from("/ws/a.txt")]]);
        assert!(fixture.lines()[0].contains("/elsewhere/x.txt"));
    }

    #[tokio::test]
    async fn test_missing_capability_of_wildcard_is_reported() {
        struct Bare;

        #[async_trait]
        impl TransferPlugin for Bare {
            fn plugin_type(&self) -> &str {
                ""
            }
        }

        let fixture = Fixture::new();
        let dispatcher = fixture.dispatcher(PluginRegistry::new().with_plugin(Arc::new(Bare)));

        dispatcher
            .transfer(
                &[PathBuf::from("/ws/a.txt")],
                target(),
                TransferDirection::Download,
                None,
            )
            .await;

        let lines = fixture.lines();
        assert!(lines.last().unwrap().contains("does not support download"));
    }

    /// Plugin that starts the first file and then gives up
    struct Stalling;

    #[async_trait]
    impl TransferPlugin for Stalling {
        fn plugin_type(&self) -> &str {
            "sftp"
        }

        fn can_download(&self) -> bool {
            true
        }

        async fn download_files(&self, context: TransferContext) -> Result<()> {
            if let Some(file) = context.files.first() {
                file.begin();
            }
            Err(Error::config("Target 'Prod' has no 'dir' option"))
        }
    }

    #[rstest::rstest]
    #[case(vec!["/ws/a.txt"], vec!["Pulling file 'a.txt' from 'Prod'... "])]
    #[case(
        vec!["/ws/a.txt", "/ws/b.txt"],
        vec!["Start pulling 2 files from 'Prod'...", "  Pulling file 'a.txt'... "]
    )]
    #[tokio::test]
    async fn test_plugin_failure_starts_on_a_new_line(
        #[case] files: Vec<&str>,
        #[case] expected_prefix: Vec<&str>,
    ) {
        let fixture = Fixture::new();
        let dispatcher = fixture.dispatcher(PluginRegistry::new().with_plugin(Arc::new(Stalling)));
        let files: Vec<PathBuf> = files.into_iter().map(PathBuf::from).collect();

        dispatcher
            .transfer(&files, target(), TransferDirection::Download, None)
            .await;

        let mut expected: Vec<String> = expected_prefix.into_iter().map(String::from).collect();
        expected.push(
            "[ERROR] Plugin 'sftp' failed: Configuration error: Target 'Prod' has no 'dir' option"
                .to_string(),
        );
        assert_eq!(fixture.lines(), expected);
    }
}
