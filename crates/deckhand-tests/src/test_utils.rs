//! Shared fakes for deckhand integration tests
//!
//! Every fake records what happened to it so tests can assert on calls,
//! order and output without touching a terminal or a remote system.

use async_trait::async_trait;
use deckhand_types::{
    ChoiceItem, Error, FileOutcome, FileSystem, NameAndPath, OperationContext, OperationExecutor,
    OperationResult, OutputSink, Result, Target, TransferContext, TransferPlugin, UserInterface,
    Workspace, WorkspaceId,
};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Journal shared between fakes to check cross-component ordering
pub type Journal = Arc<Mutex<Vec<String>>>;

/// Output sink keeping everything in memory; clones share the buffer
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    text: Arc<Mutex<String>>,
}

impl RecordingSink {
    /// Output split into lines
    pub fn lines(&self) -> Vec<String> {
        self.text
            .lock()
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Raw output
    pub fn text(&self) -> String {
        self.text.lock().unwrap().clone()
    }
}

impl OutputSink for RecordingSink {
    fn append(&self, text: &str) {
        self.text.lock().unwrap().push_str(text);
    }

    fn append_line(&self, text: &str) {
        let mut buffer = self.text.lock().unwrap();
        buffer.push_str(text);
        buffer.push('\n');
    }
}

/// Workspace rooted at `/workspace` with in-memory state
pub struct FakeWorkspace {
    id: WorkspaceId,
    root: PathBuf,
    targets: Vec<Arc<Target>>,
    finalizing: AtomicBool,
    sink: RecordingSink,
}

impl FakeWorkspace {
    /// Workspace owning `targets`, indexed in the given order
    pub fn new(targets: Vec<Target>) -> Self {
        let id = WorkspaceId::new("fake-workspace");
        let targets = targets
            .into_iter()
            .enumerate()
            .map(|(index, target)| Arc::new(target.with_index(index).with_workspace(id.clone())))
            .collect();

        Self {
            id,
            root: PathBuf::from("/workspace"),
            targets,
            finalizing: AtomicBool::new(false),
            sink: RecordingSink::default(),
        }
    }

    /// Owned target by position
    pub fn target(&self, index: usize) -> Arc<Target> {
        Arc::clone(&self.targets[index])
    }

    /// Absolute path of a workspace-relative file
    pub fn file(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Recorded output
    pub fn sink(&self) -> &RecordingSink {
        &self.sink
    }

    /// Enter finalize state
    pub fn finalize(&self) {
        self.finalizing.store(true, Ordering::SeqCst);
    }
}

impl Workspace for FakeWorkspace {
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
        deckhand_types::filter_conditional_items(self.targets.iter().cloned(), |c| {
            self.check_condition(c)
        })
    }

    fn resolve_name_and_path(&self, file: &Path) -> Option<NameAndPath> {
        let relative = file.strip_prefix(&self.root).ok()?;
        let mut parts: Vec<String> = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                _ => return None,
            }
        }
        let name = parts.pop()?;
        Some(NameAndPath::new(name, parts.join("/")))
    }

    fn output(&self) -> &dyn OutputSink {
        &self.sink
    }
}

/// User interface answering prompts from a script
#[derive(Debug, Default)]
pub struct ScriptedUi {
    answer: Option<usize>,
    prompts: Mutex<Vec<(Vec<ChoiceItem>, String)>>,
    warnings: Mutex<Vec<String>>,
}

impl ScriptedUi {
    /// UI that picks the item at `index`
    pub fn choosing(index: usize) -> Self {
        Self {
            answer: Some(index),
            ..Self::default()
        }
    }

    /// UI that dismisses every prompt
    pub fn dismissing() -> Self {
        Self::default()
    }

    /// Prompts shown so far, with their placeholder
    pub fn prompts(&self) -> Vec<(Vec<ChoiceItem>, String)> {
        self.prompts.lock().unwrap().clone()
    }

    /// Warnings shown so far
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserInterface for ScriptedUi {
    async fn show_choice(&self, items: &[ChoiceItem], placeholder: &str) -> Result<Option<usize>> {
        self.prompts
            .lock()
            .unwrap()
            .push((items.to_vec(), placeholder.to_string()));
        Ok(self.answer)
    }

    async fn show_warning(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }
}

/// File system keeping written files in memory
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: Mutex<Vec<(PathBuf, Vec<u8>)>>,
    failing: bool,
}

impl MemoryFileSystem {
    /// File system whose writes always fail
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Writes in the order they happened
    pub fn writes(&self) -> Vec<(PathBuf, Vec<u8>)> {
        self.files.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileSystem for MemoryFileSystem {
    async fn write_file(&self, path: &Path, data: &[u8]) -> Result<()> {
        if self.failing {
            return Err(Error::Io {
                message: format!("read-only file system: {}", path.display()),
            });
        }
        self.files
            .lock()
            .unwrap()
            .push((path.to_path_buf(), data.to_vec()));
        Ok(())
    }
}

type OutcomeFn = Box<dyn Fn(&Path) -> FileOutcome + Send + Sync>;

/// Transfer plugin with scripted capabilities and outcomes
pub struct ScriptedPlugin {
    plugin_type: String,
    download: bool,
    upload: bool,
    fail_batch: bool,
    outcome: OutcomeFn,
    batches: Mutex<Vec<Vec<PathBuf>>>,
    journal: Option<Journal>,
}

impl ScriptedPlugin {
    /// Plugin of `plugin_type` supporting both directions, answering `Ok(None)`
    pub fn new<S: Into<String>>(plugin_type: S) -> Self {
        Self {
            plugin_type: plugin_type.into(),
            download: true,
            upload: true,
            fail_batch: false,
            outcome: Box::new(|_| Ok(None)),
            batches: Mutex::default(),
            journal: None,
        }
    }

    /// Set the supported directions
    pub fn capabilities(mut self, download: bool, upload: bool) -> Self {
        self.download = download;
        self.upload = upload;
        self
    }

    /// Fail the whole batch after processing its files
    pub fn failing(mut self) -> Self {
        self.fail_batch = true;
        self
    }

    /// Compute each file's outcome
    pub fn with_outcome<F>(mut self, outcome: F) -> Self
    where
        F: Fn(&Path) -> FileOutcome + Send + Sync + 'static,
    {
        self.outcome = Box::new(outcome);
        self
    }

    /// Log batch starts into a shared journal
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Files of every received batch
    pub fn batches(&self) -> Vec<Vec<PathBuf>> {
        self.batches.lock().unwrap().clone()
    }

    async fn run(&self, context: TransferContext) -> Result<()> {
        if let Some(journal) = &self.journal {
            journal
                .lock()
                .unwrap()
                .push(format!("{}:{}", context.direction, self.plugin_type));
        }
        self.batches
            .lock()
            .unwrap()
            .push(context.files.iter().map(|f| f.path().to_path_buf()).collect());

        for file in context.files {
            file.begin();
            let outcome = (self.outcome)(file.path());
            file.complete(outcome).await;
        }

        if self.fail_batch {
            return Err(Error::transfer(format!(
                "plugin '{}' lost its connection",
                self.plugin_type
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl TransferPlugin for ScriptedPlugin {
    fn plugin_type(&self) -> &str {
        &self.plugin_type
    }

    fn can_download(&self) -> bool {
        self.download
    }

    fn can_upload(&self) -> bool {
        self.upload
    }

    async fn download_files(&self, context: TransferContext) -> Result<()> {
        self.run(context).await
    }

    async fn upload_files(&self, context: TransferContext) -> Result<()> {
        self.run(context).await
    }
}

type CallHook = Box<dyn Fn(&OperationContext) + Send + Sync>;

/// Operation executor recording its invocations
pub struct RecordingExecutor {
    results: Mutex<Vec<OperationResult>>,
    calls: Mutex<Vec<Arc<OperationContext>>>,
    hook: Option<CallHook>,
    journal: Option<Journal>,
}

impl RecordingExecutor {
    /// Executor answering `NoOpinion` to every call
    pub fn new() -> Self {
        Self {
            results: Mutex::default(),
            calls: Mutex::default(),
            hook: None,
            journal: None,
        }
    }

    /// Answer the n-th call with `results[n]`, `NoOpinion` afterwards
    pub fn answering(results: Vec<OperationResult>) -> Self {
        let mut executor = Self::new();
        let mut results = results;
        results.reverse();
        executor.results = Mutex::new(results);
        executor
    }

    /// Run `hook` on every call before answering
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&OperationContext) + Send + Sync + 'static,
    {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Log calls into a shared journal
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Contexts of every call, in order
    pub fn calls(&self) -> Vec<Arc<OperationContext>> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for RecordingExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OperationExecutor for RecordingExecutor {
    async fn execute(&self, context: Arc<OperationContext>) -> Result<OperationResult> {
        if let Some(hook) = &self.hook {
            hook(&context);
        }
        if let Some(journal) = &self.journal {
            journal.lock().unwrap().push(format!(
                "{}:{}",
                context.event.as_str(),
                context.operation.target.clone().unwrap_or_default()
            ));
        }
        self.calls.lock().unwrap().push(Arc::clone(&context));
        Ok(self.results.lock().unwrap().pop().unwrap_or_default())
    }
}
