//! In-memory collaborators shared by the unit tests of this crate

use async_trait::async_trait;
use deckhand_types::{
    ChoiceItem, FileSystem, NameAndPath, OutputSink, Result, Target, UserInterface, Workspace,
    WorkspaceId,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Output sink collecting text into lines
#[derive(Default)]
pub struct LineSink {
    text: Mutex<String>,
}

impl LineSink {
    pub fn lines(&self) -> Vec<String> {
        self.text
            .lock()
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl OutputSink for LineSink {
    fn append(&self, text: &str) {
        self.text.lock().unwrap().push_str(text);
    }

    fn append_line(&self, text: &str) {
        let mut buffer = self.text.lock().unwrap();
        buffer.push_str(text);
        buffer.push('\n');
    }
}

pub struct TestWorkspace {
    pub id: WorkspaceId,
    pub root: PathBuf,
    pub targets: Vec<Arc<Target>>,
    pub finalizing: AtomicBool,
    pub sink: LineSink,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            id: WorkspaceId::new("test-ws"),
            root: PathBuf::from("/ws"),
            targets: Vec::new(),
            finalizing: AtomicBool::new(false),
            sink: LineSink::default(),
        }
    }

    /// Own a target by attaching this workspace's id
    pub fn own(&self, target: Target) -> Arc<Target> {
        Arc::new(target.with_workspace(self.id.clone()))
    }

    pub fn finalize(&self) {
        self.finalizing.store(true, Ordering::SeqCst);
    }
}

impl Workspace for TestWorkspace {
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
        self.targets.clone()
    }

    fn resolve_name_and_path(&self, file: &Path) -> Option<NameAndPath> {
        let relative = file.strip_prefix(&self.root).ok()?;
        let name = relative.file_name()?.to_string_lossy().into_owned();
        let dir = relative
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        Some(NameAndPath::new(name, dir))
    }

    fn output(&self) -> &dyn OutputSink {
        &self.sink
    }
}

/// File system remembering every write
#[derive(Default)]
pub struct MemoryFs {
    pub writes: Mutex<Vec<(PathBuf, Vec<u8>)>>,
    pub fail: bool,
}

#[async_trait]
impl FileSystem for MemoryFs {
    async fn write_file(&self, path: &Path, data: &[u8]) -> Result<()> {
        if self.fail {
            return Err(deckhand_types::Error::Io {
                message: "disk full".to_string(),
            });
        }
        self.writes
            .lock()
            .unwrap()
            .push((path.to_path_buf(), data.to_vec()));
        Ok(())
    }
}

/// User interface answering every prompt with a fixed choice
#[derive(Default)]
pub struct FixedUi {
    pub answer: Option<usize>,
    pub prompts: Mutex<Vec<(Vec<String>, String)>>,
    pub warnings: Mutex<Vec<String>>,
}

#[async_trait]
impl UserInterface for FixedUi {
    async fn show_choice(&self, items: &[ChoiceItem], placeholder: &str) -> Result<Option<usize>> {
        self.prompts.lock().unwrap().push((
            items.iter().map(|i| i.label.clone()).collect(),
            placeholder.to_string(),
        ));
        Ok(self.answer)
    }

    async fn show_warning(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }
}
