//! Deployment engine tying the components together

use crate::dispatcher::TransferDispatcher;
use crate::operations::{OperationChain, OperationExecutors, WaitExecutor, WAIT_OPERATION_TYPE};
use crate::registry::PluginRegistry;
use crate::selection::select_and_run;
use crate::targets::target_name;
use deckhand_types::{
    DeployEvent, Error, FileSystem, OperationExecutor, Result, Target, TransferDirection,
    TransferPlugin, UserInterface, Workspace,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Pulls files from and deploys files to the targets of a workspace
pub struct DeployEngine {
    workspace: Arc<dyn Workspace>,
    ui: Arc<dyn UserInterface>,
    plugins: Arc<PluginRegistry>,
    executors: Arc<OperationExecutors>,
    dispatcher: TransferDispatcher,
    chain: OperationChain,
}

impl DeployEngine {
    /// Start building an engine for a workspace
    pub fn builder(workspace: Arc<dyn Workspace>) -> EngineBuilder {
        EngineBuilder::new(workspace)
    }

    /// The workspace the engine works in
    pub fn workspace(&self) -> &Arc<dyn Workspace> {
        &self.workspace
    }

    /// Registered transfer plugins
    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// Registered operation executors
    pub fn executors(&self) -> &OperationExecutors {
        &self.executors
    }

    /// Run the operations of a target for a lifecycle event
    pub async fn run_operations(&self, target: &Arc<Target>, event: DeployEvent) -> Result<bool> {
        self.chain.execute_operations(target, event).await
    }

    /// Pull `files` from a specific target
    pub async fn pull_files_with_target(
        &self,
        files: &[PathBuf],
        target: Arc<Target>,
        position: Option<usize>,
    ) -> Result<()> {
        self.ensure_owned(files, &target)?;
        self.dispatcher
            .transfer(files, target, TransferDirection::Download, position)
            .await;
        Ok(())
    }

    /// Deploy `files` to a specific target.
    ///
    /// Runs the target's before-deploy operations first; when they do not
    /// complete the deployment is skipped and `Ok(false)` is returned. After
    /// the upload the deployed operations run, and their outcome is returned.
    pub async fn deploy_files_with_target(
        &self,
        files: &[PathBuf],
        target: Arc<Target>,
        position: Option<usize>,
    ) -> Result<bool> {
        self.ensure_owned(files, &target)?;

        if !self
            .chain
            .execute_operations(&target, DeployEvent::BeforeDeploy)
            .await?
        {
            let name = target_name(&target, self.workspace.as_ref());
            info!("Deployment to '{}' canceled by its before-deploy operations", name);
            self.workspace.output().append_line(
                &self
                    .workspace
                    .translate("deploy.canceledByOperation", &[name]),
            );
            return Ok(false);
        }

        self.dispatcher
            .transfer(files, Arc::clone(&target), TransferDirection::Upload, position)
            .await;

        self.chain
            .execute_operations(&target, DeployEvent::AfterDeployed)
            .await
    }

    /// Pull `files` from a target the user picks.
    ///
    /// Chooses among `targets`, or among all workspace targets when `None`.
    pub async fn pull_files(&self, files: &[PathBuf], targets: Option<Vec<Arc<Target>>>) -> Result<()> {
        let targets = targets.unwrap_or_else(|| self.workspace.list_targets());
        let placeholder = self.workspace.translate("pull.selectTarget", &[]);

        select_and_run(
            self.workspace.as_ref(),
            self.ui.as_ref(),
            &targets,
            Some(&placeholder),
            |target, position| self.pull_files_with_target(files, target, Some(position)),
            (),
        )
        .await
    }

    /// Deploy `files` to a target the user picks.
    ///
    /// Returns `Ok(false)` when nothing was deployed or an operation stopped
    /// the deployment.
    pub async fn deploy_files(
        &self,
        files: &[PathBuf],
        targets: Option<Vec<Arc<Target>>>,
    ) -> Result<bool> {
        let targets = targets.unwrap_or_else(|| self.workspace.list_targets());
        let placeholder = self.workspace.translate("deploy.selectTarget", &[]);

        select_and_run(
            self.workspace.as_ref(),
            self.ui.as_ref(),
            &targets,
            Some(&placeholder),
            |target, position| self.deploy_files_with_target(files, target, Some(position)),
            false,
        )
        .await
    }

    fn ensure_owned(&self, files: &[PathBuf], target: &Target) -> Result<()> {
        if self.workspace.owns_target(target) {
            return Ok(());
        }

        let item = files
            .iter()
            .map(|f| f.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        debug!(
            "Target '{}' belongs to workspace '{}', not '{}'",
            target.normalized_name(),
            target.workspace,
            self.workspace.id()
        );
        Err(Error::not_owned(item, self.workspace.root_path()))
    }
}

/// Builder for creating a deploy engine
pub struct EngineBuilder {
    workspace: Arc<dyn Workspace>,
    plugins: PluginRegistry,
    executors: OperationExecutors,
    file_system: Option<Arc<dyn FileSystem>>,
    ui: Option<Arc<dyn UserInterface>>,
    wait_limit: Duration,
}

impl EngineBuilder {
    /// Create a new engine builder
    pub fn new(workspace: Arc<dyn Workspace>) -> Self {
        Self {
            workspace,
            plugins: PluginRegistry::new(),
            executors: OperationExecutors::new(),
            file_system: None,
            ui: None,
            wait_limit: Duration::from_secs(60),
        }
    }

    /// Register a transfer plugin
    pub fn with_plugin(mut self, plugin: Arc<dyn TransferPlugin>) -> Self {
        self.plugins.register(plugin);
        self
    }

    /// Register an operation executor for a type
    pub fn with_executor(mut self, op_type: &str, executor: Arc<dyn OperationExecutor>) -> Self {
        self.executors.register(op_type, executor);
        self
    }

    /// Set the file system downloads are written to
    pub fn with_file_system(mut self, file_system: Arc<dyn FileSystem>) -> Self {
        self.file_system = Some(file_system);
        self
    }

    /// Set the user interface for prompts and warnings
    pub fn with_user_interface(mut self, ui: Arc<dyn UserInterface>) -> Self {
        self.ui = Some(ui);
        self
    }

    /// Set the upper bound of the built-in `wait` operation
    pub fn with_wait_limit(mut self, limit: Duration) -> Self {
        self.wait_limit = limit;
        self
    }

    /// Build the deploy engine
    pub fn build(mut self) -> Result<DeployEngine> {
        let file_system = self
            .file_system
            .ok_or_else(|| Error::config("A file system is required to build the engine"))?;
        let ui = self
            .ui
            .ok_or_else(|| Error::config("A user interface is required to build the engine"))?;

        if self.executors.resolve(WAIT_OPERATION_TYPE).is_none() {
            self.executors.register(
                WAIT_OPERATION_TYPE,
                Arc::new(WaitExecutor::new(self.wait_limit)),
            );
        }

        let plugins = Arc::new(self.plugins);
        let executors = Arc::new(self.executors);
        debug!(
            "Engine built with plugins {:?} and executors {:?}",
            plugins, executors
        );

        Ok(DeployEngine {
            dispatcher: TransferDispatcher::new(
                Arc::clone(&self.workspace),
                Arc::clone(&plugins),
                file_system,
                Arc::clone(&ui),
            ),
            chain: OperationChain::new(Arc::clone(&self.workspace), Arc::clone(&executors)),
            workspace: self.workspace,
            ui,
            plugins,
            executors,
        })
    }
}
