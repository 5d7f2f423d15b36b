//! Target operation chains
//!
//! A target lists operations for its lifecycle events. [`OperationChain`]
//! runs them one after another, links each invocation to the previous one
//! and stops early when an executor aborts or the workspace shuts down.

use async_trait::async_trait;
use deckhand_types::{
    filter_conditional_items, normalize_string, DeployEvent, OperationContext, OperationExecutor,
    OperationResult, Result, Target, Workspace, OPEN_OPERATION_TYPE,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// Type of the built-in pause operation
pub const WAIT_OPERATION_TYPE: &str = "wait";

/// Executors keyed by normalized operation type
#[derive(Clone, Default)]
pub struct OperationExecutors {
    executors: HashMap<String, Arc<dyn OperationExecutor>>,
}

impl OperationExecutors {
    /// Create an empty executor table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an executor for an operation type.
    ///
    /// An empty type registers the `open` executor.
    pub fn register(&mut self, op_type: &str, executor: Arc<dyn OperationExecutor>) -> &mut Self {
        self.executors.insert(Self::key(op_type), executor);
        self
    }

    /// Builder style [`register`](Self::register)
    pub fn with_executor(mut self, op_type: &str, executor: Arc<dyn OperationExecutor>) -> Self {
        self.register(op_type, executor);
        self
    }

    /// Executor for an operation type, if one is registered
    pub fn resolve(&self, op_type: &str) -> Option<Arc<dyn OperationExecutor>> {
        self.executors.get(&Self::key(op_type)).cloned()
    }

    /// Registered operation types, sorted
    pub fn types(&self) -> Vec<&str> {
        let mut types: Vec<_> = self.executors.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    fn key(op_type: &str) -> String {
        let normalized = normalize_string(op_type);
        if normalized.is_empty() {
            OPEN_OPERATION_TYPE.to_string()
        } else {
            normalized
        }
    }
}

impl fmt::Debug for OperationExecutors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationExecutors")
            .field("types", &self.types())
            .finish()
    }
}

/// Runs the operation lists of targets
pub struct OperationChain {
    workspace: Arc<dyn Workspace>,
    executors: Arc<OperationExecutors>,
}

impl OperationChain {
    /// Create a chain runner for a workspace
    pub fn new(workspace: Arc<dyn Workspace>, executors: Arc<OperationExecutors>) -> Self {
        Self {
            workspace,
            executors,
        }
    }

    /// Run the operations a target lists for `event`.
    ///
    /// Returns `Ok(true)` when the chain ran to its end and `Ok(false)` when
    /// an executor aborted or the workspace started finalizing. Operations
    /// that are blank, filtered out by their condition or of an unknown type
    /// are skipped. Executor errors stop the chain and are returned.
    pub async fn execute_operations(&self, target: &Arc<Target>, event: DeployEvent) -> Result<bool> {
        let run_id = Uuid::new_v4();
        let values = target.operations_for(event);
        debug!(
            "Chain {} for '{}': {} operation(s) on {}",
            run_id,
            target.normalized_name(),
            values.len(),
            event.as_str()
        );

        let mut previous: Option<Arc<OperationContext>> = None;

        for (position, value) in values.iter().enumerate() {
            if self.workspace.is_finalizing() {
                info!("Chain {} stopped: workspace is finalizing", run_id);
                return Ok(false);
            }

            let Some(operation) = value.normalize() else {
                debug!("Chain {}: operation #{} is blank, skipped", run_id, position);
                continue;
            };

            let Some(operation) =
                filter_conditional_items([operation], |c| self.workspace.check_condition(c)).pop()
            else {
                debug!("Chain {}: operation #{} filtered by condition", run_id, position);
                continue;
            };

            let op_type = OperationExecutors::key(&operation.op_type);
            let Some(executor) = self.executors.resolve(&op_type) else {
                debug!(
                    "Chain {}: no executor for operation type '{}', skipped",
                    run_id, op_type
                );
                continue;
            };

            let context = Arc::new(OperationContext {
                event,
                operation,
                previous: previous.take(),
                target: Arc::clone(target),
                op_type,
                args: Vec::new(),
            });
            previous = Some(Arc::clone(&context));

            debug!(
                "Chain {}: running '{}' operation #{}",
                run_id, context.op_type, position
            );
            let result = executor.execute(context).await?;

            if !result.should_continue() {
                info!(
                    "Chain {} aborted by operation #{} of '{}'",
                    run_id,
                    position,
                    target.normalized_name()
                );
                return Ok(false);
            }
        }

        Ok(true)
    }
}

/// Pauses the chain for the `time` option in milliseconds
#[derive(Debug, Clone)]
pub struct WaitExecutor {
    default_time: Duration,
    max_time: Duration,
}

impl WaitExecutor {
    /// Create a wait executor capped at `max_time`
    pub fn new(max_time: Duration) -> Self {
        Self {
            default_time: Duration::from_secs(1),
            max_time,
        }
    }
}

impl Default for WaitExecutor {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

#[async_trait]
impl OperationExecutor for WaitExecutor {
    async fn execute(&self, context: Arc<OperationContext>) -> Result<OperationResult> {
        let requested = context
            .operation
            .option("time")
            .and_then(|v| v.as_u64())
            .map_or(self.default_time, Duration::from_millis);
        let time = requested.min(self.max_time);

        debug!("Waiting {:?} before the next operation", time);
        tokio::time::sleep(time).await;
        Ok(OperationResult::Continue)
    }
}
