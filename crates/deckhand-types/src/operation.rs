//! Execution contexts for target operation chains

use crate::{DeployEvent, Target, TargetOperation};
use std::sync::Arc;

/// Tri-state answer of an operation executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperationResult {
    /// The executor has no opinion; the chain continues
    #[default]
    NoOpinion,
    /// Continue with the next operation
    Continue,
    /// Abort the remainder of the chain
    Abort,
}

impl OperationResult {
    /// Whether the chain may go on after this result
    pub fn should_continue(self) -> bool {
        !matches!(self, Self::Abort)
    }
}

impl From<Option<bool>> for OperationResult {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => Self::NoOpinion,
            Some(true) => Self::Continue,
            Some(false) => Self::Abort,
        }
    }
}

impl From<bool> for OperationResult {
    fn from(value: bool) -> Self {
        Some(value).into()
    }
}

/// Immutable record describing one operation invocation.
///
/// Contexts of one chain run are linked through [`previous`](Self::previous),
/// newest first, so an executor can inspect everything that ran before it.
#[derive(Debug, Clone)]
pub struct OperationContext {
    /// Lifecycle event the chain runs for
    pub event: DeployEvent,
    /// The (desugared) operation being run
    pub operation: TargetOperation,
    /// Context of the operation that ran before this one
    pub previous: Option<Arc<OperationContext>>,
    /// Target owning the chain
    pub target: Arc<Target>,
    /// Normalized operation type
    pub op_type: String,
    /// Executor specific parameters
    pub args: Vec<String>,
}

impl OperationContext {
    /// Iterate over earlier contexts, most recent first
    pub fn history(&self) -> impl Iterator<Item = &OperationContext> {
        std::iter::successors(self.previous.as_deref(), |ctx| ctx.previous.as_deref())
    }

    /// Zero-based position of this operation among the executed ones
    pub fn position(&self) -> usize {
        self.history().count()
    }
}
