//! `open` operation executor

use async_trait::async_trait;
use deckhand_types::{
    Error, OperationContext, OperationExecutor, OperationResult, Result, OPEN_OPERATION_TYPE,
};
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info};

/// Opens the operation's target with the system opener
#[derive(Debug, Clone, Default)]
pub struct OpenExecutor {
    command: Option<String>,
}

impl OpenExecutor {
    /// Use `command` instead of the platform opener when set
    pub fn new(command: Option<String>) -> Self {
        Self {
            command: command.filter(|c| !c.trim().is_empty()),
        }
    }

    /// Program and leading arguments used to open `target`
    fn command_line(&self, target: &str) -> (String, Vec<String>) {
        if let Some(command) = &self.command {
            let mut parts = command.split_whitespace().map(str::to_string);
            let program = parts.next().unwrap_or_default();
            let mut args: Vec<String> = parts.collect();
            args.push(target.to_string());
            return (program, args);
        }

        if cfg!(target_os = "windows") {
            (
                "cmd".to_string(),
                vec!["/C".to_string(), "start".to_string(), String::new(), target.to_string()],
            )
        } else if cfg!(target_os = "macos") {
            ("open".to_string(), vec![target.to_string()])
        } else {
            ("xdg-open".to_string(), vec![target.to_string()])
        }
    }
}

#[async_trait]
impl OperationExecutor for OpenExecutor {
    async fn execute(&self, context: Arc<OperationContext>) -> Result<OperationResult> {
        let target = context
            .operation
            .target
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::operation(OPEN_OPERATION_TYPE, "Nothing to open"))?;

        let (program, args) = self.command_line(target);
        debug!("Running {} {:?}", program, args);

        let status = Command::new(&program)
            .args(&args)
            .status()
            .await
            .map_err(|e| Error::operation(OPEN_OPERATION_TYPE, format!("{}: {}", program, e)))?;

        if !status.success() {
            return Err(Error::operation(
                OPEN_OPERATION_TYPE,
                format!("'{}' exited with {}", program, status),
            ));
        }

        info!("Opened '{}'", target);
        Ok(OperationResult::NoOpinion)
    }
}
