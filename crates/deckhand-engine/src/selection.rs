//! Interactive target selection

use crate::targets::target_choice;
use deckhand_types::{Result, Target, UserInterface, Workspace};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Let the user pick one of `targets` and run `action` with it.
///
/// With a single target the prompt is skipped. Without targets the user is
/// warned and `fallback` is returned; the same happens when the prompt is
/// dismissed. The action receives the chosen target and its 1-based
/// position in the configured target list.
pub async fn select_and_run<T, F, Fut>(
    workspace: &dyn Workspace,
    ui: &dyn UserInterface,
    targets: &[Arc<Target>],
    placeholder: Option<&str>,
    action: F,
    fallback: T,
) -> Result<T>
where
    F: FnOnce(Arc<Target>, usize) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let chosen = match targets {
        [] => {
            warn!("No target available to choose from");
            ui.show_warning(&workspace.translate("targets.noneDefined", &[]))
                .await;
            return Ok(fallback);
        }
        [only] => Arc::clone(only),
        _ => {
            let items: Vec<_> = targets
                .iter()
                .map(|t| target_choice(t, workspace))
                .collect();
            let placeholder = placeholder
                .map(str::to_string)
                .unwrap_or_else(|| workspace.translate("targets.select", &[]));

            match ui.show_choice(&items, &placeholder).await? {
                Some(index) if index < targets.len() => Arc::clone(&targets[index]),
                Some(index) => {
                    warn!("Prompt returned out of range choice {}", index);
                    return Ok(fallback);
                }
                None => {
                    debug!("Target selection dismissed");
                    return Ok(fallback);
                }
            }
        }
    };

    let position = chosen.index + 1;
    action(chosen, position).await
}
