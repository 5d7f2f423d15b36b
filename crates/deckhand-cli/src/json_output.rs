//! JSON output structures for the deckhand CLI

use deckhand_engine::target_name;
use deckhand_types::{Target, Workspace};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Target listing in JSON format
#[derive(Debug, Serialize, Deserialize)]
pub struct TargetsJson {
    /// deckhand version
    pub version: String,
    /// Workspace root
    pub workspace: String,
    /// Configured targets
    pub targets: Vec<TargetJson>,
}

/// One target in JSON format
#[derive(Debug, Serialize, Deserialize)]
pub struct TargetJson {
    /// 1-based position in the configuration
    pub position: usize,
    /// Display name
    pub name: String,
    /// Effective type
    pub target_type: String,
    /// Description, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the target's condition holds
    pub active: bool,
    /// Number of before-deploy operations
    pub before_deploy: usize,
    /// Number of after-deployed operations
    pub deployed: usize,
}

impl TargetsJson {
    /// Build the listing for a workspace
    pub fn new(workspace: &dyn Workspace, targets: &[Arc<Target>], active: &[Arc<Target>]) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            workspace: workspace.root_path().display().to_string(),
            targets: targets
                .iter()
                .map(|target| TargetJson {
                    position: target.index + 1,
                    name: target_name(target, workspace),
                    target_type: target.type_or_default(),
                    description: target.description.clone(),
                    active: active.iter().any(|a| a.index == target.index),
                    before_deploy: target
                        .operations_for(deckhand_types::DeployEvent::BeforeDeploy)
                        .len(),
                    deployed: target
                        .operations_for(deckhand_types::DeployEvent::AfterDeployed)
                        .len(),
                })
                .collect(),
        }
    }

    /// Render as pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::ConsoleSink;
    use crate::workspace::LocalWorkspace;
    use std::path::PathBuf;

    #[test]
    fn test_targets_json() {
        let root = PathBuf::from("/srv/project");
        let id = LocalWorkspace::id_for(&root);
        let targets = vec![
            Arc::new(
                Target::new("Prod", "")
                    .with_index(0)
                    .with_workspace(id.clone())
                    .with_deployed(["index.html"]),
            ),
            Arc::new(Target::default().with_index(1).with_workspace(id)),
        ];
        let workspace = LocalWorkspace::new(root, targets.clone(), Box::new(ConsoleSink::new(true)));

        let listing = TargetsJson::new(&workspace, &targets, &targets[..1]);
        assert_eq!(listing.targets.len(), 2);
        assert_eq!(listing.targets[0].target_type, "local");
        assert_eq!(listing.targets[0].deployed, 1);
        assert!(listing.targets[0].active);
        assert_eq!(listing.targets[1].name, "Target #2");
        assert!(!listing.targets[1].active);

        let json = listing.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["targets"][0]["name"], "Prod");
        assert!(value["targets"][1].get("description").is_none());
    }
}
