//! Target naming and lookup helpers

use deckhand_types::{normalize_string, ChoiceItem, Target, Workspace};
use std::sync::Arc;

/// Display name of a target.
///
/// Falls back to the translated default name with the 1-based position when
/// the configured name is blank.
pub fn target_name(target: &Target, workspace: &dyn Workspace) -> String {
    match target.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => workspace.translate("targets.defaultName", &[(target.index + 1).to_string()]),
    }
}

/// Targets whose normalized name matches one of `names`.
///
/// Order follows `targets`; every target appears at most once even when it
/// is matched by several names. Duplicate target names are all returned.
pub fn find_targets_by_name<S: AsRef<str>>(targets: &[Arc<Target>], names: &[S]) -> Vec<Arc<Target>> {
    let wanted: Vec<String> = names
        .iter()
        .map(|n| normalize_string(n.as_ref()))
        .filter(|n| !n.is_empty())
        .collect();

    targets
        .iter()
        .filter(|t| wanted.contains(&t.normalized_name()))
        .cloned()
        .collect()
}

/// Names among `names` that do not match any target
pub fn unknown_target_names<S: AsRef<str>>(targets: &[Arc<Target>], names: &[S]) -> Vec<String> {
    names
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| {
            let normalized = normalize_string(name);
            !targets.iter().any(|t| t.normalized_name() == normalized)
        })
        .map(str::to_string)
        .collect()
}

/// Choice entry shown when the user picks a target
pub fn target_choice(target: &Target, workspace: &dyn Workspace) -> ChoiceItem {
    ChoiceItem {
        label: target_name(target, workspace),
        description: target
            .description
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        detail: workspace.root_path().display().to_string(),
    }
}
