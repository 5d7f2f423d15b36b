//! Plugin registry and capability resolution

use deckhand_types::{normalize_string, Target, TransferDirection, TransferPlugin};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Ordered set of registered transfer plugins
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn TransferPlugin>>,
}

impl PluginRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin; registration order is resolution order
    pub fn register(&mut self, plugin: Arc<dyn TransferPlugin>) -> &mut Self {
        self.plugins.push(plugin);
        self
    }

    /// Builder style [`register`](Self::register)
    pub fn with_plugin(mut self, plugin: Arc<dyn TransferPlugin>) -> Self {
        self.register(plugin);
        self
    }

    /// Number of registered plugins
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether no plugin is registered
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Registered plugins in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn TransferPlugin>> {
        self.plugins.iter()
    }

    /// Plugins that should handle a transfer for the target.
    ///
    /// A plugin matches when its normalized type equals the target's and it
    /// provides the direction's capability, or when its type is empty. Empty
    /// typed plugins match every target regardless of capability. Targets
    /// without a type are matched as
    /// [`DEFAULT_TARGET_TYPE`](deckhand_types::DEFAULT_TARGET_TYPE).
    pub fn resolve(&self, target: &Target, direction: TransferDirection) -> Vec<Arc<dyn TransferPlugin>> {
        let target_type = target.type_or_default();

        let matching: Vec<_> = self
            .plugins
            .iter()
            .filter(|plugin| {
                let plugin_type = normalize_string(plugin.plugin_type());
                plugin_type.is_empty()
                    || (plugin_type == target_type && plugin.supports(direction))
            })
            .cloned()
            .collect();

        debug!(
            "Resolved {} of {} plugins for target type '{}' ({})",
            matching.len(),
            self.plugins.len(),
            target_type,
            direction
        );
        matching
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.plugins.iter().map(|p| p.plugin_type()))
            .finish()
    }
}
