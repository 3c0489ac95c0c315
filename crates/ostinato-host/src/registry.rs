//! Plugin class registry.
//!
//! In-memory mapping from plugin identifier to constructor plus metadata.
//! Registering over an existing id replaces the class (this is what hot
//! reload leans on); instances created from the old class keep working
//! because they hold the class pieces captured at creation time.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use ostinato_core::AudioContext;

use crate::abi::AudioPlugin;
use crate::error::{HostError, Result};
use crate::metadata::PluginMetadata;
use crate::units;

/// Closure that constructs a plugin instance against the shared context.
pub type PluginConstructor =
    Arc<dyn Fn(&Arc<AudioContext>) -> Result<Box<dyn AudioPlugin>> + Send + Sync>;

/// A registered plugin class: constructor, metadata, and (for dynamically
/// loaded plugins) a keepalive handle on the backing library.
#[derive(Clone)]
pub struct PluginClass {
    pub constructor: PluginConstructor,
    pub metadata: PluginMetadata,
    /// Keeps dynamically loaded code mapped while the class or any instance
    /// created from it is alive. `None` for built-ins.
    pub artifact: Option<Arc<dyn Any + Send + Sync>>,
}

impl PluginClass {
    pub fn new<F>(metadata: PluginMetadata, constructor: F) -> Self
    where
        F: Fn(&Arc<AudioContext>) -> Result<Box<dyn AudioPlugin>> + Send + Sync + 'static,
    {
        Self {
            constructor: Arc::new(constructor),
            metadata,
            artifact: None,
        }
    }

    pub fn with_artifact(mut self, artifact: Arc<dyn Any + Send + Sync>) -> Self {
        self.artifact = Some(artifact);
        self
    }
}

impl fmt::Debug for PluginClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginClass")
            .field("metadata", &self.metadata)
            .field("artifact", &self.artifact.as_ref().map(|_| "<artifact>"))
            .finish_non_exhaustive()
    }
}

/// Registry of plugin classes.
pub struct PluginRegistry {
    classes: Arc<RwLock<HashMap<String, PluginClass>>>,
}

impl PluginRegistry {
    /// Create an empty registry (no built-ins).
    pub fn empty() -> Self {
        Self {
            classes: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a class. Replaces any previous class under the same id;
    /// existing instances of the old class are unaffected.
    pub fn register_class(&self, id: impl Into<String>, class: PluginClass) {
        let id = id.into();
        let replaced = self.classes.write().insert(id.clone(), class).is_some();
        if replaced {
            tracing::info!(plugin = %id, "replaced plugin class");
        } else {
            tracing::info!(plugin = %id, "registered plugin class");
        }
    }

    /// Convenience for registering a constructor with metadata.
    pub fn register<F>(&self, id: impl Into<String>, metadata: PluginMetadata, constructor: F)
    where
        F: Fn(&Arc<AudioContext>) -> Result<Box<dyn AudioPlugin>> + Send + Sync + 'static,
    {
        self.register_class(id, PluginClass::new(metadata, constructor));
    }

    /// Remove a class. Existing instances remain functional until destroyed.
    pub fn unregister_class(&self, id: &str) -> bool {
        let removed = self.classes.write().remove(id).is_some();
        if removed {
            tracing::info!(plugin = %id, "unregistered plugin class");
        }
        removed
    }

    /// Resolve a class or fail with *unknown-plugin*.
    pub fn class(&self, id: &str) -> Result<PluginClass> {
        self.classes
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| HostError::UnknownPlugin(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.classes.read().contains_key(id)
    }

    /// Every registered `(id, metadata)` pair, sorted by id.
    pub fn list(&self) -> Vec<(String, PluginMetadata)> {
        let mut entries: Vec<_> = self
            .classes
            .read()
            .iter()
            .map(|(id, class)| (id.clone(), class.metadata.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Metadata for an id. Registered classes answer with their own
    /// metadata; known built-in ids answer from the built-in table even when
    /// unregistered; anything else gets a stub. Never fails.
    pub fn metadata(&self, id: &str) -> PluginMetadata {
        if let Some(class) = self.classes.read().get(id) {
            return class.metadata.clone();
        }
        units::builtin_metadata(id).unwrap_or_else(|| PluginMetadata::stub(id))
    }
}

impl Default for PluginRegistry {
    /// A registry with the built-in units registered.
    fn default() -> Self {
        let registry = Self::empty();
        units::register_builtin_plugins(&registry);
        registry
    }
}

impl Clone for PluginRegistry {
    fn clone(&self) -> Self {
        Self {
            classes: Arc::clone(&self.classes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Category, PluginKind};

    fn failing_class(marker: &'static str) -> PluginClass {
        PluginClass::new(PluginMetadata::new(marker), move |_ctx| {
            Err(HostError::PluginInternal(marker.into()))
        })
    }

    #[test]
    fn test_builtins_registered_by_default() {
        let registry = PluginRegistry::default();
        for id in ["log-drum", "clap-808", "shimmer-reverb", "amapiano-bass"] {
            assert!(registry.contains(id), "missing built-in {id}");
        }

        let listed = registry.list();
        assert_eq!(listed.len(), 4);
        // Sorted by id.
        assert_eq!(listed[0].0, "amapiano-bass");
    }

    #[test]
    fn test_unknown_class_fails() {
        let registry = PluginRegistry::empty();
        match registry.class("nope") {
            Err(HostError::UnknownPlugin(id)) => assert_eq!(id, "nope"),
            other => panic!("expected UnknownPlugin, got {other:?}"),
        }
    }

    #[test]
    fn test_register_replaces() {
        let registry = PluginRegistry::empty();
        registry.register_class("x", failing_class("first"));
        registry.register_class("x", failing_class("second"));

        assert_eq!(registry.class("x").unwrap().metadata.name, "second");
    }

    #[test]
    fn test_unregister() {
        let registry = PluginRegistry::empty();
        registry.register_class("x", failing_class("x"));

        assert!(registry.unregister_class("x"));
        assert!(!registry.unregister_class("x"));
        assert!(registry.class("x").is_err());
    }

    #[test]
    fn test_metadata_fallbacks() {
        let registry = PluginRegistry::empty();

        // Built-in table answers even when unregistered.
        let meta = registry.metadata("log-drum");
        assert_eq!(meta.category, Category::Percussion);
        assert_eq!(meta.kind, PluginKind::Instrument);

        // Unknown ids synthesise a stub.
        let stub = registry.metadata("mystery");
        assert_eq!(stub.name, "mystery");
        assert_eq!(stub.category, Category::Unknown);
    }

    #[test]
    fn test_shared_clone() {
        let registry = PluginRegistry::empty();
        let other = registry.clone();
        registry.register_class("x", failing_class("x"));
        assert!(other.contains("x"));
    }
}
