//! Catalog of compiled-in extension factories.
//!
//! Manifests in the plugin directory refer to factories by name; the catalog
//! is the typed table those names resolve against.

use std::collections::BTreeMap;
use std::sync::Arc;

use notegraph_core::traits::LinkGraphSource;

use crate::extension::Extension;

/// Host services handed to every extension factory.
#[derive(Debug, Clone)]
pub struct HostServices {
    /// Link graph of the note collection.
    pub link_graph: Arc<dyn LinkGraphSource>,
}

/// Everything a factory needs to build an instance.
#[derive(Debug, Clone)]
pub struct ExtensionContext {
    /// Id the instance will be registered under.
    pub id: String,
    /// The manifest's `[settings]` table.
    pub settings: serde_json::Value,
    /// Host services.
    pub services: HostServices,
}

/// Builds an extension instance.
pub type ExtensionFactory =
    Arc<dyn Fn(&ExtensionContext) -> Result<Arc<dyn Extension>, String> + Send + Sync>;

/// Named extension factories.
#[derive(Clone, Default)]
pub struct ExtensionCatalog {
    factories: BTreeMap<String, ExtensionFactory>,
}

impl std::fmt::Debug for ExtensionCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionCatalog")
            .field("factories", &self.names())
            .finish()
    }
}

impl ExtensionCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&ExtensionContext) -> Result<Arc<dyn Extension>, String> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    /// Looks up a factory.
    pub fn get(&self, name: &str) -> Option<ExtensionFactory> {
        self.factories.get(name).cloned()
    }

    /// Registered factory names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}
