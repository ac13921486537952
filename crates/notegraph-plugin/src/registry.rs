//! Extension registry: one descriptor per discovered manifest, in discovery order.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use notegraph_core::error::AppError;
use notegraph_core::result::AppResult;

use crate::extension::Extension;
use crate::isolation::contain_panic;

/// In-memory record of one discovered extension.
#[derive(Debug, Clone)]
pub struct ExtensionDescriptor {
    /// Unique id, the manifest file stem.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Version string.
    pub version: String,
    /// Description.
    pub description: String,
    /// Whether hooks, routes and assets are active.
    pub enabled: bool,
    /// Why the extension could not be loaded or mounted.
    pub load_error: Option<String>,
    /// The loaded instance, absent when loading failed.
    pub instance: Option<Arc<dyn Extension>>,
}

impl ExtensionDescriptor {
    /// A descriptor for an extension that failed to load.
    pub fn failed(id: impl Into<String>, error: impl ToString) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            version: String::new(),
            description: String::new(),
            enabled: false,
            load_error: Some(error.to_string()),
            instance: None,
        }
    }

    /// Whether the descriptor can be enabled.
    pub fn is_loadable(&self) -> bool {
        self.load_error.is_none() && self.instance.is_some()
    }

    /// Serializable view of the descriptor.
    pub fn summary(&self) -> ExtensionSummary {
        let capabilities = self.instance.as_ref().and_then(|ext| {
            contain_panic(&self.id, "capabilities", || {
                (
                    ext.hooks()
                        .iter()
                        .map(|h| h.as_str().to_string())
                        .collect::<Vec<_>>(),
                    ext.has_routes(),
                    ext.has_assets(),
                )
            })
        });
        let (hooks, has_routes, has_assets) = capabilities.unwrap_or((Vec::new(), false, false));
        ExtensionSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            version: self.version.clone(),
            description: self.description.clone(),
            enabled: self.enabled,
            hooks,
            has_routes,
            has_assets,
            load_error: self.load_error.clone(),
        }
    }
}

/// Listing entry returned by the plugin admin API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtensionSummary {
    /// Extension id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Version string.
    pub version: String,
    /// Description.
    pub description: String,
    /// Enabled flag.
    pub enabled: bool,
    /// Declared hook names.
    pub hooks: Vec<String>,
    /// Whether the extension registers routes.
    pub has_routes: bool,
    /// Whether the extension injects assets.
    pub has_assets: bool,
    /// Load or mount failure, if any.
    pub load_error: Option<String>,
}

/// An enabled extension captured in a dispatch snapshot.
#[derive(Debug, Clone)]
pub struct ActiveExtension {
    /// Extension id.
    pub id: String,
    /// Loaded instance.
    pub instance: Arc<dyn Extension>,
}

/// Registry of every discovered extension.
#[derive(Debug, Default)]
pub struct ExtensionRegistry {
    entries: RwLock<Vec<ExtensionDescriptor>>,
}

impl ExtensionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a descriptor. Ids must be unique.
    pub async fn register(&self, descriptor: ExtensionDescriptor) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        if entries.iter().any(|d| d.id == descriptor.id) {
            return Err(AppError::conflict(format!(
                "Extension '{}' is already registered",
                descriptor.id
            )));
        }

        match &descriptor.load_error {
            None => info!(
                plugin_id = %descriptor.id,
                name = %descriptor.name,
                version = %descriptor.version,
                enabled = descriptor.enabled,
                "Registering extension"
            ),
            Some(error) => warn!(
                plugin_id = %descriptor.id,
                error = %error,
                "Registering extension that failed to load"
            ),
        }

        entries.push(descriptor);
        Ok(())
    }

    /// All descriptors as summaries, in discovery order.
    pub async fn list(&self) -> Vec<ExtensionSummary> {
        let entries = self.entries.read().await;
        entries.iter().map(ExtensionDescriptor::summary).collect()
    }

    /// Looks up a descriptor by id.
    pub async fn get(&self, id: &str) -> Option<ExtensionDescriptor> {
        let entries = self.entries.read().await;
        entries.iter().find(|d| d.id == id).cloned()
    }

    /// Whether an extension with this id is registered.
    pub async fn contains(&self, id: &str) -> bool {
        let entries = self.entries.read().await;
        entries.iter().any(|d| d.id == id)
    }

    /// Number of registered extensions.
    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Updates the enabled flag and returns the previous value.
    pub async fn set_enabled(&self, id: &str, enabled: bool) -> AppResult<bool> {
        let mut entries = self.entries.write().await;
        let descriptor = entries
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| AppError::not_found(format!("Extension '{id}' not found")))?;

        if enabled && !descriptor.is_loadable() {
            return Err(AppError::conflict(format!(
                "Extension '{id}' failed to load and cannot be enabled"
            )));
        }

        let previous = descriptor.enabled;
        descriptor.enabled = enabled;
        Ok(previous)
    }

    /// Replaces a descriptor in place and returns the previous enabled flag.
    pub async fn replace(&self, descriptor: ExtensionDescriptor) -> AppResult<bool> {
        let mut entries = self.entries.write().await;
        let slot = entries
            .iter_mut()
            .find(|d| d.id == descriptor.id)
            .ok_or_else(|| {
                AppError::not_found(format!("Extension '{}' not found", descriptor.id))
            })?;
        let previous = slot.enabled;
        *slot = descriptor;
        Ok(previous)
    }

    /// Records a failure and disables the extension. The instance is kept.
    pub async fn mark_failed(&self, id: &str, error: impl Into<String>) {
        let mut entries = self.entries.write().await;
        if let Some(descriptor) = entries.iter_mut().find(|d| d.id == id) {
            let error = error.into();
            warn!(plugin_id = %id, error = %error, "Extension marked as failed");
            descriptor.enabled = false;
            descriptor.load_error = Some(error);
        }
    }

    /// Snapshot of the enabled extensions, in discovery order.
    pub async fn enabled_extensions(&self) -> Vec<ActiveExtension> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|d| d.enabled)
            .filter_map(|d| {
                d.instance.as_ref().map(|instance| ActiveExtension {
                    id: d.id.clone(),
                    instance: Arc::clone(instance),
                })
            })
            .collect()
    }
}
