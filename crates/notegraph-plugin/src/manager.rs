//! Plugin manager — lifecycle management for all extensions.
//!
//! Owns the registry, dispatcher, mount table, asset aggregator and state
//! store. Every lifecycle mutation (bootstrap, toggle, reload, rescan) runs
//! under one async mutex; hook dispatch and route lookup never take it.

use std::sync::Arc;

use axum::extract::Request;
use axum::response::Response;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use notegraph_core::config::PluginConfig;
use notegraph_core::error::AppError;
use notegraph_core::result::AppResult;

use crate::assets::{AssetAggregator, CombinedAssets};
use crate::catalog::{ExtensionCatalog, HostServices};
use crate::hooks::definitions::{MutatingHook, ObservingEvent};
use crate::hooks::dispatcher::HookDispatcher;
use crate::loader::ExtensionLoader;
use crate::registry::{ActiveExtension, ExtensionDescriptor, ExtensionRegistry, ExtensionSummary};
use crate::routes::mount::{MountedRoute, RouteMountManager};
use crate::state::{StateMap, StateStore};

/// Coordinates discovery, state, hooks, routes and assets.
#[derive(Debug)]
pub struct PluginManager {
    registry: Arc<ExtensionRegistry>,
    dispatcher: Arc<HookDispatcher>,
    mounts: Arc<RouteMountManager>,
    assets: Arc<AssetAggregator>,
    state: Arc<StateStore>,
    loader: ExtensionLoader,
    lifecycle: Mutex<()>,
}

impl PluginManager {
    /// Creates a manager. Nothing is discovered until [`Self::bootstrap`].
    pub fn new(config: &PluginConfig, catalog: ExtensionCatalog, services: HostServices) -> Self {
        let registry = Arc::new(ExtensionRegistry::new());
        let dispatcher = Arc::new(HookDispatcher::new(
            Arc::clone(&registry),
            config.hook_timeout(),
        ));

        Self {
            registry,
            dispatcher,
            mounts: Arc::new(RouteMountManager::new()),
            assets: Arc::new(AssetAggregator::new()),
            state: Arc::new(StateStore::new(&config.state_file)),
            loader: ExtensionLoader::new(&config.directory, Arc::new(catalog), services),
            lifecycle: Mutex::new(()),
        }
    }

    /// Discovers extensions, applies persisted state, fires the startup hook
    /// and mounts routes.
    pub async fn bootstrap(&self) -> AppResult<()> {
        let _guard = self.lifecycle.lock().await;
        let descriptors = self.loader.discover().await;
        let added = self.admit(descriptors).await?;

        info!(
            extensions = self.registry.count().await,
            activated = added.iter().filter(|s| s.enabled).count(),
            "Extension runtime ready"
        );
        Ok(())
    }

    /// Re-scans the plugin directory and registers manifests not seen
    /// before. Returns the newly registered extensions.
    pub async fn rescan(&self) -> AppResult<Vec<ExtensionSummary>> {
        let _guard = self.lifecycle.lock().await;

        let mut fresh = Vec::new();
        for path in self.loader.manifest_paths().await {
            let id = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            if !self.registry.contains(&id).await {
                fresh.push(self.loader.load(&path).await);
            }
        }

        let added = self.admit(fresh).await?;
        info!(added = added.len(), "Extension rescan complete");
        Ok(added)
    }

    /// Enables or disables an extension without restarting the host.
    pub async fn set_enabled(&self, id: &str, enabled: bool) -> AppResult<ExtensionSummary> {
        let _guard = self.lifecycle.lock().await;

        let descriptor = self
            .registry
            .get(id)
            .await
            .ok_or_else(|| AppError::not_found(format!("Extension '{id}' not found")))?;
        if enabled && !descriptor.is_loadable() {
            return Err(AppError::conflict(format!(
                "Extension '{id}' failed to load and cannot be enabled"
            )));
        }

        let was_enabled = self.registry.set_enabled(id, enabled).await?;

        if enabled {
            if let Some(instance) = &descriptor.instance {
                if let Err(e) = self.mounts.mount(id, instance).await {
                    self.fail(id, &e).await;
                    return Err(e);
                }
                if !was_enabled {
                    self.fire_startup(id, instance).await;
                }
            }
        } else {
            self.mounts.unmount(id).await;
        }
        self.assets.invalidate();
        // Persisted only once the routes reflect the new flag.
        self.state.set(id, enabled).await?;

        info!(plugin_id = %id, enabled, "Extension toggled");
        self.summary(id).await
    }

    /// Re-reads an extension's manifest, rebuilds its instance and swaps its
    /// routes. The extension keeps its position and persisted state.
    pub async fn reload(&self, id: &str) -> AppResult<ExtensionSummary> {
        let _guard = self.lifecycle.lock().await;

        if !self.registry.contains(id).await {
            return Err(AppError::not_found(format!("Extension '{id}' not found")));
        }

        let mut descriptor = self.loader.load(&self.loader.manifest_path(id)).await;
        if let Some(error) = descriptor.load_error.clone() {
            self.registry.replace(descriptor).await?;
            self.mounts.unmount(id).await;
            self.assets.invalidate();
            return Err(AppError::conflict(format!(
                "Extension '{id}' failed to reload: {error}"
            )));
        }

        let state = self.load_state().await;
        if let Some(&enabled) = state.get(id) {
            descriptor.enabled = enabled;
        }
        let instance = descriptor.instance.clone();
        let enabled = descriptor.enabled;
        let was_enabled = self.registry.replace(descriptor).await?;

        match instance.filter(|_| enabled) {
            Some(instance) => {
                if let Err(e) = self.mounts.remount(id, &instance).await {
                    self.fail(id, &e).await;
                    return Err(e);
                }
                if !was_enabled {
                    self.fire_startup(id, &instance).await;
                }
            }
            None => {
                self.mounts.unmount(id).await;
            }
        }
        self.assets.invalidate();

        info!(plugin_id = %id, enabled, "Extension reloaded");
        self.summary(id).await
    }

    /// All extensions in discovery order.
    pub async fn list(&self) -> Vec<ExtensionSummary> {
        self.registry.list().await
    }

    /// One extension's summary.
    pub async fn summary(&self, id: &str) -> AppResult<ExtensionSummary> {
        self.registry
            .get(id)
            .await
            .map(|d| d.summary())
            .ok_or_else(|| AppError::not_found(format!("Extension '{id}' not found")))
    }

    /// Runs a mutating hook pipeline.
    pub async fn pipe(&self, hook: MutatingHook, path: &str, content: String) -> String {
        self.dispatcher.pipe(hook, path, content).await
    }

    /// Delivers an observing event.
    pub async fn notify(&self, event: &ObservingEvent) {
        self.dispatcher.notify(event).await;
    }

    /// Combined assets of the enabled extensions.
    pub async fn assets(&self) -> Arc<CombinedAssets> {
        self.assets.collect(&self.registry).await
    }

    /// Routes currently mounted.
    pub fn routes(&self) -> Vec<MountedRoute> {
        self.mounts.routes()
    }

    /// Dispatches a request to an extension's mounted routes.
    pub async fn dispatch_route(&self, id: &str, request: Request) -> Response {
        self.mounts.dispatch(id, request).await
    }

    /// The extension registry.
    pub fn registry(&self) -> &Arc<ExtensionRegistry> {
        &self.registry
    }

    /// The hook dispatcher.
    pub fn dispatcher(&self) -> &Arc<HookDispatcher> {
        &self.dispatcher
    }

    /// Registers new descriptors, applies persisted state, then fires the
    /// startup hook and mounts routes for the enabled ones.
    async fn admit(&self, descriptors: Vec<ExtensionDescriptor>) -> AppResult<Vec<ExtensionSummary>> {
        let state = self.load_state().await;

        let mut admitted = Vec::with_capacity(descriptors.len());
        for mut descriptor in descriptors {
            if descriptor.is_loadable() {
                if let Some(&enabled) = state.get(&descriptor.id) {
                    descriptor.enabled = enabled;
                }
            }
            let id = descriptor.id.clone();
            if let Err(e) = self.registry.register(descriptor).await {
                warn!(plugin_id = %id, error = %e, "Skipping extension");
                continue;
            }
            admitted.push(id);
        }

        for id in &admitted {
            let Some(descriptor) = self.registry.get(id).await else {
                continue;
            };
            let Some(instance) = descriptor.instance.filter(|_| descriptor.enabled) else {
                continue;
            };
            self.fire_startup(id, &instance).await;
            if let Err(e) = self.mounts.mount(id, &instance).await {
                self.fail(id, &e).await;
            }
        }
        self.assets.invalidate();

        let mut summaries = Vec::with_capacity(admitted.len());
        for id in &admitted {
            summaries.push(self.summary(id).await?);
        }
        Ok(summaries)
    }

    async fn load_state(&self) -> StateMap {
        match self.state.load().await {
            Ok(state) => state,
            Err(e) => {
                warn!(
                    path = %self.state.path().display(),
                    error = %e,
                    "Plugin state unreadable, using manifest defaults"
                );
                StateMap::new()
            }
        }
    }

    async fn fire_startup(&self, id: &str, instance: &Arc<dyn crate::extension::Extension>) {
        let active = ActiveExtension {
            id: id.to_string(),
            instance: Arc::clone(instance),
        };
        self.dispatcher
            .notify_extension(&active, &ObservingEvent::Startup)
            .await;
    }

    async fn fail(&self, id: &str, e: &AppError) {
        error!(plugin_id = %id, error = %e, "Extension routes could not be mounted");
        self.registry.mark_failed(id, e.message.clone()).await;
        self.assets.invalidate();
    }
}
