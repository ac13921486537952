//! Route mount manager.
//!
//! The live route table is an immutable snapshot behind an `Arc`. Every
//! mutation clones the table, edits the copy and swaps the pointer while
//! holding the mutation mutex, so a request dispatched concurrently sees
//! either the old table or the new one and never a half-mounted extension.

use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::Router;
use axum::extract::{FromRequestParts, Path, Query, Request};
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodFilter, on};
use futures::FutureExt;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower::ServiceExt;
use tracing::{debug, info};

use notegraph_core::error::AppError;
use notegraph_core::result::AppResult;

use crate::extension::Extension;
use crate::isolation::contain_panic;
use crate::routes::binding::{RouteBinding, RouteHandler, RouteRequest};

/// Prefix every extension route is mounted under.
pub const ROUTE_PREFIX: &str = "/api/plugins";

/// Suffixes the host serves itself for every extension id.
const RESERVED_SUFFIXES: [&str; 2] = ["toggle", "reload"];

/// Largest request body forwarded to an extension handler.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// One mounted route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountedRoute {
    /// Owning extension.
    pub extension_id: String,
    /// HTTP method.
    pub method: String,
    /// Full path including the namespace.
    pub path: String,
}

#[derive(Clone)]
struct MountedExtension {
    id: String,
    routes: Vec<MountedRoute>,
    router: Router,
}

#[derive(Clone, Default)]
struct RouteTable {
    mounts: Vec<MountedExtension>,
}

impl RouteTable {
    fn find(&self, id: &str) -> Option<&MountedExtension> {
        self.mounts.iter().find(|m| m.id == id)
    }
}

/// Installs and removes extension routes on the live HTTP surface.
pub struct RouteMountManager {
    table: RwLock<Arc<RouteTable>>,
    mutation: Mutex<()>,
}

impl std::fmt::Debug for RouteMountManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.snapshot();
        f.debug_struct("RouteMountManager")
            .field(
                "mounted",
                &table.mounts.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for RouteMountManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteMountManager {
    /// Creates a manager with nothing mounted.
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Arc::new(RouteTable::default())),
            mutation: Mutex::new(()),
        }
    }

    fn snapshot(&self) -> Arc<RouteTable> {
        Arc::clone(&self.table.read())
    }

    fn swap(&self, table: RouteTable) {
        *self.table.write() = Arc::new(table);
    }

    /// Mounts an extension's routes. Returns `false` if it was already
    /// mounted. Extensions without routes mount as an empty entry.
    pub async fn mount(&self, id: &str, extension: &Arc<dyn Extension>) -> AppResult<bool> {
        let _guard = self.mutation.lock().await;
        let current = self.snapshot();
        if current.find(id).is_some() {
            debug!(plugin_id = %id, "Extension already mounted");
            return Ok(false);
        }

        let mounted = build_mount(id, extension)?;
        let count = mounted.routes.len();
        let mut next = (*current).clone();
        next.mounts.push(mounted);
        self.swap(next);

        info!(plugin_id = %id, routes = count, "Extension routes mounted");
        Ok(true)
    }

    /// Removes an extension's routes. Returns `false` if it was not mounted.
    pub async fn unmount(&self, id: &str) -> bool {
        let _guard = self.mutation.lock().await;
        let current = self.snapshot();
        if current.find(id).is_none() {
            return false;
        }

        let mut next = (*current).clone();
        next.mounts.retain(|m| m.id != id);
        self.swap(next);

        info!(plugin_id = %id, "Extension routes unmounted");
        true
    }

    /// Replaces an extension's routes in a single swap. On failure the
    /// extension ends up unmounted.
    pub async fn remount(&self, id: &str, extension: &Arc<dyn Extension>) -> AppResult<()> {
        let _guard = self.mutation.lock().await;
        let current = self.snapshot();
        let slot = current.mounts.iter().position(|m| m.id == id);
        let mut next = (*current).clone();
        next.mounts.retain(|m| m.id != id);

        match build_mount(id, extension) {
            Ok(mounted) => {
                let count = mounted.routes.len();
                let slot = slot.unwrap_or(next.mounts.len());
                next.mounts.insert(slot, mounted);
                self.swap(next);
                info!(plugin_id = %id, routes = count, "Extension routes remounted");
                Ok(())
            }
            Err(e) => {
                self.swap(next);
                Err(e)
            }
        }
    }

    /// Whether an extension is currently mounted.
    pub fn is_mounted(&self, id: &str) -> bool {
        self.snapshot().find(id).is_some()
    }

    /// Every mounted route, grouped by extension in mount order.
    pub fn routes(&self) -> Vec<MountedRoute> {
        self.snapshot()
            .mounts
            .iter()
            .flat_map(|m| m.routes.iter().cloned())
            .collect()
    }

    /// Dispatches a request for `/api/plugins/{id}/...` to the mounted
    /// extension, or answers 404 when the id is not mounted.
    pub async fn dispatch(&self, id: &str, request: Request) -> Response {
        let router = self.snapshot().find(id).map(|m| m.router.clone());
        let Some(router) = router else {
            return AppError::not_found(format!("No routes mounted for extension '{id}'"))
                .into_response();
        };

        match router.oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }
}

fn build_mount(id: &str, extension: &Arc<dyn Extension>) -> AppResult<MountedExtension> {
    let bindings = contain_panic(id, "route_set", || {
        if extension.has_routes() {
            extension.route_set()
        } else {
            Vec::new()
        }
    })
    .ok_or_else(|| {
        AppError::plugin(format!("Extension '{id}' panicked while declaring routes"))
    })?;

    let mut seen = HashSet::new();
    let mut router = Router::new();
    let mut routes = Vec::with_capacity(bindings.len());

    for binding in bindings {
        validate_binding(id, &binding, &mut seen)?;

        let path = format!("{ROUTE_PREFIX}/{id}/{}", binding.suffix);
        let filter = MethodFilter::try_from(binding.method.clone()).map_err(|_| {
            AppError::validation(format!(
                "Extension '{id}' uses unsupported method {}",
                binding.method
            ))
        })?;

        let handler = Arc::clone(&binding.handler);
        let method_router = on(filter, move |request: Request| {
            let handler = Arc::clone(&handler);
            async move { invoke(handler, request).await }
        });

        // Path conflicts the shape check cannot see (e.g. a param next to a
        // wildcard) panic inside the matcher.
        let candidate = router;
        router = std::panic::catch_unwind(AssertUnwindSafe(|| {
            candidate.route(&path, method_router)
        }))
        .map_err(|_| {
            AppError::route_collision(format!(
                "Extension '{id}' route {} {path} conflicts with another of its routes",
                binding.method
            ))
        })?;

        routes.push(MountedRoute {
            extension_id: id.to_string(),
            method: binding.method.to_string(),
            path,
        });
    }

    let fallback_id = id.to_string();
    let router = router.fallback(move || {
        let id = fallback_id.clone();
        async move { AppError::not_found(format!("Extension '{id}' has no such route")) }
    });

    Ok(MountedExtension {
        id: id.to_string(),
        routes,
        router,
    })
}

fn validate_binding(
    id: &str,
    binding: &RouteBinding,
    seen: &mut HashSet<(String, String)>,
) -> AppResult<()> {
    if binding.suffix.is_empty() {
        return Err(AppError::validation(format!(
            "Extension '{id}' declared a route with an empty suffix"
        )));
    }
    if RESERVED_SUFFIXES.contains(&binding.suffix.as_str()) {
        return Err(AppError::route_collision(format!(
            "Extension '{id}' route '{}' shadows a host endpoint",
            binding.suffix
        )));
    }
    if !seen.insert((binding.method.to_string(), binding.shape())) {
        return Err(AppError::route_collision(format!(
            "Extension '{id}' declares {} '{}' more than once",
            binding.method, binding.suffix
        )));
    }
    Ok(())
}

async fn invoke(handler: Arc<dyn RouteHandler>, request: Request) -> Response {
    let (mut parts, body) = request.into_parts();

    let params = Path::<HashMap<String, String>>::from_request_parts(&mut parts, &())
        .await
        .map(|Path(p)| p)
        .unwrap_or_default();
    let query = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
        .map(|Query(q)| q)
        .unwrap_or_default();
    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(e) => return AppError::validation(format!("Unreadable body: {e}")).into_response(),
    };

    let request = RouteRequest {
        method: parts.method,
        params,
        query,
        body,
    };

    match AssertUnwindSafe(handler.call(request)).catch_unwind().await {
        Ok(Ok(response)) => response.into_response(),
        Ok(Err(e)) => e.into_response(),
        Err(_) => AppError::plugin("Extension route handler panicked").into_response(),
    }
}
