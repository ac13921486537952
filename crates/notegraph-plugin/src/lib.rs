//! # notegraph-plugin
//!
//! Extension runtime for NoteGraph. Provides:
//!
//! - Manifest-driven discovery against a catalog of compiled-in factories
//! - The extension registry with persisted enable/disable state
//! - A hook dispatcher with pipeline semantics and per-extension isolation
//! - Route mounting under `/api/plugins/{id}/` with atomic table swaps
//! - Aggregation of extension frontend assets
//! - Hot toggle, reload and rescan through [`PluginManager`]

pub mod assets;
pub mod catalog;
pub mod extension;
pub mod hooks;
mod isolation;
pub mod loader;
pub mod manager;
pub mod prelude;
pub mod registry;
pub mod routes;
pub mod state;

pub use assets::{AssetAggregator, CombinedAssets};
pub use catalog::{ExtensionCatalog, ExtensionContext, ExtensionFactory, HostServices};
pub use extension::{Extension, ExtensionInfo, FrontendAssets};
pub use hooks::definitions::{HookFault, HookKind, HookOutcome, MutatingHook, ObservingEvent};
pub use hooks::dispatcher::HookDispatcher;
pub use loader::{DiscoveryError, ExtensionLoader, ExtensionManifest};
pub use manager::PluginManager;
pub use registry::{ActiveExtension, ExtensionDescriptor, ExtensionRegistry, ExtensionSummary};
pub use routes::binding::{RouteBinding, RouteHandler, RouteRequest, RouteResponse, handler_fn};
pub use routes::mount::{MountedRoute, RouteMountManager};
pub use state::StateStore;
