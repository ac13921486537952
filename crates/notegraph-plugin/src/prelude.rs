//! Prelude for extension authors.

pub use async_trait::async_trait;

pub use crate::catalog::{ExtensionContext, HostServices};
pub use crate::extension::{Extension, ExtensionInfo, FrontendAssets};
pub use crate::hooks::definitions::{HookFault, HookKind, HookOutcome};
pub use crate::routes::binding::{
    RouteBinding, RouteHandler, RouteRequest, RouteResponse, handler_fn,
};
