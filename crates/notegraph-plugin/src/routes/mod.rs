//! Extension HTTP routes — declared bindings and the live mount table.

pub mod binding;
pub mod mount;

pub use binding::{RouteBinding, RouteHandler, RouteRequest, RouteResponse, handler_fn};
pub use mount::{MountedRoute, ROUTE_PREFIX, RouteMountManager};
