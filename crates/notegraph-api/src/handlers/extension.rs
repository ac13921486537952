//! Forwards `/api/plugins/{id}/...` to the routes an extension mounted.

use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};

use notegraph_core::error::AppError;
use notegraph_plugin::routes::mount::ROUTE_PREFIX;

use crate::state::AppState;

/// Router fallback. Anything that is not an extension route is a 404.
pub async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let id = match extension_id(request.uri().path()) {
        Some(id) => id.to_string(),
        None => {
            return AppError::not_found(format!("No route for {}", request.uri().path()))
                .into_response();
        }
    };
    state.plugins.dispatch_route(&id, request).await
}

/// The `{id}` segment of `/api/plugins/{id}/{rest}`, when `rest` is not empty.
fn extension_id(path: &str) -> Option<&str> {
    let rest = path.strip_prefix(ROUTE_PREFIX)?.strip_prefix('/')?;
    let (id, suffix) = rest.split_once('/')?;
    (!id.is_empty() && !suffix.is_empty()).then_some(id)
}
