//! Route definitions for the NoteGraph HTTP API.
//!
//! Host routes are registered statically. Extension routes are not part of
//! this tree: the fallback forwards `/api/plugins/{id}/...` to the mount
//! table, so toggling an extension never rebuilds this router.

use axum::Router;
use axum::routing::{get, post};

use crate::handlers;
use crate::state::AppState;

/// Builds the route tree. Layers are added in [`crate::app::build_app`].
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(note_routes())
        .merge(plugin_routes())
        .merge(health_routes())
        .fallback(handlers::extension::dispatch)
        .with_state(state)
}

/// Note CRUD and search
fn note_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/notes",
            get(handlers::notes::list_notes).post(handlers::notes::create_note),
        )
        .route(
            "/api/notes/{*path}",
            get(handlers::notes::get_note)
                .put(handlers::notes::save_note)
                .delete(handlers::notes::delete_note),
        )
        .route("/api/search", get(handlers::notes::search))
}

/// Extension administration
fn plugin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/plugins", get(handlers::plugins::list_plugins))
        .route("/api/plugins/rescan", post(handlers::plugins::rescan_plugins))
        .route("/api/plugins/routes", get(handlers::plugins::list_routes))
        .route("/api/plugins/assets", get(handlers::plugins::assets))
        .route(
            "/api/plugins/assets/script.js",
            get(handlers::plugins::asset_script),
        )
        .route(
            "/api/plugins/assets/style.css",
            get(handlers::plugins::asset_style),
        )
        .route(
            "/api/plugins/{id}/toggle",
            post(handlers::plugins::toggle_plugin),
        )
        .route(
            "/api/plugins/{id}/reload",
            post(handlers::plugins::reload_plugin),
        )
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/api/health", get(handlers::health::health))
}
