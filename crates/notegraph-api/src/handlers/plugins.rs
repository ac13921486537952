//! Extension administration handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use tracing::info;

use notegraph_core::result::AppResult;
use notegraph_plugin::{CombinedAssets, ExtensionSummary, MountedRoute};

use crate::dto::request::ToggleRequest;
use crate::dto::response::ApiResponse;
use crate::state::AppState;

/// GET /api/plugins
pub async fn list_plugins(State(state): State<AppState>) -> Json<ApiResponse<Vec<ExtensionSummary>>> {
    Json(ApiResponse::ok(state.plugins.list().await))
}

/// POST /api/plugins/{id}/toggle
pub async fn toggle_plugin(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ToggleRequest>,
) -> AppResult<Json<ApiResponse<ExtensionSummary>>> {
    let summary = state.plugins.set_enabled(&id, req.enabled).await?;
    info!(plugin_id = %id, enabled = summary.enabled, "Extension toggled via API");
    Ok(Json(ApiResponse::ok(summary)))
}

/// POST /api/plugins/{id}/reload
pub async fn reload_plugin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<ExtensionSummary>>> {
    let summary = state.plugins.reload(&id).await?;
    Ok(Json(ApiResponse::ok(summary)))
}

/// POST /api/plugins/rescan
pub async fn rescan_plugins(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<ExtensionSummary>>>> {
    let added = state.plugins.rescan().await?;
    Ok(Json(ApiResponse::ok(added)))
}

/// GET /api/plugins/routes
pub async fn list_routes(State(state): State<AppState>) -> Json<ApiResponse<Vec<MountedRoute>>> {
    Json(ApiResponse::ok(state.plugins.routes()))
}

/// GET /api/plugins/assets
pub async fn assets(State(state): State<AppState>) -> Json<CombinedAssets> {
    let assets = state.plugins.assets().await;
    Json((*assets).clone())
}

/// GET /api/plugins/assets/script.js
pub async fn asset_script(State(state): State<AppState>) -> impl IntoResponse {
    let assets = state.plugins.assets().await;
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        assets.script.clone(),
    )
}

/// GET /api/plugins/assets/style.css
pub async fn asset_style(State(state): State<AppState>) -> impl IntoResponse {
    let assets = state.plugins.assets().await;
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        assets.style.clone(),
    )
}
