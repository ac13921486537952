//! Note CRUD and search handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use notegraph_core::result::AppResult;
use notegraph_notes::{Note, NoteSummary, SearchHit};

use crate::dto::request::{CreateNoteRequest, SaveNoteRequest, SearchQuery};
use crate::dto::response::{ApiResponse, SearchResponse};
use crate::state::AppState;

/// GET /api/notes
pub async fn list_notes(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<NoteSummary>>>> {
    let notes = state.notes.list().await?;
    Ok(Json(ApiResponse::ok(notes)))
}

/// POST /api/notes
pub async fn create_note(
    State(state): State<AppState>,
    Json(req): Json<CreateNoteRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Note>>)> {
    let note = state.notes.create(&req.path, req.content).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(note))))
}

/// GET /api/notes/{*path}
pub async fn get_note(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> AppResult<Json<ApiResponse<Note>>> {
    let note = state.notes.load(&path).await?;
    Ok(Json(ApiResponse::ok(note)))
}

/// PUT /api/notes/{*path}
pub async fn save_note(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Json(req): Json<SaveNoteRequest>,
) -> AppResult<Json<ApiResponse<Note>>> {
    let note = state.notes.save(&path, req.content).await?;
    Ok(Json(ApiResponse::ok(note)))
}

/// DELETE /api/notes/{*path}
pub async fn delete_note(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> AppResult<StatusCode> {
    state.notes.delete(&path).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/search?q=
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<ApiResponse<SearchResponse<SearchHit>>>> {
    let results = state.notes.search(&query.q).await?;
    Ok(Json(ApiResponse::ok(SearchResponse {
        query: query.q,
        results,
    })))
}
