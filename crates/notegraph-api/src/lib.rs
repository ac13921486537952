//! # notegraph-api
//!
//! HTTP API layer for NoteGraph built on Axum.
//!
//! Serves the note CRUD and search endpoints (which drive the extension
//! hooks), the extension administration endpoints, and forwards everything
//! else under `/api/plugins/{id}/` to the routes that extension mounted.

pub mod app;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod service;
pub mod state;

pub use app::build_app;
pub use service::NoteService;
pub use state::AppState;
