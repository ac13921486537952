//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use notegraph_core::config::AppConfig;
use notegraph_plugin::PluginManager;

use crate::service::NoteService;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Extension runtime
    pub plugins: Arc<PluginManager>,
    /// Note operations with hook dispatch
    pub notes: Arc<NoteService>,
    /// Process start time
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Creates the state, wiring the note service to the extension runtime.
    pub fn new(
        config: AppConfig,
        store: Arc<notegraph_notes::FsNoteStore>,
        plugins: Arc<PluginManager>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            notes: Arc::new(NoteService::new(store, Arc::clone(&plugins))),
            plugins,
            started_at: Utc::now(),
        }
    }
}
