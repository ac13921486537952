//! Durable enable/disable state for extensions.
//!
//! The state file is a pretty-printed JSON object mapping extension ids to
//! booleans. Writes go through a temporary file and a rename so a crash
//! never leaves a truncated file behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use notegraph_core::error::{AppError, ErrorKind};
use notegraph_core::result::AppResult;

/// Persisted mapping of extension id to enabled flag.
pub type StateMap = BTreeMap<String, bool>;

/// JSON-file backed store for extension state.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl StateStore {
    /// Creates a store for the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the mapping. A missing file is an empty mapping.
    pub async fn load(&self) -> AppResult<StateMap> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(StateMap::new()),
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read plugin state: {}", self.path.display()),
                    e,
                ));
            }
        };
        if raw.trim().is_empty() {
            return Ok(StateMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    /// Rewrites the full mapping.
    pub async fn save(&self, state: &StateMap) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        self.write(state).await
    }

    /// Sets one entry as a single read-modify-write.
    pub async fn set(&self, id: &str, enabled: bool) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut state = self.load().await?;
        state.insert(id.to_string(), enabled);
        self.write(&state).await?;
        debug!(plugin_id = %id, enabled, "Plugin state persisted");
        Ok(())
    }

    async fn write(&self, state: &StateMap) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let mut json = serde_json::to_string_pretty(state)?;
        json.push('\n');

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write plugin state: {}", tmp.display()),
                e,
            )
        })?;
        fs::rename(&tmp, &self.path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to replace plugin state: {}", self.path.display()),
                e,
            )
        })
    }
}
