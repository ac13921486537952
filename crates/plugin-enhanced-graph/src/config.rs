//! Settings for the graph extension, read from its manifest `[settings]`.

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// Largest expansion depth any deployment may configure.
pub const HARD_DEPTH_CEILING: u32 = 6;

/// Graph extension settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    /// Combined in+out degree at which a note counts as a hub.
    pub hub_threshold: usize,
    /// Depth used when a request does not name one.
    pub default_depth: u32,
    /// Largest depth accepted. Clamped to [`HARD_DEPTH_CEILING`].
    pub max_depth: u32,
    /// Idle time after which a graph session is dropped.
    pub session_idle_seconds: u64,
    /// Maximum number of live graph sessions.
    pub max_sessions: u64,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            hub_threshold: 3,
            default_depth: 2,
            max_depth: HARD_DEPTH_CEILING,
            session_idle_seconds: 1800,
            max_sessions: 256,
        }
    }
}

impl GraphSettings {
    /// Parses settings from the manifest table and normalizes the bounds.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, String> {
        let settings = if value.is_null() {
            Self::default()
        } else {
            serde_json::from_value::<Self>(value.clone())
                .map_err(|e| format!("invalid graph settings: {e}"))?
        };
        Ok(settings.normalized())
    }

    /// Applies the default to a requested depth and checks it against
    /// `1..=max_depth`.
    pub fn resolve_depth(&self, depth: Option<u32>) -> Result<u32, GraphError> {
        let depth = depth.unwrap_or(self.default_depth);
        if depth == 0 || depth > self.max_depth {
            return Err(GraphError::DepthOutOfRange {
                requested: depth,
                ceiling: self.max_depth,
            });
        }
        Ok(depth)
    }

    fn normalized(mut self) -> Self {
        self.max_depth = self.max_depth.clamp(1, HARD_DEPTH_CEILING);
        self.default_depth = self.default_depth.clamp(1, self.max_depth);
        self.hub_threshold = self.hub_threshold.max(1);
        self.max_sessions = self.max_sessions.max(1);
        self.session_idle_seconds = self.session_idle_seconds.max(1);
        self
    }
}
