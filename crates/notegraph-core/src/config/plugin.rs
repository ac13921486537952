//! Extension runtime configuration.

use serde::{Deserialize, Serialize};

/// Extension runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Directory scanned for extension manifests (`*.toml`).
    #[serde(default = "default_plugin_directory")]
    pub directory: String,
    /// JSON file holding the persisted enable/disable mapping.
    #[serde(default = "default_state_file")]
    pub state_file: String,
    /// Per-hook deadline in milliseconds. `0` disables the deadline.
    #[serde(default = "default_hook_timeout")]
    pub hook_timeout_ms: u64,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            directory: default_plugin_directory(),
            state_file: default_state_file(),
            hook_timeout_ms: default_hook_timeout(),
        }
    }
}

impl PluginConfig {
    /// The hook deadline, if one is configured.
    pub fn hook_timeout(&self) -> Option<std::time::Duration> {
        (self.hook_timeout_ms > 0).then(|| std::time::Duration::from_millis(self.hook_timeout_ms))
    }
}

fn default_plugin_directory() -> String {
    "./plugins".to_string()
}

fn default_state_file() -> String {
    "./data/plugin_state.json".to_string()
}

fn default_hook_timeout() -> u64 {
    30_000
}
