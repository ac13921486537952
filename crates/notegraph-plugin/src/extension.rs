//! The extension contract.
//!
//! Every extension is a value implementing [`Extension`]. Hook methods have
//! no-op defaults, so an extension only overrides what it declares through
//! [`Extension::hooks`]; the dispatcher skips undeclared hooks entirely.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::hooks::definitions::{HookFault, HookKind, HookOutcome};
use crate::routes::binding::RouteBinding;

/// Identity reported by an extension instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionInfo {
    /// Human-readable name.
    pub name: String,
    /// Version string.
    pub version: String,
    /// Short description.
    #[serde(default)]
    pub description: String,
    /// Whether the extension is enabled when no persisted state exists.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl ExtensionInfo {
    /// Creates an identity with an empty description, enabled by default.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: String::new(),
            enabled: true,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

fn default_enabled() -> bool {
    true
}

/// Client-side payloads an extension injects into the shell page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontendAssets {
    /// JavaScript source.
    pub script: Option<String>,
    /// CSS source.
    pub style: Option<String>,
}

/// Trait implemented by every extension.
#[async_trait]
pub trait Extension: Send + Sync + std::fmt::Debug {
    /// Returns the extension identity.
    fn info(&self) -> ExtensionInfo;

    /// Hooks this extension wants to receive.
    fn hooks(&self) -> Vec<HookKind> {
        Vec::new()
    }

    /// Whether the extension declared `kind`.
    fn has_hook(&self, kind: HookKind) -> bool {
        self.hooks().contains(&kind)
    }

    /// Whether the extension registers HTTP routes.
    fn has_routes(&self) -> bool {
        false
    }

    /// Whether the extension injects frontend assets.
    fn has_assets(&self) -> bool {
        false
    }

    /// Called when the extension becomes active.
    async fn on_startup(&self) -> Result<(), HookFault> {
        Ok(())
    }

    /// Called with the content of a note about to be created.
    async fn on_note_create(&self, _path: &str, _content: &str) -> Result<HookOutcome, HookFault> {
        Ok(HookOutcome::Unchanged)
    }

    /// Called with the content of a note about to be saved.
    async fn on_note_save(&self, _path: &str, _content: &str) -> Result<HookOutcome, HookFault> {
        Ok(HookOutcome::Unchanged)
    }

    /// Called with the content of a note just loaded.
    async fn on_note_load(&self, _path: &str, _content: &str) -> Result<HookOutcome, HookFault> {
        Ok(HookOutcome::Unchanged)
    }

    /// Called after a note is deleted.
    async fn on_note_delete(&self, _path: &str) -> Result<(), HookFault> {
        Ok(())
    }

    /// Called after a search with the matching note paths.
    async fn on_search(&self, _query: &str, _results: &[String]) -> Result<(), HookFault> {
        Ok(())
    }

    /// Script and style payloads. Only consulted when [`Self::has_assets`].
    fn frontend_assets(&self) -> FrontendAssets {
        FrontendAssets::default()
    }

    /// Routes relative to `/api/plugins/{id}/`. Only consulted when
    /// [`Self::has_routes`].
    fn route_set(&self) -> Vec<RouteBinding> {
        Vec::new()
    }
}
