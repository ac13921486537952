//! Combined frontend assets of the enabled extensions.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::isolation::contain_panic;
use crate::registry::ExtensionRegistry;

/// Script and style payloads of every enabled extension, concatenated in
/// discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedAssets {
    /// Combined JavaScript.
    pub script: String,
    /// Combined CSS.
    pub style: String,
}

/// Memoizes [`CombinedAssets`] until the enabled set changes.
#[derive(Debug, Default)]
pub struct AssetAggregator {
    cached: Mutex<Option<Arc<CombinedAssets>>>,
    generation: AtomicU64,
}

impl AssetAggregator {
    /// Creates an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops the memoized payload.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.cached.lock() = None;
    }

    /// Returns the combined payload, rebuilding it if needed.
    pub async fn collect(&self, registry: &ExtensionRegistry) -> Arc<CombinedAssets> {
        if let Some(cached) = self.cached.lock().as_ref() {
            return Arc::clone(cached);
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let mut combined = CombinedAssets::default();
        for ext in registry.enabled_extensions().await {
            // A panicking extension contributes nothing.
            let assets = contain_panic(&ext.id, "frontend_assets", || {
                ext.instance
                    .has_assets()
                    .then(|| ext.instance.frontend_assets())
            });
            let Some(Some(assets)) = assets else {
                continue;
            };
            if let Some(script) = assets.script {
                combined
                    .script
                    .push_str(&format!("// --- extension: {} ---\n", ext.id));
                combined.script.push_str(&script);
                combined.script.push('\n');
            }
            if let Some(style) = assets.style {
                combined
                    .style
                    .push_str(&format!("/* --- extension: {} --- */\n", ext.id));
                combined.style.push_str(&style);
                combined.style.push('\n');
            }
        }

        let combined = Arc::new(combined);
        let mut cached = self.cached.lock();
        // An invalidation during the rebuild means the result may be stale.
        if self.generation.load(Ordering::SeqCst) == generation {
            *cached = Some(Arc::clone(&combined));
            debug!(
                script_bytes = combined.script.len(),
                style_bytes = combined.style.len(),
                "Extension assets combined"
            );
        }
        combined
    }
}
