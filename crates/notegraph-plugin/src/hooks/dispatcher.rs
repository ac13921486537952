//! Hook dispatcher — delivers hooks to enabled extensions in discovery order.
//!
//! For mutating hooks:
//! - The payload flows through every extension as a pipeline.
//! - `Replaced(v)` becomes the next extension's input; `Unchanged` passes
//!   the current value on.
//!
//! For observing hooks:
//! - Every extension is called; there is no return channel.
//!
//! A fault in one extension (error, panic or timeout) is logged and treated
//! as `Unchanged`. It never reaches the caller or the next extension.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tracing::{debug, warn};

use crate::hooks::definitions::{HookFault, HookKind, HookOutcome, MutatingHook, ObservingEvent};
use crate::isolation::{contain_panic, panic_message};
use crate::registry::{ActiveExtension, ExtensionRegistry};

/// Dispatches hooks to every enabled extension.
#[derive(Debug)]
pub struct HookDispatcher {
    /// Source of the enabled snapshot.
    registry: Arc<ExtensionRegistry>,
    /// Per-invocation deadline.
    timeout: Option<Duration>,
}

impl HookDispatcher {
    /// Creates a dispatcher. `timeout` of `None` lets hooks run unbounded.
    pub fn new(registry: Arc<ExtensionRegistry>, timeout: Option<Duration>) -> Self {
        Self { registry, timeout }
    }

    /// Runs a mutating hook as a pipeline and returns the final content.
    pub async fn pipe(&self, hook: MutatingHook, path: &str, content: String) -> String {
        let extensions = self.registry.enabled_extensions().await;
        let kind = hook.kind();
        let mut current = content;

        for ext in extensions.iter().filter(|e| declares(e, kind)) {
            let instance = Arc::clone(&ext.instance);
            let input = current.as_str();
            let call = async move {
                match hook {
                    MutatingHook::NoteCreate => instance.on_note_create(path, input).await,
                    MutatingHook::NoteSave => instance.on_note_save(path, input).await,
                    MutatingHook::NoteLoad => instance.on_note_load(path, input).await,
                }
            };

            match self.guarded(call).await {
                Ok(HookOutcome::Replaced(next)) => {
                    debug!(plugin_id = %ext.id, hook = %kind, path = %path, "Hook replaced content");
                    current = next;
                }
                Ok(HookOutcome::Unchanged) => {}
                Err(fault) => Self::report(&ext.id, kind, &fault),
            }
        }

        current
    }

    /// Delivers an observing event to every enabled extension.
    pub async fn notify(&self, event: &ObservingEvent) {
        let extensions = self.registry.enabled_extensions().await;
        for ext in &extensions {
            self.notify_extension(ext, event).await;
        }
    }

    /// Delivers an observing event to a single extension.
    pub async fn notify_extension(&self, ext: &ActiveExtension, event: &ObservingEvent) {
        let kind = event.kind();
        if !declares(ext, kind) {
            return;
        }

        let instance = Arc::clone(&ext.instance);
        let call = async move {
            match event {
                ObservingEvent::Startup => instance.on_startup().await,
                ObservingEvent::NoteDelete { path } => instance.on_note_delete(path).await,
                ObservingEvent::Search { query, results } => {
                    instance.on_search(query, results).await
                }
            }
        };

        match self.guarded(call).await {
            Ok(()) => debug!(plugin_id = %ext.id, hook = %kind, "Hook delivered"),
            Err(fault) => Self::report(&ext.id, kind, &fault),
        }
    }

    /// Runs one hook future with panic capture and the optional deadline.
    async fn guarded<T, F>(&self, call: F) -> Result<T, HookFault>
    where
        F: Future<Output = Result<T, HookFault>>,
    {
        let call = AssertUnwindSafe(call).catch_unwind();
        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => return Err(HookFault::TimedOut(limit)),
            },
            None => call.await,
        };

        match outcome {
            Ok(result) => result,
            Err(panic) => Err(HookFault::Panicked(panic_message(panic.as_ref()))),
        }
    }

    fn report(plugin_id: &str, hook: HookKind, fault: &HookFault) {
        warn!(
            plugin_id = %plugin_id,
            hook = %hook,
            error = %fault,
            "Extension hook fault ignored"
        );
    }

    /// Returns the registry the dispatcher reads from.
    pub fn registry(&self) -> &Arc<ExtensionRegistry> {
        &self.registry
    }
}

/// Whether `ext` declared `kind`. An extension whose declaration panics
/// receives nothing.
fn declares(ext: &ActiveExtension, kind: HookKind) -> bool {
    contain_panic(&ext.id, "hooks", || ext.instance.has_hook(kind)).unwrap_or(false)
}
