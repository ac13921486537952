//! Hook system — typed hook definitions and the dispatcher.

pub mod definitions;
pub mod dispatcher;

pub use definitions::{HookFault, HookKind, HookOutcome, MutatingHook, ObservingEvent};
pub use dispatcher::HookDispatcher;
