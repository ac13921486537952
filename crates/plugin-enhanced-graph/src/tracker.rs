//! Client-side expansion bookkeeping.
//!
//! The service never retracts a transient expansion on its own; the caller
//! does, after its hover-idle timer fires. This tracker models that state
//! machine so a frontend (or a test) can drive it with plain events.

use std::collections::HashMap;

/// Display state of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpansionState {
    /// Children hidden.
    #[default]
    Collapsed,
    /// Children previewed while hovered.
    Transient,
    /// Children shown until clicked again.
    Pinned,
}

/// Tracks hover and click expansions per node.
#[derive(Debug, Default)]
pub struct ExpansionTracker {
    states: HashMap<String, ExpansionState>,
}

impl ExpansionTracker {
    /// Creates a tracker with every node collapsed.
    pub fn new() -> Self {
        Self::default()
    }

    /// State of a node.
    pub fn state(&self, node_id: &str) -> ExpansionState {
        self.states.get(node_id).copied().unwrap_or_default()
    }

    /// Pointer entered a node. Returns whether an expansion request is due.
    pub fn hover_enter(&mut self, node_id: &str) -> bool {
        match self.state(node_id) {
            ExpansionState::Collapsed => {
                self.states
                    .insert(node_id.to_string(), ExpansionState::Transient);
                true
            }
            ExpansionState::Transient | ExpansionState::Pinned => false,
        }
    }

    /// The caller's hover-idle timer fired. Only transient previews retract.
    pub fn hover_idle_elapsed(&mut self, node_id: &str) -> bool {
        if self.state(node_id) == ExpansionState::Transient {
            self.states.remove(node_id);
            return true;
        }
        false
    }

    /// Click toggles a pin. Returns the new state.
    pub fn click(&mut self, node_id: &str) -> ExpansionState {
        let next = match self.state(node_id) {
            ExpansionState::Pinned => ExpansionState::Collapsed,
            ExpansionState::Collapsed | ExpansionState::Transient => ExpansionState::Pinned,
        };
        if next == ExpansionState::Collapsed {
            self.states.remove(node_id);
        } else {
            self.states.insert(node_id.to_string(), next);
        }
        next
    }

    /// Pinned nodes, sorted.
    pub fn pinned(&self) -> Vec<String> {
        let mut pinned: Vec<String> = self
            .states
            .iter()
            .filter(|(_, s)| **s == ExpansionState::Pinned)
            .map(|(id, _)| id.clone())
            .collect();
        pinned.sort();
        pinned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hover_preview_retracts() {
        let mut tracker = ExpansionTracker::new();
        assert!(tracker.hover_enter("a.md"));
        assert!(!tracker.hover_enter("a.md"));
        assert_eq!(tracker.state("a.md"), ExpansionState::Transient);
        assert!(tracker.hover_idle_elapsed("a.md"));
        assert_eq!(tracker.state("a.md"), ExpansionState::Collapsed);
    }

    #[test]
    fn test_pinned_node_survives_hover_cycles() {
        let mut tracker = ExpansionTracker::new();
        tracker.hover_enter("a.md");
        assert_eq!(tracker.click("a.md"), ExpansionState::Pinned);

        for _ in 0..3 {
            assert!(!tracker.hover_enter("a.md"));
            assert!(!tracker.hover_idle_elapsed("a.md"));
        }
        assert_eq!(tracker.pinned(), vec!["a.md"]);

        assert_eq!(tracker.click("a.md"), ExpansionState::Collapsed);
        assert!(tracker.pinned().is_empty());
    }
}
