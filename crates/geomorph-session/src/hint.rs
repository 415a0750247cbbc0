//! Per-question hint state.
//!
//! A hint can be revealed by the intervention monitor or toggled by the
//! learner. Whichever reveals it first counts the use; the counter saturates
//! at one and never goes back down while the question is live.

use serde::{Deserialize, Serialize};

/// Result of applying a trigger to the hint state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintChange {
    /// The hint became visible; `counted` is set if this was the first use.
    Revealed {
        /// This reveal incremented the usage counter.
        counted: bool,
    },
    /// The hint was hidden again.
    Hidden,
    /// Nothing changed.
    Unchanged,
}

/// Hint visibility and usage for the live question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintState {
    visible: bool,
    shown: bool,
    used: u32,
}

impl HintState {
    /// Creates the hidden, unused state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            visible: false,
            shown: false,
            used: 0,
        }
    }

    /// Monitor-driven reveal.
    ///
    /// Only acts the first time the hint would appear for this question; once
    /// it has been shown (by either path) further directives are ignored.
    pub fn auto_reveal(&mut self) -> HintChange {
        if self.visible || self.shown {
            return HintChange::Unchanged;
        }
        self.reveal()
    }

    /// Learner-driven toggle.
    pub fn toggle(&mut self) -> HintChange {
        if self.visible {
            self.visible = false;
            HintChange::Hidden
        } else {
            self.reveal()
        }
    }

    fn reveal(&mut self) -> HintChange {
        self.visible = true;
        self.shown = true;
        let counted = self.used == 0;
        if counted {
            self.used = 1;
        }
        HintChange::Revealed { counted }
    }

    /// Back to hidden and unused for a new question.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// The hint is currently on screen.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Hint uses counted for this question (0 or 1).
    #[must_use]
    pub const fn hints_used(&self) -> u32 {
        self.used
    }

    /// Overlays (highlight, measurements) are drawn only while the hint is
    /// visible and its use has been counted.
    #[must_use]
    pub const fn visual_hints_active(&self) -> bool {
        self.visible && self.used >= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_reveal_counts_once() {
        let mut hint = HintState::new();
        assert_eq!(hint.auto_reveal(), HintChange::Revealed { counted: true });
        assert_eq!(hint.auto_reveal(), HintChange::Unchanged);
        assert_eq!(hint.hints_used(), 1);
        assert!(hint.visual_hints_active());
    }

    #[test]
    fn test_manual_then_auto_counts_once() {
        let mut hint = HintState::new();
        assert_eq!(hint.toggle(), HintChange::Revealed { counted: true });
        assert_eq!(hint.auto_reveal(), HintChange::Unchanged);
        assert_eq!(hint.hints_used(), 1);
    }

    #[test]
    fn test_usage_is_sticky_across_toggles() {
        let mut hint = HintState::new();
        hint.toggle();
        assert_eq!(hint.toggle(), HintChange::Hidden);
        assert_eq!(hint.hints_used(), 1);
        assert!(!hint.visual_hints_active());

        assert_eq!(hint.toggle(), HintChange::Revealed { counted: false });
        assert_eq!(hint.hints_used(), 1);
        assert!(hint.visual_hints_active());
    }

    #[test]
    fn test_hidden_after_manual_blocks_auto_reveal() {
        let mut hint = HintState::new();
        hint.toggle();
        hint.toggle();
        assert_eq!(hint.auto_reveal(), HintChange::Unchanged);
        assert!(!hint.is_visible());
    }

    #[test]
    fn test_no_visual_hints_without_use() {
        let hint = HintState::new();
        assert!(!hint.visual_hints_active());
        assert_eq!(hint.hints_used(), 0);
    }

    #[test]
    fn test_reset() {
        let mut hint = HintState::new();
        hint.auto_reveal();
        hint.reset();
        assert_eq!(hint, HintState::new());
        assert_eq!(hint.auto_reveal(), HintChange::Revealed { counted: true });
    }
}
