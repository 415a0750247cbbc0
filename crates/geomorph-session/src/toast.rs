//! Ephemeral level-change notifications.
//!
//! The queue only stores toasts; the runtime owns their timers. A toast is
//! first marked as leaving (exit transition) and removed afterwards. Removal
//! is by id and idempotent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Vertical pixels between stacked toasts.
const STACK_SPACING: u32 = 90;

/// Offset of the first toast from the edge.
const STACK_MARGIN: u32 = 16;

/// What a toast announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToastKind {
    /// The level went up.
    LevelUp,
    /// The level went down.
    LevelDown,
    /// Anything else.
    Info,
}

/// A single notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toast {
    /// Unique id within the session.
    pub id: u64,
    /// Text shown.
    pub message: String,
    /// Kind.
    pub kind: ToastKind,
    /// When it was queued.
    pub created_at: DateTime<Utc>,
    /// The exit transition is running.
    pub leaving: bool,
}

impl Toast {
    /// Builds the toast announcing a level change, or `None` when the level
    /// did not change.
    #[must_use]
    pub fn level_change(from: u32, to: u32) -> Option<(String, ToastKind)> {
        match to.cmp(&from) {
            std::cmp::Ordering::Greater => Some((
                format!("Level {from} → {to} | Great progress!"),
                ToastKind::LevelUp,
            )),
            std::cmp::Ordering::Less => Some((
                format!("Level {from} → {to} | Keep practicing"),
                ToastKind::LevelDown,
            )),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Pixel offset of the toast at `index` in the stack.
#[must_use]
pub fn stack_offset(index: usize) -> u32 {
    u32::try_from(index)
        .unwrap_or(u32::MAX)
        .saturating_mul(STACK_SPACING)
        .saturating_add(STACK_MARGIN)
}

/// Toasts in arrival order.
#[derive(Debug, Clone)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
    next_id: u64,
}

impl ToastQueue {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            toasts: Vec::new(),
            next_id: 1,
        }
    }

    /// Appends a toast with a fresh id and returns a copy of it.
    pub fn push(&mut self, message: impl Into<String>, kind: ToastKind) -> Toast {
        let id = self.next_id;
        self.next_id += 1;
        let toast = Toast {
            id,
            message: message.into(),
            kind,
            created_at: Utc::now(),
            leaving: false,
        };
        self.toasts.push(toast.clone());
        toast
    }

    /// Starts the exit transition. Returns `false` if the toast is gone or
    /// already leaving.
    pub fn begin_exit(&mut self, id: u64) -> bool {
        match self.toasts.iter_mut().find(|t| t.id == id) {
            Some(toast) if !toast.leaving => {
                toast.leaving = true;
                true
            }
            _ => false,
        }
    }

    /// Removes a toast. Returns `false` if it was already removed.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        self.toasts.len() != before
    }

    /// Toasts in arrival order.
    #[must_use]
    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    /// Number of queued toasts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    /// Returns `true` if no toast is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_ordered() {
        let mut queue = ToastQueue::new();
        let a = queue.push("a", ToastKind::Info);
        let b = queue.push("b", ToastKind::Info);
        queue.remove(a.id);
        let c = queue.push("c", ToastKind::Info);

        assert!(a.id < b.id && b.id < c.id);
        let messages: Vec<_> = queue.toasts().iter().map(|t| t.message.as_str()).collect();
        assert_eq!(messages, vec!["b", "c"]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut queue = ToastQueue::new();
        let a = queue.push("a", ToastKind::LevelUp);
        queue.push("b", ToastKind::LevelDown);

        assert!(queue.remove(a.id));
        let after_first = queue.toasts().to_vec();
        assert!(!queue.remove(a.id));
        assert_eq!(queue.toasts(), after_first.as_slice());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_begin_exit_once() {
        let mut queue = ToastQueue::new();
        let a = queue.push("a", ToastKind::Info);
        assert!(queue.begin_exit(a.id));
        assert!(!queue.begin_exit(a.id));
        assert!(queue.toasts()[0].leaving);
        assert!(!queue.begin_exit(999));
    }

    #[test]
    fn test_level_change_messages() {
        assert_eq!(
            Toast::level_change(1, 2),
            Some(("Level 1 → 2 | Great progress!".to_string(), ToastKind::LevelUp))
        );
        assert_eq!(
            Toast::level_change(3, 2),
            Some(("Level 3 → 2 | Keep practicing".to_string(), ToastKind::LevelDown))
        );
        assert_eq!(Toast::level_change(2, 2), None);
    }

    #[test]
    fn test_stack_offsets() {
        assert_eq!(stack_offset(0), 16);
        assert_eq!(stack_offset(1), 106);
        assert_eq!(stack_offset(2), 196);
    }

    #[test]
    fn test_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&ToastKind::LevelUp).unwrap_or_default(),
            r#""levelUp""#
        );
    }
}
