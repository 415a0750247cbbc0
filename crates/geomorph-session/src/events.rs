//! Session events and broadcasting.
//!
//! Discrete things that happen during a session are broadcast to every
//! subscriber as they occur. Events are not persisted; late subscribers read
//! the current [`SessionView`](crate::SessionView) instead.
//!
//! # Event Types
//!
//! - `session_ready` - Session loaded (or fell back to anonymous)
//! - `question_loaded` / `question_failed` - Result of a question fetch
//! - `hint_revealed` / `hint_hidden` - Hint visibility changed
//! - `visual_mode_changed` - Alternate visual mode switched on
//! - `feedback_shown` - Local correctness feedback after a submission
//! - `level_changed` - Evaluator declared a new level
//! - `toast_added` / `toast_removed` - Toast queue changed
//! - `affect_sampled` - New emotion label
//! - `session_reset` - Level and emotion reset
//! - `cycle_complete` - Transition window after a submission elapsed
//! - `session_finished` - Session completed and runtime stopped
//!
//! # Example
//!
//! ```
//! use geomorph_session::{EventBroadcaster, SessionEvent};
//!
//! # async fn example() {
//! let broadcaster = EventBroadcaster::new(16);
//! let mut receiver = broadcaster.subscribe();
//!
//! broadcaster.send(SessionEvent::level_changed(1, 2));
//!
//! if let Ok(event) = receiver.recv().await {
//!     assert_eq!(event.event_name(), "level_changed");
//! }
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::toast::Toast;

// ============================================================================
// Event Payloads
// ============================================================================

/// Payload for the `session_ready` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReadyPayload {
    /// Session id in use.
    pub session_id: String,
    /// Starting level.
    pub level: u32,
    /// The evaluator was unreachable and the anonymous session is in use.
    pub fallback: bool,
}

/// Payload for the `question_loaded` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionLoadedPayload {
    /// Problem id.
    pub id: u32,
    /// Topic.
    pub topic: String,
    /// Difficulty.
    pub difficulty: u32,
}

/// Payload for the `question_failed` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionFailedPayload {
    /// Diagnostic shown in place of the question.
    pub message: String,
}

/// Payload for the `hint_revealed` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintRevealedPayload {
    /// Revealed by the intervention monitor rather than the learner.
    pub automatic: bool,
    /// This reveal counted as the question's hint use.
    pub counted: bool,
}

/// Payload for the `feedback_shown` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackPayload {
    /// Local correctness.
    pub correct: bool,
    /// Feedback text.
    pub text: String,
}

/// Payload for the `level_changed` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelChangedPayload {
    /// Previous level.
    pub from: u32,
    /// New level.
    pub to: u32,
    /// When the change was applied.
    pub timestamp: DateTime<Utc>,
}

/// Payload for the `session_finished` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFinishedPayload {
    /// The evaluator acknowledged completion.
    pub acknowledged: bool,
}

// ============================================================================
// Event Enum
// ============================================================================

/// Session events.
///
/// Serialized as JSON objects with "event" and "payload" fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Session bootstrap finished.
    SessionReady(SessionReadyPayload),
    /// A new live question.
    QuestionLoaded(QuestionLoadedPayload),
    /// Question fetch failed; no question is live.
    QuestionFailed(QuestionFailedPayload),
    /// Hint became visible.
    HintRevealed(HintRevealedPayload),
    /// Hint was hidden by the learner.
    HintHidden,
    /// Visual mode changed.
    VisualModeChanged {
        /// Alternate ("party") mode is on.
        party: bool,
    },
    /// Local feedback shown after a submission.
    FeedbackShown(FeedbackPayload),
    /// The evaluator declared a new level.
    LevelChanged(LevelChangedPayload),
    /// A toast was queued.
    ToastAdded(Toast),
    /// A toast was removed.
    ToastRemoved {
        /// Toast id.
        id: u64,
    },
    /// A new affect label was sampled.
    AffectSampled {
        /// Emotion label.
        emotion: String,
    },
    /// Level and emotion were reset.
    SessionReset,
    /// The post-submission transition finished.
    CycleComplete,
    /// The session was completed.
    SessionFinished(SessionFinishedPayload),
}

impl SessionEvent {
    /// Creates a `SessionReady` event.
    #[must_use]
    pub fn session_ready(session_id: impl Into<String>, level: u32, fallback: bool) -> Self {
        Self::SessionReady(SessionReadyPayload {
            session_id: session_id.into(),
            level,
            fallback,
        })
    }

    /// Creates a `QuestionFailed` event.
    #[must_use]
    pub fn question_failed(message: impl Into<String>) -> Self {
        Self::QuestionFailed(QuestionFailedPayload {
            message: message.into(),
        })
    }

    /// Creates a `HintRevealed` event.
    #[must_use]
    pub const fn hint_revealed(automatic: bool, counted: bool) -> Self {
        Self::HintRevealed(HintRevealedPayload { automatic, counted })
    }

    /// Creates a `FeedbackShown` event.
    #[must_use]
    pub fn feedback_shown(correct: bool, text: impl Into<String>) -> Self {
        Self::FeedbackShown(FeedbackPayload {
            correct,
            text: text.into(),
        })
    }

    /// Creates a `LevelChanged` event.
    #[must_use]
    pub fn level_changed(from: u32, to: u32) -> Self {
        Self::LevelChanged(LevelChangedPayload {
            from,
            to,
            timestamp: Utc::now(),
        })
    }

    /// Returns the event name as a string.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::SessionReady(_) => "session_ready",
            Self::QuestionLoaded(_) => "question_loaded",
            Self::QuestionFailed(_) => "question_failed",
            Self::HintRevealed(_) => "hint_revealed",
            Self::HintHidden => "hint_hidden",
            Self::VisualModeChanged { .. } => "visual_mode_changed",
            Self::FeedbackShown(_) => "feedback_shown",
            Self::LevelChanged(_) => "level_changed",
            Self::ToastAdded(_) => "toast_added",
            Self::ToastRemoved { .. } => "toast_removed",
            Self::AffectSampled { .. } => "affect_sampled",
            Self::SessionReset => "session_reset",
            Self::CycleComplete => "cycle_complete",
            Self::SessionFinished(_) => "session_finished",
        }
    }
}

// ============================================================================
// Event Broadcaster
// ============================================================================

/// Broadcasts session events to all subscribers.
///
/// Uses a tokio broadcast channel. A subscriber that falls behind receives a
/// `Lagged` error and misses the oldest events.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBroadcaster {
    /// Creates a broadcaster buffering `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new subscriber.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Broadcasts an event, returning how many subscribers will see it.
    pub fn send(&self, event: SessionEvent) -> usize {
        // send() only fails when nobody is subscribed
        self.sender.send(event).unwrap_or(0)
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}
