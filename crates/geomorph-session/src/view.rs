//! Observable session snapshot.
//!
//! The runtime publishes a fresh [`SessionView`] after every command and
//! completion it handles. Everything a front end shows is derived from it,
//! including the 3D model through [`SessionView::shape`].

use geomorph_geometry::{ShapeReport, VisualFlags};
use serde::{Deserialize, Serialize};

use crate::model::{Question, SessionContext};
use crate::toast::{stack_offset, Toast};

/// Shown while a question is being generated.
pub const LOADING_TEXT: &str = "Generating adaptive question...";

/// Shown when nothing else applies.
pub const IDLE_TEXT: &str = "Ready?";

/// Feedback after a locally correct answer.
pub const CORRECT_FEEDBACK: &str = "Correct! Analyzing performance...";

/// Feedback after a locally incorrect answer.
pub const INCORRECT_FEEDBACK: &str = "Incorrect. Let's see what the AI says...";

/// Hint status as shown to the learner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintView {
    /// Hint text is on screen.
    pub visible: bool,
    /// Hint uses counted for this question.
    pub used: u32,
    /// Highlight and measurement overlays are active.
    pub visual_active: bool,
}

/// A toast with its stack position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastView {
    /// The toast.
    #[serde(flatten)]
    pub toast: Toast,
    /// Pixel offset from the top of the stack.
    pub offset: u32,
}

impl ToastView {
    /// Positions `toasts` in arrival order.
    #[must_use]
    pub fn stack(toasts: &[Toast]) -> Vec<Self> {
        toasts
            .iter()
            .enumerate()
            .map(|(index, toast)| Self {
                toast: toast.clone(),
                offset: stack_offset(index),
            })
            .collect()
    }
}

/// Everything observable about a session at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct SessionView {
    /// Session identity, level and emotion.
    pub session: SessionContext,
    /// Bootstrap has finished.
    pub ready: bool,
    /// The live question, if any.
    pub question: Option<Question>,
    /// Currently selected answer.
    pub answer: String,
    /// Feedback text during the transition window.
    pub feedback: Option<String>,
    /// Diagnostic from the last failed question fetch.
    pub error: Option<String>,
    /// A question fetch is in progress.
    pub loading: bool,
    /// A submission is in its transition window.
    pub submitted: bool,
    /// Hint status.
    pub hint: HintView,
    /// Alternate visual mode is on.
    pub party: bool,
    /// Toasts in arrival order.
    pub toasts: Vec<ToastView>,
    /// The session has been completed and the runtime has stopped.
    pub finished: bool,
}

impl SessionView {
    /// Main text area: loading notice, else the error, else the question,
    /// else the idle prompt.
    #[must_use]
    pub fn display_text(&self) -> &str {
        if self.loading {
            LOADING_TEXT
        } else if let Some(error) = &self.error {
            error
        } else if let Some(question) = &self.question {
            &question.text
        } else {
            IDLE_TEXT
        }
    }

    /// An answer can be submitted right now.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.question.is_some()
            && !self.loading
            && !self.submitted
            && !self.answer.trim().is_empty()
    }

    /// Flags for the render surface.
    #[must_use]
    pub fn visual_flags(&self) -> VisualFlags {
        VisualFlags {
            highlight: self.hint.visual_active,
            party: self.party,
            show_measurements: self.hint.visual_active,
            level: self.session.display_level(),
            emotion: self.session.emotion.clone(),
        }
    }

    /// Geometry, annotations and scene for the live question.
    #[must_use]
    pub fn shape(&self) -> Option<ShapeReport> {
        let question = self.question.as_ref()?;
        let hint = (self.hint.visual_active && !question.hint.is_empty())
            .then_some(question.hint.as_str());
        Some(ShapeReport::build(
            &question.topic,
            Some(question.id),
            hint,
            &self.visual_flags(),
        ))
    }
}
