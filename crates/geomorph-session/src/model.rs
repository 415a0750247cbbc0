//! Session data model and evaluator wire types.
//!
//! Wire structs mirror the evaluator's JSON (snake_case); the session-side
//! types ([`SessionContext`], [`InterventionDirective`]) are what the runtime
//! actually reasons about.

use serde::{Deserialize, Serialize};

/// Session id used whenever the evaluator cannot provide one.
pub const FALLBACK_SESSION_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Level every session starts from (and returns to on reset).
pub const INITIAL_LEVEL: u32 = 1;

/// Highest level the evaluator hands out.
pub const MAX_LEVEL: u32 = 5;

/// Emotion reported before any affect sample exists.
pub const DEFAULT_EMOTION: &str = "neutral";

// ============================================================================
// SessionContext
// ============================================================================

/// Who is learning and where they stand.
///
/// Owned by the runtime. Other components receive it by reference; outside
/// collaborators can only ask for a [`reset`](Self::reset).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// Evaluator session id (or [`FALLBACK_SESSION_ID`]).
    pub session_id: String,
    /// Level as last declared by the evaluator.
    pub current_level: u32,
    /// Latest affect label, if one has been sampled.
    pub emotion: Option<String>,
}

impl SessionContext {
    /// The anonymous session used when bootstrap fails.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            session_id: FALLBACK_SESSION_ID.to_string(),
            current_level: INITIAL_LEVEL,
            emotion: None,
        }
    }

    /// Returns `true` if this is the anonymous fallback session.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.session_id == FALLBACK_SESSION_ID
    }

    /// Emotion label to report, `"neutral"` when unknown.
    #[must_use]
    pub fn emotion_label(&self) -> &str {
        self.emotion.as_deref().unwrap_or(DEFAULT_EMOTION)
    }

    /// Level clamped into the displayable range.
    #[must_use]
    pub fn display_level(&self) -> u32 {
        self.current_level.clamp(INITIAL_LEVEL, MAX_LEVEL)
    }

    /// Returns the level to 1 and forgets the sampled emotion.
    pub fn reset(&mut self) {
        self.current_level = INITIAL_LEVEL;
        self.emotion = None;
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::anonymous()
    }
}

// ============================================================================
// Session endpoints
// ============================================================================

/// Response of `GET session/current`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Session id.
    pub session_id: String,
    /// Level the learner is at.
    pub current_level: u32,
    /// Correct answers so far.
    #[serde(default)]
    pub total_correct: Option<u32>,
    /// Questions answered so far.
    #[serde(default)]
    pub total_questions: Option<u32>,
    /// Accuracy in `0..=1`.
    #[serde(default)]
    pub accuracy: Option<f64>,
}

/// Response of `POST session/{id}/complete`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionAck {
    /// Evaluator status string.
    #[serde(default)]
    pub status: Option<String>,
    /// Final score, when reported.
    #[serde(default)]
    pub final_score: Option<f64>,
}

// ============================================================================
// Question feed
// ============================================================================

/// Body of `POST content/next`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRequest {
    /// Requested difficulty (the current level).
    pub difficulty: u32,
    /// Latest emotion label.
    pub emotion: String,
    /// Requested topic.
    pub topic: String,
}

const fn default_difficulty() -> u32 {
    INITIAL_LEVEL
}

fn default_question_topic() -> String {
    "cube".to_string()
}

/// One problem. Replaced wholesale on every fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Problem id, also the key into the geometry tables.
    pub id: u32,
    /// Question text.
    #[serde(rename = "question")]
    pub text: String,
    /// Answer options in display order.
    #[serde(default)]
    pub options: Vec<String>,
    /// The option that counts as correct.
    pub correct_answer: String,
    /// Hint text.
    #[serde(default)]
    pub hint: String,
    /// Difficulty the question was generated at.
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,
    /// Geometry topic of the question.
    #[serde(default = "default_question_topic")]
    pub topic: String,
}

impl Question {
    /// Exact match of the trimmed answer against the correct one.
    #[must_use]
    pub fn is_correct(&self, answer: &str) -> bool {
        answer.trim() == self.correct_answer
    }
}

// ============================================================================
// Intervention monitor
// ============================================================================

/// Body of `POST learning/monitor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorRequest {
    /// Latest emotion label.
    pub emotion: String,
    /// Seconds spent on the live question.
    pub screen_time: f64,
}

/// Response of `POST learning/monitor`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorResponse {
    /// Intervention name.
    #[serde(default)]
    pub intervention: Option<String>,
}

/// What the evaluator wants done after a monitor poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionDirective {
    /// Reveal the hint.
    ShowHint,
    /// Switch the model to the alternate visual mode.
    ChangeVisual,
    /// Nothing to do.
    #[default]
    None,
}

impl InterventionDirective {
    /// Maps the evaluator's intervention name; unknown names mean nothing.
    #[must_use]
    pub fn from_wire(name: Option<&str>) -> Self {
        match name {
            Some("show_hint") => Self::ShowHint,
            Some("change_visual") => Self::ChangeVisual,
            _ => Self::None,
        }
    }
}

impl From<MonitorResponse> for InterventionDirective {
    fn from(response: MonitorResponse) -> Self {
        Self::from_wire(response.intervention.as_deref())
    }
}

// ============================================================================
// Submission
// ============================================================================

/// Body of `POST learning/submit-answer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    /// Session id.
    pub session_id: String,
    /// Problem id as a string.
    pub question_id: String,
    /// Submitted answer.
    pub answer: String,
    /// The question's correct answer.
    pub correct_answer: String,
    /// Seconds spent before submitting.
    pub time_taken: f64,
    /// Hints used on this question (0 or 1).
    pub hints_used: u32,
    /// Level at submission time.
    pub current_level: u32,
    /// Same dwell, under the name the fuzzy evaluator reads.
    pub screen_time: f64,
}

/// Evaluator verdict attached to a submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FuzzyFeedback {
    /// Level to adopt, when the evaluator declares one.
    #[serde(default)]
    pub new_level: Option<u32>,
    /// Raw proficiency adjustment.
    #[serde(default)]
    pub adjustment: Option<f64>,
    /// Accumulated proficiency.
    #[serde(default)]
    pub proficiency: Option<f64>,
    /// Suggested intervention.
    #[serde(default)]
    pub intervention: Option<String>,
}

/// Response of `POST learning/submit-answer`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResponse {
    /// Evaluator status string.
    #[serde(default)]
    pub status: Option<String>,
    /// Evaluator's own correctness check.
    #[serde(default)]
    pub is_correct: Option<bool>,
    /// Fuzzy feedback, including any new level.
    #[serde(default)]
    pub fuzzy_feedback: Option<FuzzyFeedback>,
}

impl SubmissionResponse {
    /// Level the evaluator declared, if any.
    #[must_use]
    pub fn new_level(&self) -> Option<u32> {
        self.fuzzy_feedback.as_ref().and_then(|f| f.new_level)
    }
}

// ============================================================================
// Affect
// ============================================================================

/// Body of `POST learning/predict-emotion`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionRequest {
    /// Session id the sample is logged against.
    pub session_id: String,
    /// Base64-encoded camera frame.
    pub image_base64: String,
}

/// Response of `POST learning/predict-emotion`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionPrediction {
    /// Predicted label.
    pub emotion: String,
    /// Model confidence.
    #[serde(default)]
    pub confidence: Option<f64>,
}
