//! GeoMorph Session
//!
//! Runs one adaptive tutoring session against the remote evaluator: bootstrap,
//! question feed, intervention monitor, hint accounting, submission and
//! leveling, toasts, and periodic affect sampling.
//!
//! # Architecture
//!
//! A [`SessionRuntime`] owns all session state and runs a single event loop.
//! Front ends talk to it through a cloneable [`SessionHandle`]: commands go
//! in, [`SessionView`] snapshots and [`SessionEvent`]s come out. Every call
//! to the evaluator goes through the [`TutorBackend`] trait; [`HttpBackend`]
//! is the production implementation.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use geomorph_session::{Config, HttpBackend, NoCamera, SessionRuntime};
//!
//! # async fn example() -> geomorph_session::Result<()> {
//! let config = Config::load()?;
//! let backend = Arc::new(HttpBackend::new(&config)?);
//! let (handle, _task) = SessionRuntime::spawn(config, backend, Arc::new(NoCamera));
//!
//! let view = handle.wait_for(|v| v.question.is_some()).await?;
//! handle.select_answer(view.question.map(|q| q.correct_answer).unwrap_or_default()).await?;
//! handle.submit().await?;
//! # Ok(())
//! # }
//! ```

pub mod affect;
pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod hint;
pub mod model;
pub mod runtime;
pub mod schedule;
pub mod toast;
pub mod view;

pub use affect::{fallback_label, FrameSource, NoCamera, StaticFrame};
pub use backend::{HttpBackend, TutorBackend};
pub use config::{Config, CONFIG_FILE_NAME};
pub use error::{GeomorphError, Result};
pub use events::{EventBroadcaster, SessionEvent};
pub use hint::{HintChange, HintState};
pub use model::{
    CompletionAck, EmotionPrediction, EmotionRequest, FuzzyFeedback, InterventionDirective,
    MonitorRequest, MonitorResponse, Question, QuestionRequest, SessionContext, SessionInfo,
    SubmissionRequest, SubmissionResponse, DEFAULT_EMOTION, FALLBACK_SESSION_ID, INITIAL_LEVEL,
    MAX_LEVEL,
};
pub use runtime::{SessionHandle, SessionRuntime};
pub use schedule::RecurringTask;
pub use toast::{stack_offset, Toast, ToastKind, ToastQueue};
pub use view::{HintView, SessionView, ToastView};
