//! The session runtime.
//!
//! One cooperative event loop owns every piece of session state. Commands
//! from the [`SessionHandle`] and completions from spawned work (network
//! calls, timers, recurring tasks) arrive on two channels and are handled one
//! at a time, so no locking is needed. Network calls never block the loop:
//! each is spawned and reports back as a tagged completion.
//!
//! Staleness is handled with counters rather than cancellation:
//!
//! - every live-question change bumps an epoch; monitor ticks and monitor
//!   results carry the epoch they were scheduled for and are dropped if it
//!   no longer matches;
//! - every question fetch gets a sequence number; only the latest fetch may
//!   replace the live question;
//! - every accepted submission gets a sequence number; its transition timer
//!   always completes the cycle unless a newer submission replaced it.

use std::future::Future;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::affect::{self, FrameSource};
use crate::backend::TutorBackend;
use crate::config::Config;
use crate::error::{GeomorphError, Result};
use crate::events::{EventBroadcaster, SessionEvent};
use crate::hint::{HintChange, HintState};
use crate::model::{
    InterventionDirective, MonitorRequest, Question, QuestionRequest, SessionContext,
    SessionInfo, SubmissionRequest, SubmissionResponse, FALLBACK_SESSION_ID, INITIAL_LEVEL,
};
use crate::schedule::RecurringTask;
use crate::toast::{Toast, ToastQueue};
use crate::view::{HintView, SessionView, ToastView, CORRECT_FEEDBACK, INCORRECT_FEEDBACK};

/// Commands buffered between the handle and the loop.
const COMMAND_BUFFER: usize = 32;

// ============================================================================
// Handle
// ============================================================================

#[derive(Debug)]
enum Command {
    SelectAnswer(String),
    Submit,
    ToggleHint,
    DismissToast(u64),
    ResetSession,
    Finish(oneshot::Sender<bool>),
    Shutdown,
}

/// Drives and observes a running session.
///
/// Cloning is cheap; every clone talks to the same runtime. Commands return
/// `GeomorphError::RuntimeClosed` once the runtime has stopped.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<SessionView>,
    events: EventBroadcaster,
}

impl SessionHandle {
    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| GeomorphError::RuntimeClosed)
    }

    /// Selects an answer. Ignored while a submission is in its transition
    /// window or while the next question is loading.
    pub async fn select_answer(&self, answer: impl Into<String>) -> Result<()> {
        self.send(Command::SelectAnswer(answer.into())).await
    }

    /// Submits the selected answer. Ignored without a live question, with an
    /// empty answer, while a question is loading, or while a submission is
    /// already in flight.
    pub async fn submit(&self) -> Result<()> {
        self.send(Command::Submit).await
    }

    /// Shows or hides the hint of the live question.
    pub async fn toggle_hint(&self) -> Result<()> {
        self.send(Command::ToggleHint).await
    }

    /// Dismisses a toast. Unknown or already removed ids are ignored.
    pub async fn dismiss_toast(&self, id: u64) -> Result<()> {
        self.send(Command::DismissToast(id)).await
    }

    /// Returns the level to 1 and forgets the sampled emotion.
    pub async fn reset_session(&self) -> Result<()> {
        self.send(Command::ResetSession).await
    }

    /// Completes the session and stops the runtime.
    ///
    /// Returns whether the evaluator acknowledged the completion; the runtime
    /// stops either way.
    pub async fn finish(&self) -> Result<bool> {
        let (reply, acknowledged) = oneshot::channel();
        self.send(Command::Finish(reply)).await?;
        acknowledged.await.map_err(|_| GeomorphError::RuntimeClosed)
    }

    /// Stops the runtime without completing the session.
    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }

    /// The latest snapshot.
    #[must_use]
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// A receiver notified on every new snapshot.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// Waits until a snapshot satisfies `predicate` and returns it.
    ///
    /// The current snapshot is checked first.
    pub async fn wait_for(&self, predicate: impl FnMut(&SessionView) -> bool) -> Result<SessionView> {
        let mut view = self.view.clone();
        let matched = view
            .wait_for(predicate)
            .await
            .map_err(|_| GeomorphError::RuntimeClosed)?;
        Ok(matched.clone())
    }

    /// Subscribes to discrete session events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

// ============================================================================
// Runtime
// ============================================================================

/// Work that finished outside the loop and reports back into it.
#[derive(Debug)]
enum Completion {
    Session(Result<SessionInfo>),
    Question { seq: u64, result: Result<Question> },
    MonitorTick { epoch: u64, origin: Instant },
    Monitor {
        epoch: u64,
        result: Result<InterventionDirective>,
    },
    Submission(Result<SubmissionResponse>),
    TransitionElapsed { submission: u64 },
    AffectTick,
    Affect(Option<String>),
    ToastExpired(u64),
    ToastGone(u64),
}

/// What the monitor task needs on every tick.
#[derive(Debug, Clone, Copy)]
struct MonitorSnapshot {
    epoch: u64,
    origin: Instant,
}

/// The session event loop and all state it owns.
pub struct SessionRuntime {
    config: Config,
    backend: Arc<dyn TutorBackend>,
    frames: Arc<dyn FrameSource>,

    commands: mpsc::Receiver<Command>,
    completions: mpsc::UnboundedReceiver<Completion>,
    completion_tx: mpsc::UnboundedSender<Completion>,
    view_tx: watch::Sender<SessionView>,
    events: EventBroadcaster,

    context: SessionContext,
    ready: bool,
    question: Option<Question>,
    epoch: u64,
    question_started: Instant,
    fetch_seq: u64,
    loading: bool,
    error: Option<String>,
    answer: String,
    feedback: Option<String>,
    submitted: bool,
    submission_seq: u64,
    hint: HintState,
    party: bool,
    toasts: ToastQueue,
    affect_in_flight: bool,
    finished: bool,

    monitor_task: Option<RecurringTask>,
    affect_task: Option<RecurringTask>,
}

impl std::fmt::Debug for SessionRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRuntime")
            .field("context", &self.context)
            .field("epoch", &self.epoch)
            .field("loading", &self.loading)
            .field("submitted", &self.submitted)
            .finish_non_exhaustive()
    }
}

impl SessionRuntime {
    /// Builds a runtime and the handle that drives it.
    ///
    /// Nothing happens until [`run`](Self::run) is awaited.
    #[must_use]
    pub fn start(
        config: Config,
        backend: Arc<dyn TutorBackend>,
        frames: Arc<dyn FrameSource>,
    ) -> (SessionHandle, Self) {
        let (command_tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let (completion_tx, completions) = mpsc::unbounded_channel();
        let (view_tx, view) = watch::channel(SessionView::default());
        let events = EventBroadcaster::default();

        let handle = SessionHandle {
            commands: command_tx,
            view,
            events: events.clone(),
        };
        let runtime = Self {
            config,
            backend,
            frames,
            commands,
            completions,
            completion_tx,
            view_tx,
            events,
            context: SessionContext::anonymous(),
            ready: false,
            question: None,
            epoch: 0,
            question_started: Instant::now(),
            fetch_seq: 0,
            loading: false,
            error: None,
            answer: String::new(),
            feedback: None,
            submitted: false,
            submission_seq: 0,
            hint: HintState::new(),
            party: false,
            toasts: ToastQueue::new(),
            affect_in_flight: false,
            finished: false,
            monitor_task: None,
            affect_task: None,
        };
        (handle, runtime)
    }

    /// Builds a runtime and spawns its loop on the current tokio runtime.
    #[must_use]
    pub fn spawn(
        config: Config,
        backend: Arc<dyn TutorBackend>,
        frames: Arc<dyn FrameSource>,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (handle, runtime) = Self::start(config, backend, frames);
        (handle, tokio::spawn(runtime.run()))
    }

    /// Runs the event loop until the session is finished, shut down, or every
    /// handle is dropped.
    pub async fn run(mut self) {
        info!(
            api = %self.config.base_url(),
            topic = %self.config.topic,
            "Session runtime started"
        );
        self.bootstrap();
        self.affect_task = Some(RecurringTask::spawn(
            "affect-sampler",
            self.config.affect_interval(),
            (),
            self.completion_tx.clone(),
            |()| Completion::AffectTick,
        ));
        self.publish();

        loop {
            let flow = tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => {
                        debug!("All session handles dropped");
                        ControlFlow::Break(())
                    }
                },
                Some(completion) = self.completions.recv() => {
                    self.handle_completion(completion);
                    ControlFlow::Continue(())
                }
            };
            self.publish();
            if flow.is_break() {
                break;
            }
        }

        self.stop_tasks();
        info!(session_id = %self.context.session_id, "Session runtime stopped");
    }

    // ------------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------------

    fn publish(&self) {
        self.view_tx.send_replace(self.snapshot());
    }

    fn snapshot(&self) -> SessionView {
        SessionView {
            session: self.context.clone(),
            ready: self.ready,
            question: self.question.clone(),
            answer: self.answer.clone(),
            feedback: self.feedback.clone(),
            error: self.error.clone(),
            loading: self.loading,
            submitted: self.submitted,
            hint: HintView {
                visible: self.hint.is_visible(),
                used: self.hint.hints_used(),
                visual_active: self.hint.visual_hints_active(),
            },
            party: self.party,
            toasts: ToastView::stack(self.toasts.toasts()),
            finished: self.finished,
        }
    }

    fn emit(&self, event: SessionEvent) {
        debug!(event = event.event_name(), "Session event");
        self.events.send(event);
    }

    /// Runs `work` off the loop and feeds its result back in.
    fn spawn_work<F>(&self, work: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let tx = self.completion_tx.clone();
        tokio::spawn(async move {
            // The loop may already be gone; nothing to report to then
            tx.send(work.await).ok();
        });
    }

    fn after(&self, delay: Duration, completion: Completion) {
        self.spawn_work(async move {
            tokio::time::sleep(delay).await;
            completion
        });
    }

    fn stop_tasks(&mut self) {
        if let Some(task) = self.monitor_task.take() {
            task.cancel();
        }
        if let Some(task) = self.affect_task.take() {
            task.cancel();
        }
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    async fn handle_command(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::SelectAnswer(answer) => {
                if self.submitted {
                    debug!("Ignoring answer selection during transition");
                } else if self.loading {
                    debug!("Ignoring answer selection while loading");
                } else {
                    self.answer = answer;
                }
            }
            Command::Submit => self.submit(),
            Command::ToggleHint => self.toggle_hint(),
            Command::DismissToast(id) => self.start_toast_exit(id),
            Command::ResetSession => {
                info!("Resetting session level and emotion");
                self.context.reset();
                self.emit(SessionEvent::SessionReset);
            }
            Command::Finish(reply) => {
                let acknowledged = self.finish().await;
                reply.send(acknowledged).ok();
                return ControlFlow::Break(());
            }
            Command::Shutdown => {
                info!("Session runtime shutting down");
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn toggle_hint(&mut self) {
        if self.question.is_none() {
            debug!("No live question, ignoring hint toggle");
            return;
        }
        match self.hint.toggle() {
            HintChange::Revealed { counted } => {
                info!(counted, "Hint shown by learner");
                self.emit(SessionEvent::hint_revealed(false, counted));
            }
            HintChange::Hidden => self.emit(SessionEvent::HintHidden),
            HintChange::Unchanged => {}
        }
    }

    async fn finish(&mut self) -> bool {
        self.stop_tasks();
        let acknowledged = match self.backend.complete_session(&self.context.session_id).await {
            Ok(ack) => {
                info!(status = ?ack.status, final_score = ?ack.final_score, "Session completed");
                true
            }
            Err(e) => {
                debug!(error = %e, "Completing session failed, finishing anyway");
                false
            }
        };
        self.finished = true;
        self.emit(SessionEvent::SessionFinished(
            crate::events::SessionFinishedPayload { acknowledged },
        ));
        acknowledged
    }

    // ------------------------------------------------------------------------
    // Completions
    // ------------------------------------------------------------------------

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Session(result) => self.on_session(result),
            Completion::Question { seq, result } => self.on_question(seq, result),
            Completion::MonitorTick { epoch, origin } => self.on_monitor_tick(epoch, origin),
            Completion::Monitor { epoch, result } => self.on_monitor(epoch, result),
            Completion::Submission(result) => self.on_submission(result),
            Completion::TransitionElapsed { submission } => self.on_transition(submission),
            Completion::AffectTick => self.on_affect_tick(),
            Completion::Affect(label) => self.on_affect(label),
            Completion::ToastExpired(id) => self.start_toast_exit(id),
            Completion::ToastGone(id) => {
                if self.toasts.remove(id) {
                    self.emit(SessionEvent::ToastRemoved { id });
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Session bootstrap
    // ------------------------------------------------------------------------

    fn bootstrap(&self) {
        let backend = Arc::clone(&self.backend);
        self.spawn_work(async move { Completion::Session(backend.current_session().await) });
    }

    fn on_session(&mut self, result: Result<SessionInfo>) {
        if self.ready {
            return;
        }
        let fallback = match result {
            Ok(info) => {
                info!(
                    session_id = %info.session_id,
                    level = info.current_level,
                    "Session loaded"
                );
                self.context.session_id = info.session_id;
                self.context.current_level = info.current_level;
                false
            }
            Err(e) => {
                warn!(error = %e, "Session bootstrap failed, continuing as anonymous session");
                self.context.session_id = FALLBACK_SESSION_ID.to_string();
                self.context.current_level = INITIAL_LEVEL;
                true
            }
        };
        self.ready = true;
        self.emit(SessionEvent::session_ready(
            self.context.session_id.clone(),
            self.context.current_level,
            fallback,
        ));
        self.fetch_next();
    }

    // ------------------------------------------------------------------------
    // Question feed
    // ------------------------------------------------------------------------

    fn fetch_next(&mut self) {
        self.fetch_seq += 1;
        let seq = self.fetch_seq;
        self.loading = true;

        let request = QuestionRequest {
            difficulty: self.context.current_level,
            emotion: self.context.emotion_label().to_string(),
            topic: self.config.topic.clone(),
        };
        debug!(seq, difficulty = request.difficulty, emotion = %request.emotion, "Fetching question");

        let backend = Arc::clone(&self.backend);
        self.spawn_work(async move {
            let result = backend.next_question(&request).await;
            Completion::Question { seq, result }
        });
    }

    fn on_question(&mut self, seq: u64, result: Result<Question>) {
        if seq != self.fetch_seq {
            debug!(seq, latest = self.fetch_seq, "Dropping superseded question response");
            return;
        }
        self.loading = false;

        match result {
            Ok(question) => {
                info!(id = question.id, topic = %question.topic, "Question loaded");
                self.error = None;
                self.emit(SessionEvent::QuestionLoaded(
                    crate::events::QuestionLoadedPayload {
                        id: question.id,
                        topic: question.topic.clone(),
                        difficulty: question.difficulty,
                    },
                ));
                self.set_live(Some(question));
            }
            Err(e) => {
                warn!(error = %e, "Question fetch failed");
                let message = e.to_string();
                self.error = Some(message.clone());
                self.set_live(None);
                self.emit(SessionEvent::question_failed(message));
            }
        }
    }

    /// Replaces the live question and resets everything scoped to it.
    fn set_live(&mut self, question: Option<Question>) {
        self.epoch += 1;
        self.question_started = Instant::now();
        self.hint.reset();
        if self.party {
            self.party = false;
            self.emit(SessionEvent::VisualModeChanged { party: false });
        }
        self.question = question;

        if let Some(task) = self.monitor_task.take() {
            task.cancel();
        }
        if self.question.is_some() {
            let snapshot = MonitorSnapshot {
                epoch: self.epoch,
                origin: self.question_started,
            };
            self.monitor_task = Some(RecurringTask::spawn(
                "intervention-monitor",
                self.config.monitor_interval(),
                snapshot,
                self.completion_tx.clone(),
                |s| Completion::MonitorTick {
                    epoch: s.epoch,
                    origin: s.origin,
                },
            ));
        }
    }

    // ------------------------------------------------------------------------
    // Intervention monitor
    // ------------------------------------------------------------------------

    fn on_monitor_tick(&self, epoch: u64, origin: Instant) {
        if epoch != self.epoch || self.submitted || self.loading || self.question.is_none() {
            debug!(epoch, "Skipping monitor tick");
            return;
        }

        let request = MonitorRequest {
            emotion: self.context.emotion_label().to_string(),
            screen_time: origin.elapsed().as_secs_f64(),
        };
        debug!(epoch, screen_time = request.screen_time, "Polling for interventions");

        let backend = Arc::clone(&self.backend);
        self.spawn_work(async move {
            let result = backend.monitor(&request).await;
            Completion::Monitor { epoch, result }
        });
    }

    fn on_monitor(&mut self, epoch: u64, result: Result<InterventionDirective>) {
        if epoch != self.epoch {
            debug!(epoch, live = self.epoch, "Dropping stale monitor result");
            return;
        }
        match result {
            Err(e) if e.is_transient() => debug!(error = %e, "Monitor poll failed"),
            Err(e) => warn!(error = %e, "Monitor poll rejected"),
            Ok(InterventionDirective::ShowHint) => {
                if let HintChange::Revealed { counted } = self.hint.auto_reveal() {
                    info!(counted, "Hint revealed by intervention");
                    self.emit(SessionEvent::hint_revealed(true, counted));
                }
            }
            Ok(InterventionDirective::ChangeVisual) => {
                if !self.party {
                    info!("Switching to alternate visual mode");
                    self.party = true;
                    self.emit(SessionEvent::VisualModeChanged { party: true });
                }
            }
            Ok(InterventionDirective::None) => {}
        }
    }

    // ------------------------------------------------------------------------
    // Submission & leveling
    // ------------------------------------------------------------------------

    fn submit(&mut self) {
        if self.submitted {
            debug!("Submission already in flight");
            return;
        }
        if self.loading {
            debug!("Question loading, ignoring submit");
            return;
        }
        let Some(question) = &self.question else {
            debug!("No live question, ignoring submit");
            return;
        };
        if self.answer.trim().is_empty() {
            debug!("Empty answer, ignoring submit");
            return;
        }

        let correct = question.is_correct(&self.answer);
        let dwell = self.question_started.elapsed().as_secs_f64();
        let request = SubmissionRequest {
            session_id: self.context.session_id.clone(),
            question_id: question.id.to_string(),
            answer: self.answer.clone(),
            correct_answer: question.correct_answer.clone(),
            time_taken: dwell,
            hints_used: self.hint.hints_used(),
            current_level: self.context.current_level,
            screen_time: dwell,
        };

        self.submitted = true;
        self.submission_seq += 1;
        let text = if correct {
            CORRECT_FEEDBACK
        } else {
            INCORRECT_FEEDBACK
        };
        self.feedback = Some(text.to_string());
        info!(question_id = %request.question_id, correct, "Answer submitted");
        self.emit(SessionEvent::feedback_shown(correct, text));

        let backend = Arc::clone(&self.backend);
        self.spawn_work(async move {
            Completion::Submission(backend.submit_answer(&request).await)
        });
        self.after(
            self.config.transition_delay(),
            Completion::TransitionElapsed {
                submission: self.submission_seq,
            },
        );
    }

    fn on_submission(&mut self, result: Result<SubmissionResponse>) {
        match result {
            Ok(response) => match response.new_level() {
                Some(level) => self.apply_level(level),
                None => debug!("Evaluator declared no level"),
            },
            Err(e) if e.is_transient() => {
                debug!(error = %e, "Submission failed, level unchanged");
            }
            Err(e) => warn!(error = %e, "Submission rejected, level unchanged"),
        }
    }

    fn apply_level(&mut self, level: u32) {
        let previous = self.context.current_level;
        let Some((message, kind)) = Toast::level_change(previous, level) else {
            return;
        };

        let toast = self.toasts.push(message, kind);
        self.after(
            self.config.toast_duration(),
            Completion::ToastExpired(toast.id),
        );
        self.emit(SessionEvent::ToastAdded(toast));

        self.context.current_level = level;
        info!(from = previous, to = level, "Level changed");
        self.emit(SessionEvent::level_changed(previous, level));
    }

    fn on_transition(&mut self, submission: u64) {
        if !self.submitted || submission != self.submission_seq {
            debug!(submission, latest = self.submission_seq, "Dropping stale transition");
            return;
        }
        self.answer.clear();
        self.submitted = false;
        self.feedback = None;
        self.emit(SessionEvent::CycleComplete);
        self.fetch_next();
    }

    // ------------------------------------------------------------------------
    // Toasts
    // ------------------------------------------------------------------------

    fn start_toast_exit(&mut self, id: u64) {
        if self.toasts.begin_exit(id) {
            self.after(self.config.toast_exit(), Completion::ToastGone(id));
        }
    }

    // ------------------------------------------------------------------------
    // Affect
    // ------------------------------------------------------------------------

    fn on_affect_tick(&mut self) {
        if self.affect_in_flight {
            debug!("Affect sample still in flight, skipping tick");
            return;
        }
        self.affect_in_flight = true;

        let backend = Arc::clone(&self.backend);
        let frames = Arc::clone(&self.frames);
        let session_id = self.context.session_id.clone();
        let fallback = self.config.fallback_emotions.clone();
        self.spawn_work(async move {
            let label = affect::sample(backend.as_ref(), frames.as_ref(), &session_id, &fallback).await;
            Completion::Affect(label)
        });
    }

    fn on_affect(&mut self, label: Option<String>) {
        self.affect_in_flight = false;
        if let Some(emotion) = label {
            debug!(%emotion, "Affect sampled");
            self.context.emotion = Some(emotion.clone());
            self.emit(SessionEvent::AffectSampled { emotion });
        }
    }
}
