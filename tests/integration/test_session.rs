//! End-to-end session tests against a scripted evaluator.
//!
//! Each test serves a mock evaluator with axum on an ephemeral port and drives
//! a real `SessionRuntime` through `HttpBackend`, so requests, status handling
//! and JSON decoding all go over HTTP.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use geomorph_session::{
    Config, GeomorphError, HttpBackend, NoCamera, SessionEvent, SessionHandle, SessionRuntime,
    SessionView, StaticFrame, TutorBackend, FALLBACK_SESSION_ID,
};
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tokio::time::timeout;

// ============================================================================
// Mock evaluator
// ============================================================================

/// Scripted behaviour plus everything the evaluator was sent.
#[derive(Debug, Default)]
struct Evaluator {
    session: Option<(String, u32)>,
    failing_questions: usize,
    intervention: Option<String>,
    new_level: Option<u32>,
    reject_complete: bool,

    next_id: u32,
    auth_headers: Vec<Option<String>>,
    question_requests: Vec<Value>,
    monitor_requests: Vec<Value>,
    submissions: Vec<Value>,
    emotion_requests: Vec<Value>,
    completed: Vec<String>,
}

type Shared = Arc<Mutex<Evaluator>>;

async fn current_session(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut evaluator = state.lock().expect("evaluator lock");
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    evaluator.auth_headers.push(auth);

    match evaluator.session.clone() {
        Some((session_id, level)) => Json(json!({
            "session_id": session_id,
            "current_level": level,
            "total_correct": 0,
            "total_questions": 0,
            "accuracy": 0.0
        }))
        .into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable").into_response(),
    }
}

async fn next_question(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut evaluator = state.lock().expect("evaluator lock");
    evaluator.question_requests.push(body.clone());

    if evaluator.failing_questions > 0 {
        evaluator.failing_questions -= 1;
        return (StatusCode::INTERNAL_SERVER_ERROR, "model offline").into_response();
    }

    evaluator.next_id += 1;
    let id = evaluator.next_id;
    Json(json!({
        "id": id,
        "question": format!("A cylinder has r = 2cm and h = 6cm. Question {id}: what is its volume?"),
        "options": ["12π", "24π", "36π"],
        "correct_answer": "24π",
        "hint": "V = πr²h",
        "difficulty": body["difficulty"],
        "topic": "cylinder"
    }))
    .into_response()
}

async fn monitor(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let mut evaluator = state.lock().expect("evaluator lock");
    evaluator.monitor_requests.push(body);
    Json(json!({ "intervention": evaluator.intervention }))
}

async fn submit_answer(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let mut evaluator = state.lock().expect("evaluator lock");
    let correct = body["answer"] == body["correct_answer"];
    evaluator.submissions.push(body);
    Json(json!({
        "status": "success",
        "is_correct": correct,
        "fuzzy_feedback": {
            "new_level": evaluator.new_level,
            "adjustment": 0.1,
            "proficiency": 0.5
        }
    }))
}

async fn predict_emotion(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let mut evaluator = state.lock().expect("evaluator lock");
    evaluator.emotion_requests.push(body);
    Json(json!({ "emotion": "confused", "confidence": 0.8 }))
}

async fn complete(State(state): State<Shared>, Path(session_id): Path<String>) -> Response {
    let mut evaluator = state.lock().expect("evaluator lock");
    evaluator.completed.push(session_id);
    if evaluator.reject_complete {
        (StatusCode::NOT_FOUND, "no such session").into_response()
    } else {
        Json(json!({ "status": "completed", "final_score": 0.75 })).into_response()
    }
}

/// Serves `evaluator` and returns its API root.
async fn spawn_evaluator(evaluator: Evaluator) -> (String, Shared) {
    let state: Shared = Arc::new(Mutex::new(evaluator));
    let router = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/v1/session/current", get(current_session))
        .route("/api/v1/session/:id/complete", post(complete))
        .route("/api/v1/content/next", post(next_question))
        .route("/api/v1/learning/monitor", post(monitor))
        .route("/api/v1/learning/submit-answer", post(submit_answer))
        .route("/api/v1/learning/predict-emotion", post(predict_emotion))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    let health = reqwest::get(format!("http://{addr}/health"))
        .await
        .expect("Mock evaluator not serving");
    assert!(health.status().is_success());

    (format!("http://{addr}/api/v1"), state)
}

// ============================================================================
// Helpers
// ============================================================================

/// Short timings so a whole cycle takes a fraction of a second.
fn fast_config(base_url: &str) -> Config {
    Config {
        api_base_url: base_url.to_string(),
        auth_token: Some("secret".to_string()),
        monitor_interval_ms: 50,
        affect_interval_ms: 80,
        transition_delay_ms: 150,
        toast_duration_ms: 300,
        toast_exit_ms: 20,
        request_timeout_ms: 2000,
        ..Config::default()
    }
}

fn start(config: Config) -> (SessionHandle, JoinHandle<()>) {
    start_with_frames(config, false)
}

fn start_with_frames(config: Config, camera: bool) -> (SessionHandle, JoinHandle<()>) {
    config.validate().expect("Invalid test config");
    let backend = Arc::new(HttpBackend::new(&config).expect("Failed to build backend"));
    if camera {
        SessionRuntime::spawn(config, backend, Arc::new(StaticFrame("aGVsbG8=".to_string())))
    } else {
        SessionRuntime::spawn(config, backend, Arc::new(NoCamera))
    }
}

async fn until(handle: &SessionHandle, predicate: impl FnMut(&SessionView) -> bool) -> SessionView {
    timeout(Duration::from_secs(5), handle.wait_for(predicate))
        .await
        .expect("Timeout waiting for session state")
        .expect("Runtime stopped")
}

fn live_id(view: &SessionView) -> Option<u32> {
    view.question.as_ref().map(|q| q.id)
}

// ============================================================================
// Session lifecycle
// ============================================================================

/// A full cycle: bootstrap, question, correct answer, level up, next question,
/// completion.
#[tokio::test]
async fn test_full_cycle_with_level_up() {
    let (base_url, evaluator) = spawn_evaluator(Evaluator {
        session: Some(("sess-1".to_string(), 2)),
        new_level: Some(3),
        ..Evaluator::default()
    })
    .await;
    let (handle, join) = start(fast_config(&base_url));
    let mut events = handle.subscribe();

    let view = until(&handle, |v| live_id(v) == Some(1)).await;
    assert_eq!(view.session.session_id, "sess-1");
    assert_eq!(view.session.current_level, 2);
    assert!(view.display_text().starts_with("A cylinder has r = 2cm"));

    // The live question drives the 3D description
    let shape = view.shape().expect("live question has a shape");
    assert_eq!(shape.spec.primitive.to_string(), "cylinder");

    handle.select_answer("24π").await.expect("select");
    handle.submit().await.expect("submit");

    let view = until(&handle, |v| !v.toasts.is_empty()).await;
    assert_eq!(view.toasts[0].toast.message, "Level 2 → 3 | Great progress!");
    assert_eq!(view.session.current_level, 3);

    let view = until(&handle, |v| live_id(v) == Some(2)).await;
    assert!(view.feedback.is_none());
    assert!(view.answer.is_empty());

    until(&handle, |v| v.toasts.is_empty()).await;

    {
        let evaluator = evaluator.lock().expect("evaluator lock");
        assert_eq!(evaluator.auth_headers, vec![Some("Bearer secret".to_string())]);

        let submission = &evaluator.submissions[0];
        assert_eq!(submission["session_id"], "sess-1");
        assert_eq!(submission["question_id"], "1");
        assert_eq!(submission["answer"], "24π");
        assert_eq!(submission["correct_answer"], "24π");
        assert_eq!(submission["hints_used"], 0);
        assert_eq!(submission["current_level"], 2);
        assert!(submission["time_taken"].is_number());
        assert_eq!(submission["time_taken"], submission["screen_time"]);

        assert_eq!(evaluator.question_requests[0]["difficulty"], 2);
        assert_eq!(evaluator.question_requests[0]["emotion"], "neutral");
        assert_eq!(evaluator.question_requests[0]["topic"], "geometry");
        assert_eq!(evaluator.question_requests[1]["difficulty"], 3);
    }

    assert!(handle.finish().await.expect("finish"));
    join.await.expect("runtime task");
    assert_eq!(
        evaluator.lock().expect("evaluator lock").completed,
        vec!["sess-1".to_string()]
    );

    let mut names = Vec::new();
    while let Ok(event) = events.try_recv() {
        names.push(event.event_name());
    }
    for expected in [
        "session_ready",
        "question_loaded",
        "feedback_shown",
        "toast_added",
        "level_changed",
        "cycle_complete",
        "toast_removed",
        "session_finished",
    ] {
        assert!(names.contains(&expected), "missing {expected} in {names:?}");
    }
}

/// A failing session endpoint falls back to the anonymous session at level 1.
#[tokio::test]
async fn test_bootstrap_fallback_on_server_error() {
    let (base_url, evaluator) = spawn_evaluator(Evaluator::default()).await;
    let (handle, join) = start(fast_config(&base_url));

    let view = until(&handle, |v| v.question.is_some()).await;
    assert_eq!(view.session.session_id, FALLBACK_SESSION_ID);
    assert_eq!(view.session.current_level, 1);
    assert!(view.error.is_none());

    assert!(handle.finish().await.expect("finish"));
    join.await.expect("runtime task");
    assert_eq!(
        evaluator.lock().expect("evaluator lock").completed,
        vec![FALLBACK_SESSION_ID.to_string()]
    );
}

/// A failed fetch shows the status and body and leaves no live question.
#[tokio::test]
async fn test_question_failure_surfaces_status_and_body() {
    let (base_url, evaluator) = spawn_evaluator(Evaluator {
        failing_questions: 1,
        ..Evaluator::default()
    })
    .await;
    let (handle, _join) = start(fast_config(&base_url));

    let view = until(&handle, |v| v.error.is_some()).await;
    assert_eq!(view.display_text(), "API Failed (500): model offline");
    assert!(view.question.is_none());
    assert!(view.shape().is_none());

    // Without a live question the monitor sends nothing
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(evaluator.lock().expect("evaluator lock").monitor_requests.is_empty());
    handle.shutdown().await.expect("shutdown");
}

// ============================================================================
// Interventions
// ============================================================================

/// Repeated `show_hint` directives reveal and count the hint once.
#[tokio::test]
async fn test_monitor_show_hint_counts_once() {
    let (base_url, evaluator) = spawn_evaluator(Evaluator {
        session: Some(("sess-2".to_string(), 1)),
        intervention: Some("show_hint".to_string()),
        ..Evaluator::default()
    })
    .await;
    let (handle, _join) = start(fast_config(&base_url));

    let view = until(&handle, |v| v.hint.visible).await;
    assert_eq!(view.hint.used, 1);
    assert!(view.visual_flags().show_measurements);

    // Let several more polls arrive
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(evaluator.lock().expect("evaluator lock").monitor_requests.len() >= 3);
    assert_eq!(handle.view().hint.used, 1);

    evaluator.lock().expect("evaluator lock").intervention = None;
    handle.select_answer("12π").await.expect("select");
    handle.submit().await.expect("submit");
    let view = until(&handle, |v| live_id(v) == Some(2)).await;
    assert_eq!(view.hint.used, 0);

    let evaluator = evaluator.lock().expect("evaluator lock");
    assert_eq!(evaluator.submissions[0]["hints_used"], 1);
    let poll = &evaluator.monitor_requests[0];
    assert_eq!(poll["emotion"], "neutral");
    assert!(poll["screen_time"].as_f64().is_some_and(|t| t > 0.0));
}

/// `change_visual` switches to party mode for the current question only.
#[tokio::test]
async fn test_monitor_change_visual() {
    let (base_url, evaluator) = spawn_evaluator(Evaluator {
        intervention: Some("change_visual".to_string()),
        ..Evaluator::default()
    })
    .await;
    let (handle, _join) = start(fast_config(&base_url));

    let view = until(&handle, |v| v.party).await;
    let frame = view.shape().expect("shape").frame;
    assert!(frame.motion.bob);

    // Stop further directives so the next question stays calm
    evaluator.lock().expect("evaluator lock").intervention = None;
    handle.select_answer("24π").await.expect("select");
    handle.submit().await.expect("submit");
    let view = until(&handle, |v| live_id(v) == Some(2)).await;
    assert!(!view.party);
    handle.shutdown().await.expect("shutdown");
}

/// Unknown intervention names are ignored.
#[tokio::test]
async fn test_unknown_intervention_is_ignored() {
    let (base_url, _evaluator) = spawn_evaluator(Evaluator {
        intervention: Some("spin_faster".to_string()),
        ..Evaluator::default()
    })
    .await;
    let (handle, _join) = start(fast_config(&base_url));

    until(&handle, |v| v.question.is_some()).await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    let view = handle.view();
    assert!(!view.hint.visible);
    assert!(!view.party);
    handle.shutdown().await.expect("shutdown");
}

// ============================================================================
// Submission edge cases
// ============================================================================

/// No `new_level` in the feedback leaves level and toasts alone.
#[tokio::test]
async fn test_missing_new_level_changes_nothing() {
    let (base_url, _evaluator) = spawn_evaluator(Evaluator::default()).await;
    let (handle, _join) = start(fast_config(&base_url));
    let mut events = handle.subscribe();

    until(&handle, |v| live_id(v) == Some(1)).await;
    handle.select_answer("36π").await.expect("select");
    handle.submit().await.expect("submit");

    let view = until(&handle, |v| v.feedback.is_some()).await;
    assert_eq!(
        view.feedback.as_deref(),
        Some("Incorrect. Let's see what the AI says...")
    );

    let view = until(&handle, |v| live_id(v) == Some(2)).await;
    assert_eq!(view.session.current_level, 1);
    assert!(view.toasts.is_empty());

    while let Ok(event) = events.try_recv() {
        assert!(!matches!(event, SessionEvent::LevelChanged(_) | SessionEvent::ToastAdded(_)));
    }
    handle.shutdown().await.expect("shutdown");
}

/// An unreachable evaluator never blocks the learner.
#[tokio::test]
async fn test_unreachable_evaluator_still_degrades_gracefully() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let (handle, join) = start(fast_config(&format!("http://127.0.0.1:{port}/api/v1")));

    let view = until(&handle, |v| v.error.is_some()).await;
    assert!(view.session.is_anonymous());
    assert!(view.question.is_none());

    // Completion fails too, but the runtime still stops
    assert!(!handle.finish().await.expect("finish"));
    join.await.expect("runtime task");
}

/// A rejected completion is reported but does not keep the runtime alive.
#[tokio::test]
async fn test_rejected_completion() {
    let (base_url, _evaluator) = spawn_evaluator(Evaluator {
        reject_complete: true,
        ..Evaluator::default()
    })
    .await;
    let (handle, join) = start(fast_config(&base_url));

    until(&handle, |v| v.ready).await;
    assert!(!handle.finish().await.expect("finish"));
    join.await.expect("runtime task");
    assert!(handle.view().finished);
    assert!(matches!(handle.submit().await, Err(GeomorphError::RuntimeClosed)));
}

// ============================================================================
// Affect
// ============================================================================

/// Sampled emotions are carried into later requests.
#[tokio::test]
async fn test_affect_sample_feeds_requests() {
    let (base_url, evaluator) = spawn_evaluator(Evaluator {
        session: Some(("sess-3".to_string(), 1)),
        ..Evaluator::default()
    })
    .await;
    let (handle, _join) = start_with_frames(fast_config(&base_url), true);

    until(&handle, |v| v.question.is_some()).await;
    let view = until(&handle, |v| v.session.emotion.is_some()).await;
    assert_eq!(view.session.emotion_label(), "confused");

    handle.select_answer("24π").await.expect("select");
    handle.submit().await.expect("submit");
    until(&handle, |v| live_id(v) == Some(2)).await;

    let evaluator = evaluator.lock().expect("evaluator lock");
    let sample = &evaluator.emotion_requests[0];
    assert_eq!(sample["image_base64"], "aGVsbG8=");
    assert!(sample["session_id"].is_string());
    assert_eq!(evaluator.question_requests[1]["emotion"], "confused");
    drop(evaluator);
    handle.shutdown().await.expect("shutdown");
}

// ============================================================================
// Backend
// ============================================================================

/// The HTTP backend speaks every endpoint directly.
#[tokio::test]
async fn test_http_backend_endpoints() {
    let (base_url, evaluator) = spawn_evaluator(Evaluator {
        session: Some(("sess-4".to_string(), 4)),
        intervention: Some("show_hint".to_string()),
        ..Evaluator::default()
    })
    .await;
    let backend = HttpBackend::with_timeout(
        format!("{base_url}/"),
        None,
        Duration::from_secs(2),
    )
    .expect("backend");

    let session = backend.current_session().await.expect("session");
    assert_eq!(session.session_id, "sess-4");
    assert_eq!(session.current_level, 4);

    let ack = backend.complete_session("sess-4").await.expect("complete");
    assert_eq!(ack.status.as_deref(), Some("completed"));

    let evaluator = evaluator.lock().expect("evaluator lock");
    assert_eq!(evaluator.auth_headers, vec![None]);
    assert_eq!(evaluator.completed, vec!["sess-4".to_string()]);
}
