//! HTTP surface driven in-process.

use std::{sync::Arc, time::Duration};

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use egg_timer::{
    api::create_router,
    services::{PreferenceStore, Preferences},
    tasks::preference_sync_task,
    timer::TimerEngine,
    AppState, TimerState,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

struct Harness {
    state: Arc<AppState>,
    router: Router,
    _dir: TempDir,
}

fn harness(minutes: u64) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let preferences = PreferenceStore::in_memory(
        dir.path().join("prefs.json"),
        Preferences::from_minutes(minutes).unwrap(),
    );
    let engine = TimerEngine::new(preferences.get().selected_time_secs).unwrap();
    let state = Arc::new(AppState::new(
        engine,
        preferences,
        20554,
        "127.0.0.1".to_string(),
    ));
    let router = create_router(Arc::clone(&state));
    Harness {
        state,
        router,
        _dir: dir,
    }
}

async fn call(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => request
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test(start_paused = true)]
async fn start_pause_resume_over_http() {
    let h = harness(1);

    let (status, body) = call(&h.router, Method::POST, "/timer/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transition"], "applied");
    assert_eq!(body["timer"]["state"], "running");
    assert_eq!(body["timer"]["remaining_seconds"], 60);

    tokio::time::sleep(Duration::from_millis(2500)).await;

    let (status, body) = call(&h.router, Method::POST, "/timer/pause", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["state"], "paused");
    assert_eq!(body["timer"]["remaining_seconds"], 58);

    let (_, body) = call(&h.router, Method::POST, "/timer/pause", None).await;
    assert_eq!(body["transition"], "noop");

    let (status, body) = call(&h.router, Method::POST, "/timer/resume", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["state"], "running");
    assert_eq!(body["timer"]["remaining_seconds"], 58);
}

#[tokio::test(start_paused = true)]
async fn invalid_transition_is_a_conflict() {
    let h = harness(1);

    let (status, body) = call(&h.router, Method::POST, "/timer/pause", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Cannot pause a timer that is idle");
    assert_eq!(body["timer"]["state"], "idle");
}

#[tokio::test(start_paused = true)]
async fn status_reports_display_and_controls() {
    let h = harness(2);

    let (status, body) = call(&h.router, Method::GET, "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["display"], "2:00");
    assert_eq!(body["egg"], "stopped");
    assert_eq!(body["controls"]["start"], true);
    assert_eq!(body["controls"]["stop"], false);
    assert_eq!(body["preferred_minutes"], 2);

    call(&h.router, Method::POST, "/timer/start", None).await;
    tokio::time::sleep(Duration::from_millis(31_500)).await;

    let (_, body) = call(&h.router, Method::GET, "/status", None).await;
    assert_eq!(body["display"], "1:29");
    assert_eq!(body["egg"], "quarter");
    assert_eq!(body["controls"]["stop"], true);
    assert_eq!(body["last_action"], "start");
}

#[tokio::test(start_paused = true)]
async fn finished_timer_shows_done() {
    let h = harness(1);
    call(&h.router, Method::POST, "/timer/start", None).await;
    tokio::time::sleep(Duration::from_millis(60_500)).await;

    let (_, body) = call(&h.router, Method::GET, "/status", None).await;
    assert_eq!(body["timer"]["state"], "finished");
    assert_eq!(body["display"], "Done!");
    assert_eq!(body["egg"], "done");
}

#[tokio::test(start_paused = true)]
async fn preference_change_resets_idle_timer() {
    let h = harness(6);
    tokio::spawn(preference_sync_task(Arc::clone(&h.state)));
    tokio::task::yield_now().await;

    let (status, body) = call(
        &h.router,
        Method::PUT,
        "/preferences",
        Some(serde_json::json!({ "minutes": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["minutes"], 4);

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(h.state.engine.current_state(), TimerState::Idle);
    assert_eq!(h.state.engine.remaining_seconds(), 240);

    let (_, body) = call(&h.router, Method::GET, "/preferences", None).await;
    assert_eq!(body["selected_time_secs"], 240);
}

#[tokio::test(start_paused = true)]
async fn preference_change_leaves_running_timer_unless_confirmed() {
    let h = harness(6);
    tokio::spawn(preference_sync_task(Arc::clone(&h.state)));
    tokio::task::yield_now().await;

    call(&h.router, Method::POST, "/timer/start", None).await;

    call(
        &h.router,
        Method::PUT,
        "/preferences",
        Some(serde_json::json!({ "minutes": 2 })),
    )
    .await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(h.state.engine.current_state(), TimerState::Running);
    assert_eq!(h.state.engine.duration_seconds(), 360);

    call(
        &h.router,
        Method::PUT,
        "/preferences",
        Some(serde_json::json!({ "minutes": 3, "reset_running": true })),
    )
    .await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(h.state.engine.current_state(), TimerState::Idle);
    assert_eq!(h.state.engine.remaining_seconds(), 180);
}

#[tokio::test(start_paused = true)]
async fn out_of_range_preferences_are_rejected() {
    let h = harness(6);

    let (status, body) = call(
        &h.router,
        Method::PUT,
        "/preferences",
        Some(serde_json::json!({ "minutes": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], "error");
    assert_eq!(body["minutes"], 6);
}

#[tokio::test]
async fn health_check() {
    let h = harness(1);
    let (status, body) = call(&h.router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
