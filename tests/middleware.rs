//! Router-level middleware tests: profiler capture, auth-event sink
//! plumbing, and the no-store response headers.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::routing::get;
use axum::{Extension, Router};
use tower::ServiceExt;

use gatehouse::middleware::authlog::{self, AuthLog};
use gatehouse::middleware::profile::{self, Profiler, PROFILE_HEADER};
use gatehouse::middleware::no_store_headers;

fn capture_dir() -> PathBuf {
    std::env::temp_dir().join(format!("gatehouse-test-{}", uuid::Uuid::new_v4()))
}

fn profiled_app(profiler: Arc<Profiler>) -> Router {
    Router::new()
        .route("/", get(|| async { "hello" }))
        .layer(axum::middleware::from_fn_with_state(
            profiler,
            profile::capture,
        ))
}

#[tokio::test]
async fn matching_profile_key_writes_a_capture() {
    let dir = capture_dir();
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let app = profiled_app(Arc::new(Profiler::new("pk-123", dir.clone())));

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/?profile_key=pk-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let path = resp
        .headers()
        .get(PROFILE_HEADER)
        .expect("capture header missing")
        .to_str()
        .unwrap()
        .to_string();

    let capture: serde_json::Value =
        serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
    assert_eq!(capture["method"], "GET");
    assert_eq!(capture["status"], 200);
    // the key itself never lands in the capture
    assert_eq!(capture["request_uri"], "/");
    assert!(capture["duration_us"].is_u64());

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn profile_key_accepted_via_header() {
    let dir = capture_dir();
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let app = profiled_app(Arc::new(Profiler::new("pk-123", dir.clone())));

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header(PROFILE_HEADER, "pk-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(resp.headers().contains_key(PROFILE_HEADER));
    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn wrong_profile_key_profiles_nothing() {
    let dir = capture_dir();
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let app = profiled_app(Arc::new(Profiler::new("pk-123", dir.clone())));

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/?profile_key=guess")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(!resp.headers().contains_key(PROFILE_HEADER));
    let mut entries = tokio::fs::read_dir(&dir).await.unwrap();
    assert!(entries.next_entry().await.unwrap().is_none());

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn handlers_receive_the_auth_event_sink() {
    // A handler that records a failure; the middleware must have inserted
    // the sink and must flush it without touching the response.
    async fn deny(Extension(log): Extension<Arc<AuthLog>>) -> &'static str {
        log.login_failed();
        "denied"
    }

    let app = Router::new()
        .route("/deny", get(deny))
        .layer(axum::middleware::from_fn(authlog::capture));

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/deny")
                .header("x-forwarded-for", "203.0.113.9")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn responses_are_marked_uncacheable() {
    let app = Router::new()
        .route("/", get(|| async { "ok" }))
        .layer(axum::middleware::from_fn(no_store_headers));

    let resp = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.headers()["cache-control"], "no-store");
    assert_eq!(resp.headers()["x-content-type-options"], "nosniff");
    assert_eq!(resp.headers()["referrer-policy"], "no-referrer");
}
