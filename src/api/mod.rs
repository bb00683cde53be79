use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::middleware::profile::Profiler;
use crate::AppState;

pub mod handlers;

/// Build the service router. Every route gets the auth-event sink and the
/// no-store headers; the profiler, when configured, wraps everything so
/// its timings cover the full middleware stack.
pub fn router(state: Arc<AppState>, profiler: Option<Arc<Profiler>>) -> Router {
    let mut app = Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/readyz", get(readiness_check))
        .route(
            "/remote-login",
            get(handlers::remote_login).post(handlers::remote_login_form),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(crate::middleware::authlog::capture))
        .layer(axum::middleware::from_fn(crate::middleware::no_store_headers));

    if let Some(profiler) = profiler {
        app = app.layer(axum::middleware::from_fn_with_state(
            profiler,
            crate::middleware::profile::capture,
        ));
    }

    app
}

async fn readiness_check() -> &'static str {
    "ok"
}
