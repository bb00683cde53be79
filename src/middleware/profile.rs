//! Opt-in request profiling, gated on a shared key.
//!
//! A request presenting the configured profile key (header or query
//! parameter) gets timed end to end; the capture is written as a JSON
//! file and the file path is echoed back in a response header so the
//! operator tooling that made the request can pick it up.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, Uri};
use axum::middleware::Next;
use axum::response::Response;
use subtle::ConstantTimeEq;

use crate::config::Config;

pub const PROFILE_HEADER: &str = "x-gatehouse-profile";
pub const PROFILE_PARAM: &str = "profile_key";

#[derive(Clone)]
pub struct Profiler {
    key: String,
    dir: PathBuf,
}

impl Profiler {
    pub fn new(key: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            dir: dir.into(),
        }
    }

    /// None when no profile key is configured; the layer is not
    /// installed in that case.
    pub fn from_config(cfg: &Config) -> Option<Arc<Self>> {
        cfg.profile_key
            .as_ref()
            .map(|key| Arc::new(Self::new(key.clone(), cfg.profile_dir.clone())))
    }

    fn presented_key(req: &Request) -> Option<String> {
        if let Some(v) = req
            .headers()
            .get(PROFILE_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            return Some(v.to_string());
        }
        req.uri().query().and_then(|q| {
            q.split('&').find_map(|pair| {
                let (k, v) = pair.split_once('=')?;
                (k == PROFILE_PARAM).then(|| v.to_string())
            })
        })
    }

    /// The profile key guards an internals-exposing feature, so it gets
    /// the same constant-time treatment as a credential.
    fn key_matches(&self, presented: &str) -> bool {
        presented.as_bytes().ct_eq(self.key.as_bytes()).into()
    }
}

pub async fn capture(
    State(profiler): State<Arc<Profiler>>,
    req: Request,
    next: Next,
) -> Response {
    let armed = Profiler::presented_key(&req)
        .map(|k| profiler.key_matches(&k))
        .unwrap_or(false);
    if !armed {
        return next.run(req).await;
    }

    let method = req.method().to_string();
    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let request_uri = strip_profile_param(req.uri());
    let started = Instant::now();

    let mut resp = next.run(req).await;

    let capture = serde_json::json!({
        "timestamp": chrono::Utc::now().timestamp(),
        "method": method,
        "host": host,
        "request_uri": request_uri,
        "status": resp.status().as_u16(),
        "duration_us": started.elapsed().as_micros() as u64,
    });

    let path = profiler
        .dir
        .join(format!("profile.{}.json", uuid::Uuid::new_v4().simple()));
    match tokio::fs::write(&path, capture.to_string()).await {
        Ok(()) => {
            if let Ok(value) = HeaderValue::from_str(&path.to_string_lossy()) {
                resp.headers_mut().insert(PROFILE_HEADER, value);
            }
        }
        Err(e) => {
            // A failed capture never fails the request it was profiling.
            tracing::warn!(path = %path.display(), "failed to write profile capture: {}", e);
        }
    }

    resp
}

/// The capture must not echo the profile key back out; drop it from the
/// recorded URI, keeping everything else.
fn strip_profile_param(uri: &Uri) -> String {
    let path = uri.path();
    let Some(query) = uri.query() else {
        return path.to_string();
    };

    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| pair.split_once('=').map_or(*pair, |(k, _)| k) != PROFILE_PARAM)
        .collect();

    if kept.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{}", kept.join("&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_comparison_is_exact() {
        let profiler = Profiler::new("pk-123", "/tmp");
        assert!(profiler.key_matches("pk-123"));
        assert!(!profiler.key_matches("pk-12"));
        assert!(!profiler.key_matches("pk-1234"));
        assert!(!profiler.key_matches(""));
    }

    #[test]
    fn strips_only_the_profile_param() {
        let uri: Uri = "/remote-login?key=abc&profile_key=pk&id=1".parse().unwrap();
        assert_eq!(strip_profile_param(&uri), "/remote-login?key=abc&id=1");

        let uri: Uri = "/healthz?profile_key=pk".parse().unwrap();
        assert_eq!(strip_profile_param(&uri), "/healthz");

        let uri: Uri = "/healthz".parse().unwrap();
        assert_eq!(strip_profile_param(&uri), "/healthz");
    }

    #[test]
    fn presented_key_prefers_the_header() {
        let req = axum::http::Request::builder()
            .uri("/?profile_key=from-query")
            .header(PROFILE_HEADER, "from-header")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(Profiler::presented_key(&req).as_deref(), Some("from-header"));

        let req = axum::http::Request::builder()
            .uri("/?profile_key=from-query")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(Profiler::presented_key(&req).as_deref(), Some("from-query"));

        let req = axum::http::Request::builder()
            .uri("/")
            .body(axum::body::Body::empty())
            .unwrap();
        assert!(Profiler::presented_key(&req).is_none());
    }
}
