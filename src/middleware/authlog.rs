//! Auth-event lines for the host's ban tooling.
//!
//! Failed logins are flushed as `event:ip` WARN lines under the `authlog`
//! target, one line per event, which is the format the platform's
//! intrusion-ban rules match on.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{ConnectInfo, Request};
use axum::middleware::Next;
use axum::response::Response;

/// Per-request sink for auth events. Handlers record events as they
/// happen; the middleware flushes the sink once the response is built.
/// One sink per request, never process-wide state.
#[derive(Debug, Default)]
pub struct AuthLog {
    events: Mutex<Vec<&'static str>>,
}

impl AuthLog {
    pub fn login_failed(&self) {
        self.record("login-failed");
    }

    pub fn record(&self, event: &'static str) {
        self.events.lock().unwrap().push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }

    pub fn flush(&self, client: &str) {
        let events = std::mem::take(&mut *self.events.lock().unwrap());
        for event in events {
            tracing::warn!(target: "authlog", "{}:{}", event, client);
        }
    }
}

/// Middleware: injects a fresh `AuthLog` into the request extensions and
/// flushes whatever the handlers recorded after the response is produced.
pub async fn capture(mut req: Request, next: Next) -> Response {
    let log = Arc::new(AuthLog::default());
    let client = client_addr(&req);
    req.extensions_mut().insert(log.clone());

    let resp = next.run(req).await;
    log.flush(&client);
    resp
}

/// First X-Forwarded-For hop when present (the service sits behind the
/// platform's proxy), otherwise the peer address.
fn client_addr(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_accumulate_until_flushed() {
        let log = AuthLog::default();
        assert!(log.is_empty());

        log.login_failed();
        log.record("pingback");
        assert!(!log.is_empty());

        log.flush("203.0.113.9");
        assert!(log.is_empty());
    }

    #[test]
    fn forwarded_for_takes_precedence() {
        let req = axum::http::Request::builder()
            .uri("/")
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(client_addr(&req), "203.0.113.9");
    }

    #[test]
    fn missing_peer_reads_as_unknown() {
        let req = axum::http::Request::builder()
            .uri("/")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(client_addr(&req), "unknown");
    }
}
