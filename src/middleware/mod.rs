use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

pub mod authlog;
pub mod profile;

/// Responses from a login service are never cacheable; the rest is the
/// usual hardening set.
pub async fn no_store_headers(req: Request, next: Next) -> Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();

    headers.insert("Cache-Control", "no-store".parse().unwrap());
    headers.insert("X-Content-Type-Options", "nosniff".parse().unwrap());
    headers.insert("X-Frame-Options", "DENY".parse().unwrap());

    // Login secrets travel in URLs; never leak them through Referer.
    headers.insert("Referrer-Policy", "no-referrer".parse().unwrap());

    resp
}
