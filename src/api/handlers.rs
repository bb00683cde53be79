use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Form};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::redeemer;
use crate::errors::AppError;
use crate::middleware::authlog::AuthLog;
use crate::AppState;

/// Parameters of a login link. Accepted as query string or form body.
#[derive(Deserialize)]
pub struct RemoteLoginParams {
    /// Plaintext one-time secret produced by the issuance command.
    pub key: String,
    /// Account the secret was issued for.
    pub id: String,
}

/// GET /remote-login — redeem a one-time login link.
pub async fn remote_login(
    State(state): State<Arc<AppState>>,
    Extension(authlog): Extension<Arc<AuthLog>>,
    Query(params): Query<RemoteLoginParams>,
) -> Result<Response, AppError> {
    redeem_and_grant(&state, &authlog, params).await
}

/// POST /remote-login — same exchange, parameters in the form body.
pub async fn remote_login_form(
    State(state): State<Arc<AppState>>,
    Extension(authlog): Extension<Arc<AuthLog>>,
    Form(params): Form<RemoteLoginParams>,
) -> Result<Response, AppError> {
    redeem_and_grant(&state, &authlog, params).await
}

/// The redemption exchange. Every refusal an attacker could trigger
/// (malformed id, unknown account, no pending token, expired, wrong
/// secret) produces the same response; the distinctions live only in
/// the logs and the auth-event sink.
async fn redeem_and_grant(
    state: &AppState,
    authlog: &AuthLog,
    params: RemoteLoginParams,
) -> Result<Response, AppError> {
    let now = Utc::now();

    let Ok(account_id) = params.id.parse::<Uuid>() else {
        authlog.login_failed();
        tracing::warn!("remote login rejected: malformed account id");
        return Err(AppError::InvalidCredentials);
    };

    let Some(account) = state.db.find_account_by_id(account_id).await? else {
        authlog.login_failed();
        tracing::warn!(%account_id, "remote login rejected: unknown account");
        return Err(AppError::InvalidCredentials);
    };

    let grant = match redeemer::redeem(
        &state.logins,
        &state.hash_key,
        account.id,
        &params.key,
        now,
        state.config.login_ttl(),
    )
    .await
    {
        Ok(grant) => grant,
        Err(err) if err.is_credential_failure() => {
            authlog.login_failed();
            tracing::warn!(%account_id, kind = %err, "remote login rejected");
            return Err(AppError::InvalidCredentials);
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!(account_id = %grant.account_id, email = %account.email, "remote login succeeded");

    let token = state.sessions.issue(grant.account_id, grant.granted_at);
    let cookie = HeaderValue::from_str(&state.sessions.cookie(&token))
        .map_err(|e| anyhow::anyhow!("session cookie is not a valid header value: {e}"))?;

    let mut resp = Redirect::to(&state.config.landing_url).into_response();
    resp.headers_mut().append(SET_COOKIE, cookie);
    Ok(resp)
}
