use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::auth::RedeemError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    /// Every credential failure collapses into this one variant before it
    /// reaches the caller; the specific cause is logged where it happened.
    /// The response must stay byte-identical across causes.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("login store error: {0}")]
    Store(#[from] StoreError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<RedeemError> for AppError {
    fn from(err: RedeemError) -> Self {
        match err {
            RedeemError::Store(e) => AppError::Store(e),
            _ => AppError::InvalidCredentials,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials.").into_response()
            }
            AppError::Store(e) => {
                tracing::error!("login store error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            AppError::Database(e) => {
                tracing::error!("database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            AppError::Internal(e) => {
                tracing::error!("internal error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_failures_share_one_response() {
        for err in [
            RedeemError::NoPendingToken,
            RedeemError::Expired,
            RedeemError::InvalidSecret,
        ] {
            let app: AppError = err.into();
            assert!(matches!(app, AppError::InvalidCredentials));
        }
    }

    #[test]
    fn store_failures_stay_distinct() {
        let err = RedeemError::Store(StoreError::Corrupt(
            serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
        ));
        let app: AppError = err.into();
        assert!(matches!(app, AppError::Store(_)));
    }
}
