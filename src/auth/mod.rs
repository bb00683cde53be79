//! One-time remote-login grants: issuance, redemption and the record
//! format shared between them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

pub mod issuer;
pub mod redeemer;
pub mod secret;

/// One pending remote-login grant. Stored in the login store keyed by
/// account id; at most one record exists per account, and a fresh
/// issuance silently replaces any prior one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Keyed hash of the login secret. The plaintext is never stored.
    pub secret_hash: String,
    pub issued_at: DateTime<Utc>,
}

/// Result of a successful redemption, handed to the session issuer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGrant {
    pub account_id: Uuid,
    pub granted_at: DateTime<Utc>,
}

/// Why a redemption was refused. The first three variants are credential
/// failures and must never be distinguishable in the response body; they
/// exist for internal logging only. `Store` is an infrastructure failure
/// and is surfaced to operators separately.
#[derive(Debug, Error)]
pub enum RedeemError {
    #[error("no pending login token")]
    NoPendingToken,

    #[error("login token expired")]
    Expired,

    #[error("login secret mismatch")]
    InvalidSecret,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RedeemError {
    pub fn is_credential_failure(&self) -> bool {
        !matches!(self, RedeemError::Store(_))
    }
}
