//! Signed session cookies minted after a successful redemption.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::auth::secret::HashKey;

pub const SESSION_COOKIE: &str = "gatehouse_session";

const SESSION_DOMAIN: &str = "session-v1";

/// Mints and verifies the session token handed out after a successful
/// redemption: `v1.<account_id>.<expires_at>.<sig>`, signed with
/// HMAC-SHA256 under the server key (domain-separated from login-secret
/// hashes). Session transport beyond the cookie is someone else's job.
pub struct SessionIssuer {
    key: HashKey,
    ttl: Duration,
}

impl SessionIssuer {
    pub fn new(key: HashKey, ttl: Duration) -> Self {
        Self { key, ttl }
    }

    pub fn issue(&self, account_id: Uuid, now: DateTime<Utc>) -> String {
        let expires_at = (now + self.ttl).timestamp();
        let payload = format!("{account_id}.{expires_at}");
        let sig = URL_SAFE_NO_PAD.encode(self.key.sign(SESSION_DOMAIN, payload.as_bytes()));
        format!("v1.{payload}.{sig}")
    }

    /// Returns the account id when the token is well-formed, carries a
    /// valid signature and has not expired. Signature first, expiry
    /// second: a forged token learns nothing from the expiry field.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Option<Uuid> {
        let rest = token.strip_prefix("v1.")?;
        let (payload, sig) = rest.rsplit_once('.')?;
        let presented = URL_SAFE_NO_PAD.decode(sig).ok()?;
        let expected = self.key.sign(SESSION_DOMAIN, payload.as_bytes());
        if !bool::from(presented.as_slice().ct_eq(&expected)) {
            return None;
        }

        let (id, exp) = payload.split_once('.')?;
        let expires_at = exp.parse::<i64>().ok()?;
        if now.timestamp() > expires_at {
            return None;
        }
        id.parse().ok()
    }

    /// Set-Cookie value for a freshly issued token.
    pub fn cookie(&self, token: &str) -> String {
        format!(
            "{SESSION_COOKIE}={token}; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age={}",
            self.ttl.num_seconds()
        )
    }
}
