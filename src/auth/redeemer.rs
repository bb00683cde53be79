use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::store::LoginStore;

use super::secret::HashKey;
use super::{RedeemError, SessionGrant};

/// Redeem a presented `(account_id, secret)` pair against the pending
/// record. Terminal on the first definitive answer, no retries.
///
/// The record is deleted only on a successful match, and conditionally on
/// the hash still being in place, so concurrent redemptions race to a
/// single winner; the losers observe `NoPendingToken`. A record that has
/// expired is left untouched: it stays in the store until the next
/// issuance overwrites it. That retention is a known quirk of the
/// protocol, kept on purpose; do not "fix" it by deleting here.
pub async fn redeem<S: LoginStore>(
    store: &S,
    key: &HashKey,
    account_id: Uuid,
    presented_secret: &str,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<SessionGrant, RedeemError> {
    let record = store
        .get(account_id)
        .await?
        .ok_or(RedeemError::NoPendingToken)?;

    if now.signed_duration_since(record.issued_at) > ttl {
        return Err(RedeemError::Expired);
    }

    if !key.verify_secret(presented_secret, &record.secret_hash) {
        return Err(RedeemError::InvalidSecret);
    }

    // Single-use enforcement: the delete must still observe the hash we
    // just verified. Losing that race is equivalent to the record already
    // being consumed.
    if !store
        .delete_if_hash_matches(account_id, &record.secret_hash)
        .await?
    {
        return Err(RedeemError::NoPendingToken);
    }

    Ok(SessionGrant {
        account_id,
        granted_at: now,
    })
}
