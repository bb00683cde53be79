use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::store::{LoginStore, StoreError};

use super::secret::{generate_secret, HashKey};
use super::TokenRecord;

/// Issue a fresh one-time login secret for `account_id`, replacing any
/// pending grant for that account. The caller has already verified the
/// account exists.
///
/// Returns the plaintext secret exactly once; only its keyed hash is
/// written to the store. A store-write failure propagates unchanged.
pub async fn issue<S: LoginStore>(
    store: &S,
    key: &HashKey,
    account_id: Uuid,
    now: DateTime<Utc>,
) -> Result<String, StoreError> {
    let secret = generate_secret();
    let record = TokenRecord {
        secret_hash: key.hash_secret(&secret),
        issued_at: now,
    };
    store.put(account_id, &record).await?;
    Ok(secret)
}
