//! Storage backends: the key-value login store holding pending grants,
//! and the Postgres account directory.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::TokenRecord;

pub mod memory;
pub mod postgres;
pub mod redis;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("login store unavailable: {0}")]
    Unavailable(#[from] ::redis::RedisError),

    #[error("corrupt login record: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Abstraction over the key-value service holding pending login grants.
/// Implementations: `RedisLoginStore` (production), `MemoryLoginStore`
/// (tests, single-node dev).
#[async_trait]
pub trait LoginStore: Send + Sync {
    /// Fetch the pending record for an account, if any.
    async fn get(&self, account_id: Uuid) -> Result<Option<TokenRecord>, StoreError>;

    /// Upsert the pending record for an account, replacing any prior one.
    async fn put(&self, account_id: Uuid, record: &TokenRecord) -> Result<(), StoreError>;

    /// Delete the record only if its stored hash still equals
    /// `secret_hash`. Atomic per key: of any number of concurrent calls
    /// with the same hash, exactly one returns `true`.
    async fn delete_if_hash_matches(
        &self,
        account_id: Uuid,
        secret_hash: &str,
    ) -> Result<bool, StoreError>;
}
