use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::auth::TokenRecord;

use super::{LoginStore, StoreError};

/// In-memory login store for tests and single-node development.
/// `DashMap::remove_if` gives the same per-key delete-if-matches
/// atomicity the Redis script provides.
#[derive(Debug, Default)]
pub struct MemoryLoginStore {
    records: DashMap<Uuid, TokenRecord>,
}

impl MemoryLoginStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl LoginStore for MemoryLoginStore {
    async fn get(&self, account_id: Uuid) -> Result<Option<TokenRecord>, StoreError> {
        Ok(self.records.get(&account_id).map(|r| r.value().clone()))
    }

    async fn put(&self, account_id: Uuid, record: &TokenRecord) -> Result<(), StoreError> {
        self.records.insert(account_id, record.clone());
        Ok(())
    }

    async fn delete_if_hash_matches(
        &self,
        account_id: Uuid,
        secret_hash: &str,
    ) -> Result<bool, StoreError> {
        Ok(self
            .records
            .remove_if(&account_id, |_, rec| rec.secret_hash == secret_hash)
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn record(hash: &str) -> TokenRecord {
        TokenRecord {
            secret_hash: hash.into(),
            issued_at: Utc::now(),
        }
    }

    #[test]
    fn put_replaces_existing_record() {
        tokio_test::block_on(async {
            let store = MemoryLoginStore::new();
            let id = Uuid::new_v4();

            store.put(id, &record("first")).await.unwrap();
            store.put(id, &record("second")).await.unwrap();

            assert_eq!(store.len(), 1);
            assert_eq!(store.get(id).await.unwrap().unwrap().secret_hash, "second");
        });
    }

    #[test]
    fn conditional_delete_requires_matching_hash() {
        tokio_test::block_on(async {
            let store = MemoryLoginStore::new();
            let id = Uuid::new_v4();
            store.put(id, &record("h1")).await.unwrap();

            assert!(!store.delete_if_hash_matches(id, "h2").await.unwrap());
            assert!(store.get(id).await.unwrap().is_some());

            assert!(store.delete_if_hash_matches(id, "h1").await.unwrap());
            assert!(store.get(id).await.unwrap().is_none());

            // record is gone, second delete loses
            assert!(!store.delete_if_hash_matches(id, "h1").await.unwrap());
        });
    }

    #[test]
    fn missing_account_reads_as_absent() {
        tokio_test::block_on(async {
            let store = MemoryLoginStore::new();
            assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
        });
    }
}
