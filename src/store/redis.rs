use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use uuid::Uuid;

use crate::auth::TokenRecord;

use super::{LoginStore, StoreError};

/// Redis-backed login store: one JSON record per account under
/// `rlogin:{account_id}`. The conditional delete runs as a single Lua
/// script so two concurrent redemptions cannot both observe a match.
#[derive(Clone)]
pub struct RedisLoginStore {
    conn: ConnectionManager,
}

impl RedisLoginStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn key(account_id: Uuid) -> String {
        format!("rlogin:{account_id}")
    }
}

#[async_trait]
impl LoginStore for RedisLoginStore {
    async fn get(&self, account_id: Uuid) -> Result<Option<TokenRecord>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(Self::key(account_id)).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, account_id: Uuid, record: &TokenRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string(record)?;
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(Self::key(account_id), json).await?;
        Ok(())
    }

    async fn delete_if_hash_matches(
        &self,
        account_id: Uuid,
        secret_hash: &str,
    ) -> Result<bool, StoreError> {
        // GET + compare + DEL in one script invocation; Redis runs scripts
        // atomically, which is the only serialization this protocol needs.
        let script = redis::Script::new(
            r#"
            local raw = redis.call("GET", KEYS[1])
            if not raw then
                return 0
            end
            local record = cjson.decode(raw)
            if record.secret_hash == ARGV[1] then
                redis.call("DEL", KEYS[1])
                return 1
            end
            return 0
        "#,
        );
        let mut conn = self.conn.clone();
        let deleted: u64 = script
            .key(Self::key(account_id))
            .arg(secret_hash)
            .invoke_async(&mut conn)
            .await?;
        Ok(deleted == 1)
    }
}
