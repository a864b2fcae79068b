//! Redis への薄いアダプタ
//!
//! キー/値の操作だけを提供し、Todo のキー設計やシリアライズは
//! `RedisTodoRepository` 側が持つ。

use domain::TodoError;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use std::time::Duration;

/// 接続プール付きの Redis クライアント
///
/// `ConnectionManager` は切断時に自動で再接続し、clone しても同じ接続を共有する。
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// `host:port` または `redis://` 形式のアドレスに接続する
    pub async fn connect(addr: &str) -> Result<Self, TodoError> {
        let url = redis_url(addr);
        let client = Client::open(url.as_str()).map_err(|e| {
            TodoError::Storage(format!("failed to create Redis client for {url}: {e}"))
        })?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| TodoError::Storage(format!("failed to connect to Redis at {url}: {e}")))?;

        tracing::info!(redis_url = %url, "connected to Redis");
        Ok(Self { conn })
    }

    /// `SET key value EX ttl` と `SADD set_key member` を 1 つのトランザクションで実行
    pub async fn set_with_member(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
        set_key: &str,
        member: &str,
    ) -> Result<(), TodoError> {
        let mut conn = self.conn.clone();
        let _: () = redis::pipe()
            .atomic()
            .set_ex(key, value, ttl_secs(ttl))
            .ignore()
            .sadd(set_key, member)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    /// `key` が未使用のときだけ `SET ... EX ttl NX` と `SADD` を行う
    ///
    /// 判定と書き込みは Lua スクリプト内で一括実行されるため、他プロセスとの競合でも
    /// 既存レコードを上書きしない。書き込んだら `true`。
    pub async fn set_new_with_member(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
        set_key: &str,
        member: &str,
    ) -> Result<bool, TodoError> {
        let lua_script = r#"
            if redis.call('SET', KEYS[1], ARGV[1], 'EX', ARGV[2], 'NX') then
                redis.call('SADD', KEYS[2], ARGV[3])
                return 1
            end
            return 0
        "#;

        let mut conn = self.conn.clone();
        let created: i64 = redis::Script::new(lua_script)
            .key(key)
            .key(set_key)
            .arg(value)
            .arg(ttl_secs(ttl))
            .arg(member)
            .invoke_async(&mut conn)
            .await
            .map_err(storage_error)?;
        Ok(created == 1)
    }

    /// `DEL key` と `SREM set_key member` を 1 つのトランザクションで実行
    pub async fn delete_with_member(
        &self,
        key: &str,
        set_key: &str,
        member: &str,
    ) -> Result<(), TodoError> {
        let mut conn = self.conn.clone();
        let _: () = redis::pipe()
            .atomic()
            .del(key)
            .ignore()
            .srem(set_key, member)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    pub async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), TodoError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(key, value, ttl_secs(ttl))
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, TodoError> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(storage_error)
    }

    /// 複数キーを 1 往復で取得する。存在しないキーは `None`。
    pub async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>, TodoError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        // キーが 1 つでも GET に化けないよう MGET を直接組み立てる
        redis::cmd("MGET")
            .arg(keys)
            .query_async(&mut conn)
            .await
            .map_err(storage_error)
    }

    pub async fn smembers(&self, key: &str) -> Result<Vec<String>, TodoError> {
        let mut conn = self.conn.clone();
        conn.smembers(key).await.map_err(storage_error)
    }

    pub async fn srem(&self, key: &str, members: &[String]) -> Result<(), TodoError> {
        if members.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        let _: () = conn.srem(key, members).await.map_err(storage_error)?;
        Ok(())
    }

    pub async fn exists(&self, key: &str) -> Result<bool, TodoError> {
        let mut conn = self.conn.clone();
        conn.exists(key).await.map_err(storage_error)
    }
}

fn redis_url(addr: &str) -> String {
    if addr.starts_with("redis://") || addr.starts_with("rediss://") {
        addr.to_string()
    } else {
        format!("redis://{addr}")
    }
}

fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

fn storage_error(e: RedisError) -> TodoError {
    TodoError::Storage(e.to_string())
}
