//! Redis を使った Todo リポジトリ
//!
//! キー設計:
//! - レコード: `todo:<id>` → JSON（TTL 付き）
//! - ユーザーインデックス: `user:<user-id>:todos` → ID の Set（TTL なし、一覧取得時に整合）

use crate::redis_store::RedisStore;
use async_trait::async_trait;
use domain::{Todo, TodoError, TodoId, TodoRepository, UserId, TODO_TTL};
use std::time::Duration;

#[derive(Clone)]
pub struct RedisTodoRepository {
    store: RedisStore,
    ttl: Duration,
}

impl RedisTodoRepository {
    pub fn new(store: RedisStore) -> Self {
        Self::with_ttl(store, TODO_TTL)
    }

    pub fn with_ttl(store: RedisStore, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Redis 上のレコードキー
    pub fn todo_key(id: &TodoId) -> String {
        format!("todo:{}", id.as_str())
    }

    /// ユーザーごとの ID Set のキー
    pub fn user_key(user: &UserId) -> String {
        format!("user:{}:todos", user.as_str())
    }

    /// 期限切れ ID をインデックスから取り除くタスクを起動する（完了を待たない）
    fn spawn_index_cleanup(&self, user: &UserId, expired: Vec<String>) {
        let store = self.store.clone();
        let user_key = Self::user_key(user);
        let user_id = user.as_str().to_string();
        tokio::spawn(async move {
            match store.srem(&user_key, &expired).await {
                Ok(()) => tracing::debug!(
                    user_id = %user_id,
                    removed = expired.len(),
                    "removed expired ids from user index"
                ),
                Err(e) => tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    "failed to clean up expired ids from user index"
                ),
            }
        });
    }
}

#[async_trait]
impl TodoRepository for RedisTodoRepository {
    async fn save(&self, user: &UserId, todo: &Todo) -> Result<(), TodoError> {
        let data = serde_json::to_string(todo)?;
        self.store
            .set_with_member(
                &Self::todo_key(&todo.id),
                &data,
                self.ttl,
                &Self::user_key(user),
                todo.id.as_str(),
            )
            .await
    }

    async fn save_new(&self, user: &UserId, todo: &Todo) -> Result<bool, TodoError> {
        let data = serde_json::to_string(todo)?;
        self.store
            .set_new_with_member(
                &Self::todo_key(&todo.id),
                &data,
                self.ttl,
                &Self::user_key(user),
                todo.id.as_str(),
            )
            .await
    }

    async fn get(&self, id: &TodoId) -> Result<Option<Todo>, TodoError> {
        match self.store.get(&Self::todo_key(id)).await? {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, user: &UserId) -> Result<Vec<Todo>, TodoError> {
        let ids = self.store.smembers(&Self::user_key(user)).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids
            .iter()
            .map(|id| Self::todo_key(&TodoId::from(id.as_str())))
            .collect();
        let values = self.store.mget(&keys).await?;

        let (todos, expired) = collect_records(&ids, values);

        if !expired.is_empty() {
            self.spawn_index_cleanup(user, expired);
        }

        Ok(todos)
    }

    async fn delete(&self, user: &UserId, id: &TodoId) -> Result<(), TodoError> {
        self.store
            .delete_with_member(&Self::todo_key(id), &Self::user_key(user), id.as_str())
            .await
    }

    async fn update(&self, todo: &Todo) -> Result<(), TodoError> {
        let data = serde_json::to_string(todo)?;
        self.store
            .set_ex(&Self::todo_key(&todo.id), &data, self.ttl)
            .await
    }

    async fn exists(&self, id: &TodoId) -> Result<bool, TodoError> {
        self.store.exists(&Self::todo_key(id)).await
    }
}

/// MGET の結果を Todo と期限切れ ID に振り分ける
///
/// 壊れたレコードは一覧全体を失敗させずに読み飛ばす。
fn collect_records(ids: &[String], values: Vec<Option<String>>) -> (Vec<Todo>, Vec<String>) {
    let mut todos = Vec::with_capacity(values.len());
    let mut expired = Vec::new();

    for (id, value) in ids.iter().zip(values) {
        match value {
            None => expired.push(id.clone()),
            Some(data) => match serde_json::from_str::<Todo>(&data) {
                Ok(todo) => todos.push(todo),
                Err(e) => {
                    tracing::warn!(todo_id = %id, error = %e, "skipping malformed todo record")
                }
            },
        }
    }

    (todos, expired)
}
