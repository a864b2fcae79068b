//! Todo のライフサイクルを扱うサービス層
//!
//! RPC と HTML の両フロントエンドがこの 1 実装を共有する。永続化は
//! `TodoRepository` を注入して切り替える（Redis / インメモリ）。
//! 操作するユーザーは暗黙のコンテキストではなく、各メソッドの引数で受け取る。

use chrono::Local;
use domain::{IdGenerator, NewTodo, Todo, TodoError, TodoId, TodoPatch, TodoRepository, UserId};
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;

/// ID が既存レコードと衝突した場合に採番し直す上限
const MAX_ID_ATTEMPTS: usize = 5;

pub struct TodoService {
    repo: Arc<dyn TodoRepository>,
    ids: IdGenerator,
}

impl TodoService {
    pub fn new(repo: Arc<dyn TodoRepository>) -> Self {
        Self {
            repo,
            ids: IdGenerator::new(),
        }
    }

    /// Todo を作成する
    /// - タイトル必須、説明文は 270 文字まで
    /// - ID と作成日時はサーバー側で付与し、done は false で開始
    /// - ID が使用中なら採番し直す（判定と書き込みはリポジトリ側で不可分）
    pub async fn create_todo(&self, user: &UserId, input: NewTodo) -> Result<Todo, TodoError> {
        if let Err(e) = input.validate() {
            tracing::debug!(user_id = %user, error = %e, "rejected invalid todo");
            return Err(e);
        }

        let now = Local::now();
        for _ in 0..MAX_ID_ATTEMPTS {
            let todo = input.clone().into_todo(self.ids.next_id(), now);
            if self.repo.save_new(user, &todo).await? {
                tracing::info!(user_id = %user, todo_id = %todo.id, "todo created");
                return Ok(todo);
            }
            tracing::warn!(todo_id = %todo.id, "generated id already in use, retrying");
        }
        Err(TodoError::Storage(
            "could not allocate a unique todo id".to_string(),
        ))
    }

    pub async fn get_todo(&self, id: &TodoId) -> Result<Todo, TodoError> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| TodoError::NotFound(id.to_string()))
    }

    /// ユーザーの Todo を 1 件ずつ流す（順序はストア依存）
    pub async fn list_todos(&self, user: &UserId) -> Result<BoxStream<'static, Todo>, TodoError> {
        let todos = self.repo.list(user).await?;
        tracing::debug!(user_id = %user, count = todos.len(), "todos listed");
        Ok(stream::iter(todos).boxed())
    }

    /// 空でないタイトル・説明文のみ上書きし、done は常に上書きする
    ///
    /// 更新後の内容にも作成時と同じ検証をかける。
    pub async fn update_todo(
        &self,
        user: &UserId,
        id: &TodoId,
        patch: TodoPatch,
    ) -> Result<Todo, TodoError> {
        let mut todo = self.get_todo(id).await?;
        todo.apply(patch);
        todo.validate()?;
        self.repo.update(&todo).await?;

        tracing::info!(user_id = %user, todo_id = %id, done = todo.done, "todo updated");
        Ok(todo)
    }

    /// 存在しない ID の削除もエラーにしない
    pub async fn delete_todo(&self, user: &UserId, id: &TodoId) -> Result<(), TodoError> {
        self.repo.delete(user, id).await?;
        tracing::info!(user_id = %user, todo_id = %id, "todo deleted");
        Ok(())
    }
}
