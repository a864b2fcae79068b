//! プロセス内メモリに Todo を保持するリポジトリ（開発/テスト用）
//!
//! 全体を 1 つの `Mutex` で守る。各レコードは Redis 版と同じく最終書き込みから
//! TTL で失効し、加えてバックグラウンドの掃除タスクが一定間隔でテーブルごと消去する。

use async_trait::async_trait;
use domain::{Todo, TodoError, TodoId, TodoRepository, UserId, TODO_TTL};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

struct Record {
    todo: Todo,
    expires_at: Instant,
}

impl Record {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

#[derive(Default)]
struct MemoryState {
    records: HashMap<TodoId, Record>,
    index: HashMap<UserId, HashSet<TodoId>>,
}

impl MemoryState {
    fn insert(&mut self, user: &UserId, todo: &Todo, expires_at: Instant) {
        self.records.insert(
            todo.id.clone(),
            Record {
                todo: todo.clone(),
                expires_at,
            },
        );
        self.index
            .entry(user.clone())
            .or_default()
            .insert(todo.id.clone());
    }
}

#[derive(Clone)]
pub struct InMemoryTodoRepository {
    state: Arc<Mutex<MemoryState>>,
    ttl: Duration,
}

impl Default for InMemoryTodoRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTodoRepository {
    pub fn new() -> Self {
        Self::with_ttl(TODO_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            ttl,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, TodoError> {
        self.state
            .lock()
            .map_err(|_| TodoError::Storage("in-memory store lock poisoned".to_string()))
    }

    /// 全レコードとインデックスを消去する
    pub fn clear(&self) -> Result<(), TodoError> {
        let mut state = self.lock()?;
        state.records.clear();
        state.index.clear();
        Ok(())
    }

    /// 保持しているレコード数（期限切れで未回収のものを含む）
    pub fn len(&self) -> Result<usize, TodoError> {
        Ok(self.lock()?.records.len())
    }

    pub fn is_empty(&self) -> Result<bool, TodoError> {
        Ok(self.len()? == 0)
    }

    /// 一定間隔でテーブル全体を消去する掃除タスクを起動する
    ///
    /// 返されたハンドルの `shutdown` か drop で停止する。
    pub fn spawn_sweeper(&self, interval: Duration) -> SweeperHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let repo = self.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match repo.clear() {
                            Ok(()) => tracing::info!("in-memory todos cleared by periodic sweep"),
                            Err(e) => tracing::error!(error = %e, "periodic sweep failed"),
                        }
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            tracing::debug!("periodic sweep stopped");
                            break;
                        }
                    }
                }
            }
        });

        SweeperHandle { stop: stop_tx, task }
    }
}

/// 掃除タスクの停止用ハンドル
pub struct SweeperHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// 停止シグナルを送り、タスクの終了を待つ
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "sweeper task ended abnormally");
        }
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn save(&self, user: &UserId, todo: &Todo) -> Result<(), TodoError> {
        let expires_at = Instant::now() + self.ttl;
        self.lock()?.insert(user, todo, expires_at);
        Ok(())
    }

    async fn save_new(&self, user: &UserId, todo: &Todo) -> Result<bool, TodoError> {
        let now = Instant::now();
        let mut state = self.lock()?;
        if state.records.get(&todo.id).is_some_and(|r| r.is_live(now)) {
            return Ok(false);
        }
        state.insert(user, todo, now + self.ttl);
        Ok(true)
    }

    async fn get(&self, id: &TodoId) -> Result<Option<Todo>, TodoError> {
        let now = Instant::now();
        let mut state = self.lock()?;
        match state.records.get(id) {
            Some(record) if record.is_live(now) => Ok(Some(record.todo.clone())),
            Some(_) => {
                // 期限切れは不在と同じ扱い。インデックスは一覧取得時に整合させる。
                state.records.remove(id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn list(&self, user: &UserId) -> Result<Vec<Todo>, TodoError> {
        let now = Instant::now();
        let mut guard = self.lock()?;
        let state = &mut *guard;

        let Some(ids) = state.index.get_mut(user) else {
            return Ok(Vec::new());
        };

        let mut todos = Vec::with_capacity(ids.len());
        let mut expired = Vec::new();
        for id in ids.iter() {
            match state.records.get(id) {
                Some(record) if record.is_live(now) => todos.push(record.todo.clone()),
                _ => expired.push(id.clone()),
            }
        }

        if !expired.is_empty() {
            for id in &expired {
                ids.remove(id);
                state.records.remove(id);
            }
            tracing::debug!(
                user_id = %user,
                removed = expired.len(),
                "removed expired ids from user index"
            );
        }

        Ok(todos)
    }

    async fn delete(&self, user: &UserId, id: &TodoId) -> Result<(), TodoError> {
        let mut state = self.lock()?;
        state.records.remove(id);
        if let Some(ids) = state.index.get_mut(user) {
            ids.remove(id);
        }
        Ok(())
    }

    async fn update(&self, todo: &Todo) -> Result<(), TodoError> {
        let expires_at = Instant::now() + self.ttl;
        let mut state = self.lock()?;
        state.records.insert(
            todo.id.clone(),
            Record {
                todo: todo.clone(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn exists(&self, id: &TodoId) -> Result<bool, TodoError> {
        let now = Instant::now();
        let state = self.lock()?;
        Ok(state.records.get(id).is_some_and(|r| r.is_live(now)))
    }
}
