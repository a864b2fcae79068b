use crate::{Todo, TodoError, TodoId, UserId};
use async_trait::async_trait;
use std::time::Duration;

/// レコードの有効期限（最終書き込みから 15 分）
pub const TODO_TTL: Duration = Duration::from_secs(15 * 60);

/// Todo の永続化ポート
///
/// 実装は Redis 版とインメモリ版の 2 つ。サービス層はこのトレイト越しにのみ触る。
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// レコードを TTL 付きで書き込み、ユーザーのインデックスに ID を追加する（アトミック）
    async fn save(&self, user: &UserId, todo: &Todo) -> Result<(), TodoError>;

    /// ID が未使用のときだけ `save` と同じ書き込みを行う
    ///
    /// 判定と書き込みは分割されない。ID が使用中なら何も書かずに `Ok(false)`。
    async fn save_new(&self, user: &UserId, todo: &Todo) -> Result<bool, TodoError>;

    /// 存在しない・期限切れの場合は `Ok(None)`
    async fn get(&self, id: &TodoId) -> Result<Option<Todo>, TodoError>;

    /// ユーザーの全 Todo を取得する。期限切れ ID のインデックス掃除は呼び出し側を待たせない。
    async fn list(&self, user: &UserId) -> Result<Vec<Todo>, TodoError>;

    /// レコードとインデックスのメンバーを同時に削除する（冪等）
    async fn delete(&self, user: &UserId, id: &TodoId) -> Result<(), TodoError>;

    /// レコード全体を書き直して TTL を延長する。インデックスは触らない。
    async fn update(&self, todo: &Todo) -> Result<(), TodoError>;

    async fn exists(&self, id: &TodoId) -> Result<bool, TodoError>;
}
