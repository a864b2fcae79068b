use thiserror::Error;

/// Todo 操作全体で使うエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TodoError {
    /// 入力が不正（クライアント側の失敗、リトライしない）
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Todo not found: {0}")]
    NotFound(String),

    /// ストアとの通信・バッチ書き込みの失敗
    #[error("Storage error: {0}")]
    Storage(String),

    /// 保存済みレコードのシリアライズ/デシリアライズ失敗
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TodoError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, TodoError::Validation(_) | TodoError::NotFound(_))
    }
}

impl From<serde_json::Error> for TodoError {
    fn from(e: serde_json::Error) -> Self {
        TodoError::Serialization(e.to_string())
    }
}
