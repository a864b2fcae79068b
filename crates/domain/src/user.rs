use serde::{Deserialize, Serialize};
use std::fmt;

/// 識別子を送ってこないクライアントが共有する既定ユーザー
pub const DEFAULT_USER_ID: &str = "guest";

/// Todo の所有者を区切るユーザー識別子（認証はしない、クライアントを信頼する）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    /// 空白のみの値は未指定とみなす
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self(DEFAULT_USER_ID.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}
