use crate::errors::TodoError;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 説明文の最大長（Unicode コードポイント数）
pub const MAX_DESCRIPTION_CHARS: usize = 270;

/// 作成日時の表示形式（`YYYY-MM-DD HH:MM:SS`）
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(pub String);

impl TodoId {
    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 整数として解釈できる場合はその値（画面の並び替えに使う）
    pub fn as_number(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TodoId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// 保存される Todo レコード
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub done: bool,
    /// 作成日時（`DATE_FORMAT` 形式の文字列）
    #[serde(default)]
    pub date: String,
}

impl Todo {
    /// タイトル必須・説明文の長さ制限をチェック
    pub fn validate(&self) -> Result<(), TodoError> {
        validate_fields(&self.title, &self.description)
    }

    /// 部分更新を適用する。空でないフィールドのみ上書きし、done は常に上書き。
    pub fn apply(&mut self, patch: TodoPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        self.done = patch.done;
    }
}

/// 作成リクエストの入力
///
/// JSON に `id` や `done` が含まれていても無視する（ID はサーバー側で採番）。
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewTodo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: Option<String>,
}

impl NewTodo {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            date: None,
        }
    }

    pub fn validate(&self) -> Result<(), TodoError> {
        validate_fields(&self.title, &self.description)
    }

    /// 採番済みの ID と現在時刻から Todo を組み立てる
    pub fn into_todo(self, id: TodoId, now: DateTime<Local>) -> Todo {
        let date = match self.date {
            Some(d) if !d.trim().is_empty() => d,
            _ => format_date(now),
        };
        Todo {
            id,
            title: self.title,
            description: self.description,
            done: false,
            date,
        }
    }
}

/// 部分更新の内容
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub done: bool,
}

impl TodoPatch {
    /// 空文字列は「指定なし」として扱う
    pub fn from_fields(title: String, description: String, done: bool) -> Self {
        Self {
            title: Some(title).filter(|t| !t.is_empty()),
            description: Some(description).filter(|d| !d.is_empty()),
            done,
        }
    }
}

pub fn format_date(at: DateTime<Local>) -> String {
    at.format(DATE_FORMAT).to_string()
}

fn validate_fields(title: &str, description: &str) -> Result<(), TodoError> {
    if title.is_empty() {
        return Err(TodoError::Validation("title must not be empty".to_string()));
    }
    let len = description.chars().count();
    if len > MAX_DESCRIPTION_CHARS {
        return Err(TodoError::Validation(format!(
            "description is too long: {len} characters (max {MAX_DESCRIPTION_CHARS})"
        )));
    }
    Ok(())
}
