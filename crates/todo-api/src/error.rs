//! ドメインエラーを各トランスポートのレスポンスに変換する

use crate::templates::TemplateError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::TodoError;
use serde::Serialize;

/// リモート呼び出しのステータスコード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RpcCode {
    InvalidArgument,
    NotFound,
    Internal,
}

impl RpcCode {
    pub fn http_status(self) -> StatusCode {
        match self {
            RpcCode::InvalidArgument => StatusCode::BAD_REQUEST,
            RpcCode::NotFound => StatusCode::NOT_FOUND,
            RpcCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RpcError {
    pub code: RpcCode,
    pub message: String,
}

impl RpcError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self {
            code: RpcCode::InvalidArgument,
            message: message.into(),
        }
    }
}

impl From<TodoError> for RpcError {
    fn from(e: TodoError) -> Self {
        match e {
            TodoError::Validation(msg) => Self::invalid_argument(msg),
            TodoError::NotFound(id) => Self {
                code: RpcCode::NotFound,
                message: format!("todo {id:?} not found"),
            },
            TodoError::Storage(_) | TodoError::Serialization(_) => {
                tracing::error!(error = %e, "rpc call failed");
                Self {
                    code: RpcCode::Internal,
                    message: "internal error".to_string(),
                }
            }
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        (self.code.http_status(), Json(self)).into_response()
    }
}

/// ブラウザ向けハンドラのエラー（プレーンテキストで返す）
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Todo(#[from] TodoError),

    #[error(transparent)]
    Render(#[from] TemplateError),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            WebError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            WebError::Todo(TodoError::Validation(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            WebError::Todo(TodoError::NotFound(id)) => {
                (StatusCode::NOT_FOUND, format!("todo {id:?} not found"))
            }
            WebError::Todo(e) => {
                tracing::error!(error = %e, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
            WebError::Render(e) => {
                tracing::error!(error = %e, "template render failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "render error".to_string())
            }
        };
        (status, message).into_response()
    }
}
