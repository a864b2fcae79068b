//! リモート呼び出しの受け口（`/todo.TodoService/<Method>` への JSON POST）
//!
//! ListTodos だけはサーバーストリーミングで、1 行 1 件の NDJSON を返す。

use crate::error::RpcError;
use crate::identity::RpcUser;
use crate::AppState;
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use domain::{NewTodo, Todo, TodoId, TodoPatch};
use futures::StreamExt;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub const NDJSON: &str = "application/x-ndjson";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/todo.TodoService/CreateTodo", post(create_todo))
        .route("/todo.TodoService/GetTodo", post(get_todo))
        .route("/todo.TodoService/ListTodos", post(list_todos))
        .route("/todo.TodoService/UpdateTodo", post(update_todo))
        .route("/todo.TodoService/DeleteTodo", post(delete_todo))
}

/// GetTodo / DeleteTodo のリクエスト
#[derive(Debug, Deserialize)]
struct IdRequest {
    #[serde(default)]
    id: String,
}

#[derive(Debug, Deserialize)]
struct UpdateTodoRequest {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Serialize)]
struct Empty {}

/// 空のボディは `{}` として扱う
fn decode<T: DeserializeOwned>(body: &Bytes) -> Result<T, RpcError> {
    let raw: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        &body[..]
    };
    serde_json::from_slice(raw)
        .map_err(|e| RpcError::invalid_argument(format!("invalid request body: {e}")))
}

fn required_id(raw: String) -> Result<TodoId, RpcError> {
    if raw.trim().is_empty() {
        return Err(RpcError::invalid_argument("id is required"));
    }
    Ok(TodoId::from_string(raw))
}

async fn create_todo(
    State(state): State<AppState>,
    RpcUser(user): RpcUser,
    body: Bytes,
) -> Result<Json<Todo>, RpcError> {
    let input: NewTodo = decode(&body)?;
    let todo = state.service.create_todo(&user, input).await?;
    Ok(Json(todo))
}

async fn get_todo(State(state): State<AppState>, body: Bytes) -> Result<Json<Todo>, RpcError> {
    let req: IdRequest = decode(&body)?;
    let id = required_id(req.id)?;
    Ok(Json(state.service.get_todo(&id).await?))
}

async fn list_todos(
    State(state): State<AppState>,
    RpcUser(user): RpcUser,
) -> Result<Response, RpcError> {
    let todos = state.service.list_todos(&user).await?;
    let lines = todos.map(|todo| {
        serde_json::to_vec(&todo).map(|mut line| {
            line.push(b'\n');
            line
        })
    });
    Ok(([(CONTENT_TYPE, NDJSON)], Body::from_stream(lines)).into_response())
}

async fn update_todo(
    State(state): State<AppState>,
    RpcUser(user): RpcUser,
    body: Bytes,
) -> Result<Json<Todo>, RpcError> {
    let req: UpdateTodoRequest = decode(&body)?;
    let id = required_id(req.id)?;
    let patch = TodoPatch::from_fields(req.title, req.description, req.done);
    Ok(Json(state.service.update_todo(&user, &id, patch).await?))
}

async fn delete_todo(
    State(state): State<AppState>,
    RpcUser(user): RpcUser,
    body: Bytes,
) -> Result<Json<Empty>, RpcError> {
    let req: IdRequest = decode(&body)?;
    let id = required_id(req.id)?;
    state.service.delete_todo(&user, &id).await?;
    Ok(Json(Empty {}))
}
