//! ブラウザ向けの HTML ルート

use crate::error::WebError;
use crate::identity::WebUser;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
    Router,
};
use domain::{NewTodo, Todo, TodoId, TodoPatch};
use futures::StreamExt;
use serde::{de::DeserializeOwned, Deserialize};
use std::path::Path as FsPath;
use tower_http::services::ServeDir;

const SWAGGER_JSON: &str = include_str!("../api/todo.swagger.json");

pub fn routes(static_dir: impl AsRef<FsPath>) -> Router<AppState> {
    Router::new()
        .route("/", get(todos_page))
        .route("/items", post(create_item))
        // `/*tail` は空の末尾にマッチしないため、`/items/` は別に受けて 400 を返す
        .route(
            "/items/",
            get(missing_item_id).patch(missing_item_id).delete(missing_item_id),
        )
        .route(
            "/items/*tail",
            get(get_item).patch(update_item).delete(delete_item),
        )
        .route("/swagger", get(swagger))
        .nest_service("/static", ServeDir::new(static_dir.as_ref()))
}

#[derive(Debug, Deserialize)]
struct ItemPatch {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    done: bool,
}

/// 一覧画面の並び: 未完了が先、同じグループ内は ID の数値順
///
/// 数値にならない ID はグループの末尾に回し、相互の順序は保つ。
pub fn sort_for_page(todos: &mut [Todo]) {
    todos.sort_by_key(|todo| {
        let id_key = match todo.id.as_number() {
            Some(n) => (0u8, n),
            None => (1u8, 0),
        };
        (todo.done, id_key)
    });
}

/// パス末尾から ID を取り出す。空や `/` を含むものは拒否する。
fn item_id(tail: &str) -> Result<TodoId, WebError> {
    let id = tail.strip_prefix('/').unwrap_or(tail);
    if id.is_empty() || id.contains('/') {
        return Err(WebError::BadRequest(format!("invalid todo id: {tail:?}")));
    }
    Ok(TodoId::from(id))
}

async fn missing_item_id() -> WebError {
    WebError::BadRequest("todo id is required".to_string())
}

fn decode<T: DeserializeOwned>(body: &Bytes) -> Result<T, WebError> {
    serde_json::from_slice(body).map_err(|e| WebError::BadRequest(format!("invalid JSON: {e}")))
}

async fn todos_page(
    State(state): State<AppState>,
    WebUser(user): WebUser,
) -> Result<Html<String>, WebError> {
    let mut todos: Vec<Todo> = state.service.list_todos(&user).await?.collect().await;
    sort_for_page(&mut todos);
    Ok(Html(state.templates.render_index(&todos)?))
}

async fn get_item(
    State(state): State<AppState>,
    Path(tail): Path<String>,
) -> Result<Html<String>, WebError> {
    let id = item_id(&tail)?;
    let todo = state.service.get_todo(&id).await?;
    Ok(Html(state.templates.render_item(&todo)?))
}

async fn create_item(
    State(state): State<AppState>,
    WebUser(user): WebUser,
    body: Bytes,
) -> Result<Html<String>, WebError> {
    let input: NewTodo = decode(&body)?;
    let todo = state.service.create_todo(&user, input).await?;
    tracing::info!(user_id = %user, todo_id = %todo.id, "todo created from page");
    Ok(Html(state.templates.render_item(&todo)?))
}

async fn update_item(
    State(state): State<AppState>,
    WebUser(user): WebUser,
    Path(tail): Path<String>,
    body: Bytes,
) -> Result<Html<String>, WebError> {
    let id = item_id(&tail)?;
    let req: ItemPatch = decode(&body)?;
    let patch = TodoPatch::from_fields(req.title, req.description, req.done);
    let todo = state.service.update_todo(&user, &id, patch).await?;
    Ok(Html(state.templates.render_item(&todo)?))
}

async fn delete_item(
    State(state): State<AppState>,
    WebUser(user): WebUser,
    Path(tail): Path<String>,
) -> Result<StatusCode, WebError> {
    let id = item_id(&tail)?;
    state.service.delete_todo(&user, &id).await?;
    Ok(StatusCode::OK)
}

async fn swagger() -> impl IntoResponse {
    ([(CONTENT_TYPE, "application/json")], SWAGGER_JSON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{http_app, test_state};
    use axum::{body, body::Body, http::Request};
    use tower::ServiceExt; // for `oneshot`

    fn app() -> Router {
        http_app(test_state(), "static")
    }

    fn todo(id: &str, done: bool) -> Todo {
        Todo {
            id: TodoId::from(id),
            title: format!("todo {id}"),
            description: String::new(),
            done,
            date: "2024-01-01 00:00:00".to_string(),
        }
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn json_request(method: &str, uri: &str, user: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .header("X-User-ID", user)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn page_puts_incomplete_first_then_numeric_id_order() {
        let mut todos = vec![todo("1", true), todo("2", false), todo("3", true)];

        sort_for_page(&mut todos);

        let ids: Vec<&str> = todos.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1", "3"]);
    }

    #[test]
    fn page_sort_compares_ids_numerically_and_keeps_non_numeric_last() {
        let mut todos = vec![
            todo("b", false),
            todo("10", false),
            todo("a", false),
            todo("9", false),
        ];

        sort_for_page(&mut todos);

        let ids: Vec<&str> = todos.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["9", "10", "b", "a"]);
    }

    #[test]
    fn item_id_rejects_empty_and_nested_tails() {
        assert_eq!(item_id("42").unwrap(), TodoId::from("42"));
        assert_eq!(item_id("/42").unwrap(), TodoId::from("42"));
        assert!(matches!(item_id(""), Err(WebError::BadRequest(_))));
        assert!(matches!(item_id("/"), Err(WebError::BadRequest(_))));
        assert!(matches!(item_id("1/2"), Err(WebError::BadRequest(_))));
    }

    #[tokio::test]
    async fn index_renders_users_todos() {
        // Arrange
        let app = app();
        send(&app, json_request("POST", "/items", "alice", r#"{"title":"Buy <milk>"}"#)).await;
        send(&app, json_request("POST", "/items", "bob", r#"{"title":"Bob only"}"#)).await;

        // Act
        let request = Request::builder()
            .uri("/")
            .header("cookie", "theme=dark; X-User-ID=alice")
            .body(Body::empty())
            .unwrap();
        let (status, html) = send(&app, request).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Buy &lt;milk&gt;"));
        assert!(!html.contains("Bob only"));
    }

    #[tokio::test]
    async fn create_returns_fragment_and_rejects_invalid_input() {
        let app = app();

        let create = json_request("POST", "/items", "alice", r#"{"title":"Write report"}"#);
        let (status, html) = send(&app, create).await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Write report"));
        assert!(html.contains("todo-item"));

        let empty_title = json_request("POST", "/items", "alice", r#"{"title":""}"#);
        let (status, _) = send(&app, empty_title).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, json_request("POST", "/items", "alice", "{oops")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn patch_get_and_delete_an_item() {
        let app = app();
        let (_, created) =
            send(&app, json_request("POST", "/items", "alice", r#"{"title":"Walk dog"}"#)).await;
        let id = created
            .split("data-id=\"")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap()
            .to_string();

        // done のみ更新
        let (status, html) = send(
            &app,
            json_request("PATCH", &format!("/items/{id}"), "alice", r#"{"done":true}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("data-done=\"true\""));
        assert!(html.contains("Walk dog"));

        let get = Request::builder().uri(format!("/items/{id}")).body(Body::empty()).unwrap();
        let (status, html) = send(&app, get).await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("data-done=\"true\""));

        let delete = json_request("DELETE", &format!("/items/{id}"), "alice", "");
        let (status, body) = send(&app, delete).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());

        let get = Request::builder().uri(format!("/items/{id}")).body(Body::empty()).unwrap();
        let (status, _) = send(&app, get).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_item_path_is_bad_request() {
        let app = app();
        for method in ["GET", "PATCH", "DELETE"] {
            let (status, _) = send(&app, json_request(method, "/items/", "alice", "{}")).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{method} /items/");
        }
    }

    #[tokio::test]
    async fn encoded_cookie_identity_matches_header_identity() {
        // Arrange: ヘッダーで "alice smith" として作成
        let app = app();
        let create = json_request("POST", "/items", "alice smith", r#"{"title":"Shared plan"}"#);
        send(&app, create).await;

        // Act: ブラウザは Cookie を encodeURIComponent で書き込む
        let request = Request::builder()
            .uri("/")
            .header("cookie", "X-User-ID=alice%20smith")
            .body(Body::empty())
            .unwrap();
        let (status, html) = send(&app, request).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Shared plan"));
    }

    #[tokio::test]
    async fn nested_item_path_is_bad_request() {
        let (status, _) = send(&app(), json_request("DELETE", "/items/1/2", "alice", "")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn swagger_is_served_as_json() {
        let request = Request::builder().uri("/swagger").body(Body::empty()).unwrap();
        let (status, body) = send(&app(), request).await;

        assert_eq!(status, StatusCode::OK);
        let doc: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(doc["paths"].is_object());
    }

    #[tokio::test]
    async fn rpc_routes_are_reachable_under_api() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/todo.TodoService/GetTodo")
            .body(Body::from(r#"{"id":"404"}"#))
            .unwrap();
        let (status, body) = send(&app(), request).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("NOT_FOUND"));
    }
}
