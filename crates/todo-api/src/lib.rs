//! Todo サービスの 2 つの入口
//!
//! - リモート呼び出し用リスナー: [`rpc_app`]
//! - ブラウザ向け HTTP リスナー: [`http_app`]（RPC ルートも `/api` 配下に載せる）

pub mod error;
pub mod identity;
pub mod rpc;
pub mod templates;
pub mod web;

use axum::Router;
use std::path::Path;
use std::sync::Arc;
use templates::Templates;
use todo_service::TodoService;
use tower_http::trace::TraceLayer;

/// アプリケーションの共有状態
#[derive(Clone)]
pub struct AppState {
    service: Arc<TodoService>,
    templates: Arc<Templates>,
}

impl AppState {
    pub fn new(service: TodoService, templates: Templates) -> Self {
        Self {
            service: Arc::new(service),
            templates: Arc::new(templates),
        }
    }
}

/// リモート呼び出し用のルータ
pub fn rpc_app(state: AppState) -> Router {
    rpc::routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// ブラウザ向けのルータ
pub fn http_app(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    web::routes(static_dir)
        .nest("/api", rpc::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// テスト用: メモリ上のリポジトリで組み立てた状態
#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    use infrastructure::InMemoryTodoRepository;

    let repo = Arc::new(InMemoryTodoRepository::new());
    let templates = Templates::new().expect("built-in templates compile");
    AppState::new(TodoService::new(repo), templates)
}
