//! todo-api バイナリのエントリポイント
//! リモート呼び出し用と HTTP 用の 2 つのリスナーを同時に起動します。

use anyhow::Context;
use domain::TodoRepository;
use infrastructure::{InMemoryTodoRepository, RedisStore, RedisTodoRepository, SweeperHandle};
use shared::{init_tracing, Config, StorageBackend};
use std::future::IntoFuture;
use std::sync::Arc;
use todo_api::{http_app, rpc_app, templates::Templates, AppState};
use todo_service::TodoService;
use tokio::net::TcpListener;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format).map_err(|e| anyhow::anyhow!(e))?;

    let (repo, sweeper) = build_repository(&config).await?;
    // テンプレートの不備はここで起動失敗にする
    let templates = Templates::new()?;
    let state = AppState::new(TodoService::new(repo), templates);

    let rpc_listener = TcpListener::bind(config.rpc_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.rpc_addr))?;
    let http_listener = TcpListener::bind(config.http_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.http_addr))?;
    tracing::info!(
        rpc_addr = %config.rpc_addr,
        http_addr = %config.http_addr,
        storage = ?config.storage,
        "server starting"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(());
    });

    let rpc_server = axum::serve(rpc_listener, rpc_app(state.clone()))
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx.clone()));
    let http_server = axum::serve(http_listener, http_app(state, &config.static_dir))
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx));

    tokio::try_join!(rpc_server.into_future(), http_server.into_future())
        .context("server error")?;

    if let Some(sweeper) = sweeper {
        sweeper.shutdown().await;
    }
    tracing::info!("server stopped");
    Ok(())
}

async fn build_repository(
    config: &Config,
) -> anyhow::Result<(Arc<dyn TodoRepository>, Option<SweeperHandle>)> {
    match config.storage {
        StorageBackend::Redis => {
            let store = RedisStore::connect(&config.redis_addr).await?;
            let repo: Arc<dyn TodoRepository> =
                Arc::new(RedisTodoRepository::with_ttl(store, config.todo_ttl));
            Ok((repo, None))
        }
        StorageBackend::Memory => {
            let memory = InMemoryTodoRepository::with_ttl(config.todo_ttl);
            let sweeper = memory.spawn_sweeper(config.cleanup_interval);
            tracing::info!(
                interval_secs = config.cleanup_interval.as_secs(),
                "using in-memory storage with periodic sweep"
            );
            let repo: Arc<dyn TodoRepository> = Arc::new(memory);
            Ok((repo, Some(sweeper)))
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}

async fn wait_for_shutdown(mut rx: watch::Receiver<()>) {
    // 送信側が drop されても停止する
    let _ = rx.changed().await;
}
