use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tokio::sync::oneshot;

use super::controller::{analyze, chat, health, list_models, pull_model};
use super::Container;

/// Uploads are one chart image plus a few form fields.
pub const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// HTTP routes of the analysis gateway.
pub fn app(container: Arc<Container>) -> axum::Router {
    axum::Router::new()
        .route("/chat", post(chat))
        .route("/analyze", post(analyze))
        .route("/health", get(health))
        .route("/models", get(list_models))
        .route("/models/pull", post(pull_model))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(container)
}

/// Bound port and shutdown trigger of a running server.
pub struct ServeHandle {
    pub port: u16,
    shutdown_tx: Option<oneshot::Sender<()>>,
    join: Option<tokio::task::JoinHandle<Result<(), std::io::Error>>>,
}

impl ServeHandle {
    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            join.await??;
        }
        Ok(())
    }

    /// Wait until the server stops on its own or ctrl-c is pressed.
    pub async fn wait_for_ctrl_c(self) -> Result<()> {
        tokio::signal::ctrl_c().await?;
        tracing::info!("received shutdown signal");
        self.shutdown().await
    }
}

/// Bind `bind` (port 0 picks a free one) and serve in a background task.
pub async fn serve(container: Arc<Container>, bind: &str) -> Result<ServeHandle> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    let port = listener.local_addr()?.port();
    tracing::info!(
        "Listening on {bind} (port {port}), backend: {}",
        container.backend().method()
    );

    let router = app(container);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let join = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    Ok(ServeHandle {
        port,
        shutdown_tx: Some(shutdown_tx),
        join: Some(join),
    })
}
