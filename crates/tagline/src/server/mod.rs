//! HTTP server setup and routing.
//!
//! One `Tagger` is built at startup and shared by every request through
//! `AppState`. Inference runs on the blocking pool under a timeout.

mod error;
mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tagline_core::{Config, Deadline, InferenceError, Prediction, Tagger};
use tokio::signal;
use tokio::sync::Semaphore;
use tower_http::trace::TraceLayer;

use self::error::ApiError;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub tagger: Arc<Tagger>,
    pub inference_timeout: Duration,
    /// One permit per loaded model; held for the lifetime of a blocking prediction
    model_permits: Arc<Semaphore>,
}

impl AppState {
    pub fn new(tagger: Arc<Tagger>, inference_timeout: Duration) -> Self {
        Self {
            tagger,
            inference_timeout,
            model_permits: Arc::new(Semaphore::new(1)),
        }
    }

    /// Run a prediction on the blocking pool, bounded by the inference timeout.
    ///
    /// Requests queue for the model permit inside the timeout, so a request
    /// that times out while waiting never reaches the model. One that times
    /// out while running stops before its next category.
    async fn predict(&self, text: String) -> Result<Prediction, ApiError> {
        let deadline = Deadline::after(self.inference_timeout);
        let start = std::time::Instant::now();

        let work = async {
            let permit = Arc::clone(&self.model_permits)
                .acquire_owned()
                .await
                .map_err(|e| ApiError::Inference(format!("Model permits closed: {e}")))?;
            let tagger = Arc::clone(&self.tagger);

            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                tagger.predict_before(&text, deadline)
            })
            .await
            .map_err(|e| ApiError::Inference(format!("Task join error: {e}")))?
            .map_err(ApiError::from)
        };

        match tokio::time::timeout(self.inference_timeout, work).await {
            Ok(Ok(prediction)) => {
                tracing::debug!("Tagged description in {:?}", start.elapsed());
                Ok(prediction)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(InferenceError::Timeout {
                timeout_ms: self.inference_timeout.as_millis() as u64,
            }
            .into()),
        }
    }
}

/// Build the router with all routes and middleware.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/get-tags", post(handlers::get_tags))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve HTTP until Ctrl+C or SIGTERM.
pub async fn run(config: &Config, tagger: Tagger) -> anyhow::Result<()> {
    let state = AppState::new(
        Arc::new(tagger),
        Duration::from_millis(config.limits.inference_timeout_ms),
    );
    let app = build_router(state, config.server.max_body_bytes);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid bind address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, shutting down");
        },
    }
}
