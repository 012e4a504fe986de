//! HTTP server: router, shared state and graceful shutdown.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use runtime::SpeechPipeline;
use runtime::metrics::TtsMetrics;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tts_core::{ServerConfig, TtsError, TtsResult};

use crate::service;

/// Shared server state.
#[derive(Debug)]
pub struct AppState {
    pub pipeline: Arc<SpeechPipeline>,
    pub prometheus: Option<PrometheusHandle>,
    pub metrics: TtsMetrics,
    pub started: Instant,
}

impl AppState {
    pub fn new(pipeline: Arc<SpeechPipeline>) -> Self {
        Self {
            pipeline,
            prometheus: None,
            metrics: TtsMetrics,
            started: Instant::now(),
        }
    }

    /// Serve `/metrics` from this Prometheus handle.
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}

/// Build the HTTP router.
pub fn build_router(state: Arc<AppState>, max_body_size: usize) -> Router {
    Router::new()
        .route("/", get(service::root))
        .route("/generate_speech", post(service::generate_speech))
        .route(
            "/generate_speech_stream",
            post(service::generate_speech_stream),
        )
        .route("/health", get(service::health))
        .route("/metrics", get(service::metrics))
        .fallback(service::not_found)
        .layer(DefaultBodyLimit::max(max_body_size))
        .with_state(state)
}

/// The Parler-TTS HTTP server.
pub struct TtsServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl TtsServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// Serve until SIGINT/SIGTERM, then drain for at most the shutdown timeout.
    pub async fn run(self) -> TtsResult<()> {
        let addr = self.config.bind_addr();
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!(addr = %listener.local_addr()?, "Listening");

        let app = build_router(Arc::clone(&self.state), self.config.max_body_size);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let mut server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.changed().await;
                })
                .await
        });

        tokio::select! {
            result = &mut server => {
                return join_result(result);
            }
            _ = shutdown_signal() => {
                info!("Shutdown signal received, draining connections");
            }
        }

        let _ = shutdown_tx.send(true);

        let timeout = Duration::from_secs(self.config.shutdown_timeout_secs);
        match tokio::time::timeout(timeout, &mut server).await {
            Ok(result) => {
                join_result(result)?;
                info!("Server stopped gracefully");
            }
            Err(_) => {
                warn!(timeout_secs = timeout.as_secs(), "Shutdown timeout, forcing exit");
                server.abort();
            }
        }

        Ok(())
    }
}

fn join_result(
    result: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> TtsResult<()> {
    match result {
        Ok(served) => served.map_err(TtsError::from),
        Err(e) => Err(TtsError::internal(format!("server task failed: {e}"))),
    }
}

/// Wait for shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
