//! Web server module

pub mod error;
pub mod http;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::service::ImprovementService;
use crate::validation::TextRules;

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    pub service: Arc<ImprovementService>,
    pub rules: TextRules,
}

impl ServerState {
    pub fn new(service: Arc<ImprovementService>, rules: TextRules) -> Self {
        Self { service, rules }
    }
}

/// Build the application router
pub fn router(state: ServerState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/improve", get(http::improve_handler))
        .route("/improve-async", post(http::improve_async_handler))
        .route("/job-status/{job_id}", get(http::job_status_handler))
        .route("/health", get(http::health_handler))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the web server and run until a shutdown signal arrives
pub async fn start(config: Config) -> Result<()> {
    let service = Arc::new(ImprovementService::from_config(&config)?);
    let state = ServerState::new(service.clone(), TextRules::from(&config.validation));
    let app = router(state, Duration::from_secs(config.server.request_timeout_secs));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server host/port")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(
        %addr,
        provider = ?config.provider.kind,
        model = %config.provider.model,
        workers = config.jobs.max_concurrent,
        "Listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    let timeout = Duration::from_secs(config.server.shutdown_timeout_secs);
    if !service.shutdown(timeout).await {
        warn!("Exiting with unfinished jobs");
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
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
    info!("Shutdown signal received");
}
