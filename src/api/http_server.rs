// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use super::{handlers::health_handler, process::process_handler};
use crate::config::{allows_any_origin, AppConfig};
use crate::pipeline::DescriptionPipeline;
use crate::vision::DEFAULT_MAX_IMAGE_SIZE;

// Room for multipart boundaries and part headers on top of the image itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<DescriptionPipeline>,
}

impl AppState {
    pub fn new(pipeline: DescriptionPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

/// Router-level settings taken from [`AppConfig`]
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// `*` (or an empty list) allows any origin
    pub cors_allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            cors_allowed_origins: vec!["*".to_string()],
            max_upload_bytes: DEFAULT_MAX_IMAGE_SIZE,
        }
    }
}

impl From<&AppConfig> for HttpOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            cors_allowed_origins: config.cors_allowed_origins.clone(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

impl HttpOptions {
    fn cors_layer(&self) -> CorsLayer {
        if allows_any_origin(&self.cors_allowed_origins) {
            return CorsLayer::permissive();
        }

        let origins: Vec<HeaderValue> = self
            .cors_allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    }
}

pub fn create_app(state: AppState, options: &HttpOptions) -> Router {
    Router::new()
        .route("/process", post(process_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(
            options.max_upload_bytes + MULTIPART_OVERHEAD_BYTES,
        ))
        .layer(options.cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured address and serve until Ctrl+C or SIGTERM
pub async fn start_server(config: &AppConfig, state: AppState) -> Result<()> {
    let app = create_app(state, &HttpOptions::from(config));
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;

    info!("HTTP server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
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
