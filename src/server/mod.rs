//! HTTP surface for the gateway.
//!
//! One route per operation, a shared application state carrying the
//! injected capability handles, and a uniform error boundary that turns
//! any pipeline failure into the JSON error envelope.

pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::adapters::{
    BlobStore, ConversationalAgent, DocumentStore, LabelDetection, TextGeneration,
};
use crate::core::pipeline::{InvokePolicy, PipelineError};

/// Per-operation knobs resolved from configuration
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// Model used for plain text generation
    pub gemini_model: String,

    /// Model used for vision-grounded listing generation
    pub listing_model: String,

    /// Language tag sent to the conversational agent
    pub agent_language: String,

    /// Invocation bounds for capability calls
    pub policy: InvokePolicy,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            gemini_model: "gemini-1.5-flash".to_string(),
            listing_model: "gemini-2.5-flash".to_string(),
            agent_language: "en".to_string(),
            policy: InvokePolicy::default(),
        }
    }
}

/// Shared state with the injected capability handles
#[derive(Clone)]
pub struct AppState {
    pub labels: Arc<dyn LabelDetection>,
    pub generator: Arc<dyn TextGeneration>,
    pub agent: Arc<dyn ConversationalAgent>,
    pub documents: Arc<dyn DocumentStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub settings: Arc<GatewaySettings>,
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        warn!(status = self.status(), error = %self, "Request failed");

        let status =
            StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.envelope())).into_response()
    }
}

/// Build the gateway router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/extract-labels", post(handlers::extract_labels))
        .route("/analyze-image", post(handlers::extract_labels))
        .route("/generate-description", post(handlers::generate_description))
        .route("/chat", post(handlers::chat))
        .route("/save-record", post(handlers::save_record))
        .route("/generate-listing", post(handlers::generate_listing))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                info_span!(
                    "request",
                    id = %Uuid::new_v4(),
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .with_state(state)
}

/// Bind and serve until shutdown is requested
pub async fn serve(address: &str, state: AppState) -> Result<()> {
    let addr: SocketAddr = address
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", address))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(%addr, "Gateway listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Gateway server failure")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
