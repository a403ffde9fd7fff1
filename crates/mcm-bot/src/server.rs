//! HTTP server implementation using axum.
//!
//! - `POST /rpc`: one JSON-RPC request, one response
//! - `GET /intents`: maker intents of every market
//! - `GET /health`: liveness
//! - `GET /metrics`: Prometheus text format

use crate::dispatcher::Dispatcher;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use mcm_core::{format_address, Intent, RpcRequest, RpcResponse};
use mcm_telemetry::Metrics;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Create the axum router.
pub fn create_router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/rpc", post(handle_rpc))
        .route("/intents", get(get_intents))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(dispatcher)
}

async fn handle_rpc(
    State(dispatcher): State<Arc<Dispatcher>>,
    body: Result<Json<RpcRequest>, JsonRejection>,
) -> Json<RpcResponse> {
    match body {
        Ok(Json(request)) => Json(dispatcher.handle(request).await),
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Malformed request");
            Metrics::request("unknown", "error");
            Json(RpcResponse::error(
                Value::Null,
                format!("Malformed request: {}", rejection.body_text()),
            ))
        }
    }
}

async fn get_intents(
    State(dispatcher): State<Arc<Dispatcher>>,
) -> Result<Json<Vec<Intent>>, (StatusCode, String)> {
    dispatcher.intents().await.map(Json).map_err(|e| {
        error!(error = %e, "Failed to collect intents");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}

async fn health(State(dispatcher): State<Arc<Dispatcher>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "maker": format_address(&dispatcher.maker_address()),
        "markets": dispatcher.strategies().len(),
    }))
}

async fn metrics() -> Response {
    match Metrics::render() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// Serve until `shutdown` resolves.
pub async fn run_server(
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Starting JSON-RPC server");
    }
    axum::serve(listener, create_router(dispatcher))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
