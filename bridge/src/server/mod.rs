// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::error::BridgeError;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use prometheus::{Registry, TextEncoder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

pub const PING_PATH: &str = "/ping";
pub const METRICS_PATH: &str = "/metrics";

// BridgeNode's public metadata that is accessible via the `/ping` endpoint.
// Be careful with what to put here, as it is public.
#[derive(Clone, Debug, serde::Serialize)]
pub struct BridgeNodePublicMetadata {
    pub version: &'static str,
    pub validator_address: Option<String>,
    pub bitcoin_vault_address: Option<String>,
}

impl BridgeNodePublicMetadata {
    pub fn new(version: &'static str, validator_address: String, bitcoin_vault_address: String) -> Self {
        Self {
            version,
            validator_address: Some(validator_address),
            bitcoin_vault_address: Some(bitcoin_vault_address),
        }
    }

    pub fn empty_for_testing() -> Self {
        Self {
            version: "testing",
            validator_address: None,
            bitcoin_vault_address: None,
        }
    }
}

type ServerState = (Registry, Arc<BridgeNodePublicMetadata>);

pub async fn run_server(
    socket_address: SocketAddr,
    registry: Registry,
    metadata: Arc<BridgeNodePublicMetadata>,
) -> anyhow::Result<JoinHandle<()>> {
    let listener = tokio::net::TcpListener::bind(socket_address).await?;
    info!("Metrics server listening on {}", socket_address);
    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, make_router(registry, metadata).into_make_service()).await {
            error!("Metrics server stopped: {}", e);
        }
    }))
}

pub(crate) fn make_router(registry: Registry, metadata: Arc<BridgeNodePublicMetadata>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route(PING_PATH, get(ping))
        .route(METRICS_PATH, get(metrics))
        .with_state((registry, metadata))
}

impl axum::response::IntoResponse for BridgeError {
    fn into_response(self) -> axum::response::Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Something went wrong: {:?}", self),
        )
            .into_response()
    }
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

async fn ping(State((_, metadata)): State<ServerState>) -> Json<BridgeNodePublicMetadata> {
    Json(metadata.as_ref().clone())
}

async fn metrics(State((registry, _)): State<ServerState>) -> Result<String, BridgeError> {
    TextEncoder::new()
        .encode_to_string(&registry.gather())
        .map_err(|e| BridgeError::Generic(format!("failed to encode metrics: {e}")))
}
