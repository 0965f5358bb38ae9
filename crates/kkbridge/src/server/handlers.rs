//! HTTP request handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use kkbridge_frame::FrameError;
use kkbridge_link::{ExchangeOutcome, LinkError};
use serde::{Deserialize, Serialize};
use tokio::task::JoinError;
use tracing::{debug, warn};

use super::AppState;

/// API error response.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: u16,
}

impl ApiError {
    fn new(code: StatusCode, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.as_u16(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl From<LinkError> for ApiError {
    fn from(err: LinkError) -> Self {
        let status = match &err {
            LinkError::UnknownChannel(_) => StatusCode::NOT_FOUND,
            LinkError::Frame(FrameError::MalformedMessage { .. }) => StatusCode::BAD_REQUEST,
            LinkError::Frame(FrameError::ProtocolViolation { .. })
            | LinkError::Frame(FrameError::PayloadTooLarge { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            LinkError::Frame(FrameError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            LinkError::Frame(FrameError::Io(_)) | LinkError::Transport(_) => {
                StatusCode::BAD_GATEWAY
            }
        };
        debug!(error = %err, code = status.as_u16(), "request failed");
        Self::new(status, err.to_string())
    }
}

impl From<JoinError> for ApiError {
    fn from(err: JoinError) -> Self {
        warn!(error = %err, "exchange task did not complete");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "exchange task failed")
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, err.body_text())
    }
}

/// `{"data": "<hex>"}` body of the legacy surface.
#[derive(Debug, Serialize, Deserialize)]
pub struct HexData {
    pub data: String,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// POST /exchange/:kind - write one datagram, unframed.
pub async fn legacy_write(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    body: Result<Json<HexData>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(body) = body?;
    let datagram = hex::decode(body.data.trim()).map_err(|err| {
        ApiError::new(StatusCode::BAD_REQUEST, format!("data is not valid hex: {err}"))
    })?;

    debug!(kind = %kind, len = datagram.len(), "legacy write");
    tokio::task::spawn_blocking(move || state.bridge().send_raw(&kind, &datagram)).await??;

    Ok(Json(serde_json::json!({})))
}

/// GET /exchange/:kind - read one datagram, unframed.
pub async fn legacy_read(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> Result<Json<HexData>, ApiError> {
    let datagram =
        tokio::task::spawn_blocking(move || state.bridge().recv_raw(&kind)).await??;

    Ok(Json(HexData {
        data: hex::encode(&datagram),
    }))
}

/// POST /raw/:kind - framed exchange.
pub async fn raw_exchange(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let outcome =
        tokio::task::spawn_blocking(move || state.bridge().exchange(&kind, &body)).await??;

    Ok(match outcome {
        ExchangeOutcome::Acknowledged => StatusCode::OK.into_response(),
        ExchangeOutcome::Response(message) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            message,
        )
            .into_response(),
    })
}
