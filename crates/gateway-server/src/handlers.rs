//! HTTP request handlers for the gateway API.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use gateway_core::{ClientRequest, ErrorKind, GatewayError, GatewayResult};
use gateway_telemetry::OUTCOME_SUCCESS;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    error::ApiError,
    extractors::{ClientIp, RequestId},
    state::AppState,
};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// Version
    pub version: &'static str,
}

/// Readiness check response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// `ready` or `not_ready`
    pub status: &'static str,
    /// Configured provider name
    pub provider: String,
    /// Whether the selected adapter holds credentials
    pub has_credentials: bool,
    /// Whether admission control is active
    pub admission_control: bool,
    /// Why the gateway is not ready
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Successful chat reply
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Generated text, possibly empty
    pub message: String,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness check endpoint
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let provider_config = state.provider_config.as_ref();
    let admission_control = state.admission.is_some();

    match state.router.select(provider_config) {
        Ok(provider) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ready",
                provider: provider.provider_type().as_str().to_string(),
                has_credentials: provider.has_credentials(),
                admission_control,
                error: None,
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                status: "not_ready",
                provider: provider_config.provider_name.clone(),
                has_credentials: false,
                admission_control,
                error: Some(e.client_message()),
            }),
        ),
    }
}

/// Metrics endpoint (Prometheus format)
pub async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.gather(),
    )
}

/// Single-turn chat endpoint.
///
/// Admission is decided before the body is looked at, so rejected callers
/// cost no parsing and no upstream call. An unreadable body (over the size
/// limit, or a broken stream) still answers with a JSON error.
#[instrument(skip_all, fields(request_id = %request_id, client_ip = %client_ip.0))]
pub async fn chat(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    client_ip: ClientIp,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let provider = state.provider_label();
    let start = Instant::now();

    let result = match admit(&state, &client_ip).await {
        Ok(()) => match body {
            Ok(body) => process_chat(&state, &body).await,
            Err(rejection) => {
                state
                    .metrics
                    .record_request(provider, ErrorKind::MalformedInput.as_str());
                debug!(
                    status = %rejection.status(),
                    error = %rejection.body_text(),
                    "Rejected unreadable request body"
                );
                return Err(rejection.into());
            }
        },
        Err(e) => Err(e),
    };
    let duration = start.elapsed();

    match result {
        Ok(text) => {
            state.metrics.record_request(provider, OUTCOME_SUCCESS);
            info!(
                provider,
                duration_ms = duration.as_millis() as u64,
                reply_len = text.len(),
                "Chat completion successful"
            );
            Ok(Json(ChatResponse { message: text }))
        }
        Err(e) => {
            state.metrics.record_request(provider, e.kind().as_str());
            log_failure(&e, provider, duration.as_millis() as u64);
            Err(e.into())
        }
    }
}

async fn admit(state: &AppState, ClientIp(key): &ClientIp) -> GatewayResult<()> {
    if let Some(admission) = &state.admission {
        let decision = admission.admit(key).await;
        if !decision.allowed {
            state.metrics.record_rejection();
            return Err(GatewayError::rate_limited(decision.limit, decision.remaining));
        }
        debug!(remaining = decision.remaining, "Request admitted");
    }
    Ok(())
}

async fn process_chat(state: &AppState, body: &[u8]) -> GatewayResult<String> {
    let message = ClientRequest::from_slice(body)?.normalize()?;

    let provider_config = state.provider_config.as_ref();
    let upstream_start = Instant::now();
    let result = state.router.route(provider_config, &message).await;

    if let Ok(provider) = state.config.providers.selected() {
        if !matches!(&result, Err(e) if e.kind() == ErrorKind::InvalidConfiguration) {
            state
                .metrics
                .observe_upstream(provider.as_str(), upstream_start.elapsed());
        }
    }

    Ok(result?.text)
}

fn log_failure(err: &GatewayError, provider: &str, duration_ms: u64) {
    match err {
        GatewayError::InvalidConfiguration { message } => {
            error!(provider, error = %message, "Chat provider is misconfigured");
        }
        GatewayError::Upstream {
            status,
            summary,
            detail,
            ..
        } => {
            error!(
                provider,
                status = ?status,
                summary = %summary,
                detail = %detail,
                duration_ms,
                "Upstream provider call failed"
            );
        }
        GatewayError::RateLimited { limit, .. } => {
            warn!(limit, "Rate limit exceeded");
        }
        GatewayError::MalformedInput { detail } => {
            debug!(error = %detail, "Rejected malformed request body");
        }
        GatewayError::NoMessage => {
            debug!("Rejected request without a user message");
        }
    }
}
