//! Maps the shared [`RagError`] taxonomy (§7) onto HTTP status codes.
//!
//! The orchestrators don't tag which stage produced a fatal error, so
//! the mapping below is keyed on the error *variant* rather than on
//! "search failed" vs. "answer failed" directly — a `ProviderUnavailable`
//! raised by the embedder during search and one raised by the gateway
//! during answer generation get the same status here. This is a
//! deliberate simplification over the per-stage 502/503 split in §4.12's
//! failure surfaces; the `stages` map in the response body still
//! pinpoints which stage actually failed.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ragforge_core::RagError;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

/// Newtype wrapper so we can implement `IntoResponse` for the shared
/// error enum without violating the orphan rule.
pub struct ApiError(pub RagError);

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        Self(err)
    }
}

fn status_and_tag(err: &RagError) -> (StatusCode, &'static str) {
    match err {
        RagError::InvalidRequest { .. } => (StatusCode::BAD_REQUEST, "invalid_request"),
        RagError::InvalidFilter { .. } => (StatusCode::BAD_REQUEST, "invalid_filter"),
        RagError::ModelUnknown { .. } => (StatusCode::BAD_REQUEST, "model_unknown"),
        RagError::CollectionNotFound { .. } => (StatusCode::NOT_FOUND, "collection_not_found"),
        RagError::CollectionExists { .. } => (StatusCode::CONFLICT, "collection_exists"),
        RagError::DimensionMismatch { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "dimension_mismatch"),
        RagError::EmptyDocument { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "empty_document"),
        RagError::ChunkingFailed { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "chunking_failed"),
        RagError::RateLimited { .. } => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
        RagError::GatewayBusy => (StatusCode::SERVICE_UNAVAILABLE, "gateway_busy"),
        RagError::ProviderUnavailable { .. } => (StatusCode::SERVICE_UNAVAILABLE, "provider_unavailable"),
        RagError::StoreUnavailable { .. } => (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable"),
        RagError::UpstreamTimeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "upstream_timeout"),
        RagError::InvalidResponse { .. } => (StatusCode::BAD_GATEWAY, "invalid_response"),
        RagError::RequestCancelled { .. } => (StatusCode::REQUEST_TIMEOUT, "request_cancelled"),
        RagError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, tag) = status_and_tag(&self.0);
        let body = ErrorBody { error: tag, message: self.0.to_string() };
        (status, Json(body)).into_response()
    }
}
