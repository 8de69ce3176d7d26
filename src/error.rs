//! Error taxonomy shared by every proxy route.
//!
//! Each variant maps to exactly one HTTP status so handlers can return
//! `Result<_, ProxyError>` and let the `IntoResponse` impl build the JSON body.
//! Per-row value parse failures are not represented here: they are recovered
//! in the series model as a missing value.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// One or more required query parameters are absent or empty.
    #[error("Missing required parameters: {}", .0.join(", "))]
    MissingParameter(Vec<String>),

    /// A parameter is present but malformed.
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    /// The static shared key header did not match.
    #[error("Authentication required")]
    Unauthorized,

    /// A server-held secret is not configured.
    #[error("{0} is not configured on the server")]
    MissingSecret(&'static str),

    /// The upstream answered, but without the expected aggregate container.
    #[error("Unexpected {upstream} response format: {message}")]
    UpstreamFormat {
        upstream: &'static str,
        message: String,
    },

    /// The upstream answered with a body we cannot use (not JSON, missing chart data).
    #[error("Invalid {upstream} payload: {message}")]
    InvalidPayload {
        upstream: &'static str,
        message: String,
        details: Option<Value>,
    },

    /// Non-2xx status from an upstream.
    #[error("{upstream} request failed with status {status}: {message}")]
    UpstreamStatus {
        upstream: &'static str,
        status: u16,
        message: String,
        details: Option<Value>,
    },

    #[error("{upstream} did not answer within {seconds}s")]
    UpstreamTimeout { upstream: &'static str, seconds: u64 },

    /// Network or decoding failure talking to an upstream.
    #[error("{upstream} transport error: {message}")]
    Transport {
        upstream: &'static str,
        message: String,
    },
}

impl ProxyError {
    pub fn invalid(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingParameter(_) | Self::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::MissingSecret(_) | Self::UpstreamFormat { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::InvalidPayload { .. } | Self::Transport { .. } => StatusCode::BAD_GATEWAY,
            Self::UpstreamStatus { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            Self::InvalidPayload { details, .. } | Self::UpstreamStatus { details, .. } => {
                details.clone()
            }
            _ => None,
        }
    }
}

/// JSON body returned for every failed request.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
}

impl From<&ProxyError> for ErrorResponse {
    fn from(err: &ProxyError) -> Self {
        Self {
            error: err.to_string(),
            details: err.details(),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", self);
        } else {
            tracing::debug!(status = status.as_u16(), "{}", self);
        }
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}
