use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Service-wide error type.
///
/// Upstream variants carry only client-safe text; provider detail is
/// logged at the call site before the error is constructed.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{error}")]
    NotConfigured { error: String, message: String },

    #[error("{error}")]
    UpstreamUnavailable { error: String, message: String },

    #[error("{error}")]
    UpstreamRejected {
        error: String,
        message: Option<String>,
    },

    /// Integrity failure decoding the purchase context echoed back by
    /// the payment provider. The offending detail is logged, not exposed.
    #[error("purchase metadata could not be decoded")]
    MalformedMetadata(String),

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            message: Option<String>,
        }

        let (status, error, message) = match self {
            AppError::Validation(error) => (StatusCode::BAD_REQUEST, error, None),
            AppError::NotConfigured { error, message } => {
                (StatusCode::INTERNAL_SERVER_ERROR, error, Some(message))
            }
            AppError::UpstreamUnavailable { error, message } => {
                (StatusCode::INTERNAL_SERVER_ERROR, error, Some(message))
            }
            AppError::UpstreamRejected { error, message } => {
                (StatusCode::INTERNAL_SERVER_ERROR, error, message)
            }
            AppError::MalformedMetadata(detail) => {
                tracing::error!(detail = %detail, "Malformed purchase metadata");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Payment execution error".to_string(),
                    Some("Purchase metadata could not be decoded".to_string()),
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Unexpected internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    Some("An unexpected error occurred".to_string()),
                )
            }
        };

        (status, Json(ErrorResponse { error, message })).into_response()
    }
}
