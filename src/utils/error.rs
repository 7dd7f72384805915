use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Requested quantity {requested} is below already sold count {sold}")]
    QuantityBelowSold { requested: u32, sold: u32 },

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Upstream service error")]
    UpstreamError(#[from] reqwest::Error),

    #[error("Upstream service rejected the request: {0}")]
    UpstreamRejected(String),

    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("Internal server error")]
    InternalServerError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::QuantityBelowSold { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            AppError::UpstreamRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::QuantityBelowSold { .. } => "QUANTITY_BELOW_SOLD",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::UpstreamError(_) => "UPSTREAM_ERROR",
            AppError::UpstreamRejected(_) => "UPSTREAM_REJECTED",
            AppError::MalformedResponse(_) => "MALFORMED_RESPONSE",
            AppError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::UpstreamRejected(msg)
            | AppError::MalformedResponse(msg)
            | AppError::InternalServerError(msg) => {
                error!(error = ?self, message = %msg, "Application error");
            }
            AppError::QuantityBelowSold { requested, sold } => {
                error!(requested, sold, "Quantity below sold count");
            }
            AppError::UpstreamError(e) => {
                error!(error = ?e, "Upstream service error");
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Log internal details
        self.log();

        // Only expose high-level message to the client
        let public_message = match &self {
            AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::UpstreamRejected(msg)
            | AppError::MalformedResponse(msg)
            | AppError::InternalServerError(msg) => msg.clone(),
            AppError::QuantityBelowSold { requested, sold } => format!(
                "Cannot set quantity to {}: {} tickets already sold",
                requested, sold
            ),
            AppError::UpstreamError(_) => "An upstream service failed".to_string(),
        };

        // Do not expose internal details in the API response
        let details = None;

        error_response(code, public_message, details, status)
    }
}
