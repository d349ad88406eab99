use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

/// Error taxonomy for the whole API surface.
///
/// Every failure is scoped to a single request; nothing here is fatal to the
/// process. Database errors are logged and surfaced as opaque 500s.
#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "{}", _0)]
    Validation(String),

    #[display(fmt = "{}", _0)]
    Authentication(String),

    #[display(fmt = "{}", _0)]
    Authorization(String),

    #[display(fmt = "{}", _0)]
    NotFound(String),

    /// Illegal transition, e.g. re-approving a processed leave request.
    #[display(fmt = "{}", _0)]
    InvalidState(String),

    /// Double check-in, overlapping leave range, duplicate username.
    #[display(fmt = "{}", _0)]
    Conflict(String),

    /// Balance too low at apply or approval time.
    #[display(fmt = "{}", _0)]
    InsufficientBalance(String),

    #[display(fmt = "Internal Server Error")]
    Database(sqlx::Error),

    #[display(fmt = "Internal Server Error")]
    Internal(anyhow::Error),
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::Authentication(_) => "authentication",
            ApiError::Authorization(_) => "authorization",
            ApiError::NotFound(_) => "not_found",
            ApiError::InvalidState(_) => "invalid_state",
            ApiError::Conflict(_) => "conflict",
            ApiError::InsufficientBalance(_) => "insufficient_balance",
            ApiError::Database(_) | ApiError::Internal(_) => "internal",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Authorization(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidState(_) => StatusCode::CONFLICT,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InsufficientBalance(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Database(e) => tracing::error!(error = %e, "Database error"),
            ApiError::Internal(e) => tracing::error!(error = %e, "Internal error"),
            _ => {}
        }

        HttpResponse::build(self.status_code()).json(json!({
            "error": self.to_string(),
            "code": self.kind(),
        }))
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Database(e)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e)
    }
}
