use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use std::fmt;

/// Errors that can occur while talking to the answer index
#[derive(Debug)]
pub enum ConnectorError {
    /// Index unreachable or timeout
    ServiceUnavailable(String),
    /// Index answered with rows we cannot interpret
    InvalidResponse(String),
    /// Internal error in connector
    Internal(String),
}

impl fmt::Display for ConnectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            Self::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ConnectorError {}

impl ResponseError for ConnectorError {
    fn error_response(&self) -> HttpResponse {
        let (status, message) = match self {
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "Service unavailable"),
            Self::InvalidResponse(_) => (StatusCode::BAD_GATEWAY, "Invalid answer index response"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
        };

        HttpResponse::build(status).json(json!({
            "message": message,
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ConnectorError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::ServiceUnavailable(err.to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                Self::InvalidResponse(err.to_string())
            }
            err => Self::Internal(err.to_string()),
        }
    }
}
