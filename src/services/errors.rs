use crate::connectors::ConnectorError;
use crate::helpers::JsonResponse;
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;

/// Why a submitted answer set does not fit the effective form. Ids are block ids except in
/// `invalid_options`, which holds option ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub missing_blocks: Vec<i32>,
    pub invalid_options: Vec<i32>,
    pub oversized_fields: Vec<i32>,
    pub invalid_blocks: Vec<i32>,
}

impl ValidationError {
    pub fn is_empty(&self) -> bool {
        self.missing_blocks.is_empty()
            && self.invalid_options.is_empty()
            && self.oversized_fields.is_empty()
            && self.invalid_blocks.is_empty()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "missing blocks {:?}, invalid options {:?}, oversized fields {:?}, invalid blocks {:?}",
            self.missing_blocks, self.invalid_options, self.oversized_fields, self.invalid_blocks
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("answers do not match the form: {0}")]
    Validation(ValidationError),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("transaction failed: {0}")]
    Transaction(String),
    #[error(transparent)]
    Index(#[from] ConnectorError),
}

impl ResponseError for FormError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Transaction(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Index(err) => err.status_code(),
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::Validation(errors) => HttpResponse::build(self.status_code()).json(
                JsonResponse::build()
                    .set_item(errors.clone())
                    .ok("Validation error")
                    .into_inner(),
            ),
            Self::NotFound(_) => HttpResponse::build(self.status_code())
                .json(JsonResponse::<()>::build().ok(self.to_string()).into_inner()),
            Self::Conflict(_) => HttpResponse::build(self.status_code()).json(
                JsonResponse::<()>::build()
                    .ok("Concurrent publish, please retry")
                    .into_inner(),
            ),
            Self::Transaction(_) => HttpResponse::build(self.status_code())
                .json(JsonResponse::<()>::build().ok("Internal error").into_inner()),
            Self::Index(err) => err.error_response(),
        }
    }
}
