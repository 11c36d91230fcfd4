use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use blog_core::{CategoryId, PostId, ValidationErrors};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("user already exists: {0}")]
    UserAlreadyExists(String),
    #[error("post not found: {0}")]
    PostNotFound(PostId),
    #[error("category not found: {0}")]
    CategoryNotFound(CategoryId),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("validation failed")]
    Validation(ValidationErrors),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        DomainError::Unauthorized(message.into())
    }
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        DomainError::Validation(errors)
    }
}

/// Error envelope shared by every endpoint: `{"status": "<message>"}`.
#[derive(Serialize)]
struct ErrorBody<'a> {
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a ValidationErrors>,
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            DomainError::PostNotFound(_)
            | DomainError::CategoryNotFound(_)
            | DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DomainError::Validation(_) | DomainError::BadRequest(_) => StatusCode::BAD_REQUEST,
            DomainError::UserAlreadyExists(_) | DomainError::Conflict(_) => StatusCode::CONFLICT,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = self.to_string();
        let errors = match self {
            DomainError::Validation(errors) => Some(errors),
            _ => None,
        };
        HttpResponse::build(self.status_code()).json(ErrorBody {
            status: message.as_str(),
            errors,
        })
    }
}
