use blog_core::ValidationErrors;
use reqwest::{Response, StatusCode};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlogClientError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("authentication required")]
    Unauthorized,
    #[error("{message}")]
    Http { status: u16, message: String },
    #[error("not found")]
    NotFound,
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Failed to upload image: {0}")]
    Upload(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BlogClientError {
    /// Builds the error for a non-success response, preferring the server's
    /// own message over a generic one.
    pub async fn from_http_response(resp: Response) -> Self {
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return BlogClientError::NotFound;
        }

        let message = resp
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| remote_message(&body))
            .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));

        BlogClientError::Http {
            status: status.as_u16(),
            message,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            BlogClientError::Http { status, .. } => Some(*status),
            BlogClientError::NotFound => Some(404),
            BlogClientError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BlogClientError::NotFound)
    }
}

impl From<ValidationErrors> for BlogClientError {
    fn from(errors: ValidationErrors) -> Self {
        BlogClientError::Validation(errors)
    }
}

fn remote_message(body: &Value) -> Option<String> {
    ["message", "status"]
        .iter()
        .filter_map(|key| body.get(*key).and_then(Value::as_str))
        .find(|msg| !msg.trim().is_empty())
        .map(str::to_owned)
}
