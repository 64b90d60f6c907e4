use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    /// The runtime answered, but with an error.
    #[error("{0}")]
    Upstream(String),
    /// The runtime could not be reached or its reply could not be read.
    #[error("{0}")]
    Transport(String),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Upstream(_) | ServiceError::Transport(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Prefixes the message, keeping the variant.
    pub fn context(self, prefix: &str) -> Self {
        match self {
            ServiceError::Validation(msg) => ServiceError::Validation(format!("{prefix}: {msg}")),
            ServiceError::Upstream(msg) => ServiceError::Upstream(format!("{prefix}: {msg}")),
            ServiceError::Transport(msg) => ServiceError::Transport(format!("{prefix}: {msg}")),
        }
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::Validation(rejection.body_text())
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Transport(format!("malformed runtime reply: {err}"))
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "detail": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}
