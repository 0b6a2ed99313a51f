use serde_json::Value;
use thiserror::Error;

/// The single error shape every service call normalizes to. Views and tools present these; the service layer only
/// ever re-raises them.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("The server rejected the request. Error {status}. {message}")]
    Rejection { status: u16, message: String },
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Client state error: {0}")]
    State(String),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Auth(_))
    }
}

/// Pulls the human-readable message out of a FastAPI-style error body, `{"detail": "..."}`. Anything else is
/// returned verbatim, or replaced with a generic line when the body is empty.
pub fn message_from_body(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(detail) = value["detail"].as_str() {
            return detail.to_string();
        }
    }
    let body = body.trim();
    if body.is_empty() {
        format!("The server gave no reason (HTTP {status})")
    } else {
        body.to_string()
    }
}
