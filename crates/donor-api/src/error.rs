//! Error types for donor-api.

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when talking to the DonorConnect backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// A 2xx response whose body is missing something required.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status of the failed response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The message to show a user: the server's own text when there is one.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            ApiError::Http(e) if e.is_timeout() => "The server took too long to respond".to_string(),
            ApiError::Http(e) if e.is_connect() => "Could not reach the server".to_string(),
            other => other.to_string(),
        }
    }
}

/// Generic message used when a failed response carries no readable error.
pub fn fallback_message(status: u16) -> String {
    match status {
        400 => "The request was rejected".to_string(),
        401 => "Authentication required".to_string(),
        403 => "Not allowed".to_string(),
        404 => "Not found".to_string(),
        409 => "Conflict with existing data".to_string(),
        s if s >= 500 => "Server error, please try again later".to_string(),
        s => format!("Request failed with status {}", s),
    }
}

/// Pull the first human-readable error out of a failed response body.
///
/// Tried in order: an `errors` array (of strings or `{message}` objects), an
/// `errors` map of field to messages (ASP.NET problem details), `message`,
/// `error`, `title`, then the raw body if it is short plain text.
pub fn extract_server_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return (body.len() <= 500 && !body.starts_with('<')).then(|| body.to_string());
    };

    if let Some(message) = value.get("errors").and_then(first_error) {
        return Some(message);
    }

    for key in ["message", "error", "title", "detail"] {
        match value.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.trim().to_string()),
            Some(Value::Object(obj)) => {
                if let Some(Value::String(s)) = obj.get("message") {
                    return Some(s.trim().to_string());
                }
            }
            _ => {}
        }
    }

    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Array(items) => items.iter().find_map(error_text),
        _ => None,
    }
}

fn first_error(errors: &Value) -> Option<String> {
    match errors {
        Value::Array(items) => items.iter().find_map(error_text),
        Value::Object(fields) => fields.values().find_map(|v| match v {
            Value::Array(items) => items.iter().find_map(error_text),
            other => error_text(other),
        }),
        other => error_text(other),
    }
}

fn error_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(obj) => ["message", "description", "errorMessage"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_str))
            .map(|s| s.trim().to_string()),
        _ => None,
    }
}
