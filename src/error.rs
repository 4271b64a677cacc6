//! Error model for the session subsystem.
//! `RequestError` is what every call through the executor returns; `StoreError`
//! covers the durable session store.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("session store serialize: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum RequestError {
    /// Transport failure (connection refused, timeout, broken body stream).
    #[error("network error: {0}")]
    Network(String),
    /// Well-formed non-2xx response from the backend.
    #[error("http {status}: {message}")]
    Http { status: u16, message: String },
    /// Response body did not match the expected payload shape.
    #[error("parse error: {0}")]
    Parse(String),
    /// Token renewal failed; the session store has already been cleared.
    #[error("session expired: {message}")]
    SessionExpired { message: String },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("config error: {0}")]
    Config(String),
}

impl RequestError {
    pub fn code_str(&self) -> &'static str {
        match self {
            RequestError::Network(_) => "network_error",
            RequestError::Http { .. } => "http_error",
            RequestError::Parse(_) => "parse_error",
            RequestError::SessionExpired { .. } => "session_expired",
            RequestError::Store(_) => "store_error",
            RequestError::Config(_) => "config_error",
        }
    }

    /// Human-readable message suitable for display next to a form.
    pub fn message(&self) -> String {
        match self {
            RequestError::Network(m) | RequestError::Parse(m) | RequestError::Config(m) => m.clone(),
            RequestError::Http { message, .. } | RequestError::SessionExpired { message } => message.clone(),
            RequestError::Store(e) => e.to_string(),
        }
    }

    /// Status code when the error came from a completed HTTP exchange.
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Http { status, .. } => Some(*status),
            RequestError::SessionExpired { .. } => Some(401),
            _ => None,
        }
    }

    /// True when the caller should treat the user as logged out.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, RequestError::SessionExpired { .. } | RequestError::Http { status: 401, .. })
    }

    pub fn http(status: u16, body: &[u8]) -> Self {
        RequestError::Http { status, message: extract_error_message(status, body) }
    }
}

pub type RequestResult<T> = Result<T, RequestError>;

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        RequestError::Network(err.to_string())
    }
}

/// Pull the display message out of an error body.
///
/// The backend reports errors as `{"detail": "..."}` or, for validation
/// failures, `{"detail": [{"msg": "..."}, ...]}`. Anything else falls back to
/// a generic message naming the status.
pub fn extract_error_message(status: u16, body: &[u8]) -> String {
    let fallback = || format!("request failed with status {}", status);
    let Ok(v) = serde_json::from_slice::<Value>(body) else { return fallback(); };
    match v.get("detail") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .first()
            .and_then(|first| first.get("msg"))
            .and_then(|m| m.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(fallback),
        _ => fallback(),
    }
}
