//! Error types for twintrader

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Network Errors ===
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Operation timeout: {0}")]
    Timeout(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Rejected by {addr}: HTTP {status}: {body}")]
    Rejected {
        addr: String,
        status: u16,
        body: String,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Config Errors ===
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Generic ===
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Is this a retryable error?
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Timeout(_) | Error::ConnectionFailed(_) | Error::Transport(_)
        )
    }

    /// The remote end could not be reached at all.
    pub fn is_connect_failure(&self) -> bool {
        matches!(self, Error::ConnectionFailed(_))
    }

    /// Convert to HTTP status code
    pub fn to_http_status(&self) -> StatusCode {
        match self {
            Error::InvalidConfig(_) | Error::InvalidRequest(_) | Error::Json(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            Error::ConnectionFailed(_) | Error::Transport(_) | Error::Rejected { .. } => {
                StatusCode::BAD_GATEWAY
            }
            Error::Internal(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Classify a client-side HTTP error for the given remote address.
    pub fn from_reqwest(addr: &str, e: reqwest::Error) -> Self {
        if e.is_connect() {
            Error::ConnectionFailed(format!("{}: {}", addr, e))
        } else if e.is_timeout() {
            Error::Timeout(format!("{}: {}", addr, e))
        } else {
            Error::Transport(format!("{}: {}", addr, e))
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.to_http_status();
        (status, axum::Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Other(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(Error::ConnectionFailed("x".into()).is_retryable());
        assert!(Error::Timeout("x".into()).is_retryable());
        assert!(!Error::InvalidConfig("x".into()).is_retryable());
        assert!(Error::ConnectionFailed("x".into()).is_connect_failure());
        assert!(!Error::Timeout("x".into()).is_connect_failure());
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(
            Error::InvalidConfig("bad".into()).to_http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::Internal("gone".into()).to_http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        let rejected = Error::Rejected {
            addr: "127.0.0.1:1".into(),
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(rejected.to_http_status(), StatusCode::BAD_GATEWAY);
        assert!(rejected.to_string().contains("HTTP 500"));
    }
}
