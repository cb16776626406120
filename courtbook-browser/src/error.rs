//! CDP error types.

use courtbook_core::{BookingError, PageError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CdpError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Nothing answering on the debugging endpoint.
    #[error("chrome not available at {0}")]
    ChromeNotAvailable(String),

    #[error("chrome executable not found; set [browser].chrome_path")]
    ChromeNotFound,

    #[error("failed to launch chrome: {0}")]
    LaunchFailed(String),

    #[error("websocket error: {0}")]
    WebSocket(String),

    #[error("cdp error: {message} (code: {code})")]
    Protocol { code: i64, message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(String),

    #[error("navigation failed: {0}")]
    NavigationFailed(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("javascript error: {0}")]
    JavaScript(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("session closed")]
    SessionClosed,

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        CdpError::WebSocket(e.to_string())
    }
}

impl From<reqwest::Error> for CdpError {
    fn from(e: reqwest::Error) -> Self {
        CdpError::Http(e.to_string())
    }
}

impl From<url::ParseError> for CdpError {
    fn from(e: url::ParseError) -> Self {
        CdpError::ConnectionFailed(format!("invalid url: {e}"))
    }
}

/// Page-level view of a transport failure.
///
/// Script and protocol errors usually mean the document was swapped out
/// under us mid-render, so waits keep polling through them.
impl From<CdpError> for PageError {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::ElementNotFound(msg) => PageError::NotFound(msg),
            CdpError::Timeout(msg) => PageError::Timeout(msg),
            CdpError::Protocol { .. } | CdpError::JavaScript(_) | CdpError::InvalidResponse(_) => {
                PageError::Transient(e.to_string())
            }
            other => PageError::Fatal(other.to_string()),
        }
    }
}

impl From<CdpError> for BookingError {
    fn from(e: CdpError) -> Self {
        BookingError::Browser(e.to_string())
    }
}
