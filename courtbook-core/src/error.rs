//! Error kinds for a booking run.
//!
//! Every failure is terminal for the run. `BookingError::kind` gives callers a
//! stable discriminant to report or assert on without matching message text.

use serde::Serialize;
use thiserror::Error;

use crate::wizard::Step;

/// Failure reported by a [`crate::page::BookingPage`] implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PageError {
    /// The queried element does not exist (or no longer exists).
    #[error("element not found: {0}")]
    NotFound(String),

    /// The page did not answer within the transport's own deadline.
    #[error("page timeout: {0}")]
    Timeout(String),

    /// The page is mid-render or a node went stale; asking again may succeed.
    #[error("transient page error: {0}")]
    Transient(String),

    /// The session is unusable (closed socket, crashed tab).
    #[error("fatal page error: {0}")]
    Fatal(String),
}

impl PageError {
    pub fn is_transient(&self) -> bool {
        matches!(self, PageError::Transient(_))
    }
}

/// Stable error discriminant, serialized into the failure report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    InvalidTrigger,
    ConfigurationError,
    ElementNotFound,
    StepTimeout,
    SubmissionError,
    InvalidTransition,
    Browser,
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("invalid trigger '{key}': {reason}")]
    InvalidTrigger { key: String, reason: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{step}: element not found: {detail}")]
    ElementNotFound { step: Step, detail: String },

    #[error("{step}: timed out: {detail}")]
    StepTimeout { step: Step, detail: String },

    #[error("submission failed: {0}")]
    Submission(String),

    #[error("{step} is not allowed from wizard state {state}")]
    InvalidTransition { step: Step, state: String },

    #[error("browser error: {0}")]
    Browser(String),
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::InvalidTrigger { .. } => ErrorKind::InvalidTrigger,
            BookingError::Configuration(_) => ErrorKind::ConfigurationError,
            BookingError::ElementNotFound { .. } => ErrorKind::ElementNotFound,
            BookingError::StepTimeout { .. } => ErrorKind::StepTimeout,
            BookingError::Submission(_) => ErrorKind::SubmissionError,
            BookingError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            BookingError::Browser(_) => ErrorKind::Browser,
        }
    }

    pub fn invalid_trigger(key: impl Into<String>, reason: impl Into<String>) -> Self {
        BookingError::InvalidTrigger {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Map a page failure observed while executing `step`.
    ///
    /// Submission-step failures always surface as `SubmissionError`.
    pub fn from_page(step: Step, err: PageError) -> Self {
        if step == Step::Submit {
            return BookingError::Submission(err.to_string());
        }
        match err {
            PageError::NotFound(detail) => BookingError::ElementNotFound { step, detail },
            PageError::Timeout(detail) => BookingError::StepTimeout { step, detail },
            PageError::Transient(detail) | PageError::Fatal(detail) => {
                BookingError::Browser(format!("{step}: {detail}"))
            }
        }
    }
}

/// Structured failure record handed to the outer reporter.
#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    pub kind: ErrorKind,
    pub detail: String,
}

impl From<&BookingError> for FailureReport {
    fn from(err: &BookingError) -> Self {
        Self {
            kind: err.kind(),
            detail: err.to_string(),
        }
    }
}
