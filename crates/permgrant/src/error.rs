//! Errors surfaced by the action entry points, and the string-based
//! classification the host's error hook relies on.

use thiserror::Error;

use crate::auth::AuthError;
use crate::http::HttpError;
use crate::salesforce::SalesforceError;

/// Status codes the host should retry.
pub const RETRYABLE_STATUS_MARKERS: [&str; 4] = ["429", "502", "503", "504"];

/// Status codes that mean the credentials are wrong.
pub const FATAL_STATUS_MARKERS: [&str; 2] = ["401", "403"];

/// Errors returned by [`JobAction`](crate::action::JobAction) entry points.
#[derive(Debug, Error)]
pub enum ActionError {
    /// A required param is missing or blank.
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// Neither the params nor the environment name the instance URL.
    #[error("No URL specified. Provide either the address parameter or the ADDRESS environment variable")]
    MissingAddress,

    /// The HTTP transport could not be built.
    #[error("Transport setup failed: {0}")]
    Transport(#[from] HttpError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Salesforce(#[from] SalesforceError),

    /// The error hook saw an authentication/authorization failure.
    #[error("Fatal error, not retrying: {0}")]
    Fatal(String),

    /// The error hook saw an error it cannot recover from.
    #[error("Unrecoverable error: {0}")]
    Unrecoverable(String),
}

impl ActionError {
    /// HTTP status behind this error, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth(e) => e.status(),
            Self::Salesforce(e) => e.status(),
            _ => None,
        }
    }

    /// Whether the host's error hook would ask for a retry.
    pub fn is_retryable(&self) -> bool {
        ErrorClass::of(&self.to_string()) == ErrorClass::Retryable
    }
}

/// How the error hook treats an error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Rate limited or upstream unavailable; ask the host to retry.
    Retryable,
    /// Credentials rejected; retrying cannot help.
    Fatal,
    /// Anything else; rethrown to the host as-is.
    Unrecoverable,
}

impl ErrorClass {
    /// Classify by looking for status codes in the message text.
    ///
    /// Retryable markers are checked before fatal ones.
    pub fn of(message: &str) -> Self {
        if RETRYABLE_STATUS_MARKERS.iter().any(|m| message.contains(m)) {
            Self::Retryable
        } else if FATAL_STATUS_MARKERS.iter().any(|m| message.contains(m)) {
            Self::Fatal
        } else {
            Self::Unrecoverable
        }
    }
}
