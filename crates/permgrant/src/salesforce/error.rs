//! Error types for Salesforce REST operations.

use thiserror::Error;

use crate::http::HttpError;

/// Errors that can occur when calling the Salesforce REST API.
#[derive(Debug, Error)]
pub enum SalesforceError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The SOQL lookup matched no user.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// API returned an error response.
    #[error("{operation} failed with status {status}: {message}")]
    Api {
        operation: &'static str,
        status: u16,
        message: String,
    },
}

impl SalesforceError {
    /// HTTP status from an API error response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::UserNotFound(_) => Some(404),
            _ => None,
        }
    }
}

/// Get a short error message suitable for display.
pub fn short_error_message(err: &SalesforceError) -> String {
    match err {
        SalesforceError::Http(_) => "Network error".to_string(),
        SalesforceError::Json(_) => "JSON parse error".to_string(),
        SalesforceError::UserNotFound(user) => format!("User not found: {}", user),
        SalesforceError::Api {
            status, message, ..
        } => {
            if message.chars().count() > 50 {
                let truncated: String = message.chars().take(47).collect();
                format!("HTTP {}: {}...", status, truncated)
            } else {
                format!("HTTP {}: {}", status, message)
            }
        }
    }
}
