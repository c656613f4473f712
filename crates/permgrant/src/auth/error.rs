//! Errors raised while choosing or building the Authorization header.

use thiserror::Error;

use crate::http::HttpError;

/// Errors that can occur while authenticating against Salesforce.
#[derive(Debug, Error)]
pub enum AuthError {
    /// None of the supported credentials are present.
    #[error(
        "No authentication configured. Provide BEARER_AUTH_TOKEN, BASIC_USERNAME and \
         BASIC_PASSWORD, OAUTH2_CLIENT_CREDENTIALS_CLIENT_SECRET, or \
         OAUTH2_AUTHORIZATION_CODE_ACCESS_TOKEN"
    )]
    NotConfigured,

    /// A scheme was selected but its companion settings are missing.
    #[error("OAuth configuration error: {0}")]
    Configuration(String),

    /// HTTP request to the token endpoint failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] HttpError),

    /// The token endpoint answered with a non-success status.
    #[error("OAuth2 token request failed with status {status}: {message}")]
    TokenRequest { status: u16, message: String },

    /// The token endpoint answered 2xx but without a token.
    #[error("No access_token in OAuth2 response")]
    MissingAccessToken,

    /// Failed to parse the token endpoint's response.
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl AuthError {
    /// HTTP status returned by the token endpoint, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::TokenRequest { status, .. } => Some(*status),
            _ => None,
        }
    }
}
