//! Inputs delivered by the host job framework.
//!
//! The host hands every entry point a JSON params object plus a context with
//! two maps: non-secret `environment` values and `secrets`. Keys use the
//! host's `SCREAMING_SNAKE_CASE` convention, e.g.:
//!
//! ```json
//! {
//!   "environment": { "ADDRESS": "https://acme.my.salesforce.com" },
//!   "secrets": { "BEARER_AUTH_TOKEN": "00D..." }
//! }
//! ```

use serde::{Deserialize, Serialize};

/// Everything the host passes alongside the params.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct JobContext {
    pub environment: Environment,
    pub secrets: Secrets,
}

impl JobContext {
    /// Resolve the Salesforce instance URL.
    ///
    /// An explicit `address` param wins over the `ADDRESS` environment value.
    /// Trailing slashes are stripped. Returns `None` when neither is set.
    pub fn base_url(&self, address: Option<&str>) -> Option<String> {
        address
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .or_else(|| non_empty(&self.environment.address))
            .map(|a| a.trim_end_matches('/').to_string())
    }
}

/// Non-secret configuration values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Environment {
    pub address: Option<String>,
    pub oauth2_client_credentials_token_url: Option<String>,
    pub oauth2_client_credentials_client_id: Option<String>,
    pub oauth2_client_credentials_scope: Option<String>,
    pub oauth2_client_credentials_audience: Option<String>,
    pub oauth2_client_credentials_auth_style: Option<String>,
}

/// Secret values. `Debug` never prints them.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Secrets {
    pub bearer_auth_token: Option<String>,
    pub basic_username: Option<String>,
    pub basic_password: Option<String>,
    pub oauth2_client_credentials_client_secret: Option<String>,
    pub oauth2_authorization_code_access_token: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn redact(value: &Option<String>) -> Option<&'static str> {
            value.as_ref().map(|_| "[REDACTED]")
        }

        f.debug_struct("Secrets")
            .field("bearer_auth_token", &redact(&self.bearer_auth_token))
            .field("basic_username", &self.basic_username)
            .field("basic_password", &redact(&self.basic_password))
            .field(
                "oauth2_client_credentials_client_secret",
                &redact(&self.oauth2_client_credentials_client_secret),
            )
            .field(
                "oauth2_authorization_code_access_token",
                &redact(&self.oauth2_authorization_code_access_token),
            )
            .finish()
    }
}

/// Params for [`invoke`](crate::action::JobAction::invoke).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssignParams {
    /// Salesforce username, e.g. `jane@acme.com`.
    pub username: String,
    /// Id of the permission set to grant (`0PS...`).
    pub permission_set_id: String,
    /// Overrides the `ADDRESS` environment value.
    pub address: Option<String>,
    /// REST API version, e.g. `v61.0`.
    pub api_version: Option<String>,
}

/// Params for the `error` entry point.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ErrorParams {
    pub error: ErrorInfo,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ErrorInfo {
    pub message: String,
}

/// Params for the `halt` entry point.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HaltParams {
    pub username: Option<String>,
    pub reason: Option<String>,
}

/// Treat `Some("")` the same as `None`.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
