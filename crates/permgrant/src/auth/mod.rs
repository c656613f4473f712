//! Authorization scheme selection.
//!
//! Exactly one scheme is used per invocation, chosen by which secrets are
//! present. The ladder is checked top to bottom and the first match wins:
//!
//! | # | Scheme                       | Requires                                                        |
//! |---|------------------------------|-----------------------------------------------------------------|
//! | 1 | Bearer token                 | `BEARER_AUTH_TOKEN`                                             |
//! | 2 | Basic                        | `BASIC_USERNAME` and `BASIC_PASSWORD`                           |
//! | 3 | OAuth2 client credentials    | `OAUTH2_CLIENT_CREDENTIALS_CLIENT_SECRET` (+ token URL, client id) |
//! | 4 | OAuth2 authorization code    | `OAUTH2_AUTHORIZATION_CODE_ACCESS_TOKEN`                        |
//!
//! # Example
//!
//! ```ignore
//! use permgrant::auth::AuthScheme;
//!
//! let scheme = AuthScheme::select(&ctx)?;
//! let header = scheme.authorization_header(transport.as_ref()).await?;
//! ```

mod error;
pub mod oauth;

pub use error::AuthError;
pub use oauth::{AuthStyle, ClientCredentials, TokenResponse, fetch_client_credentials_token};

use crate::context::{JobContext, non_empty};
use crate::http::HttpTransport;

/// The authorization scheme chosen for a run.
#[derive(Clone)]
pub enum AuthScheme {
    Bearer(String),
    Basic { username: String, password: String },
    ClientCredentials(ClientCredentials),
    AuthorizationCode(String),
}

impl AuthScheme {
    /// Pick a scheme from the context. Performs no I/O.
    pub fn select(ctx: &JobContext) -> Result<Self, AuthError> {
        let env = &ctx.environment;
        let secrets = &ctx.secrets;

        if let Some(token) = non_empty(&secrets.bearer_auth_token) {
            return Ok(Self::Bearer(token.to_string()));
        }

        if let (Some(username), Some(password)) = (
            non_empty(&secrets.basic_username),
            non_empty(&secrets.basic_password),
        ) {
            return Ok(Self::Basic {
                username: username.to_string(),
                password: password.to_string(),
            });
        }

        if let Some(client_secret) = non_empty(&secrets.oauth2_client_credentials_client_secret) {
            let token_url = non_empty(&env.oauth2_client_credentials_token_url);
            let client_id = non_empty(&env.oauth2_client_credentials_client_id);
            let (Some(token_url), Some(client_id)) = (token_url, client_id) else {
                return Err(AuthError::Configuration(
                    "OAuth2 client credentials flow requires \
                     OAUTH2_CLIENT_CREDENTIALS_TOKEN_URL and \
                     OAUTH2_CLIENT_CREDENTIALS_CLIENT_ID in the environment"
                        .to_string(),
                ));
            };

            return Ok(Self::ClientCredentials(ClientCredentials {
                token_url: token_url.to_string(),
                client_id: client_id.to_string(),
                client_secret: client_secret.to_string(),
                scope: non_empty(&env.oauth2_client_credentials_scope).map(String::from),
                audience: non_empty(&env.oauth2_client_credentials_audience).map(String::from),
                auth_style: AuthStyle::parse(non_empty(&env.oauth2_client_credentials_auth_style)),
            }));
        }

        if let Some(token) = non_empty(&secrets.oauth2_authorization_code_access_token) {
            return Ok(Self::AuthorizationCode(token.to_string()));
        }

        Err(AuthError::NotConfigured)
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bearer(_) => "bearer",
            Self::Basic { .. } => "basic",
            Self::ClientCredentials(_) => "oauth2_client_credentials",
            Self::AuthorizationCode(_) => "oauth2_authorization_code",
        }
    }

    /// Build the `Authorization` header value.
    ///
    /// Only the client credentials scheme touches the network.
    pub async fn authorization_header(
        &self,
        transport: &dyn HttpTransport,
    ) -> Result<String, AuthError> {
        match self {
            Self::Bearer(token) | Self::AuthorizationCode(token) => Ok(bearer(token)),
            Self::Basic { username, password } => Ok(oauth::basic_credentials(username, password)),
            Self::ClientCredentials(creds) => {
                let token = fetch_client_credentials_token(transport, creds).await?;
                let access_token = token.access_token.ok_or(AuthError::MissingAccessToken)?;
                Ok(bearer(&access_token))
            }
        }
    }
}

impl std::fmt::Debug for AuthScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Bearer([REDACTED])"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            Self::ClientCredentials(creds) => {
                f.debug_tuple("ClientCredentials").field(creds).finish()
            }
            Self::AuthorizationCode(_) => f.write_str("AuthorizationCode([REDACTED])"),
        }
    }
}

/// Prefix with `Bearer ` unless the token already carries it.
fn bearer(token: &str) -> String {
    if token.starts_with("Bearer ") {
        token.to_string()
    } else {
        format!("Bearer {token}")
    }
}
