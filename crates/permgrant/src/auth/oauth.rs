//! OAuth2 client credentials grant (RFC 6749 section 4.4).
//!
//! The token is fetched once per invocation and never cached: the host runs
//! each job in a fresh process.

use base64::Engine;
use serde::{Deserialize, Serialize};

use super::AuthError;
use crate::http::{HttpRequest, HttpTransport};

/// Where the client credentials go in the token request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthStyle {
    /// HTTP Basic `Authorization` header.
    #[default]
    InHeader,
    /// `client_id` / `client_secret` form fields.
    InParams,
}

impl AuthStyle {
    /// Parse the `OAUTH2_CLIENT_CREDENTIALS_AUTH_STYLE` value.
    ///
    /// Anything other than `InParams` (case-insensitive) falls back to
    /// [`AuthStyle::InHeader`].
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("InParams") => Self::InParams,
            _ => Self::InHeader,
        }
    }
}

/// Settings for the client credentials grant.
#[derive(Clone)]
pub struct ClientCredentials {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: Option<String>,
    pub audience: Option<String>,
    pub auth_style: AuthStyle,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scope", &self.scope)
            .field("audience", &self.audience)
            .field("auth_style", &self.auth_style)
            .finish()
    }
}

/// Successful token endpoint response.
#[derive(Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    /// The access token. Optional so a missing field gets a clear error.
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default)]
    pub token_type: Option<String>,

    #[serde(default)]
    pub expires_in: Option<u64>,

    #[serde(default)]
    pub scope: Option<String>,

    /// Salesforce returns the org's instance URL alongside the token.
    #[serde(default)]
    pub instance_url: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .field("instance_url", &self.instance_url)
            .finish()
    }
}

/// Error response from the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Encode key/value pairs as `application/x-www-form-urlencoded`.
pub(crate) fn form_encode(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// `Basic base64(user:password)`.
pub(crate) fn basic_credentials(username: &str, password: &str) -> String {
    let encoded =
        base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {encoded}")
}

/// Build the token request for `creds`.
pub fn build_token_request(creds: &ClientCredentials) -> HttpRequest {
    let mut form: Vec<(&str, &str)> = vec![("grant_type", "client_credentials")];
    if let Some(scope) = creds.scope.as_deref().filter(|s| !s.is_empty()) {
        form.push(("scope", scope));
    }
    if let Some(audience) = creds.audience.as_deref().filter(|s| !s.is_empty()) {
        form.push(("audience", audience));
    }
    if creds.auth_style == AuthStyle::InParams {
        form.push(("client_id", creds.client_id.as_str()));
        form.push(("client_secret", creds.client_secret.as_str()));
    }

    let mut request = HttpRequest::post(&creds.token_url, form_encode(&form))
        .header("Content-Type", "application/x-www-form-urlencoded")
        .header("Accept", "application/json");

    if creds.auth_style == AuthStyle::InHeader {
        request = request.header(
            "Authorization",
            basic_credentials(&creds.client_id, &creds.client_secret),
        );
    }

    request
}

/// Exchange client credentials for an access token.
pub async fn fetch_client_credentials_token(
    transport: &dyn HttpTransport,
    creds: &ClientCredentials,
) -> Result<TokenResponse, AuthError> {
    tracing::debug!(
        "Requesting OAuth2 client credentials token from {} ({:?})",
        creds.token_url,
        creds.auth_style
    );

    let response = transport.send(build_token_request(creds)).await?;
    let text = response.text();

    if !response.is_success() {
        let message = match serde_json::from_str::<TokenErrorResponse>(&text) {
            Ok(err) => err.error_description.unwrap_or(err.error),
            Err(_) => text,
        };
        return Err(AuthError::TokenRequest {
            status: response.status,
            message,
        });
    }

    let token = serde_json::from_str::<TokenResponse>(&text)
        .map_err(|e| AuthError::Parse(format!("Failed to parse token response: {}", e)))?;

    match token.access_token.as_deref() {
        Some(t) if !t.is_empty() => Ok(token),
        _ => Err(AuthError::MissingAccessToken),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpMethod, MockTransport};

    const TOKEN_URL: &str = "https://login.salesforce.com/services/oauth2/token";

    fn creds(auth_style: AuthStyle) -> ClientCredentials {
        ClientCredentials {
            token_url: TOKEN_URL.to_string(),
            client_id: "client-id".to_string(),
            client_secret: "s3cret".to_string(),
            scope: Some("api refresh_token".to_string()),
            audience: None,
            auth_style,
        }
    }

    #[test]
    fn auth_style_parse() {
        assert_eq!(AuthStyle::parse(Some("InParams")), AuthStyle::InParams);
        assert_eq!(AuthStyle::parse(Some("inparams")), AuthStyle::InParams);
        assert_eq!(AuthStyle::parse(Some("InHeader")), AuthStyle::InHeader);
        assert_eq!(AuthStyle::parse(Some("AutoDetect")), AuthStyle::InHeader);
        assert_eq!(AuthStyle::parse(None), AuthStyle::InHeader);
    }

    #[test]
    fn form_encode_escapes_values() {
        assert_eq!(
            form_encode(&[("grant_type", "client_credentials"), ("scope", "a b&c")]),
            "grant_type=client_credentials&scope=a%20b%26c"
        );
    }

    #[test]
    fn basic_credentials_encodes_user_and_password() {
        // base64("user:pass")
        assert_eq!(basic_credentials("user", "pass"), "Basic dXNlcjpwYXNz");
    }

    #[test]
    fn token_request_in_header_uses_basic_auth() {
        let request = build_token_request(&creds(AuthStyle::InHeader));
        let body = String::from_utf8(request.body.clone()).unwrap();

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, TOKEN_URL);
        assert_eq!(
            request.header_value("authorization"),
            Some(basic_credentials("client-id", "s3cret").as_str())
        );
        assert!(body.contains("grant_type=client_credentials"));
        assert!(body.contains("scope=api%20refresh_token"));
        assert!(!body.contains("client_secret"));
    }

    #[test]
    fn token_request_in_params_puts_credentials_in_body() {
        let mut c = creds(AuthStyle::InParams);
        c.audience = Some("https://acme.my.salesforce.com".into());
        let request = build_token_request(&c);
        let body = String::from_utf8(request.body.clone()).unwrap();

        assert_eq!(request.header_value("authorization"), None);
        assert!(body.contains("client_id=client-id"));
        assert!(body.contains("client_secret=s3cret"));
        assert!(body.contains("audience=https%3A%2F%2Facme.my.salesforce.com"));
    }

    #[tokio::test]
    async fn fetch_returns_access_token() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Post,
            TOKEN_URL,
            200,
            serde_json::json!({
                "access_token": "00Dxx!token",
                "token_type": "Bearer",
                "instance_url": "https://acme.my.salesforce.com"
            }),
        );

        let token = fetch_client_credentials_token(&transport, &creds(AuthStyle::InHeader))
            .await
            .unwrap();
        assert_eq!(token.access_token.as_deref(), Some("00Dxx!token"));
        assert_eq!(
            token.instance_url.as_deref(),
            Some("https://acme.my.salesforce.com")
        );
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn fetch_maps_oauth_error_document() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Post,
            TOKEN_URL,
            400,
            serde_json::json!({
                "error": "invalid_client_id",
                "error_description": "client identifier invalid"
            }),
        );

        let err = fetch_client_credentials_token(&transport, &creds(AuthStyle::InHeader))
            .await
            .unwrap_err();
        match err {
            AuthError::TokenRequest { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "client identifier invalid");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_keeps_raw_body_for_non_json_errors() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Post,
            TOKEN_URL,
            crate::http::HttpResponse {
                status: 503,
                headers: Vec::new(),
                body: b"Service Unavailable".to_vec(),
            },
        );

        let err = fetch_client_credentials_token(&transport, &creds(AuthStyle::InHeader))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "OAuth2 token request failed with status 503: Service Unavailable"
        );
    }

    #[tokio::test]
    async fn fetch_requires_access_token_field() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Post,
            TOKEN_URL,
            200,
            serde_json::json!({ "token_type": "Bearer" }),
        );

        let err = fetch_client_credentials_token(&transport, &creds(AuthStyle::InHeader))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingAccessToken));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let debug = format!("{:?}", creds(AuthStyle::InHeader));
        assert!(!debug.contains("s3cret"));

        let token = TokenResponse {
            access_token: Some("very-secret".into()),
            token_type: Some("Bearer".into()),
            expires_in: None,
            scope: None,
            instance_url: None,
        };
        let debug = format!("{token:?}");
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
