//! Configuration file support for permgrant.
//!
//! The CLI stands in for the host job framework, so configuration carries the
//! same `environment` and `secrets` maps the host would deliver. Sources, from
//! lowest to highest precedence:
//! 1. Built-in defaults
//! 2. XDG config file (~/.config/permgrant/config.toml)
//! 3. Local config file (./permgrant.toml)
//! 4. Environment variables prefixed with `PERMGRANT_`, using `__` between
//!    section and key (e.g. `PERMGRANT_SECRETS__BEARER_AUTH_TOKEN`)
//!
//! A `--context` JSON file replaces the `environment` / `secrets` maps entirely.
//!
//! Example config file:
//! ```toml
//! [environment]
//! address = "https://acme.my.salesforce.com"
//! oauth2_client_credentials_token_url = "https://acme.my.salesforce.com/services/oauth2/token"
//! oauth2_client_credentials_client_id = "3MVG9..."
//!
//! [secrets]
//! oauth2_client_credentials_client_secret = "..."  # or PERMGRANT_SECRETS__OAUTH2_CLIENT_CREDENTIALS_CLIENT_SECRET
//!
//! [http]
//! timeout_secs = 30
//!
//! [salesforce]
//! api_version = "v61.0"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{
    Config as ConfigBuilder, ConfigBuilder as Builder, ConfigError, Environment, File, FileFormat,
};
use directories::ProjectDirs;
use permgrant::JobContext;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Non-secret values, keyed like the host's environment map.
    pub environment: BTreeMap<String, String>,
    /// Secret values, keyed like the host's secrets map.
    pub secrets: BTreeMap<String, String>,
    /// HTTP client settings.
    pub http: HttpConfig,
    /// Salesforce API settings.
    pub salesforce: SalesforceConfig,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("environment", &self.environment)
            .field("secrets", &self.secrets.keys().collect::<Vec<_>>())
            .field("http", &self.http)
            .field("salesforce", &self.salesforce)
            .finish()
    }
}

/// HTTP client settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// Salesforce API settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SalesforceConfig {
    /// Default REST API version when `--api-version` is not given.
    pub api_version: Option<String>,
}

impl Config {
    /// Load configuration from the config file(s) and environment.
    ///
    /// Any invalid value is an error; nothing falls back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let local_config = PathBuf::from("permgrant.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./permgrant.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        Self::build(builder.add_source(env_source()))
    }

    fn build(builder: Builder<config::builder::DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize::<Config>()
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs.max(1))
    }

    /// Convert the `environment` / `secrets` maps into a [`JobContext`].
    ///
    /// Keys are matched case-insensitively against the host's
    /// `SCREAMING_SNAKE_CASE` names; unknown keys are ignored.
    pub fn job_context(&self) -> Result<JobContext, serde_json::Error> {
        fn upper(map: &BTreeMap<String, String>) -> serde_json::Map<String, serde_json::Value> {
            map.iter()
                .map(|(k, v)| (k.to_ascii_uppercase(), serde_json::Value::String(v.clone())))
                .collect()
        }

        serde_json::from_value(serde_json::json!({
            "environment": upper(&self.environment),
            "secrets": upper(&self.secrets),
        }))
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "permgrant").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// `PERMGRANT_*` variables, e.g. `PERMGRANT_ENVIRONMENT__ADDRESS` -> `environment.address`.
///
/// Values stay strings: secrets such as `0123` must reach the auth code as typed.
fn env_source() -> Environment {
    Environment::with_prefix("PERMGRANT")
        .prefix_separator("_")
        .separator("__")
}

/// Read a host-shaped context JSON file.
pub fn load_context_file(path: &Path) -> Result<JobContext, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read context file {}: {}", path.display(), e))?;
    let ctx = serde_json::from_str(&content)
        .map_err(|e| format!("Invalid context file {}: {}", path.display(), e))?;
    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml_content: &str) -> Config {
        Config::build(
            ConfigBuilder::builder()
                .add_source(config::File::from_str(toml_content, FileFormat::Toml)),
        )
        .unwrap()
    }

    fn from_env(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::build(ConfigBuilder::builder().add_source(env_source().source(Some(vars))))
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.environment.is_empty());
        assert!(config.secrets.is_empty());
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.salesforce.api_version.is_none());
    }

    #[test]
    fn test_config_from_toml_builds_job_context() {
        let config = from_toml(
            r#"
            [environment]
            address = "https://acme.my.salesforce.com"
            oauth2_client_credentials_auth_style = "InParams"

            [secrets]
            bearer_auth_token = "tok"

            [http]
            timeout_secs = 5

            [salesforce]
            api_version = "v60.0"
        "#,
        );

        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.salesforce.api_version.as_deref(), Some("v60.0"));

        let ctx = config.job_context().unwrap();
        assert_eq!(
            ctx.environment.address.as_deref(),
            Some("https://acme.my.salesforce.com")
        );
        assert_eq!(
            ctx.environment.oauth2_client_credentials_auth_style.as_deref(),
            Some("InParams")
        );
        assert_eq!(ctx.secrets.bearer_auth_token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = from_toml(
            r#"
            [secrets]
            basic_username = "svc"
        "#,
        );
        assert_eq!(config.http.timeout_secs, 30);
        assert!(config.environment.is_empty());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config = from_toml(
            r#"
            [environment]
            something_else = "x"
        "#,
        );
        let ctx = config.job_context().unwrap();
        assert!(ctx.environment.address.is_none());
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let config = from_toml("[http]\ntimeout_secs = 0\n");
        assert_eq!(config.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_debug_hides_secret_values() {
        let config = from_toml(
            r#"
            [secrets]
            basic_password = "hunter2"
        "#,
        );
        let debug = format!("{config:?}");
        assert!(debug.contains("basic_password"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_env_vars_build_job_context() {
        let config = from_env(&[
            ("PERMGRANT_ENVIRONMENT__ADDRESS", "https://acme.my.salesforce.com"),
            ("PERMGRANT_SECRETS__BEARER_AUTH_TOKEN", "tok"),
            ("PERMGRANT_HTTP__TIMEOUT_SECS", "12"),
            ("PERMGRANT_SALESFORCE__API_VERSION", "v60.0"),
            ("OTHER_SECRETS__BASIC_USERNAME", "ignored"),
        ])
        .unwrap();

        assert_eq!(config.timeout(), Duration::from_secs(12));
        assert_eq!(config.salesforce.api_version.as_deref(), Some("v60.0"));

        let ctx = config.job_context().unwrap();
        assert_eq!(
            ctx.environment.address.as_deref(),
            Some("https://acme.my.salesforce.com")
        );
        assert_eq!(ctx.secrets.bearer_auth_token.as_deref(), Some("tok"));
        assert!(ctx.secrets.basic_username.is_none());
    }

    #[test]
    fn test_env_secrets_are_kept_verbatim() {
        let config = from_env(&[
            ("PERMGRANT_SECRETS__BASIC_USERNAME", "svc"),
            ("PERMGRANT_SECRETS__BASIC_PASSWORD", "0123"),
            ("PERMGRANT_SECRETS__BEARER_AUTH_TOKEN", "1.50"),
            ("PERMGRANT_SECRETS__OAUTH2_AUTHORIZATION_CODE_ACCESS_TOKEN", "TRUE"),
        ])
        .unwrap();

        let ctx = config.job_context().unwrap();
        assert_eq!(ctx.secrets.basic_password.as_deref(), Some("0123"));
        assert_eq!(ctx.secrets.bearer_auth_token.as_deref(), Some("1.50"));
        assert_eq!(
            ctx.secrets.oauth2_authorization_code_access_token.as_deref(),
            Some("TRUE")
        );
    }

    #[test]
    fn test_env_overrides_file() {
        let config = Config::build(
            ConfigBuilder::builder()
                .add_source(File::from_str(
                    "[secrets]\nbearer_auth_token = \"from-file\"\n",
                    FileFormat::Toml,
                ))
                .add_source(env_source().source(Some(
                    [(
                        "PERMGRANT_SECRETS__BEARER_AUTH_TOKEN".to_string(),
                        "from-env".to_string(),
                    )]
                    .into_iter()
                    .collect(),
                ))),
        )
        .unwrap();

        let ctx = config.job_context().unwrap();
        assert_eq!(ctx.secrets.bearer_auth_token.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_invalid_value_is_an_error() {
        let result = Config::build(ConfigBuilder::builder().add_source(File::from_str(
            r#"
            [secrets]
            bearer_auth_token = "tok"

            [http]
            timeout_secs = "thirty"
        "#,
            FileFormat::Toml,
        )));
        assert!(result.is_err());

        assert!(from_env(&[("PERMGRANT_HTTP__TIMEOUT_SECS", "soon")]).is_err());
    }

    #[test]
    fn test_load_context_file() {
        let path = std::env::temp_dir().join(format!(
            "permgrant-context-{}.json",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"{"environment": {"ADDRESS": "https://acme.my.salesforce.com"}, "secrets": {"BASIC_USERNAME": "u", "BASIC_PASSWORD": "p"}}"#,
        )
        .unwrap();

        let ctx = load_context_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(
            ctx.environment.address.as_deref(),
            Some("https://acme.my.salesforce.com")
        );
        assert_eq!(ctx.secrets.basic_username.as_deref(), Some("u"));
    }

    #[test]
    fn test_load_context_file_missing() {
        let err = load_context_file(Path::new("/nonexistent/permgrant/context.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read context file"));
    }
}
