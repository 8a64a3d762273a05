//! Configuration management for the secmgr client.
//!
//! Configuration is loaded from environment variables (optionally via a
//! `.env` file) and validated before any connection is attempted.

use std::env;
use std::fmt;

use crate::error::ApiError;

/// Domain used when `SECMGR_DOMAIN_ID` is not set.
pub const DEFAULT_DOMAIN_ID: &str = "1";

/// Connection settings for one Security Manager server.
///
/// The password is kept only until login and is never logged; the `Debug`
/// implementation redacts it.
#[derive(Clone)]
pub struct Config {
    /// Base URL of the server (e.g., `https://fm.example.com`).
    pub host: String,

    /// Login user name.
    pub username: String,

    /// Login password.
    password: String,

    /// Whether TLS certificates are verified.
    pub verify_tls: bool,

    /// Suppresses the warning logged when TLS verification is disabled.
    pub suppress_tls_warning: bool,

    /// Domain id used in every domain-scoped endpoint.
    pub domain_id: String,

    /// Default workflow name for ticket clients, if configured.
    pub workflow: Option<String>,
}

impl Config {
    /// Creates a configuration with default domain and TLS verification on.
    ///
    /// The host is validated and normalized the same way as in `from_env`.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ApiError> {
        Ok(Config {
            host: Self::validate_host(host.into())?,
            username: username.into(),
            password: password.into(),
            verify_tls: true,
            suppress_tls_warning: false,
            domain_id: DEFAULT_DOMAIN_ID.to_string(),
            workflow: None,
        })
    }

    /// Loads configuration from environment variables.
    ///
    /// # Required Environment Variables
    ///
    /// - `SECMGR_HOST`: Base URL of the server
    /// - `SECMGR_USERNAME`: Login user name
    /// - `SECMGR_PASSWORD`: Login password
    ///
    /// # Optional Environment Variables
    ///
    /// - `SECMGR_VERIFY_TLS`: `true`/`false`, default `true`
    /// - `SECMGR_SUPPRESS_TLS_WARNING`: `true`/`false`, default `false`
    /// - `SECMGR_DOMAIN_ID`: default `1`
    /// - `SECMGR_WORKFLOW`: default workflow name for ticket clients
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if any required variable is missing
    /// or if values fail validation.
    ///
    /// # Example
    ///
    /// ```ignore
    /// dotenvy::dotenv().ok();
    /// let config = Config::from_env()?;
    /// ```
    pub fn from_env() -> Result<Self, ApiError> {
        let host = Self::get_required_env("SECMGR_HOST")?;
        let username = Self::get_required_env("SECMGR_USERNAME")?;
        let password = Self::get_required_env("SECMGR_PASSWORD")?;

        Self::validate_password(&password)?;

        let verify_tls = Self::get_bool_env("SECMGR_VERIFY_TLS", true)?;
        let suppress_tls_warning = Self::get_bool_env("SECMGR_SUPPRESS_TLS_WARNING", false)?;
        let domain_id = Self::get_optional_env("SECMGR_DOMAIN_ID")
            .unwrap_or_else(|| DEFAULT_DOMAIN_ID.to_string());
        let workflow = Self::get_optional_env("SECMGR_WORKFLOW");

        Ok(Config {
            host: Self::validate_host(host)?,
            username,
            password,
            verify_tls,
            suppress_tls_warning,
            domain_id,
            workflow,
        })
    }

    /// Sets whether TLS certificates are verified.
    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// Sets the domain id.
    pub fn with_domain_id(mut self, domain_id: impl Into<String>) -> Self {
        self.domain_id = domain_id.into();
        self
    }

    /// Sets the default workflow name.
    pub fn with_workflow(mut self, workflow: impl Into<String>) -> Self {
        self.workflow = Some(workflow.into());
        self
    }

    /// Returns the login password.
    ///
    /// Only the session login uses this; never log it.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Gets a required environment variable, returning an error if missing or empty.
    fn get_required_env(name: &str) -> Result<String, ApiError> {
        Self::get_optional_env(name).ok_or_else(|| ApiError::missing_env(name))
    }

    fn get_optional_env(name: &str) -> Option<String> {
        env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn get_bool_env(name: &str, default: bool) -> Result<bool, ApiError> {
        match Self::get_optional_env(name) {
            Some(value) => Self::parse_bool(name, &value),
            None => Ok(default),
        }
    }

    fn parse_bool(name: &str, value: &str) -> Result<bool, ApiError> {
        match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ApiError::invalid_config(format!(
                "{} must be true or false, got {:?}",
                name, value
            ))),
        }
    }

    /// Validates and normalizes the host URL.
    fn validate_host(host: String) -> Result<String, ApiError> {
        let host = host.trim().trim_end_matches('/').to_string();

        if !host.starts_with("http://") && !host.starts_with("https://") {
            return Err(ApiError::invalid_config(
                "SECMGR_HOST must start with http:// or https://",
            ));
        }

        let parsed = url::Url::parse(&host)
            .map_err(|e| ApiError::invalid_config(format!("SECMGR_HOST is not a valid URL: {}", e)))?;
        if parsed.host_str().is_none() {
            return Err(ApiError::invalid_config("SECMGR_HOST has no host name"));
        }

        Ok(host)
    }

    /// Validates the password is not a placeholder value.
    fn validate_password(password: &str) -> Result<(), ApiError> {
        let lower = password.to_lowercase();
        let placeholder_patterns = ["your_password", "placeholder", "changeme", "xxx"];

        for pattern in placeholder_patterns {
            if lower.contains(pattern) {
                return Err(ApiError::invalid_config(
                    "SECMGR_PASSWORD appears to be a placeholder value",
                ));
            }
        }

        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("verify_tls", &self.verify_tls)
            .field("suppress_tls_warning", &self.suppress_tls_warning)
            .field("domain_id", &self.domain_id)
            .field("workflow", &self.workflow)
            .finish()
    }
}
