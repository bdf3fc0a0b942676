//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ORDERDESK_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `OIDC_CLIENT_ID` - OAuth client ID registered with the identity provider
//! - `OIDC_CLIENT_SECRET` - OAuth client secret
//! - `OIDC_REDIRECT_URL` - Callback URL registered for the login flow
//! - `SMS_BASE_URL` - SMS gateway messaging endpoint
//! - `SMS_USERNAME` - SMS gateway account username
//! - `SMS_API_KEY` - SMS gateway API key
//! - `SMS_DESTINATION` - Number that receives order notifications
//!
//! ## Optional
//! - `OIDC_ISSUER_URL` - Identity provider issuer (default: `https://accounts.google.com`)
//! - `SMS_SENDER` - Sender ID or short code
//! - `OUTBOUND_TIMEOUT_SECS` - Timeout for provider and gateway calls (default: 5)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_ISSUER_URL: &str = "https://accounts.google.com";
const DEFAULT_OUTBOUND_TIMEOUT_SECS: &str = "5";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// `OpenID` Connect provider configuration
    pub oidc: OidcConfig,
    /// SMS gateway configuration
    pub sms: SmsConfig,
    /// Timeout applied to every outbound provider and gateway call
    pub outbound_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// `OpenID` Connect provider configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct OidcConfig {
    /// Issuer URL; discovery is served from `{issuer}/.well-known/openid-configuration`
    pub issuer_url: Url,
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: SecretString,
    /// Redirect URL for the authorization code flow
    pub redirect_url: Url,
}

impl std::fmt::Debug for OidcConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidcConfig")
            .field("issuer_url", &self.issuer_url.as_str())
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_url", &self.redirect_url.as_str())
            .finish()
    }
}

/// SMS gateway configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct SmsConfig {
    /// Messaging endpoint
    pub base_url: Url,
    /// Account username
    pub username: String,
    /// API key sent in the `apikey` header
    pub api_key: SecretString,
    /// Optional sender ID
    pub sender: Option<String>,
    /// Number that receives order notifications
    pub destination: String,
}

impl std::fmt::Debug for SmsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsConfig")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("api_key", &"[REDACTED]")
            .field("sender", &self.sender)
            .field("destination", &self.destination)
            .finish()
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("ORDERDESK_DATABASE_URL")?;
        let oidc = OidcConfig::from_env()?;
        let sms = SmsConfig::from_env()?;
        let outbound_timeout = get_env_or_default(
            "OUTBOUND_TIMEOUT_SECS",
            DEFAULT_OUTBOUND_TIMEOUT_SECS,
        )
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| {
            ConfigError::InvalidEnvVar("OUTBOUND_TIMEOUT_SECS".to_string(), e.to_string())
        })?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            database_url,
            oidc,
            sms,
            outbound_timeout,
            sentry_dsn,
        })
    }

    /// Load only the database URL.
    ///
    /// Used by tooling (migrations, customer lookups) that never talks to the
    /// identity provider or the SMS gateway.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if no database URL is set.
    pub fn database_url_from_env() -> Result<SecretString, ConfigError> {
        let _ = dotenvy::dotenv();
        get_database_url("ORDERDESK_DATABASE_URL")
    }
}

impl OidcConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            issuer_url: parse_url(
                "OIDC_ISSUER_URL",
                &get_env_or_default("OIDC_ISSUER_URL", DEFAULT_ISSUER_URL),
            )?,
            client_id: get_required_env("OIDC_CLIENT_ID")?,
            client_secret: get_validated_secret("OIDC_CLIENT_SECRET")?,
            redirect_url: parse_url("OIDC_REDIRECT_URL", &get_required_env("OIDC_REDIRECT_URL")?)?,
        })
    }
}

impl SmsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_url("SMS_BASE_URL", &get_required_env("SMS_BASE_URL")?)?,
            username: get_required_env("SMS_USERNAME")?,
            api_key: get_validated_secret("SMS_API_KEY")?,
            sender: get_optional_env("SMS_SENDER"),
            destination: get_required_env("SMS_DESTINATION")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a URL-valued variable.
fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the value issued by the provider."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
