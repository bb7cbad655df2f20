//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `SANITY_PROJECT_ID` - Sanity project id
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_CURRENCY` - Currency code for prices (default: DZD)
//! - `STOREFRONT_NAME` - Store name used before site settings load (default: Ra9ia Collection)
//! - `SANITY_DATASET` - Dataset name (default: production)
//! - `SANITY_API_VERSION` - API version date (default: 2024-01-01)
//! - `SANITY_USE_CDN` - Read through the API CDN (default: true)
//! - `SANITY_TOKEN` - Write token, needed for restock sign-ups
//! - `SANITY_API_ORIGIN` - Replace the Sanity API origin (local mocks)
//! - `STORE_TELEGRAM_USERNAME` - Fallback Telegram username for orders
//! - `STORE_WHATSAPP_NUMBER` - Fallback WhatsApp number for orders
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use ra9ia_core::{ContactSettings, CurrencyCode};
use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Store name shown when the CMS has none
    pub store_name: String,
    /// Currency every price is shown in
    pub currency: CurrencyCode,
    /// Sanity dataset configuration
    pub sanity: SanityConfig,
    /// Order destinations used when neither product, partner nor CMS settings
    /// provide one
    pub contact: ContactSettings,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions sent to Sentry
    pub sentry_traces_sample_rate: f32,
}

/// Sanity dataset configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct SanityConfig {
    /// Project id (e.g. `a1b2c3d4`)
    pub project_id: String,
    /// Dataset name
    pub dataset: String,
    /// API version date without the leading `v` (e.g. `2024-01-01`)
    pub api_version: String,
    /// Use `apicdn.sanity.io` for reads
    pub use_cdn: bool,
    /// Token with write access, required for mutations
    pub token: Option<SecretString>,
    /// Origin replacing `https://<project>.api(cdn).sanity.io`, for a local mock
    pub api_origin: Option<String>,
}

impl std::fmt::Debug for SanityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SanityConfig")
            .field("project_id", &self.project_id)
            .field("dataset", &self.dataset)
            .field("api_version", &self.api_version)
            .field("use_cdn", &self.use_cdn)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("api_origin", &self.api_origin)
            .finish()
    }
}

impl SanityConfig {
    /// Endpoint for GROQ queries.
    #[must_use]
    pub fn query_url(&self) -> String {
        format!(
            "{}/v{}/data/query/{}",
            self.origin(self.use_cdn),
            self.api_version,
            self.dataset
        )
    }

    /// Endpoint for mutations. Never goes through the CDN.
    #[must_use]
    pub fn mutate_url(&self) -> String {
        format!(
            "{}/v{}/data/mutate/{}",
            self.origin(false),
            self.api_version,
            self.dataset
        )
    }

    fn origin(&self, cdn: bool) -> String {
        if let Some(origin) = &self.api_origin {
            return origin.trim_end_matches('/').to_string();
        }
        let host = if cdn { "apicdn.sanity.io" } else { "api.sanity.io" };
        format!("https://{}.{host}", self.project_id)
    }

    fn from_env() -> Result<Self, ConfigError> {
        let project_id = get_required_env("SANITY_PROJECT_ID")?;
        if project_id.is_empty() || !project_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::InvalidEnvVar(
                "SANITY_PROJECT_ID".to_string(),
                "must be alphanumeric".to_string(),
            ));
        }

        let api_version = get_env_or_default("SANITY_API_VERSION", "2024-01-01");
        let api_version = api_version.trim_start_matches('v').to_string();
        chrono::NaiveDate::parse_from_str(&api_version, "%Y-%m-%d").map_err(|e| {
            ConfigError::InvalidEnvVar("SANITY_API_VERSION".to_string(), e.to_string())
        })?;

        let use_cdn = parse_bool("SANITY_USE_CDN", &get_env_or_default("SANITY_USE_CDN", "true"))?;

        let token = match get_optional_env("SANITY_TOKEN") {
            Some(value) => {
                validate_secret_strength(&value, "SANITY_TOKEN")?;
                Some(SecretString::from(value))
            }
            None => None,
        };

        Ok(Self {
            project_id,
            dataset: get_env_or_default("SANITY_DATASET", "production"),
            api_version,
            use_cdn,
            token,
            api_origin: get_optional_env("SANITY_API_ORIGIN"),
        })
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the Sanity token fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;

        let currency = get_env_or_default("STOREFRONT_CURRENCY", "DZD")
            .parse::<CurrencyCode>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_CURRENCY".to_string(), e.to_string())
            })?;

        let contact = ContactSettings::new(
            get_optional_env("STORE_TELEGRAM_USERNAME"),
            get_optional_env("STORE_WHATSAPP_NUMBER"),
        );

        Ok(Self {
            host,
            port,
            base_url,
            store_name: get_env_or_default("STOREFRONT_NAME", "Ra9ia Collection"),
            currency,
            sanity: SanityConfig::from_env()?,
            contact,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_rate("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: parse_rate("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

fn parse_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(value) = get_optional_env(key) else {
        return Ok(default);
    };
    let rate = value
        .trim()
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be between 0.0 and 1.0".to_string(),
        ))
    }
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
    let len = s.len() as f64;
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
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the token generated in the Sanity dashboard."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// Configuration used by handler tests. Never touches the environment.
    pub(crate) fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            store_name: "Ra9ia Collection".to_string(),
            currency: CurrencyCode::DZD,
            sanity: SanityConfig {
                project_id: "abc123".to_string(),
                dataset: "production".to_string(),
                api_version: "2024-01-01".to_string(),
                use_cdn: true,
                token: None,
                api_origin: Some("http://127.0.0.1:9".to_string()),
            },
            contact: ContactSettings::new(
                Some("ra9ia_shop".to_string()),
                Some("+213 555 00 01 11".to_string()),
            ),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-sanity-token", "SANITY_TOKEN");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "SANITY_TOKEN");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("skQ3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "SANITY_TOKEN");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("X", "TRUE").unwrap());
        assert!(!parse_bool("X", "off").unwrap());
        assert!(parse_bool("X", "maybe").is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = test_config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(!config.is_secure());
    }

    #[test]
    fn test_sanity_urls() {
        let mut sanity = test_config().sanity;
        sanity.api_origin = None;
        assert_eq!(
            sanity.query_url(),
            "https://abc123.apicdn.sanity.io/v2024-01-01/data/query/production"
        );
        sanity.use_cdn = false;
        assert_eq!(
            sanity.query_url(),
            "https://abc123.api.sanity.io/v2024-01-01/data/query/production"
        );
        assert_eq!(
            sanity.mutate_url(),
            "https://abc123.api.sanity.io/v2024-01-01/data/mutate/production"
        );
    }

    #[test]
    fn test_sanity_origin_override() {
        let mut sanity = test_config().sanity;
        sanity.api_origin = Some("http://127.0.0.1:4010/".to_string());
        assert_eq!(
            sanity.query_url(),
            "http://127.0.0.1:4010/v2024-01-01/data/query/production"
        );
        assert_eq!(
            sanity.mutate_url(),
            "http://127.0.0.1:4010/v2024-01-01/data/mutate/production"
        );
    }

    #[test]
    fn test_sanity_config_debug_redacts_token() {
        let mut sanity = test_config().sanity;
        sanity.token = Some(SecretString::from("skSuperSecretTokenValue"));

        let debug_output = format!("{sanity:?}");
        assert!(debug_output.contains("abc123"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("skSuperSecretTokenValue"));
    }
}
