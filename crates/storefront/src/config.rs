//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `ESHOP_DATA_DIR` - Directory for the persistent store (default: data)
//! - `ESHOP_CURRENCY` - Display currency code (default: INR)
//! - `ESHOP_SIZE_POLICY` - `strict` or `lenient` handling of unknown sizes (default: strict)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name (default: development)
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate, 0.0 to 1.0 (default: 1.0)
//!
//! ## Operator tooling
//! - `ESHOP_ADMIN_PASSWORD` - Password for `eshop-cli admin create` (min 12 chars, high entropy)

use std::collections::HashMap;
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use eshop_core::CurrencyCode;

use crate::cart::SizePolicy;

const MIN_ADMIN_PASSWORD_LENGTH: usize = 12;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Environment variable holding the bootstrap admin password.
pub const ADMIN_PASSWORD_VAR: &str = "ESHOP_ADMIN_PASSWORD";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "admin123",
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

/// Storefront configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct StorefrontConfig {
    /// Directory holding one JSON file per persisted collection
    pub data_dir: PathBuf,
    /// Currency used when formatting prices
    pub currency: CurrencyCode,
    /// How the cart treats sizes a product does not offer
    pub size_policy: SizePolicy,
    /// Error tracking settings
    pub sentry: SentryConfig,
}

/// Sentry error tracking configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SentryConfig {
    /// DSN; tracking is disabled when absent
    pub dsn: Option<String>,
    pub environment: String,
    /// Fraction of error events sent, 0.0 to 1.0
    pub sample_rate: f32,
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            dsn: None,
            environment: "development".to_owned(),
            sample_rate: 1.0,
        }
    }
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            currency: CurrencyCode::default(),
            size_policy: SizePolicy::default(),
            sentry: SentryConfig::default(),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a variable is set to a value
    /// that does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` for unparseable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let data_dir = lookup("ESHOP_DATA_DIR")
            .filter(|v| !v.trim().is_empty())
            .map_or(defaults.data_dir, PathBuf::from);
        let currency = parse_or(&lookup, "ESHOP_CURRENCY", defaults.currency)?;
        let size_policy = parse_or(&lookup, "ESHOP_SIZE_POLICY", defaults.size_policy)?;

        let sample_rate: f32 = parse_or(&lookup, "SENTRY_SAMPLE_RATE", 1.0)?;
        if !(0.0..=1.0).contains(&sample_rate) {
            return Err(ConfigError::InvalidEnvVar(
                "SENTRY_SAMPLE_RATE".to_string(),
                format!("{sample_rate} is not between 0.0 and 1.0"),
            ));
        }
        let sentry = SentryConfig {
            dsn: lookup("SENTRY_DSN").filter(|v| !v.trim().is_empty()),
            environment: lookup("SENTRY_ENVIRONMENT")
                .unwrap_or_else(|| SentryConfig::default().environment),
            sample_rate,
        };

        Ok(Self {
            data_dir,
            currency,
            size_policy,
            sentry,
        })
    }
}

/// Read `ESHOP_ADMIN_PASSWORD` and check it is strong enough.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` when unset and
/// `ConfigError::InsecureSecret` when the password is short, a placeholder
/// or low-entropy.
pub fn admin_password_from_env() -> Result<SecretString, ConfigError> {
    let _ = dotenvy::dotenv();
    let password = get_required_secret(ADMIN_PASSWORD_VAR)?;
    validate_admin_password(&password, ADMIN_PASSWORD_VAR)?;
    Ok(password)
}

/// Check an admin password for length, placeholders and entropy.
///
/// # Errors
///
/// Returns `ConfigError::InsecureSecret` describing the first failed check.
pub fn validate_admin_password(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    let length = value.chars().count();
    if length < MIN_ADMIN_PASSWORD_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("must be at least {MIN_ADMIN_PASSWORD_LENGTH} characters (got {length})"),
        ));
    }
    validate_secret_strength(value, var_name)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    std::env::var(key)
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Parse a variable, falling back to `default` when unset or blank.
fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
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
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated password."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, StorefrontConfig::default());
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.currency, CurrencyCode::INR);
        assert_eq!(config.size_policy, SizePolicy::Strict);
        assert!(config.sentry.dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = StorefrontConfig::from_lookup(lookup_from(&[
            ("ESHOP_DATA_DIR", "/var/lib/eshop"),
            ("ESHOP_CURRENCY", "usd"),
            ("ESHOP_SIZE_POLICY", "lenient"),
            ("SENTRY_DSN", "https://key@sentry.example/1"),
            ("SENTRY_SAMPLE_RATE", "0.25"),
        ]))
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/eshop"));
        assert_eq!(config.currency, CurrencyCode::USD);
        assert_eq!(config.size_policy, SizePolicy::Lenient);
        assert!(config.sentry.dsn.is_some());
        assert!((config.sentry.sample_rate - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_invalid_values() {
        let result = StorefrontConfig::from_lookup(lookup_from(&[("ESHOP_SIZE_POLICY", "fuzzy")]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(key, _)) if key == "ESHOP_SIZE_POLICY"));

        let result = StorefrontConfig::from_lookup(lookup_from(&[("SENTRY_SAMPLE_RATE", "1.5")]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));

        let result = StorefrontConfig::from_lookup(lookup_from(&[("ESHOP_CURRENCY", "XYZ")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_admin_password_too_short() {
        let result = validate_admin_password(&SecretString::from("x9!Kp2"), "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_admin_password_placeholder() {
        let result =
            validate_admin_password(&SecretString::from("MyPassword2025!"), "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_admin_password_low_entropy() {
        let result = validate_admin_password(&SecretString::from("aaaaaaaabbbbbbbb"), "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_admin_password_valid() {
        let result =
            validate_admin_password(&SecretString::from("aB3$xY9!mK2@nL5#"), "TEST_VAR");
        assert!(result.is_ok());
    }
}
