//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CRAVE_API_BASE_URL` - Base URL of the ordering backend (e.g., <https://api.cravedine.example/api/v1>)
//! - `RAZORPAY_KEY_ID` - Razorpay public key id handed to the checkout widget
//!
//! ## Optional
//! - `CRAVE_CART_DIR` - Directory for the persisted cart file (default: current directory)
//! - `CRAVE_HTTP_TIMEOUT_SECS` - Timeout for backend calls in seconds (default: 30)
//! - `CRAVE_CURRENCY` - ISO 4217 currency for order creation (default: INR)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crave_dine_core::CurrencyCode;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL of the ordering backend, without a trailing slash.
    pub api_base_url: Url,
    /// Razorpay public key id. Safe to expose; the secret key never leaves
    /// the backend.
    pub razorpay_key_id: String,
    /// Directory holding the persisted cart file.
    pub cart_dir: PathBuf,
    /// Timeout applied to every backend call.
    pub http_timeout: Duration,
    /// Currency used when creating gateway orders.
    pub currency: CurrencyCode,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = parse_base_url(&get_required_env("CRAVE_API_BASE_URL")?)?;
        let razorpay_key_id = get_required_env("RAZORPAY_KEY_ID")?;

        let cart_dir = get_optional_env("CRAVE_CART_DIR")
            .map_or_else(|| PathBuf::from("."), PathBuf::from);

        let timeout_secs = get_env_or_default(
            "CRAVE_HTTP_TIMEOUT_SECS",
            &DEFAULT_HTTP_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("CRAVE_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
        })?;

        let currency = get_env_or_default("CRAVE_CURRENCY", "INR")
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("CRAVE_CURRENCY".to_string(), e.to_string()))?;

        Ok(Self {
            api_base_url,
            razorpay_key_id,
            cart_dir,
            http_timeout: Duration::from_secs(timeout_secs),
            currency,
        })
    }

    /// Build a full endpoint URL for a backend path like `/payment/order`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.api_base_url.as_str().trim_end_matches('/');
        format!("{base}{path}")
    }
}

/// Parse and sanity-check the backend base URL.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar("CRAVE_API_BASE_URL".to_string(), e.to_string()))?;
    if url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            "CRAVE_API_BASE_URL".to_string(),
            "URL must have a host".to_string(),
        ));
    }
    Ok(url)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config(base: &str) -> StorefrontConfig {
        StorefrontConfig {
            api_base_url: Url::parse(base).unwrap(),
            razorpay_key_id: "rzp_test_k3y".to_string(),
            cart_dir: PathBuf::from("."),
            http_timeout: Duration::from_secs(30),
            currency: CurrencyCode::INR,
        }
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = test_config("https://api.example.com/api/v1/");
        assert_eq!(
            config.endpoint("/payment/order"),
            "https://api.example.com/api/v1/payment/order"
        );
    }

    #[test]
    fn test_endpoint_preserves_base_path() {
        let config = test_config("https://api.example.com/api/v1");
        assert_eq!(
            config.endpoint("/payment/verify"),
            "https://api.example.com/api/v1/payment/verify"
        );
    }

    #[test]
    fn test_parse_base_url_rejects_garbage() {
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn test_parse_base_url_accepts_http() {
        assert!(parse_base_url("http://localhost:4000/api/v1").is_ok());
    }
}
