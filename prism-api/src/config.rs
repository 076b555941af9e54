use base64::{Engine, prelude::BASE64_STANDARD};
use prism_config::Config;
use prism_config::shared::{PrometheusConnectionConfig, SentryConfig};
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Required length in bytes for a valid API key.
const API_KEY_LENGTH_IN_BYTES: usize = 32;

/// Complete configuration for the Prism API service.
///
/// Contains all settings required to run the API including the metrics
/// backend connection, server settings, query defaults, authentication,
/// and optional monitoring.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Application server settings.
    pub application: ApplicationSettings,
    /// Metrics backend connection configuration.
    pub prometheus: PrometheusConnectionConfig,
    /// Kubernetes discovery settings.
    pub kubernetes: KubernetesSettings,
    /// Defaults and limits applied to metrics queries.
    pub query: QuerySettings,
    /// List of base64-encoded API keys.
    ///
    /// All keys in this list are considered valid for authentication.
    pub api_keys: Vec<String>,
    /// Optional Sentry configuration for error tracking.
    pub sentry: Option<SentryConfig>,
}

impl Config for ApiConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &["api_keys"];
}

/// HTTP server configuration settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSettings {
    /// Host address the API listens on.
    pub host: String,
    /// Port number the API listens on.
    pub port: u16,
}

impl fmt::Display for ApplicationSettings {
    /// Formats application settings for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "    host: {}", self.host)?;
        writeln!(f, "    port: {}", self.port)
    }
}

/// Kubernetes discovery settings.
#[derive(Debug, Clone, Deserialize)]
pub struct KubernetesSettings {
    /// Namespace in which workloads and pods are resolved.
    pub namespace: String,
}

/// Defaults and limits applied to metrics queries.
#[derive(Debug, Clone, Deserialize)]
pub struct QuerySettings {
    /// Deadline in seconds for one batch of backend queries.
    pub timeout_secs: u64,
    /// Range covered by a query when the request omits `start`, in seconds.
    pub default_range_secs: i64,
    /// Rate window applied to counter queries when the request omits
    /// `duration`, in seconds.
    pub default_window_secs: i64,
}

/// Errors that can occur during API key validation and conversion.
#[derive(Debug, Error)]
pub enum ApiKeyConversionError {
    /// The API key is not valid base64.
    #[error("api key is not base64 encoded")]
    NotBase64Encoded,

    /// The API key does not have the expected length of 32 bytes.
    #[error("expected length of api key is 32, but actual length is {0}")]
    LengthNot32Bytes(usize),
}

/// Validated API key as a 32-byte array.
///
/// Ensures API keys meet length requirements and are properly decoded from base64.
#[derive(Debug)]
pub struct ApiKey {
    /// The 32-byte decoded API key.
    pub key: [u8; API_KEY_LENGTH_IN_BYTES],
}

impl TryFrom<&str> for ApiKey {
    type Error = ApiKeyConversionError;

    /// Creates an [`ApiKey`] from a base64-encoded string.
    ///
    /// Validates that the string is valid base64 and decodes to exactly 32 bytes.
    ///
    /// # Panics
    /// Panics if the decoded key cannot be converted to a 32-byte array.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let key = BASE64_STANDARD
            .decode(value)
            .map_err(|_| ApiKeyConversionError::NotBase64Encoded)?;

        if key.len() != API_KEY_LENGTH_IN_BYTES {
            return Err(ApiKeyConversionError::LengthNot32Bytes(key.len()));
        }

        Ok(ApiKey {
            key: key
                .try_into()
                .expect("failed to convert api key into array"),
        })
    }
}
