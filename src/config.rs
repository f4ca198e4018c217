//! Client configuration
//!
//! A [`ClientConfig`] can only be obtained through validation: the builder,
//! the environment loader and the YAML loader all refuse to produce one
//! without a usable base URL. Constructing the dispatcher therefore fails at
//! startup rather than on the first request.

use crate::error::{Error, Result, ResultExt};
use crate::http::{default_policy, RetryPolicy};
use crate::types::StringMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Environment variable holding the API base URL
pub const ENV_BASE_URL: &str = "API_BASE_URL";
/// Environment variable holding the transport timeout in milliseconds
pub const ENV_TIMEOUT_MS: &str = "API_TIMEOUT_MS";
/// Environment variable holding the default retry budget
pub const ENV_MAX_RETRIES: &str = "API_MAX_RETRIES";
/// Environment variable holding the base backoff delay in milliseconds
pub const ENV_RETRY_DELAY_MS: &str = "API_RETRY_DELAY_MS";
/// Environment variable pointing at a persisted token file
pub const ENV_TOKEN_FILE: &str = "API_TOKEN_FILE";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Validated Config
// ============================================================================

/// Validated configuration for the client layer
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL every relative request path is joined onto
    pub base_url: Url,
    /// Transport timeout for a single attempt
    pub timeout: Duration,
    /// Default retry budget
    pub max_retries: u32,
    /// Default base backoff delay
    pub retry_delay: Duration,
    /// Headers sent with every request
    pub default_headers: StringMap,
    /// User agent string
    pub user_agent: String,
    /// Persisted token file, if credentials live on disk
    pub token_file: Option<PathBuf>,
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (the environment, a map in tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = ConfigFile {
            base_url: lookup(ENV_BASE_URL),
            timeout_ms: parse_var(&lookup, ENV_TIMEOUT_MS)?,
            max_retries: parse_var(&lookup, ENV_MAX_RETRIES)?,
            retry_delay_ms: parse_var(&lookup, ENV_RETRY_DELAY_MS)?,
            default_headers: StringMap::new(),
            user_agent: None,
            token_file: lookup(ENV_TOKEN_FILE).map(PathBuf::from),
        };
        raw.into_config(ENV_BASE_URL)
    }

    /// Parse from a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let raw: ConfigFile = serde_yaml::from_str(yaml)?;
        raw.into_config("base_url")
    }

    /// Load from a YAML file on disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&contents)
    }

    /// The retry policy implied by this config
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_delay)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::invalid_value(key, format!("{e}"))),
    }
}

fn parse_base_url(field: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| Error::invalid_value(field, e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(Error::invalid_value(
                field,
                format!("unsupported scheme '{other}'"),
            ))
        }
    }
    if url.cannot_be_a_base() {
        return Err(Error::invalid_value(field, "URL cannot be used as a base"));
    }
    Ok(url)
}

fn default_user_agent() -> String {
    format!("moto-admin-http/{}", env!("CARGO_PKG_VERSION"))
}

// ============================================================================
// File / Environment Representation
// ============================================================================

/// Unvalidated config as it appears in YAML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    timeout_ms: Option<u64>,
    #[serde(default)]
    max_retries: Option<u32>,
    #[serde(default)]
    retry_delay_ms: Option<u64>,
    #[serde(default)]
    default_headers: StringMap,
    #[serde(default)]
    user_agent: Option<String>,
    #[serde(default)]
    token_file: Option<PathBuf>,
}

impl ConfigFile {
    fn into_config(self, base_url_field: &str) -> Result<ClientConfig> {
        let mut builder = ClientConfig::builder();
        if let Some(url) = self.base_url.filter(|u| !u.trim().is_empty()) {
            builder = builder.base_url(url);
        }
        if let Some(ms) = self.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        if let Some(retries) = self.max_retries {
            builder = builder.max_retries(retries);
        }
        if let Some(ms) = self.retry_delay_ms {
            builder = builder.retry_delay(Duration::from_millis(ms));
        }
        for (key, value) in self.default_headers {
            builder = builder.header(key, value);
        }
        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }
        if let Some(path) = self.token_file {
            builder = builder.token_file(path);
        }
        builder.base_url_field(base_url_field).build()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`ClientConfig`]
#[derive(Debug)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    base_url_field: String,
    timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
    default_headers: StringMap,
    user_agent: String,
    token_file: Option<PathBuf>,
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        let policy = default_policy();
        Self {
            base_url: None,
            base_url_field: "base_url".to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: policy.max_retries,
            retry_delay: policy.retry_delay,
            default_headers: StringMap::new(),
            user_agent: default_user_agent(),
            token_file: None,
        }
    }
}

impl ClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    fn base_url_field(mut self, field: &str) -> Self {
        self.base_url_field = field.to_string();
        self
    }

    /// Set the transport timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the default retry budget
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the default base backoff delay
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Set the persisted token file
    pub fn token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = Some(path.into());
        self
    }

    /// Validate and build the config
    pub fn build(self) -> Result<ClientConfig> {
        let raw = self
            .base_url
            .ok_or_else(|| Error::missing_field(&self.base_url_field))?;
        let base_url = parse_base_url(&self.base_url_field, &raw)?;

        if self.timeout.is_zero() {
            return Err(Error::invalid_value("timeout", "must be greater than zero"));
        }

        Ok(ClientConfig {
            base_url,
            timeout: self.timeout,
            max_retries: self.max_retries,
            retry_delay: self.retry_delay,
            default_headers: self.default_headers,
            user_agent: self.user_agent,
            token_file: self.token_file,
        })
    }
}
