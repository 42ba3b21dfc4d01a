//! Configuration management module.
//!
//! Handles loading configuration from environment variables.

use std::{env, fmt, time::Duration};

use secrecy::{ExposeSecret, SecretString};

use crate::{
    debank::{endpoints::DEFAULT_BASE_URL, RetryPolicy},
    error::AppError,
    validation::ChainAllowList,
};

/// Default per-attempt request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// DeBank API access key. Never printed.
#[derive(Clone)]
pub struct AccessKey(SecretString);

impl AccessKey {
    /// Wrap a raw access key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(SecretString::new(key.into()))
    }

    pub(crate) fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessKey([REDACTED])")
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Access key attached to every upstream request.
    pub access_key: AccessKey,
    /// DeBank API base URL.
    pub base_url: String,
    /// Timeout for a single HTTP attempt.
    pub timeout: Duration,
    /// Retry ceiling and backoff constants.
    pub retry: RetryPolicy,
    /// Chain identifiers accepted by the validators.
    pub supported_chains: ChainAllowList,
    /// Logging level (default: info).
    pub log_level: String,
}

impl Config {
    /// Build a configuration with defaults for everything but the access key.
    pub fn new(access_key: AccessKey) -> Self {
        Self {
            access_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            supported_chains: ChainAllowList::default(),
            log_level: "info".to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `DEBANK_ACCESS_KEY`: DeBank Pro API access key
    ///
    /// Optional environment variables:
    /// - `DEBANK_BASE_URL`: API base URL (default: production)
    /// - `DEBANK_TIMEOUT_SECS`: per-attempt timeout (default: 10)
    /// - `DEBANK_MAX_ATTEMPTS`: attempts per request, 1 to 10 (default: 3)
    /// - `DEBANK_RETRY_BASE_MS`: first backoff delay (default: 500)
    /// - `DEBANK_SUPPORTED_CHAINS`: comma-separated chain allow-list, `*` for any
    /// - `LOG_LEVEL`: Logging level (default: info)
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let access_key = var("DEBANK_ACCESS_KEY").ok_or_else(|| {
            AppError::Config(
                "DEBANK_ACCESS_KEY environment variable not set. \
                 Export it or add it to a .env file."
                    .into(),
            )
        })?;

        let mut config = Self::new(AccessKey::new(access_key));

        if let Some(base_url) = var("DEBANK_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }

        if let Some(secs) = var("DEBANK_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|e| {
                AppError::Config(format!("DEBANK_TIMEOUT_SECS must be an integer: {e}"))
            })?;
            if secs == 0 {
                return Err(AppError::Config("DEBANK_TIMEOUT_SECS must be positive".into()));
            }
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(attempts) = var("DEBANK_MAX_ATTEMPTS") {
            let attempts: u32 = attempts.parse().map_err(|e| {
                AppError::Config(format!("DEBANK_MAX_ATTEMPTS must be an integer: {e}"))
            })?;
            if !(1..=10).contains(&attempts) {
                return Err(AppError::Config("DEBANK_MAX_ATTEMPTS must be between 1 and 10".into()));
            }
            config.retry.max_attempts = attempts;
        }

        if let Some(ms) = var("DEBANK_RETRY_BASE_MS") {
            let ms: u64 = ms.parse().map_err(|e| {
                AppError::Config(format!("DEBANK_RETRY_BASE_MS must be an integer: {e}"))
            })?;
            config.retry.base_delay = Duration::from_millis(ms);
        }

        if let Some(chains) = var("DEBANK_SUPPORTED_CHAINS") {
            config.supported_chains = ChainAllowList::parse(&chains);
        }

        if let Some(level) = var("LOG_LEVEL") {
            config.log_level = level;
        }

        Ok(config)
    }
}
