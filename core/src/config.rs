//! Connection settings for the Learnify client.
//!
//! ## Environment Variables
//! All optional; unset variables keep the defaults.
//! - `LEARNIFY_BASE_URL`: service base URL
//! - `LEARNIFY_REQUEST_TIMEOUT_SECS`: per-request timeout
//! - `LEARNIFY_RESOURCE_TIMEOUT_SECS`: aggregate timeout for one request
//! - `LEARNIFY_MAX_ATTEMPTS`: attempt budget per call (initial try included)
//! - `LEARNIFY_BACKOFF_MS`: linear backoff unit
//! - `LEARNIFY_MAX_CONNECTIONS_PER_HOST`: idle connections kept per host
//! - `LEARNIFY_CACHE_POLICY`: `reload` or `default`

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://learnify-api.zeabur.app";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(1);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_RESOURCE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Whether responses may be served from an intermediate cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Ask every hop to revalidate (`cache-control: no-cache`).
    ReloadIgnoringCache,
    /// Leave caching to the protocol defaults.
    UseProtocolDefault,
}

/// Runtime profile the client is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Simulator,
    Device,
}

/// Transport and retry settings shared by every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub request_timeout: Duration,
    pub resource_timeout: Duration,
    pub max_connections_per_host: usize,
    pub cache_policy: CachePolicy,
    /// Total attempts per call, never below 1.
    pub max_attempts: u32,
    /// Backoff before retry `n` is `n * backoff_unit`.
    pub backoff_unit: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            resource_timeout: DEFAULT_RESOURCE_TIMEOUT,
            max_connections_per_host: 1,
            cache_policy: CachePolicy::ReloadIgnoringCache,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_unit: DEFAULT_BACKOFF_UNIT,
        }
    }
}

impl TransportConfig {
    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Simulator => Self::default(),
            Environment::Device => Self {
                cache_policy: CachePolicy::UseProtocolDefault,
                ..Self::default()
            },
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }
}

/// Everything needed to construct a `LearnifyClient`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub transport: TransportConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            transport: TransportConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            transport: TransportConfig::default(),
        }
    }

    /// Defaults overridden by any `LEARNIFY_*` variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let mut transport = TransportConfig::default();

        if let Some(url) = lookup("LEARNIFY_BASE_URL") {
            config.base_url = url;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "LEARNIFY_REQUEST_TIMEOUT_SECS")? {
            transport.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "LEARNIFY_RESOURCE_TIMEOUT_SECS")? {
            transport.resource_timeout = Duration::from_secs(secs);
        }
        if let Some(attempts) = parse_var::<u32, _>(&lookup, "LEARNIFY_MAX_ATTEMPTS")? {
            transport = transport.with_max_attempts(attempts);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "LEARNIFY_BACKOFF_MS")? {
            transport.backoff_unit = Duration::from_millis(ms);
        }
        if let Some(n) = parse_var::<usize, _>(&lookup, "LEARNIFY_MAX_CONNECTIONS_PER_HOST")? {
            transport.max_connections_per_host = n;
        }
        if let Some(policy) = lookup("LEARNIFY_CACHE_POLICY") {
            transport.cache_policy = match policy.trim().to_ascii_lowercase().as_str() {
                "reload" => CachePolicy::ReloadIgnoringCache,
                "default" => CachePolicy::UseProtocolDefault,
                other => {
                    return Err(ConfigError::Invalid {
                        key: "LEARNIFY_CACHE_POLICY",
                        reason: format!("expected `reload` or `default`, got `{other}`"),
                    })
                }
            };
        }

        if transport.resource_timeout < transport.request_timeout {
            tracing::warn!(
                request = ?transport.request_timeout,
                resource = ?transport.resource_timeout,
                "resource timeout is shorter than request timeout"
            );
        }

        config.transport = transport;
        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_service_contract() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.transport.request_timeout, Duration::from_secs(30));
        assert_eq!(config.transport.resource_timeout, Duration::from_secs(60));
        assert_eq!(config.transport.max_attempts, 3);
        assert_eq!(config.transport.backoff_unit, Duration::from_secs(1));
        assert_eq!(config.transport.max_connections_per_host, 1);
        assert_eq!(config.transport.cache_policy, CachePolicy::ReloadIgnoringCache);
    }

    #[test]
    fn env_overrides_are_applied() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("LEARNIFY_BASE_URL", "http://localhost:3000"),
            ("LEARNIFY_MAX_ATTEMPTS", "5"),
            ("LEARNIFY_BACKOFF_MS", "250"),
            ("LEARNIFY_CACHE_POLICY", "default"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.transport.max_attempts, 5);
        assert_eq!(config.transport.backoff_unit, Duration::from_millis(250));
        assert_eq!(config.transport.cache_policy, CachePolicy::UseProtocolDefault);
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        let config =
            ClientConfig::from_lookup(lookup(&[("LEARNIFY_MAX_ATTEMPTS", "0")])).unwrap();
        assert_eq!(config.transport.max_attempts, 1);
    }

    #[test]
    fn unparseable_values_are_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[("LEARNIFY_REQUEST_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "LEARNIFY_REQUEST_TIMEOUT_SECS",
                ..
            }
        ));

        let err = ClientConfig::from_lookup(lookup(&[("LEARNIFY_CACHE_POLICY", "forever")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "LEARNIFY_CACHE_POLICY", .. }));
    }

    #[test]
    fn device_profile_uses_protocol_caching() {
        let device = TransportConfig::for_environment(Environment::Device);
        let simulator = TransportConfig::for_environment(Environment::Simulator);
        assert_eq!(device.cache_policy, CachePolicy::UseProtocolDefault);
        assert_eq!(simulator.cache_policy, CachePolicy::ReloadIgnoringCache);
        assert_eq!(device.max_attempts, simulator.max_attempts);
    }
}
