//! Configuration module for Tracelab
//!
//! All configuration is read from environment variables; there is no config
//! file. Defaults match the docker-compose style deployment where the server
//! is reachable as `http://server:8080`.

use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: String, value: String },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Read an environment variable and parse it, falling back to a default when
/// the variable is unset. A set-but-unparseable value is an error rather than
/// a silent fallback.
fn env_parse<T: FromStr>(var: &str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            var: var.to_string(),
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

/// Uniform random sleep bounds, in milliseconds.
///
/// The sleeps simulate variable downstream latency; the bounds carry no
/// business meaning and are configurable. Setting `min_ms == max_ms` gives a
/// fixed duration, which test configs use with zero to disable sleeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JitterConfig {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl JitterConfig {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// No sleeping at all. Used by tests.
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    /// Draw a duration uniformly from `[min_ms, max_ms)`.
    pub fn sample(&self) -> Duration {
        use rand::Rng;
        let ms = if self.max_ms > self.min_ms {
            rand::thread_rng().gen_range(self.min_ms..self.max_ms)
        } else {
            self.min_ms
        };
        Duration::from_millis(ms)
    }

    fn validate(&self, context: &str) -> Result<(), ConfigError> {
        if self.min_ms > self.max_ms {
            return Err(ConfigError::ValidationError(format!(
                "{}: jitter min {}ms exceeds max {}ms",
                context, self.min_ms, self.max_ms
            )));
        }
        Ok(())
    }
}

/// Tracer identity and on/off switch.
#[derive(Debug, Clone)]
pub struct TracerConfig {
    pub enabled: bool,
    pub service_name: String,
}

impl TracerConfig {
    /// Read tracer settings from `OTEL_SERVICE_NAME` and
    /// `TRACELAB_TRACING_ENABLED`. The exporter endpoint, when one is
    /// deployed, is picked up by the collector sidecar and not handled here.
    pub fn from_env(default_service_name: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            enabled: env_parse("TRACELAB_TRACING_ENABLED", true)?,
            service_name: env::var("OTEL_SERVICE_NAME")
                .unwrap_or_else(|_| default_service_name.to_string()),
        })
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub jitter: JitterConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            jitter: JitterConfig::new(1_000, 10_000),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            bind_addr: env::var("TRACELAB_BIND_ADDR").unwrap_or_else(|_| default_bind_addr()),
            jitter: JitterConfig::new(
                env_parse("TRACELAB_JITTER_MIN_MS", 1_000)?,
                env_parse("TRACELAB_JITTER_MAX_MS", 10_000)?,
            ),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.jitter.validate("server")
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the server, without a trailing slash.
    pub base_url: String,
    pub request_timeout: Duration,
    pub jitter: JitterConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: Duration::from_secs(default_timeout_secs()),
            jitter: JitterConfig::new(1_000, 5_000),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            base_url: env::var("TRACELAB_SERVER_URL")
                .unwrap_or_else(|_| default_base_url())
                .trim_end_matches('/')
                .to_string(),
            request_timeout: Duration::from_secs(env_parse(
                "TRACELAB_REQUEST_TIMEOUT_SECS",
                default_timeout_secs(),
            )?),
            jitter: JitterConfig::new(
                env_parse("TRACELAB_JITTER_MIN_MS", 1_000)?,
                env_parse("TRACELAB_JITTER_MAX_MS", 5_000)?,
            ),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "server URL must start with http:// or https://, got: {}",
                self.base_url
            )));
        }
        self.jitter.validate("client")
    }
}

fn default_base_url() -> String {
    "http://server:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_server_config_is_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_client_config_is_valid() {
        assert!(ClientConfig::default().validate().is_ok());
    }

    #[test]
    fn test_client_config_rejects_bad_scheme() {
        let config = ClientConfig {
            base_url: "server:8080".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_jitter_rejects_inverted_bounds() {
        let jitter = JitterConfig::new(10, 5);
        assert!(jitter.validate("test").is_err());
    }

    #[test]
    fn test_jitter_sample_within_bounds() {
        let jitter = JitterConfig::new(5, 10);
        for _ in 0..100 {
            let d = jitter.sample();
            assert!(d >= Duration::from_millis(5));
            assert!(d < Duration::from_millis(10));
        }
    }

    #[test]
    fn test_jitter_none_is_zero() {
        assert_eq!(JitterConfig::none().sample(), Duration::ZERO);
    }
}
