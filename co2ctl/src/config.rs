//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `CO2CTL_CONFIG`
//! environment variable. A missing file is not an error; every field has a default.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `CO2CTL_` override YAML values
//! 3. **AUTH_TOKEN** / **PROMETHEUS_URL** - Unprefixed variables for the two settings every
//!    deployment sets, mapped onto `auth_token` and `prometheus.url`
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `CO2CTL_PROMETHEUS__TIMEOUT=5s` sets the `prometheus.timeout` field.
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Shared write credential
//! AUTH_TOKEN="a-long-random-string"
//!
//! # Where aggregate queries are sent
//! PROMETHEUS_URL="http://prometheus:9090"
//!
//! # Override server port
//! CO2CTL_PORT=8080
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::auth::token::INSECURE_DEFAULT_TOKEN;
use crate::errors::Error;
use crate::sinks::SinkConfig;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "CO2CTL_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Shared bearer token required on the write endpoint
    pub auth_token: String,
    /// Time-series backend used for aggregate queries
    pub prometheus: PrometheusConfig,
    /// CORS settings; no layer is installed when `allowed_origins` is empty
    pub cors: CorsConfig,
    /// Secondary destinations that receive a copy of each accepted report
    pub sinks: Vec<SinkConfig>,
    /// Export traces over OTLP (endpoint taken from the standard `OTEL_*` variables)
    pub enable_otel_export: bool,
}

/// Connection settings for the Prometheus-compatible query API.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrometheusConfig {
    /// Base URL; `/api/v1/query` is appended
    pub url: Url,
    /// Upper bound on each query
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

/// CORS origin specification.
///
/// Can be either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://dashboard.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            auth_token: INSECURE_DEFAULT_TOKEN.to_string(),
            prometheus: PrometheusConfig::default(),
            cors: CorsConfig::default(),
            sinks: vec![],
            enable_otel_export: false,
        }
    }
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            url: Url::parse("http://localhost:9090").expect("static URL is valid"),
            timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.auth_token.trim().is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: auth_token must not be empty. Set AUTH_TOKEN or add auth_token to the config file."
                    .to_string(),
            });
        }

        if self.prometheus.timeout.is_zero() {
            return Err(Error::Internal {
                operation: "Config validation: prometheus.timeout must be greater than zero".to_string(),
            });
        }

        for sink in &self.sinks {
            sink.validate().map_err(|e| Error::Internal {
                operation: format!("Config validation: {e}"),
            })?;
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("CO2CTL_").ignore(&["CONFIG"]).split("__"))
            // Unprefixed names used by existing deployments
            .merge(Env::raw().only(&["AUTH_TOKEN"]).map(|_| "auth_token".into()))
            .merge(Env::raw().only(&["PROMETHEUS_URL"]).map(|_| "prometheus.url".into()))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
