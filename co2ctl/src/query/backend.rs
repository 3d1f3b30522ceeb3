//! Access to the time-series backend's HTTP query API.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use crate::{
    config::PrometheusConfig,
    errors::{Error, Result},
    http_client::{build_client, ensure_slash},
};

/// A backend that can evaluate an instant query.
///
/// Implementations return the raw body of a 2xx answer so the caller can decide whether the
/// query itself succeeded and keep the original text for diagnostics. Transport problems
/// (connect failure, timeout, non-2xx status) are [`Error::BackendUnavailable`].
#[async_trait]
pub trait MetricsBackend: Send + Sync {
    async fn instant_query(&self, promql: &str) -> Result<String>;
}

/// Prometheus-compatible `GET /api/v1/query` client.
pub struct PrometheusBackend {
    client: Client,
    query_url: Url,
    timeout: Duration,
}

impl PrometheusBackend {
    pub fn new(config: &PrometheusConfig) -> anyhow::Result<Self> {
        let query_url = ensure_slash(&config.url)
            .join("api/v1/query")
            .context("Failed to construct Prometheus query URL")?;
        Ok(Self {
            client: build_client(config.timeout)?,
            query_url,
            timeout: config.timeout,
        })
    }

    fn unavailable(&self, err: reqwest::Error) -> Error {
        let message = if err.is_timeout() {
            format!("request timed out after {:?}: {}", self.timeout, err)
        } else {
            err.to_string()
        };
        Error::BackendUnavailable { message }
    }
}

#[async_trait]
impl MetricsBackend for PrometheusBackend {
    #[instrument(skip(self))]
    async fn instant_query(&self, promql: &str) -> Result<String> {
        let mut url = self.query_url.clone();
        url.query_pairs_mut().append_pair("query", promql);
        debug!("Querying metrics backend at {}", self.query_url);

        let response = self.client.get(url).send().await.map_err(|e| self.unavailable(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::BackendUnavailable {
                message: format!("{status} - {body}"),
            });
        }

        response.text().await.map_err(|e| self.unavailable(e))
    }
}
