//! Row-store sink writing to a NocoDB table through its v2 records API.

use std::time::Duration;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::{
    http_client::{build_client, ensure_slash},
    sinks::EmissionSink,
    types::EmissionReport,
};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NocoDbConfig {
    /// Base URL of the NocoDB instance
    pub url: Url,
    /// API token sent as `xc-token`
    pub token: String,
    /// Target table identifier
    pub table_id: String,
    /// Per-request timeout
    #[serde(with = "humantime_serde", default = "NocoDbConfig::default_timeout")]
    pub timeout: Duration,
}

impl NocoDbConfig {
    fn default_timeout() -> Duration {
        Duration::from_secs(10)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.token.trim().is_empty() {
            return Err("nocodb sink: token must not be empty".to_string());
        }
        if self.table_id.trim().is_empty() {
            return Err("nocodb sink: table_id must not be empty".to_string());
        }
        if self.timeout.is_zero() {
            return Err("nocodb sink: timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// The row shape the dashboard reads back: who, how much, when.
#[derive(Debug, Serialize)]
struct EmissionRow<'a> {
    user: &'a str,
    co2: f64,
    date: String,
}

pub struct NocoDbSink {
    client: Client,
    records_url: Url,
    token: String,
}

impl NocoDbSink {
    pub fn new(config: NocoDbConfig) -> anyhow::Result<Self> {
        let records_url = ensure_slash(&config.url)
            .join(&format!("api/v2/tables/{}/records", config.table_id))
            .context("Failed to construct NocoDB records URL")?;
        Ok(Self {
            client: build_client(config.timeout)?,
            records_url,
            token: config.token,
        })
    }
}

#[async_trait]
impl EmissionSink for NocoDbSink {
    fn name(&self) -> &str {
        "nocodb"
    }

    #[instrument(skip_all, fields(user_id = %report.user_id))]
    async fn record(&self, report: &EmissionReport) -> anyhow::Result<()> {
        let row = EmissionRow {
            user: &report.user_id,
            co2: report.co2_emission,
            date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        let response = self
            .client
            .post(self.records_url.clone())
            .header("xc-token", &self.token)
            .json(&row)
            .send()
            .await
            .context("NocoDB request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("NocoDB API error: {} - {}", status, body));
        }

        debug!("Row appended to NocoDB table");
        Ok(())
    }
}
