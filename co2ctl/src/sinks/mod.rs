//! Optional secondary destinations for accepted emission reports.
//!
//! The counters are the primary record. Sinks receive a copy of every accepted report after the
//! counters have been incremented; they run off the request path and a failing sink never fails
//! the write.
//!
//! - [`nocodb`]: appends one row per report to a NocoDB table

pub mod nocodb;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::EmissionReport;

pub use nocodb::{NocoDbConfig, NocoDbSink};

/// A narrow capability: accept one report.
#[async_trait]
pub trait EmissionSink: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    async fn record(&self, report: &EmissionReport) -> anyhow::Result<()>;
}

/// Configuration entry for a sink, tagged by `type`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkConfig {
    Nocodb(NocoDbConfig),
}

impl SinkConfig {
    pub fn validate(&self) -> Result<(), String> {
        match self {
            SinkConfig::Nocodb(config) => config.validate(),
        }
    }
}

/// Instantiate every configured sink
pub fn build_sinks(configs: &[SinkConfig]) -> anyhow::Result<Vec<Arc<dyn EmissionSink>>> {
    configs
        .iter()
        .map(|config| -> anyhow::Result<Arc<dyn EmissionSink>> {
            match config {
                SinkConfig::Nocodb(nocodb) => Ok(Arc::new(NocoDbSink::new(nocodb.clone())?)),
            }
        })
        .collect()
}
