//! Write path: authenticate, validate, increment, fan out.
//!
//! Reports are not deduplicated. A retried report is counted twice; callers that need
//! at-most-once semantics must not retry.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::{
    auth::{AuthToken, Authorized},
    errors::Result,
    metrics::EmissionMetrics,
    sinks::EmissionSink,
    types::EmissionReport,
};

/// Sole owner of the write path to the emission counters.
pub struct IngestionService {
    auth: AuthToken,
    metrics: EmissionMetrics,
    sinks: Vec<Arc<dyn EmissionSink>>,
}

impl IngestionService {
    pub fn new(auth: AuthToken, metrics: EmissionMetrics, sinks: Vec<Arc<dyn EmissionSink>>) -> Self {
        Self { auth, metrics, sinks }
    }

    pub fn metrics(&self) -> &EmissionMetrics {
        &self.metrics
    }

    /// Whether writes are guarded by the shipped placeholder token
    pub fn uses_insecure_token(&self) -> bool {
        self.auth.is_insecure_default()
    }

    pub fn authenticate(&self, credential: Option<&str>) -> Result<Authorized> {
        self.auth.verify(credential)
    }

    /// Check `credential` and record `report`.
    ///
    /// On any error nothing has been incremented and no sink has been called.
    pub fn record(&self, report: &EmissionReport, credential: Option<&str>) -> Result<()> {
        let authorized = self.authenticate(credential)?;
        self.record_authorized(authorized, report)
    }

    /// Record a report for a caller that already passed [`IngestionService::authenticate`].
    #[instrument(skip_all, fields(user_id = %report.user_id, model = %report.model, org = %report.org))]
    pub fn record_authorized(&self, _authorized: Authorized, report: &EmissionReport) -> Result<()> {
        report.validate()?;
        self.metrics.record(report);
        debug!(co2_emission = report.co2_emission, token_nb = report.token_nb, "Emission report recorded");
        self.dispatch_to_sinks(report);
        Ok(())
    }

    /// Hand the report to every sink on its own task; the caller never waits on sink I/O.
    fn dispatch_to_sinks(&self, report: &EmissionReport) {
        for sink in &self.sinks {
            let sink = Arc::clone(sink);
            let report = report.clone();
            tokio::spawn(async move {
                if let Err(e) = sink.record(&report).await {
                    warn!(sink = sink.name(), user_id = %report.user_id, "Failed to deliver emission report to sink: {:#}", e);
                }
            });
        }
    }
}
