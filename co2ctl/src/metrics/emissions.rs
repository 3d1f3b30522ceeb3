//! The four emission series and their label schemas.
//!
//! - `requests_by_model{model,org}`: number of accepted reports
//! - `co2_emission_by_user{user_id,org}`: grams of CO2
//! - `co2_emission_by_model{model,org}`: grams of CO2
//! - `token_count_by_model{model,org}`: tokens

use prometheus::{CounterVec, Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::instrument;

use crate::types::EmissionReport;

pub const REQUESTS_BY_MODEL: &str = "requests_by_model";
pub const CO2_EMISSION_BY_USER: &str = "co2_emission_by_user";
pub const CO2_EMISSION_BY_MODEL: &str = "co2_emission_by_model";
pub const TOKEN_COUNT_BY_MODEL: &str = "token_count_by_model";

const MODEL_LABELS: [&str; 2] = ["model", "org"];
const USER_LABELS: [&str; 2] = ["user_id", "org"];

/// Declared label order of a family, used when writing the exposition
fn declared_labels(family: &str) -> &'static [&'static str] {
    if family == CO2_EMISSION_BY_USER {
        &USER_LABELS
    } else {
        &MODEL_LABELS
    }
}

/// Emission counters registered in a Prometheus registry.
///
/// Each counter is lock-free and atomic per series, so concurrent reports for the same label set
/// never lose an update and a concurrent scrape sees either the old or the new value of a series.
#[derive(Clone)]
pub struct EmissionMetrics {
    requests_by_model: IntCounterVec,
    co2_emission_by_user: CounterVec,
    co2_emission_by_model: CounterVec,
    token_count_by_model: IntCounterVec,
    registry: Registry,
}

impl EmissionMetrics {
    /// Create the emission counters and register them with `registry`
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let requests_by_model = IntCounterVec::new(
            Opts::new(REQUESTS_BY_MODEL, "Number of requests by model"),
            &MODEL_LABELS,
        )?;
        registry.register(Box::new(requests_by_model.clone()))?;

        let co2_emission_by_user = CounterVec::new(
            Opts::new(CO2_EMISSION_BY_USER, "Total CO2 emission by user"),
            &USER_LABELS,
        )?;
        registry.register(Box::new(co2_emission_by_user.clone()))?;

        let co2_emission_by_model = CounterVec::new(
            Opts::new(CO2_EMISSION_BY_MODEL, "Total CO2 emission by model"),
            &MODEL_LABELS,
        )?;
        registry.register(Box::new(co2_emission_by_model.clone()))?;

        let token_count_by_model = IntCounterVec::new(
            Opts::new(TOKEN_COUNT_BY_MODEL, "Total token count by model"),
            &MODEL_LABELS,
        )?;
        registry.register(Box::new(token_count_by_model.clone()))?;

        Ok(Self {
            requests_by_model,
            co2_emission_by_user,
            co2_emission_by_model,
            token_count_by_model,
            registry: registry.clone(),
        })
    }

    /// Apply one report's deltas to the four series. The report must already be validated.
    #[instrument(skip_all)]
    pub fn record(&self, report: &EmissionReport) {
        let model_labels = [report.model.as_str(), report.org.as_str()];
        let user_labels = [report.user_id.as_str(), report.org.as_str()];

        self.requests_by_model.with_label_values(&model_labels).inc();
        self.co2_emission_by_user
            .with_label_values(&user_labels)
            .inc_by(report.co2_emission);
        self.co2_emission_by_model
            .with_label_values(&model_labels)
            .inc_by(report.co2_emission);
        self.token_count_by_model
            .with_label_values(&model_labels)
            .inc_by(report.token_nb);
    }

    /// Render every registered family in the text exposition format.
    ///
    /// The registry stores label pairs sorted by name; they are put back in declared order
    /// (`{user_id,org}`, `{model,org}`) before encoding.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut families = self.registry.gather();
        for family in &mut families {
            let order = declared_labels(family.name());
            for metric in family.mut_metric() {
                let mut labels = metric.take_label();
                labels.sort_by_key(|pair| order.iter().position(|name| *name == pair.name()).unwrap_or(usize::MAX));
                metric.set_label(labels);
            }
        }
        let mut buffer = vec![];
        encoder.encode(&families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("exposition is not valid UTF-8: {e}")))
    }
}
