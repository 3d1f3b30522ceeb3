//! Emission counters exposed for pull-based scraping.
//!
//! The counter registry is an explicitly owned value: the ingestion service holds it and the
//! `/metrics` handler renders it. Nothing here is a process-wide global.

mod emissions;

pub use emissions::{
    CO2_EMISSION_BY_MODEL, CO2_EMISSION_BY_USER, EmissionMetrics, REQUESTS_BY_MODEL, TOKEN_COUNT_BY_MODEL,
};
