//! Aggregate queries over the emission counters.
//!
//! Aggregation is delegated to a Prometheus-compatible backend that scrapes `/metrics`. This
//! module turns a user and a named range into PromQL, sends it, and reshapes the answer.
//!
//! - [`range`]: the named trailing windows
//! - [`promql`]: query text construction and label quoting
//! - [`backend`]: the [`MetricsBackend`] seam and its HTTP implementation
//! - [`service`]: [`AggregationService`], the entry point used by handlers

pub mod backend;
pub mod promql;
pub mod range;
pub mod service;

pub use backend::{MetricsBackend, PrometheusBackend};
pub use range::EmissionRange;
pub use service::AggregationService;
