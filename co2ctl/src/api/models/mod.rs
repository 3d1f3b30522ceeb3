//! API request and response data models.
//!
//! The report body itself is [`crate::types::EmissionReport`]; everything here is a wrapper the
//! HTTP layer adds around it or a shape returned by the read endpoints.

pub mod emissions;
