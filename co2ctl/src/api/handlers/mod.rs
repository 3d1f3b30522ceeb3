//! HTTP request handlers.
//!
//! - [`ingest`]: the authenticated write endpoint
//! - [`emissions`]: per-user aggregate reads
//! - [`system`]: liveness and the counter scrape
//!
//! Handlers return [`crate::errors::Error`], which converts to a status code and a JSON
//! `{"message": ...}` body. Extractor rejections are taken as `Result`s so they go through the
//! same conversion.

pub mod emissions;
pub mod ingest;
pub mod system;
