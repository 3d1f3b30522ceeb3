//! Shared-secret bearer authentication for the write path.
//!
//! A single token, loaded from configuration at startup, guards every write endpoint. There are
//! no per-user or per-org credentials and no rotation: changing the token means restarting the
//! process.
//!
//! # Modules
//!
//! - [`token`]: the configured [`AuthToken`] and the [`Authorized`] proof it hands out
//! - [`extractor`]: axum extractor that checks the `Authorization: Bearer <token>` header

pub mod extractor;
pub mod token;

pub use extractor::bearer_credential;
pub use token::{AuthToken, Authorized};
