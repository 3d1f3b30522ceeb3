//! Domain types shared by the write path, the counter registry and the sinks.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::{Error, Result};

/// Largest accepted `token_nb`: 2^53, the last integer every backend holds exactly as a float
pub const MAX_TOKEN_NB: u64 = 1 << 53;

/// One chat-completion request's estimated footprint, as sent by the reporting plugin.
///
/// Only ever lives as a request payload: accepting it turns it into counter deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EmissionReport {
    /// Identifier of the end user in the host chat application
    pub user_id: String,
    /// Estimated emission for this request, in grams of CO2
    pub co2_emission: f64,
    /// Model that served the request
    pub model: String,
    /// Approximate number of tokens exchanged
    pub token_nb: u64,
    /// Organization the host application reports for
    pub org: String,
}

impl EmissionReport {
    /// Reject values a counter cannot absorb. Counters only go up, so a negative or non-finite
    /// emission, or a token count large enough to wrap the counter, would corrupt every
    /// increase-over-range query downstream.
    pub fn validate(&self) -> Result<()> {
        if !self.co2_emission.is_finite() || self.co2_emission < 0.0 {
            return Err(Error::InvalidArgument {
                message: format!("co2_emission must be a finite, non-negative number, got {}", self.co2_emission),
            });
        }
        if self.token_nb > MAX_TOKEN_NB {
            return Err(Error::InvalidArgument {
                message: format!("token_nb must be at most {MAX_TOKEN_NB}, got {}", self.token_nb),
            });
        }
        Ok(())
    }
}
