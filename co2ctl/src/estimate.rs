//! Estimation helpers for reporting clients.
//!
//! The service itself trusts whatever `co2_emission` a client sends. These functions are the
//! arithmetic clients use to produce that number from wall-clock inference time.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Power draw and grid carbon intensity of the hardware serving a model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyProfile {
    /// Average power draw while generating, in watts
    pub watts: f64,
    /// Carbon intensity of the electricity, in grams CO2 per kWh
    pub grams_co2_per_kwh: f64,
}

impl Default for EnergyProfile {
    fn default() -> Self {
        Self {
            watts: 350.0,
            grams_co2_per_kwh: 55.0,
        }
    }
}

impl EnergyProfile {
    /// Grams of CO2 for running `elapsed` at this profile, rounded to hundredths.
    pub fn estimate_grams(&self, elapsed: Duration) -> f64 {
        let kilowatts = self.watts / 1000.0;
        let hours = elapsed.as_secs_f64() / 3600.0;
        round_to_hundredths(kilowatts * hours * self.grams_co2_per_kwh)
    }
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Rough token count: one token per four characters, never less than one.
pub fn estimate_token_count<'a>(contents: impl IntoIterator<Item = &'a str>) -> u64 {
    let chars: usize = contents.into_iter().map(|c| c.chars().count()).sum();
    ((chars / 4) as u64).max(1)
}
