use std::{fmt, str::FromStr};

use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::Error;

/// Trailing window for an aggregate query, ending at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EmissionRange {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl EmissionRange {
    pub const ALL: [EmissionRange; 4] = [Self::Daily, Self::Weekly, Self::Monthly, Self::Yearly];

    /// Lookback in PromQL duration syntax
    pub fn lookback(self) -> &'static str {
        match self {
            Self::Daily => "1d",
            Self::Weekly => "7d",
            Self::Monthly => "30d",
            Self::Yearly => "365d",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl fmt::Display for EmissionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmissionRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|range| range.as_str() == s)
            .ok_or_else(|| Error::InvalidArgument {
                message: format!("Invalid range '{s}'. Must be one of: daily, weekly, monthly, yearly"),
            })
    }
}
