//! Wire types for the write endpoint and the per-user aggregate endpoints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::types::EmissionReport;

/// Acknowledgement for an accepted report
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecordResponse {
    /// Always `"request received"`
    pub status: String,
    /// Echo of the accepted report
    pub data: EmissionReport,
}

impl RecordResponse {
    pub fn received(data: EmissionReport) -> Self {
        Self {
            status: "request received".to_string(),
            data,
        }
    }
}

/// Query parameters for the per-user aggregate
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RangeParams {
    /// One of `daily`, `weekly`, `monthly`, `yearly`
    pub range: Option<String>,
}

/// Backend-shaped result envelope with values truncated to whole grams.
///
/// Mirrors the Prometheus instant-query response so existing consumers keep reading
/// `data.result[0].value[1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserEmissionResponse {
    pub status: String,
    pub data: UserEmissionData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserEmissionData {
    #[serde(rename = "resultType")]
    pub result_type: String,
    pub result: Vec<UserEmissionSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserEmissionSample {
    /// Labels of the aggregated series (`user_id`)
    pub metric: BTreeMap<String, String>,
    /// `[evaluation timestamp, grams]`
    #[schema(value_type = Vec<f64>)]
    pub value: (f64, i64),
}

impl UserEmissionResponse {
    /// Grams of the first series, 0 when the user has no data in the window
    pub fn grams(&self) -> i64 {
        self.data.result.first().map(|sample| sample.value.1).unwrap_or(0)
    }
}

/// All four windows for one user, in whole grams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserEmissionSummary {
    pub user_id: String,
    pub daily: i64,
    pub weekly: i64,
    pub monthly: i64,
    pub yearly: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_serializes_in_backend_shape() {
        let response = UserEmissionResponse {
            status: "success".to_string(),
            data: UserEmissionData {
                result_type: "vector".to_string(),
                result: vec![UserEmissionSample {
                    metric: BTreeMap::from([("user_id".to_string(), "u1".to_string())]),
                    value: (1712345678.5, 12),
                }],
            },
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "success",
                "data": {
                    "resultType": "vector",
                    "result": [{ "metric": { "user_id": "u1" }, "value": [1712345678.5, 12] }]
                }
            })
        );
        assert_eq!(response.grams(), 12);
    }

    #[test]
    fn test_grams_defaults_to_zero_without_samples() {
        let response = UserEmissionResponse {
            status: "success".to_string(),
            data: UserEmissionData {
                result_type: "vector".to_string(),
                result: vec![],
            },
        };
        assert_eq!(response.grams(), 0);
    }
}
