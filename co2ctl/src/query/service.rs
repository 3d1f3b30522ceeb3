//! Read path: range → PromQL → backend → whole grams.

use std::{collections::BTreeMap, sync::Arc};

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    api::models::emissions::{UserEmissionData, UserEmissionResponse, UserEmissionSample, UserEmissionSummary},
    errors::{Error, Result},
    query::{EmissionRange, MetricsBackend, promql::user_emission_query},
};

#[derive(Deserialize)]
struct QueryStatus {
    status: String,
}

#[derive(Deserialize)]
struct QueryEnvelope {
    status: String,
    data: VectorData,
}

#[derive(Deserialize)]
struct VectorData {
    #[serde(rename = "resultType")]
    result_type: String,
    result: Vec<RawSample>,
}

#[derive(Deserialize)]
struct RawSample {
    metric: BTreeMap<String, String>,
    value: (f64, String),
}

/// Drop the fractional part of a backend sample value.
///
/// The backend has already rounded to hundredths, so `"12.35"` becomes `12`. Both steps are kept
/// because existing dashboards were built against exactly this output.
fn truncate_grams(raw: &str) -> Option<i64> {
    let value: f64 = raw.parse().ok()?;
    value.is_finite().then(|| value.trunc() as i64)
}

/// Answers per-user aggregate queries. Holds no mutable state.
pub struct AggregationService {
    backend: Arc<dyn MetricsBackend>,
}

impl AggregationService {
    pub fn new(backend: Arc<dyn MetricsBackend>) -> Self {
        Self { backend }
    }

    /// Parse `range` and run the aggregate for `user_id`
    pub async fn query(&self, user_id: &str, range: &str) -> Result<UserEmissionResponse> {
        let range: EmissionRange = range.parse()?;
        self.query_range(user_id, range).await
    }

    #[instrument(skip(self))]
    pub async fn query_range(&self, user_id: &str, range: EmissionRange) -> Result<UserEmissionResponse> {
        let promql = user_emission_query(user_id, range);
        debug!(%promql, "Running user emission query");
        let body = self.backend.instant_query(&promql).await?;
        parse_envelope(body)
    }

    /// All four windows at once; an empty window counts as 0 grams
    #[instrument(skip(self))]
    pub async fn summary(&self, user_id: &str) -> Result<UserEmissionSummary> {
        let (daily, weekly, monthly, yearly) = futures::try_join!(
            self.query_range(user_id, EmissionRange::Daily),
            self.query_range(user_id, EmissionRange::Weekly),
            self.query_range(user_id, EmissionRange::Monthly),
            self.query_range(user_id, EmissionRange::Yearly),
        )?;

        Ok(UserEmissionSummary {
            user_id: user_id.to_string(),
            daily: daily.grams(),
            weekly: weekly.grams(),
            monthly: monthly.grams(),
            yearly: yearly.grams(),
        })
    }
}

/// Validate the backend answer and convert its sample values to whole grams.
///
/// Anything other than a well-formed successful vector result is [`Error::QueryFailed`] with the
/// raw body attached.
fn parse_envelope(body: String) -> Result<UserEmissionResponse> {
    let succeeded = serde_json::from_str::<QueryStatus>(&body)
        .map(|s| s.status == "success")
        .unwrap_or(false);
    if !succeeded {
        return Err(Error::QueryFailed { body });
    }

    let envelope: QueryEnvelope = match serde_json::from_str(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            debug!("Unexpected query response shape: {}", e);
            return Err(Error::QueryFailed { body });
        }
    };

    let mut result = Vec::with_capacity(envelope.data.result.len());
    for sample in envelope.data.result {
        let Some(grams) = truncate_grams(&sample.value.1) else {
            return Err(Error::QueryFailed { body });
        };
        result.push(UserEmissionSample {
            metric: sample.metric,
            value: (sample.value.0, grams),
        });
    }

    Ok(UserEmissionResponse {
        status: envelope.status,
        data: UserEmissionData {
            result_type: envelope.data.result_type,
            result,
        },
    })
}
