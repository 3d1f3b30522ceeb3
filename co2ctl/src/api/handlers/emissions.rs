//! HTTP handlers for per-user aggregate reads.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
};

use crate::{
    AppState,
    api::models::emissions::{RangeParams, UserEmissionResponse, UserEmissionSummary},
    errors::{Error, Result},
};

#[utoipa::path(
    get,
    path = "/api/v1/co2/user/{user_id}",
    tag = "emissions",
    summary = "Get a user's emissions",
    description = "Total grams of CO2 attributed to the user over a trailing window, summed across orgs.

The backend rounds the total to hundredths and the value is then truncated to whole grams.",
    params(
        ("user_id" = String, Path, description = "User identifier as sent in reports"),
        RangeParams,
    ),
    responses(
        (status = 200, description = "Aggregate in the backend's result envelope", body = UserEmissionResponse),
        (status = 400, description = "Missing or unknown range"),
        (status = 500, description = "Metrics backend unavailable or query failed"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_user_emission(
    State(state): State<AppState>,
    user_id: std::result::Result<Path<String>, PathRejection>,
    params: std::result::Result<Query<RangeParams>, QueryRejection>,
) -> Result<Json<UserEmissionResponse>> {
    let Path(user_id) = user_id?;
    let Query(params) = params?;
    let range = params.range.ok_or_else(|| Error::InvalidArgument {
        message: "Missing required query parameter 'range'. Must be one of: daily, weekly, monthly, yearly".to_string(),
    })?;

    let response = state.aggregation.query(&user_id, &range).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/co2/user/{user_id}/summary",
    tag = "emissions",
    summary = "Get a user's emissions for every window",
    description = "Daily, weekly, monthly and yearly totals in whole grams. A window without data counts as 0.",
    params(
        ("user_id" = String, Path, description = "User identifier as sent in reports"),
    ),
    responses(
        (status = 200, description = "All four totals", body = UserEmissionSummary),
        (status = 500, description = "Metrics backend unavailable or query failed"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_user_summary(
    State(state): State<AppState>,
    user_id: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<UserEmissionSummary>> {
    let Path(user_id) = user_id?;
    let summary = state.aggregation.summary(&user_id).await?;
    Ok(Json(summary))
}
