//! HTTP handler for the authenticated write endpoint.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use crate::{
    AppState,
    api::models::emissions::RecordResponse,
    auth::Authorized,
    errors::Result,
    types::EmissionReport,
};

#[utoipa::path(
    post,
    path = "/api/v1/request",
    tag = "emissions",
    summary = "Record an emission report",
    description = "Adds one request's estimated CO2, token count and request count to the emission counters.

Reports are not deduplicated: sending the same report twice counts it twice.",
    request_body = EmissionReport,
    responses(
        (status = 200, description = "Report accepted and counted", body = RecordResponse),
        (status = 400, description = "Malformed body or invalid field value"),
        (status = 401, description = "Missing or wrong bearer token"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn record_emission(
    State(state): State<AppState>,
    authorized: Authorized,
    payload: std::result::Result<Json<EmissionReport>, JsonRejection>,
) -> Result<Json<RecordResponse>> {
    let Json(report) = payload?;
    state.ingestion.record_authorized(authorized, &report)?;
    Ok(Json(RecordResponse::received(report)))
}
