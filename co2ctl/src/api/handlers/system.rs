//! Liveness and the counter scrape endpoint.

use axum::{
    Json,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::{AppState, errors::Error};

#[utoipa::path(
    get,
    path = "/",
    tag = "system",
    summary = "Liveness",
    responses((status = 200, description = "Service is up")),
)]
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Hello World" }))
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "system",
    summary = "Scrape emission counters",
    description = "Current values of every emission counter in the Prometheus text exposition format.",
    responses(
        (status = 200, description = "Text exposition", content_type = "text/plain; version=0.0.4"),
        (status = 500, description = "Encoding failed"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn scrape_metrics(State(state): State<AppState>) -> Result<Response, Error> {
    let body = state.ingestion.metrics().render().map_err(|e| Error::Internal {
        operation: format!("encode metrics: {e}"),
    })?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response())
}
