//! # co2ctl: CO2 emission metrics for chat deployments
//!
//! `co2ctl` collects per-request CO2 estimates from a chat front-end plugin and answers "how much
//! did this user emit over the last day, week, month or year".
//!
//! ## Overview
//!
//! A reporting client estimates the footprint of each chat completion (see [`estimate`]) and
//! posts it to `POST /api/v1/request` with a shared bearer token. Each accepted report bumps four
//! monotonic counters, labelled by model/org and by user/org. The counters are exposed at
//! `/metrics` in the Prometheus text format.
//!
//! A Prometheus-compatible backend scrapes that endpoint and owns all history. Per-user reads
//! (`GET /api/v1/co2/user/{user_id}?range=weekly`) are translated into PromQL `increase()` queries
//! against the backend, so the service itself keeps no time series and no database.
//!
//! ## Architecture
//!
//! - [`ingest::IngestionService`] is the only writer of the counters in [`metrics`]. It also
//!   fans accepted reports out to optional [`sinks`] without waiting on them.
//! - [`query::AggregationService`] builds queries and reshapes backend answers; the backend is
//!   behind the [`query::MetricsBackend`] trait.
//! - [`auth`] holds the shared token and the [`auth::Authorized`] extractor for the write route.
//! - Everything is wired into one [`AppState`] and served by [`Application`].
//!
//! Counts are not deduplicated. A report delivered twice is counted twice.

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod estimate;
mod http_client;
pub mod ingest;
pub mod metrics;
mod openapi;
pub mod query;
pub mod sinks;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

#[cfg(test)]
mod test;

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{self, HeaderValue, Method},
    routing::{get, post},
};
use bon::Builder;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use config::Config;
pub use http_client::ensure_crypto_provider;

use crate::{
    auth::AuthToken,
    config::CorsOrigin,
    ingest::IngestionService,
    metrics::EmissionMetrics,
    openapi::ApiDoc,
    query::{AggregationService, PrometheusBackend},
};

/// Shared state handed to every handler.
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .ingestion(ingestion)
///     .aggregation(aggregation)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub ingestion: Arc<IngestionService>,
    pub aggregation: Arc<AggregationService>,
}

impl AppState {
    /// Wire the services described by `config`, with a fresh counter registry.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let registry = prometheus::Registry::new();
        let metrics = EmissionMetrics::new(&registry)?;
        let sinks = sinks::build_sinks(&config.sinks)?;
        let ingestion = IngestionService::new(AuthToken::new(&config.auth_token), metrics, sinks);

        let backend = PrometheusBackend::new(&config.prometheus)?;
        let aggregation = AggregationService::new(Arc::new(backend));

        Ok(Self::builder()
            .config(config)
            .ingestion(Arc::new(ingestion))
            .aggregation(Arc::new(aggregation))
            .build())
    }
}

/// CORS layer for the configured origins, or `None` when no origin is configured.
fn create_cors_layer(config: &Config) -> anyhow::Result<Option<CorsLayer>> {
    if config.cors.allowed_origins.is_empty() {
        return Ok(None);
    }

    // A wildcard anywhere in the list wins over the explicit origins
    let cors = if config.cors.allowed_origins.contains(&CorsOrigin::Wildcard) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                // Browsers send the bare origin, without the trailing slash `Url` adds
                origins.push(url.origin().ascii_serialization().parse::<HeaderValue>()?);
            }
        }
        CorsLayer::new().allow_origin(origins)
    };

    let mut cors = cors
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE]);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(Some(cors))
}

/// Build the application router with every endpoint and middleware.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let router = Router::new()
        .route("/", get(api::handlers::system::root))
        .route("/metrics", get(api::handlers::system::scrape_metrics))
        .route("/api/v1/request", post(api::handlers::ingest::record_emission))
        .route("/api/v1/co2/user/{user_id}", get(api::handlers::emissions::get_user_emission))
        .route(
            "/api/v1/co2/user/{user_id}/summary",
            get(api::handlers::emissions::get_user_summary),
        )
        .with_state(state.clone())
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    let router = match create_cors_layer(&state.config)? {
        Some(cors) => router.layer(cors),
        None => router,
    };

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// A configured, not yet listening, service.
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        debug!(
            bind = %config.bind_address(),
            prometheus = %config.prometheus.url,
            "Starting co2ctl"
        );

        let state = AppState::from_config(config.clone())?;
        if state.ingestion.uses_insecure_token() {
            warn!("auth_token is the default placeholder; set AUTH_TOKEN before exposing this service");
        }
        if state.config.sinks.is_empty() {
            debug!("No sinks configured");
        } else {
            info!("{} sink(s) configured", state.config.sinks.len());
        }

        let router = build_router(state)?;
        Ok(Self { router, config })
    }

    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "co2ctl listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
