//! OpenAPI document for the service, served with the Scalar UI at `/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::{
    api::{self, models::emissions},
    query::EmissionRange,
    types::EmissionReport,
};

/// Bearer scheme used by the write endpoint.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some(
                            "Shared write token. Include it in the `Authorization` header:\n\n\
                            ```\nAuthorization: Bearer YOUR_TOKEN\n```",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::ingest::record_emission,
        api::handlers::emissions::get_user_emission,
        api::handlers::emissions::get_user_summary,
        api::handlers::system::root,
        api::handlers::system::scrape_metrics,
    ),
    components(schemas(
        EmissionReport,
        EmissionRange,
        emissions::RecordResponse,
        emissions::UserEmissionResponse,
        emissions::UserEmissionData,
        emissions::UserEmissionSample,
        emissions::UserEmissionSummary,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "emissions", description = "Record and query per-request CO2 estimates"),
        (name = "system", description = "Liveness and metrics scrape"),
    ),
    info(
        title = "co2ctl",
        description = "Ingests per-request CO2 estimates as counters and answers per-user aggregates.",
    )
)]
pub struct ApiDoc;
