//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # API Structure
//!
//! - **Write** (`POST /api/v1/request`): record one emission report, bearer token required
//! - **Read** (`GET /api/v1/co2/user/{user_id}`, `.../summary`): per-user aggregates, unauthenticated
//! - **System** (`GET /`, `GET /metrics`): liveness and the counter scrape
//!
//! All endpoints are documented with `utoipa`; the UI is served at `/docs`.

pub mod handlers;
pub mod models;
