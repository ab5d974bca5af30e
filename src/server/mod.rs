//! HTTP surface: one resource per entity type under `/api`, plus `/health`.

mod alerts;
mod error;
mod resource;

pub use alerts::Alerts;
pub use error::ApiError;
pub use resource::{MERGE_PATCH_JSON, NDJSON};

use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::service::Services;

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router(services: &Services, app_name: &str) -> Router {
    let alerts = Alerts::new(app_name);

    let api = Router::new()
        .merge(resource::routes(Arc::clone(&services.recipes), alerts.clone()))
        .merge(resource::routes(Arc::clone(&services.ingredients), alerts.clone()))
        .merge(resource::routes(Arc::clone(&services.steps), alerts.clone()))
        .merge(resource::routes(Arc::clone(&services.techniques), alerts));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
}
