//! Health check endpoint

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::persona;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub name: &'static str,
    pub version: &'static str,
}

/// Build health router
pub fn router() -> Router {
    Router::new().route("/", get(health))
}

/// Liveness probe
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "running",
        name: persona::NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}
