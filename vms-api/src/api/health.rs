//! Liveness endpoint for load balancers

use axum::{routing::get, Json, Router};
use serde::Serialize;

use super::buildinfo::BuildInfo;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
}

/// GET /health, public
pub async fn health_check() -> Json<Health> {
    let build = BuildInfo::current();
    Json(Health {
        status: "ok",
        module: build.module,
        version: build.version,
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
