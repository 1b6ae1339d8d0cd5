//! HTTP API handlers for vms-api

pub mod auth;
pub mod buildinfo;
pub mod health;
pub mod import;
pub mod response;
pub mod vouchers;

pub use auth::{auth_middleware, auth_routes};
pub use buildinfo::get_build_info;
pub use health::health_routes;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::AppState;

/// Build the voucher routes (authentication is layered on by the caller)
///
/// Static segments (`export`, `upload-*`) are matched before `:id`.
pub fn voucher_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/vouchers",
            get(vouchers::list_vouchers).post(vouchers::create_voucher),
        )
        .route(
            "/api/v1/vouchers/upload-csv",
            post(import::upload_csv).layer(DefaultBodyLimit::max(import::UPLOAD_BODY_LIMIT)),
        )
        .route("/api/v1/vouchers/upload-batch", post(import::upload_batch))
        .route("/api/v1/vouchers/export", get(import::export_csv))
        .route(
            "/api/v1/vouchers/:id",
            get(vouchers::get_voucher)
                .put(vouchers::update_voucher)
                .delete(vouchers::delete_voucher),
        )
}
