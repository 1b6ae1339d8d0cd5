//! vms-api library - voucher management HTTP service
//!
//! Token-gated REST API over the voucher store: CRUD, paged listing,
//! CSV/JSON bulk import and CSV export.

use axum::Router;
use chrono::Duration;
use std::sync::Arc;
use vms_common::VoucherRepository;

pub mod api;
pub mod error;
pub mod services;

pub use error::{ApiError, ApiResult};

use services::{BatchImporter, VoucherService};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub vouchers: Arc<VoucherService>,
    pub importer: Arc<BatchImporter>,
    /// HMAC key for access tokens
    pub jwt_secret: Arc<str>,
    /// Lifetime of issued access tokens
    pub token_ttl: Duration,
}

impl AppState {
    /// Create new application state around a voucher repository
    pub fn new(repo: Arc<dyn VoucherRepository>, jwt_secret: &str, token_ttl: Duration) -> Self {
        Self {
            vouchers: Arc::new(VoucherService::new(Arc::clone(&repo))),
            importer: Arc::new(BatchImporter::new(repo)),
            jwt_secret: Arc::from(jwt_secret),
            token_ttl,
        }
    }
}

/// Build application router
///
/// `/health`, build info and login are public; everything under `/api/v1/vouchers`
/// requires a bearer token.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::get;

    // Protected routes (require authentication)
    let protected = api::voucher_routes().layer(middleware::from_fn_with_state(
        state.clone(),
        api::auth_middleware,
    ));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/api/v1/buildinfo", get(api::get_build_info))
        .merge(api::health_routes())
        .merge(api::auth_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .with_state(state)
}
