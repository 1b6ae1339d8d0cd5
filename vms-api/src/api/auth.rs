//! Login and bearer-token middleware
//!
//! Login only checks that the credentials are well formed; there is no user
//! store. The issued token is then required on every voucher route.

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use vms_common::auth::{issue_token, verify_token};

use super::response::ApiResponse;
use crate::{ApiError, ApiResult, AppState};

const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

/// Text on both sides of a single '@'
fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

impl LoginRequest {
    fn validate(&self) -> ApiResult<()> {
        if !is_plausible_email(self.email.trim()) {
            return Err(ApiError::BadRequest("A valid email address is required".to_string()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ApiError::BadRequest(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        Ok(())
    }
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<LoginResponse>>> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    request.validate()?;

    let email = request.email.trim().to_string();
    let token = issue_token(&email, &state.jwt_secret, state.token_ttl, Utc::now())?;
    info!(email = %email, "Issued access token");

    Ok(Json(ApiResponse::success(LoginResponse {
        token,
        user: UserInfo { email },
    })))
}

/// Build authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/api/v1/auth/login", post(login))
}

/// Bearer token middleware
///
/// Verified claims are added to the request extensions for handlers.
///
/// **Note:** This is applied to protected routes only.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            warn!(path = %request.uri().path(), "Missing authorization header");
            ApiError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = header.strip_prefix("Bearer ").ok_or_else(|| {
        warn!(path = %request.uri().path(), "Authorization header is not a bearer token");
        ApiError::Unauthorized("Invalid authorization header format".to_string())
    })?;

    let claims = verify_token(token.trim(), &state.jwt_secret, Utc::now()).map_err(|e| {
        warn!(path = %request.uri().path(), reason = %e, "Rejected access token");
        ApiError::from(e)
    })?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
