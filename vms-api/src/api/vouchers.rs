//! Voucher CRUD endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use vms_common::pagination::ListQuery;
use vms_common::{Voucher, VoucherCandidate};

use super::response::ApiResponse;
use crate::services::VoucherPage;
use crate::{ApiError, ApiResult, AppState};

/// Raw listing parameters; unparseable numbers fall back to defaults
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl ListParams {
    pub fn to_query(&self) -> ApiResult<ListQuery> {
        let number = |raw: &Option<String>| raw.as_deref().and_then(|s| s.trim().parse::<i64>().ok());
        Ok(ListQuery::from_params(
            number(&self.page),
            number(&self.limit),
            self.search.clone(),
            self.sort_by.as_deref(),
            self.sort_order.as_deref(),
        )?)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GetParams {
    #[serde(default)]
    pub include_deleted: bool,
}

/// Parse the `:id` path segment
pub(crate) fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::BadRequest("Invalid voucher ID".to_string()))
}

/// Unwrap a JSON body, keeping rejections in the error envelope
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(value)| value)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

/// Unwrap query parameters, keeping rejections in the error envelope
pub(crate) fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    params
        .map(|Query(value)| value)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

/// GET /api/v1/vouchers
pub async fn list_vouchers(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ApiResponse<VoucherPage>>> {
    let query = params.to_query()?;
    let page = state.vouchers.list(&query).await?;
    Ok(Json(ApiResponse::success(page)))
}

/// GET /api/v1/vouchers/:id
pub async fn get_voucher(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: Result<Query<GetParams>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<Voucher>>> {
    let id = parse_id(&id)?;
    let params = query_params(params)?;
    let voucher = state.vouchers.get(id, params.include_deleted).await?;
    Ok(Json(ApiResponse::success(voucher)))
}

/// POST /api/v1/vouchers
pub async fn create_voucher(
    State(state): State<AppState>,
    body: Result<Json<VoucherCandidate>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Voucher>>)> {
    let candidate = json_body(body)?;
    let voucher = state.vouchers.create(&candidate).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Voucher created successfully", voucher)),
    ))
}

/// PUT /api/v1/vouchers/:id
pub async fn update_voucher(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<VoucherCandidate>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<Voucher>>> {
    let id = parse_id(&id)?;
    let candidate = json_body(body)?;
    let voucher = state.vouchers.update(id, &candidate).await?;
    Ok(Json(ApiResponse::with_message("Voucher updated successfully", voucher)))
}

/// DELETE /api/v1/vouchers/:id
pub async fn delete_voucher(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let id = parse_id(&id)?;
    state.vouchers.delete(id).await?;
    Ok(Json(ApiResponse::message("Voucher deleted successfully")))
}
