//! Bulk upload and export endpoints

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
        Multipart, State,
    },
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;
use vms_common::VoucherCandidate;

use super::response::ApiResponse;
use super::vouchers::json_body;
use crate::services::{BatchReport, ImportReport, MAX_BATCH_SIZE};
use crate::{ApiError, ApiResult, AppState};

/// Largest accepted CSV upload
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Request body limit for the upload route (file plus multipart framing)
pub const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 64 * 1024;

const UPLOAD_FIELD: &str = "file";

fn too_large() -> ApiError {
    ApiError::BadRequest("File size exceeds 5MB".to_string())
}

/// Body-limit hits while streaming the form count as an oversized file
fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large()
    } else {
        ApiError::BadRequest(format!("Invalid multipart body: {}", e))
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchUploadRequest {
    pub vouchers: Vec<VoucherCandidate>,
}

/// POST /api/v1/vouchers/upload-csv
///
/// Expects multipart field `file` holding a `.csv` file of at most 5 MB.
pub async fn upload_csv(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ApiResponse<ImportReport>>> {
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if !file_name.ends_with(".csv") {
            return Err(ApiError::BadRequest("Only CSV files are allowed".to_string()));
        }

        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("File is required".to_string()))?;
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(too_large());
    }

    info!(file = %file_name, bytes = bytes.len(), "Received CSV upload");
    let report = state.importer.import_csv(&bytes).await?;
    Ok(Json(ApiResponse::with_message("CSV import completed", report)))
}

/// POST /api/v1/vouchers/upload-batch
pub async fn upload_batch(
    State(state): State<AppState>,
    body: Result<Json<BatchUploadRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<BatchReport>>> {
    let request = json_body(body)?;
    if request.vouchers.len() > MAX_BATCH_SIZE {
        return Err(ApiError::BadRequest(format!(
            "Batch size exceeds {}",
            MAX_BATCH_SIZE
        )));
    }

    let report = state.importer.import_batch(&request.vouchers).await?;
    Ok(Json(ApiResponse::success(report)))
}

/// GET /api/v1/vouchers/export
pub async fn export_csv(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let bytes = state.vouchers.export_csv().await?;
    Ok((
        [
            (CONTENT_TYPE, "text/csv"),
            (CONTENT_DISPOSITION, "attachment; filename=vouchers.csv"),
        ],
        bytes,
    ))
}
