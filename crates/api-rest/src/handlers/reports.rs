//! Report upload, listing and download.
//!
//! Uploads are multipart: a `file` part plus form fields for the metadata.
//! The upload is authorized before the binary reaches the file store, and a
//! metadata failure after the write removes the stored object again, so the
//! store only ever holds files some report row points at. Downloads stream
//! back through the store's traversal-guarded lookup.

use crate::error::{ApiError, ApiResult};
use crate::extract::Caller;
use crate::AppState;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use healthvault_core::entities::Report;
use healthvault_core::services::reports::{self, NewReport, ReportFilter};

#[utoipa::path(
    get,
    path = "/api/reports",
    params(ReportFilter),
    responses((status = 200, description = "Reports visible to the caller", body = [Report])),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn list(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Query(filter): Query<ReportFilter>,
) -> ApiResult<Json<Vec<Report>>> {
    Ok(Json(reports::list(&state.pool, &identity, &filter).await?))
}

#[utoipa::path(
    post,
    path = "/api/reports/upload",
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Report stored", body = Report),
        (status = 400, description = "Missing file or fields"),
        (status = 403, description = "Staff access required")
    ),
    security(("bearer" = []))
)]
/// Stores a report binary and records its metadata.
///
/// Expected parts: `file` (the binary), `patient_id`, `report_type`, and
/// optionally `admission_id` and `notes`.
#[axum::debug_handler]
pub async fn upload(
    State(state): State<AppState>,
    Caller(identity): Caller,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Report>)> {
    let mut file: Option<(Vec<u8>, String, String)> = None;
    let mut patient_id: Option<i64> = None;
    let mut admission_id: Option<i64> = None;
    let mut report_type: Option<String> = None;
    let mut notes: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request(format!("malformed multipart body: {err}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("report.pdf").to_string();
                let mime = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| ApiError::bad_request(format!("failed to read file: {err}")))?;
                file = Some((bytes.to_vec(), file_name, mime));
            }
            "patient_id" => patient_id = Some(parse_field(&name, field).await?),
            "admission_id" => admission_id = Some(parse_field(&name, field).await?),
            "report_type" => report_type = Some(text_field(&name, field).await?),
            "notes" => notes = Some(text_field(&name, field).await?),
            _ => {
                return Err(ApiError::bad_request(format!("unrecognized field: {name}")));
            }
        }
    }

    let (bytes, file_name, mime_type) =
        file.ok_or_else(|| ApiError::bad_request("file part is required."))?;
    let patient_id = patient_id.ok_or_else(|| ApiError::bad_request("patient_id is required."))?;
    let report_type =
        report_type.ok_or_else(|| ApiError::bad_request("report_type is required."))?;

    // Authorize before the bytes touch disk; a rejected caller must not
    // leave anything in the store.
    reports::ensure_uploadable(&state.pool, &identity, patient_id).await?;

    let stored = state.reports.save(&bytes, &file_name)?;
    let created = reports::create(
        &state.pool,
        &identity,
        &NewReport {
            patient_id,
            admission_id,
            report_type,
            file_name,
            object_key: stored.object_key.clone(),
            mime_type,
            size_bytes: Some(stored.size_bytes as i64),
            checksum_sha256: Some(stored.checksum_sha256),
            notes,
        },
    )
    .await;
    let report = match created {
        Ok(report) => report,
        Err(err) => {
            // No metadata row, so the stored bytes are unreachable; drop them.
            if let Err(remove_err) = state.reports.remove(&stored.object_key) {
                tracing::warn!(
                    object_key = %stored.object_key,
                    "failed to remove stored file after metadata error: {remove_err}"
                );
            }
            return Err(err.into());
        }
    };
    Ok((StatusCode::CREATED, Json(report)))
}

#[utoipa::path(
    get,
    path = "/api/reports/{id}/download",
    params(("id" = i64, Path, description = "Report id")),
    responses(
        (status = 200, description = "Report binary"),
        (status = 404, description = "Not found or out of scope")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn download(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let report = reports::get(&state.pool, &identity, id).await?;
    let bytes = state.reports.open(&report.object_key)?;
    let disposition = format!("attachment; filename=\"{}\"", report.file_name.replace('"', ""));
    Ok((
        [
            (header::CONTENT_TYPE, report.mime_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

async fn text_field(name: &str, field: axum::extract::multipart::Field<'_>) -> ApiResult<String> {
    field
        .text()
        .await
        .map_err(|err| ApiError::bad_request(format!("failed to read {name}: {err}")))
}

async fn parse_field(name: &str, field: axum::extract::multipart::Field<'_>) -> ApiResult<i64> {
    let text = text_field(name, field).await?;
    text.trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("{name} must be an integer.")))
}
