//! Report metadata.
//!
//! The binary itself lives in the file store (`healthvault-files`); this
//! module owns the row that points at it and scopes who may reach it.

use crate::entities::Report;
use crate::services::access::{self, PatientScope};
use crate::services::patients::id_list;
use crate::services::Bind;
use crate::{CoreError, CoreResult, Identity};
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use utoipa::IntoParams;

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(deny_unknown_fields)]
pub struct ReportFilter {
    pub patient_id: Option<i64>,
    pub admission_id: Option<i64>,
    pub report_type: Option<String>,
}

/// Metadata accompanying an uploaded report file.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub patient_id: i64,
    pub admission_id: Option<i64>,
    pub report_type: String,
    pub file_name: String,
    pub object_key: String,
    pub mime_type: String,
    pub size_bytes: Option<i64>,
    pub checksum_sha256: Option<String>,
    pub notes: Option<String>,
}

/// Checks that `identity` may record a report for `patient_id`.
///
/// Callers holding bytes they have not written yet should run this first, so
/// a rejected upload never reaches the file store.
pub async fn ensure_uploadable(
    pool: &SqlitePool,
    identity: &Identity,
    patient_id: i64,
) -> CoreResult<()> {
    access::require_staff(identity)?;
    let patient: Option<i64> = sqlx::query_scalar("SELECT id FROM patient_record WHERE id = ?1")
        .bind(patient_id)
        .fetch_optional(pool)
        .await?;
    if patient.is_none() {
        return Err(CoreError::NotFound("Patient not found.".into()));
    }
    Ok(())
}

/// Records an uploaded report. Staff only; the bytes must already be in the
/// file store under `object_key`.
pub async fn create(pool: &SqlitePool, identity: &Identity, new: &NewReport) -> CoreResult<Report> {
    ensure_uploadable(pool, identity, new.patient_id).await?;
    let uploader = access::require_account(identity)?;

    let id = sqlx::query(
        "INSERT INTO report
            (patient_id, admission_id, report_type, file_name, object_key, mime_type,
             size_bytes, checksum_sha256, uploaded_by, uploaded_at, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    )
    .bind(new.patient_id)
    .bind(new.admission_id)
    .bind(new.report_type.trim())
    .bind(new.file_name.trim())
    .bind(&new.object_key)
    .bind(&new.mime_type)
    .bind(new.size_bytes)
    .bind(new.checksum_sha256.as_deref())
    .bind(uploader.id)
    .bind(Utc::now())
    .bind(new.notes.as_deref())
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!(report_id = id, patient_id = new.patient_id, "report uploaded");
    fetch_unchecked(pool, id).await
}

pub async fn list(
    pool: &SqlitePool,
    identity: &Identity,
    filter: &ReportFilter,
) -> CoreResult<Vec<Report>> {
    let scope = access::visible_patients(pool, identity).await?;
    let mut sql = String::from("SELECT * FROM report WHERE 1 = 1");
    let mut binds: Vec<Bind> = Vec::new();

    match &scope {
        PatientScope::All => {}
        PatientScope::Ids(ids) if ids.is_empty() => return Ok(Vec::new()),
        PatientScope::Ids(ids) => sql.push_str(&format!(" AND patient_id IN ({})", id_list(ids))),
    }
    if let Some(patient_id) = filter.patient_id {
        binds.push(Bind::Int(patient_id));
        sql.push_str(&format!(" AND patient_id = ?{}", binds.len()));
    }
    if let Some(admission_id) = filter.admission_id {
        binds.push(Bind::Int(admission_id));
        sql.push_str(&format!(" AND admission_id = ?{}", binds.len()));
    }
    if let Some(kind) = filter.report_type.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        binds.push(Bind::Text(kind.to_lowercase()));
        sql.push_str(&format!(" AND LOWER(report_type) = ?{}", binds.len()));
    }
    sql.push_str(" ORDER BY id DESC");

    let mut query = sqlx::query_as::<_, Report>(&sql);
    for bind in binds {
        query = match bind {
            Bind::Text(text) => query.bind(text),
            Bind::Int(int) => query.bind(int),
            Bind::At(at) => query.bind(at),
        };
    }
    Ok(query.fetch_all(pool).await?)
}

/// Fetches one report within the caller's scope, for metadata or download.
pub async fn get(pool: &SqlitePool, identity: &Identity, id: i64) -> CoreResult<Report> {
    let report = fetch_unchecked(pool, id).await?;
    let scope = access::visible_patients(pool, identity).await?;
    if !scope.permits(report.patient_id) {
        return Err(CoreError::NotFound("Report not found.".into()));
    }
    Ok(report)
}

async fn fetch_unchecked(pool: &SqlitePool, id: i64) -> CoreResult<Report> {
    let report = sqlx::query_as::<_, Report>("SELECT * FROM report WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| CoreError::NotFound("Report not found.".into()))?;
    Ok(report)
}
