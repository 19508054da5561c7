//! Master data: departments, doctors, wards, beds.
//!
//! Reference data is world-readable; only staff may edit it.

use crate::entities::{Bed, Department, Doctor, Ward};
use crate::services::{access, Bind};
use crate::{CoreError, CoreResult, Identity};
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use utoipa::IntoParams;

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(deny_unknown_fields)]
pub struct DoctorFilter {
    pub department_id: Option<i64>,
    /// Case-insensitive substring over the doctor's name
    pub q: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(deny_unknown_fields)]
pub struct WardFilter {
    pub department_id: Option<i64>,
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(deny_unknown_fields)]
pub struct BedFilter {
    pub ward_id: Option<i64>,
    pub status: Option<String>,
}

pub async fn list_departments(pool: &SqlitePool) -> CoreResult<Vec<Department>> {
    let rows = sqlx::query_as::<_, Department>("SELECT * FROM department ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn list_doctors(pool: &SqlitePool, filter: &DoctorFilter) -> CoreResult<Vec<Doctor>> {
    let mut sql = String::from("SELECT * FROM doctor WHERE 1 = 1");
    let mut binds: Vec<Bind> = Vec::new();
    if let Some(department_id) = filter.department_id {
        binds.push(Bind::Int(department_id));
        sql.push_str(&format!(" AND department_id = ?{}", binds.len()));
    }
    if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        binds.push(Bind::Text(format!("%{q}%")));
        sql.push_str(&format!(" AND full_name LIKE ?{}", binds.len()));
    }
    sql.push_str(" ORDER BY full_name");

    let mut query = sqlx::query_as::<_, Doctor>(&sql);
    for bind in binds {
        query = match bind {
            Bind::Text(text) => query.bind(text),
            Bind::Int(int) => query.bind(int),
            Bind::At(at) => query.bind(at),
        };
    }
    Ok(query.fetch_all(pool).await?)
}

pub async fn list_wards(pool: &SqlitePool, filter: &WardFilter) -> CoreResult<Vec<Ward>> {
    let mut sql = String::from("SELECT * FROM ward WHERE 1 = 1");
    let mut binds: Vec<Bind> = Vec::new();
    if let Some(department_id) = filter.department_id {
        binds.push(Bind::Int(department_id));
        sql.push_str(&format!(" AND department_id = ?{}", binds.len()));
    }
    sql.push_str(" ORDER BY name");

    let mut query = sqlx::query_as::<_, Ward>(&sql);
    for bind in binds {
        query = match bind {
            Bind::Text(text) => query.bind(text),
            Bind::Int(int) => query.bind(int),
            Bind::At(at) => query.bind(at),
        };
    }
    Ok(query.fetch_all(pool).await?)
}

pub async fn list_beds(pool: &SqlitePool, filter: &BedFilter) -> CoreResult<Vec<Bed>> {
    let mut sql = String::from("SELECT * FROM bed WHERE 1 = 1");
    let mut binds: Vec<Bind> = Vec::new();
    if let Some(ward_id) = filter.ward_id {
        binds.push(Bind::Int(ward_id));
        sql.push_str(&format!(" AND ward_id = ?{}", binds.len()));
    }
    if let Some(status) = filter.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        binds.push(Bind::Text(status.to_lowercase()));
        sql.push_str(&format!(" AND LOWER(status) = ?{}", binds.len()));
    }
    sql.push_str(" ORDER BY ward_id, code");

    let mut query = sqlx::query_as::<_, Bed>(&sql);
    for bind in binds {
        query = match bind {
            Bind::Text(text) => query.bind(text),
            Bind::Int(int) => query.bind(int),
            Bind::At(at) => query.bind(at),
        };
    }
    Ok(query.fetch_all(pool).await?)
}

pub async fn create_department(
    pool: &SqlitePool,
    identity: &Identity,
    name: &str,
    description: Option<&str>,
) -> CoreResult<Department> {
    access::require_staff(identity)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::InvalidInput("Department name is required.".into()));
    }
    let id = sqlx::query("INSERT INTO department (name, description, created_at) VALUES (?1, ?2, ?3)")
        .bind(name)
        .bind(description)
        .bind(Utc::now())
        .execute(pool)
        .await?
        .last_insert_rowid();
    let department = sqlx::query_as::<_, Department>("SELECT * FROM department WHERE id = ?1")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(department)
}

pub async fn create_ward(
    pool: &SqlitePool,
    identity: &Identity,
    department_id: Option<i64>,
    name: &str,
    floor: Option<i64>,
) -> CoreResult<Ward> {
    access::require_staff(identity)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::InvalidInput("Ward name is required.".into()));
    }
    let id = sqlx::query("INSERT INTO ward (department_id, name, floor) VALUES (?1, ?2, ?3)")
        .bind(department_id)
        .bind(name)
        .bind(floor)
        .execute(pool)
        .await?
        .last_insert_rowid();
    let ward = sqlx::query_as::<_, Ward>("SELECT * FROM ward WHERE id = ?1")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(ward)
}

pub async fn create_bed(
    pool: &SqlitePool,
    identity: &Identity,
    ward_id: i64,
    code: &str,
) -> CoreResult<Bed> {
    access::require_staff(identity)?;
    let code = code.trim();
    if code.is_empty() {
        return Err(CoreError::InvalidInput("Bed code is required.".into()));
    }
    let ward: Option<i64> = sqlx::query_scalar("SELECT id FROM ward WHERE id = ?1")
        .bind(ward_id)
        .fetch_optional(pool)
        .await?;
    if ward.is_none() {
        return Err(CoreError::NotFound("Ward not found.".into()));
    }
    let id = sqlx::query("INSERT INTO bed (ward_id, code, status) VALUES (?1, ?2, 'available')")
        .bind(ward_id)
        .bind(code)
        .execute(pool)
        .await?
        .last_insert_rowid();
    let bed = sqlx::query_as::<_, Bed>("SELECT * FROM bed WHERE id = ?1")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(bed)
}

pub async fn create_doctor(
    pool: &SqlitePool,
    identity: &Identity,
    department_id: Option<i64>,
    full_name: &str,
    qualification: Option<&str>,
    experience_years: Option<i64>,
) -> CoreResult<Doctor> {
    access::require_staff(identity)?;
    let full_name = full_name.trim();
    if full_name.is_empty() {
        return Err(CoreError::InvalidInput("Doctor name is required.".into()));
    }
    let id = sqlx::query(
        "INSERT INTO doctor (department_id, full_name, qualification, experience_years)
         VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(department_id)
    .bind(full_name)
    .bind(qualification)
    .bind(experience_years)
    .execute(pool)
    .await?
    .last_insert_rowid();
    let doctor = sqlx::query_as::<_, Doctor>("SELECT * FROM doctor WHERE id = ?1")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(doctor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{seed_user, test_pool};
    use crate::entities::AppUser;

    async fn staff(pool: &SqlitePool) -> Identity {
        let id = seed_user(pool, "s@h.test", "staff").await;
        let user: AppUser = sqlx::query_as("SELECT * FROM app_user WHERE id = ?1")
            .bind(id)
            .fetch_one(pool)
            .await
            .unwrap();
        Identity::Staff(user)
    }

    #[tokio::test]
    async fn masters_round_trip_with_filters() {
        let pool = test_pool().await;
        let staff = staff(&pool).await;

        let cardio = create_department(&pool, &staff, "Cardiology", None).await.unwrap();
        let _pedia = create_department(&pool, &staff, "Paediatrics", None).await.unwrap();
        assert_eq!(list_departments(&pool).await.unwrap().len(), 2);

        let ward = create_ward(&pool, &staff, Some(cardio.id), "CCU", Some(2)).await.unwrap();
        let wards = list_wards(&pool, &WardFilter { department_id: Some(cardio.id) })
            .await
            .unwrap();
        assert_eq!(wards.len(), 1);
        assert_eq!(wards[0].id, ward.id);

        let bed = create_bed(&pool, &staff, ward.id, "CCU-1").await.unwrap();
        assert_eq!(bed.status, "available");
        let available = list_beds(
            &pool,
            &BedFilter { ward_id: Some(ward.id), status: Some("AVAILABLE".into()) },
        )
        .await
        .unwrap();
        assert_eq!(available.len(), 1);

        create_doctor(&pool, &staff, Some(cardio.id), "Dr. Mensah", Some("MBChB"), Some(12))
            .await
            .unwrap();
        let found = list_doctors(
            &pool,
            &DoctorFilter { department_id: Some(cardio.id), q: Some("mensah".into()) },
        )
        .await
        .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn mutations_reject_non_staff_and_bad_refs() {
        let pool = test_pool().await;
        let staff_identity = staff(&pool).await;

        assert!(matches!(
            create_department(&pool, &Identity::Anonymous, "X", None).await,
            Err(CoreError::Unauthorized(_))
        ));
        assert!(matches!(
            create_bed(&pool, &staff_identity, 9999, "B-1").await,
            Err(CoreError::NotFound(_))
        ));
        assert!(matches!(
            create_ward(&pool, &staff_identity, None, "  ", None).await,
            Err(CoreError::InvalidInput(_))
        ));
    }
}
