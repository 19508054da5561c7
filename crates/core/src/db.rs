//! Database connection handling.
//!
//! The relational schema is externally owned: production deployments point the
//! pool at an existing database. [`apply_schema`] mirrors that schema for
//! tests and for local development bootstrap (`HEALTHVAULT_BOOTSTRAP_SCHEMA=1`)
//! and is written as `CREATE TABLE IF NOT EXISTS` so it is safe to re-run.

use crate::CoreResult;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::info;

/// Opens a connection pool against `database_url`.
pub async fn connect(database_url: &str) -> CoreResult<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect(database_url)
        .await?;

    // The canteen order items cascade on order deletion.
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    info!("database pool opened for {}", database_url);
    Ok(pool)
}

/// Creates the healthvault tables when they do not yet exist.
pub async fn apply_schema(pool: &SqlitePool) -> CoreResult<()> {
    let statements = [
        "CREATE TABLE IF NOT EXISTS department (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT,
            created_at TEXT NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS ward (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            department_id INTEGER,
            name TEXT NOT NULL,
            floor INTEGER,
            notes TEXT
        )",
        "CREATE TABLE IF NOT EXISTS bed (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ward_id INTEGER NOT NULL,
            code TEXT NOT NULL,
            status TEXT NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS doctor (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            department_id INTEGER,
            full_name TEXT NOT NULL,
            qualification TEXT,
            experience_years INTEGER
        )",
        "CREATE TABLE IF NOT EXISTS patient_record (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            mrn TEXT NOT NULL UNIQUE,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            sex TEXT,
            dob TEXT,
            blood_group TEXT,
            allergies TEXT,
            address TEXT,
            created_at TEXT NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS admission (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            patient_id INTEGER NOT NULL,
            ward_id INTEGER NOT NULL,
            bed_id INTEGER NOT NULL,
            doctor_id INTEGER,
            admit_time TEXT NOT NULL,
            discharge_time TEXT,
            status TEXT NOT NULL,
            notes TEXT
        )",
        "CREATE TABLE IF NOT EXISTS admission_task (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            admission_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            details TEXT,
            due_date TEXT,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS report (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            patient_id INTEGER NOT NULL,
            admission_id INTEGER,
            report_type TEXT NOT NULL,
            file_name TEXT NOT NULL,
            object_key TEXT NOT NULL,
            mime_type TEXT NOT NULL,
            size_bytes INTEGER,
            checksum_sha256 TEXT,
            uploaded_by INTEGER NOT NULL,
            uploaded_at TEXT NOT NULL,
            notes TEXT
        )",
        "CREATE TABLE IF NOT EXISTS booking (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            patient_id INTEGER,
            booking_type TEXT NOT NULL,
            department_id INTEGER,
            doctor_id INTEGER,
            slot_date TEXT NOT NULL,
            slot_time TEXT NOT NULL,
            status TEXT NOT NULL,
            notes TEXT,
            created_at TEXT NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS app_user (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT,
            phone TEXT,
            username TEXT,
            password_hash TEXT,
            role TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS complaint (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            patient_id INTEGER NOT NULL,
            admission_id INTEGER,
            ward_id INTEGER,
            bed_id INTEGER,
            category TEXT,
            description TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'open',
            created_at TEXT,
            resolved_at TEXT
        )",
        "CREATE TABLE IF NOT EXISTS notification (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_by INTEGER NOT NULL,
            target_user_id INTEGER,
            title TEXT NOT NULL,
            message TEXT NOT NULL,
            channels TEXT NOT NULL DEFAULT 'in_app',
            created_at TEXT NOT NULL,
            read_at TEXT
        )",
        "CREATE TABLE IF NOT EXISTS menu_item (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT 'meal',
            price_cents INTEGER NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        )",
        "CREATE TABLE IF NOT EXISTS canteen_order (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            patient_id INTEGER,
            status TEXT NOT NULL DEFAULT 'pending',
            total_cents INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            paid_at TEXT
        )",
        "CREATE TABLE IF NOT EXISTS canteen_order_item (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_id INTEGER NOT NULL REFERENCES canteen_order(id) ON DELETE CASCADE,
            menu_item_id INTEGER NOT NULL,
            qty INTEGER NOT NULL,
            price_cents INTEGER NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS otp_code (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            destination TEXT NOT NULL,
            purpose TEXT NOT NULL,
            code_hash TEXT NOT NULL,
            salt TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            consumed_at TEXT
        )",
        "CREATE TABLE IF NOT EXISTS patient_access (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            patient_id INTEGER NOT NULL,
            relationship TEXT,
            UNIQUE (user_id, patient_id)
        )",
        "CREATE TABLE IF NOT EXISTS medical_order (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            admission_id INTEGER NOT NULL,
            created_by INTEGER NOT NULL,
            order_type TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL,
            payload_json TEXT
        )",
    ];

    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }

    Ok(())
}
