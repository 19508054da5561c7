//! # Healthvault REST API
//!
//! HTTP surface for the hospital operations backend.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, multipart uploads)
//!
//! All domain logic lives in `healthvault-core`; handlers translate between
//! the wire and the service layer and nothing else.

#![warn(rust_2018_idioms)]

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use healthvault_core::services::{
    admissions, bookings, canteen, complaints, medical_orders, notifications, patients,
};
use healthvault_core::{entities, CoreConfig};
use healthvault_files::ReportStore;

pub mod dto;
mod error;
mod extract;
mod handlers;

pub use error::{ApiError, ApiResult};

/// Shared per-request state.
///
/// Cloned into every handler; the pool and store are internally reference
/// counted so clones are cheap.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub cfg: Arc<CoreConfig>,
    pub reports: ReportStore,
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        handlers::otp::send,
        handlers::otp::verify,
        handlers::auth::signup_verify,
        handlers::auth::login_otp,
        handlers::auth::login_password,
        handlers::auth::staff_login,
        handlers::auth::me,
        handlers::auth::staff_me,
        handlers::patients::list,
        handlers::patients::get,
        handlers::patients::create,
        handlers::admissions::list,
        handlers::admissions::get,
        handlers::admissions::create,
        handlers::admissions::discharge,
        handlers::admissions::list_tasks,
        handlers::admissions::create_task,
        handlers::admissions::update_task,
        handlers::masters::departments,
        handlers::masters::create_department,
        handlers::masters::doctors,
        handlers::masters::create_doctor,
        handlers::masters::wards,
        handlers::masters::create_ward,
        handlers::masters::beds,
        handlers::masters::create_bed,
        handlers::bookings::slots,
        handlers::bookings::list,
        handlers::bookings::create,
        handlers::bookings::cancel,
        handlers::canteen::menu,
        handlers::canteen::list,
        handlers::canteen::create,
        handlers::canteen::get,
        handlers::canteen::add_item,
        handlers::canteen::update_item,
        handlers::canteen::delete_item,
        handlers::canteen::update_item_by_id,
        handlers::canteen::delete_item_by_id,
        handlers::canteen::mark_paid,
        handlers::reports::list,
        handlers::reports::upload,
        handlers::reports::download,
        handlers::complaints::list,
        handlers::complaints::my,
        handlers::complaints::create,
        handlers::complaints::update_status,
        handlers::notifications::list,
        handlers::notifications::create,
        handlers::notifications::mark_read,
        handlers::access::list,
        handlers::access::grant,
        handlers::access::revoke,
        handlers::medical_orders::list,
        handlers::medical_orders::create,
        handlers::medical_orders::update_status,
    ),
    components(schemas(
        dto::HealthRes,
        dto::OtpSendReq,
        dto::OtpSendRes,
        dto::OtpVerifyReq,
        dto::OtpVerifyRes,
        dto::SignupVerifyReq,
        dto::OtpLoginReq,
        dto::PasswordLoginReq,
        dto::StaffLoginReq,
        dto::AuthRes,
        dto::SlotsRes,
        dto::CreateOrderReq,
        dto::AddItemReq,
        dto::UpdateItemReq,
        dto::StatusReq,
        dto::GrantReq,
        dto::DepartmentReq,
        dto::WardReq,
        dto::BedReq,
        dto::DoctorReq,
        entities::AppUser,
        entities::PatientRecord,
        entities::Admission,
        entities::AdmissionTask,
        entities::Department,
        entities::Ward,
        entities::Bed,
        entities::Doctor,
        entities::Booking,
        entities::MenuItem,
        entities::CanteenOrder,
        entities::CanteenOrderItem,
        entities::Report,
        entities::Complaint,
        entities::Notification,
        entities::MedicalOrder,
        entities::PatientAccess,
        patients::NewPatient,
        admissions::NewAdmission,
        admissions::NewTask,
        bookings::NewBooking,
        canteen::OrderView,
        complaints::NewComplaint,
        notifications::NewNotification,
        medical_orders::NewMedicalOrder,
    )),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = dto::HealthRes)
    )
)]
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<dto::HealthRes> {
    Json(dto::HealthRes {
        ok: true,
        message: "Healthvault REST API is alive".into(),
    })
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/otp/send", post(handlers::otp::send))
        .route("/api/otp/verify", post(handlers::otp::verify))
        .route(
            "/api/app/auth/signup-verify",
            post(handlers::auth::signup_verify),
        )
        .route("/api/app/auth/login", post(handlers::auth::login_otp))
        .route(
            "/api/app/auth/login-password",
            post(handlers::auth::login_password),
        )
        .route("/api/app/auth/me", get(handlers::auth::me))
        .route("/api/auth/login", post(handlers::auth::staff_login))
        .route("/api/auth/me", get(handlers::auth::staff_me))
        .route(
            "/api/patients",
            get(handlers::patients::list).post(handlers::patients::create),
        )
        .route("/api/patients/:id", get(handlers::patients::get))
        .route(
            "/api/admissions",
            get(handlers::admissions::list).post(handlers::admissions::create),
        )
        .route("/api/admissions/:id", get(handlers::admissions::get))
        .route(
            "/api/admissions/:id/discharge",
            post(handlers::admissions::discharge),
        )
        .route(
            "/api/admissions/:id/tasks",
            get(handlers::admissions::list_tasks).post(handlers::admissions::create_task),
        )
        .route(
            "/api/admission-tasks/:id",
            put(handlers::admissions::update_task),
        )
        .route(
            "/api/departments",
            get(handlers::masters::departments).post(handlers::masters::create_department),
        )
        .route(
            "/api/doctors",
            get(handlers::masters::doctors).post(handlers::masters::create_doctor),
        )
        .route(
            "/api/wards",
            get(handlers::masters::wards).post(handlers::masters::create_ward),
        )
        .route(
            "/api/beds",
            get(handlers::masters::beds).post(handlers::masters::create_bed),
        )
        .route("/api/slots", get(handlers::bookings::slots))
        .route(
            "/api/bookings",
            get(handlers::bookings::list).post(handlers::bookings::create),
        )
        .route(
            "/api/bookings/:id/cancel",
            post(handlers::bookings::cancel),
        )
        .route("/api/menu", get(handlers::canteen::menu))
        .route(
            "/api/canteen-orders",
            get(handlers::canteen::list).post(handlers::canteen::create),
        )
        .route("/api/canteen-orders/:id", get(handlers::canteen::get))
        .route(
            "/api/canteen-orders/:id/add-item",
            post(handlers::canteen::add_item),
        )
        .route(
            "/api/canteen-orders/:id/items/:item_id",
            put(handlers::canteen::update_item).delete(handlers::canteen::delete_item),
        )
        .route(
            "/api/canteen-orders/:id/mark-paid",
            post(handlers::canteen::mark_paid),
        )
        .route(
            "/api/canteen-order-items/:item_id",
            put(handlers::canteen::update_item_by_id).delete(handlers::canteen::delete_item_by_id),
        )
        .route("/api/reports", get(handlers::reports::list))
        .route("/api/reports/upload", post(handlers::reports::upload))
        .route(
            "/api/reports/:id/download",
            get(handlers::reports::download),
        )
        .route(
            "/api/complaints",
            get(handlers::complaints::list).post(handlers::complaints::create),
        )
        .route("/api/complaints/my", get(handlers::complaints::my))
        .route(
            "/api/complaints/:id/status",
            put(handlers::complaints::update_status),
        )
        .route(
            "/api/notifications",
            get(handlers::notifications::list).post(handlers::notifications::create),
        )
        .route(
            "/api/notifications/:id/mark-read",
            post(handlers::notifications::mark_read),
        )
        .route(
            "/api/patient-access",
            get(handlers::access::list)
                .post(handlers::access::grant)
                .delete(handlers::access::revoke),
        )
        .route(
            "/api/medical-orders",
            get(handlers::medical_orders::list).post(handlers::medical_orders::create),
        )
        .route(
            "/api/medical-orders/:id",
            put(handlers::medical_orders::update_status),
        )
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
