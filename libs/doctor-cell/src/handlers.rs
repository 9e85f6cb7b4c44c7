use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use auth_cell::services::gate::require_role;
use shared_models::auth::{AuthUser, Role};
use shared_models::error::AppError;
use shared_store::AppContext;

use crate::models::{
    AvailabilityQuery, CreateDoctorRequest, DoctorError, DoctorSearchQuery, DoctorView,
    UpdateDoctorRequest,
};
use crate::services::availability::AvailabilityService;
use crate::services::doctor::DoctorService;
use crate::services::search::DoctorSearchService;

fn map_doctor_error(err: DoctorError) -> AppError {
    match err {
        DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
        DoctorError::DuplicateEmail => {
            AppError::Conflict("Doctor email already registered".to_string())
        }
        DoctorError::Database(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(ctx): State<Arc<AppContext>>,
) -> Result<Json<Vec<DoctorView>>, AppError> {
    let doctors = DoctorService::new(ctx.store.clone())
        .list_doctors()
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(doctors.into_iter().map(DoctorView::from).collect()))
}

#[axum::debug_handler]
pub async fn filter_doctors(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<DoctorSearchQuery>,
) -> Result<Json<Vec<DoctorView>>, AppError> {
    let doctors = DoctorSearchService::new(ctx.store.clone())
        .filter(query)
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(doctors.into_iter().map(DoctorView::from).collect()))
}

/// Availability is a sensitive read: any authenticated role may ask, and the
/// auth middleware has already vetted the token by the time we get here.
#[axum::debug_handler]
pub async fn doctor_availability(
    State(ctx): State<Arc<AppContext>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
    Extension(_user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let slots = AvailabilityService::new(ctx.store.clone())
        .available_slots(doctor_id, query.date)
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "date": query.date,
        "available_times": slots,
    })))
}

#[axum::debug_handler]
pub async fn create_doctor(
    State(ctx): State<Arc<AppContext>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Admin)?;

    let doctor = DoctorService::new(ctx.store.clone())
        .create_doctor(request)
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({
        "success": true,
        "doctor": DoctorView::from(doctor),
    })))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(ctx): State<Arc<AppContext>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<UpdateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Admin)?;

    let doctor = DoctorService::new(ctx.store.clone())
        .update_doctor(request)
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({
        "success": true,
        "doctor": DoctorView::from(doctor),
    })))
}

#[axum::debug_handler]
pub async fn delete_doctor(
    State(ctx): State<Arc<AppContext>>,
    Path(doctor_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Admin)?;

    DoctorService::new(ctx.store.clone())
        .delete_doctor(doctor_id)
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor deleted with all appointments"
    })))
}
