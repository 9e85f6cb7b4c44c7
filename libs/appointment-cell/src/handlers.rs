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
use shared_store::{AppContext, Appointment, Patient};

use crate::models::{
    AppointmentError, AppointmentView, BookAppointmentRequest, ChangeStatusRequest, DayQuery,
    PrescriptionRequest, UpdateAppointmentRequest,
};
use crate::services::booking::BookingService;
use crate::services::lifecycle::LifecycleService;
use crate::services::prescription::PrescriptionService;

fn map_appointment_error(err: AppointmentError) -> AppError {
    match err {
        AppointmentError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
        AppointmentError::SlotTaken => AppError::Conflict("Slot already booked".to_string()),
        AppointmentError::InPast => {
            AppError::Validation("Appointment time must be in the future".to_string())
        }
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        // A stranger probing someone else's appointment id gets the same
        // answer as a missing one; the response must not confirm existence.
        AppointmentError::NotOwner => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::InvalidTransition { from, to } => {
            AppError::BadRequest(format!("Invalid status transition from {} to {}", from, to))
        }
        AppointmentError::AlreadyPrescribed => {
            AppError::Conflict("Prescription already exists for this appointment".to_string())
        }
        AppointmentError::Database(msg) => AppError::Database(msg),
    }
}

/// The patient behind the token subject. Booking operations never accept a
/// patient id from the request body.
async fn current_patient(ctx: &AppContext, user: &AuthUser) -> Result<Patient, AppError> {
    require_role(user, Role::Patient)?;
    ctx.store
        .find_patient_by_email(&user.subject)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::Auth("Unknown patient account".to_string()))
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(ctx): State<Arc<AppContext>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let patient = current_patient(&ctx, &user).await?;

    let booked = BookingService::new(ctx.store.clone())
        .book(patient.id, request)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": AppointmentView::from(booked),
    })))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(ctx): State<Arc<AppContext>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let patient = current_patient(&ctx, &user).await?;

    let updated = BookingService::new(ctx.store.clone())
        .update(Appointment {
            id: request.id,
            doctor_id: request.doctor_id,
            patient_id: patient.id,
            appointment_time: request.appointment_time,
            status: request.status,
        })
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": AppointmentView::from(updated),
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(ctx): State<Arc<AppContext>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let patient = current_patient(&ctx, &user).await?;

    BookingService::new(ctx.store.clone())
        .cancel(appointment_id, patient.id)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment cancelled"
    })))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<DayQuery>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<AppointmentView>>, AppError> {
    require_role(&user, Role::Doctor)?;

    let appointments = BookingService::new(ctx.store.clone())
        .list_by_day(query.date, query.patient_name.as_deref())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(
        appointments.into_iter().map(AppointmentView::from).collect(),
    ))
}

#[axum::debug_handler]
pub async fn change_status(
    State(ctx): State<Arc<AppContext>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<ChangeStatusRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Doctor)?;

    LifecycleService::new(ctx.store.clone())
        .change_status(appointment_id, request.status)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "status": request.status,
    })))
}

#[axum::debug_handler]
pub async fn save_prescription(
    State(ctx): State<Arc<AppContext>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<PrescriptionRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Doctor)?;

    let saved = PrescriptionService::new(ctx.store.clone())
        .save_prescription(request)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "prescription": saved,
    })))
}

#[axum::debug_handler]
pub async fn get_prescription(
    State(ctx): State<Arc<AppContext>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Doctor)?;

    let prescription = PrescriptionService::new(ctx.store.clone())
        .get_prescription(appointment_id)
        .await
        .map_err(map_appointment_error)?
        .ok_or_else(|| AppError::NotFound("Prescription not found".to_string()))?;

    Ok(Json(json!({ "prescription": prescription })))
}
