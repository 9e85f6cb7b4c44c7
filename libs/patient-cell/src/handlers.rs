use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use auth_cell::services::gate::authorize;
use auth_cell::services::token::TokenAuthority;
use shared_models::auth::Role;
use shared_models::error::AppError;
use shared_store::AppContext;

use crate::models::{AppointmentSummary, CreatePatientRequest, HistoryQuery, PatientError, PatientView};
use crate::services::patient::PatientService;

fn map_patient_error(err: PatientError) -> AppError {
    match err {
        PatientError::NotFound => AppError::NotFound("Patient not found".to_string()),
        PatientError::DuplicateIdentity => {
            AppError::Conflict("Patient email or phone already registered".to_string())
        }
        PatientError::Unauthorized => AppError::Auth("Invalid or expired token".to_string()),
        PatientError::Database(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn create_patient(
    State(ctx): State<Arc<AppContext>>,
    Json(request): Json<CreatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    let patient = PatientService::new(ctx.store.clone())
        .create_patient(request)
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!({
        "success": true,
        "patient": PatientView::from(patient),
    })))
}

/// The caller is whoever the token says: the subject resolves the patient,
/// so no patient id is ever accepted from the request.
#[axum::debug_handler]
pub async fn my_appointments(
    State(ctx): State<Arc<AppContext>>,
    TypedHeader(authorization): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<AppointmentSummary>>, AppError> {
    let token = authorization.token();
    let authority = TokenAuthority::new(&ctx.config);
    if !authorize(&authority, token, Role::Patient) {
        return Err(AppError::Auth("Invalid or expired token".to_string()));
    }

    let service = PatientService::new(ctx.store.clone());
    let patient = service
        .patient_from_token(&authority, token)
        .await
        .map_err(map_patient_error)?;

    let history = service
        .appointment_history(
            &patient,
            query.condition.as_deref(),
            query.doctor_name.as_deref(),
        )
        .await
        .map_err(map_patient_error)?;

    Ok(Json(history))
}
