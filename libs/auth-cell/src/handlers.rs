use std::sync::Arc;

use axum::{extract::State, Json};
use tracing::{debug, info};

use shared_models::auth::Role;
use shared_models::error::AppError;
use shared_store::AppContext;

use crate::models::{AdminLoginRequest, LoginRequest, TokenResponse};
use crate::services::token::TokenAuthority;

// Failed logins all answer the same way; the response must not reveal which
// field was wrong or whether the account exists.
fn invalid_credentials() -> AppError {
    AppError::Auth("Invalid credentials".to_string())
}

#[axum::debug_handler]
pub async fn admin_login(
    State(ctx): State<Arc<AppContext>>,
    Json(request): Json<AdminLoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Admin login attempt for {}", request.username);

    let admin = ctx
        .store
        .find_admin_by_username(&request.username)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(invalid_credentials)?;

    if admin.password != request.password {
        return Err(invalid_credentials());
    }

    let token = TokenAuthority::new(&ctx.config)
        .issue(&admin.username, Role::Admin)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    info!("Issued admin token for {}", admin.username);
    Ok(Json(TokenResponse {
        token,
        role: Role::Admin,
    }))
}

#[axum::debug_handler]
pub async fn doctor_login(
    State(ctx): State<Arc<AppContext>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Doctor login attempt for {}", request.email);

    let doctor = ctx
        .store
        .find_doctor_by_email(&request.email)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(invalid_credentials)?;

    if doctor.password != request.password {
        return Err(invalid_credentials());
    }

    let token = TokenAuthority::new(&ctx.config)
        .issue(&doctor.email, Role::Doctor)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    info!("Issued doctor token for {}", doctor.email);
    Ok(Json(TokenResponse {
        token,
        role: Role::Doctor,
    }))
}

#[axum::debug_handler]
pub async fn patient_login(
    State(ctx): State<Arc<AppContext>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Patient login attempt for {}", request.email);

    let patient = ctx
        .store
        .find_patient_by_email(&request.email)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(invalid_credentials)?;

    if patient.password != request.password {
        return Err(invalid_credentials());
    }

    let token = TokenAuthority::new(&ctx.config)
        .issue(&patient.email, Role::Patient)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    info!("Issued patient token for {}", patient.email);
    Ok(Json(TokenResponse {
        token,
        role: Role::Patient,
    }))
}
