use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_store::{AppointmentStatus, Patient};

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePatientRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub password: String,
}

/// What callers see; never carries the password credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl From<Patient> for PatientView {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.name,
            email: patient.email,
            phone: patient.phone,
            address: patient.address,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    /// "past" selects completed visits, "future" selects scheduled ones.
    /// Anything else yields an empty history rather than an error.
    pub condition: Option<String>,
    pub doctor_name: Option<String>,
}

/// History row joined across the appointment, its doctor and its patient.
/// Credential fields are deliberately absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentSummary {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub doctor_name: String,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: String,
    pub patient_address: String,
    pub appointment_time: DateTime<Utc>,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("Patient email or phone already registered")]
    DuplicateIdentity,

    #[error("Invalid or expired token")]
    Unauthorized,

    #[error("Database error: {0}")]
    Database(String),
}
