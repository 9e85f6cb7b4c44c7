use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_store::AppointmentStatus;

/// Outcome of the pre-booking slot check. Doctor existence is decided first;
/// the slot comparison only runs for a known doctor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotValidation {
    DoctorNotFound,
    SlotTaken,
    Valid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Uuid,
    pub appointment_time: DateTime<Utc>,
}

/// Full-record replace; the caller identity supplies the patient, never the
/// request body.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_time: DateTime<Utc>,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DayQuery {
    pub date: NaiveDate,
    pub patient_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrescriptionRequest {
    pub appointment_id: Uuid,
    pub patient_name: String,
    pub medication: String,
    pub dosage: String,
    pub doctor_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentView {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub appointment_time: DateTime<Utc>,
    pub status: AppointmentStatus,
}

impl From<shared_store::Appointment> for AppointmentView {
    fn from(a: shared_store::Appointment) -> Self {
        Self {
            id: a.id,
            doctor_id: a.doctor_id,
            patient_id: a.patient_id,
            appointment_time: a.appointment_time,
            status: a.status,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Slot already booked")]
    SlotTaken,

    #[error("Appointment time must be in the future")]
    InPast,

    #[error("Appointment not found")]
    NotFound,

    #[error("Appointment belongs to a different patient")]
    NotOwner,

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Prescription already exists for this appointment")]
    AlreadyPrescribed,

    #[error("Database error: {0}")]
    Database(String),
}
