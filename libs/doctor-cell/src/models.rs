use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_store::Doctor;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDoctorRequest {
    pub name: String,
    pub email: String,
    pub specialty: String,
    pub password: String,
    /// Recurring slots in the order the doctor declares them.
    pub available_times: Vec<NaiveTime>,
}

/// Full-record replace; no partial patch semantics.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDoctorRequest {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub specialty: String,
    pub password: String,
    pub available_times: Vec<NaiveTime>,
}

/// What callers see; never carries the password credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub specialty: String,
    pub available_times: Vec<NaiveTime>,
}

impl From<Doctor> for DoctorView {
    fn from(doctor: Doctor) -> Self {
        Self {
            id: doctor.id,
            name: doctor.name,
            email: doctor.email,
            specialty: doctor.specialty,
            available_times: doctor.available_times,
        }
    }
}

/// Morning/afternoon post-filter for doctor search. A doctor matches a
/// period when ANY declared slot falls inside it, so a mixed-slot doctor
/// matches both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimePeriod {
    Am,
    Pm,
}

impl TimePeriod {
    pub fn matches(&self, slot: NaiveTime) -> bool {
        use chrono::Timelike;
        match self {
            TimePeriod::Am => slot.hour() < 12,
            TimePeriod::Pm => slot.hour() >= 12,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorSearchQuery {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub time_period: Option<TimePeriod>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Doctor email already registered")]
    DuplicateEmail,

    #[error("Database error: {0}")]
    Database(String),
}
