pub mod error;
pub mod memory;
pub mod postgrest;
pub mod records;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use shared_config::AppConfig;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgrest::PostgrestStore;
pub use records::{Admin, Appointment, AppointmentStatus, Doctor, Patient, Prescription};

/// The storage boundary the scheduling core sits on. Every call is one
/// transactional unit at the backend; the core never holds state between
/// calls. `create_appointment` is reserve-or-reject: the backend enforces
/// uniqueness of (doctor_id, appointment_time) so a lost check-then-act race
/// still fails cleanly with `Conflict`.
#[async_trait]
pub trait ClinicStore: Send + Sync {
    // Doctors
    async fn find_doctor(&self, id: Uuid) -> Result<Option<Doctor>, StoreError>;
    async fn find_doctor_by_email(&self, email: &str) -> Result<Option<Doctor>, StoreError>;
    async fn doctor_exists(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn list_doctors(&self) -> Result<Vec<Doctor>, StoreError>;
    async fn create_doctor(&self, doctor: Doctor) -> Result<Doctor, StoreError>;
    async fn update_doctor(&self, doctor: Doctor) -> Result<Doctor, StoreError>;
    /// Two-phase cascade: deletes the doctor's appointments, then the doctor.
    async fn delete_doctor(&self, id: Uuid) -> Result<(), StoreError>;

    // Patients
    async fn find_patient(&self, id: Uuid) -> Result<Option<Patient>, StoreError>;
    async fn find_patient_by_email(&self, email: &str) -> Result<Option<Patient>, StoreError>;
    async fn find_patient_by_email_or_phone(
        &self,
        email: &str,
        phone: &str,
    ) -> Result<Option<Patient>, StoreError>;
    async fn create_patient(&self, patient: Patient) -> Result<Patient, StoreError>;

    // Admins
    async fn find_admin_by_username(&self, username: &str) -> Result<Option<Admin>, StoreError>;

    // Appointments
    async fn create_appointment(&self, appointment: Appointment)
        -> Result<Appointment, StoreError>;
    async fn update_appointment(&self, appointment: Appointment)
        -> Result<Appointment, StoreError>;
    async fn delete_appointment(&self, id: Uuid) -> Result<(), StoreError>;
    async fn appointment_exists(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn find_appointment(&self, id: Uuid) -> Result<Option<Appointment>, StoreError>;
    /// Appointments for one doctor with `start <= appointment_time < end`,
    /// ordered by time ascending.
    async fn appointments_for_doctor_between(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError>;
    /// All appointments in `[start, end)`, optionally restricted to patients
    /// whose name contains `patient_name` (case-insensitive).
    async fn appointments_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        patient_name: Option<&str>,
    ) -> Result<Vec<Appointment>, StoreError>;
    /// A patient's appointments, optionally restricted by status and/or a
    /// case-insensitive doctor-name substring, ordered by time ascending.
    async fn appointments_for_patient(
        &self,
        patient_id: Uuid,
        status: Option<AppointmentStatus>,
        doctor_name: Option<&str>,
    ) -> Result<Vec<Appointment>, StoreError>;
    async fn update_appointment_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<(), StoreError>;

    // Prescriptions
    async fn prescription_for_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Option<Prescription>, StoreError>;
    async fn create_prescription(
        &self,
        prescription: Prescription,
    ) -> Result<Prescription, StoreError>;
}

/// Shared state handed to every cell router: configuration plus the storage
/// handle behind the `ClinicStore` seam.
#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub store: Arc<dyn ClinicStore>,
}

impl AppContext {
    pub fn new(config: AppConfig, store: Arc<dyn ClinicStore>) -> Self {
        Self { config, store }
    }
}
