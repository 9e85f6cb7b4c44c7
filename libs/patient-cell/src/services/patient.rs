use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use auth_cell::services::token::TokenAuthority;
use shared_store::{AppointmentStatus, ClinicStore, Patient, StoreError};

use crate::models::{AppointmentSummary, CreatePatientRequest, PatientError};

/// Patient signup and the appointment-history read model.
pub struct PatientService {
    store: Arc<dyn ClinicStore>,
}

impl PatientService {
    pub fn new(store: Arc<dyn ClinicStore>) -> Self {
        Self { store }
    }

    /// Signup is public; identity uniqueness covers both email and phone,
    /// matching any prior record on either field.
    pub async fn create_patient(
        &self,
        request: CreatePatientRequest,
    ) -> Result<Patient, PatientError> {
        debug!("Creating patient record for {}", request.email);

        if self
            .store
            .find_patient_by_email_or_phone(&request.email, &request.phone)
            .await
            .map_err(db_err)?
            .is_some()
        {
            return Err(PatientError::DuplicateIdentity);
        }

        let patient = Patient {
            id: Uuid::new_v4(),
            name: request.name,
            email: request.email,
            phone: request.phone,
            address: request.address,
            password: request.password,
        };

        let created = match self.store.create_patient(patient).await {
            Ok(created) => created,
            Err(StoreError::Conflict(_)) => return Err(PatientError::DuplicateIdentity),
            Err(e) => return Err(db_err(e)),
        };

        info!("Patient {} created", created.id);
        Ok(created)
    }

    /// Resolves "the current patient" from a token subject (the email), so
    /// handlers never trust a patient id supplied by the caller.
    pub async fn patient_from_token(
        &self,
        authority: &TokenAuthority,
        token: &str,
    ) -> Result<Patient, PatientError> {
        let subject = authority
            .extract_subject(token)
            .ok_or(PatientError::Unauthorized)?;

        self.store
            .find_patient_by_email(&subject)
            .await
            .map_err(db_err)?
            .ok_or(PatientError::NotFound)
    }

    /// The patient's appointments filtered by an optional condition word and
    /// an optional doctor-name substring, ordered by time ascending. An
    /// unrecognized condition yields an empty history, not an error.
    pub async fn appointment_history(
        &self,
        patient: &Patient,
        condition: Option<&str>,
        doctor_name: Option<&str>,
    ) -> Result<Vec<AppointmentSummary>, PatientError> {
        let status = match condition {
            None => None,
            Some("past") => Some(AppointmentStatus::Completed),
            Some("future") => Some(AppointmentStatus::Scheduled),
            Some(other) => {
                debug!("Unknown history condition {:?}, returning empty", other);
                return Ok(vec![]);
            }
        };

        let appointments = self
            .store
            .appointments_for_patient(patient.id, status, doctor_name)
            .await
            .map_err(db_err)?;

        let mut history = Vec::with_capacity(appointments.len());
        for appointment in appointments {
            let doctor = self
                .store
                .find_doctor(appointment.doctor_id)
                .await
                .map_err(db_err)?
                .ok_or_else(|| {
                    PatientError::Database(format!(
                        "doctor {} missing for appointment {}",
                        appointment.doctor_id, appointment.id
                    ))
                })?;

            history.push(AppointmentSummary {
                id: appointment.id,
                doctor_id: doctor.id,
                doctor_name: doctor.name,
                patient_id: patient.id,
                patient_name: patient.name.clone(),
                patient_email: patient.email.clone(),
                patient_phone: patient.phone.clone(),
                patient_address: patient.address.clone(),
                appointment_time: appointment.appointment_time,
                status: appointment.status,
            });
        }

        Ok(history)
    }
}

fn db_err(err: StoreError) -> PatientError {
    PatientError::Database(err.to_string())
}
