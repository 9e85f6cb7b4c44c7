use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use shared_store::{AppointmentStatus, ClinicStore, StoreError};

use crate::models::AppointmentError;

/// Status lifecycle for appointments. The default write is an unconditional
/// overwrite; `change_status_checked` is the opt-in variant that holds the
/// monotonic Scheduled, Completed, PrescriptionCreated chain.
pub struct LifecycleService {
    store: Arc<dyn ClinicStore>,
}

/// Statuses reachable in one step from `status`.
pub fn valid_transitions(status: AppointmentStatus) -> &'static [AppointmentStatus] {
    match status {
        AppointmentStatus::Scheduled => &[AppointmentStatus::Completed],
        AppointmentStatus::Completed => &[AppointmentStatus::PrescriptionCreated],
        AppointmentStatus::PrescriptionCreated => &[],
    }
}

impl LifecycleService {
    pub fn new(store: Arc<dyn ClinicStore>) -> Self {
        Self { store }
    }

    /// Overwrites the status with no transition check.
    pub async fn change_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Setting appointment {} status to {}", appointment_id, status);
        match self
            .store
            .update_appointment_status(appointment_id, status)
            .await
        {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound) => Err(AppointmentError::NotFound),
            Err(e) => Err(AppointmentError::Database(e.to_string())),
        }
    }

    /// Like `change_status`, but rejects any step outside the forward chain.
    pub async fn change_status_checked(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        let appointment = self
            .store
            .find_appointment(appointment_id)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?
            .ok_or(AppointmentError::NotFound)?;

        if !valid_transitions(appointment.status).contains(&status) {
            return Err(AppointmentError::InvalidTransition {
                from: appointment.status,
                to: status,
            });
        }

        self.change_status(appointment_id, status).await
    }
}
