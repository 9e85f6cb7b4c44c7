use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use shared_store::{AppointmentStatus, ClinicStore, Prescription, StoreError};

use crate::models::{AppointmentError, PrescriptionRequest};
use crate::services::lifecycle::LifecycleService;

/// Prescription issue and retrieval, one per appointment. Saving one marks
/// the appointment PrescriptionCreated through the lifecycle service.
pub struct PrescriptionService {
    store: Arc<dyn ClinicStore>,
}

impl PrescriptionService {
    pub fn new(store: Arc<dyn ClinicStore>) -> Self {
        Self { store }
    }

    pub async fn save_prescription(
        &self,
        request: PrescriptionRequest,
    ) -> Result<Prescription, AppointmentError> {
        if !self
            .store
            .appointment_exists(request.appointment_id)
            .await
            .map_err(db_err)?
        {
            return Err(AppointmentError::NotFound);
        }

        if self
            .store
            .prescription_for_appointment(request.appointment_id)
            .await
            .map_err(db_err)?
            .is_some()
        {
            return Err(AppointmentError::AlreadyPrescribed);
        }

        let prescription = Prescription {
            id: Uuid::new_v4(),
            appointment_id: request.appointment_id,
            patient_name: request.patient_name,
            medication: request.medication,
            dosage: request.dosage,
            doctor_notes: request.doctor_notes,
        };

        let saved = match self.store.create_prescription(prescription).await {
            Ok(saved) => saved,
            Err(StoreError::Conflict(_)) => return Err(AppointmentError::AlreadyPrescribed),
            Err(e) => return Err(db_err(e)),
        };

        LifecycleService::new(self.store.clone())
            .change_status(saved.appointment_id, AppointmentStatus::PrescriptionCreated)
            .await?;

        info!(
            "Prescription {} saved for appointment {}",
            saved.id, saved.appointment_id
        );
        Ok(saved)
    }

    pub async fn get_prescription(
        &self,
        appointment_id: Uuid,
    ) -> Result<Option<Prescription>, AppointmentError> {
        self.store
            .prescription_for_appointment(appointment_id)
            .await
            .map_err(db_err)
    }
}

fn db_err(err: StoreError) -> AppointmentError {
    AppointmentError::Database(err.to_string())
}
