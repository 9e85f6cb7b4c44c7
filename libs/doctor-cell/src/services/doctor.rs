use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use shared_store::{ClinicStore, Doctor, StoreError};

use crate::models::{CreateDoctorRequest, DoctorError, UpdateDoctorRequest};

/// Directory operations for doctor records. Creation and deletion are
/// admin-only at the gate; this layer owns the email-uniqueness check and
/// the cascade contract.
pub struct DoctorService {
    store: Arc<dyn ClinicStore>,
}

impl DoctorService {
    pub fn new(store: Arc<dyn ClinicStore>) -> Self {
        Self { store }
    }

    pub async fn list_doctors(&self) -> Result<Vec<Doctor>, DoctorError> {
        self.store.list_doctors().await.map_err(db_err)
    }

    pub async fn create_doctor(
        &self,
        request: CreateDoctorRequest,
    ) -> Result<Doctor, DoctorError> {
        debug!("Creating doctor record for {}", request.email);

        if self
            .store
            .find_doctor_by_email(&request.email)
            .await
            .map_err(db_err)?
            .is_some()
        {
            return Err(DoctorError::DuplicateEmail);
        }

        let doctor = Doctor {
            id: Uuid::new_v4(),
            name: request.name,
            email: request.email,
            specialty: request.specialty,
            password: request.password,
            available_times: request.available_times,
        };

        let created = match self.store.create_doctor(doctor).await {
            Ok(created) => created,
            // Second line of defense: the store's own uniqueness constraint.
            Err(StoreError::Conflict(_)) => return Err(DoctorError::DuplicateEmail),
            Err(e) => return Err(db_err(e)),
        };

        info!("Doctor {} created", created.id);
        Ok(created)
    }

    pub async fn update_doctor(
        &self,
        request: UpdateDoctorRequest,
    ) -> Result<Doctor, DoctorError> {
        if !self.store.doctor_exists(request.id).await.map_err(db_err)? {
            return Err(DoctorError::NotFound);
        }

        let doctor = Doctor {
            id: request.id,
            name: request.name,
            email: request.email,
            specialty: request.specialty,
            password: request.password,
            available_times: request.available_times,
        };

        match self.store.update_doctor(doctor).await {
            Ok(updated) => Ok(updated),
            Err(StoreError::NotFound) => Err(DoctorError::NotFound),
            Err(e) => Err(db_err(e)),
        }
    }

    /// Cascade delete: the store removes the doctor's appointments first,
    /// then the doctor, as one unit.
    pub async fn delete_doctor(&self, id: Uuid) -> Result<(), DoctorError> {
        match self.store.delete_doctor(id).await {
            Ok(()) => {
                info!("Doctor {} deleted with appointment cascade", id);
                Ok(())
            }
            Err(StoreError::NotFound) => Err(DoctorError::NotFound),
            Err(e) => Err(db_err(e)),
        }
    }
}

fn db_err(err: StoreError) -> DoctorError {
    DoctorError::Database(err.to_string())
}
