use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::records::{Admin, Appointment, AppointmentStatus, Doctor, Patient, Prescription};
use crate::ClinicStore;

#[derive(Default)]
struct Tables {
    doctors: Vec<Doctor>,
    patients: Vec<Patient>,
    admins: Vec<Admin>,
    appointments: HashMap<Uuid, Appointment>,
    // Uniqueness index for (doctor_id, appointment_time); the in-memory
    // equivalent of the relational unique constraint.
    slots: HashSet<(Uuid, DateTime<Utc>)>,
    prescriptions: HashMap<Uuid, Prescription>,
}

/// In-memory `ClinicStore`. Backs the test suites and doubles as a reference
/// for the invariants the relational backend must carry: unique patient
/// email, unique doctor email, unique (doctor_id, appointment_time).
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admins are provisioned out-of-band, not via any public operation.
    pub async fn seed_admin(&self, admin: Admin) {
        self.inner.write().await.admins.push(admin);
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl ClinicStore for MemoryStore {
    async fn find_doctor(&self, id: Uuid) -> Result<Option<Doctor>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables.doctors.iter().find(|d| d.id == id).cloned())
    }

    async fn find_doctor_by_email(&self, email: &str) -> Result<Option<Doctor>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables
            .doctors
            .iter()
            .find(|d| d.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn doctor_exists(&self, id: Uuid) -> Result<bool, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables.doctors.iter().any(|d| d.id == id))
    }

    async fn list_doctors(&self) -> Result<Vec<Doctor>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables.doctors.clone())
    }

    async fn create_doctor(&self, doctor: Doctor) -> Result<Doctor, StoreError> {
        let mut tables = self.inner.write().await;
        if tables
            .doctors
            .iter()
            .any(|d| d.email.eq_ignore_ascii_case(&doctor.email))
        {
            return Err(StoreError::Conflict(format!(
                "doctor email already registered: {}",
                doctor.email
            )));
        }
        tables.doctors.push(doctor.clone());
        Ok(doctor)
    }

    async fn update_doctor(&self, doctor: Doctor) -> Result<Doctor, StoreError> {
        let mut tables = self.inner.write().await;
        match tables.doctors.iter_mut().find(|d| d.id == doctor.id) {
            Some(existing) => {
                *existing = doctor.clone();
                Ok(doctor)
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete_doctor(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.inner.write().await;
        if !tables.doctors.iter().any(|d| d.id == id) {
            return Err(StoreError::NotFound);
        }
        // Dependents first, then the doctor, all under one lock.
        let doomed: Vec<Uuid> = tables
            .appointments
            .values()
            .filter(|a| a.doctor_id == id)
            .map(|a| a.id)
            .collect();
        for appointment_id in doomed {
            if let Some(appointment) = tables.appointments.remove(&appointment_id) {
                tables
                    .slots
                    .remove(&(appointment.doctor_id, appointment.appointment_time));
                tables.prescriptions.remove(&appointment_id);
            }
        }
        tables.doctors.retain(|d| d.id != id);
        debug!("deleted doctor {} and cascaded appointments", id);
        Ok(())
    }

    async fn find_patient(&self, id: Uuid) -> Result<Option<Patient>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables.patients.iter().find(|p| p.id == id).cloned())
    }

    async fn find_patient_by_email(&self, email: &str) -> Result<Option<Patient>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables
            .patients
            .iter()
            .find(|p| p.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_patient_by_email_or_phone(
        &self,
        email: &str,
        phone: &str,
    ) -> Result<Option<Patient>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables
            .patients
            .iter()
            .find(|p| p.email.eq_ignore_ascii_case(email) || p.phone == phone)
            .cloned())
    }

    async fn create_patient(&self, patient: Patient) -> Result<Patient, StoreError> {
        let mut tables = self.inner.write().await;
        if tables
            .patients
            .iter()
            .any(|p| p.email.eq_ignore_ascii_case(&patient.email) || p.phone == patient.phone)
        {
            return Err(StoreError::Conflict(
                "patient email or phone already registered".to_string(),
            ));
        }
        tables.patients.push(patient.clone());
        Ok(patient)
    }

    async fn find_admin_by_username(&self, username: &str) -> Result<Option<Admin>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables
            .admins
            .iter()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn create_appointment(
        &self,
        appointment: Appointment,
    ) -> Result<Appointment, StoreError> {
        let mut tables = self.inner.write().await;
        let slot = (appointment.doctor_id, appointment.appointment_time);
        if tables.slots.contains(&slot) {
            return Err(StoreError::Conflict(format!(
                "slot already booked for doctor {} at {}",
                appointment.doctor_id, appointment.appointment_time
            )));
        }
        tables.slots.insert(slot);
        tables
            .appointments
            .insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn update_appointment(
        &self,
        appointment: Appointment,
    ) -> Result<Appointment, StoreError> {
        let mut tables = self.inner.write().await;
        let previous = match tables.appointments.get(&appointment.id) {
            Some(existing) => existing.clone(),
            None => return Err(StoreError::NotFound),
        };
        let old_slot = (previous.doctor_id, previous.appointment_time);
        let new_slot = (appointment.doctor_id, appointment.appointment_time);
        if new_slot != old_slot && tables.slots.contains(&new_slot) {
            return Err(StoreError::Conflict(format!(
                "slot already booked for doctor {} at {}",
                appointment.doctor_id, appointment.appointment_time
            )));
        }
        tables.slots.remove(&old_slot);
        tables.slots.insert(new_slot);
        tables
            .appointments
            .insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn delete_appointment(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.inner.write().await;
        match tables.appointments.remove(&id) {
            Some(appointment) => {
                tables
                    .slots
                    .remove(&(appointment.doctor_id, appointment.appointment_time));
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn appointment_exists(&self, id: Uuid) -> Result<bool, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables.appointments.contains_key(&id))
    }

    async fn find_appointment(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables.appointments.get(&id).cloned())
    }

    async fn appointments_for_doctor_between(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let tables = self.inner.read().await;
        let mut found: Vec<Appointment> = tables
            .appointments
            .values()
            .filter(|a| {
                a.doctor_id == doctor_id && a.appointment_time >= start && a.appointment_time < end
            })
            .cloned()
            .collect();
        found.sort_by_key(|a| a.appointment_time);
        Ok(found)
    }

    async fn appointments_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        patient_name: Option<&str>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let tables = self.inner.read().await;
        let mut found: Vec<Appointment> = tables
            .appointments
            .values()
            .filter(|a| a.appointment_time >= start && a.appointment_time < end)
            .filter(|a| match patient_name {
                Some(name) => tables
                    .patients
                    .iter()
                    .any(|p| p.id == a.patient_id && contains_ignore_case(&p.name, name)),
                None => true,
            })
            .cloned()
            .collect();
        found.sort_by_key(|a| a.appointment_time);
        Ok(found)
    }

    async fn appointments_for_patient(
        &self,
        patient_id: Uuid,
        status: Option<AppointmentStatus>,
        doctor_name: Option<&str>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let tables = self.inner.read().await;
        let mut found: Vec<Appointment> = tables
            .appointments
            .values()
            .filter(|a| a.patient_id == patient_id)
            .filter(|a| status.map_or(true, |s| a.status == s))
            .filter(|a| match doctor_name {
                Some(name) => tables
                    .doctors
                    .iter()
                    .any(|d| d.id == a.doctor_id && contains_ignore_case(&d.name, name)),
                None => true,
            })
            .cloned()
            .collect();
        found.sort_by_key(|a| a.appointment_time);
        Ok(found)
    }

    async fn update_appointment_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<(), StoreError> {
        let mut tables = self.inner.write().await;
        match tables.appointments.get_mut(&id) {
            Some(appointment) => {
                appointment.status = status;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn prescription_for_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Option<Prescription>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables.prescriptions.get(&appointment_id).cloned())
    }

    async fn create_prescription(
        &self,
        prescription: Prescription,
    ) -> Result<Prescription, StoreError> {
        let mut tables = self.inner.write().await;
        if tables
            .prescriptions
            .contains_key(&prescription.appointment_id)
        {
            return Err(StoreError::Conflict(format!(
                "prescription already exists for appointment {}",
                prescription.appointment_id
            )));
        }
        tables
            .prescriptions
            .insert(prescription.appointment_id, prescription.clone());
        Ok(prescription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    fn doctor(name: &str, email: &str) -> Doctor {
        Doctor {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            specialty: "cardiology".to_string(),
            password: "pw".to_string(),
            available_times: vec![],
        }
    }

    fn patient(name: &str, email: &str, phone: &str) -> Patient {
        Patient {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            address: "1 Main St".to_string(),
            password: "pw".to_string(),
        }
    }

    fn appointment(doctor_id: Uuid, patient_id: Uuid, time: DateTime<Utc>) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            doctor_id,
            patient_id,
            appointment_time: time,
            status: AppointmentStatus::Scheduled,
        }
    }

    #[tokio::test]
    async fn duplicate_slot_insert_is_rejected() {
        let store = MemoryStore::new();
        let d = store.create_doctor(doctor("Dr. A", "a@clinic.ie")).await.unwrap();
        let p = store
            .create_patient(patient("Pat", "pat@mail.com", "0851111111"))
            .await
            .unwrap();
        let time = Utc.with_ymd_and_hms(2030, 6, 10, 9, 30, 0).unwrap();

        store
            .create_appointment(appointment(d.id, p.id, time))
            .await
            .unwrap();
        let second = store.create_appointment(appointment(d.id, p.id, time)).await;
        assert_matches!(second, Err(StoreError::Conflict(_)));

        // Same time with a different doctor is fine.
        let other = store.create_doctor(doctor("Dr. B", "b@clinic.ie")).await.unwrap();
        store
            .create_appointment(appointment(other.id, p.id, time))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn deleting_an_appointment_frees_its_slot() {
        let store = MemoryStore::new();
        let d = store.create_doctor(doctor("Dr. A", "a@clinic.ie")).await.unwrap();
        let p = store
            .create_patient(patient("Pat", "pat@mail.com", "0851111111"))
            .await
            .unwrap();
        let time = Utc.with_ymd_and_hms(2030, 6, 10, 9, 0, 0).unwrap();

        let booked = store
            .create_appointment(appointment(d.id, p.id, time))
            .await
            .unwrap();
        store.delete_appointment(booked.id).await.unwrap();
        store
            .create_appointment(appointment(d.id, p.id, time))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn duplicate_patient_email_or_phone_is_rejected() {
        let store = MemoryStore::new();
        store
            .create_patient(patient("Pat", "pat@mail.com", "0851111111"))
            .await
            .unwrap();
        let same_email = store
            .create_patient(patient("Other", "PAT@mail.com", "0852222222"))
            .await;
        assert_matches!(same_email, Err(StoreError::Conflict(_)));
        let same_phone = store
            .create_patient(patient("Other", "other@mail.com", "0851111111"))
            .await;
        assert_matches!(same_phone, Err(StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn doctor_delete_cascades_to_appointments() {
        let store = MemoryStore::new();
        let d = store.create_doctor(doctor("Dr. A", "a@clinic.ie")).await.unwrap();
        let p = store
            .create_patient(patient("Pat", "pat@mail.com", "0851111111"))
            .await
            .unwrap();
        let time = Utc.with_ymd_and_hms(2030, 6, 10, 9, 0, 0).unwrap();
        let booked = store
            .create_appointment(appointment(d.id, p.id, time))
            .await
            .unwrap();

        store.delete_doctor(d.id).await.unwrap();
        assert!(!store.doctor_exists(d.id).await.unwrap());
        assert!(!store.appointment_exists(booked.id).await.unwrap());
    }

    #[tokio::test]
    async fn patient_appointment_query_filters_and_orders() {
        let store = MemoryStore::new();
        let d = store.create_doctor(doctor("Dr. Adams", "a@clinic.ie")).await.unwrap();
        let p = store
            .create_patient(patient("Pat", "pat@mail.com", "0851111111"))
            .await
            .unwrap();

        let later = Utc.with_ymd_and_hms(2030, 6, 11, 9, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2030, 6, 10, 9, 0, 0).unwrap();
        let mut done = appointment(d.id, p.id, later);
        done.status = AppointmentStatus::Completed;
        store.create_appointment(done).await.unwrap();
        let mut done_early = appointment(d.id, p.id, earlier);
        done_early.status = AppointmentStatus::Completed;
        store.create_appointment(done_early).await.unwrap();

        let completed = store
            .appointments_for_patient(p.id, Some(AppointmentStatus::Completed), Some("adams"))
            .await
            .unwrap();
        assert_eq!(completed.len(), 2);
        assert!(completed[0].appointment_time < completed[1].appointment_time);

        let none = store
            .appointments_for_patient(p.id, Some(AppointmentStatus::Scheduled), None)
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
