use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use shared_store::{Appointment, AppointmentStatus, ClinicStore, StoreError};

use crate::models::{AppointmentError, BookAppointmentRequest, SlotValidation};

/// The scheduling engine. Conflict policy is exact-timestamp equality within
/// the requested day; bookings at a different start time are never a
/// conflict, even when the hour-long visits would overlap.
pub struct BookingService {
    store: Arc<dyn ClinicStore>,
}

fn day_window(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

impl BookingService {
    pub fn new(store: Arc<dyn ClinicStore>) -> Self {
        Self { store }
    }

    /// Pre-booking check. Doctor existence short-circuits before any slot
    /// comparison, so the two failure modes stay distinguishable.
    pub async fn validate_slot(
        &self,
        doctor_id: Uuid,
        time: DateTime<Utc>,
    ) -> Result<SlotValidation, AppointmentError> {
        if !self.store.doctor_exists(doctor_id).await.map_err(db_err)? {
            return Ok(SlotValidation::DoctorNotFound);
        }

        let (start, end) = day_window(time.date_naive());
        let same_day = self
            .store
            .appointments_for_doctor_between(doctor_id, start, end)
            .await
            .map_err(db_err)?;

        if same_day.iter().any(|a| a.appointment_time == time) {
            return Ok(SlotValidation::SlotTaken);
        }
        Ok(SlotValidation::Valid)
    }

    /// Books a strictly-future slot. The store insert is reserve-or-reject,
    /// so a race lost after `validate_slot` still comes back as `SlotTaken`.
    pub async fn book(
        &self,
        patient_id: Uuid,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        if request.appointment_time <= Utc::now() {
            return Err(AppointmentError::InPast);
        }

        match self
            .validate_slot(request.doctor_id, request.appointment_time)
            .await?
        {
            SlotValidation::DoctorNotFound => return Err(AppointmentError::DoctorNotFound),
            SlotValidation::SlotTaken => return Err(AppointmentError::SlotTaken),
            SlotValidation::Valid => {}
        }

        let appointment = Appointment {
            id: Uuid::new_v4(),
            doctor_id: request.doctor_id,
            patient_id,
            appointment_time: request.appointment_time,
            status: AppointmentStatus::Scheduled,
        };

        let booked = match self.store.create_appointment(appointment).await {
            Ok(booked) => booked,
            Err(StoreError::Conflict(_)) => return Err(AppointmentError::SlotTaken),
            Err(e) => return Err(db_err(e)),
        };

        info!(
            "Appointment {} booked with doctor {} at {}",
            booked.id, booked.doctor_id, booked.appointment_time
        );
        Ok(booked)
    }

    /// Full-record replace; succeeds only when the id already exists.
    pub async fn update(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        if !self
            .store
            .appointment_exists(appointment.id)
            .await
            .map_err(db_err)?
        {
            return Err(AppointmentError::NotFound);
        }

        match self.store.update_appointment(appointment).await {
            Ok(updated) => Ok(updated),
            Err(StoreError::NotFound) => Err(AppointmentError::NotFound),
            Err(StoreError::Conflict(_)) => Err(AppointmentError::SlotTaken),
            Err(e) => Err(db_err(e)),
        }
    }

    /// Ownership is checked strictly before deletion; a cancel on someone
    /// else's appointment changes nothing.
    pub async fn cancel(
        &self,
        appointment_id: Uuid,
        requesting_patient_id: Uuid,
    ) -> Result<(), AppointmentError> {
        let appointment = self
            .store
            .find_appointment(appointment_id)
            .await
            .map_err(db_err)?
            .ok_or(AppointmentError::NotFound)?;

        if appointment.patient_id != requesting_patient_id {
            debug!(
                "Cancel refused: appointment {} belongs to another patient",
                appointment_id
            );
            return Err(AppointmentError::NotOwner);
        }

        match self.store.delete_appointment(appointment_id).await {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound) => Err(AppointmentError::NotFound),
            Err(e) => Err(db_err(e)),
        }
    }

    /// All appointments in the calendar day, optionally narrowed by a
    /// case-insensitive patient-name substring.
    pub async fn list_by_day(
        &self,
        date: NaiveDate,
        patient_name: Option<&str>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let (start, end) = day_window(date);
        self.store
            .appointments_between(start, end, patient_name)
            .await
            .map_err(db_err)
    }
}

fn db_err(err: StoreError) -> AppointmentError {
    AppointmentError::Database(err.to_string())
}
