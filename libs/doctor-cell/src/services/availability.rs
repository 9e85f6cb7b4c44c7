use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::debug;
use uuid::Uuid;

use shared_store::{ClinicStore, StoreError};

use crate::models::DoctorError;

/// Computes the free slots for a doctor on a given day: the declared
/// recurring list minus the time-of-day values already booked, in the
/// doctor's declared order.
pub struct AvailabilityService {
    store: Arc<dyn ClinicStore>,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn ClinicStore>) -> Self {
        Self { store }
    }

    /// Unknown doctor yields an empty list, not an error; callers that need
    /// to distinguish do an existence check first.
    pub async fn available_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<NaiveTime>, DoctorError> {
        debug!("Computing availability for doctor {} on {}", doctor_id, date);

        let doctor = match self.store.find_doctor(doctor_id).await.map_err(db_err)? {
            Some(doctor) => doctor,
            None => return Ok(vec![]),
        };

        let start = date.and_time(NaiveTime::MIN).and_utc();
        let end = start + Duration::days(1);
        let appointments = self
            .store
            .appointments_for_doctor_between(doctor_id, start, end)
            .await
            .map_err(db_err)?;

        let booked: HashSet<NaiveTime> = appointments.iter().map(|a| a.time_of_day()).collect();

        Ok(doctor
            .available_times
            .into_iter()
            .filter(|slot| !booked.contains(slot))
            .collect())
    }
}

fn db_err(err: StoreError) -> DoctorError {
    DoctorError::Database(err.to_string())
}
