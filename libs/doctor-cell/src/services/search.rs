use std::sync::Arc;

use tracing::debug;

use shared_store::{ClinicStore, Doctor, StoreError};

use crate::models::{DoctorError, DoctorSearchQuery};

/// Doctor search: optional case-insensitive name substring, optional
/// case-insensitive exact specialty, AND-composed, with the am/pm period
/// applied as a post-filter over the candidates' declared slots.
pub struct DoctorSearchService {
    store: Arc<dyn ClinicStore>,
}

impl DoctorSearchService {
    pub fn new(store: Arc<dyn ClinicStore>) -> Self {
        Self { store }
    }

    pub async fn filter(&self, query: DoctorSearchQuery) -> Result<Vec<Doctor>, DoctorError> {
        debug!(
            "Filtering doctors: name={:?} specialty={:?} period={:?}",
            query.name, query.specialty, query.time_period
        );

        let all = self
            .store
            .list_doctors()
            .await
            .map_err(|e: StoreError| DoctorError::Database(e.to_string()))?;

        let name = query.name.as_deref().map(str::to_lowercase);
        let specialty = query.specialty.as_deref().map(str::to_lowercase);

        Ok(all
            .into_iter()
            .filter(|doctor| match &name {
                Some(needle) => doctor.name.to_lowercase().contains(needle),
                None => true,
            })
            .filter(|doctor| match &specialty {
                Some(wanted) => doctor.specialty.to_lowercase() == *wanted,
                None => true,
            })
            .filter(|doctor| match query.time_period {
                Some(period) => doctor
                    .available_times
                    .iter()
                    .any(|slot| period.matches(*slot)),
                None => true,
            })
            .collect())
    }
}
