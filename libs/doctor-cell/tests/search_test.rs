use std::sync::Arc;

use chrono::NaiveTime;
use uuid::Uuid;

use doctor_cell::models::{DoctorSearchQuery, TimePeriod};
use doctor_cell::services::search::DoctorSearchService;
use shared_store::{ClinicStore, Doctor, MemoryStore};

fn t(hhmm: &str) -> NaiveTime {
    NaiveTime::parse_from_str(hhmm, "%H:%M").unwrap()
}

async fn seed(store: &MemoryStore, name: &str, email: &str, specialty: &str, slots: &[&str]) {
    store
        .create_doctor(Doctor {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            specialty: specialty.to_string(),
            password: "pw".to_string(),
            available_times: slots.iter().map(|s| t(s)).collect(),
        })
        .await
        .unwrap();
}

async fn clinic() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    seed(&store, "Aoife Adams", "adams@clinic.ie", "Cardiology", &["09:00", "10:00"]).await;
    seed(&store, "Brian Byrne", "byrne@clinic.ie", "Dermatology", &["14:00", "15:00"]).await;
    seed(&store, "Ciara Carey", "carey@clinic.ie", "Cardiology", &["11:00", "16:00"]).await;
    store
}

#[tokio::test]
async fn empty_query_returns_everyone() {
    let store = clinic().await;
    let service = DoctorSearchService::new(store);

    let all = service.filter(DoctorSearchQuery::default()).await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn name_is_case_insensitive_substring() {
    let store = clinic().await;
    let service = DoctorSearchService::new(store);

    let found = service
        .filter(DoctorSearchQuery {
            name: Some("BYR".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Brian Byrne");
}

#[tokio::test]
async fn specialty_is_exact_not_substring() {
    let store = clinic().await;
    let service = DoctorSearchService::new(store);

    let exact = service
        .filter(DoctorSearchQuery {
            specialty: Some("cardiology".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(exact.len(), 2);

    let partial = service
        .filter(DoctorSearchQuery {
            specialty: Some("cardio".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(partial.is_empty());
}

#[tokio::test]
async fn am_period_never_returns_an_all_pm_doctor() {
    let store = clinic().await;
    let service = DoctorSearchService::new(store);

    let mornings = service
        .filter(DoctorSearchQuery {
            time_period: Some(TimePeriod::Am),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(mornings.iter().all(|d| d.name != "Brian Byrne"));
    assert_eq!(mornings.len(), 2);
}

#[tokio::test]
async fn mixed_slot_doctor_matches_both_periods() {
    let store = clinic().await;
    let service = DoctorSearchService::new(store);

    for period in [TimePeriod::Am, TimePeriod::Pm] {
        let found = service
            .filter(DoctorSearchQuery {
                time_period: Some(period),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(found.iter().any(|d| d.name == "Ciara Carey"));
    }
}

#[tokio::test]
async fn filters_compose_with_and_semantics() {
    let store = clinic().await;
    let service = DoctorSearchService::new(store);

    let found = service
        .filter(DoctorSearchQuery {
            name: Some("c".to_string()),
            specialty: Some("Cardiology".to_string()),
            time_period: Some(TimePeriod::Pm),
        })
        .await
        .unwrap();

    // "c" matches Carey by name, Cardiology excludes Byrne, pm excludes Adams.
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Ciara Carey");
}
