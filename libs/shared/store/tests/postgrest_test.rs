use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::AppConfig;
use shared_store::postgrest::PostgrestStore;
use shared_store::{Appointment, AppointmentStatus, ClinicStore, StoreError};

fn store_for(server: &MockServer) -> PostgrestStore {
    PostgrestStore::new(&AppConfig {
        postgrest_url: server.uri(),
        postgrest_api_key: "test-key".to_string(),
        jwt_secret: "unused".to_string(),
        token_ttl_secs: 3600,
        port: 0,
    })
}

fn appointment_row(appointment: &Appointment) -> serde_json::Value {
    json!({
        "id": appointment.id,
        "doctor_id": appointment.doctor_id,
        "patient_id": appointment.patient_id,
        "appointment_time": appointment.appointment_time.to_rfc3339(),
        "status": i32::from(appointment.status),
    })
}

#[tokio::test]
async fn doctor_exists_maps_result_sets() {
    let server = MockServer::start().await;
    let store = store_for(&server);
    let known = Uuid::new_v4();
    let unknown = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/doctors"))
        .and(query_param("id", format!("eq.{}", known)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": known }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/doctors"))
        .and(query_param("id", format!("eq.{}", unknown)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    assert!(store.doctor_exists(known).await.unwrap());
    assert!(!store.doctor_exists(unknown).await.unwrap());
}

#[tokio::test]
async fn unique_slot_violation_surfaces_as_conflict() {
    let server = MockServer::start().await;
    let store = store_for(&server);

    Mock::given(method("POST"))
        .and(path("/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "duplicate key value violates unique constraint \"appointments_doctor_id_appointment_time_key\""
        })))
        .mount(&server)
        .await;

    let result = store
        .create_appointment(Appointment {
            id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            appointment_time: Utc.with_ymd_and_hms(2030, 6, 10, 9, 30, 0).unwrap(),
            status: AppointmentStatus::Scheduled,
        })
        .await;

    assert_matches!(result, Err(StoreError::Conflict(_)));
}

#[tokio::test]
async fn day_window_query_parses_rows() {
    let server = MockServer::start().await;
    let store = store_for(&server);
    let doctor_id = Uuid::new_v4();
    let booked = Appointment {
        id: Uuid::new_v4(),
        doctor_id,
        patient_id: Uuid::new_v4(),
        appointment_time: Utc.with_ymd_and_hms(2030, 6, 10, 9, 30, 0).unwrap(),
        status: AppointmentStatus::Scheduled,
    };

    Mock::given(method("GET"))
        .and(path("/appointments"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .and(query_param("order", "appointment_time.asc"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([appointment_row(&booked)])),
        )
        .mount(&server)
        .await;

    let start = Utc.with_ymd_and_hms(2030, 6, 10, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2030, 6, 11, 0, 0, 0).unwrap();
    let found = store
        .appointments_for_doctor_between(doctor_id, start, end)
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, booked.id);
    assert_eq!(found[0].status, AppointmentStatus::Scheduled);
}

#[tokio::test]
async fn name_filters_survive_reserved_url_characters() {
    let server = MockServer::start().await;
    let store = store_for(&server);

    // An unescaped '&' in the name would split the filter into a bogus
    // extra query parameter and this matcher would never see it.
    Mock::given(method("GET"))
        .and(path("/appointments"))
        .and(query_param("patients.name", "ilike.*Doyle & Sons*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let start = Utc.with_ymd_and_hms(2030, 6, 10, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2030, 6, 11, 0, 0, 0).unwrap();
    let found = store
        .appointments_between(start, end, Some("Doyle & Sons"))
        .await
        .unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn email_lookup_encodes_the_value() {
    let server = MockServer::start().await;
    let store = store_for(&server);

    Mock::given(method("GET"))
        .and(path("/patients"))
        .and(query_param("email", "eq.pat+test@mail.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let found = store.find_patient_by_email("pat+test@mail.com").await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn status_update_on_missing_appointment_is_not_found() {
    let server = MockServer::start().await;
    let store = store_for(&server);

    // PATCH with representation answers 200 with an empty set when the
    // filter matched no rows.
    Mock::given(method("PATCH"))
        .and(path("/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let result = store
        .update_appointment_status(Uuid::new_v4(), AppointmentStatus::Completed)
        .await;
    assert_matches!(result, Err(StoreError::NotFound));
}
