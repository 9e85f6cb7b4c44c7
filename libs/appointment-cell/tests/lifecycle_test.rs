use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use uuid::Uuid;

use appointment_cell::models::{AppointmentError, PrescriptionRequest};
use appointment_cell::services::lifecycle::{valid_transitions, LifecycleService};
use appointment_cell::services::prescription::PrescriptionService;
use shared_store::{Appointment, AppointmentStatus, ClinicStore, Doctor, MemoryStore, Patient};

async fn seed_appointment(store: &MemoryStore) -> Appointment {
    let doctor = store
        .create_doctor(Doctor {
            id: Uuid::new_v4(),
            name: "Dr. Nolan".to_string(),
            email: "nolan@clinic.ie".to_string(),
            specialty: "dermatology".to_string(),
            password: "pw".to_string(),
            available_times: vec![],
        })
        .await
        .unwrap();
    let patient = store
        .create_patient(Patient {
            id: Uuid::new_v4(),
            name: "Pat Doyle".to_string(),
            email: "pat@mail.com".to_string(),
            phone: "0851111111".to_string(),
            address: "4 Quay St".to_string(),
            password: "pw".to_string(),
        })
        .await
        .unwrap();
    store
        .create_appointment(Appointment {
            id: Uuid::new_v4(),
            doctor_id: doctor.id,
            patient_id: patient.id,
            appointment_time: Utc.with_ymd_and_hms(2030, 6, 10, 9, 0, 0).unwrap(),
            status: AppointmentStatus::Scheduled,
        })
        .await
        .unwrap()
}

fn prescription_for(appointment_id: Uuid) -> PrescriptionRequest {
    PrescriptionRequest {
        appointment_id,
        patient_name: "Pat Doyle".to_string(),
        medication: "Amoxicillin".to_string(),
        dosage: "500mg twice daily".to_string(),
        doctor_notes: Some("Finish the full course".to_string()),
    }
}

#[tokio::test]
async fn change_status_overwrites_without_a_transition_check() {
    let store = Arc::new(MemoryStore::new());
    let appointment = seed_appointment(&store).await;

    let service = LifecycleService::new(store.clone());
    // Straight from Scheduled to PrescriptionCreated, skipping Completed.
    service
        .change_status(appointment.id, AppointmentStatus::PrescriptionCreated)
        .await
        .unwrap();

    let current = store.find_appointment(appointment.id).await.unwrap().unwrap();
    assert_eq!(current.status, AppointmentStatus::PrescriptionCreated);

    let missing = service
        .change_status(Uuid::new_v4(), AppointmentStatus::Completed)
        .await;
    assert_matches!(missing, Err(AppointmentError::NotFound));
}

#[tokio::test]
async fn checked_variant_holds_the_forward_chain() {
    let store = Arc::new(MemoryStore::new());
    let appointment = seed_appointment(&store).await;

    let service = LifecycleService::new(store.clone());

    let skip = service
        .change_status_checked(appointment.id, AppointmentStatus::PrescriptionCreated)
        .await;
    assert_matches!(skip, Err(AppointmentError::InvalidTransition { .. }));

    service
        .change_status_checked(appointment.id, AppointmentStatus::Completed)
        .await
        .unwrap();
    service
        .change_status_checked(appointment.id, AppointmentStatus::PrescriptionCreated)
        .await
        .unwrap();

    let backwards = service
        .change_status_checked(appointment.id, AppointmentStatus::Scheduled)
        .await;
    assert_matches!(backwards, Err(AppointmentError::InvalidTransition { .. }));
}

#[test]
fn transition_table_is_a_single_forward_chain() {
    assert_eq!(
        valid_transitions(AppointmentStatus::Scheduled),
        &[AppointmentStatus::Completed]
    );
    assert_eq!(
        valid_transitions(AppointmentStatus::Completed),
        &[AppointmentStatus::PrescriptionCreated]
    );
    assert!(valid_transitions(AppointmentStatus::PrescriptionCreated).is_empty());
}

#[tokio::test]
async fn saving_a_prescription_marks_the_appointment() {
    let store = Arc::new(MemoryStore::new());
    let appointment = seed_appointment(&store).await;

    let service = PrescriptionService::new(store.clone());
    let saved = service
        .save_prescription(prescription_for(appointment.id))
        .await
        .unwrap();
    assert_eq!(saved.appointment_id, appointment.id);

    let current = store.find_appointment(appointment.id).await.unwrap().unwrap();
    assert_eq!(current.status, AppointmentStatus::PrescriptionCreated);

    let fetched = service.get_prescription(appointment.id).await.unwrap();
    assert_eq!(fetched.map(|p| p.id), Some(saved.id));
}

#[tokio::test]
async fn one_prescription_per_appointment() {
    let store = Arc::new(MemoryStore::new());
    let appointment = seed_appointment(&store).await;

    let service = PrescriptionService::new(store);
    service
        .save_prescription(prescription_for(appointment.id))
        .await
        .unwrap();

    let second = service.save_prescription(prescription_for(appointment.id)).await;
    assert_matches!(second, Err(AppointmentError::AlreadyPrescribed));
}

#[tokio::test]
async fn prescription_requires_an_existing_appointment() {
    let store = Arc::new(MemoryStore::new());
    let service = PrescriptionService::new(store);

    let orphan = service.save_prescription(prescription_for(Uuid::new_v4())).await;
    assert_matches!(orphan, Err(AppointmentError::NotFound));
}
