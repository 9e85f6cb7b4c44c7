use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{header::CONTENT_TYPE, Client, Method};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::error::StoreError;
use crate::records::{Admin, Appointment, AppointmentStatus, Doctor, Patient, Prescription};
use crate::ClinicStore;

/// `ClinicStore` backed by a PostgREST endpoint. The relational schema must
/// carry a unique constraint on (doctor_id, appointment_time) — inserts rely
/// on the resulting 409 to make booking reserve-or-reject — plus unique
/// patient email/phone and doctor email.
pub struct PostgrestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

fn ts(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// User-supplied values go into filter strings percent-encoded; a literal
// '&' or ',' in a name would otherwise split the query.
fn esc(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

impl PostgrestStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.postgrest_url.clone(),
            api_key: config.postgrest_api_key.clone(),
        }
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        representation: bool,
    ) -> Result<reqwest::Response, StoreError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("PostgREST request: {} {}", method, url);

        let mut req = self
            .client
            .request(method, &url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json");

        if representation {
            req = req.header("Prefer", "return=representation");
        }
        if let Some(body) = body {
            req = req.json(&body);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("PostgREST error ({}): {}", status, text);
            return Err(match status.as_u16() {
                409 => StoreError::Conflict(text),
                404 => StoreError::NotFound,
                _ => StoreError::Backend(format!("PostgREST error ({}): {}", status, text)),
            });
        }
        Ok(response)
    }

    async fn rows<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, StoreError> {
        let response = self.execute(Method::GET, path, None, false).await?;
        let raw: Vec<Value> = response.json().await?;
        raw.into_iter()
            .map(|row| serde_json::from_value(row).map_err(StoreError::from))
            .collect()
    }

    async fn first<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, StoreError> {
        Ok(self.rows(path).await?.into_iter().next())
    }

    /// POST with `return=representation`; PostgREST answers with the inserted
    /// rows.
    async fn insert<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Value,
    ) -> Result<T, StoreError> {
        let response = self.execute(Method::POST, path, Some(body), true).await?;
        let raw: Vec<Value> = response.json().await?;
        match raw.into_iter().next() {
            Some(row) => Ok(serde_json::from_value(row)?),
            None => Err(StoreError::Backend("insert returned no row".to_string())),
        }
    }

    /// PATCH with representation; an empty result set means the filter
    /// matched nothing.
    async fn patch<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Value,
    ) -> Result<T, StoreError> {
        let response = self.execute(Method::PATCH, path, Some(body), true).await?;
        let raw: Vec<Value> = response.json().await?;
        match raw.into_iter().next() {
            Some(row) => Ok(serde_json::from_value(row)?),
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete_where(&self, path: &str) -> Result<usize, StoreError> {
        let response = self.execute(Method::DELETE, path, None, true).await?;
        let raw: Vec<Value> = response.json().await?;
        Ok(raw.len())
    }
}

#[async_trait]
impl ClinicStore for PostgrestStore {
    async fn find_doctor(&self, id: Uuid) -> Result<Option<Doctor>, StoreError> {
        self.first(&format!("/doctors?id=eq.{}&limit=1", id)).await
    }

    async fn find_doctor_by_email(&self, email: &str) -> Result<Option<Doctor>, StoreError> {
        self.first(&format!("/doctors?email=eq.{}&limit=1", esc(email)))
            .await
    }

    async fn doctor_exists(&self, id: Uuid) -> Result<bool, StoreError> {
        let rows: Vec<Value> = self
            .rows(&format!("/doctors?id=eq.{}&select=id", id))
            .await?;
        Ok(!rows.is_empty())
    }

    async fn list_doctors(&self) -> Result<Vec<Doctor>, StoreError> {
        self.rows("/doctors?order=name.asc").await
    }

    async fn create_doctor(&self, doctor: Doctor) -> Result<Doctor, StoreError> {
        self.insert("/doctors", serde_json::to_value(&doctor)?).await
    }

    async fn update_doctor(&self, doctor: Doctor) -> Result<Doctor, StoreError> {
        let path = format!("/doctors?id=eq.{}", doctor.id);
        self.patch(&path, serde_json::to_value(&doctor)?).await
    }

    async fn delete_doctor(&self, id: Uuid) -> Result<(), StoreError> {
        if !self.doctor_exists(id).await? {
            return Err(StoreError::NotFound);
        }
        // Two-phase cascade, dependents first. The two deletes are separate
        // HTTP requests, not one transaction: a failure between them leaves
        // the doctor behind with its appointments already gone. Retrying the
        // delete converges, and no orphan appointments can result.
        self.delete_where(&format!("/appointments?doctor_id=eq.{}", id))
            .await?;
        self.delete_where(&format!("/doctors?id=eq.{}", id)).await?;
        Ok(())
    }

    async fn find_patient(&self, id: Uuid) -> Result<Option<Patient>, StoreError> {
        self.first(&format!("/patients?id=eq.{}&limit=1", id)).await
    }

    async fn find_patient_by_email(&self, email: &str) -> Result<Option<Patient>, StoreError> {
        self.first(&format!("/patients?email=eq.{}&limit=1", esc(email)))
            .await
    }

    async fn find_patient_by_email_or_phone(
        &self,
        email: &str,
        phone: &str,
    ) -> Result<Option<Patient>, StoreError> {
        self.first(&format!(
            "/patients?or=(email.eq.{},phone.eq.{})&limit=1",
            esc(email),
            esc(phone)
        ))
        .await
    }

    async fn create_patient(&self, patient: Patient) -> Result<Patient, StoreError> {
        self.insert("/patients", serde_json::to_value(&patient)?)
            .await
    }

    async fn find_admin_by_username(&self, username: &str) -> Result<Option<Admin>, StoreError> {
        self.first(&format!("/admins?username=eq.{}&limit=1", esc(username)))
            .await
    }

    async fn create_appointment(
        &self,
        appointment: Appointment,
    ) -> Result<Appointment, StoreError> {
        // The (doctor_id, appointment_time) unique constraint turns a lost
        // race into a 409, surfaced here as Conflict.
        self.insert("/appointments", serde_json::to_value(&appointment)?)
            .await
    }

    async fn update_appointment(
        &self,
        appointment: Appointment,
    ) -> Result<Appointment, StoreError> {
        let path = format!("/appointments?id=eq.{}", appointment.id);
        self.patch(&path, serde_json::to_value(&appointment)?).await
    }

    async fn delete_appointment(&self, id: Uuid) -> Result<(), StoreError> {
        let deleted = self
            .delete_where(&format!("/appointments?id=eq.{}", id))
            .await?;
        if deleted == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn appointment_exists(&self, id: Uuid) -> Result<bool, StoreError> {
        let rows: Vec<Value> = self
            .rows(&format!("/appointments?id=eq.{}&select=id", id))
            .await?;
        Ok(!rows.is_empty())
    }

    async fn find_appointment(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        self.first(&format!("/appointments?id=eq.{}&limit=1", id))
            .await
    }

    async fn appointments_for_doctor_between(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError> {
        self.rows(&format!(
            "/appointments?doctor_id=eq.{}&appointment_time=gte.{}&appointment_time=lt.{}&order=appointment_time.asc",
            doctor_id,
            ts(start),
            ts(end)
        ))
        .await
    }

    async fn appointments_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        patient_name: Option<&str>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let path = match patient_name {
            Some(name) => format!(
                "/appointments?select=*,patients!inner(name)&appointment_time=gte.{}&appointment_time=lt.{}&patients.name=ilike.*{}*&order=appointment_time.asc",
                ts(start),
                ts(end),
                esc(name)
            ),
            None => format!(
                "/appointments?appointment_time=gte.{}&appointment_time=lt.{}&order=appointment_time.asc",
                ts(start),
                ts(end)
            ),
        };
        self.rows(&path).await
    }

    async fn appointments_for_patient(
        &self,
        patient_id: Uuid,
        status: Option<AppointmentStatus>,
        doctor_name: Option<&str>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let mut query_parts = vec![format!("patient_id=eq.{}", patient_id)];
        let mut select = String::new();
        if let Some(status) = status {
            query_parts.push(format!("status=eq.{}", i32::from(status)));
        }
        if let Some(name) = doctor_name {
            select = "select=*,doctors!inner(name)&".to_string();
            query_parts.push(format!("doctors.name=ilike.*{}*", esc(name)));
        }
        let path = format!(
            "/appointments?{}{}&order=appointment_time.asc",
            select,
            query_parts.join("&")
        );
        self.rows(&path).await
    }

    async fn update_appointment_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<(), StoreError> {
        let path = format!("/appointments?id=eq.{}", id);
        let _: Appointment = self
            .patch(&path, json!({ "status": i32::from(status) }))
            .await?;
        Ok(())
    }

    async fn prescription_for_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Option<Prescription>, StoreError> {
        self.first(&format!(
            "/prescriptions?appointment_id=eq.{}&limit=1",
            appointment_id
        ))
        .await
    }

    async fn create_prescription(
        &self,
        prescription: Prescription,
    ) -> Result<Prescription, StoreError> {
        self.insert("/prescriptions", serde_json::to_value(&prescription)?)
            .await
    }
}
