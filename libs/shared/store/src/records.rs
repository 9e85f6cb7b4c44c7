use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A doctor as the directory stores it. `available_times` is the recurring
/// slot list in the doctor's declared order; that order is meaningful and
/// every read path preserves it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub specialty: String,
    pub password: String,
    pub available_times: Vec<NaiveTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    pub id: Uuid,
    pub username: String,
    pub password: String,
}

/// Appointment status, serialized as the integers the original schema used:
/// 0 = scheduled, 1 = completed, 2 = prescription created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    PrescriptionCreated,
}

impl From<AppointmentStatus> for i32 {
    fn from(status: AppointmentStatus) -> i32 {
        match status {
            AppointmentStatus::Scheduled => 0,
            AppointmentStatus::Completed => 1,
            AppointmentStatus::PrescriptionCreated => 2,
        }
    }
}

impl TryFrom<i32> for AppointmentStatus {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AppointmentStatus::Scheduled),
            1 => Ok(AppointmentStatus::Completed),
            2 => Ok(AppointmentStatus::PrescriptionCreated),
            other => Err(format!("unknown appointment status: {}", other)),
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::PrescriptionCreated => write!(f, "prescription_created"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub appointment_time: DateTime<Utc>,
    pub status: AppointmentStatus,
}

impl Appointment {
    /// Every visit occupies a fixed one-hour window; the end is derived,
    /// never stored.
    pub fn end_time(&self) -> DateTime<Utc> {
        self.appointment_time + Duration::hours(1)
    }

    pub fn time_of_day(&self) -> NaiveTime {
        self.appointment_time.time()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_name: String,
    pub medication: String,
    pub dosage: String,
    pub doctor_notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn status_round_trips_through_integers() {
        for status in [
            AppointmentStatus::Scheduled,
            AppointmentStatus::Completed,
            AppointmentStatus::PrescriptionCreated,
        ] {
            let n: i32 = status.into();
            assert_eq!(AppointmentStatus::try_from(n).unwrap(), status);
        }
        assert!(AppointmentStatus::try_from(3).is_err());
    }

    #[test]
    fn status_serializes_as_integer() {
        let json = serde_json::to_string(&AppointmentStatus::Completed).unwrap();
        assert_eq!(json, "1");
        let back: AppointmentStatus = serde_json::from_str("2").unwrap();
        assert_eq!(back, AppointmentStatus::PrescriptionCreated);
    }

    #[test]
    fn end_time_is_one_hour_after_start() {
        let start = Utc.with_ymd_and_hms(2025, 6, 10, 9, 30, 0).unwrap();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            appointment_time: start,
            status: AppointmentStatus::Scheduled,
        };
        assert_eq!(appointment.end_time(), start + Duration::hours(1));
        assert_eq!(
            appointment.time_of_day(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
    }
}
