// libs/shared/models/src/clinic.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==============================================================================
// CONDITIONS AND PREDICTIONS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Diabetes,
    Heart,
    Liver,
    Kidney,
}

impl Condition {
    pub const ALL: [Condition; 4] = [
        Condition::Diabetes,
        Condition::Heart,
        Condition::Liver,
        Condition::Kidney,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Diabetes => "diabetes",
            Condition::Heart => "heart",
            Condition::Liver => "liver",
            Condition::Kidney => "kidney",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Condition {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "diabetes" => Ok(Condition::Diabetes),
            "heart" => Ok(Condition::Heart),
            "liver" => Ok(Condition::Liver),
            "kidney" => Ok(Condition::Kidney),
            other => Err(format!("Unknown condition: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Outcome {
    Positive,
    Negative,
}

impl Outcome {
    /// Label 1 is the positive class; every other label is negative.
    pub fn from_label(label: i64) -> Self {
        if label == 1 {
            Outcome::Positive
        } else {
            Outcome::Negative
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, Outcome::Positive)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Positive => write!(f, "Positive"),
            Outcome::Negative => write!(f, "Negative"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionRecord {
    pub id: i64,
    pub subject_id: i64,
    pub condition: Condition,
    pub outcome: Outcome,
    pub confidence: f64,
    pub raw_input: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPrediction {
    pub subject_id: i64,
    pub condition: Condition,
    pub outcome: Outcome,
    pub confidence: f64,
    pub raw_input: String,
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Approved,
    Rejected,
}

impl AppointmentStatus {
    /// Pending and approved appointments hold their slot.
    pub fn is_active(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Approved)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Approved | AppointmentStatus::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Approved => "approved",
            AppointmentStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: i64,
    pub subject_id: i64,
    pub prediction_id: Option<i64>,
    pub provider_id: Option<i64>,
    pub provider_name: String,
    pub specialization: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<i64>,
}

impl Appointment {
    pub fn slot(&self) -> SlotKey {
        SlotKey {
            provider_name: self.provider_name.clone(),
            date: self.appointment_date,
            time: self.appointment_time,
        }
    }

    /// A doctor manages appointments booked against their account. Bookings
    /// whose provider name never resolved to an account are open to any doctor.
    pub fn is_managed_by(&self, doctor_id: i64) -> bool {
        self.provider_id.map_or(true, |id| id == doctor_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub subject_id: i64,
    pub prediction_id: Option<i64>,
    pub provider_id: Option<i64>,
    pub provider_name: String,
    pub specialization: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub notes: Option<String>,
}

impl NewAppointment {
    pub fn slot(&self) -> SlotKey {
        SlotKey {
            provider_name: self.provider_name.clone(),
            date: self.appointment_date,
            time: self.appointment_time,
        }
    }
}

/// The (provider, date, time) tuple over which at most one active appointment may exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    pub provider_name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {} at {}", self.provider_name, self.date, self.time.format("%H:%M"))
    }
}

// ==============================================================================
// ACCOUNTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub specialization: String,
    pub qualification: Option<String>,
    pub experience_years: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDoctor {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub specialization: String,
    pub qualification: Option<String>,
    pub experience_years: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_parsing_is_case_insensitive() {
        assert_eq!("Diabetes".parse::<Condition>().unwrap(), Condition::Diabetes);
        assert_eq!(" HEART ".parse::<Condition>().unwrap(), Condition::Heart);
        assert!("lungs".parse::<Condition>().is_err());
    }

    #[test]
    fn test_outcome_from_label() {
        assert_eq!(Outcome::from_label(1), Outcome::Positive);
        assert_eq!(Outcome::from_label(0), Outcome::Negative);
        assert_eq!(Outcome::from_label(2), Outcome::Negative);
    }

    #[test]
    fn test_status_activity() {
        assert!(AppointmentStatus::Pending.is_active());
        assert!(AppointmentStatus::Approved.is_active());
        assert!(!AppointmentStatus::Rejected.is_active());
        assert!(!AppointmentStatus::Pending.is_terminal());
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let user = UserRecord {
            id: 1,
            username: "jane".to_string(),
            email: "jane@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            full_name: "Jane Doe".to_string(),
            phone: None,
            gender: None,
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["username"], "jane");
    }
}
