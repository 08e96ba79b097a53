use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Sent when a patient's request is stored and awaits the doctor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingNotice {
    pub appointment_id: i64,
    pub patient_email: String,
    pub patient_name: String,
    pub doctor_name: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApprovalNotice {
    pub appointment_id: i64,
    pub patient_email: String,
    pub patient_name: String,
    pub doctor_name: String,
    pub specialization: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RejectionNotice {
    pub appointment_id: i64,
    pub patient_email: String,
    pub patient_name: String,
    pub doctor_name: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub reason: Option<String>,
}

/// Rendered message ready for the mail transport.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// JSON body accepted by the mail API.
#[derive(Debug, Serialize)]
pub struct MailApiRequest<'a> {
    pub from: String,
    pub to: Vec<&'a str>,
    pub reply_to: &'a str,
    pub subject: &'a str,
    pub html: &'a str,
    pub text: &'a str,
}

pub(crate) fn display_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn display_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}
