use async_trait::async_trait;
use tracing::info;

use crate::models::{ApprovalNotice, BookingNotice, RejectionNotice};

/// Outbound patient messaging. Implementations report delivery as a bool and
/// never fail the caller.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_booked(&self, notice: &BookingNotice) -> bool;

    async fn notify_approved(&self, notice: &ApprovalNotice) -> bool;

    async fn notify_rejected(&self, notice: &RejectionNotice) -> bool;
}

/// Writes notices to the log instead of sending them.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_booked(&self, notice: &BookingNotice) -> bool {
        info!(
            appointment_id = notice.appointment_id,
            "Booking received for {} with {} (email delivery disabled)",
            notice.patient_email,
            notice.doctor_name
        );
        true
    }

    async fn notify_approved(&self, notice: &ApprovalNotice) -> bool {
        info!(
            appointment_id = notice.appointment_id,
            "Appointment confirmed for {} with {} (email delivery disabled)",
            notice.patient_email,
            notice.doctor_name
        );
        true
    }

    async fn notify_rejected(&self, notice: &RejectionNotice) -> bool {
        info!(
            appointment_id = notice.appointment_id,
            "Appointment rejected for {} with {} (email delivery disabled)",
            notice.patient_email,
            notice.doctor_name
        );
        true
    }
}
