// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use shared_models::clinic::AppointmentStatus;

use crate::models::AppointmentError;

pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: &AppointmentStatus,
        new_status: &AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!(
            "Validating status transition from {:?} to {:?}",
            current_status, new_status
        );

        if !self.get_valid_transitions(current_status).contains(new_status) {
            warn!(
                "Invalid status transition attempted: {:?} -> {:?}",
                current_status, new_status
            );
            return Err(AppointmentError::InvalidStatusTransition {
                current: *current_status,
            });
        }

        Ok(())
    }

    pub fn get_valid_transitions(&self, current_status: &AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => {
                vec![AppointmentStatus::Approved, AppointmentStatus::Rejected]
            }
            // Terminal states
            AppointmentStatus::Approved | AppointmentStatus::Rejected => vec![],
        }
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
