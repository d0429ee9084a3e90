//! Appointment lifecycle as an explicit finite-state machine.
//!
//! ```text
//! PENDING ──accept──▶ ACCEPTED ──schedule──▶ SCHEDULED
//!    │                   │                      │
//!    ├─reject─▶ REJECTED ├─complete─▶ COMPLETED ◀┤
//!    └─cancel─▶ CANCELLED ◀──cancel──────────────┘
//! ```
//!
//! REJECTED, COMPLETED and CANCELLED are terminal. Clients check actions
//! against this table before dispatching; the server stays authoritative.

use serde::{Deserialize, Serialize};

use crate::error::PortalError;
use crate::models::AppointmentStatus;

/// A lifecycle action a patient or doctor can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentAction {
    Accept,
    Reject,
    Schedule,
    Complete,
    Cancel,
}

impl AppointmentAction {
    /// Status the appointment lands in when the action succeeds.
    pub fn target_status(self) -> AppointmentStatus {
        match self {
            Self::Accept => AppointmentStatus::Accepted,
            Self::Reject => AppointmentStatus::Rejected,
            Self::Schedule => AppointmentStatus::Scheduled,
            Self::Complete => AppointmentStatus::Completed,
            Self::Cancel => AppointmentStatus::Cancelled,
        }
    }
}

impl std::fmt::Display for AppointmentAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accept => write!(f, "accept"),
            Self::Reject => write!(f, "reject"),
            Self::Schedule => write!(f, "schedule"),
            Self::Complete => write!(f, "complete"),
            Self::Cancel => write!(f, "cancel"),
        }
    }
}

/// Actions permitted from `status`. Empty for terminal states.
pub fn allowed_actions(status: AppointmentStatus) -> &'static [AppointmentAction] {
    use AppointmentAction::*;
    match status {
        AppointmentStatus::Pending => &[Accept, Reject, Cancel],
        AppointmentStatus::Accepted => &[Schedule, Complete, Cancel],
        AppointmentStatus::Scheduled => &[Complete, Cancel],
        AppointmentStatus::Completed
        | AppointmentStatus::Cancelled
        | AppointmentStatus::Rejected => &[],
    }
}

/// Validate `action` from `from` and return the resulting status.
pub fn transition(
    from: AppointmentStatus,
    action: AppointmentAction,
) -> Result<AppointmentStatus, PortalError> {
    if allowed_actions(from).contains(&action) {
        let to = action.target_status();
        tracing::debug!(%from, %to, %action, "Lifecycle transition validated");
        Ok(to)
    } else {
        tracing::warn!(%from, %action, "Illegal lifecycle transition refused");
        Err(PortalError::InvalidTransition { from, action })
    }
}

pub fn is_terminal(status: AppointmentStatus) -> bool {
    allowed_actions(status).is_empty()
}

/// Cancellation is open while the consultation has not happened:
/// PENDING, ACCEPTED or SCHEDULED.
pub fn can_cancel(status: AppointmentStatus) -> bool {
    allowed_actions(status).contains(&AppointmentAction::Cancel)
}
