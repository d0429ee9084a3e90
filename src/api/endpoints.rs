//! Gateway paths for the portal microservices.
//!
//! Appointment ids are appended as percent-encoded path segments by
//! `ApiClient::url`, never interpolated into these strings.

// ── user-service (patient side, enveloped responses) ────────

pub const PATIENT_APPOINTMENTS: &str = "/user-service/api/v1/appointments";
pub const PATIENT_DOCTORS: &str = "/user-service/api/v1/appointments/doctors";
pub const PATIENT_CANCEL: &str = "cancel";

// ── doctor-activation-service (doctor side, raw DTOs) ───────

pub const DOCTOR_APPOINTMENTS: &str = "/doctor-activation-service/api/doctors/appointments";
pub const DOCTOR_UPCOMING: &str = "/doctor-activation-service/api/doctors/appointments/upcoming";
pub const DOCTOR_PENDING: &str = "/doctor-activation-service/api/doctors/appointments/pending";
pub const DOCTOR_PATIENTS: &str = "/doctor-activation-service/api/doctors/appointments/patients";
pub const DOCTOR_STATS: &str = "/doctor-activation-service/api/doctors/appointments/dashboard/stats";
pub const DOCTOR_APPOINTMENT_DETAILS: &str = "/doctor-activation-service/api/appointments";
pub const DOCTOR_PATIENT_DETAILS: &str = "/doctor-activation-service/api/patients";

// ── auth ────────────────────────────────────────────────────

pub const PATIENT_LOGIN: &str = "/auth-service/api/v1/auth/login";
pub const DOCTOR_LOGIN: &str = "/doctor-activation-service/api/doctors/login";

/// Trailing path segment for a doctor-side lifecycle action.
///
/// `Schedule` is reached through the server's own accept handling and has
/// no endpoint of its own.
pub fn doctor_action_segment(action: crate::lifecycle::AppointmentAction) -> Option<&'static str> {
    use crate::lifecycle::AppointmentAction::*;
    match action {
        Accept => Some("accept"),
        Reject => Some("reject"),
        Complete => Some("complete"),
        Cancel => Some("cancel"),
        Schedule => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::AppointmentAction;

    #[test]
    fn schedule_has_no_doctor_endpoint() {
        assert_eq!(doctor_action_segment(AppointmentAction::Accept), Some("accept"));
        assert_eq!(doctor_action_segment(AppointmentAction::Cancel), Some("cancel"));
        assert_eq!(doctor_action_segment(AppointmentAction::Schedule), None);
    }
}
