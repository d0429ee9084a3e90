//! Status projection — CSS classes and French labels for rendering.

use crate::models::{AppointmentStatus, AppointmentType};

pub fn status_css_class(status: AppointmentStatus) -> &'static str {
    match status {
        AppointmentStatus::Pending => "status-pending",
        AppointmentStatus::Accepted => "status-accepted",
        AppointmentStatus::Scheduled => "status-scheduled",
        AppointmentStatus::Completed => "status-completed",
        AppointmentStatus::Cancelled => "status-cancelled",
        AppointmentStatus::Rejected => "status-rejected",
    }
}

pub fn status_label(status: AppointmentStatus) -> &'static str {
    match status {
        AppointmentStatus::Pending => "En attente",
        AppointmentStatus::Accepted => "Accepté",
        AppointmentStatus::Scheduled => "Programmé",
        AppointmentStatus::Completed => "Terminé",
        AppointmentStatus::Cancelled => "Annulé",
        AppointmentStatus::Rejected => "Rejeté",
    }
}

/// Class for a raw status string; unknown values get `status-default`.
pub fn raw_status_css_class(raw: &str) -> &'static str {
    raw.parse()
        .map(status_css_class)
        .unwrap_or("status-default")
}

/// Label for a raw status string; unknown values render as-is.
pub fn raw_status_label(raw: &str) -> String {
    raw.parse()
        .map(|s| status_label(s).to_string())
        .unwrap_or_else(|_| raw.to_string())
}

pub fn type_label(kind: &AppointmentType) -> &str {
    match kind {
        AppointmentType::Consultation => "Consultation",
        AppointmentType::FollowUp => "Suivi",
        AppointmentType::Emergency => "Urgence",
        AppointmentType::Checkup => "Bilan de santé",
        AppointmentType::Routine => "Routine",
        AppointmentType::Specialist => "Spécialiste",
        AppointmentType::Other(raw) => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_status_has_class_and_label() {
        for status in AppointmentStatus::ALL {
            assert!(status_css_class(status).starts_with("status-"));
            assert!(!status_label(status).is_empty());
        }
        assert_eq!(status_label(AppointmentStatus::Pending), "En attente");
        assert_eq!(status_css_class(AppointmentStatus::Rejected), "status-rejected");
    }

    #[test]
    fn raw_strings_are_case_insensitive() {
        assert_eq!(raw_status_css_class("scheduled"), "status-scheduled");
        assert_eq!(raw_status_label("completed"), "Terminé");
    }

    #[test]
    fn unknown_raw_status() {
        assert_eq!(raw_status_css_class("ARCHIVED"), "status-default");
        assert_eq!(raw_status_label("ARCHIVED"), "ARCHIVED");
    }

    #[test]
    fn type_labels() {
        assert_eq!(type_label(&AppointmentType::parse("FOLLOW-UP")), "Suivi");
        assert_eq!(type_label(&AppointmentType::Checkup), "Bilan de santé");
        assert_eq!(type_label(&AppointmentType::Other("Téléconsultation".into())), "Téléconsultation");
    }
}
