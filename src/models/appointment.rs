use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::{AppointmentStatus, AppointmentType, CancelledBy};

/// A consultation between one patient and one doctor, tracked through its
/// status lifecycle. Never deleted client-side; only the status moves.
///
/// On the wire this is the flat camelCase DTO both appointment services
/// return; the optional groups below are assembled from those flat fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "AppointmentWire", into = "AppointmentWire")]
pub struct Appointment {
    pub id: String,
    pub patient: PatientRef,
    pub doctor: DoctorRef,
    pub appointment_date_time: NaiveDateTime,
    pub appointment_type: AppointmentType,
    pub reason: String,
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    pub cancellation: Option<CancellationInfo>,
    pub doctor_response: Option<DoctorResponse>,
    pub completion: Option<CompletionRecord>,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PatientRef {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DoctorRef {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub specialization: Option<String>,
}

/// Who cancelled, why and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationInfo {
    pub cancelled_by: Option<CancelledBy>,
    pub reason: Option<String>,
    pub cancelled_at: Option<NaiveDateTime>,
}

/// Doctor's answer to a booking (rejection reason, suggested hours).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorResponse {
    pub response: Option<String>,
    pub reason: Option<String>,
    pub available_hours_suggestion: Option<String>,
    pub responded_at: Option<NaiveDateTime>,
}

/// Consultation outcome recorded on completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRecord {
    pub diagnosis: String,
    pub prescription: String,
    pub doctor_notes: Option<String>,
    pub completed_at: Option<NaiveDateTime>,
}

impl Appointment {
    /// Copy of this appointment with a different status.
    pub fn with_status(&self, status: AppointmentStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    pub fn can_cancel(&self) -> bool {
        crate::lifecycle::can_cancel(self.status)
    }
}

/// Decode a server list one row at a time. A row that does not parse is
/// logged and left out; the rest of the list still loads.
pub fn decode_rows(rows: Vec<serde_json::Value>) -> Vec<Appointment> {
    let total = rows.len();
    let list: Vec<Appointment> = rows
        .into_iter()
        .filter_map(|row| {
            let id = row
                .get("id")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("?")
                .to_string();
            match serde_json::from_value::<Appointment>(row) {
                Ok(appointment) => Some(appointment),
                Err(e) => {
                    tracing::warn!(appointment_id = %id, error = %e, "Skipping unreadable appointment row");
                    None
                }
            }
        })
        .collect();

    if list.len() < total {
        tracing::warn!(total, kept = list.len(), "Appointment list partially decoded");
    }
    list
}

// ─── Wire DTO ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppointmentWire {
    id: String,
    #[serde(default)]
    patient_id: String,
    #[serde(default)]
    patient_name: String,
    #[serde(default)]
    patient_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    patient_phone: Option<String>,
    #[serde(default)]
    doctor_id: String,
    #[serde(default)]
    doctor_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    doctor_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    specialization: Option<String>,
    #[serde(with = "crate::datetime")]
    appointment_date_time: NaiveDateTime,
    #[serde(default)]
    appointment_type: AppointmentType,
    #[serde(default)]
    reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cancelled_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cancellation_reason: Option<String>,
    #[serde(default, with = "crate::datetime::option", skip_serializing_if = "Option::is_none")]
    cancelled_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    doctor_response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    doctor_response_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    available_hours_suggestion: Option<String>,
    #[serde(default, with = "crate::datetime::option", skip_serializing_if = "Option::is_none")]
    responded_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    diagnosis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prescription: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    doctor_notes: Option<String>,
    #[serde(default, with = "crate::datetime::option", skip_serializing_if = "Option::is_none")]
    completed_at: Option<NaiveDateTime>,
    #[serde(default, with = "crate::datetime::option", skip_serializing_if = "Option::is_none")]
    created_at: Option<NaiveDateTime>,
}

impl From<AppointmentWire> for Appointment {
    fn from(w: AppointmentWire) -> Self {
        let cancelled_by = w.cancelled_by.as_deref().and_then(|raw| match raw.parse() {
            Ok(by) => Some(by),
            Err(_) => {
                tracing::debug!(value = raw, appointment_id = %w.id, "Unknown cancelledBy value");
                None
            }
        });

        let cancellation = (cancelled_by.is_some()
            || w.cancellation_reason.is_some()
            || w.cancelled_at.is_some())
        .then(|| CancellationInfo {
            cancelled_by,
            reason: w.cancellation_reason,
            cancelled_at: w.cancelled_at,
        });

        let doctor_response = (w.doctor_response.is_some()
            || w.doctor_response_reason.is_some()
            || w.available_hours_suggestion.is_some()
            || w.responded_at.is_some())
        .then(|| DoctorResponse {
            response: w.doctor_response,
            reason: w.doctor_response_reason,
            available_hours_suggestion: w.available_hours_suggestion,
            responded_at: w.responded_at,
        });

        let completion = (w.diagnosis.is_some() || w.prescription.is_some()).then(|| CompletionRecord {
            diagnosis: w.diagnosis.unwrap_or_default(),
            prescription: w.prescription.unwrap_or_default(),
            doctor_notes: w.doctor_notes,
            completed_at: w.completed_at,
        });

        Appointment {
            id: w.id,
            patient: PatientRef {
                id: w.patient_id,
                name: w.patient_name,
                email: w.patient_email,
                phone: w.patient_phone,
            },
            doctor: DoctorRef {
                id: w.doctor_id,
                name: w.doctor_name,
                email: w.doctor_email,
                specialization: w.specialization,
            },
            appointment_date_time: w.appointment_date_time,
            appointment_type: w.appointment_type,
            reason: w.reason,
            notes: w.notes,
            status: w.status,
            cancellation,
            doctor_response,
            completion,
            created_at: w.created_at,
        }
    }
}

impl From<Appointment> for AppointmentWire {
    fn from(a: Appointment) -> Self {
        let (cancelled_by, cancellation_reason, cancelled_at) = match a.cancellation {
            Some(c) => (c.cancelled_by.map(|b| b.as_str().to_string()), c.reason, c.cancelled_at),
            None => (None, None, None),
        };
        let (doctor_response, doctor_response_reason, available_hours_suggestion, responded_at) =
            match a.doctor_response {
                Some(r) => (r.response, r.reason, r.available_hours_suggestion, r.responded_at),
                None => (None, None, None, None),
            };
        let (diagnosis, prescription, doctor_notes, completed_at) = match a.completion {
            Some(c) => (Some(c.diagnosis), Some(c.prescription), c.doctor_notes, c.completed_at),
            None => (None, None, None, None),
        };

        AppointmentWire {
            id: a.id,
            patient_id: a.patient.id,
            patient_name: a.patient.name,
            patient_email: a.patient.email,
            patient_phone: a.patient.phone,
            doctor_id: a.doctor.id,
            doctor_name: a.doctor.name,
            doctor_email: a.doctor.email,
            specialization: a.doctor.specialization,
            appointment_date_time: a.appointment_date_time,
            appointment_type: a.appointment_type,
            reason: a.reason,
            notes: a.notes,
            status: a.status,
            cancelled_by,
            cancellation_reason,
            cancelled_at,
            doctor_response,
            doctor_response_reason,
            available_hours_suggestion,
            responded_at,
            diagnosis,
            prescription,
            doctor_notes,
            completed_at,
            created_at: a.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const DOCTOR_SIDE: &str = r#"{
        "id": "a1",
        "patientId": "p1",
        "patientName": "Amina Benali",
        "patientEmail": "amina@example.org",
        "doctorId": "d1",
        "doctorName": "Dr Martin",
        "specialization": "Cardiologie",
        "appointmentDateTime": [2024, 12, 1, 14, 0],
        "appointmentType": "CONSULTATION",
        "reason": "checkup",
        "status": "REJECTED",
        "doctorResponse": "REJECTED",
        "doctorResponseReason": "Congrès",
        "availableHoursSuggestion": "Lundi 9h-12h",
        "createdAt": "2024-11-20T10:15:00"
    }"#;

    #[test]
    fn deserializes_flat_doctor_dto() {
        let appt: Appointment = serde_json::from_str(DOCTOR_SIDE).unwrap();
        assert_eq!(appt.id, "a1");
        assert_eq!(appt.patient.name, "Amina Benali");
        assert_eq!(appt.doctor.specialization.as_deref(), Some("Cardiologie"));
        assert_eq!(
            appt.appointment_date_time,
            NaiveDate::from_ymd_opt(2024, 12, 1).unwrap().and_hms_opt(14, 0, 0).unwrap()
        );
        assert_eq!(appt.status, AppointmentStatus::Rejected);
        let response = appt.doctor_response.expect("doctor response assembled");
        assert_eq!(response.reason.as_deref(), Some("Congrès"));
        assert_eq!(response.available_hours_suggestion.as_deref(), Some("Lundi 9h-12h"));
        assert!(appt.cancellation.is_none());
        assert!(appt.completion.is_none());
    }

    #[test]
    fn completion_and_cancellation_groups() {
        let json = r#"{
            "id": "a2", "appointmentDateTime": "2025-01-10T09:00:00",
            "status": "COMPLETED", "diagnosis": "Hypertension", "prescription": "Amlodipine 5mg",
            "completedAt": [2025, 1, 10, 9, 40]
        }"#;
        let appt: Appointment = serde_json::from_str(json).unwrap();
        let done = appt.completion.unwrap();
        assert_eq!(done.diagnosis, "Hypertension");
        assert!(done.completed_at.is_some());

        let json = r#"{
            "id": "a3", "appointmentDateTime": "2025-01-10T09:00:00",
            "status": "CANCELLED", "cancelledBy": "PATIENT", "cancellationReason": "Empêchement"
        }"#;
        let appt: Appointment = serde_json::from_str(json).unwrap();
        let c = appt.cancellation.unwrap();
        assert_eq!(c.cancelled_by, Some(CancelledBy::Patient));
        assert_eq!(c.reason.as_deref(), Some("Empêchement"));
    }

    #[test]
    fn unknown_cancelled_by_is_dropped_not_fatal() {
        let json = r#"{"id":"a4","appointmentDateTime":"2025-01-10T09:00:00","status":"CANCELLED","cancelledBy":"SYSTEM"}"#;
        let appt: Appointment = serde_json::from_str(json).unwrap();
        assert!(appt.cancellation.is_none());
    }

    #[test]
    fn serializes_back_to_flat_wire_form() {
        let appt: Appointment = serde_json::from_str(DOCTOR_SIDE).unwrap();
        let json = serde_json::to_value(&appt).unwrap();
        assert_eq!(json["patientId"], "p1");
        assert_eq!(json["appointmentDateTime"], "2024-12-01T14:00:00");
        assert_eq!(json["doctorResponseReason"], "Congrès");
        assert!(json.get("diagnosis").is_none());

        let back: Appointment = serde_json::from_value(json).unwrap();
        assert_eq!(back, appt);
    }

    #[test]
    fn with_status_keeps_everything_else() {
        let appt: Appointment = serde_json::from_str(DOCTOR_SIDE).unwrap();
        let moved = appt.with_status(AppointmentStatus::Pending);
        assert_eq!(moved.status, AppointmentStatus::Pending);
        assert_eq!(moved.reason, appt.reason);
        assert!(moved.can_cancel());
        assert!(!appt.can_cancel());
    }

    #[test]
    fn bad_rows_are_skipped_not_fatal() {
        let mut null_date = crate::test_support::appointment_json("a2", "PENDING");
        null_date["appointmentDateTime"] = serde_json::Value::Null;
        let mut no_status = crate::test_support::appointment_json("a3", "PENDING");
        no_status.as_object_mut().unwrap().remove("status");

        let rows = vec![
            crate::test_support::appointment_json("a1", "PENDING"),
            null_date,
            no_status,
            crate::test_support::appointment_json("a4", "COMPLETED"),
        ];
        let list = decode_rows(rows);
        let ids: Vec<&str> = list.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["a1", "a4"]);
    }
}
