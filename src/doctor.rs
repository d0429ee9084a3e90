//! Doctor-side appointment client.
//!
//! Lifecycle actions (accept, reject, complete, cancel) go to
//! doctor-activation-service as one POST each. An action is checked
//! against the lifecycle table first when the appointment's status is
//! known locally; after the server accepts it, the local store is patched
//! ahead of the next poll and the dashboard counters are adjusted.
//! Nothing is retried.

use std::sync::Arc;

use serde::Serialize;

use crate::api::{endpoints, ApiClient};
use crate::error::PortalError;
use crate::lifecycle::{self, AppointmentAction};
use crate::models::{decode_rows, Appointment, AppointmentStatus, CancelledBy, DoctorStats, PatientDetails, PatientInfo};
use crate::stats::{DashboardStats, StatsAggregator};
use crate::store::AppointmentStore;

/// Result of a successful lifecycle action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub action: AppointmentAction,
    /// Status before the local patch; `None` if the id was not in the store.
    pub previous: Option<AppointmentStatus>,
    /// Status applied locally until the next reconciliation.
    pub optimistic: AppointmentStatus,
    /// Appointment echoed by the server, when the body parsed as one.
    pub server: Option<Appointment>,
    pub stats: DashboardStats,
}

// ── Request bodies ──────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RejectBody<'a> {
    reason: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    available_hours: Option<&'a str>,
}

#[derive(Serialize)]
struct CompleteBody<'a> {
    diagnosis: &'a str,
    prescription: &'a str,
    notes: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CancelBody<'a> {
    reason: &'a str,
    cancelled_by: CancelledBy,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

// ═══════════════════════════════════════════════════════════
// DoctorAppointmentClient
// ═══════════════════════════════════════════════════════════

pub struct DoctorAppointmentClient {
    api: ApiClient,
    store: Arc<AppointmentStore>,
    stats: Arc<StatsAggregator>,
}

impl DoctorAppointmentClient {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            store: Arc::new(AppointmentStore::new()),
            stats: Arc::new(StatsAggregator::new()),
        }
    }

    pub fn store(&self) -> &Arc<AppointmentStore> {
        &self.store
    }

    pub fn stats_aggregator(&self) -> &Arc<StatsAggregator> {
        &self.stats
    }

    // ── Actions ─────────────────────────────────────────────

    pub async fn accept_appointment(&self, id: &str) -> Result<ActionOutcome, PortalError> {
        self.dispatch(id, AppointmentAction::Accept, &serde_json::json!({}))
            .await
    }

    /// Decline a pending request, optionally suggesting other hours.
    pub async fn reject_appointment(
        &self,
        id: &str,
        reason: Option<&str>,
        available_hours: Option<&str>,
    ) -> Result<ActionOutcome, PortalError> {
        let body = RejectBody {
            reason: reason.map(str::trim).unwrap_or(""),
            available_hours: non_blank(available_hours),
        };
        self.dispatch(id, AppointmentAction::Reject, &body).await
    }

    /// Close the consultation. Diagnosis and prescription are mandatory.
    pub async fn complete_appointment(
        &self,
        id: &str,
        diagnosis: &str,
        prescription: &str,
        notes: Option<&str>,
    ) -> Result<ActionOutcome, PortalError> {
        if diagnosis.trim().is_empty() || prescription.trim().is_empty() {
            return Err(PortalError::MissingFields(
                "Le diagnostic et la prescription sont requis",
            ));
        }
        let body = CompleteBody {
            diagnosis: diagnosis.trim(),
            prescription: prescription.trim(),
            notes: notes.map(str::trim).unwrap_or(""),
        };
        self.dispatch(id, AppointmentAction::Complete, &body).await
    }

    pub async fn cancel_appointment(&self, id: &str, reason: Option<&str>) -> Result<ActionOutcome, PortalError> {
        let body = CancelBody {
            reason: reason.map(str::trim).unwrap_or(""),
            cancelled_by: CancelledBy::Doctor,
        };
        self.dispatch(id, AppointmentAction::Cancel, &body).await
    }

    async fn dispatch<B: Serialize>(
        &self,
        id: &str,
        action: AppointmentAction,
        body: &B,
    ) -> Result<ActionOutcome, PortalError> {
        if id.trim().is_empty() {
            return Err(PortalError::MissingFields("Rendez-vous introuvable"));
        }

        match self.store.status_of(id) {
            Some(status) => {
                lifecycle::transition(status, action)?;
            }
            None => {
                tracing::debug!(appointment_id = id, %action, "Status unknown locally, deferring to server");
            }
        }

        let segment = endpoints::doctor_action_segment(action)
            .ok_or_else(|| PortalError::Config(format!("no doctor endpoint for {action}")))?;
        let url = self.api.url(endpoints::DOCTOR_APPOINTMENTS, &[id, segment])?;
        let text = self.api.post_text(url, body).await?;
        let server = serde_json::from_str::<Appointment>(&text).ok();

        let previous = self.store.apply_optimistic(id, action);
        let stats = self.stats.after_action(action);

        tracing::info!(
            appointment_id = id,
            %action,
            previous = ?previous,
            server_status = ?server.as_ref().map(|a| a.status),
            "Appointment action applied"
        );

        Ok(ActionOutcome {
            action,
            previous,
            optimistic: action.target_status(),
            server,
            stats,
        })
    }

    // ── Reads ───────────────────────────────────────────────

    /// Full list for the logged-in doctor; reconciles the store.
    pub async fn list_appointments(&self) -> Result<Vec<Appointment>, PortalError> {
        let revision = self.store.begin_fetch();
        let url = self.api.url(endpoints::DOCTOR_APPOINTMENTS, &[])?;
        let rows: Vec<serde_json::Value> = self.api.get_json(url).await?;
        self.store.replace_all(decode_rows(rows), revision);
        Ok(self.store.snapshot())
    }

    pub async fn upcoming_appointments(&self) -> Result<Vec<Appointment>, PortalError> {
        let url = self.api.url(endpoints::DOCTOR_UPCOMING, &[])?;
        let rows: Vec<serde_json::Value> = self.api.get_json(url).await?;
        Ok(decode_rows(rows))
    }

    pub async fn pending_appointments(&self) -> Result<Vec<Appointment>, PortalError> {
        let url = self.api.url(endpoints::DOCTOR_PENDING, &[])?;
        let rows: Vec<serde_json::Value> = self.api.get_json(url).await?;
        Ok(decode_rows(rows))
    }

    /// One appointment as the server has it. Does not touch the store.
    pub async fn appointment_details(&self, id: &str) -> Result<Appointment, PortalError> {
        if id.trim().is_empty() {
            return Err(PortalError::MissingFields("Rendez-vous introuvable"));
        }
        let url = self.api.url(endpoints::DOCTOR_APPOINTMENT_DETAILS, &[id])?;
        self.api.get_json(url).await
    }

    /// Full patient record. `None` when the server has nothing to return.
    pub async fn patient_details(&self, patient_id: &str) -> Result<Option<PatientDetails>, PortalError> {
        if patient_id.trim().is_empty() {
            return Err(PortalError::MissingFields("Patient introuvable"));
        }
        let url = self.api.url(endpoints::DOCTOR_PATIENT_DETAILS, &[patient_id])?;
        self.api.get_optional(url).await
    }

    pub async fn patients(&self) -> Result<Vec<PatientInfo>, PortalError> {
        let url = self.api.url(endpoints::DOCTOR_PATIENTS, &[])?;
        self.api.get_json(url).await
    }

    /// Server statistics. Overwrites the local counters.
    pub async fn stats(&self) -> Result<DoctorStats, PortalError> {
        let url = self.api.url(endpoints::DOCTOR_STATS, &[])?;
        let stats: DoctorStats = self.api.get_json(url).await?;
        self.stats.overwrite(&stats);
        Ok(stats)
    }
}
