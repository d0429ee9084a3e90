//! Patient-side appointment client.
//!
//! Books and cancels the logged-in patient's appointments through
//! user-service. Every successful mutation is followed by exactly one
//! reload of the patient's list, which reconciles the local store.

use std::sync::Arc;

use serde::Serialize;

use crate::api::{endpoints, ApiClient};
use crate::datetime::compose_booking_date_time;
use crate::error::PortalError;
use crate::lifecycle::{self, AppointmentAction};
use crate::models::{decode_rows, Appointment, AppointmentType, DoctorInfo};
use crate::store::AppointmentStore;

/// Booking form as the patient fills it in.
#[derive(Debug, Clone, Default)]
pub struct BookingRequest {
    pub doctor_id: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM` or `HH:MM:SS`
    pub time: String,
    pub appointment_type: AppointmentType,
    pub reason: String,
    pub notes: Option<String>,
}

impl BookingRequest {
    fn has_required_fields(&self) -> bool {
        [&self.doctor_id, &self.date, &self.time, &self.reason]
            .iter()
            .all(|f| !f.trim().is_empty())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BookingBody<'a> {
    doctor_id: &'a str,
    appointment_date_time: String,
    appointment_type: &'a str,
    reason: &'a str,
    notes: &'a str,
}

#[derive(Serialize)]
struct CancelBody<'a> {
    reason: &'a str,
}

pub struct PatientAppointmentClient {
    api: ApiClient,
    store: Arc<AppointmentStore>,
}

impl PatientAppointmentClient {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            store: Arc::new(AppointmentStore::new()),
        }
    }

    pub fn store(&self) -> &Arc<AppointmentStore> {
        &self.store
    }

    /// Current local view of the patient's appointments.
    pub fn appointments(&self) -> Vec<Appointment> {
        self.store.snapshot()
    }

    /// Request a new appointment. Returns the created appointment when
    /// the server sends it back.
    pub async fn book_appointment(&self, request: &BookingRequest) -> Result<Option<Appointment>, PortalError> {
        if !request.has_required_fields() {
            return Err(PortalError::MissingFields(
                "Veuillez remplir tous les champs obligatoires",
            ));
        }

        let body = BookingBody {
            doctor_id: request.doctor_id.trim(),
            appointment_date_time: compose_booking_date_time(&request.date, &request.time)?,
            appointment_type: request.appointment_type.as_str(),
            reason: request.reason.trim(),
            notes: request.notes.as_deref().unwrap_or(""),
        };

        let url = self.api.url(endpoints::PATIENT_APPOINTMENTS, &[])?;
        let created: Option<Appointment> = self.api.post_enveloped(url, &body).await?;
        tracing::info!(
            doctor_id = body.doctor_id,
            at = %body.appointment_date_time,
            "Appointment booked"
        );

        self.reload_after("book").await;
        Ok(created)
    }

    /// Cancel one of the patient's appointments.
    pub async fn cancel_appointment(&self, id: &str, reason: &str) -> Result<(), PortalError> {
        if reason.trim().is_empty() {
            return Err(PortalError::MissingFields(
                "Veuillez fournir une raison d'annulation",
            ));
        }
        if id.trim().is_empty() {
            return Err(PortalError::MissingFields("Rendez-vous introuvable"));
        }
        if let Some(status) = self.store.status_of(id) {
            if !lifecycle::can_cancel(status) {
                tracing::warn!(appointment_id = id, %status, "Cancellation refused locally");
                return Err(PortalError::NotCancellable(status));
            }
        }

        let url = self.api.url(endpoints::PATIENT_APPOINTMENTS, &[id, endpoints::PATIENT_CANCEL])?;
        let _: Option<serde_json::Value> = self
            .api
            .post_enveloped(url, &CancelBody { reason: reason.trim() })
            .await?;
        self.store.apply_optimistic(id, AppointmentAction::Cancel);
        tracing::info!(appointment_id = id, "Appointment cancelled");

        self.reload_after("cancel").await;
        Ok(())
    }

    /// Fetch the full list and reconcile the local store with it.
    pub async fn list_my_appointments(&self) -> Result<Vec<Appointment>, PortalError> {
        let revision = self.store.begin_fetch();
        let url = self.api.url(endpoints::PATIENT_APPOINTMENTS, &[])?;
        let rows: Option<Vec<serde_json::Value>> = self.api.get_enveloped(url).await?;
        self.store.replace_all(decode_rows(rows.unwrap_or_default()), revision);
        Ok(self.store.snapshot())
    }

    /// Activated doctors available for booking.
    pub async fn list_available_doctors(&self) -> Result<Vec<DoctorInfo>, PortalError> {
        let url = self.api.url(endpoints::PATIENT_DOCTORS, &[])?;
        let doctors: Option<Vec<DoctorInfo>> = self.api.get_enveloped(url).await?;
        Ok(doctors.unwrap_or_default())
    }

    // The mutation already succeeded; a failed reload only leaves the
    // list stale until the next one.
    async fn reload_after(&self, operation: &'static str) {
        if let Err(e) = self.list_my_appointments().await {
            tracing::warn!(operation, error = %e, "Reload after mutation failed");
        }
    }
}
