//! Doctor dashboard state: counters, appointment list and patient list.
//!
//! `initialize` and `refresh` both load the three sources concurrently
//! and apply whichever succeed. A failing source is logged and leaves
//! its previous value in place. At most one load runs at a time.

use std::sync::RwLock;

use crate::doctor::DoctorAppointmentClient;
use crate::error::PortalError;
use crate::models::{Appointment, PatientDetails, PatientInfo};
use crate::stats::DashboardStats;

/// One of the three dashboard data sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Stats,
    Appointments,
    Patients,
}

impl std::fmt::Display for LoadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stats => write!(f, "stats"),
            Self::Appointments => write!(f, "appointments"),
            Self::Patients => write!(f, "patients"),
        }
    }
}

/// Outcome of one dashboard load.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub stats: Option<DashboardStats>,
    pub appointments: Option<usize>,
    pub patients: Option<usize>,
    pub failures: Vec<(LoadSource, PortalError)>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self, source: LoadSource) -> bool {
        self.failures.iter().any(|(s, _)| *s == source)
    }
}

pub struct DoctorDashboard {
    client: DoctorAppointmentClient,
    patients: RwLock<Vec<PatientInfo>>,
    // Held for the whole of a load; released on drop if the load is cancelled.
    load_gate: tokio::sync::Mutex<()>,
}

impl DoctorDashboard {
    pub fn new(client: DoctorAppointmentClient) -> Self {
        Self {
            client,
            patients: RwLock::new(Vec::new()),
            load_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn client(&self) -> &DoctorAppointmentClient {
        &self.client
    }

    pub fn is_loading(&self) -> bool {
        self.load_gate.try_lock().is_err()
    }

    /// First load. Waits for all three sources. If a refresh is already
    /// running, waits for it to finish and then loads again.
    pub async fn initialize(&self) -> LoadReport {
        let _load = self.load_gate.lock().await;
        tracing::info!("Loading doctor dashboard");
        self.load_all().await
    }

    /// Reconciliation pass. Returns `None` when a load is already running.
    pub async fn refresh(&self) -> Option<LoadReport> {
        let Ok(_load) = self.load_gate.try_lock() else {
            tracing::debug!("Dashboard load in progress, refresh skipped");
            return None;
        };
        Some(self.load_all().await)
    }

    /// Full record for `patient_id`. Falls back to the cached patient-list
    /// row when the lookup fails or the server returns nothing.
    pub async fn patient_details(&self, patient_id: &str) -> Option<PatientDetails> {
        match self.client.patient_details(patient_id).await {
            Ok(Some(details)) => return Some(details),
            Ok(None) => tracing::debug!(patient_id, "No patient record returned, using cached row"),
            Err(e) => tracing::warn!(patient_id, error = %e, "Patient lookup failed, using cached row"),
        }
        self.patients
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|p| p.patient_id == patient_id)
            .map(PatientDetails::from)
    }

    async fn load_all(&self) -> LoadReport {
        let (stats, appointments, patients) = tokio::join!(
            self.client.stats(),
            self.client.list_appointments(),
            self.client.patients(),
        );

        let mut report = LoadReport::default();

        match stats {
            Ok(_) => report.stats = Some(self.client.stats_aggregator().snapshot()),
            Err(e) => report.failures.push((LoadSource::Stats, e)),
        }
        match appointments {
            Ok(list) => report.appointments = Some(list.len()),
            Err(e) => report.failures.push((LoadSource::Appointments, e)),
        }
        match patients {
            Ok(list) => {
                report.patients = Some(list.len());
                *self.patients.write().unwrap_or_else(|e| e.into_inner()) = list;
            }
            Err(e) => report.failures.push((LoadSource::Patients, e)),
        }

        for (source, error) in &report.failures {
            tracing::warn!(%source, error = %error, "Dashboard source failed to load");
        }
        tracing::debug!(
            appointments = ?report.appointments,
            patients = ?report.patients,
            failures = report.failures.len(),
            "Dashboard load finished"
        );
        report
    }

    // ── Views ───────────────────────────────────────────────

    pub fn stats(&self) -> DashboardStats {
        self.client.stats_aggregator().snapshot()
    }

    pub fn completion_rate(&self) -> u32 {
        self.stats().completion_rate()
    }

    pub fn appointments(&self) -> Vec<Appointment> {
        self.client.store().snapshot()
    }

    pub fn pending_appointments(&self) -> Vec<Appointment> {
        self.client.store().pending()
    }

    pub fn upcoming_appointments(&self) -> Vec<Appointment> {
        self.client.store().upcoming()
    }

    pub fn completed_appointments(&self) -> Vec<Appointment> {
        self.client.store().completed()
    }

    pub fn patients(&self) -> Vec<PatientInfo> {
        self.patients.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
