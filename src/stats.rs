//! Dashboard counters for the doctor view.
//!
//! The server's `DoctorStats` is the source of truth and overwrites the
//! counters on every load or poll. Between polls, successful actions
//! nudge the counters locally so the dashboard reacts immediately.

use std::sync::Mutex;

use serde::Serialize;

use crate::lifecycle::AppointmentAction;
use crate::models::DoctorStats;

/// Counters shown on the doctor dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub today_appointments: u32,
    pub total_patients: u32,
    pub pending_consultations: u32,
    pub completed_today: u32,
    pub completed_total: u32,
    pub upcoming: u32,
}

impl DashboardStats {
    /// Completed share of today's appointments, as a rounded percentage.
    pub fn completion_rate(&self) -> u32 {
        if self.today_appointments == 0 {
            return 0;
        }
        let rate = f64::from(self.completed_today) / f64::from(self.today_appointments) * 100.0;
        rate.round() as u32
    }

    /// Apply the local adjustment for a successful `action`.
    pub fn apply(&mut self, action: AppointmentAction) {
        match action {
            AppointmentAction::Accept | AppointmentAction::Reject => {
                self.pending_consultations = self.pending_consultations.saturating_sub(1);
            }
            AppointmentAction::Complete => {
                self.completed_today = self.completed_today.saturating_add(1);
                self.completed_total = self.completed_total.saturating_add(1);
            }
            AppointmentAction::Cancel | AppointmentAction::Schedule => {}
        }
    }
}

impl From<&DoctorStats> for DashboardStats {
    fn from(stats: &DoctorStats) -> Self {
        Self {
            today_appointments: stats.today_appointments,
            total_patients: stats.total_patients,
            pending_consultations: stats.pending_appointments,
            completed_today: stats.today_completed,
            completed_total: stats.completed_appointments,
            upcoming: stats.upcoming_appointments,
        }
    }
}

/// Shared, thread-safe holder of the current `DashboardStats`.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    current: Mutex<DashboardStats>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every counter with the server's figures.
    pub fn overwrite(&self, stats: &DoctorStats) -> DashboardStats {
        let next = DashboardStats::from(stats);
        *self.lock() = next;
        tracing::debug!(
            today = next.today_appointments,
            pending = next.pending_consultations,
            completed_today = next.completed_today,
            "Dashboard stats overwritten from server"
        );
        next
    }

    pub fn after_action(&self, action: AppointmentAction) -> DashboardStats {
        let mut guard = self.lock();
        guard.apply(action);
        *guard
    }

    pub fn snapshot(&self) -> DashboardStats {
        *self.lock()
    }

    pub fn completion_rate(&self) -> u32 {
        self.snapshot().completion_rate()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DashboardStats> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}
