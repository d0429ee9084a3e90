//! Client-local appointment store with optimistic patches.
//!
//! The store holds the last list fetched from the server plus any status
//! changes applied locally ahead of confirmation. Each local patch is
//! tagged with the store revision it was applied at, so a reconciliation
//! pass can tell a patch the server has not seen yet (applied after the
//! fetch began) from one the server has had a chance to answer.
//!
//! Rules applied by `replace_all`:
//! - Server state is authoritative for every appointment it returns.
//! - A speculative patch survives only if it was applied after the fetch
//!   began and the server still shows the pre-action status.
//! - A fetch that began before the last applied fetch is discarded.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use crate::lifecycle::AppointmentAction;
use crate::models::{Appointment, AppointmentStatus};

// ═══════════════════════════════════════════════════════════
// Entries
// ═══════════════════════════════════════════════════════════

/// A local status change not yet confirmed by a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeculativeTransition {
    pub action: AppointmentAction,
    pub from: AppointmentStatus,
    pub to: AppointmentStatus,
    /// Store revision at which the patch was applied.
    pub revision: u64,
    pub applied_at: DateTime<Utc>,
}

impl SpeculativeTransition {
    pub fn pending_for(&self) -> chrono::Duration {
        Utc::now() - self.applied_at
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackedAppointment {
    pub appointment: Appointment,
    pub speculative: Option<SpeculativeTransition>,
}

impl TrackedAppointment {
    pub fn is_pending_confirmation(&self) -> bool {
        self.speculative.is_some()
    }

    /// How long the local patch has been waiting for the server.
    pub fn pending_for(&self) -> Option<chrono::Duration> {
        self.speculative.as_ref().map(|tag| tag.pending_for())
    }
}

/// What a reconciliation pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// False when the result was older than one already applied.
    pub applied: bool,
    pub total: usize,
    /// Speculative patches kept because the fetch predates them.
    pub retained: usize,
    /// Patches the server contradicts although it should have seen them.
    pub conflicts: usize,
}

// ═══════════════════════════════════════════════════════════
// AppointmentStore
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Default)]
struct Inner {
    entries: Vec<TrackedAppointment>,
    revision: u64,
    last_reconciled: u64,
}

#[derive(Debug, Default)]
pub struct AppointmentStore {
    inner: RwLock<Inner>,
}

impl AppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock leaves the entries consistent:
    // every mutation below is a single assignment.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Mark the start of a fetch. Pass the result to `replace_all`.
    pub fn begin_fetch(&self) -> u64 {
        let mut inner = self.write();
        inner.revision += 1;
        inner.revision
    }

    pub fn revision(&self) -> u64 {
        self.read().revision
    }

    /// Reconcile with a full server list fetched at `fetch_revision`.
    pub fn replace_all(&self, fetched: Vec<Appointment>, fetch_revision: u64) -> ReconcileOutcome {
        let mut inner = self.write();

        if fetch_revision < inner.last_reconciled {
            tracing::debug!(
                fetch_revision,
                last_reconciled = inner.last_reconciled,
                "Stale fetch result discarded"
            );
            return ReconcileOutcome::default();
        }

        let mut speculative: HashMap<String, SpeculativeTransition> = inner
            .entries
            .iter_mut()
            .filter_map(|e| {
                let tag = e.speculative.take()?;
                Some((e.appointment.id.clone(), tag))
            })
            .collect();

        let mut outcome = ReconcileOutcome {
            applied: true,
            total: fetched.len(),
            ..Default::default()
        };

        let entries = fetched
            .into_iter()
            .map(|server| {
                let Some(tag) = speculative.remove(&server.id) else {
                    return TrackedAppointment {
                        appointment: server,
                        speculative: None,
                    };
                };

                if server.status != tag.from {
                    // Server moved on; its status wins.
                    return TrackedAppointment {
                        appointment: server,
                        speculative: None,
                    };
                }

                if tag.revision > fetch_revision {
                    outcome.retained += 1;
                    TrackedAppointment {
                        appointment: server.with_status(tag.to),
                        speculative: Some(tag),
                    }
                } else {
                    outcome.conflicts += 1;
                    tracing::warn!(
                        appointment_id = %server.id,
                        action = %tag.action,
                        server_status = %server.status,
                        local_status = %tag.to,
                        pending_ms = tag.pending_for().num_milliseconds(),
                        "Server did not reflect confirmed action, reverting to server state"
                    );
                    TrackedAppointment {
                        appointment: server,
                        speculative: None,
                    }
                }
            })
            .collect();

        inner.entries = entries;
        inner.last_reconciled = fetch_revision;

        tracing::debug!(
            total = outcome.total,
            retained = outcome.retained,
            conflicts = outcome.conflicts,
            "Appointment store reconciled"
        );
        outcome
    }

    /// Patch `id` to the target of `action` ahead of server confirmation.
    ///
    /// Returns the previous status, or `None` if the id is not in the store.
    pub fn apply_optimistic(&self, id: &str, action: AppointmentAction) -> Option<AppointmentStatus> {
        let mut inner = self.write();
        inner.revision += 1;
        let revision = inner.revision;

        let entry = inner.entries.iter_mut().find(|e| e.appointment.id == id)?;
        let from = entry.appointment.status;
        let to = action.target_status();
        entry.appointment.status = to;
        entry.speculative = Some(SpeculativeTransition {
            action,
            from,
            to,
            revision,
            applied_at: Utc::now(),
        });

        tracing::debug!(appointment_id = id, %from, %to, revision, "Optimistic status applied");
        Some(from)
    }

    pub fn status_of(&self, id: &str) -> Option<AppointmentStatus> {
        self.read()
            .entries
            .iter()
            .find(|e| e.appointment.id == id)
            .map(|e| e.appointment.status)
    }

    pub fn get(&self, id: &str) -> Option<TrackedAppointment> {
        self.read().entries.iter().find(|e| e.appointment.id == id).cloned()
    }

    /// Appointments in server order, local patches applied.
    pub fn snapshot(&self) -> Vec<Appointment> {
        self.filtered(|_| true)
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.write();
        inner.entries.clear();
        inner.revision += 1;
        inner.last_reconciled = inner.revision;
    }

    // ── Views ───────────────────────────────────────────────

    pub fn pending(&self) -> Vec<Appointment> {
        self.filtered(|s| s == AppointmentStatus::Pending)
    }

    /// Accepted or scheduled.
    pub fn upcoming(&self) -> Vec<Appointment> {
        self.filtered(|s| matches!(s, AppointmentStatus::Accepted | AppointmentStatus::Scheduled))
    }

    pub fn completed(&self) -> Vec<Appointment> {
        self.filtered(|s| s == AppointmentStatus::Completed)
    }

    /// Not yet in a terminal state.
    pub fn active(&self) -> Vec<Appointment> {
        self.filtered(|s| !crate::lifecycle::is_terminal(s))
    }

    fn filtered(&self, keep: impl Fn(AppointmentStatus) -> bool) -> Vec<Appointment> {
        self.read()
            .entries
            .iter()
            .filter(|e| keep(e.appointment.status))
            .map(|e| e.appointment.clone())
            .collect()
    }
}
