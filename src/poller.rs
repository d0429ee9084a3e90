//! Periodic dashboard reconciliation.
//!
//! A single tokio task refreshes the dashboard on a fixed interval.
//! Polls run one after another inside that task, so a slow poll delays
//! the next tick instead of overlapping it. Shutdown cancels an
//! in-flight poll; dropping the handle aborts the task outright.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::PortalConfig;
use crate::dashboard::DoctorDashboard;
use crate::error::PortalError;

/// Handle to a running poll loop. Aborts the loop on drop.
pub struct PollerHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    polls: Arc<AtomicU64>,
}

impl PollerHandle {
    /// Ask the loop to stop. An in-flight poll is cancelled.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Dashboard poller shutdown signal sent");
        }
    }

    /// Shut down and wait for the loop to exit.
    pub async fn stop(mut self) {
        self.shutdown();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    /// Polls that ran to completion (skipped refreshes excluded).
    pub fn polls_completed(&self) -> u64 {
        self.polls.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Start refreshing `dashboard` every `interval`. The first poll happens
/// one full interval after start.
pub fn start_polling(dashboard: Arc<DoctorDashboard>, interval: Duration) -> Result<PollerHandle, PortalError> {
    if interval.is_zero() {
        return Err(PortalError::Config("poll interval must be positive".into()));
    }

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let polls = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&polls);

    let task = tokio::spawn(async move {
        tracing::info!(interval_ms = interval.as_millis() as u64, "Dashboard poller started");
        poll_loop(dashboard, interval, shutdown_rx, counter).await;
        tracing::info!("Dashboard poller stopped");
    });

    Ok(PollerHandle {
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
        polls,
    })
}

/// `start_polling` at the configured `poll_interval`.
pub fn start_configured_polling(
    dashboard: Arc<DoctorDashboard>,
    config: &PortalConfig,
) -> Result<PollerHandle, PortalError> {
    start_polling(dashboard, config.poll_interval)
}

async fn poll_loop(
    dashboard: Arc<DoctorDashboard>,
    interval: Duration,
    mut shutdown_rx: oneshot::Receiver<()>,
    polls: Arc<AtomicU64>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await; // Consume initial immediate tick

    loop {
        tokio::select! {
            _ = &mut shutdown_rx => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            biased;
            _ = &mut shutdown_rx => break,
            report = dashboard.refresh() => match report {
                Some(report) => {
                    let n = polls.fetch_add(1, Ordering::Relaxed) + 1;
                    tracing::debug!(poll = n, failures = report.failures.len(), "Dashboard poll finished");
                }
                None => tracing::debug!("Dashboard poll skipped, load in progress"),
            },
        }
    }
}
