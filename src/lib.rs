pub mod api; // Gateway transport + endpoint paths
pub mod auth;
pub mod config;
pub mod dashboard; // Doctor dashboard state
pub mod datetime;
pub mod doctor;
pub mod error;
pub mod lifecycle; // Appointment FSM
pub mod models;
pub mod patient;
pub mod poller; // Reconciliation poll
pub mod projection;
pub mod session;
pub mod stats;
pub mod store; // Optimistic appointment store

#[cfg(test)]
pub(crate) mod test_support;

pub use api::ApiClient;
pub use auth::{AuthClient, Credentials, LoginKind};
pub use config::PortalConfig;
pub use dashboard::{DoctorDashboard, LoadReport};
pub use doctor::{ActionOutcome, DoctorAppointmentClient};
pub use error::PortalError;
pub use patient::{BookingRequest, PatientAppointmentClient};
pub use poller::{start_configured_polling, start_polling, PollerHandle};
pub use session::{Session, SessionContext};

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins; otherwise `config::default_log_filter()` applies.
/// Safe to call more than once: later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();

    tracing::debug!("{} v{} tracing initialized", config::APP_NAME, config::APP_VERSION);
}
