//! Portal error taxonomy.
//!
//! Every failure a client call can produce maps to one `PortalError`.
//! HTTP failures are classified by status code; client-side refusals
//! (missing fields, illegal lifecycle transitions) never reach the network.
//! `user_message()` gives the French text shown to the user.

use crate::lifecycle::AppointmentAction;
use crate::models::AppointmentStatus;

/// Errors from portal client operations.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed ({status})")]
    Unauthorized { status: u16, message: Option<String> },

    #[error("Request rejected by server ({status})")]
    Validation { status: u16, message: Option<String> },

    #[error("Not found")]
    NotFound(Option<String>),

    #[error("Server error ({status})")]
    Server { status: u16, message: Option<String> },

    #[error("Unexpected HTTP status {status}")]
    Unexpected { status: u16, message: Option<String> },

    #[error("Response parsing error: {0}")]
    Decode(String),

    #[error("Server reported failure: {0}")]
    Envelope(String),

    #[error("Missing required fields: {0}")]
    MissingFields(&'static str),

    #[error("Cannot {action} an appointment in status {from}")]
    InvalidTransition {
        from: AppointmentStatus,
        action: AppointmentAction,
    },

    #[error("Appointment in status {0} cannot be cancelled")]
    NotCancellable(AppointmentStatus),

    #[error("Invalid date/time: {0}")]
    InvalidDateTime(#[from] crate::datetime::DateTimeError),

    #[error("Invalid client configuration: {0}")]
    Config(String),

    #[error("Internal lock error")]
    LockPoisoned,
}

impl PortalError {
    /// Classify a non-success HTTP response.
    ///
    /// `body` is inspected for a JSON `message` (or string `error`) field,
    /// which both the Spring error page and the `{success,message,data}`
    /// envelope carry.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = extract_server_message(body);
        match status {
            0 => PortalError::Network(message.unwrap_or_else(|| "status 0".into())),
            401 | 403 => PortalError::Unauthorized { status, message },
            400 | 422 => PortalError::Validation { status, message },
            404 => PortalError::NotFound(message),
            500..=599 => PortalError::Server { status, message },
            _ => PortalError::Unexpected { status, message },
        }
    }

    /// HTTP status behind this error, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            PortalError::Unauthorized { status, .. }
            | PortalError::Validation { status, .. }
            | PortalError::Server { status, .. }
            | PortalError::Unexpected { status, .. } => Some(*status),
            PortalError::NotFound(_) => Some(404),
            _ => None,
        }
    }

    /// Network and 5xx failures. Informational: nothing retries.
    pub fn is_transient(&self) -> bool {
        matches!(self, PortalError::Network(_) | PortalError::Server { .. })
    }

    /// True for refusals decided locally, before any request was sent.
    pub fn is_client_side(&self) -> bool {
        matches!(
            self,
            PortalError::MissingFields(_)
                | PortalError::InvalidTransition { .. }
                | PortalError::NotCancellable(_)
                | PortalError::InvalidDateTime(_)
        )
    }

    /// Human-readable French message for display.
    ///
    /// A message extracted from the server response wins over the
    /// category default.
    pub fn user_message(&self) -> String {
        match self {
            PortalError::Network(_) => {
                "Impossible de contacter le serveur. Vérifiez votre connexion.".into()
            }
            PortalError::Unauthorized { status, message } => message.clone().unwrap_or_else(|| {
                if *status == 403 {
                    "Accès refusé. Vous n'avez pas les droits nécessaires.".into()
                } else {
                    "Session expirée. Veuillez vous reconnecter.".into()
                }
            }),
            PortalError::Validation { message, .. } => message
                .clone()
                .unwrap_or_else(|| "Les informations envoyées sont invalides.".into()),
            PortalError::NotFound(message) => message
                .clone()
                .unwrap_or_else(|| "Élément introuvable.".into()),
            PortalError::Server { message, .. } => message
                .clone()
                .unwrap_or_else(|| "Erreur du serveur. Veuillez réessayer plus tard.".into()),
            PortalError::Unexpected { message, .. } => {
                message.clone().unwrap_or_else(|| "Erreur inconnue".into())
            }
            PortalError::Decode(_) => "Réponse du serveur illisible.".into(),
            PortalError::Envelope(message) if !message.trim().is_empty() => message.clone(),
            PortalError::Envelope(_) => "Erreur inconnue".into(),
            PortalError::MissingFields(message) => (*message).into(),
            PortalError::InvalidTransition { from, .. } => format!(
                "Action impossible : le rendez-vous est {}.",
                crate::projection::status_label(*from).to_lowercase()
            ),
            PortalError::NotCancellable(_) => "Ce rendez-vous ne peut plus être annulé.".into(),
            PortalError::InvalidDateTime(_) => "Date ou heure invalide.".into(),
            PortalError::Config(_) => "Configuration du client invalide.".into(),
            PortalError::LockPoisoned => "Erreur interne.".into(),
        }
    }
}

impl From<reqwest::Error> for PortalError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            PortalError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            PortalError::from_response(status.as_u16(), "")
        } else {
            PortalError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(err: serde_json::Error) -> Self {
        PortalError::Decode(err.to_string())
    }
}

fn extract_server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(String::from)
}
