//! Login and logout against the portal's two authentication endpoints.
//!
//! Patients and admins authenticate through auth-service; doctors through
//! doctor-activation-service. The two return differently shaped bodies
//! (user fields nested under `user`, or flat), both accepted here.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::api::{endpoints, ApiClient};
use crate::error::PortalError;
use crate::models::Role;
use crate::session::{Session, SessionContext, UserProfile};

/// Which login endpoint to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginKind {
    Patient,
    Doctor,
}

impl LoginKind {
    /// Doctor accounts are provisioned on the `@doctor.com` domain.
    pub fn for_email(email: &str) -> Self {
        if email.trim().to_ascii_lowercase().ends_with("@doctor.com") {
            Self::Doctor
        } else {
            Self::Patient
        }
    }

    fn path(self) -> &'static str {
        match self {
            Self::Patient => endpoints::PATIENT_LOGIN,
            Self::Doctor => endpoints::DOCTOR_LOGIN,
        }
    }
}

/// Login form. The password is zeroed on drop.
pub struct Credentials {
    pub email: String,
    pub password: Zeroizing<String>,
    pub remember_me: bool,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: Zeroizing::new(password.into()),
            remember_me: false,
        }
    }
}

// ── Wire ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
    refresh_token: Option<String>,
    token_type: Option<String>,
    expires_in: Option<i64>,
    doctor_id: Option<String>,
    user_id: Option<String>,
    role: Option<String>,
    user: Option<LoginUser>,
    #[serde(flatten)]
    flat: LoginUser,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LoginUser {
    id: Option<String>,
    email: Option<String>,
    full_name: Option<String>,
    name: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    phone_number: Option<String>,
    roles: Vec<String>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

impl LoginResponse {
    fn into_session(self, kind: LoginKind, login_email: &str) -> Session {
        let user = self.user.as_ref().unwrap_or(&self.flat);

        let id = non_blank(&self.doctor_id)
            .or_else(|| non_blank(&self.user_id))
            .or_else(|| non_blank(&user.id))
            .or_else(|| non_blank(&self.flat.id))
            .unwrap_or_default();

        let name = non_blank(&user.full_name)
            .or_else(|| non_blank(&user.name))
            .or_else(|| {
                let joined = format!(
                    "{} {}",
                    user.first_name.as_deref().unwrap_or(""),
                    user.last_name.as_deref().unwrap_or("")
                );
                Some(joined.trim().to_string()).filter(|s| !s.is_empty())
            })
            .unwrap_or_else(|| "User".to_string());

        let role = self
            .role
            .as_deref()
            .and_then(|r| r.parse::<Role>().ok())
            .or_else(|| {
                let parsed: Vec<Role> = user.roles.iter().filter_map(|r| r.parse().ok()).collect();
                if parsed.contains(&Role::Admin) {
                    Some(Role::Admin)
                } else {
                    parsed.first().copied()
                }
            })
            .unwrap_or(match kind {
                LoginKind::Patient => Role::Patient,
                LoginKind::Doctor => Role::Doctor,
            });

        let profile = UserProfile {
            id,
            name,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: non_blank(&user.email).unwrap_or_else(|| login_email.to_string()),
            phone_number: user.phone_number.clone(),
            role: Some(role),
        };

        let mut session = Session::new(self.access_token, profile)
            .with_token_type(self.token_type.as_deref().unwrap_or(""));
        if let Some(refresh) = self.refresh_token {
            session = session.with_refresh_token(refresh);
        }
        if let Some(secs) = self.expires_in.filter(|s| *s > 0) {
            session = session.with_expiry(Utc::now() + Duration::seconds(secs));
        }
        session
    }
}

// ═══════════════════════════════════════════════════════════
// AuthClient
// ═══════════════════════════════════════════════════════════

pub struct AuthClient {
    api: ApiClient,
}

impl AuthClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        self.api.session()
    }

    /// Authenticate and install the resulting session.
    pub async fn login(&self, credentials: &Credentials, kind: LoginKind) -> Result<UserProfile, PortalError> {
        if credentials.email.trim().is_empty() || credentials.password.is_empty() {
            return Err(PortalError::MissingFields("Veuillez saisir votre email et votre mot de passe"));
        }

        let body = serde_json::json!({
            "email": credentials.email.trim(),
            "password": credentials.password.as_str(),
            "rememberMe": credentials.remember_me,
        });
        let url = self.api.url(kind.path(), &[])?;
        let response: LoginResponse = self.api.post_anonymous(url, &body).await?;

        if response.access_token.trim().is_empty() {
            return Err(PortalError::Decode("login response without access token".into()));
        }

        let session = response.into_session(kind, credentials.email.trim());
        let profile = session.user.clone();
        self.api.session().init(session)?;
        tracing::info!(user_id = %profile.id, ?kind, "Login succeeded");
        Ok(profile)
    }

    pub fn logout(&self) {
        self.api.session().teardown();
    }
}
