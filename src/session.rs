//! Session context — the authenticated user and their bearer token.
//!
//! One `SessionContext` is created per client and shared via `Arc` by every
//! API client. It is initialized on successful login and torn down on
//! logout; nothing is persisted. Tokens live only in memory and are
//! zeroed when the session is dropped.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::PortalError;
use crate::models::Role;

// ═══════════════════════════════════════════════════════════
// SecretToken — zeroed on drop
// ═══════════════════════════════════════════════════════════

/// Bearer or refresh token. Zeroed on drop, redacted in `Debug`.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct SecretToken(String);

impl SecretToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretToken(***)")
    }
}

// ═══════════════════════════════════════════════════════════
// Session
// ═══════════════════════════════════════════════════════════

/// Profile of the logged-in user, as assembled from the login response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub phone_number: Option<String>,
    pub role: Option<Role>,
}

/// An authenticated session.
#[derive(Debug)]
pub struct Session {
    access_token: SecretToken,
    refresh_token: Option<SecretToken>,
    pub token_type: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub user: UserProfile,
}

impl Session {
    pub fn new(access_token: impl Into<String>, user: UserProfile) -> Self {
        Self {
            access_token: SecretToken::new(access_token),
            refresh_token: None,
            token_type: "Bearer".to_string(),
            expires_at: None,
            user,
        }
    }

    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(SecretToken::new(token));
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_token_type(mut self, token_type: &str) -> Self {
        if !token_type.trim().is_empty() {
            self.token_type = token_type.trim().to_string();
        }
        self
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(SecretToken::expose)
    }

    /// `Authorization` header value.
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token.expose())
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

// ═══════════════════════════════════════════════════════════
// SessionContext — shared by all API clients
// ═══════════════════════════════════════════════════════════

/// Injected session state.
///
/// `RwLock` because every request reads the token while only
/// login/logout write it.
#[derive(Debug, Default)]
pub struct SessionContext {
    session: RwLock<Option<Session>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context already holding `session` (tests, restored logins).
    pub fn with_session(session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }

    /// Install a session after successful authentication.
    /// Replaces (and zeroes) any previous session.
    pub fn init(&self, session: Session) -> Result<(), PortalError> {
        let mut guard = self.session.write().map_err(|_| PortalError::LockPoisoned)?;
        tracing::info!(user_id = %session.user.id, role = ?session.user.role, "Session initialized");
        *guard = Some(session);
        Ok(())
    }

    /// Drop the session on logout/unload. Tokens are zeroed via Drop.
    pub fn teardown(&self) {
        if let Ok(mut guard) = self.session.write() {
            if guard.take().is_some() {
                tracing::info!("Session torn down");
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session
            .read()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// `Authorization` header for the active session, if any.
    pub fn bearer(&self) -> Option<String> {
        let guard = self.session.read().ok()?;
        guard.as_ref().map(Session::authorization)
    }

    pub fn user(&self) -> Option<UserProfile> {
        let guard = self.session.read().ok()?;
        guard.as_ref().map(|s| s.user.clone())
    }

    pub fn role(&self) -> Option<Role> {
        self.user().and_then(|u| u.role)
    }

    /// True when a session exists and its expiry has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.session
            .read()
            .map(|guard| guard.as_ref().is_some_and(|s| s.is_expired(now)))
            .unwrap_or(false)
    }
}
