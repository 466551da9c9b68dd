//! Platform authentication helpers.
//!
//! The directory has exactly one principal: a configured admin account. A
//! successful login mints a server-side session keyed by a random id; the id
//! travels in an encrypted cookie and every data endpoint asks the registry
//! whether it is still authenticated.

use std::{collections::HashMap, fmt};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@company.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthnError {
    #[error("Invalid credentials")]
    InvalidCredentials,
}

#[derive(Clone, Deserialize, Serialize)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
}

impl Default for AdminCredentials {
    fn default() -> Self {
        Self {
            email: DEFAULT_ADMIN_EMAIL.into(),
            password: DEFAULT_ADMIN_PASSWORD.into(),
        }
    }
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AdminCredentials {
    /// Exact, case-sensitive match on both fields.
    pub fn matches(&self, email: &str, password: &str) -> bool {
        self.email == email && self.password == password
    }
}

/// Body of `POST /api/login`.
#[derive(Clone, Deserialize, Serialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Debug)]
struct Session {
    authenticated: bool,
    expires_at: DateTime<Utc>,
}

/// In-memory session table. Not shared by itself; callers wrap it in a lock.
#[derive(Debug)]
pub struct SessionRegistry {
    credentials: AdminCredentials,
    ttl: Duration,
    sessions: HashMap<SessionId, Session>,
}

impl SessionRegistry {
    pub fn new(credentials: AdminCredentials, ttl: Duration) -> Self {
        Self {
            credentials,
            ttl,
            sessions: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<SessionId, AuthnError> {
        self.login_at(email, password, Utc::now())
    }

    pub fn login_at(
        &mut self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionId, AuthnError> {
        if !self.credentials.matches(email, password) {
            tracing::warn!(%email, "rejected admin login");
            return Err(AuthnError::InvalidCredentials);
        }
        self.purge_expired(now);
        let id = SessionId::random();
        self.sessions.insert(
            id,
            Session {
                authenticated: true,
                expires_at: now + self.ttl,
            },
        );
        tracing::info!(session = %id, "admin session opened");
        Ok(id)
    }

    pub fn is_authenticated(&mut self, id: SessionId) -> bool {
        self.is_authenticated_at(id, Utc::now())
    }

    pub fn is_authenticated_at(&mut self, id: SessionId, now: DateTime<Utc>) -> bool {
        let Some(session) = self.sessions.get(&id) else {
            return false;
        };
        if session.expires_at <= now {
            self.sessions.remove(&id);
            tracing::debug!(session = %id, "session expired");
            return false;
        }
        session.authenticated
    }

    /// Destroys the session entirely. Returns whether one existed.
    pub fn logout(&mut self, id: SessionId) -> bool {
        let removed = self.sessions.remove(&id).is_some();
        if removed {
            tracing::info!(session = %id, "admin session closed");
        }
        removed
    }

    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.expires_at > now);
        before - self.sessions.len()
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}
