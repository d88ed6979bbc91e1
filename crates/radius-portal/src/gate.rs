//! Session gate
//!
//! Logging in takes two checks: the local credential store first, then the
//! RADIUS server. Only when both agree is a session created. Callers cannot
//! tell which check failed.

use crate::client::{RadiusClient, Verdict};
use crate::credentials::{CredentialStore, StoreError};
use crate::transport::{SocketBinder, UdpBinder};
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Serialize;
use std::time::Duration;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{debug, error, info, warn};

const SESSION_ID_LENGTH: usize = 32;

#[derive(Error, Debug)]
pub enum LoginError {
    #[error("Username and password are required")]
    MissingCredentials,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Login failed")]
    Store(#[source] StoreError),
}

/// An authenticated portal session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Live sessions keyed by id
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    ttl: TimeDelta,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        SessionStore {
            sessions: DashMap::new(),
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
        }
    }

    /// Start a session for `username` with a fresh random id
    pub fn create(&self, username: &str) -> Session {
        let id: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(SESSION_ID_LENGTH)
            .map(char::from)
            .collect();
        let created_at = Utc::now();
        let session = Session {
            id: id.clone(),
            username: username.to_string(),
            created_at,
            expires_at: created_at
                .checked_add_signed(self.ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        self.sessions.insert(id, session.clone());
        session
    }

    /// Look up a live session; an expired one is removed
    pub fn get(&self, id: &str) -> Option<Session> {
        let session = self.sessions.get(id).map(|entry| entry.value().clone())?;
        if session.is_expired() {
            self.sessions.remove(id);
            debug!(username = %session.username, "Session expired");
            return None;
        }
        Some(session)
    }

    pub fn remove(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Drop every expired session, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired());
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Grants sessions to users that pass both local and RADIUS checks
pub struct SessionGate<S, B = UdpBinder> {
    store: S,
    client: RadiusClient<B>,
    sessions: SessionStore,
}

impl<S: CredentialStore, B: SocketBinder> SessionGate<S, B> {
    pub fn new(store: S, client: RadiusClient<B>, session_ttl: Duration) -> Self {
        SessionGate {
            store,
            client,
            sessions: SessionStore::new(session_ttl),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn client(&self) -> &RadiusClient<B> {
        &self.client
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session, LoginError> {
        if username.is_empty() || password.is_empty() {
            return Err(LoginError::MissingCredentials);
        }

        let record = self.store.lookup(username).await.map_err(|e| {
            error!(username = %username, error = %e, "Credential lookup failed");
            LoginError::Store(e)
        })?;

        let Some(record) = record else {
            info!(username = %username, "Login rejected, unknown user");
            return Err(LoginError::InvalidCredentials);
        };

        let matches: bool = record.secret.as_bytes().ct_eq(password.as_bytes()).into();
        if !matches {
            info!(username = %username, "Login rejected, password mismatch");
            return Err(LoginError::InvalidCredentials);
        }

        match self.client.attempt(username, password).await {
            Verdict::Accepted { .. } => {}
            verdict => {
                warn!(
                    username = %username,
                    reason = ?verdict,
                    "Login rejected by RADIUS"
                );
                return Err(LoginError::InvalidCredentials);
            }
        }

        let session = self.sessions.create(username);
        info!(username = %username, expires_at = %session.expires_at, "Session created");
        Ok(session)
    }

    /// Current session for `session_id`, if it is still valid
    pub fn status(&self, session_id: &str) -> Option<Session> {
        self.sessions.get(session_id)
    }

    pub fn logout(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id);
        if removed {
            debug!("Session closed");
        }
        removed
    }
}
