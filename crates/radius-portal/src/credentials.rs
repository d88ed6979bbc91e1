//! Credential storage
//!
//! A credential store keeps the RADIUS check table (username to cleartext
//! password) together with the registrations that produced those rows.

use crate::config::User;
use crate::registration::{Credentials, Registration, RegistrationError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("User already exists")]
    AlreadyExists,
    #[error(transparent)]
    Invalid(#[from] RegistrationError),
    #[error("Database error: {0}")]
    Database(String),
}

/// A user's stored secret, as read from the check table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub username: String,
    pub secret: String,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetch the cleartext password row for `username`
    async fn lookup(&self, username: &str) -> Result<Option<CredentialRecord>, StoreError>;

    /// Validate and persist a registration with its check row
    async fn register(&self, registration: &Registration) -> Result<Credentials, StoreError>;
}

#[async_trait]
impl<T: CredentialStore + ?Sized> CredentialStore for Arc<T> {
    async fn lookup(&self, username: &str) -> Result<Option<CredentialRecord>, StoreError> {
        (**self).lookup(username).await
    }

    async fn register(&self, registration: &Registration) -> Result<Credentials, StoreError> {
        (**self).register(registration).await
    }
}

#[derive(Debug, Default)]
struct Tables {
    check: HashMap<String, String>,
    registrations: Vec<Registration>,
}

/// In-memory credential store
///
/// Both tables sit behind one lock so a registration is never half written.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the check table from configured users
    pub fn with_users(users: &[User]) -> Self {
        let check = users
            .iter()
            .map(|user| (user.username.clone(), user.password.clone()))
            .collect();
        MemoryCredentialStore {
            tables: Arc::new(RwLock::new(Tables {
                check,
                registrations: Vec::new(),
            })),
        }
    }

    /// Registrations in insertion order
    pub async fn registrations(&self) -> Vec<Registration> {
        self.tables.read().await.registrations.clone()
    }

    pub async fn user_count(&self) -> usize {
        self.tables.read().await.check.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn lookup(&self, username: &str) -> Result<Option<CredentialRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.check.get(username).map(|secret| CredentialRecord {
            username: username.to_string(),
            secret: secret.clone(),
        }))
    }

    async fn register(&self, registration: &Registration) -> Result<Credentials, StoreError> {
        registration.validate()?;

        let mut tables = self.tables.write().await;
        if tables.check.contains_key(&registration.email) {
            debug!(username = %registration.email, "Registration rejected, user exists");
            return Err(StoreError::AlreadyExists);
        }

        tables.check.insert(
            registration.email.clone(),
            registration.phone_number.clone(),
        );
        tables.registrations.push(registration.clone());

        info!(username = %registration.email, "User registered");
        Ok(registration.credentials())
    }
}
