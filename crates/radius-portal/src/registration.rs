//! Guest registration
//!
//! A registration produces credentials that the RADIUS server can check:
//! the e-mail address becomes the username and the phone number the password.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("All fields are required")]
    MissingFields,
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
}

/// Contact details submitted by a guest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub full_name: String,
    pub company_name: String,
    pub email: String,
    pub phone_number: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Credentials handed back after a successful registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Registration {
    pub fn new(
        full_name: impl Into<String>,
        company_name: impl Into<String>,
        email: impl Into<String>,
        phone_number: impl Into<String>,
    ) -> Self {
        Registration {
            full_name: full_name.into(),
            company_name: company_name.into(),
            email: email.into(),
            phone_number: phone_number.into(),
            created_at: Utc::now(),
        }
    }

    /// Check that every field is present and the e-mail looks usable
    pub fn validate(&self) -> Result<(), RegistrationError> {
        let fields = [
            &self.full_name,
            &self.company_name,
            &self.email,
            &self.phone_number,
        ];
        if fields.iter().any(|field| field.trim().is_empty()) {
            return Err(RegistrationError::MissingFields);
        }

        let mut parts = self.email.split('@');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty() => Ok(()),
            _ => Err(RegistrationError::InvalidEmail(self.email.clone())),
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.email.clone(),
            password: self.phone_number.clone(),
        }
    }
}
