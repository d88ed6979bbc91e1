//! Captive portal authentication over RADIUS
//!
//! This crate provides the authentication core of a guest portal built on
//! top of the `radius-proto` protocol implementation.
//!
//! # Features
//!
//! - Async RADIUS Access-Request client with a per-attempt timeout
//! - Pluggable credential stores (in-memory, PostgreSQL `radcheck`)
//! - Guest registration
//! - Session gate combining local and RADIUS checks
//! - JSON configuration with environment overrides
//!
//! # Example
//!
//! ```rust,no_run
//! use radius_portal::{RadiusClient, RadiusConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = RadiusConfig::default();
//!     let client = RadiusClient::new(&config);
//!
//!     let outcome = client.authenticate("alice", "password").await;
//!     println!("{}", outcome.success);
//! }
//! ```

pub mod client;
pub mod config;
pub mod credentials;
pub mod gate;
pub mod postgres_store;
pub mod registration;
pub mod stats;
pub mod transport;

pub use client::{AuthOutcome, RadiusClient, Verdict};
pub use config::{Config, ConfigError, RadiusConfig, User};
pub use credentials::{CredentialRecord, CredentialStore, MemoryCredentialStore, StoreError};
pub use gate::{LoginError, Session, SessionGate, SessionStore};
pub use postgres_store::{PostgresConfig, PostgresCredentialStore};
pub use registration::{Credentials, Registration, RegistrationError};
pub use stats::{ClientStats, StatsSnapshot};
pub use transport::{
    DatagramSocket, ServerSocket, SocketBinder, TransportError, UdpBinder, UdpTransport,
};
