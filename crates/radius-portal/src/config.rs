use crate::postgres_store::PostgresConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// RADIUS authentication server settings
///
/// Built once at startup and passed by reference to the client. Nothing
/// mutates it afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadiusConfig {
    /// Shared secret between this NAS and the RADIUS server
    #[serde(default = "default_secret")]
    pub secret: String,

    /// RADIUS server host name or IP address
    #[serde(default = "default_server")]
    pub server: String,

    /// RADIUS authentication port
    #[serde(default = "default_port")]
    pub port: u16,

    /// How long to wait for a reply, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u32,

    /// Value sent as NAS-IP-Address
    #[serde(default = "default_nas_ip_address")]
    pub nas_ip_address: String,

    /// Value sent as NAS-Identifier
    #[serde(default = "default_nas_identifier")]
    pub nas_identifier: String,
}

fn default_secret() -> String {
    "testing123".to_string()
}

fn default_server() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    1812 // Standard RADIUS authentication port
}

fn default_timeout_ms() -> u32 {
    3000
}

fn default_nas_ip_address() -> String {
    "127.0.0.1".to_string()
}

fn default_nas_identifier() -> String {
    "radius-app".to_string()
}

impl Default for RadiusConfig {
    fn default() -> Self {
        RadiusConfig {
            secret: default_secret(),
            server: default_server(),
            port: default_port(),
            timeout_ms: default_timeout_ms(),
            nas_ip_address: default_nas_ip_address(),
            nas_identifier: default_nas_identifier(),
        }
    }
}

impl RadiusConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.timeout_ms))
    }

    pub fn secret(&self) -> &[u8] {
        self.secret.as_bytes()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::Invalid("RADIUS secret cannot be empty".to_string()));
        }
        if self.server.is_empty() {
            return Err(ConfigError::Invalid("RADIUS server cannot be empty".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("RADIUS port cannot be 0".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("RADIUS timeout cannot be 0".to_string()));
        }
        if self.nas_ip_address.parse::<std::net::Ipv4Addr>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "Invalid NAS-IP-Address: {}",
                self.nas_ip_address
            )));
        }
        Ok(())
    }
}

/// A guest account seeded into the in-memory credential store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password: String,
}

/// Portal configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub radius: RadiusConfig,

    /// PostgreSQL credential store. The in-memory store is used when absent.
    #[serde(default)]
    pub database: Option<PostgresConfig>,

    /// Accounts for the in-memory store
    #[serde(default)]
    pub users: Vec<User>,

    /// Session lifetime in seconds (default: 24 hours)
    #[serde(default)]
    pub session_ttl_secs: Option<u64>,

    /// Log level: "trace", "debug", "info", "warn", "error" (default: "info")
    #[serde(default)]
    pub log_level: Option<String>,
}

/// Environment variables that override file settings
pub const ENV_RADIUS_SECRET: &str = "RADIUS_SECRET";
pub const ENV_RADIUS_SERVER: &str = "RADIUS_SERVER";
pub const ENV_RADIUS_PORT: &str = "RADIUS_PORT";
pub const ENV_RADIUS_TIMEOUT: &str = "RADIUS_TIMEOUT";
pub const ENV_RADIUS_NAS_IP: &str = "RADIUS_NAS_IP";
pub const ENV_RADIUS_NAS_IDENTIFIER: &str = "RADIUS_NAS_IDENTIFIER";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";

const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Build the startup configuration: optional file, then the process
    /// environment on top, then validation
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };
        let config = base.with_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup
    ///
    /// Empty values count as unset.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(secret) = get(ENV_RADIUS_SECRET) {
            self.radius.secret = secret;
        }
        if let Some(server) = get(ENV_RADIUS_SERVER) {
            self.radius.server = server;
        }
        if let Some(port) = get(ENV_RADIUS_PORT) {
            self.radius.port = port.parse().map_err(|_| {
                ConfigError::Invalid(format!("{} is not a port number: {}", ENV_RADIUS_PORT, port))
            })?;
        }
        if let Some(timeout) = get(ENV_RADIUS_TIMEOUT) {
            self.radius.timeout_ms = timeout.parse().map_err(|_| {
                ConfigError::Invalid(format!(
                    "{} is not a number of milliseconds: {}",
                    ENV_RADIUS_TIMEOUT, timeout
                ))
            })?;
        }
        if let Some(nas_ip) = get(ENV_RADIUS_NAS_IP) {
            self.radius.nas_ip_address = nas_ip;
        }
        if let Some(nas_identifier) = get(ENV_RADIUS_NAS_IDENTIFIER) {
            self.radius.nas_identifier = nas_identifier;
        }
        if let Some(url) = get(ENV_DATABASE_URL) {
            let mut database = self.database.take().unwrap_or_default();
            database.url = url;
            self.database = Some(database);
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            self.log_level = Some(level);
        }

        Ok(self)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs.unwrap_or(DEFAULT_SESSION_TTL_SECS))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.radius.validate()?;

        if self.session_ttl_secs == Some(0) {
            return Err(ConfigError::Invalid("Session TTL cannot be 0".to_string()));
        }

        if let Some(database) = &self.database {
            if database.url.is_empty() {
                return Err(ConfigError::Invalid("Database URL cannot be empty".to_string()));
            }
        }

        for user in &self.users {
            if user.username.is_empty() {
                return Err(ConfigError::Invalid("User has empty username".to_string()));
            }
        }

        Ok(())
    }

    /// Create an example configuration file
    pub fn example() -> Self {
        Config {
            radius: RadiusConfig::default(),
            database: None,
            users: vec![User {
                username: "guest@example.com".to_string(),
                password: "5551234567".to_string(),
            }],
            session_ttl_secs: Some(DEFAULT_SESSION_TTL_SECS),
            log_level: Some("info".to_string()),
        }
    }
}
