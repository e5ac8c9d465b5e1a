use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Table name cannot be empty")]
    EmptyTableName,

    #[error("Path must start with '/': {0}")]
    InvalidPath(String),
}

/// Causes service configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for upsert requests forwarded by the gateway
    pub listener: Listener,
    /// Admin listener for health and readiness checks
    pub admin_listener: Listener,
    /// Table holding cause records, keyed by `cause_id`
    #[serde(default = "default_table_name")]
    pub table_name: String,
    /// Path the upsert endpoint is served on
    #[serde(default = "default_path")]
    pub path: String,
    /// Replace the lookup before an update with a single conditional update.
    #[serde(default)]
    pub conditional_update: bool,
}

fn default_table_name() -> String {
    "causes".into()
}

fn default_path() -> String {
    "/causes".into()
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if self.table_name.is_empty() {
            return Err(ValidationError::EmptyTableName);
        }

        if !self.path.starts_with('/') {
            return Err(ValidationError::InvalidPath(self.path.clone()));
        }

        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}
