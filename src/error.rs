//! Playerwatch error types
//!
//! `WatchError` is the crate-level error. The protocol capability and the
//! webhook transport have their own narrower errors (`RconError`,
//! `SendError`) which end up as the `source` of a `WatchError`.

use thiserror::Error;

use crate::notifier::SendError;
use crate::rcon::RconError;

#[derive(Debug, Error)]
pub enum WatchError {
    /// A required startup parameter is missing or invalid
    #[error("Config invalid [{field}]: {reason}")]
    Configuration { field: String, reason: String },

    #[error("Config parse error: {0}")]
    ConfigParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    /// The webhook HTTP client could not be built
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// The transport to the remote console could not be established
    #[error("could not connect to {address}: {source}")]
    Connection {
        address: String,
        #[source]
        source: RconError,
    },

    /// The remote console rejected the credential
    #[error("authentication against {address} failed: {source}")]
    Authentication {
        address: String,
        #[source]
        source: RconError,
    },

    /// The roster query failed on every attempt of the retry budget
    #[error("roster query against {address} failed after {attempts} attempts: {source}")]
    RosterQuery {
        address: String,
        attempts: u32,
        #[source]
        source: RconError,
    },

    #[error("closing session to {address} failed: {source}")]
    Disconnect {
        address: String,
        #[source]
        source: RconError,
    },

    /// The webhook did not accept the message on any attempt
    #[error("delivery failed after {attempts} attempts: {source}")]
    Delivery {
        attempts: u32,
        #[source]
        source: SendError,
    },

    #[error("shutdown handshake failed: {0}")]
    Shutdown(String),
}

impl WatchError {
    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WatchError>;
