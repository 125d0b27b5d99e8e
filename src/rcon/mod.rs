//! Remote console capability
//!
//! The scan loop only ever sees the `Connector` / `Session` traits. `client`
//! provides the TCP implementation used by the binary.

pub mod client;
pub mod packet;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::roster::Player;

pub use client::{TcpConnector, TcpSession};

#[derive(Debug, Error)]
pub enum RconError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("credential rejected")]
    AuthRejected,
    #[error("malformed packet: {0}")]
    Malformed(String),
    #[error("session closed")]
    Closed,
}

/// Opens transport-level sessions to a remote console
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, address: &str) -> Result<Box<dyn Session>, RconError>;
}

/// One open remote console session
#[async_trait]
pub trait Session: Send {
    async fn authenticate(&mut self, password: &str) -> Result<(), RconError>;

    /// Full player listing, online and offline
    async fn query_players(&mut self) -> Result<Vec<Player>, RconError>;

    async fn close(&mut self) -> Result<(), RconError>;
}
