pub mod app;
pub mod cli;
pub mod config;
pub mod connection;
pub mod error;
pub mod logging;
pub mod notifier;
pub mod rcon;
pub mod roster;
pub mod scan;
pub mod shutdown;

// Re-export commonly used types
pub use config::Config;
pub use connection::{ConnectionManager, ConnectionState};
pub use error::WatchError;
pub use notifier::Notifier;
pub use roster::{diff, RosterSnapshot, Transition};
pub use scan::ScanLoop;
