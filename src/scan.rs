//! The polling loop
//!
//! Every interval: fetch the roster, diff it against the last good one, post
//! one notification per transition, keep the new roster as the reference.
//! Cancellation is checked once per cycle, before the sleep.

use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::connection::ConnectionManager;
use crate::notifier::Notifier;
use crate::roster::{diff, RosterSnapshot};
use crate::shutdown::ShutdownListener;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Initializing,
    Polling,
    ShuttingDown,
}

/// What one polling cycle did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: bool,
    pub transitions: usize,
    pub delivered: usize,
    pub failed: usize,
}

pub struct ScanLoop {
    connection: ConnectionManager,
    notifier: Notifier,
    interval: Duration,
    reference: RosterSnapshot,
    phase: ScanPhase,
}

impl ScanLoop {
    pub fn new(connection: ConnectionManager, notifier: Notifier, interval: Duration) -> Self {
        Self {
            connection,
            notifier,
            interval,
            reference: RosterSnapshot::empty(),
            phase: ScanPhase::Initializing,
        }
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    fn enter(&mut self, phase: ScanPhase) {
        if self.phase != phase {
            info!(from = ?self.phase, to = ?phase, "scan loop phase change");
        }
        self.phase = phase;
    }

    /// Roster the next cycle will be diffed against
    pub fn reference(&self) -> &RosterSnapshot {
        &self.reference
    }

    /// Load the first reference roster. A failure leaves the reference empty
    /// so the next good poll reports everyone online as a login.
    pub async fn initialize(&mut self) {
        self.enter(ScanPhase::Initializing);
        match self.connection.get_roster().await {
            Ok(roster) => {
                info!(
                    players = roster.len(),
                    online = roster.online_count(),
                    "initial roster loaded"
                );
                self.reference = roster;
            }
            Err(e) => {
                error!(
                    address = %self.connection.address(),
                    error = %e,
                    "could not load initial state"
                );
                self.reference = RosterSnapshot::empty();
            }
        }
        self.enter(ScanPhase::Polling);
    }

    /// Fetch, diff, notify, then advance the reference
    pub async fn poll_cycle(&mut self) -> CycleReport {
        let current = match self.connection.get_roster().await {
            Ok(roster) => roster,
            Err(e) => {
                error!(
                    address = %self.connection.address(),
                    error = %e,
                    "could not get users from the rcon server"
                );
                return CycleReport::default();
            }
        };

        let transitions = diff(&self.reference, &current);
        let mut report = CycleReport {
            fetched: true,
            transitions: transitions.len(),
            ..Default::default()
        };

        for transition in &transitions {
            let message = transition.to_string();
            match self.notifier.deliver(&message).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    error!(msg = %message, error = %e, "could not post change to webhook");
                    report.failed += 1;
                }
            }
        }

        self.reference = current;
        report
    }

    /// Run until `shutdown` is cancelled, then close the session and
    /// acknowledge.
    pub async fn run(&mut self, shutdown: ShutdownListener) {
        self.initialize().await;

        loop {
            if shutdown.is_cancelled() {
                info!("scan loop cancelled");
                break;
            }

            debug!("scan loop execution");
            tokio::time::sleep(self.interval).await;

            let report = self.poll_cycle().await;
            if report.transitions > 0 {
                debug!(
                    transitions = report.transitions,
                    delivered = report.delivered,
                    failed = report.failed,
                    "cycle complete"
                );
            }
        }

        self.enter(ScanPhase::ShuttingDown);
        if let Err(e) = self.connection.disconnect().await {
            warn!(error = %e, "closing remote console session on shutdown failed");
        }
        shutdown.acknowledge();
    }
}
