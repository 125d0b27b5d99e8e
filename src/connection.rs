//! Self-healing remote console connection
//!
//! `ConnectionManager` is the only owner of the protocol session. Callers ask
//! for a roster; connecting, reconnecting after failures, and bounding the
//! retries all happen in here.

use tracing::{debug, info, warn};

use crate::error::{Result, WatchError};
use crate::rcon::{Connector, RconError, Session};
use crate::roster::RosterSnapshot;

/// Total query attempts per `get_roster` call
pub const QUERY_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

pub struct ConnectionManager {
    connector: Box<dyn Connector>,
    address: String,
    password: String,
    session: Option<Box<dyn Session>>,
}

impl ConnectionManager {
    pub fn new(
        connector: Box<dyn Connector>,
        address: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            connector,
            address: address.into(),
            password: password.into(),
            session: None,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn state(&self) -> ConnectionState {
        if self.session.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    /// Open and authenticate a new session
    pub async fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            if let Err(e) = self.disconnect().await {
                debug!(error = %e, "ignoring close failure of stale session");
            }
        }

        let mut session = self
            .connector
            .connect(&self.address)
            .await
            .map_err(|source| WatchError::Connection {
                address: self.address.clone(),
                source,
            })?;

        if let Err(source) = session.authenticate(&self.password).await {
            // Best effort: the session never became ours
            let _ = session.close().await;
            return Err(WatchError::Authentication {
                address: self.address.clone(),
                source,
            });
        }

        info!(address = %self.address, "connected to remote console");
        self.session = Some(session);
        Ok(())
    }

    /// Close the session if there is one. Local state is cleared even when
    /// closing fails.
    pub async fn disconnect(&mut self) -> Result<()> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };

        debug!(address = %self.address, "closing remote console session");
        session
            .close()
            .await
            .map_err(|source| WatchError::Disconnect {
                address: self.address.clone(),
                source,
            })
    }

    /// Fetch the current roster, reconnecting between failed attempts
    pub async fn get_roster(&mut self) -> Result<RosterSnapshot> {
        if self.session.is_none() {
            self.connect().await?;
        }

        let mut attempt = 1;
        loop {
            let result = match self.session.as_mut() {
                Some(session) => session.query_players().await,
                None => Err(RconError::Closed),
            };

            let source = match result {
                Ok(players) => {
                    if attempt > 1 {
                        info!(
                            address = %self.address,
                            retries = attempt - 1,
                            "roster query recovered after {} retries",
                            attempt - 1
                        );
                    }
                    return Ok(RosterSnapshot::from_players(players));
                }
                Err(source) => source,
            };

            if attempt >= QUERY_ATTEMPTS {
                return Err(WatchError::RosterQuery {
                    address: self.address.clone(),
                    attempts: attempt,
                    source,
                });
            }

            warn!(
                address = %self.address,
                attempt,
                error = %source,
                "roster query failed, reconnecting"
            );
            self.disconnect().await?;
            self.connect().await?;
            attempt += 1;
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedConnector;
    use super::*;
    use crate::logging::testing::capture;

    fn manager(connector: &ScriptedConnector) -> ConnectionManager {
        ConnectionManager::new(Box::new(connector.clone()), "127.0.0.1:27015", "secret")
    }

    fn query_error() -> RconError {
        RconError::Malformed("garbled".to_string())
    }

    #[tokio::test]
    async fn get_roster_connects_lazily() {
        let connector = ScriptedConnector::new();
        connector.push_players(&[("alice", true), ("bob", false)]);
        let mut conn = manager(&connector);
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert_eq!(connector.connects(), 0);

        let roster = conn.get_roster().await.unwrap();
        assert_eq!(roster.get("alice"), Some(true));
        assert_eq!(roster.get("bob"), Some(false));
        assert_eq!(conn.state(), ConnectionState::Connected);
        assert_eq!(connector.connects(), 1);
    }

    #[tokio::test]
    async fn get_roster_reuses_session() {
        let connector = ScriptedConnector::new();
        connector.push_players(&[]).push_players(&[("alice", true)]);
        let mut conn = manager(&connector);

        conn.get_roster().await.unwrap();
        conn.get_roster().await.unwrap();
        assert_eq!(connector.connects(), 1);
        assert_eq!(connector.closes(), 0);
    }

    #[tokio::test]
    async fn recovers_on_third_attempt_after_two_reconnects() {
        let connector = ScriptedConnector::new();
        connector
            .push_query(Err(query_error()))
            .push_query(Err(query_error()))
            .push_players(&[("carol", true)]);
        let mut conn = manager(&connector);

        let roster = conn.get_roster().await.unwrap();
        assert!(roster.is_online("carol"));
        assert_eq!(connector.query_calls(), 3);
        // initial connect plus two reconnect cycles
        assert_eq!(connector.connects(), 3);
        assert_eq!(connector.closes(), 2);
    }

    #[tokio::test]
    async fn gives_up_after_three_attempts() {
        let connector = ScriptedConnector::new();
        for _ in 0..5 {
            connector.push_query(Err(query_error()));
        }
        let mut conn = manager(&connector);

        let err = conn.get_roster().await.unwrap_err();
        match err {
            WatchError::RosterQuery {
                attempts, source, ..
            } => {
                assert_eq!(attempts, QUERY_ATTEMPTS);
                assert!(matches!(source, RconError::Malformed(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(connector.query_calls(), 3);
        assert_eq!(connector.connects(), 3);
    }

    #[tokio::test]
    async fn initial_connect_failure_is_not_retried() {
        let connector = ScriptedConnector::new();
        connector.fail_next_connect().push_players(&[]);
        let mut conn = manager(&connector);

        let err = conn.get_roster().await.unwrap_err();
        assert!(matches!(err, WatchError::Connection { .. }));
        assert_eq!(connector.connects(), 1);
        assert_eq!(connector.query_calls(), 0);
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn rejected_credential_surfaces_authentication_error() {
        let connector = ScriptedConnector::new();
        connector.fail_next_auth();
        let mut conn = manager(&connector);

        let err = conn.connect().await.unwrap_err();
        assert!(matches!(err, WatchError::Authentication { .. }));
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        // the half-open session is closed, not leaked
        assert_eq!(connector.connects(), 1);
        assert_eq!(connector.closes(), 1);
    }

    #[tokio::test]
    async fn recovery_after_retries_is_logged() {
        let (logs, _guard) = capture();
        let connector = ScriptedConnector::new();
        connector
            .push_query(Err(query_error()))
            .push_players(&[("alice", true)]);
        let mut conn = manager(&connector);

        conn.get_roster().await.unwrap();
        assert_eq!(connector.query_calls(), 2);

        let out = logs.contents();
        assert!(out.contains("roster query failed, reconnecting"));
        assert!(out.contains("roster query recovered after 1 retries"));
        assert!(out.contains("retries=1"));
    }

    #[tokio::test]
    async fn first_try_success_logs_no_recovery() {
        let (logs, _guard) = capture();
        let connector = ScriptedConnector::new();
        connector.push_players(&[("alice", true)]);
        let mut conn = manager(&connector);

        conn.get_roster().await.unwrap();
        assert!(!logs.contents().contains("recovered"));
    }

    #[tokio::test]
    async fn reconnect_failure_is_surfaced_unmasked() {
        let connector = ScriptedConnector::new();
        connector.push_query(Err(query_error()));
        let mut conn = manager(&connector);
        conn.connect().await.unwrap();
        connector.fail_next_connect();

        let err = conn.get_roster().await.unwrap_err();
        assert!(matches!(err, WatchError::Connection { .. }));
        assert_eq!(connector.query_calls(), 1);
    }

    #[tokio::test]
    async fn close_failure_during_retry_aborts() {
        let connector = ScriptedConnector::new();
        connector.push_query(Err(query_error())).push_players(&[]);
        let mut conn = manager(&connector);
        conn.connect().await.unwrap();
        connector.fail_next_close();

        let err = conn.get_roster().await.unwrap_err();
        assert!(matches!(err, WatchError::Disconnect { .. }));
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert_eq!(connector.query_calls(), 1);
    }

    #[tokio::test]
    async fn disconnect_is_idempotent_and_clears_state_on_error() {
        let connector = ScriptedConnector::new();
        let mut conn = manager(&connector);
        conn.disconnect().await.unwrap();
        assert_eq!(connector.closes(), 0);

        conn.connect().await.unwrap();
        connector.fail_next_close();
        assert!(conn.disconnect().await.is_err());
        assert_eq!(conn.state(), ConnectionState::Disconnected);

        conn.disconnect().await.unwrap();
        assert_eq!(connector.closes(), 1);
    }
}
