// TCP remote console client
//
// Speaks the framing in `packet` against Factorio style servers. Every
// network step is bounded by the configured I/O timeout.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use super::packet::{
    read_packet, write_packet, Packet, SERVERDATA_AUTH, SERVERDATA_AUTH_RESPONSE,
    SERVERDATA_EXECCOMMAND, SERVERDATA_RESPONSE_VALUE,
};
use super::{Connector, RconError, Session};
use crate::roster::Player;

const PLAYERS_COMMAND: &str = "/players";
const PLAYERS_HEADER: &str = "Players (";
const ONLINE_SUFFIX: &str = "(online)";

/// Unrelated packets tolerated while waiting for one reply
const MAX_SKIPPED_PACKETS: usize = 32;

/// Opens `TcpSession`s
#[derive(Debug, Clone)]
pub struct TcpConnector {
    io_timeout: Duration,
}

impl TcpConnector {
    pub fn new(io_timeout: Duration) -> Self {
        Self { io_timeout }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, address: &str) -> Result<Box<dyn Session>, RconError> {
        let stream = with_timeout(self.io_timeout, async {
            TcpStream::connect(address).await.map_err(RconError::from)
        })
        .await?;
        stream.set_nodelay(true)?;

        tracing::debug!(%address, "remote console transport established");
        Ok(Box::new(TcpSession::new(stream, self.io_timeout)))
    }
}

pub struct TcpSession {
    stream: Option<TcpStream>,
    next_id: i32,
    io_timeout: Duration,
}

impl TcpSession {
    pub fn new(stream: TcpStream, io_timeout: Duration) -> Self {
        Self {
            stream: Some(stream),
            next_id: 0,
            io_timeout,
        }
    }

    /// Run a console command and return the response body
    pub async fn execute(&mut self, command: &str) -> Result<String, RconError> {
        let id = self.send(SERVERDATA_EXECCOMMAND, command).await?;
        for _ in 0..=MAX_SKIPPED_PACKETS {
            let packet = self.recv().await?;
            if packet.id == id && packet.kind == SERVERDATA_RESPONSE_VALUE {
                return Ok(packet.body);
            }
            tracing::trace!(id = packet.id, kind = packet.kind, "skipping unrelated packet");
        }
        Err(too_many_skipped(id))
    }

    fn allocate_id(&mut self) -> i32 {
        // -1 is reserved for rejected authentication
        self.next_id = self.next_id.checked_add(1).unwrap_or(1);
        self.next_id
    }

    async fn send(&mut self, kind: i32, body: &str) -> Result<i32, RconError> {
        let id = self.allocate_id();
        let limit = self.io_timeout;
        let stream = self.stream.as_mut().ok_or(RconError::Closed)?;
        with_timeout(limit, write_packet(stream, &Packet::new(id, kind, body))).await?;
        Ok(id)
    }

    async fn recv(&mut self) -> Result<Packet, RconError> {
        let limit = self.io_timeout;
        let stream = self.stream.as_mut().ok_or(RconError::Closed)?;
        with_timeout(limit, read_packet(stream)).await
    }
}

#[async_trait]
impl Session for TcpSession {
    async fn authenticate(&mut self, password: &str) -> Result<(), RconError> {
        let id = self.send(SERVERDATA_AUTH, password).await?;
        for _ in 0..=MAX_SKIPPED_PACKETS {
            let packet = self.recv().await?;
            // Some servers send an empty response value ahead of the auth response
            if packet.kind != SERVERDATA_AUTH_RESPONSE {
                continue;
            }
            return match packet.id {
                -1 => Err(RconError::AuthRejected),
                got if got == id => Ok(()),
                got => Err(RconError::Malformed(format!(
                    "auth response for request {} while waiting on {}",
                    got, id
                ))),
            };
        }
        Err(too_many_skipped(id))
    }

    async fn query_players(&mut self) -> Result<Vec<Player>, RconError> {
        let body = self.execute(PLAYERS_COMMAND).await?;
        parse_players(&body)
    }

    async fn close(&mut self) -> Result<(), RconError> {
        let mut stream = self.stream.take().ok_or(RconError::Closed)?;
        stream.shutdown().await?;
        Ok(())
    }
}

/// Parse a `/players` listing:
///
/// ```text
/// Players (2):
///   alice (online)
///   bob
/// ```
///
/// A missing `Players (N):` header, or a row count other than N, is
/// `Malformed`.
pub fn parse_players(body: &str) -> Result<Vec<Player>, RconError> {
    let mut lines = body.lines();
    let header = lines.next().unwrap_or_default().trim();
    let expected = header
        .strip_prefix(PLAYERS_HEADER)
        .and_then(|rest| rest.strip_suffix("):"))
        .and_then(|count| count.parse::<usize>().ok())
        .ok_or_else(|| RconError::Malformed(format!("unexpected /players header {:?}", header)))?;

    let players: Vec<Player> = lines
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.strip_suffix(ONLINE_SUFFIX) {
            Some(name) => Player::new(name.trim_end(), true),
            None => Player::new(line, false),
        })
        .collect();

    if players.len() != expected {
        return Err(RconError::Malformed(format!(
            "/players announced {} players but listed {}",
            expected,
            players.len()
        )));
    }
    Ok(players)
}

fn too_many_skipped(id: i32) -> RconError {
    RconError::Malformed(format!(
        "no reply to request {} within {} packets",
        id, MAX_SKIPPED_PACKETS
    ))
}

async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, RconError>
where
    F: Future<Output = Result<T, RconError>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| RconError::Timeout(limit))?
}
