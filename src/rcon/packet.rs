// Remote console packet framing
//
// Little-endian i32 size, i32 request id, i32 type, body, two NUL bytes.
// `size` counts everything after itself.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::RconError;

pub const SERVERDATA_AUTH: i32 = 3;
pub const SERVERDATA_AUTH_RESPONSE: i32 = 2;
pub const SERVERDATA_EXECCOMMAND: i32 = 2;
pub const SERVERDATA_RESPONSE_VALUE: i32 = 0;

/// id + type + two terminators
const MIN_PACKET_SIZE: i32 = 10;
const MAX_PACKET_SIZE: i32 = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub id: i32,
    pub kind: i32,
    pub body: String,
}

impl Packet {
    pub fn new(id: i32, kind: i32, body: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            body: body.into(),
        }
    }

    /// Full frame including the leading size field
    pub fn encode(&self) -> Result<Vec<u8>, RconError> {
        let body = self.body.as_bytes();
        let size = i32::try_from(body.len())
            .ok()
            .and_then(|len| len.checked_add(MIN_PACKET_SIZE))
            .filter(|size| *size <= MAX_PACKET_SIZE)
            .ok_or_else(|| {
                RconError::Malformed(format!("body too large ({} bytes)", body.len()))
            })?;

        let mut frame = Vec::with_capacity(size as usize + 4);
        frame.extend_from_slice(&size.to_le_bytes());
        frame.extend_from_slice(&self.id.to_le_bytes());
        frame.extend_from_slice(&self.kind.to_le_bytes());
        frame.extend_from_slice(body);
        frame.extend_from_slice(&[0, 0]);
        Ok(frame)
    }

    /// Decode the bytes that follow the size field
    pub fn decode(payload: &[u8]) -> Result<Self, RconError> {
        if payload.len() < MIN_PACKET_SIZE as usize {
            return Err(RconError::Malformed(format!(
                "packet too short ({} bytes)",
                payload.len()
            )));
        }

        let id = i32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
        let kind = i32::from_le_bytes([payload[4], payload[5], payload[6], payload[7]]);
        let (body, terminator) = payload[8..].split_at(payload.len() - 10);
        if terminator != [0, 0] {
            return Err(RconError::Malformed("missing body terminator".to_string()));
        }

        Ok(Self {
            id,
            kind,
            body: String::from_utf8_lossy(body).into_owned(),
        })
    }
}

pub async fn write_packet<W>(writer: &mut W, packet: &Packet) -> Result<(), RconError>
where
    W: AsyncWrite + Unpin,
{
    let frame = packet.encode()?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn read_packet<R>(reader: &mut R) -> Result<Packet, RconError>
where
    R: AsyncRead + Unpin,
{
    let size = reader.read_i32_le().await.map_err(eof_as_closed)?;
    if !(MIN_PACKET_SIZE..=MAX_PACKET_SIZE).contains(&size) {
        return Err(RconError::Malformed(format!("invalid packet size {}", size)));
    }

    let mut payload = vec![0u8; size as usize];
    reader.read_exact(&mut payload).await.map_err(eof_as_closed)?;
    Packet::decode(&payload)
}

fn eof_as_closed(err: std::io::Error) -> RconError {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        RconError::Closed
    } else {
        RconError::Io(err)
    }
}
