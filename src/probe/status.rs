// src/probe/status.rs

//! Game server status over the Minecraft Server List Ping protocol.
//!
//! Wire format (all packets are VarInt-length-prefixed):
//! - handshake: id `0x00`, protocol VarInt (`-1`), host string, port u16 BE,
//!   next state VarInt (`1` = status)
//! - status request: id `0x00`, empty body
//! - status response: id `0x00`, JSON string
//! - ping / pong: id `0x01`, i64 payload echoed back

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::config::StatusTarget;
use crate::errors::ProbeError;

/// Refuse packets larger than this; a status response is a few KiB.
const MAX_PACKET_LEN: usize = 1 << 20;

/// What the status probe learned about the game server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerStatus {
    pub motd: String,
    pub players_online: u64,
    pub players_max: u64,
    pub latency_ms: u64,
    pub version: String,
    pub player_sample: Vec<PlayerSample>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerSample {
    pub name: String,
    pub id: String,
}

/// Trait abstracting the game-server status query.
pub trait StatusProbe: Send + Sync + 'static {
    fn query(&self) -> Pin<Box<dyn Future<Output = Result<ServerStatus, ProbeError>> + Send + '_>>;
}

/// Server List Ping probe against a fixed host/port.
#[derive(Debug, Clone)]
pub struct SlpProbe {
    target: StatusTarget,
}

impl SlpProbe {
    pub fn new(target: StatusTarget) -> Self {
        Self { target }
    }
}

impl StatusProbe for SlpProbe {
    fn query(&self) -> Pin<Box<dyn Future<Output = Result<ServerStatus, ProbeError>> + Send + '_>> {
        Box::pin(async move {
            let limit = self.target.timeout;
            match timeout(limit, ping_server(&self.target.host, self.target.port)).await {
                Ok(result) => result,
                Err(_) => Err(ProbeError::Timeout),
            }
        })
    }
}

async fn ping_server(host: &str, port: u16) -> Result<ServerStatus, ProbeError> {
    let mut stream = TcpStream::connect((host, port)).await?;
    stream.set_nodelay(true)?;

    let started = Instant::now();
    stream.write_all(&handshake_packet(host, port)).await?;
    stream.write_all(&frame(&[0x00])).await?;

    let body = read_packet(&mut stream).await?;
    let mut cursor = body.as_slice();
    let id = decode_varint(&mut cursor)?;
    if id != 0x00 {
        return Err(ProbeError::Protocol(format!(
            "expected status response (0x00), got packet 0x{id:02x}"
        )));
    }
    let json_len = decode_varint(&mut cursor)? as usize;
    if json_len > cursor.len() {
        return Err(ProbeError::Protocol("truncated status JSON".to_string()));
    }
    let json: Value = serde_json::from_slice(&cursor[..json_len])?;
    let status_rtt = started.elapsed();

    let latency = match measure_ping(&mut stream).await {
        Ok(rtt) => rtt,
        Err(e) => {
            debug!(error = %e, "ping after status failed; using status round trip");
            status_rtt
        }
    };

    Ok(parse_status(&json, latency))
}

async fn measure_ping(stream: &mut TcpStream) -> Result<Duration, ProbeError> {
    let payload: i64 = 0x6761_6d65_6374_6c00;
    let mut packet = vec![0x01];
    packet.extend_from_slice(&payload.to_be_bytes());

    let sent = Instant::now();
    stream.write_all(&frame(&packet)).await?;

    let body = read_packet(stream).await?;
    if body.len() != 9 || body[0] != 0x01 {
        return Err(ProbeError::Protocol("malformed pong".to_string()));
    }
    Ok(sent.elapsed())
}

/// Build the handshake packet (already length-framed).
pub fn handshake_packet(host: &str, port: u16) -> Vec<u8> {
    let mut body = Vec::with_capacity(host.len() + 16);
    body.push(0x00);
    encode_varint(-1, &mut body);
    encode_varint(host.len() as i32, &mut body);
    body.extend_from_slice(host.as_bytes());
    body.extend_from_slice(&port.to_be_bytes());
    encode_varint(1, &mut body);
    frame(&body)
}

fn frame(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 5);
    encode_varint(body.len() as i32, &mut out);
    out.extend_from_slice(body);
    out
}

async fn read_packet<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProbeError> {
    let len = read_varint(reader).await?;
    if len < 0 || len as usize > MAX_PACKET_LEN {
        return Err(ProbeError::Protocol(format!("invalid packet length {len}")));
    }
    let mut body = vec![0u8; len as usize];
    reader.read_exact(&mut body).await?;
    Ok(body)
}

/// Append `value` as a protocol VarInt (LEB128 over the two's-complement
/// bits, at most five bytes).
pub fn encode_varint(value: i32, out: &mut Vec<u8>) {
    let mut v = value as u32;
    loop {
        if v & !0x7f == 0 {
            out.push(v as u8);
            return;
        }
        out.push((v as u8 & 0x7f) | 0x80);
        v >>= 7;
    }
}

/// Decode a VarInt from the front of `input`, advancing it.
pub fn decode_varint(input: &mut &[u8]) -> Result<i32, ProbeError> {
    let mut value: u32 = 0;
    for i in 0..5 {
        let (&byte, rest) = input
            .split_first()
            .ok_or_else(|| ProbeError::Protocol("truncated VarInt".to_string()))?;
        *input = rest;
        value |= u32::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value as i32);
        }
    }
    Err(ProbeError::Protocol("VarInt longer than 5 bytes".to_string()))
}

async fn read_varint<R: AsyncRead + Unpin>(reader: &mut R) -> Result<i32, ProbeError> {
    let mut value: u32 = 0;
    for i in 0..5 {
        let byte = reader.read_u8().await?;
        value |= u32::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value as i32);
        }
    }
    Err(ProbeError::Protocol("VarInt longer than 5 bytes".to_string()))
}

/// Turn the status JSON into a [`ServerStatus`]. Missing fields become
/// empty/zero rather than errors.
pub fn parse_status(json: &Value, latency: Duration) -> ServerStatus {
    let players = &json["players"];
    let player_sample = players["sample"]
        .as_array()
        .map(|sample| {
            sample
                .iter()
                .map(|p| PlayerSample {
                    name: p["name"].as_str().unwrap_or_default().to_string(),
                    id: p["id"].as_str().unwrap_or_default().to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    ServerStatus {
        motd: motd_text(&json["description"]),
        players_online: players["online"].as_u64().unwrap_or(0),
        players_max: players["max"].as_u64().unwrap_or(0),
        latency_ms: latency.as_millis() as u64,
        version: json["version"]["name"].as_str().unwrap_or_default().to_string(),
        player_sample,
    }
}

/// Flatten a chat component (plain string, or `{text, extra: [...]}`).
fn motd_text(description: &Value) -> String {
    match description {
        Value::String(s) => s.clone(),
        Value::Object(obj) => {
            let mut out = obj
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if let Some(extra) = obj.get("extra").and_then(Value::as_array) {
                for part in extra {
                    out.push_str(&motd_text(part));
                }
            }
            out
        }
        _ => String::new(),
    }
}
