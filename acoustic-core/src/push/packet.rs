//! Just enough of the Engine.IO v4 / Socket.IO v5 text framing to talk to a
//! Socket.IO server over a bare WebSocket.
//!
//! An Engine.IO packet is a single type digit followed by its payload; a
//! Socket.IO packet rides inside an Engine.IO `message` (`4`) packet as
//! `<type>[/<namespace>,][<ack id>][<json>]`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug)]
pub enum PacketError {
    Empty,
    UnknownEngineType(char),
    UnknownSocketType(char),
    InvalidJson(serde_json::Error),
    InvalidEvent(String),
    Unsupported(&'static str),
    /// The packet belongs to a namespace other than the root one.
    OtherNamespace(String),
}
impl std::fmt::Display for PacketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PacketError::Empty => write!(f, "empty packet"),
            PacketError::UnknownEngineType(c) => write!(f, "unknown engine.io packet type `{c}`"),
            PacketError::UnknownSocketType(c) => write!(f, "unknown socket.io packet type `{c}`"),
            PacketError::InvalidJson(e) => write!(f, "invalid packet payload: {e}"),
            PacketError::InvalidEvent(e) => write!(f, "invalid event packet: {e}"),
            PacketError::Unsupported(what) => write!(f, "unsupported packet: {what}"),
            PacketError::OtherNamespace(ns) => write!(f, "packet for namespace `{ns}`"),
        }
    }
}
impl std::error::Error for PacketError {}
impl From<serde_json::Error> for PacketError {
    fn from(e: serde_json::Error) -> Self {
        PacketError::InvalidJson(e)
    }
}

/// The server's answer to a new connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Milliseconds between server pings.
    pub ping_interval: u64,
    /// Milliseconds the server waits for a pong.
    pub ping_timeout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_payload: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping,
    Pong,
    Message(SocketPacket),
    Upgrade,
    Noop,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect(Option<Value>),
    Disconnect,
    Event { name: String, args: Vec<Value> },
    Ack { id: u64, args: Vec<Value> },
    ConnectError(Value),
}

impl EnginePacket {
    pub fn decode(text: &str) -> Result<Self, PacketError> {
        let mut chars = text.chars();
        let ty = chars.next().ok_or(PacketError::Empty)?;
        let payload = chars.as_str();
        Ok(match ty {
            '0' => EnginePacket::Open(serde_json::from_str(payload)?),
            '1' => EnginePacket::Close,
            '2' => EnginePacket::Ping,
            '3' => EnginePacket::Pong,
            '4' => EnginePacket::Message(SocketPacket::decode(payload)?),
            '5' => EnginePacket::Upgrade,
            '6' => EnginePacket::Noop,
            c => return Err(PacketError::UnknownEngineType(c)),
        })
    }

    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(handshake) => format!(
                "0{}",
                serde_json::to_string(handshake).unwrap_or_else(|_| "{}".to_string())
            ),
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping => "2".to_string(),
            EnginePacket::Pong => "3".to_string(),
            EnginePacket::Message(packet) => format!("4{}", packet.encode()),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }
}

impl SocketPacket {
    pub fn decode(text: &str) -> Result<Self, PacketError> {
        let mut chars = text.chars();
        let ty = chars.next().ok_or(PacketError::Empty)?;
        let mut rest = chars.as_str();

        // Only the root namespace is spoken; packets for any other are
        // rejected so the caller can drop them.
        if rest.starts_with('/') {
            let (namespace, tail) = match rest.find(',') {
                Some(idx) => (&rest[..idx], &rest[idx + 1..]),
                None => (rest, ""),
            };
            if namespace != "/" {
                return Err(PacketError::OtherNamespace(namespace.to_string()));
            }
            rest = tail;
        }

        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        let ack_id = (digits > 0)
            .then(|| rest[..digits].parse::<u64>().ok())
            .flatten();
        let rest = &rest[digits..];

        let json = || -> Result<Option<Value>, PacketError> {
            Ok(if rest.is_empty() {
                None
            } else {
                Some(serde_json::from_str(rest)?)
            })
        };

        Ok(match ty {
            '0' => SocketPacket::Connect(json()?),
            '1' => SocketPacket::Disconnect,
            '2' => {
                let Some(Value::Array(mut items)) = json()? else {
                    return Err(PacketError::InvalidEvent(
                        "payload is not an array".to_string(),
                    ));
                };
                if items.is_empty() {
                    return Err(PacketError::InvalidEvent("missing event name".to_string()));
                }
                let Value::String(name) = items.remove(0) else {
                    return Err(PacketError::InvalidEvent(
                        "event name is not a string".to_string(),
                    ));
                };
                SocketPacket::Event { name, args: items }
            }
            '3' => {
                let id = ack_id
                    .ok_or_else(|| PacketError::InvalidEvent("ack without id".to_string()))?;
                let args = match json()? {
                    Some(Value::Array(items)) => items,
                    _ => vec![],
                };
                SocketPacket::Ack { id, args }
            }
            '4' => SocketPacket::ConnectError(json()?.unwrap_or(Value::Null)),
            '5' | '6' => return Err(PacketError::Unsupported("binary attachments")),
            c => return Err(PacketError::UnknownSocketType(c)),
        })
    }

    pub fn encode(&self) -> String {
        match self {
            SocketPacket::Connect(None) => "0".to_string(),
            SocketPacket::Connect(Some(auth)) => format!("0{auth}"),
            SocketPacket::Disconnect => "1".to_string(),
            SocketPacket::Event { name, args } => {
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(Value::String(name.clone()));
                items.extend(args.iter().cloned());
                format!("2{}", Value::Array(items))
            }
            SocketPacket::Ack { id, args } => format!("3{id}{}", Value::Array(args.clone())),
            SocketPacket::ConnectError(data) => format!("4{data}"),
        }
    }
}
