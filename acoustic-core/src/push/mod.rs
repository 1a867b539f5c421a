//! The push channel: one long-lived Socket.IO connection delivering
//! unsolicited status and library notifications.

pub mod packet;

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use acoustic_api::PlayerStatus;
use futures::{SinkExt as _, StreamExt as _};
use serde_json::Value;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_tungstenite::tungstenite::Message;

use packet::{EnginePacket, PacketError, SocketPacket};

pub const PLAYER_STATUS_UPDATE: &str = "player_status_update";
pub const LIBRARY_UPDATE: &str = "library_update";
pub const PLAYLIST_CHANGED: &str = "playlist_changed";

/// Something the push channel delivered.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    StatusChanged(PlayerStatus),
    /// The library changed; albums and tracks should be refetched.
    LibraryUpdated,
    /// A playlist changed; the payload is passed through untouched.
    PlaylistChanged(Value),
    Connected,
    Disconnected,
}
impl PushEvent {
    /// Interpret a Socket.IO event. Unknown events and malformed status
    /// payloads yield `None`.
    pub fn from_socket_event(name: &str, args: Vec<Value>) -> Option<Self> {
        match name {
            PLAYER_STATUS_UPDATE => {
                let payload = args.into_iter().next().unwrap_or(Value::Null);
                match serde_json::from_value(payload) {
                    Ok(status) => Some(PushEvent::StatusChanged(status)),
                    Err(e) => {
                        tracing::warn!("dropping malformed {PLAYER_STATUS_UPDATE} payload: {e}");
                        None
                    }
                }
            }
            LIBRARY_UPDATE => Some(PushEvent::LibraryUpdated),
            PLAYLIST_CHANGED => Some(PushEvent::PlaylistChanged(
                args.into_iter().next().unwrap_or(Value::Null),
            )),
            _ => {
                tracing::debug!("ignoring unknown push event `{name}`");
                None
            }
        }
    }
}

#[derive(Debug)]
pub enum PushError {
    WebSocket(tokio_tungstenite::tungstenite::Error),
    Packet(PacketError),
    Rejected(String),
    TimedOut,
}
impl std::fmt::Display for PushError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PushError::WebSocket(e) => write!(f, "WebSocket error: {e}"),
            PushError::Packet(e) => write!(f, "Protocol error: {e}"),
            PushError::Rejected(reason) => write!(f, "Server rejected connection: {reason}"),
            PushError::TimedOut => write!(f, "Server stopped responding"),
        }
    }
}
impl std::error::Error for PushError {}
impl From<tokio_tungstenite::tungstenite::Error> for PushError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        PushError::WebSocket(e)
    }
}
impl From<PacketError> for PushError {
    fn from(e: PacketError) -> Self {
        PushError::Packet(e)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PushConfig {
    /// The server root, e.g. `http://localhost:5000`.
    pub url: String,
    pub reconnect: bool,
    /// Consecutive failed attempts tolerated before giving up.
    pub reconnect_attempts: u32,
    pub reconnect_delay: Duration,
}
impl PushConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect: true,
            reconnect_attempts: 5,
            reconnect_delay: Duration::from_millis(1000),
        }
    }

    /// The WebSocket URL of the Socket.IO endpoint.
    pub fn endpoint(&self) -> String {
        let url = self.url.trim_end_matches('/');
        let url = if let Some(rest) = url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            url.to_string()
        };
        format!("{url}/socket.io/?EIO=4&transport=websocket")
    }
}

/// A handle to the (at most one) live push connection.
///
/// The connection runs as a task on the current tokio runtime and is torn
/// down when the handle is disconnected or dropped.
pub struct PushChannel {
    config: PushConfig,
    task: Mutex<Option<JoinHandle<()>>>,
    connected: Arc<AtomicBool>,
}
impl PushChannel {
    pub fn new(config: PushConfig) -> Self {
        Self {
            config,
            task: Mutex::new(None),
            connected: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &PushConfig {
        &self.config
    }

    /// Start delivering events to `events`. Returns `false` without doing
    /// anything if a connection is already live.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(&self, events: mpsc::UnboundedSender<PushEvent>) -> bool {
        let mut task = self.task.lock().unwrap();
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            tracing::debug!("push channel already connected");
            return false;
        }

        tracing::info!("opening push channel to {}", self.config.endpoint());
        *task = Some(tokio::spawn(run(
            self.config.clone(),
            events,
            self.connected.clone(),
        )));
        true
    }

    /// Drop the connection. Safe to call when already disconnected.
    pub fn disconnect(&self) {
        if let Some(task) = self.task.lock().unwrap().take() {
            task.abort();
            tracing::info!("push channel disconnected");
        }
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Whether the connection task is running, connected or retrying.
    pub fn is_active(&self) -> bool {
        self.task
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }

    /// Whether the Socket.IO handshake has completed on the live connection.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
impl Drop for PushChannel {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().ok().and_then(|t| t.take()) {
            task.abort();
        }
    }
}

/// Connect, and keep reconnecting with a fixed delay until the attempt
/// budget is spent or nobody is listening any more.
async fn run(
    config: PushConfig,
    events: mpsc::UnboundedSender<PushEvent>,
    connected: Arc<AtomicBool>,
) {
    let mut failures = 0;
    loop {
        let result = run_connection(&config, &events, &connected).await;
        let was_connected = connected.swap(false, Ordering::SeqCst);

        match &result {
            Ok(()) => tracing::info!("push connection closed"),
            Err(e) => tracing::warn!("push connection failed: {e}"),
        }
        if was_connected {
            failures = 0;
            if events.send(PushEvent::Disconnected).is_err() {
                return;
            }
        } else {
            failures += 1;
        }

        if events.is_closed() {
            return;
        }
        if !config.reconnect {
            tracing::info!("push reconnection disabled; giving up");
            return;
        }
        if failures >= config.reconnect_attempts {
            tracing::error!("push channel gave up after {failures} failed attempts");
            return;
        }

        tracing::info!(
            "reconnecting push channel in {:?} (attempt {})",
            config.reconnect_delay,
            failures + 1
        );
        tokio::time::sleep(config.reconnect_delay).await;
    }
}

async fn run_connection(
    config: &PushConfig,
    events: &mpsc::UnboundedSender<PushEvent>,
    connected: &AtomicBool,
) -> Result<(), PushError> {
    // Until the handshake says otherwise, assume Socket.IO's defaults.
    const DEFAULT_PING_WINDOW: Duration = Duration::from_millis(25_000 + 20_000);

    let (ws_stream, _) = tokio_tungstenite::connect_async(config.endpoint()).await?;
    let (mut ws_tx, mut ws_rx) = ws_stream.split();
    let mut ping_window = DEFAULT_PING_WINDOW;

    loop {
        let message = match tokio::time::timeout(ping_window, ws_rx.next()).await {
            Err(_) => return Err(PushError::TimedOut),
            Ok(None) => return Ok(()),
            Ok(Some(message)) => message?,
        };
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => return Ok(()),
            _ => continue,
        };

        let packet = match EnginePacket::decode(text.as_str()) {
            Ok(packet) => packet,
            Err(PacketError::OtherNamespace(namespace)) => {
                tracing::debug!("ignoring push packet for namespace `{namespace}`");
                continue;
            }
            Err(e) => {
                tracing::warn!("ignoring undecodable push packet: {e}");
                continue;
            }
        };

        match packet {
            EnginePacket::Open(handshake) => {
                tracing::debug!("engine.io session {}", handshake.sid);
                ping_window =
                    Duration::from_millis(handshake.ping_interval + handshake.ping_timeout);
                ws_tx
                    .send(Message::text(
                        EnginePacket::Message(SocketPacket::Connect(None)).encode(),
                    ))
                    .await?;
            }
            EnginePacket::Ping => {
                ws_tx.send(Message::text(EnginePacket::Pong.encode())).await?;
            }
            EnginePacket::Close | EnginePacket::Message(SocketPacket::Disconnect) => {
                return Ok(());
            }
            EnginePacket::Message(SocketPacket::Connect(_)) => {
                connected.store(true, Ordering::SeqCst);
                tracing::info!("push channel connected");
                if events.send(PushEvent::Connected).is_err() {
                    return Ok(());
                }
            }
            EnginePacket::Message(SocketPacket::ConnectError(data)) => {
                return Err(PushError::Rejected(data.to_string()));
            }
            EnginePacket::Message(SocketPacket::Event { name, args }) => {
                if let Some(event) = PushEvent::from_socket_event(&name, args)
                    && events.send(event).is_err()
                {
                    return Ok(());
                }
            }
            EnginePacket::Message(SocketPacket::Ack { .. })
            | EnginePacket::Pong
            | EnginePacket::Upgrade
            | EnginePacket::Noop => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{SinkExt as _, StreamExt as _};
    use serde_json::json;

    #[test]
    fn test_endpoint_uses_websocket_scheme() {
        assert_eq!(
            PushConfig::new("http://localhost:5000").endpoint(),
            "ws://localhost:5000/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(
            PushConfig::new("https://music.example.com/").endpoint(),
            "wss://music.example.com/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn test_status_event() {
        let event = PushEvent::from_socket_event(
            PLAYER_STATUS_UPDATE,
            vec![json!({
                "track": {"id": 1, "title": "T", "artist": "A", "path": "/t.mp3"},
                "is_playing": true
            })],
        );
        let Some(PushEvent::StatusChanged(status)) = event else {
            panic!("expected a status event, got {event:?}");
        };
        assert!(status.is_playing);
        assert_eq!(status.track_identity(), Some("1"));
    }

    #[test]
    fn test_malformed_status_event_is_dropped() {
        assert_eq!(
            PushEvent::from_socket_event(PLAYER_STATUS_UPDATE, vec![json!("garbage")]),
            None
        );
    }

    #[test]
    fn test_invalidation_events() {
        assert_eq!(
            PushEvent::from_socket_event(LIBRARY_UPDATE, vec![]),
            Some(PushEvent::LibraryUpdated)
        );
        assert_eq!(
            PushEvent::from_socket_event(
                PLAYLIST_CHANGED,
                vec![json!({"playlist_id": 3, "action": "track_added"})]
            ),
            Some(PushEvent::PlaylistChanged(
                json!({"playlist_id": 3, "action": "track_added"})
            ))
        );
        assert_eq!(PushEvent::from_socket_event("something_else", vec![]), None);
    }

    #[tokio::test]
    async fn test_connect_is_idempotent_and_disconnect_is_safe() {
        let channel = PushChannel::new(PushConfig {
            url: "http://127.0.0.1:9".to_string(),
            reconnect: true,
            reconnect_attempts: 1000,
            reconnect_delay: Duration::from_secs(60),
        });
        let (tx, _rx) = mpsc::unbounded_channel();

        assert!(channel.connect(tx.clone()));
        assert!(!channel.connect(tx.clone()));
        assert!(channel.is_active());

        channel.disconnect();
        assert!(!channel.is_active());
        assert!(!channel.is_connected());
        channel.disconnect();

        assert!(channel.connect(tx));
        channel.disconnect();
    }

    #[tokio::test]
    async fn test_gives_up_after_bounded_attempts() {
        let channel = PushChannel::new(PushConfig {
            url: "http://127.0.0.1:9".to_string(),
            reconnect: true,
            reconnect_attempts: 3,
            reconnect_delay: Duration::from_millis(10),
        });
        let (tx, mut rx) = mpsc::unbounded_channel();
        assert!(channel.connect(tx));

        tokio::time::timeout(Duration::from_secs(10), async {
            while channel.is_active() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        // Never connected, so nothing was delivered.
        assert!(rx.try_recv().is_err());
        assert!(!channel.is_connected());
    }

    type ServerStream = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

    async fn next_text(ws: &mut ServerStream) -> String {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return text.as_str().to_string(),
                Some(Ok(_)) => continue,
                other => panic!("client went away: {other:?}"),
            }
        }
    }

    /// Play one Socket.IO session against the client, recording its replies.
    async fn serve_session(
        stream: tokio::net::TcpStream,
        track_id: u64,
        replies: Arc<Mutex<Vec<String>>>,
    ) {
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.send(Message::text(
            r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#,
        ))
        .await
        .unwrap();
        let reply = next_text(&mut ws).await;
        replies.lock().unwrap().push(reply);

        ws.send(Message::text(r#"40{"sid":"def"}"#)).await.unwrap();
        ws.send(Message::text("2")).await.unwrap();
        let reply = next_text(&mut ws).await;
        replies.lock().unwrap().push(reply);

        ws.send(Message::text(format!(
            r#"42["player_status_update",{{"track":{{"id":{track_id},"path":"/{track_id}.mp3"}},"is_playing":true}}]"#
        )))
        .await
        .unwrap();
        ws.send(Message::text(r#"42["some_other_event",1]"#))
            .await
            .unwrap();
        ws.send(Message::text(r#"42/admin,["library_update"]"#))
            .await
            .unwrap();
        ws.send(Message::text("41/admin,")).await.unwrap();
        ws.send(Message::text(r#"42["library_update"]"#))
            .await
            .unwrap();
        ws.send(Message::text("41")).await.unwrap();

        // Hold the socket open until the client hangs up.
        while let Some(Ok(_)) = ws.next().await {}
    }

    fn label(event: &PushEvent) -> String {
        match event {
            PushEvent::StatusChanged(status) => {
                format!("status {}", status.track_identity().unwrap_or("-"))
            }
            PushEvent::LibraryUpdated => "library".to_string(),
            PushEvent::PlaylistChanged(_) => "playlist".to_string(),
            PushEvent::Connected => "connected".to_string(),
            PushEvent::Disconnected => "disconnected".to_string(),
        }
    }

    #[tokio::test]
    async fn test_live_sessions_and_failure_count_reset() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let replies = Arc::new(Mutex::new(Vec::new()));
        let failed_after_second_session = Arc::new(std::sync::atomic::AtomicUsize::new(0));

        let server = tokio::spawn({
            let replies = replies.clone();
            let failed_after_second_session = failed_after_second_session.clone();
            async move {
                let (stream, _) = listener.accept().await.unwrap();
                serve_session(stream, 1, replies.clone()).await;

                // A refused handshake counts as a failed attempt.
                let (stream, _) = listener.accept().await.unwrap();
                drop(stream);

                let (stream, _) = listener.accept().await.unwrap();
                serve_session(stream, 3, replies).await;

                loop {
                    let (stream, _) = listener.accept().await.unwrap();
                    failed_after_second_session.fetch_add(1, Ordering::SeqCst);
                    drop(stream);
                }
            }
        });

        let channel = PushChannel::new(PushConfig {
            url,
            reconnect: true,
            reconnect_attempts: 2,
            reconnect_delay: Duration::from_millis(10),
        });
        let (tx, mut rx) = mpsc::unbounded_channel();
        assert!(channel.connect(tx));

        tokio::time::timeout(Duration::from_secs(10), async {
            while channel.is_active() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        server.abort();

        let mut events = vec![];
        while let Ok(event) = rx.try_recv() {
            events.push(label(&event));
        }
        assert_eq!(
            events,
            vec![
                "connected",
                "status 1",
                "library",
                "disconnected",
                "connected",
                "status 3",
                "library",
                "disconnected",
            ]
        );
        assert_eq!(*replies.lock().unwrap(), vec!["40", "3", "40", "3"]);
        // The successful second session wiped the earlier failure, so the
        // full budget of two attempts was spent afterwards.
        assert_eq!(failed_after_second_session.load(Ordering::SeqCst), 2);
        assert!(!channel.is_connected());
    }
}
