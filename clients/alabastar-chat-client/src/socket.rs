//! Live WebSocket connection
//!
//! Owns at most one connection per login session. Inbound frames are
//! tagged JSON events dispatched through the [`ListenerRegistry`];
//! outbound events are fire-and-forget and silently dropped while
//! disconnected. An unexpected drop triggers bounded fixed-delay
//! reconnection; every fresh connection (initial or reconnect) is
//! surfaced as [`SocketEvent::Connected`] because room membership does
//! not survive a reconnect.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::Message as WsFrame;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use alabastar_chat_sdk::{ClientEvent, ServerEvent};

use crate::config::ChatConfig;
use crate::error::{ChatError, Result};
use crate::registry::{ListenerRegistry, SocketEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct SocketClient {
    socket_url: String,
    connect_timeout: Duration,
    reconnect_attempts: u32,
    reconnect_delay: Duration,
    registry: Arc<ListenerRegistry>,
    conn: Mutex<Option<Connection>>,
}

struct Connection {
    outbound: mpsc::UnboundedSender<WsFrame>,
    connected: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
}

impl SocketClient {
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            socket_url: config.socket_url.clone(),
            connect_timeout: config.connect_timeout,
            reconnect_attempts: config.reconnect_attempts,
            reconnect_delay: config.reconnect_delay,
            registry: Arc::new(ListenerRegistry::new()),
            conn: Mutex::new(None),
        }
    }

    pub fn registry(&self) -> &Arc<ListenerRegistry> {
        &self.registry
    }

    /// Forward all dispatched events into an owned channel. Convenient
    /// for driving a session from one consumer task.
    pub fn event_stream(&self) -> mpsc::UnboundedReceiver<SocketEvent> {
        use crate::registry::EventKind::*;

        let (tx, rx) = mpsc::unbounded_channel();
        for kind in [
            Connected,
            Disconnected,
            MessageNew,
            TypingStart,
            TypingStop,
            UserOnline,
            UserOffline,
        ] {
            let tx = tx.clone();
            self.registry.on(kind, move |event| {
                let _ = tx.send(event.clone());
            });
        }
        rx
    }

    /// Establish the live connection, tearing down any existing one
    /// first. Resolves once the handshake completes; fails if the server
    /// rejects the token or the bounded wait elapses.
    pub async fn connect(&self, session_token: &str) -> Result<()> {
        if session_token.is_empty() {
            return Err(ChatError::Connection("empty session token".to_string()));
        }
        self.disconnect();

        let url = Self::authenticated_url(&self.socket_url, session_token);
        let stream = Self::dial(&url, self.connect_timeout).await?;
        info!(url = %self.socket_url, "Live connection established");

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(true));
        let shutdown = Arc::new(AtomicBool::new(false));

        *self.conn.lock() = Some(Connection {
            outbound: outbound_tx,
            connected: Arc::clone(&connected),
            shutdown: Arc::clone(&shutdown),
        });

        let task = ConnectionTask {
            url,
            connect_timeout: self.connect_timeout,
            reconnect_attempts: self.reconnect_attempts,
            reconnect_delay: self.reconnect_delay,
            registry: Arc::clone(&self.registry),
            connected,
            shutdown,
            outbound_rx,
        };
        tokio::spawn(run_connection(task, stream));

        self.registry.dispatch(&SocketEvent::Connected);
        Ok(())
    }

    /// Tear down the active connection if any. Safe to call repeatedly.
    pub fn disconnect(&self) {
        if let Some(conn) = self.conn.lock().take() {
            conn.shutdown.store(true, Ordering::SeqCst);
            conn.connected.store(false, Ordering::SeqCst);
            // Dropping the sender wakes the connection task, which sends
            // a close frame and exits.
            drop(conn.outbound);
            debug!("Live connection torn down");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.conn
            .lock()
            .as_ref()
            .map(|c| c.connected.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// Fire-and-forget send. Dropped silently when not connected.
    pub fn emit(&self, event: &ClientEvent) {
        let guard = self.conn.lock();
        let Some(conn) = guard.as_ref() else {
            debug!("Dropping emit while disconnected");
            return;
        };
        if !conn.connected.load(Ordering::SeqCst) {
            debug!("Dropping emit while reconnecting");
            return;
        }
        match serde_json::to_string(event) {
            Ok(json) => {
                let _ = conn.outbound.send(WsFrame::Text(json));
            }
            Err(e) => warn!(error = %e, "Failed to encode outbound event"),
        }
    }

    fn authenticated_url(socket_url: &str, token: &str) -> String {
        let separator = if socket_url.contains('?') { '&' } else { '?' };
        format!("{socket_url}{separator}token={token}")
    }

    async fn dial(url: &str, connect_timeout: Duration) -> Result<WsStream> {
        match tokio::time::timeout(connect_timeout, connect_async(url)).await {
            Ok(Ok((stream, _response))) => Ok(stream),
            Ok(Err(e)) => Err(ChatError::Connection(e.to_string())),
            Err(_) => Err(ChatError::Connection(format!(
                "handshake timed out after {connect_timeout:?}"
            ))),
        }
    }
}

impl Drop for SocketClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

struct ConnectionTask {
    url: String,
    connect_timeout: Duration,
    reconnect_attempts: u32,
    reconnect_delay: Duration,
    registry: Arc<ListenerRegistry>,
    connected: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
    outbound_rx: mpsc::UnboundedReceiver<WsFrame>,
}

enum DriveExit {
    Shutdown,
    ConnectionLost,
}

async fn run_connection(mut task: ConnectionTask, mut stream: WsStream) {
    loop {
        match drive(stream, &mut task).await {
            DriveExit::Shutdown => return,
            DriveExit::ConnectionLost => {
                task.connected.store(false, Ordering::SeqCst);
                match reconnect(&task).await {
                    Some(fresh) => {
                        stream = fresh;
                        task.connected.store(true, Ordering::SeqCst);
                        info!("Live connection re-established");
                        // Room membership did not survive; listeners
                        // re-join on this event.
                        task.registry.dispatch(&SocketEvent::Connected);
                    }
                    None => {
                        if !task.shutdown.load(Ordering::SeqCst) {
                            warn!("Reconnection attempts exhausted");
                            task.registry.dispatch(&SocketEvent::Disconnected);
                        }
                        return;
                    }
                }
            }
        }
    }
}

/// Pump one established connection until it drops or the client shuts
/// down.
async fn drive(stream: WsStream, task: &mut ConnectionTask) -> DriveExit {
    let (mut sink, mut source) = stream.split();
    loop {
        tokio::select! {
            outbound = task.outbound_rx.recv() => {
                match outbound {
                    Some(frame) => {
                        if sink.send(frame).await.is_err() {
                            return DriveExit::ConnectionLost;
                        }
                    }
                    // Sender dropped: explicit disconnect.
                    None => {
                        let _ = sink.send(WsFrame::Close(None)).await;
                        return DriveExit::Shutdown;
                    }
                }
            }
            inbound = source.next() => {
                match inbound {
                    Some(Ok(WsFrame::Text(text))) => {
                        match serde_json::from_str::<ServerEvent>(&text) {
                            Ok(event) => task.registry.dispatch(&SocketEvent::Server(event)),
                            Err(e) => warn!(error = %e, "Unrecognized inbound frame"),
                        }
                    }
                    Some(Ok(WsFrame::Ping(payload))) => {
                        if sink.send(WsFrame::Pong(payload)).await.is_err() {
                            return DriveExit::ConnectionLost;
                        }
                    }
                    Some(Ok(WsFrame::Close(_))) | None => return DriveExit::ConnectionLost,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "Live connection error");
                        return DriveExit::ConnectionLost;
                    }
                }
            }
        }
    }
}

/// Bounded fixed-delay reconnection. Returns None when attempts are
/// exhausted or the client shut down meanwhile.
async fn reconnect(task: &ConnectionTask) -> Option<WsStream> {
    for attempt in 1..=task.reconnect_attempts {
        if task.shutdown.load(Ordering::SeqCst) {
            return None;
        }
        tokio::time::sleep(task.reconnect_delay).await;
        if task.shutdown.load(Ordering::SeqCst) {
            return None;
        }

        debug!(attempt, "Attempting reconnect");
        match SocketClient::dial(&task.url, task.connect_timeout).await {
            Ok(stream) => return Some(stream),
            Err(e) => warn!(attempt, error = %e, "Reconnect attempt failed"),
        }
    }
    None
}
