//! WebSocket channel for native platforms.
//!
//! The socket lives on a background thread; frames cross over mpsc channels so
//! the session never blocks on the network.

use super::{Channel, SyncError, SyncResult};
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tungstenite::{Message, connect};
use url::Url;

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
    Error,
}

/// Characters of a frame shown in debug logs.
const LOG_PREVIEW_CHARS: usize = 100;

/// Commands sent to the WebSocket thread.
enum WsCommand {
    Send(String),
    Close,
}

/// Events from the WebSocket thread.
enum WsEvent {
    Opened,
    Text(String),
    Closed,
    Failed(String),
}

/// WebSocket client backed by tungstenite on a background thread.
pub struct WebSocketChannel {
    state: ConnectionState,
    inbound: Vec<String>,
    cmd_tx: Sender<WsCommand>,
    event_rx: Receiver<WsEvent>,
    thread: Option<JoinHandle<()>>,
}

impl WebSocketChannel {
    /// Start connecting to `url`. The channel opens asynchronously; poll it
    /// until [`Channel::is_open`] reports true.
    pub fn connect(url: &str) -> SyncResult<Self> {
        let parsed = Url::parse(url).map_err(|e| SyncError::Connect(format!("Invalid URL: {e}")))?;
        if parsed.scheme() != "ws" && parsed.scheme() != "wss" {
            return Err(SyncError::Connect(format!(
                "Invalid WebSocket URL scheme: {}",
                parsed.scheme()
            )));
        }

        let (cmd_tx, cmd_rx) = channel::<WsCommand>();
        let (event_tx, event_rx) = channel::<WsEvent>();
        let url = parsed.to_string();

        let handle = thread::Builder::new()
            .name("inkroom-ws".into())
            .spawn(move || run_socket(&url, &cmd_rx, &event_tx))
            .map_err(|e| SyncError::Connect(e.to_string()))?;

        Ok(Self {
            state: ConnectionState::Connecting,
            inbound: Vec::new(),
            cmd_tx,
            event_rx,
            thread: Some(handle),
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Pull pending events from the socket thread.
    fn pump(&mut self) {
        loop {
            match self.event_rx.try_recv() {
                Ok(WsEvent::Opened) => self.state = ConnectionState::Connected,
                Ok(WsEvent::Text(text)) => self.inbound.push(text),
                Ok(WsEvent::Closed) => self.state = ConnectionState::Disconnected,
                Ok(WsEvent::Failed(message)) => {
                    log::error!("WebSocket error: {}", message);
                    self.state = ConnectionState::Error;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.state == ConnectionState::Connected
                        || self.state == ConnectionState::Connecting
                    {
                        self.state = ConnectionState::Disconnected;
                    }
                    break;
                }
            }
        }
    }
}

impl Channel for WebSocketChannel {
    fn is_open(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    fn send(&mut self, frame: &str) -> SyncResult<()> {
        if !self.is_open() {
            return Err(SyncError::Closed);
        }
        self.cmd_tx
            .send(WsCommand::Send(frame.to_string()))
            .map_err(|e| SyncError::Send(e.to_string()))
    }

    fn poll(&mut self) -> Vec<String> {
        self.pump();
        std::mem::take(&mut self.inbound)
    }

    fn close(&mut self) {
        let _ = self.cmd_tx.send(WsCommand::Close);
        self.state = ConnectionState::Disconnected;
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                log::warn!("WebSocket thread panicked");
            }
        }
    }
}

impl Drop for WebSocketChannel {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.close();
        }
    }
}

/// Leading characters of `frame`, cut on a char boundary.
fn log_preview(frame: &str) -> &str {
    frame
        .char_indices()
        .nth(LOG_PREVIEW_CHARS)
        .map_or(frame, |(i, _)| &frame[..i])
}

fn run_socket(url: &str, cmd_rx: &Receiver<WsCommand>, event_tx: &Sender<WsEvent>) {
    log::info!("WebSocket thread: connecting to {}", url);
    let (mut socket, response) = match connect(url) {
        Ok(pair) => pair,
        Err(e) => {
            log::error!("WebSocket connect failed: {}", e);
            let _ = event_tx.send(WsEvent::Failed(e.to_string()));
            return;
        }
    };
    log::info!("WebSocket connected, status: {}", response.status());

    // Short read timeout keeps the loop responsive to outbound commands.
    match socket.get_mut() {
        tungstenite::stream::MaybeTlsStream::Plain(tcp) => {
            let _ = tcp.set_read_timeout(Some(Duration::from_millis(50)));
            let _ = tcp.set_write_timeout(Some(Duration::from_secs(5)));
        }
        #[allow(unreachable_patterns)]
        _ => log::debug!("TLS or other stream - using default timeout handling"),
    }
    let _ = event_tx.send(WsEvent::Opened);

    loop {
        match cmd_rx.try_recv() {
            Ok(WsCommand::Send(frame)) => {
                log::debug!("WebSocket sending: {}", log_preview(&frame));
                if let Err(e) = socket.send(Message::Text(frame)) {
                    log::error!("WebSocket send error: {}", e);
                    let _ = event_tx.send(WsEvent::Failed(e.to_string()));
                    break;
                }
            }
            Ok(WsCommand::Close) => {
                log::info!("WebSocket close requested");
                let _ = socket.close(None);
                let _ = socket.flush();
                break;
            }
            Err(TryRecvError::Disconnected) => {
                log::info!("WebSocket command channel disconnected");
                let _ = socket.close(None);
                break;
            }
            Err(TryRecvError::Empty) => {}
        }

        match socket.read() {
            Ok(Message::Text(text)) => {
                log::debug!("WebSocket received: {}", log_preview(&text));
                let _ = event_tx.send(WsEvent::Text(text));
            }
            Ok(Message::Ping(data)) => {
                let _ = socket.send(Message::Pong(data));
            }
            Ok(Message::Close(_)) => {
                log::info!("WebSocket received close frame");
                break;
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e))
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut => {}
            Err(e) => {
                log::error!("WebSocket read error: {}", e);
                let _ = event_tx.send(WsEvent::Failed(e.to_string()));
                break;
            }
        }
    }

    log::info!("WebSocket thread exiting");
    let _ = event_tx.send(WsEvent::Closed);
}
