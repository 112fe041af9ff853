//! The transport session: one owned object per connection lifecycle.
//!
//! Socket IO runs on tokio tasks; everything else happens on the frame
//! loop thread. The reader task turns the TCP stream into newline-framed
//! text events, the writer task drains an outbound channel, and
//! [`Session::poll`] moves both into the single-threaded world: it updates
//! the connection flag, flushes messages queued while disconnected, and
//! dispatches decoded messages to subscribers.

use log::{debug, error, info, warn};
use std::collections::{HashMap, VecDeque};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use shared::{decode_server_message, encode_client_message, ClientMessage, MessageKind, ServerMessage};

/// Handler for one inbound message kind.
pub type MessageHandler = Box<dyn FnMut(&ServerMessage)>;
/// Handler for connection open/close transitions.
pub type ConnectionHandler = Box<dyn FnMut(bool)>;

/// Token returned by `subscribe`/`on_connection_change`; pass it to
/// [`Session::unsubscribe`] to deregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

/// Events crossing from the IO tasks to the frame loop.
#[derive(Debug)]
enum IoEvent {
    Opened,
    Closed,
    Line(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnState {
    Disconnected,
    Connecting,
    Connected,
}

/// One persistent bidirectional message connection.
///
/// `connect` opens at most one connection; `send` queues while the
/// connection is not open and flushes FIFO on establishment; closing (or
/// connection loss) clears queued-but-unsent messages.
pub struct Session {
    runtime: tokio::runtime::Handle,
    state: ConnState,
    io_rx: Option<mpsc::UnboundedReceiver<IoEvent>>,
    outbound_tx: Option<mpsc::UnboundedSender<String>>,
    pending: VecDeque<String>,
    io_task: Option<tokio::task::JoinHandle<()>>,
    subscribers: HashMap<MessageKind, Vec<(u64, MessageHandler)>>,
    connection_handlers: Vec<(u64, ConnectionHandler)>,
    next_subscription: u64,
}

impl Session {
    pub fn new(runtime: tokio::runtime::Handle) -> Self {
        Self {
            runtime,
            state: ConnState::Disconnected,
            io_rx: None,
            outbound_tx: None,
            pending: VecDeque::new(),
            io_task: None,
            subscribers: HashMap::new(),
            connection_handlers: Vec::new(),
            next_subscription: 1,
        }
    }

    /// Begins connecting. A no-op while a connection attempt is in flight
    /// or a connection is open.
    pub fn connect(&mut self, addr: &str) {
        if self.state != ConnState::Disconnected {
            return;
        }
        info!("connecting to {}", addr);

        let (io_tx, io_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        self.io_rx = Some(io_rx);
        self.outbound_tx = Some(out_tx);
        self.state = ConnState::Connecting;

        let addr = addr.to_string();
        self.io_task = Some(self.runtime.spawn(run_connection(addr, io_tx, out_rx)));
    }

    /// Tears down the connection, dropping queued-but-unsent messages.
    pub fn close(&mut self) {
        self.outbound_tx = None;
        self.pending.clear();
        if let Some(task) = self.io_task.take() {
            task.abort();
        }
        self.io_rx = None;
        let was_connected = self.state == ConnState::Connected;
        self.state = ConnState::Disconnected;
        if was_connected {
            self.notify_connection(false);
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnState::Connected
    }

    /// Serializes and sends a message, or queues it while no connection is
    /// open.
    pub fn send(&mut self, msg: &ClientMessage) {
        let text = match encode_client_message(msg) {
            Ok(text) => text,
            Err(e) => {
                error!("failed to encode outbound message: {}", e);
                return;
            }
        };
        if self.state == ConnState::Connected {
            if let Some(tx) = &self.outbound_tx {
                if tx.send(text.clone()).is_ok() {
                    return;
                }
            }
        }
        self.pending.push_back(text);
    }

    /// Registers a handler for one inbound message kind. All handlers for
    /// a kind run, in registration order.
    pub fn subscribe(&mut self, kind: MessageKind, handler: MessageHandler) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.subscribers.entry(kind).or_default().push((id, handler));
        SubscriptionId(id)
    }

    /// Registers a handler for open/close transitions.
    pub fn on_connection_change(&mut self, handler: ConnectionHandler) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.connection_handlers.push((id, handler));
        SubscriptionId(id)
    }

    pub fn unsubscribe(&mut self, subscription: SubscriptionId) {
        let SubscriptionId(id) = subscription;
        for handlers in self.subscribers.values_mut() {
            handlers.retain(|(handler_id, _)| *handler_id != id);
        }
        self.connection_handlers
            .retain(|(handler_id, _)| *handler_id != id);
    }

    /// Drains pending IO events and dispatches them. Returns the
    /// connection transitions observed, in order, so callers can run
    /// connection-driven state machines without re-subscribing.
    ///
    /// Malformed payloads are logged and dropped; unknown kinds are
    /// ignored. Neither disturbs previously applied state.
    pub fn poll(&mut self) -> Vec<bool> {
        let mut events = Vec::new();
        if let Some(rx) = self.io_rx.as_mut() {
            while let Ok(event) = rx.try_recv() {
                events.push(event);
            }
        }

        let mut transitions = Vec::new();
        for event in events {
            match event {
                IoEvent::Opened => {
                    self.state = ConnState::Connected;
                    info!("connection open");
                    self.flush_pending();
                    transitions.push(true);
                    self.notify_connection(true);
                }
                IoEvent::Closed => {
                    let was_connected = self.state == ConnState::Connected;
                    self.state = ConnState::Disconnected;
                    self.outbound_tx = None;
                    self.pending.clear();
                    if was_connected {
                        info!("connection closed");
                    } else {
                        warn!("connection attempt failed");
                    }
                    transitions.push(false);
                    self.notify_connection(false);
                }
                IoEvent::Line(line) => match decode_server_message(&line) {
                    Ok(Some(msg)) => self.dispatch(&msg),
                    Ok(None) => debug!("ignoring unknown message kind"),
                    Err(e) => warn!("dropping malformed message: {}", e),
                },
            }
        }
        transitions
    }

    fn flush_pending(&mut self) {
        if let Some(tx) = &self.outbound_tx {
            while let Some(text) = self.pending.pop_front() {
                if tx.send(text).is_err() {
                    break;
                }
            }
        }
    }

    fn dispatch(&mut self, msg: &ServerMessage) {
        if let Some(handlers) = self.subscribers.get_mut(&msg.kind()) {
            for (_, handler) in handlers.iter_mut() {
                handler(msg);
            }
        }
    }

    fn notify_connection(&mut self, connected: bool) {
        for (_, handler) in self.connection_handlers.iter_mut() {
            handler(connected);
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(task) = self.io_task.take() {
            task.abort();
        }
    }
}

/// Owns the socket for one connection's lifetime: connects, reports the
/// open, then pumps inbound lines out and outbound lines in until either
/// side goes away.
async fn run_connection(
    addr: String,
    events: mpsc::UnboundedSender<IoEvent>,
    mut outbound: mpsc::UnboundedReceiver<String>,
) {
    let stream = match TcpStream::connect(&addr).await {
        Ok(stream) => stream,
        Err(e) => {
            error!("connect to {} failed: {}", addr, e);
            let _ = events.send(IoEvent::Closed);
            return;
        }
    };
    if events.send(IoEvent::Opened).is_err() {
        return;
    }

    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if events.send(IoEvent::Line(line)).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    error!("read error: {}", e);
                    break;
                }
            },
            msg = outbound.recv() => match msg {
                Some(text) => {
                    if writer.write_all(text.as_bytes()).await.is_err() {
                        break;
                    }
                    if writer.write_all(b"\n").await.is_err() {
                        break;
                    }
                }
                // the session dropped its sender: close requested
                None => break,
            },
        }
    }

    let _ = events.send(IoEvent::Closed);
}
