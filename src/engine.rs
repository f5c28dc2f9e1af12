//! Engine Module
//!
//! The correlation engine that drives the command queue and the frame
//! decoder against a transport.
//!
//! ## Responsibilities
//! - Write queued commands while the transport accepts them
//! - Stop writing when the transport is full, resume on drain
//! - Match every decoded reply to the oldest command on the wire
//! - Tear down on protocol errors, desync or transport failure
//! - Close only once every outstanding command has been answered
//!
//! ## Connection States
//! ```text
//!   Idle ──submit──► Active ──begin_close──► Draining ──queue idle──► Closed
//!     │                 │                        │
//!     └─────────────────┴──── fatal error ───────┴──────────────────► Failed
//! ```
//!
//! The engine is runtime-agnostic: transport events arrive as plain method
//! calls (`on_data`, `on_drain`, `on_error`, `on_close`) and writes leave
//! through the [`Transport`] trait. The tokio driver lives in
//! [`crate::network`].

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{broadcast, Notify};

use crate::config::Config;
use crate::error::{LiteDbError, Result};
use crate::protocol::{encode_command, Command, FrameDecoder, MAX_MESSAGE_SIZE};
use crate::queue::{CommandQueue, ReplyFuture, DEFAULT_MAX_QUEUE_LENGTH};

/// Capacity of the connection event channel
const EVENT_CHANNEL_CAPACITY: usize = 64;

// =============================================================================
// Transport Contract
// =============================================================================

/// Outcome of handing bytes to the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// Written or buffered; more writes are welcome
    Accepted,

    /// Buffered, but the transport wants no more until it drains
    Full,
}

/// Byte-stream sink the engine writes commands to
///
/// Inbound events are delivered by whoever owns the socket, by calling the
/// engine's `on_*` methods.
pub trait Transport {
    /// Queue `bytes` for the peer
    ///
    /// `Ok(WriteStatus::Full)` still takes ownership of the bytes. An `Err`
    /// is treated as a fatal transport failure.
    fn write(&mut self, bytes: Bytes) -> Result<WriteStatus>;

    /// Stop accepting writes and close the stream once buffered bytes flush
    fn close(&mut self);
}

// =============================================================================
// Connection State & Events
// =============================================================================

/// Lifecycle of one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Nothing submitted yet
    Idle,

    /// Sending and receiving
    Active,

    /// Close requested; waiting for outstanding replies
    Draining,

    /// Closed after draining (or by the peer with nothing outstanding)
    Closed,

    /// Torn down by a fatal error; every pending call was rejected
    Failed,
}

impl ConnectionState {
    /// No further commands will be accepted
    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectionState::Closed | ConnectionState::Failed)
    }
}

/// Connection-level notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Transport reported full; sending paused
    Backpressure,

    /// Transport drained; sending resumed
    Drain,

    /// Fatal error; the connection is unusable
    Error(String),

    /// Connection closed
    Closed { had_error: bool },
}

// =============================================================================
// Correlation Engine
// =============================================================================

/// Pipelined request/response correlation for one connection
///
/// ## Ordering
/// Replies carry no request id. The n-th frame decoded is the reply to the
/// n-th command written, so `dequeue_to_send` and `dequeue_reply` must both
/// run under the same `&mut self`. Callers share the engine behind a single
/// mutex per connection.
pub struct CorrelationEngine<T: Transport> {
    /// Outstanding commands
    queue: CommandQueue,

    /// Reassembles reply frames
    decoder: FrameDecoder,

    /// Outbound byte sink
    transport: T,

    /// Lifecycle state
    state: ConnectionState,

    /// Transport reported full; do not write until `on_drain`
    needs_drain: bool,

    /// Max command text size (bytes)
    max_message_size: usize,

    /// Woken whenever the queue may have become idle
    idle: Arc<Notify>,

    /// Connection event fan-out
    events: broadcast::Sender<ConnectionEvent>,

    /// Reason for entering `Failed`
    failure: Option<String>,
}

impl<T: Transport> CorrelationEngine<T> {
    /// Create an engine with default limits
    pub fn new(transport: T) -> Self {
        Self::with_limits(transport, DEFAULT_MAX_QUEUE_LENGTH, MAX_MESSAGE_SIZE)
    }

    /// Create an engine with limits taken from `config`
    pub fn with_config(transport: T, config: &Config) -> Self {
        Self::with_limits(transport, config.max_queue_length, config.max_message_size)
    }

    /// Create an engine with explicit queue and message size limits
    pub fn with_limits(transport: T, max_queue_length: usize, max_message_size: usize) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            queue: CommandQueue::new(max_queue_length),
            decoder: FrameDecoder::new(),
            transport,
            state: ConnectionState::Idle,
            needs_drain: false,
            max_message_size,
            idle: Arc::new(Notify::new()),
            events,
            failure: None,
        }
    }

    // =========================================================================
    // Send Path
    // =========================================================================

    /// Queue a command and start writing if the transport allows
    ///
    /// Never blocks. Admission failures (`MessageTooLarge`, `QueueFull`,
    /// `NotConnected`) are returned directly and change nothing. A transport
    /// failure during the write fails the connection; the returned future
    /// then resolves with `ConnectionFailed`.
    pub fn submit(&mut self, command: Command) -> Result<ReplyFuture> {
        match self.state {
            ConnectionState::Idle | ConnectionState::Active => {}
            ConnectionState::Draining | ConnectionState::Closed | ConnectionState::Failed => {
                return Err(LiteDbError::NotConnected);
            }
        }

        if command.len() > self.max_message_size {
            return Err(LiteDbError::MessageTooLarge {
                size: command.len(),
                max: self.max_message_size,
            });
        }

        let reply = self.queue.enqueue(command)?;
        if self.state == ConnectionState::Idle {
            self.transition(ConnectionState::Active);
        }

        self.pump();
        Ok(reply)
    }

    /// Write queued commands until the transport is full or the queue is empty
    fn pump(&mut self) {
        if self.needs_drain
            || !matches!(self.state, ConnectionState::Active | ConnectionState::Draining)
        {
            return;
        }

        while let Some(command) = self.queue.dequeue_to_send() {
            tracing::trace!("Writing command ({} bytes)", command.len());

            match self.transport.write(encode_command(&command)) {
                Ok(WriteStatus::Accepted) => {}
                Ok(WriteStatus::Full) => {
                    tracing::debug!(
                        "Transport full, pausing with {} commands unsent",
                        self.queue.waiting_to_be_sent_len()
                    );
                    self.needs_drain = true;
                    self.emit(ConnectionEvent::Backpressure);
                    break;
                }
                Err(e) => {
                    self.fail(&format!("write failed: {}", e));
                    return;
                }
            }
        }
    }

    /// Transport drained its buffer; resume sending
    pub fn on_drain(&mut self) {
        if self.needs_drain {
            tracing::debug!("Transport drained, resuming");
            self.needs_drain = false;
            self.emit(ConnectionEvent::Drain);
        }
        self.pump();
    }

    // =========================================================================
    // Receive Path
    // =========================================================================

    /// Feed received bytes and resolve every reply they complete
    ///
    /// A decode error or a reply with nobody waiting fails the connection;
    /// the error is also returned so the reader can stop.
    pub fn on_data(&mut self, data: &[u8]) -> Result<()> {
        if self.state.is_terminal() {
            tracing::trace!("Ignoring {} bytes received after {:?}", data.len(), self.state);
            return Ok(());
        }

        self.decoder.feed(data);

        loop {
            let frame = match self.decoder.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    self.fail(&e.to_string());
                    return Err(e);
                }
            };

            match self.queue.dequeue_reply() {
                Some(call) => {
                    tracing::trace!("Resolving reply {:?}", frame.tag());
                    call.resolve(frame);
                }
                None => {
                    let error = LiteDbError::Desync;
                    self.fail(&error.to_string());
                    return Err(error);
                }
            }
        }

        if self.queue.is_idle() {
            self.idle.notify_waiters();
            self.maybe_finish_close();
        }

        Ok(())
    }

    /// Transport reported an error
    pub fn on_error(&mut self, error: LiteDbError) {
        self.fail(&error.to_string());
    }

    /// Peer closed the stream
    pub fn on_close(&mut self) {
        if self.state.is_terminal() {
            return;
        }

        if self.queue.is_idle() {
            tracing::debug!("Connection closed by server");
            self.transport.close();
            self.transition(ConnectionState::Closed);
            self.emit(ConnectionEvent::Closed { had_error: false });
            self.idle.notify_waiters();
        } else {
            let reason = format!(
                "connection closed by server with {} commands outstanding",
                self.queue.len()
            );
            self.fail(&reason);
        }
    }

    // =========================================================================
    // Shutdown
    // =========================================================================

    /// Stop accepting commands and close once every reply has arrived
    ///
    /// Returns immediately; use the idle notifier to wait for completion.
    pub fn begin_close(&mut self) {
        match self.state {
            ConnectionState::Idle | ConnectionState::Active => {
                tracing::debug!("Draining {} outstanding commands", self.queue.len());
                self.transition(ConnectionState::Draining);
                self.maybe_finish_close();
            }
            ConnectionState::Draining | ConnectionState::Closed | ConnectionState::Failed => {}
        }
    }

    fn maybe_finish_close(&mut self) {
        if self.state == ConnectionState::Draining && self.queue.is_idle() {
            self.transport.close();
            self.transition(ConnectionState::Closed);
            self.emit(ConnectionEvent::Closed { had_error: false });
            self.idle.notify_waiters();
        }
    }

    /// Enter `Failed`: reject everything outstanding and close the transport
    fn fail(&mut self, reason: &str) {
        if self.state.is_terminal() {
            return;
        }

        let rejected = self.queue.fail_all(reason);
        tracing::error!("Connection failed ({} pending calls rejected): {}", rejected, reason);

        self.decoder.clear();
        self.transport.close();
        self.failure = Some(reason.to_string());
        self.transition(ConnectionState::Failed);
        self.emit(ConnectionEvent::Error(reason.to_string()));
        self.emit(ConnectionEvent::Closed { had_error: true });
        self.idle.notify_waiters();
    }

    fn transition(&mut self, next: ConnectionState) {
        tracing::debug!("Connection state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn emit(&self, event: ConnectionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// True iff no command is waiting to be sent or waiting for a reply
    pub fn is_idle(&self) -> bool {
        self.queue.is_idle()
    }

    /// Commands outstanding (unsent + awaiting reply)
    pub fn outstanding(&self) -> usize {
        self.queue.len()
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    /// Whether sending is paused waiting for `on_drain`
    pub fn needs_drain(&self) -> bool {
        self.needs_drain
    }

    /// Bytes received but not yet parsed into a frame
    pub fn buffered_bytes(&self) -> usize {
        self.decoder.len()
    }

    /// Why the connection failed, if it did
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Notifier woken when the queue may have become idle or the
    /// connection ended
    pub fn idle_notifier(&self) -> Arc<Notify> {
        Arc::clone(&self.idle)
    }

    /// Subscribe to connection events
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
