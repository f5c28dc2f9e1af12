//! Client Connection
//!
//! Owns one TCP connection and drives its correlation engine from tokio.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::AsyncReadExt;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::transport::{run_writer, TcpTransport};
use crate::config::Config;
use crate::engine::{ConnectionEvent, ConnectionState, CorrelationEngine};
use crate::error::{LiteDbError, Result};
use crate::protocol::{Command, ResponseFrame};
use crate::queue::ReplyFuture;

type SharedEngine = Arc<Mutex<CorrelationEngine<TcpTransport>>>;

/// Pipelined client for a single LiteDB connection
///
/// `send` never blocks: it queues the command and returns a future for the
/// reply. Any number of commands may be in flight; replies are matched in
/// send order.
///
/// ```ignore
/// let client = Client::connect(Config::default()).await?;
/// let a = client.send("get a")?;
/// let b = client.send("get b")?;
/// println!("{} {}", a.await?, b.await?);
/// client.close().await?;
/// ```
pub struct Client {
    /// Correlation engine, shared with the reader and writer tasks
    engine: SharedEngine,

    /// Socket reader task
    reader: Option<JoinHandle<()>>,

    /// Socket writer task
    writer: Option<JoinHandle<()>>,

    /// Peer address for logging
    peer_addr: String,
}

impl Client {
    /// Connect to the server described by `config`
    pub async fn connect(config: Config) -> Result<Self> {
        config.validate()?;
        let addr = config.addr();

        let stream = if config.connect_timeout_ms > 0 {
            let timeout = Duration::from_millis(config.connect_timeout_ms);
            tokio::time::timeout(timeout, TcpStream::connect(&addr))
                .await
                .map_err(|_| LiteDbError::ConnectTimeout(addr.clone()))??
        } else {
            TcpStream::connect(&addr).await?
        };

        Self::from_stream(stream, &config)
    }

    /// Drive an already-connected stream
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_stream(stream: TcpStream, config: &Config) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        if config.nodelay {
            stream.set_nodelay(true)?;
        }

        let (read_half, write_half) = stream.into_split();
        let (transport, rx, buffered) = TcpTransport::new(config.write_high_water_mark);
        let engine: SharedEngine = Arc::new(Mutex::new(CorrelationEngine::with_config(
            transport, config,
        )));

        let writer = tokio::spawn(run_writer(write_half, rx, buffered, Arc::clone(&engine)));
        let reader = tokio::spawn(run_reader(
            read_half,
            Arc::clone(&engine),
            config.read_buffer_size,
            peer_addr.clone(),
        ));

        tracing::debug!("Connected to {}", peer_addr);

        Ok(Self {
            engine,
            reader: Some(reader),
            writer: Some(writer),
            peer_addr,
        })
    }

    /// Queue a command and return the future for its reply
    ///
    /// Fails immediately (nothing sent) if the queue is full, the command is
    /// too large, or the connection is closing or closed. The future yields
    /// the raw reply frame, including server `Err` frames.
    pub fn send(&self, command: impl Into<Command>) -> Result<ReplyFuture> {
        self.engine.lock().submit(command.into())
    }

    /// Send a command and wait for its reply
    ///
    /// Server `Err` frames are returned as `LiteDbError::Server`.
    pub async fn call(&self, command: impl Into<Command>) -> Result<ResponseFrame> {
        let reply = self.send(command)?;
        reply.await?.into_result()
    }

    /// Wait until nothing is queued or awaiting a reply
    pub async fn wait_idle(&self) {
        let idle = self.engine.lock().idle_notifier();

        loop {
            let notified = idle.notified();
            tokio::pin!(notified);
            // Register before checking so a wakeup between the check and
            // the await is not lost
            notified.as_mut().enable();

            {
                let engine = self.engine.lock();
                if engine.is_idle() || engine.state().is_terminal() {
                    return;
                }
            }

            notified.await;
        }
    }

    /// Close gracefully: stop accepting commands, wait for every
    /// outstanding reply, then close the socket
    ///
    /// Returns `ConnectionFailed` if the connection failed instead.
    pub async fn close(mut self) -> Result<()> {
        tracing::debug!("Closing connection to {}", self.peer_addr);
        self.engine.lock().begin_close();
        self.wait_idle().await;

        // Writer exits once the transport drops its sender and the
        // remaining bytes are flushed
        if let Some(writer) = self.writer.take() {
            let _ = writer.await;
        }
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }

        let engine = self.engine.lock();
        match engine.state() {
            ConnectionState::Failed => Err(LiteDbError::ConnectionFailed(
                engine.failure().unwrap_or("unknown").to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.engine.lock().state()
    }

    /// Commands queued or awaiting a reply
    pub fn outstanding(&self) -> usize {
        self.engine.lock().outstanding()
    }

    /// Subscribe to connection events (backpressure, errors, close)
    pub fn events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.engine.lock().subscribe()
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        if let Some(writer) = self.writer.take() {
            writer.abort();
        }
    }
}

/// Reader task: feed socket bytes into the engine until EOF or failure
async fn run_reader(
    mut reader: OwnedReadHalf,
    engine: SharedEngine,
    read_buffer_size: usize,
    peer_addr: String,
) {
    let mut buf = vec![0u8; read_buffer_size];

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                tracing::debug!("Server {} closed the connection", peer_addr);
                engine.lock().on_close();
                return;
            }
            Ok(n) => {
                tracing::trace!("Received {} bytes from {}", n, peer_addr);
                if let Err(e) = engine.lock().on_data(&buf[..n]) {
                    tracing::warn!("Dropping connection to {}: {}", peer_addr, e);
                    return;
                }
            }
            Err(e) => {
                tracing::warn!("Error reading from {}: {}", peer_addr, e);
                engine.lock().on_error(LiteDbError::Io(e));
                return;
            }
        }
    }
}
