//! TCP Transport
//!
//! Channel-backed [`Transport`] for the tokio driver. Writes go into an
//! unbounded channel drained by a dedicated writer task; a shared byte
//! counter stands in for the socket's send buffer fill level.
//!
//! ```text
//! engine.pump ─► TcpTransport::write ─► mpsc ─► writer task ─► socket
//!                      ▲                             │
//!                      └──────── on_drain ◄──────────┘ (buffer empty)
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::mpsc;

use crate::engine::{CorrelationEngine, Transport, WriteStatus};
use crate::error::{LiteDbError, Result};

/// Maximum chunks coalesced into one socket write
const MAX_BATCH_SIZE: usize = 64;

/// Transport handing bytes to the writer task
#[derive(Debug)]
pub struct TcpTransport {
    /// `None` once closed
    tx: Option<mpsc::UnboundedSender<Bytes>>,

    /// Bytes handed over but not yet written to the socket
    buffered: Arc<AtomicUsize>,

    /// Report `Full` at or above this many buffered bytes
    high_water_mark: usize,
}

impl TcpTransport {
    /// Create a transport and the receiving end for its writer task
    pub fn new(high_water_mark: usize) -> (Self, mpsc::UnboundedReceiver<Bytes>, Arc<AtomicUsize>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let buffered = Arc::new(AtomicUsize::new(0));
        let transport = Self {
            tx: Some(tx),
            buffered: Arc::clone(&buffered),
            high_water_mark,
        };
        (transport, rx, buffered)
    }

    /// Bytes waiting to be written
    pub fn buffered(&self) -> usize {
        self.buffered.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_none()
    }
}

impl Transport for TcpTransport {
    fn write(&mut self, bytes: Bytes) -> Result<WriteStatus> {
        let tx = self.tx.as_ref().ok_or(LiteDbError::ConnectionClosed)?;
        let len = bytes.len();

        let total = self.buffered.fetch_add(len, Ordering::AcqRel) + len;
        if tx.send(bytes).is_err() {
            self.buffered.fetch_sub(len, Ordering::AcqRel);
            return Err(LiteDbError::ConnectionClosed);
        }

        if total >= self.high_water_mark {
            Ok(WriteStatus::Full)
        } else {
            Ok(WriteStatus::Accepted)
        }
    }

    fn close(&mut self) {
        // Dropping the sender lets the writer flush what is queued and shut
        // down the write half.
        self.tx.take();
    }
}

/// Writer task: drain the channel into the socket
///
/// Signals `on_drain` each time the buffered count returns to zero and
/// reports write failures as transport errors.
pub(crate) async fn run_writer(
    mut writer: OwnedWriteHalf,
    mut rx: mpsc::UnboundedReceiver<Bytes>,
    buffered: Arc<AtomicUsize>,
    engine: Arc<Mutex<CorrelationEngine<TcpTransport>>>,
) {
    let mut batch = BytesMut::new();

    while let Some(first) = rx.recv().await {
        batch.clear();
        batch.extend_from_slice(&first);

        // Coalesce whatever else is already queued
        let mut chunks = 1;
        while chunks < MAX_BATCH_SIZE {
            match rx.try_recv() {
                Ok(chunk) => {
                    batch.extend_from_slice(&chunk);
                    chunks += 1;
                }
                Err(_) => break,
            }
        }

        if let Err(e) = writer.write_all(&batch).await {
            tracing::warn!("Socket write failed: {}", e);
            engine.lock().on_error(LiteDbError::Io(e));
            return;
        }

        let written = batch.len();
        let remaining = buffered.fetch_sub(written, Ordering::AcqRel) - written;
        tracing::trace!("Wrote {} bytes ({} chunks), {} still buffered", written, chunks, remaining);

        if remaining == 0 {
            engine.lock().on_drain();
        }
    }

    if let Err(e) = writer.shutdown().await {
        tracing::debug!("Write half shutdown failed: {}", e);
    }
    tracing::debug!("Writer task finished");
}
