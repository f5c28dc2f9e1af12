//! Pending calls and reply futures
//!
//! Both halves of a caller's outstanding request, backed by a oneshot channel.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::error::{LiteDbError, Result};
use crate::protocol::ResponseFrame;

/// Completion side of an outstanding command
///
/// `resolve` and `reject` consume the call, so it completes at most once.
/// Dropping it unresolved makes the caller's future fail with
/// `ConnectionClosed`.
#[derive(Debug)]
pub struct PendingCall {
    tx: oneshot::Sender<Result<ResponseFrame>>,
}

impl PendingCall {
    /// Create a linked pending call and reply future
    pub fn channel() -> (PendingCall, ReplyFuture) {
        let (tx, rx) = oneshot::channel();
        (PendingCall { tx }, ReplyFuture { rx })
    }

    /// Deliver the decoded reply
    pub fn resolve(self, frame: ResponseFrame) {
        // The caller may have stopped waiting; the reply is still consumed.
        let _ = self.tx.send(Ok(frame));
    }

    /// Fail the call
    pub fn reject(self, error: LiteDbError) {
        let _ = self.tx.send(Err(error));
    }

    /// Whether the caller dropped its reply future
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Future returned to the caller for one command
///
/// Resolves with the server's reply frame (including `Err` frames), or with
/// an error if the connection failed before a reply arrived.
#[derive(Debug)]
pub struct ReplyFuture {
    rx: oneshot::Receiver<Result<ResponseFrame>>,
}

impl ReplyFuture {
    /// Non-blocking check for a completed reply
    ///
    /// Returns `None` while the reply is still outstanding.
    pub fn try_recv(&mut self) -> Option<Result<ResponseFrame>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(LiteDbError::ConnectionClosed)),
        }
    }
}

impl Future for ReplyFuture {
    type Output = Result<ResponseFrame>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(LiteDbError::ConnectionClosed)),
            Poll::Pending => Poll::Pending,
        }
    }
}
