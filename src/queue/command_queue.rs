//! Command queue implementation
//!
//! Two ring buffers plus an admission bound. Not thread-safe on its own; the
//! correlation engine serializes access.

use std::collections::VecDeque;

use super::{PendingCall, ReplyFuture, DEFAULT_MAX_QUEUE_LENGTH};
use crate::error::{LiteDbError, Result};
use crate::protocol::Command;

/// A command that has not been written yet, with its caller
#[derive(Debug)]
struct QueuedCommand {
    command: Command,
    pending_call: PendingCall,
}

/// FIFO bookkeeping between commands sent and replies received
#[derive(Debug)]
pub struct CommandQueue {
    /// Commands accepted but not yet handed to the transport
    waiting_to_be_sent: VecDeque<QueuedCommand>,

    /// Callers whose command is on the wire, in send order
    waiting_for_reply: VecDeque<PendingCall>,

    /// Bound on `waiting_to_be_sent + waiting_for_reply`
    max_length: usize,
}

impl CommandQueue {
    /// Create a queue admitting at most `max_length` outstanding commands
    pub fn new(max_length: usize) -> Self {
        Self {
            waiting_to_be_sent: VecDeque::new(),
            waiting_for_reply: VecDeque::new(),
            max_length,
        }
    }

    /// Accept a command and return the future for its reply
    ///
    /// Fails with `QueueFull` and leaves the queue untouched when
    /// `max_length` commands are already outstanding.
    pub fn enqueue(&mut self, command: Command) -> Result<ReplyFuture> {
        if self.is_full() {
            return Err(LiteDbError::QueueFull {
                max_length: self.max_length,
            });
        }

        let (pending_call, reply) = PendingCall::channel();
        self.waiting_to_be_sent.push_back(QueuedCommand {
            command,
            pending_call,
        });
        Ok(reply)
    }

    /// Take the next command to write
    ///
    /// Its pending call moves to the tail of `waiting_for_reply` in the same
    /// step, so a command is never on the wire without a registered caller.
    pub fn dequeue_to_send(&mut self) -> Option<Command> {
        let QueuedCommand {
            command,
            pending_call,
        } = self.waiting_to_be_sent.pop_front()?;

        self.waiting_for_reply.push_back(pending_call);
        Some(command)
    }

    /// Take the caller owed the next reply
    pub fn dequeue_reply(&mut self) -> Option<PendingCall> {
        self.waiting_for_reply.pop_front()
    }

    /// True iff nothing is waiting to be sent or waiting for a reply
    pub fn is_idle(&self) -> bool {
        self.waiting_to_be_sent.is_empty() && self.waiting_for_reply.is_empty()
    }

    /// Reject every outstanding call and empty both sequences
    ///
    /// Calls already on the wire are rejected first, then unsent ones, so
    /// callers observe failures in enqueue order. Returns how many calls
    /// were rejected.
    pub fn fail_all(&mut self, reason: &str) -> usize {
        let count = self.len();

        for call in self.waiting_for_reply.drain(..) {
            call.reject(LiteDbError::ConnectionFailed(reason.to_string()));
        }
        for queued in self.waiting_to_be_sent.drain(..) {
            queued
                .pending_call
                .reject(LiteDbError::ConnectionFailed(reason.to_string()));
        }

        count
    }

    /// Total outstanding commands
    pub fn len(&self) -> usize {
        self.waiting_to_be_sent.len() + self.waiting_for_reply.len()
    }

    pub fn is_empty(&self) -> bool {
        self.is_idle()
    }

    /// Whether the next `enqueue` would be rejected
    pub fn is_full(&self) -> bool {
        self.len() >= self.max_length
    }

    pub fn waiting_to_be_sent_len(&self) -> usize {
        self.waiting_to_be_sent.len()
    }

    pub fn waiting_for_reply_len(&self) -> usize {
        self.waiting_for_reply.len()
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_QUEUE_LENGTH)
    }
}
