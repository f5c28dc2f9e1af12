//! Command Queue Module
//!
//! Admission control and FIFO pairing of outbound commands with replies.
//!
//! ## Responsibilities
//! - Bound the number of outstanding commands
//! - Hold commands until the transport can take them
//! - Remember, in send order, who is waiting for each reply
//!
//! ## Layout
//! ```text
//!  enqueue ──► [ waiting_to_be_sent ] ──dequeue_to_send──► [ waiting_for_reply ] ──dequeue_reply──►
//!              (command + pending call)      (command to wire)     (pending call only)
//! ```
//! The protocol has no request ids, so the position in `waiting_for_reply`
//! is the only thing tying a reply to its caller.

mod command_queue;
mod pending;

pub use command_queue::CommandQueue;
pub use pending::{PendingCall, ReplyFuture};

/// Default admission bound on outstanding commands
pub const DEFAULT_MAX_QUEUE_LENGTH: usize = 1024;
