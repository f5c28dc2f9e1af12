//! # LiteDB Client
//!
//! A pipelined async client for the LiteDB key-value store:
//! - Any number of commands in flight on one TCP connection
//! - Replies matched to callers in strict send order (no request ids)
//! - Incremental decoding of replies split or merged across reads
//! - Bounded admission and transport backpressure
//! - Graceful close that waits for every outstanding reply
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Client                                │
//! │              send(cmd) -> ReplyFuture                        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Correlation Engine                           │
//! │          (one Mutex per connection, FIFO pairing)            │
//! └──────────┬───────────────────────────────────┬──────────────┘
//!            │                                   │
//!            ▼                                   ▼
//!   ┌─────────────────┐                 ┌─────────────────┐
//!   │  Command Queue  │                 │  Frame Decoder  │
//!   │ (send / reply)  │                 │ (byte buffer)   │
//!   └────────┬────────┘                 └────────▲────────┘
//!            │ write                             │ data
//!            ▼                                   │
//!   ┌─────────────────────────────────────────────────────┐
//!   │            Transport (TCP writer / reader)          │
//!   └─────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod queue;
pub mod engine;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{LiteDbError, Result};
pub use config::Config;
pub use engine::{ConnectionEvent, ConnectionState, CorrelationEngine, Transport, WriteStatus};
pub use network::Client;
pub use protocol::{Command, ResponseFrame};
pub use queue::ReplyFuture;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the client
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
