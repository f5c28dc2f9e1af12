//! Network Module
//!
//! Tokio driver for the correlation engine.
//!
//! ## Architecture
//! - One reader task feeding socket bytes into the engine
//! - One writer task draining the transport channel into the socket
//! - Callers submit through [`Client`] without blocking

mod client;
mod transport;

pub use client::Client;
pub use transport::TcpTransport;
