//! Protocol Module
//!
//! Defines the LiteDB wire protocol as seen from the client.
//!
//! ## Request Format
//! ```text
//! ┌──────────┬─────────────────────────────┐
//! │ Len (4)  │   Command text (UTF-8)      │
//! └──────────┴─────────────────────────────┘
//! ```
//! No type tag: every request is a single command string.
//!
//! ## Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Tag (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Value Tags
//! - 0x00: NIL    - Len: 0, no payload
//! - 0x01: ERR    - Len: byte length, UTF-8 error text
//! - 0x02: STR    - Len: byte length, UTF-8 text
//! - 0x03: INT    - Len: 4, i32
//! - 0x04: FLOAT  - Len: 4, f32
//! - 0x05: ARRAY  - Len: element count, followed by that many non-array values
//!
//! All integers on the wire are little-endian.

mod command;
mod response;
mod codec;

pub use command::{encode_command, Command};
pub use response::{ResponseFrame, ValueTag};
pub use codec::{encode_response, FrameDecoder};

/// Header size: 1 byte tag + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Length prefix on outbound commands
pub const COMMAND_PREFIX_SIZE: usize = 4;

/// Maximum command string the server accepts (bytes)
pub const MAX_MESSAGE_SIZE: usize = 4096;

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 9255;

/// Default server host
pub const DEFAULT_SERVER_HOST: &str = "localhost";
