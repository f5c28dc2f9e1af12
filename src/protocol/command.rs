//! Command definitions
//!
//! A command is a single text line sent to the server, e.g. `set key value`.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use super::COMMAND_PREFIX_SIZE;

/// A command ready to be queued
///
/// Immutable once built. `len()` is the UTF-8 byte length of the text, which
/// is both the wire length prefix and the value checked against the
/// maximum message size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    text: String,
    length: usize,
}

impl Command {
    /// Build a command from its full text
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let length = text.len();
        Self { text, length }
    }

    /// Build a command from a verb and `key=value` options
    ///
    /// Each option is appended as ` key=value`, in the given order.
    pub fn with_options<K, V>(verb: &str, options: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: fmt::Display,
        V: fmt::Display,
    {
        let mut text = verb.to_string();
        for (key, value) in options {
            text.push_str(&format!(" {}={}", key, value));
        }
        Self::new(text)
    }

    /// Command text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte length of the command text
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for Command {
    fn from(text: &str) -> Self {
        Command::new(text)
    }
}

impl From<String> for Command {
    fn from(text: String) -> Self {
        Command::new(text)
    }
}

/// Encode a command to bytes
///
/// Format: length (4, i32 LE) + UTF-8 text. Callers check the size against
/// the configured maximum before encoding.
pub fn encode_command(command: &Command) -> Bytes {
    let mut message = BytesMut::with_capacity(COMMAND_PREFIX_SIZE + command.len());
    message.put_i32_le(command.len() as i32);
    message.put_slice(command.text().as_bytes());
    message.freeze()
}
