//! Response definitions
//!
//! Typed values decoded from server replies.

use crate::error::{LiteDbError, Result};

/// Value type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ValueTag {
    Nil = 0x00,
    Err = 0x01,
    Str = 0x02,
    Int = 0x03,
    Float = 0x04,
    Array = 0x05,
}

impl ValueTag {
    /// Parse a tag byte, `None` if the server sent an unknown type
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(ValueTag::Nil),
            0x01 => Some(ValueTag::Err),
            0x02 => Some(ValueTag::Str),
            0x03 => Some(ValueTag::Int),
            0x04 => Some(ValueTag::Float),
            0x05 => Some(ValueTag::Array),
            _ => None,
        }
    }
}

/// A single decoded reply
///
/// Array elements are never arrays themselves; the decoder rejects nested
/// arrays as a protocol error.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseFrame {
    Nil,

    /// Error reported by the server
    Err(String),

    Str(String),

    Int(i32),

    Float(f32),

    Array(Vec<ResponseFrame>),
}

impl ResponseFrame {
    /// Wire tag for this value
    pub fn tag(&self) -> ValueTag {
        match self {
            ResponseFrame::Nil => ValueTag::Nil,
            ResponseFrame::Err(_) => ValueTag::Err,
            ResponseFrame::Str(_) => ValueTag::Str,
            ResponseFrame::Int(_) => ValueTag::Int,
            ResponseFrame::Float(_) => ValueTag::Float,
            ResponseFrame::Array(_) => ValueTag::Array,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, ResponseFrame::Nil)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ResponseFrame::Err(_))
    }

    /// Turn a server `Err` frame into `LiteDbError::Server`
    ///
    /// The correlation engine always resolves with the raw frame; this is
    /// where a caller decides that an `Err` reply rejects the call.
    pub fn into_result(self) -> Result<ResponseFrame> {
        match self {
            ResponseFrame::Err(message) => Err(LiteDbError::Server(message)),
            other => Ok(other),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ResponseFrame::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            ResponseFrame::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            ResponseFrame::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ResponseFrame]> {
        match self {
            ResponseFrame::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Read a flat `[key1, value1, key2, value2, ...]` array as pairs
    ///
    /// A trailing key without a value is paired with `Nil`. Returns `None`
    /// if this is not an array.
    pub fn into_pairs(self) -> Option<Vec<(ResponseFrame, ResponseFrame)>> {
        let ResponseFrame::Array(items) = self else {
            return None;
        };

        let mut pairs = Vec::with_capacity((items.len() + 1) / 2);
        let mut iter = items.into_iter();
        while let Some(key) = iter.next() {
            let value = iter.next().unwrap_or(ResponseFrame::Nil);
            pairs.push((key, value));
        }
        Some(pairs)
    }
}

impl std::fmt::Display for ResponseFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseFrame::Nil => write!(f, "(nil)"),
            ResponseFrame::Err(message) => write!(f, "(error) {}", message),
            ResponseFrame::Str(s) => write!(f, "\"{}\"", s),
            ResponseFrame::Int(i) => write!(f, "(integer) {}", i),
            ResponseFrame::Float(v) => write!(f, "(float) {}", v),
            ResponseFrame::Array(items) => {
                if items.is_empty() {
                    return write!(f, "(empty array)");
                }
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) {}", i + 1, item)?;
                }
                Ok(())
            }
        }
    }
}
