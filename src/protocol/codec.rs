//! Protocol codec
//!
//! Incremental decoder for server replies, plus the matching encoder used
//! by tests and mock servers.
//!
//! ## Scalar Value
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Tag (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ## Array Value
//! ```text
//! ┌──────────┬──────────┬───────────┬───────────┬─────┐
//! │ 0x05 (1) │ Count(4) │ Value 1   │ Value 2   │ ... │
//! └──────────┴──────────┴───────────┴───────────┴─────┘
//! ```
//! Array elements are scalar values; nested arrays are a protocol error.

use bytes::{Buf, BufMut, BytesMut};

use super::{ResponseFrame, ValueTag, HEADER_SIZE};
use crate::error::{LiteDbError, Result};

/// Initial decoder buffer capacity
const DEFAULT_CAPACITY: usize = 8 * 1024;

/// Fixed payload size of INT and FLOAT values
const NUMERIC_SIZE: usize = 4;

// =============================================================================
// Decoder
// =============================================================================

/// Reassembles reply frames from arbitrarily chunked socket reads
///
/// The only state is the buffer of bytes not yet consumed. `feed` appends,
/// `next_frame` parses at most one top-level value from the front. A value
/// that is not fully buffered yet leaves the buffer untouched, so the same
/// bytes are parsed again from scratch on the next call.
///
/// ```ignore
/// let mut decoder = FrameDecoder::new();
/// decoder.feed(&chunk);
/// while let Some(frame) = decoder.next_frame()? {
///     handle(frame);
/// }
/// ```
#[derive(Debug)]
pub struct FrameDecoder {
    /// Bytes received but not yet consumed by a complete frame
    buffer: BytesMut,
}

impl FrameDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty decoder with a custom initial buffer capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Append received bytes. No parsing happens here.
    pub fn feed(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to parse one top-level frame from the front of the buffer
    ///
    /// Returns:
    /// - `Ok(Some(frame))` and consumes exactly the frame's bytes
    /// - `Ok(None)` if more data is needed (nothing consumed)
    /// - `Err(Protocol)` on an unknown tag, nested array or malformed
    ///   length; the stream is unsynchronized after this
    pub fn next_frame(&mut self) -> Result<Option<ResponseFrame>> {
        let Some(&tag_byte) = self.buffer.first() else {
            return Ok(None);
        };

        let parsed = match parse_tag(tag_byte)? {
            ValueTag::Array => parse_array(&self.buffer)?,
            tag => parse_scalar(&self.buffer, 0, tag)?,
        };

        match parsed {
            Some((frame, consumed)) => {
                self.buffer.advance(consumed);
                Ok(Some(frame))
            }
            None => Ok(None),
        }
    }

    /// Parse every complete frame currently buffered
    pub fn drain_frames(&mut self) -> Result<Vec<ResponseFrame>> {
        let mut frames = Vec::new();
        while let Some(frame) = self.next_frame()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    /// Number of buffered, unconsumed bytes
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop all buffered bytes
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_tag(byte: u8) -> Result<ValueTag> {
    ValueTag::from_byte(byte).ok_or_else(|| {
        LiteDbError::Protocol(format!("Unknown value type received from server: 0x{:02x}", byte))
    })
}

/// Read the signed little-endian length field of the value at `offset`
///
/// Caller guarantees `HEADER_SIZE` bytes are available from `offset`.
fn read_length(buf: &[u8], offset: usize) -> Result<usize> {
    let raw = i32::from_le_bytes([
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
        buf[offset + 4],
    ]);
    usize::try_from(raw)
        .map_err(|_| LiteDbError::Protocol(format!("Negative length field: {}", raw)))
}

/// Parse a non-array value starting at `offset`
///
/// Returns the value and the number of bytes it spans, or `None` if it is
/// not fully buffered.
fn parse_scalar(buf: &[u8], offset: usize, tag: ValueTag) -> Result<Option<(ResponseFrame, usize)>> {
    let remaining = buf.len() - offset;
    if remaining < HEADER_SIZE {
        return Ok(None);
    }

    // NIL carries no payload whatever the length field says
    if tag == ValueTag::Nil {
        return Ok(Some((ResponseFrame::Nil, HEADER_SIZE)));
    }

    let length = read_length(buf, offset)?;
    if matches!(tag, ValueTag::Int | ValueTag::Float) && length != NUMERIC_SIZE {
        return Err(LiteDbError::Protocol(format!(
            "{:?} value with length {} (expected {})",
            tag, length, NUMERIC_SIZE
        )));
    }

    let total = HEADER_SIZE + length;
    if remaining < total {
        return Ok(None);
    }

    let payload = &buf[offset + HEADER_SIZE..offset + total];
    let frame = match tag {
        ValueTag::Err => ResponseFrame::Err(decode_text(payload)?),
        ValueTag::Str => ResponseFrame::Str(decode_text(payload)?),
        ValueTag::Int => {
            ResponseFrame::Int(i32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]))
        }
        ValueTag::Float => {
            ResponseFrame::Float(f32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]))
        }
        ValueTag::Nil => ResponseFrame::Nil,
        ValueTag::Array => return Err(nested_array_error()),
    };

    Ok(Some((frame, total)))
}

/// Parse an array value at the front of the buffer
///
/// All-or-nothing: if any element is incomplete the whole array is reported
/// as incomplete and will be parsed again from the header next time.
fn parse_array(buf: &[u8]) -> Result<Option<(ResponseFrame, usize)>> {
    if buf.len() < HEADER_SIZE {
        return Ok(None);
    }

    let count = read_length(buf, 0)?;
    let mut elements = Vec::with_capacity(count.min(1024));
    let mut offset = HEADER_SIZE;

    for _ in 0..count {
        let Some(&tag_byte) = buf.get(offset) else {
            return Ok(None);
        };

        let tag = parse_tag(tag_byte)?;
        if tag == ValueTag::Array {
            return Err(nested_array_error());
        }

        match parse_scalar(buf, offset, tag)? {
            Some((element, span)) => {
                elements.push(element);
                offset += span;
            }
            None => return Ok(None),
        }
    }

    Ok(Some((ResponseFrame::Array(elements), offset)))
}

fn nested_array_error() -> LiteDbError {
    LiteDbError::Protocol("Server sent a nested array, which is not supported".to_string())
}

fn decode_text(payload: &[u8]) -> Result<String> {
    String::from_utf8(payload.to_vec())
        .map_err(|e| LiteDbError::Protocol(format!("Invalid UTF-8 in text value: {}", e)))
}

// =============================================================================
// Encoder
// =============================================================================

/// Encode a value to bytes the way the server writes it
///
/// Nested arrays are written as-is so tests can exercise the decoder's
/// rejection path.
pub fn encode_response(frame: &ResponseFrame) -> Vec<u8> {
    let mut message = BytesMut::with_capacity(HEADER_SIZE + 16);
    encode_into(frame, &mut message);
    message.to_vec()
}

fn encode_into(frame: &ResponseFrame, out: &mut BytesMut) {
    out.put_u8(frame.tag() as u8);
    match frame {
        ResponseFrame::Nil => out.put_i32_le(0),
        ResponseFrame::Err(text) | ResponseFrame::Str(text) => {
            out.put_i32_le(text.len() as i32);
            out.put_slice(text.as_bytes());
        }
        ResponseFrame::Int(value) => {
            out.put_i32_le(NUMERIC_SIZE as i32);
            out.put_i32_le(*value);
        }
        ResponseFrame::Float(value) => {
            out.put_i32_le(NUMERIC_SIZE as i32);
            out.put_f32_le(*value);
        }
        ResponseFrame::Array(elements) => {
            out.put_i32_le(elements.len() as i32);
            for element in elements {
                encode_into(element, out);
            }
        }
    }
}
