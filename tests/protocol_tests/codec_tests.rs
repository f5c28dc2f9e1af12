//! Codec Tests
//!
//! Tests for incremental reply decoding.

use litedb::protocol::{encode_response, FrameDecoder, ValueTag, HEADER_SIZE};
use litedb::{LiteDbError, ResponseFrame};

/// Raw `tag + length + payload` bytes, written by hand
fn raw_value(tag: ValueTag, length: i32, payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![tag as u8];
    bytes.extend_from_slice(&length.to_le_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

fn decode_all(bytes: &[u8]) -> Vec<ResponseFrame> {
    let mut decoder = FrameDecoder::new();
    decoder.feed(bytes);
    let frames = decoder.drain_frames().unwrap();
    assert!(decoder.is_empty(), "trailing bytes left in decoder");
    frames
}

/// A stream covering every value type
fn mixed_stream() -> (Vec<u8>, Vec<ResponseFrame>) {
    let frames = vec![
        ResponseFrame::Nil,
        ResponseFrame::Err("error".to_string()),
        ResponseFrame::Str("hello".to_string()),
        ResponseFrame::Int(-42),
        ResponseFrame::Float(1.5),
        ResponseFrame::Array(vec![
            ResponseFrame::Int(123),
            ResponseFrame::Nil,
            ResponseFrame::Str("test".to_string()),
            ResponseFrame::Float(-0.25),
        ]),
        ResponseFrame::Array(vec![]),
        ResponseFrame::Str(String::new()),
        ResponseFrame::Str("héllo wörld".to_string()),
    ];

    let mut bytes = Vec::new();
    for frame in &frames {
        bytes.extend(encode_response(frame));
    }
    (bytes, frames)
}

// =============================================================================
// Scalar Value Tests
// =============================================================================

#[test]
fn test_decode_nil() {
    let bytes = raw_value(ValueTag::Nil, 0, &[]);
    let mut decoder = FrameDecoder::new();
    decoder.feed(&bytes);

    assert_eq!(decoder.next_frame().unwrap(), Some(ResponseFrame::Nil));
    assert_eq!(bytes.len(), HEADER_SIZE);
    assert!(decoder.is_empty());
}

#[test]
fn test_decode_error() {
    let bytes = raw_value(ValueTag::Err, 5, b"error");
    assert_eq!(decode_all(&bytes), vec![ResponseFrame::Err("error".to_string())]);
}

#[test]
fn test_decode_string() {
    let bytes = raw_value(ValueTag::Str, 5, b"hello");
    assert_eq!(decode_all(&bytes), vec![ResponseFrame::Str("hello".to_string())]);
}

#[test]
fn test_decode_int() {
    let bytes = raw_value(ValueTag::Int, 4, &123i32.to_le_bytes());
    assert_eq!(decode_all(&bytes), vec![ResponseFrame::Int(123)]);
}

#[test]
fn test_decode_negative_int() {
    let bytes = raw_value(ValueTag::Int, 4, &i32::MIN.to_le_bytes());
    assert_eq!(decode_all(&bytes), vec![ResponseFrame::Int(i32::MIN)]);
}

#[test]
fn test_decode_float() {
    let bytes = raw_value(ValueTag::Float, 4, &123.45f32.to_le_bytes());
    let frames = decode_all(&bytes);

    match frames.as_slice() {
        [ResponseFrame::Float(v)] => assert!((v - 123.45).abs() < 1e-4),
        other => panic!("Expected a single FLOAT, got {:?}", other),
    }
}

// =============================================================================
// Array Tests
// =============================================================================

#[test]
fn test_decode_array() {
    let mut bytes = raw_value(ValueTag::Array, 3, &[]);
    bytes.extend(raw_value(ValueTag::Int, 4, &123i32.to_le_bytes()));
    bytes.extend(raw_value(ValueTag::Int, 4, &124i32.to_le_bytes()));
    bytes.extend(raw_value(ValueTag::Str, 4, b"test"));
    assert_eq!(bytes.len(), 5 + 9 + 9 + 9);

    let mut decoder = FrameDecoder::new();
    decoder.feed(&bytes);

    assert_eq!(
        decoder.next_frame().unwrap(),
        Some(ResponseFrame::Array(vec![
            ResponseFrame::Int(123),
            ResponseFrame::Int(124),
            ResponseFrame::Str("test".to_string()),
        ]))
    );
    assert!(decoder.is_empty());
}

#[test]
fn test_array_followed_by_value() {
    let mut bytes = encode_response(&ResponseFrame::Array(vec![ResponseFrame::Nil]));
    bytes.extend(encode_response(&ResponseFrame::Int(9)));

    assert_eq!(
        decode_all(&bytes),
        vec![
            ResponseFrame::Array(vec![ResponseFrame::Nil]),
            ResponseFrame::Int(9),
        ]
    );
}

#[test]
fn test_nested_array_rejected() {
    let mut bytes = raw_value(ValueTag::Array, 1, &[]);
    bytes.extend(raw_value(ValueTag::Array, 0, &[]));

    let mut decoder = FrameDecoder::new();
    decoder.feed(&bytes);

    let err = decoder.next_frame().unwrap_err();
    assert!(matches!(err, LiteDbError::Protocol(_)));
    assert!(err.to_string().contains("nested array"));
}

#[test]
fn test_nested_array_rejected_after_valid_elements() {
    let bytes = encode_response(&ResponseFrame::Array(vec![
        ResponseFrame::Int(1),
        ResponseFrame::Array(vec![ResponseFrame::Int(2)]),
    ]));

    let mut decoder = FrameDecoder::new();
    decoder.feed(&bytes);

    assert!(matches!(decoder.next_frame(), Err(LiteDbError::Protocol(_))));
}

#[test]
fn test_partial_array_consumes_nothing() {
    let bytes = encode_response(&ResponseFrame::Array(vec![
        ResponseFrame::Str("one".to_string()),
        ResponseFrame::Str("two".to_string()),
    ]));

    let mut decoder = FrameDecoder::new();

    // Header + first element + part of the second
    let cut = HEADER_SIZE + 8 + 3;
    decoder.feed(&bytes[..cut]);
    assert_eq!(decoder.next_frame().unwrap(), None);
    assert_eq!(decoder.len(), cut);

    decoder.feed(&bytes[cut..]);
    assert_eq!(
        decoder.next_frame().unwrap(),
        Some(ResponseFrame::Array(vec![
            ResponseFrame::Str("one".to_string()),
            ResponseFrame::Str("two".to_string()),
        ]))
    );
}

// =============================================================================
// Streaming Tests
// =============================================================================

#[test]
fn test_two_values_in_one_chunk() {
    let mut bytes = raw_value(ValueTag::Int, 4, &123i32.to_le_bytes());
    bytes.extend(raw_value(ValueTag::Str, 5, b"hello"));

    let mut decoder = FrameDecoder::new();
    decoder.feed(&bytes);

    assert_eq!(decoder.next_frame().unwrap(), Some(ResponseFrame::Int(123)));
    assert_eq!(decoder.next_frame().unwrap(), Some(ResponseFrame::Str("hello".to_string())));
    assert_eq!(decoder.next_frame().unwrap(), None);
}

#[test]
fn test_header_then_payload() {
    let mut decoder = FrameDecoder::new();

    decoder.feed(&raw_value(ValueTag::Int, 4, &[]));
    assert_eq!(decoder.next_frame().unwrap(), None);
    assert_eq!(decoder.len(), HEADER_SIZE);

    decoder.feed(&77i32.to_le_bytes());
    assert_eq!(decoder.next_frame().unwrap(), Some(ResponseFrame::Int(77)));
    assert!(decoder.is_empty());
}

#[test]
fn test_empty_decoder_returns_none() {
    let mut decoder = FrameDecoder::new();
    assert_eq!(decoder.next_frame().unwrap(), None);
}

#[test]
fn test_single_split_point_invariance() {
    let (bytes, expected) = mixed_stream();

    for split in 0..=bytes.len() {
        let mut decoder = FrameDecoder::new();
        let mut frames = Vec::new();

        decoder.feed(&bytes[..split]);
        frames.extend(decoder.drain_frames().unwrap());
        decoder.feed(&bytes[split..]);
        frames.extend(decoder.drain_frames().unwrap());

        assert_eq!(frames, expected, "split at byte {}", split);
        assert!(decoder.is_empty());
    }
}

#[test]
fn test_byte_at_a_time() {
    let (bytes, expected) = mixed_stream();

    let mut decoder = FrameDecoder::new();
    let mut frames = Vec::new();
    for byte in &bytes {
        decoder.feed(std::slice::from_ref(byte));
        frames.extend(decoder.drain_frames().unwrap());
    }

    assert_eq!(frames, expected);
}

#[test]
fn test_varied_chunk_sizes() {
    let (bytes, expected) = mixed_stream();

    for chunk_size in [2, 3, 5, 7, 13, 64] {
        let mut decoder = FrameDecoder::new();
        let mut frames = Vec::new();
        for chunk in bytes.chunks(chunk_size) {
            decoder.feed(chunk);
            frames.extend(decoder.drain_frames().unwrap());
        }
        assert_eq!(frames, expected, "chunk size {}", chunk_size);
    }
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_unknown_tag() {
    let mut decoder = FrameDecoder::new();
    decoder.feed(&[0x09, 0x00, 0x00, 0x00, 0x00]);

    let err = decoder.next_frame().unwrap_err();
    assert!(err.to_string().contains("Unknown value type"));
    assert!(err.is_fatal());
}

#[test]
fn test_unknown_tag_detected_from_first_byte() {
    let mut decoder = FrameDecoder::new();
    decoder.feed(&[0xFF]);
    assert!(decoder.next_frame().is_err());
}

#[test]
fn test_unknown_tag_inside_array() {
    let mut bytes = raw_value(ValueTag::Array, 1, &[]);
    bytes.push(0x42);

    let mut decoder = FrameDecoder::new();
    decoder.feed(&bytes);
    assert!(matches!(decoder.next_frame(), Err(LiteDbError::Protocol(_))));
}

#[test]
fn test_invalid_utf8() {
    let bytes = raw_value(ValueTag::Str, 2, &[0xC3, 0x28]);

    let mut decoder = FrameDecoder::new();
    decoder.feed(&bytes);

    let err = decoder.next_frame().unwrap_err();
    assert!(err.to_string().contains("UTF-8"));
}

#[test]
fn test_float_with_wrong_length() {
    let bytes = raw_value(ValueTag::Float, 8, &1.0f64.to_le_bytes());

    let mut decoder = FrameDecoder::new();
    decoder.feed(&bytes);

    let err = decoder.next_frame().unwrap_err();
    assert!(matches!(err, LiteDbError::Protocol(_)));
    assert!(err.to_string().contains("length 8"));
}

#[test]
fn test_negative_array_count() {
    let bytes = raw_value(ValueTag::Array, -1, &[]);

    let mut decoder = FrameDecoder::new();
    decoder.feed(&bytes);

    let err = decoder.next_frame().unwrap_err();
    assert!(matches!(err, LiteDbError::Protocol(_)));
    assert!(err.to_string().contains("Negative length"));
}

#[test]
fn test_clear_discards_partial_frame() {
    let mut decoder = FrameDecoder::new();
    decoder.feed(&raw_value(ValueTag::Str, 10, b"abc"));
    assert_eq!(decoder.next_frame().unwrap(), None);

    decoder.clear();
    assert!(decoder.is_empty());

    decoder.feed(&encode_response(&ResponseFrame::Int(1)));
    assert_eq!(decoder.next_frame().unwrap(), Some(ResponseFrame::Int(1)));
}

// =============================================================================
// Wire Format Verification Tests
// =============================================================================

#[test]
fn test_wire_format_string() {
    let encoded = encode_response(&ResponseFrame::Str("hi".to_string()));

    // Expected: [0x02][0x02 0x00 0x00 0x00][h i]
    //           tag   length(2, LE)        payload
    assert_eq!(encoded[0], 0x02);
    assert_eq!(&encoded[1..5], &[0x02, 0x00, 0x00, 0x00]);
    assert_eq!(&encoded[5..7], b"hi");
}

#[test]
fn test_wire_format_array() {
    let encoded = encode_response(&ResponseFrame::Array(vec![ResponseFrame::Int(1)]));

    // Expected: [0x05][0x01 0x00 0x00 0x00][0x03][0x04 0x00 0x00 0x00][0x01 0x00 0x00 0x00]
    //           tag   count(1)             INT   length(4)            value
    assert_eq!(
        encoded,
        vec![0x05, 1, 0, 0, 0, 0x03, 4, 0, 0, 0, 1, 0, 0, 0]
    );
}
