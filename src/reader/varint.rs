//! Shared varint encoding and decoding utilities.
//!
//! Avro uses the same varint encoding as Protocol Buffers:
//! - Each byte has 7 bits of data and 1 continuation bit (MSB)
//! - The continuation bit indicates if more bytes follow
//! - Bytes are in little-endian order
//!
//! For signed integers, Avro uses zigzag encoding to map signed values to unsigned:
//! - 0 -> 0, -1 -> 1, 1 -> 2, -2 -> 3, 2 -> 4, ...
//! - Encoding formula: (n << 1) ^ (n >> 63)
//! - Decoding formula: (n >> 1) ^ -(n & 1)

use bytes::BufMut;

use crate::error::DecodeError;

/// Decode an unsigned variable-length integer.
///
/// # Errors
/// - `DecodeError::UnexpectedEof` if the input is truncated
/// - `DecodeError::InvalidVarint` if the varint exceeds 10 bytes
#[inline]
pub fn decode_varint(data: &mut &[u8]) -> Result<u64, DecodeError> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;

    loop {
        let (&byte, rest) = data.split_first().ok_or(DecodeError::UnexpectedEof)?;
        *data = rest;

        result |= ((byte & 0x7F) as u64) << shift;

        if byte & 0x80 == 0 {
            return Ok(result);
        }

        shift += 7;

        // max 10 bytes for a 64-bit varint
        if shift >= 64 {
            return Err(DecodeError::InvalidVarint);
        }
    }
}

/// Decode a signed (zigzag encoded) variable-length integer.
#[inline]
pub fn decode_zigzag(data: &mut &[u8]) -> Result<i64, DecodeError> {
    let unsigned = decode_varint(data)?;
    Ok(((unsigned >> 1) as i64) ^ (-((unsigned & 1) as i64)))
}

/// Append an unsigned varint to a buffer.
#[inline]
pub fn put_varint<B: BufMut>(buf: &mut B, mut value: u64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf.put_u8(byte);
            return;
        }
        buf.put_u8(byte | 0x80);
    }
}

/// Append a zigzag-encoded signed varint to a buffer.
#[inline]
pub fn put_zigzag<B: BufMut>(buf: &mut B, value: i64) {
    put_varint(buf, ((value << 1) ^ (value >> 63)) as u64);
}

/// Encode an unsigned integer as a variable-length integer.
pub fn encode_varint(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(10);
    put_varint(&mut out, value);
    out
}

/// Encode a signed integer as a zigzag-encoded variable-length integer.
pub fn encode_zigzag(value: i64) -> Vec<u8> {
    let mut out = Vec::with_capacity(10);
    put_zigzag(&mut out, value);
    out
}
