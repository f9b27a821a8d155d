//! Avro binary encoder for individual values.

use bytes::{BufMut, Bytes, BytesMut};

use crate::reader::varint::put_zigzag;

/// Writes Avro binary encoding into an in-memory buffer.
///
/// Arrays and maps are written as a single block: the item count, the
/// items, then the zero end marker. Empty collections write only the end
/// marker.
#[derive(Debug, Default)]
pub struct BinaryEncoder {
    buf: BytesMut,
}

impl BinaryEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn write_null(&mut self) {}

    #[inline]
    pub fn write_boolean(&mut self, value: bool) {
        self.buf.put_u8(u8::from(value));
    }

    #[inline]
    pub fn write_int(&mut self, value: i32) {
        put_zigzag(&mut self.buf, i64::from(value));
    }

    #[inline]
    pub fn write_long(&mut self, value: i64) {
        put_zigzag(&mut self.buf, value);
    }

    #[inline]
    pub fn write_float(&mut self, value: f32) {
        self.buf.put_f32_le(value);
    }

    #[inline]
    pub fn write_double(&mut self, value: f64) {
        self.buf.put_f64_le(value);
    }

    /// Length-prefixed bytes.
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.write_long(value.len() as i64);
        self.buf.put_slice(value);
    }

    /// Length-prefixed UTF-8.
    pub fn write_string(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
    }

    /// Raw bytes with no length prefix.
    pub fn write_fixed(&mut self, value: &[u8]) {
        self.buf.put_slice(value);
    }

    pub fn write_enum(&mut self, ordinal: usize) {
        self.write_long(ordinal as i64);
    }

    /// Union branch index.
    pub fn write_index(&mut self, index: usize) {
        self.write_long(index as i64);
    }

    /// Start of an array or map block. A zero count is the end marker.
    pub fn write_item_count(&mut self, count: usize) {
        self.write_long(count as i64);
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars() {
        let mut enc = BinaryEncoder::new();
        enc.write_null();
        enc.write_boolean(true);
        enc.write_int(-1);
        enc.write_long(64);
        assert_eq!(enc.finish().as_ref(), &[0x01, 0x01, 0x80, 0x01]);
    }

    #[test]
    fn test_floats_are_little_endian() {
        let mut enc = BinaryEncoder::new();
        enc.write_float(1.0);
        enc.write_double(1.0);
        let bytes = enc.finish();
        assert_eq!(&bytes[..4], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[4..], &1.0f64.to_le_bytes());
    }

    #[test]
    fn test_string_is_length_prefixed() {
        let mut enc = BinaryEncoder::new();
        enc.write_string("abc");
        assert_eq!(enc.len(), 4);
        assert_eq!(enc.finish().as_ref(), &[0x06, b'a', b'b', b'c']);
    }

    #[test]
    fn test_fixed_has_no_prefix() {
        let mut enc = BinaryEncoder::new();
        enc.write_fixed(&[1, 2]);
        assert_eq!(enc.finish().as_ref(), &[1, 2]);
    }
}
