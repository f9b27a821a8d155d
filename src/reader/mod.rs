//! Avro binary decoding
//!
//! This module provides the primitive binary decoders and the decoder that
//! runs a resolution program over writer-encoded bytes.

pub mod decode;
mod resolving;
pub mod varint;

pub use decode::{
    decode_block_count, decode_boolean, decode_bytes, decode_double, decode_fixed, decode_float,
    decode_int, decode_long, decode_string, decode_union_index, AvroValue,
};
pub use resolving::{ResolvingDecoder, MAX_ZERO_WIDTH_ITEMS};
pub use varint::{decode_varint, decode_zigzag, encode_varint, encode_zigzag};
