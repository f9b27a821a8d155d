//! Binary encoding of default values.

mod default;
mod encoder;

pub use default::encode_default;
pub use encoder::BinaryEncoder;
