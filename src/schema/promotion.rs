//! Type promotions allowed by Avro schema resolution.
//!
//! Promotions only go from a narrower writer type to a wider reader type:
//! int→long, int|long→float, int|long|float→double, and string↔bytes.

use crate::error::DecodeError;
use crate::reader::AvroValue;
use crate::schema::SchemaKind;

/// Type promotions supported by Avro schema resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypePromotion {
    /// int → long
    IntToLong,
    /// int → float
    IntToFloat,
    /// int → double
    IntToDouble,
    /// long → float
    LongToFloat,
    /// long → double
    LongToDouble,
    /// float → double
    FloatToDouble,
    /// string → bytes
    StringToBytes,
    /// bytes → string
    BytesToString,
}

impl TypePromotion {
    /// The promotion that reads `writer` data as `reader`, if one exists.
    ///
    /// Identical kinds need no promotion and return `None`, as does every
    /// pair outside the promotion table.
    pub fn between(writer: SchemaKind, reader: SchemaKind) -> Option<Self> {
        use SchemaKind::*;
        match (writer, reader) {
            (Int, Long) => Some(TypePromotion::IntToLong),
            (Int, Float) => Some(TypePromotion::IntToFloat),
            (Int, Double) => Some(TypePromotion::IntToDouble),
            (Long, Float) => Some(TypePromotion::LongToFloat),
            (Long, Double) => Some(TypePromotion::LongToDouble),
            (Float, Double) => Some(TypePromotion::FloatToDouble),
            (String, Bytes) => Some(TypePromotion::StringToBytes),
            (Bytes, String) => Some(TypePromotion::BytesToString),
            _ => None,
        }
    }

    /// The writer type this promotion reads.
    pub fn source(self) -> SchemaKind {
        match self {
            TypePromotion::IntToLong | TypePromotion::IntToFloat | TypePromotion::IntToDouble => {
                SchemaKind::Int
            }
            TypePromotion::LongToFloat | TypePromotion::LongToDouble => SchemaKind::Long,
            TypePromotion::FloatToDouble => SchemaKind::Float,
            TypePromotion::StringToBytes => SchemaKind::String,
            TypePromotion::BytesToString => SchemaKind::Bytes,
        }
    }

    /// The reader type this promotion produces.
    pub fn target(self) -> SchemaKind {
        match self {
            TypePromotion::IntToLong => SchemaKind::Long,
            TypePromotion::IntToFloat | TypePromotion::LongToFloat => SchemaKind::Float,
            TypePromotion::IntToDouble
            | TypePromotion::LongToDouble
            | TypePromotion::FloatToDouble => SchemaKind::Double,
            TypePromotion::StringToBytes => SchemaKind::Bytes,
            TypePromotion::BytesToString => SchemaKind::String,
        }
    }
}

/// Apply a type promotion to a decoded writer value.
pub fn apply_promotion(value: AvroValue, promotion: TypePromotion) -> Result<AvroValue, DecodeError> {
    match (value, promotion) {
        (AvroValue::Int(v), TypePromotion::IntToLong) => Ok(AvroValue::Long(v as i64)),
        (AvroValue::Int(v), TypePromotion::IntToFloat) => Ok(AvroValue::Float(v as f32)),
        (AvroValue::Int(v), TypePromotion::IntToDouble) => Ok(AvroValue::Double(v as f64)),
        (AvroValue::Long(v), TypePromotion::LongToFloat) => Ok(AvroValue::Float(v as f32)),
        (AvroValue::Long(v), TypePromotion::LongToDouble) => Ok(AvroValue::Double(v as f64)),
        (AvroValue::Float(v), TypePromotion::FloatToDouble) => Ok(AvroValue::Double(v as f64)),
        (AvroValue::String(s), TypePromotion::StringToBytes) => Ok(AvroValue::Bytes(s.into_bytes())),
        (AvroValue::Bytes(b), TypePromotion::BytesToString) => {
            let s = String::from_utf8(b).map_err(|e| {
                DecodeError::InvalidData(format!("Cannot convert bytes to string: {}", e))
            })?;
            Ok(AvroValue::String(s))
        }
        (value, promotion) => Err(DecodeError::TypeMismatch(format!(
            "Cannot promote {:?} from {} to {}",
            value,
            promotion.source(),
            promotion.target()
        ))),
    }
}
