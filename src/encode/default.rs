//! Canonical binary encoding of reader field defaults.
//!
//! A reader field that the writer does not have is filled from its
//! default. The default is a JSON literal in the schema; it is encoded
//! once, at compile time, exactly as a conforming writer would have
//! written the value, and the bytes are embedded in the program to be
//! replayed on every decode.

use bytes::Bytes;
use serde_json::{Map, Number, Value};

use crate::encode::BinaryEncoder;
use crate::error::EncodeError;
use crate::schema::{AvroSchema, FixedSchema, NamedTypes, RecordSchema};

/// Encode a default literal under `schema`.
///
/// `names` resolves named references inside `schema`; it must be built
/// from the schema tree `schema` belongs to.
///
/// JSON encodes `bytes` and `fixed` values as strings whose code points
/// are byte values (ISO-8859-1). A union default is always written
/// against the union's first branch.
pub fn encode_default(
    schema: &AvroSchema,
    value: &Value,
    names: &NamedTypes<'_>,
) -> Result<Bytes, EncodeError> {
    let mut encoder = BinaryEncoder::new();
    encode_value(&mut encoder, schema, value, names, &mut Vec::new())?;
    Ok(encoder.finish())
}

fn mismatch(kind: &str, value: &Value) -> EncodeError {
    EncodeError::TypeMismatch(format!("Non-{} default value for {}: {}", kind, kind, value))
}

/// `expanding` holds the `record.field` defaults currently being encoded
/// because the literal left those fields out.
fn encode_value(
    e: &mut BinaryEncoder,
    schema: &AvroSchema,
    value: &Value,
    names: &NamedTypes<'_>,
    expanding: &mut Vec<String>,
) -> Result<(), EncodeError> {
    match schema {
        AvroSchema::Null => match value {
            Value::Null => e.write_null(),
            other => return Err(mismatch("null", other)),
        },
        AvroSchema::Boolean => match value {
            Value::Bool(b) => e.write_boolean(*b),
            other => return Err(mismatch("boolean", other)),
        },
        AvroSchema::Int => {
            let v = integer(value, "int")?;
            let v = i32::try_from(v).map_err(|_| EncodeError::OutOfRange {
                value: v.to_string(),
                kind: "int",
            })?;
            e.write_int(v);
        }
        AvroSchema::Long => e.write_long(integer(value, "long")?),
        AvroSchema::Float => e.write_float(floating(value, "float")? as f32),
        AvroSchema::Double => e.write_double(floating(value, "double")?),
        AvroSchema::String => match value {
            Value::String(s) => e.write_string(s),
            other => return Err(mismatch("string", other)),
        },
        AvroSchema::Bytes => e.write_bytes(&latin1(value, "bytes")?),
        AvroSchema::Fixed(fixed) => encode_fixed(e, fixed, value)?,
        AvroSchema::Enum(enum_schema) => {
            let Value::String(symbol) = value else {
                return Err(mismatch("enum", value));
            };
            let ordinal =
                enum_schema
                    .symbol_index(symbol)
                    .ok_or_else(|| EncodeError::UnknownSymbol {
                        name: enum_schema.fullname(),
                        symbol: symbol.clone(),
                    })?;
            e.write_enum(ordinal);
        }
        AvroSchema::Array(items) => {
            let Value::Array(elements) = value else {
                return Err(mismatch("array", value));
            };
            if !elements.is_empty() {
                e.write_item_count(elements.len());
                for element in elements {
                    encode_value(e, items, element, names, expanding)?;
                }
            }
            e.write_item_count(0);
        }
        AvroSchema::Map(values) => {
            let Value::Object(entries) = value else {
                return Err(mismatch("map", value));
            };
            if !entries.is_empty() {
                e.write_item_count(entries.len());
                for (key, entry) in entries {
                    e.write_string(key);
                    encode_value(e, values, entry, names, expanding)?;
                }
            }
            e.write_item_count(0);
        }
        AvroSchema::Union(branches) => {
            let first = branches
                .first()
                .ok_or_else(|| EncodeError::TypeMismatch("default for an empty union".into()))?;
            e.write_index(0);
            encode_value(e, first, value, names, expanding)?;
        }
        AvroSchema::Record(record) => {
            let Value::Object(object) = value else {
                return Err(mismatch("record", value));
            };
            encode_record(e, record, object, names, expanding)?;
        }
        AvroSchema::Named(name) => {
            let target = names
                .get(name)
                .ok_or_else(|| EncodeError::UnresolvedName(name.clone()))?;
            encode_value(e, target, value, names, expanding)?;
        }
        AvroSchema::Logical(logical) => encode_value(e, &logical.base, value, names, expanding)?,
    }
    Ok(())
}

/// Fields absent from the literal fall back to the field's own default.
/// A default that needs itself again while it is being encoded never
/// terminates and is rejected.
fn encode_record(
    e: &mut BinaryEncoder,
    record: &RecordSchema,
    object: &Map<String, Value>,
    names: &NamedTypes<'_>,
    expanding: &mut Vec<String>,
) -> Result<(), EncodeError> {
    for field in &record.fields {
        if let Some(field_value) = object.get(&field.name) {
            encode_value(e, &field.schema, field_value, names, expanding)?;
            continue;
        }
        let default = field
            .default
            .as_ref()
            .ok_or_else(|| EncodeError::MissingDefault(field.name.clone()))?;
        let key = format!("{}.{}", record.fullname(), field.name);
        if expanding.contains(&key) {
            return Err(EncodeError::RecursiveDefault(key));
        }
        expanding.push(key);
        encode_value(e, &field.schema, default, names, expanding)?;
        expanding.pop();
    }
    Ok(())
}

/// Zero-padded or truncated to the declared size.
fn encode_fixed(e: &mut BinaryEncoder, fixed: &FixedSchema, value: &Value) -> Result<(), EncodeError> {
    let mut bytes = latin1(value, "fixed")?;
    bytes.resize(fixed.size, 0);
    e.write_fixed(&bytes);
    Ok(())
}

fn numeric_mismatch(kind: &str, value: &Value) -> EncodeError {
    EncodeError::TypeMismatch(format!("Non-numeric default value for {}: {}", kind, value))
}

fn integer(value: &Value, kind: &'static str) -> Result<i64, EncodeError> {
    match value {
        Value::Number(n) => n.as_i64().ok_or_else(|| out_of_range_or_mismatch(n, kind, value)),
        other => Err(numeric_mismatch(kind, other)),
    }
}

/// Positive integers beyond `i64` are out of range; anything else
/// non-integral is a type mismatch.
fn out_of_range_or_mismatch(n: &Number, kind: &'static str, value: &Value) -> EncodeError {
    if n.is_u64() {
        EncodeError::OutOfRange {
            value: n.to_string(),
            kind,
        }
    } else {
        numeric_mismatch(kind, value)
    }
}

fn floating(value: &Value, kind: &'static str) -> Result<f64, EncodeError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| numeric_mismatch(kind, value)),
        other => Err(numeric_mismatch(kind, other)),
    }
}

fn latin1(value: &Value, kind: &str) -> Result<Vec<u8>, EncodeError> {
    let Value::String(s) = value else {
        return Err(mismatch(kind, value));
    };
    s.chars()
        .map(|c| {
            u8::try_from(u32::from(c)).map_err(|_| {
                EncodeError::TypeMismatch(format!(
                    "{} default contains a character outside ISO-8859-1: {:?}",
                    kind, c
                ))
            })
        })
        .collect()
}
