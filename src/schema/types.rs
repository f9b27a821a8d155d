//! Avro schema types and representations.
//!
//! This module defines the schema model consumed by the grammar compiler:
//! primitives, complex types, named references and logical annotations.

use std::fmt;

use serde_json::{json, Map, Value};

/// Represents an Avro schema.
///
/// Schemas form a tree; recursion is expressed with [`AvroSchema::Named`]
/// references back to a named type defined elsewhere in the same tree.
#[derive(Debug, Clone, PartialEq)]
pub enum AvroSchema {
    // Primitive types
    /// Null type - no value.
    Null,
    /// Boolean type.
    Boolean,
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    Long,
    /// 32-bit IEEE 754 floating-point.
    Float,
    /// 64-bit IEEE 754 floating-point.
    Double,
    /// Sequence of bytes.
    Bytes,
    /// Unicode string.
    String,

    // Complex types
    /// Record type with named fields.
    Record(RecordSchema),
    /// Enumeration type.
    Enum(EnumSchema),
    /// Array of items with a single schema.
    Array(Box<AvroSchema>),
    /// Map with string keys and values of a single schema.
    Map(Box<AvroSchema>),
    /// Union of multiple schemas.
    Union(Vec<AvroSchema>),
    /// Fixed-size byte array.
    Fixed(FixedSchema),

    /// Reference to a named type by its full name.
    Named(String),

    /// Logical type wrapper. Resolution treats it as its base type.
    Logical(LogicalType),
}

/// The type tag of a concrete schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Record,
    Enum,
    Array,
    Map,
    Union,
    Fixed,
}

impl SchemaKind {
    /// The Avro type name for this kind.
    pub fn name(self) -> &'static str {
        match self {
            SchemaKind::Null => "null",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Int => "int",
            SchemaKind::Long => "long",
            SchemaKind::Float => "float",
            SchemaKind::Double => "double",
            SchemaKind::Bytes => "bytes",
            SchemaKind::String => "string",
            SchemaKind::Record => "record",
            SchemaKind::Enum => "enum",
            SchemaKind::Array => "array",
            SchemaKind::Map => "map",
            SchemaKind::Union => "union",
            SchemaKind::Fixed => "fixed",
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Join an optional namespace and a name.
fn qualify(namespace: &Option<String>, name: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{}.{}", ns, name),
        _ => name.to_string(),
    }
}

/// Schema for a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    /// The name of the record.
    pub name: String,
    /// Optional namespace for the record.
    pub namespace: Option<String>,
    /// The fields of the record.
    pub fields: Vec<FieldSchema>,
    /// Aliases for this record.
    pub aliases: Vec<String>,
}

impl RecordSchema {
    /// Create a new RecordSchema with the given name and fields.
    pub fn new(name: impl Into<String>, fields: Vec<FieldSchema>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            fields,
            aliases: Vec::new(),
        }
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Get the fully qualified name.
    pub fn fullname(&self) -> String {
        qualify(&self.namespace, &self.name)
    }

    /// Find a field by exact name.
    pub fn field(&self, name: &str) -> Option<(usize, &FieldSchema)> {
        self.fields.iter().enumerate().find(|(_, f)| f.name == name)
    }

    fn to_json_value(&self) -> Value {
        let mut obj = named_json("record", &self.name, &self.namespace, &self.aliases);
        let fields: Vec<Value> = self.fields.iter().map(FieldSchema::to_json_value).collect();
        obj.insert("fields".to_string(), Value::Array(fields));
        Value::Object(obj)
    }
}

/// Schema for a field within a record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    /// The name of the field.
    pub name: String,
    /// The schema of the field's value.
    pub schema: AvroSchema,
    /// Optional default value, as the JSON literal from the schema.
    pub default: Option<Value>,
    /// Aliases for this field.
    pub aliases: Vec<String>,
}

impl FieldSchema {
    /// Create a new FieldSchema with the given name and schema.
    pub fn new(name: impl Into<String>, schema: AvroSchema) -> Self {
        Self {
            name: name.into(),
            schema,
            default: None,
            aliases: Vec::new(),
        }
    }

    /// Set the default value.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Add an alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    fn to_json_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("name".to_string(), json!(&self.name));
        obj.insert("type".to_string(), self.schema.to_json_value());
        if let Some(default) = &self.default {
            obj.insert("default".to_string(), default.clone());
        }
        if !self.aliases.is_empty() {
            obj.insert("aliases".to_string(), json!(&self.aliases));
        }
        Value::Object(obj)
    }
}

/// Schema for an enumeration type.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumSchema {
    /// The name of the enum.
    pub name: String,
    /// Optional namespace for the enum.
    pub namespace: Option<String>,
    /// The symbols of the enum, in ordinal order.
    pub symbols: Vec<String>,
    /// Aliases for this enum.
    pub aliases: Vec<String>,
    /// Default symbol used when a writer symbol is unknown to the reader.
    pub default: Option<String>,
}

impl EnumSchema {
    /// Create a new EnumSchema with the given name and symbols.
    pub fn new(name: impl Into<String>, symbols: Vec<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            symbols,
            aliases: Vec::new(),
            default: None,
        }
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the default symbol.
    pub fn with_default(mut self, symbol: impl Into<String>) -> Self {
        self.default = Some(symbol.into());
        self
    }

    /// Get the fully qualified name.
    pub fn fullname(&self) -> String {
        qualify(&self.namespace, &self.name)
    }

    /// Get the index of a symbol.
    pub fn symbol_index(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    fn to_json_value(&self) -> Value {
        let mut obj = named_json("enum", &self.name, &self.namespace, &self.aliases);
        obj.insert("symbols".to_string(), json!(&self.symbols));
        if let Some(default) = &self.default {
            obj.insert("default".to_string(), json!(default));
        }
        Value::Object(obj)
    }
}

/// Schema for a fixed-size byte array.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedSchema {
    /// The name of the fixed type.
    pub name: String,
    /// Optional namespace for the fixed type.
    pub namespace: Option<String>,
    /// The size in bytes.
    pub size: usize,
    /// Aliases for this fixed type.
    pub aliases: Vec<String>,
}

impl FixedSchema {
    /// Create a new FixedSchema with the given name and size.
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            size,
            aliases: Vec::new(),
        }
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Get the fully qualified name.
    pub fn fullname(&self) -> String {
        qualify(&self.namespace, &self.name)
    }

    fn to_json_value(&self) -> Value {
        let mut obj = named_json("fixed", &self.name, &self.namespace, &self.aliases);
        obj.insert("size".to_string(), json!(self.size));
        Value::Object(obj)
    }
}

fn named_json(
    kind: &str,
    name: &str,
    namespace: &Option<String>,
    aliases: &[String],
) -> Map<String, Value> {
    let mut obj = Map::new();
    obj.insert("type".to_string(), json!(kind));
    obj.insert("name".to_string(), json!(name));
    if let Some(ns) = namespace {
        obj.insert("namespace".to_string(), json!(ns));
    }
    if !aliases.is_empty() {
        obj.insert("aliases".to_string(), json!(aliases));
    }
    obj
}

/// Logical type wrapper around a base schema.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalType {
    /// The underlying Avro schema.
    pub base: Box<AvroSchema>,
    /// The logical type name and parameters.
    pub logical_type: LogicalTypeName,
}

impl LogicalType {
    /// Create a new LogicalType.
    pub fn new(base: AvroSchema, logical_type: LogicalTypeName) -> Self {
        Self {
            base: Box::new(base),
            logical_type,
        }
    }
}

/// Logical type names with their parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalTypeName {
    /// Decimal with precision and scale.
    Decimal { precision: u32, scale: u32 },
    /// UUID (string or fixed[16]).
    Uuid,
    /// Date (days since Unix epoch).
    Date,
    /// Time in milliseconds.
    TimeMillis,
    /// Time in microseconds.
    TimeMicros,
    /// Timestamp in milliseconds since Unix epoch.
    TimestampMillis,
    /// Timestamp in microseconds since Unix epoch.
    TimestampMicros,
    /// Duration (months, days, milliseconds).
    Duration,
}

impl LogicalTypeName {
    /// Get the string name of the logical type.
    pub fn name(&self) -> &'static str {
        match self {
            LogicalTypeName::Decimal { .. } => "decimal",
            LogicalTypeName::Uuid => "uuid",
            LogicalTypeName::Date => "date",
            LogicalTypeName::TimeMillis => "time-millis",
            LogicalTypeName::TimeMicros => "time-micros",
            LogicalTypeName::TimestampMillis => "timestamp-millis",
            LogicalTypeName::TimestampMicros => "timestamp-micros",
            LogicalTypeName::Duration => "duration",
        }
    }
}

impl AvroSchema {
    /// The type tag of this schema, or `None` for references and logical
    /// wrappers that must be looked through first.
    pub fn kind(&self) -> Option<SchemaKind> {
        Some(match self {
            AvroSchema::Null => SchemaKind::Null,
            AvroSchema::Boolean => SchemaKind::Boolean,
            AvroSchema::Int => SchemaKind::Int,
            AvroSchema::Long => SchemaKind::Long,
            AvroSchema::Float => SchemaKind::Float,
            AvroSchema::Double => SchemaKind::Double,
            AvroSchema::Bytes => SchemaKind::Bytes,
            AvroSchema::String => SchemaKind::String,
            AvroSchema::Record(_) => SchemaKind::Record,
            AvroSchema::Enum(_) => SchemaKind::Enum,
            AvroSchema::Array(_) => SchemaKind::Array,
            AvroSchema::Map(_) => SchemaKind::Map,
            AvroSchema::Union(_) => SchemaKind::Union,
            AvroSchema::Fixed(_) => SchemaKind::Fixed,
            AvroSchema::Named(_) | AvroSchema::Logical(_) => return None,
        })
    }

    /// Check if this schema is a primitive type.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            AvroSchema::Null
                | AvroSchema::Boolean
                | AvroSchema::Int
                | AvroSchema::Long
                | AvroSchema::Float
                | AvroSchema::Double
                | AvroSchema::Bytes
                | AvroSchema::String
        )
    }

    /// Get the short name of a named type, if applicable.
    pub fn name(&self) -> Option<&str> {
        match self {
            AvroSchema::Record(r) => Some(&r.name),
            AvroSchema::Enum(e) => Some(&e.name),
            AvroSchema::Fixed(f) => Some(&f.name),
            AvroSchema::Named(n) => Some(n.rsplit('.').next().unwrap_or(n)),
            AvroSchema::Logical(l) => l.base.name(),
            _ => None,
        }
    }

    /// Get the fully qualified name of a named type, if applicable.
    pub fn fullname(&self) -> Option<String> {
        match self {
            AvroSchema::Record(r) => Some(r.fullname()),
            AvroSchema::Enum(e) => Some(e.fullname()),
            AvroSchema::Fixed(f) => Some(f.fullname()),
            AvroSchema::Named(n) => Some(n.clone()),
            AvroSchema::Logical(l) => l.base.fullname(),
            _ => None,
        }
    }

    /// The name used in diagnostics: the full name for named types and the
    /// Avro type name for everything else.
    pub fn type_name(&self) -> String {
        match self {
            AvroSchema::Logical(l) => l.base.type_name(),
            other => match other.fullname() {
                Some(name) => name,
                None => other.kind().map(SchemaKind::name).unwrap_or("unknown").to_string(),
            },
        }
    }

    /// Serialize the schema to a JSON string.
    ///
    /// # Example
    /// ```
    /// use avro_grammar::schema::AvroSchema;
    ///
    /// let schema = AvroSchema::Array(Box::new(AvroSchema::Int));
    /// assert_eq!(schema.to_json(), r#"{"items":"int","type":"array"}"#);
    /// ```
    pub fn to_json(&self) -> String {
        self.to_json_value().to_string()
    }

    /// Serialize the schema to a JSON Value, defaults included.
    pub fn to_json_value(&self) -> Value {
        match self {
            AvroSchema::Record(r) => r.to_json_value(),
            AvroSchema::Enum(e) => e.to_json_value(),
            AvroSchema::Fixed(f) => f.to_json_value(),
            AvroSchema::Array(items) => json!({ "type": "array", "items": items.to_json_value() }),
            AvroSchema::Map(values) => json!({ "type": "map", "values": values.to_json_value() }),
            AvroSchema::Union(variants) => {
                Value::Array(variants.iter().map(AvroSchema::to_json_value).collect())
            }
            AvroSchema::Named(name) => json!(name),
            AvroSchema::Logical(lt) => {
                let mut obj = match lt.base.to_json_value() {
                    Value::Object(m) => m,
                    base => {
                        let mut m = Map::new();
                        m.insert("type".to_string(), base);
                        m
                    }
                };
                obj.insert("logicalType".to_string(), json!(lt.logical_type.name()));
                if let LogicalTypeName::Decimal { precision, scale } = &lt.logical_type {
                    obj.insert("precision".to_string(), json!(precision));
                    obj.insert("scale".to_string(), json!(scale));
                }
                Value::Object(obj)
            }
            primitive => json!(primitive.type_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_of_concrete_schemas() {
        assert_eq!(AvroSchema::Int.kind(), Some(SchemaKind::Int));
        assert_eq!(
            AvroSchema::Array(Box::new(AvroSchema::Null)).kind(),
            Some(SchemaKind::Array)
        );
        assert_eq!(AvroSchema::Named("a.B".into()).kind(), None);
    }

    #[test]
    fn test_type_name_uses_fullname_for_named_types() {
        let record = AvroSchema::Record(RecordSchema::new("User", vec![]).with_namespace("com.x"));
        assert_eq!(record.type_name(), "com.x.User");
        assert_eq!(AvroSchema::Long.type_name(), "long");
        assert_eq!(AvroSchema::Map(Box::new(AvroSchema::Int)).type_name(), "map");

        let uuid = AvroSchema::Logical(LogicalType::new(AvroSchema::String, LogicalTypeName::Uuid));
        assert_eq!(uuid.type_name(), "string");
    }

    #[test]
    fn test_short_name_of_reference() {
        assert_eq!(AvroSchema::Named("a.b.Node".into()).name(), Some("Node"));
        assert_eq!(AvroSchema::Named("Node".into()).name(), Some("Node"));
    }

    #[test]
    fn test_json_includes_defaults() {
        let schema = AvroSchema::Record(RecordSchema::new(
            "R",
            vec![FieldSchema::new("n", AvroSchema::Int).with_default(json!(7))],
        ));
        let value = schema.to_json_value();
        assert_eq!(value["fields"][0]["default"], json!(7));
        assert_eq!(value["fields"][0]["type"], json!("int"));
    }

    #[test]
    fn test_empty_namespace_is_ignored() {
        let fixed = FixedSchema::new("md5", 16).with_namespace("");
        assert_eq!(fixed.fullname(), "md5");
    }
}
