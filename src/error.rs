//! Error types for schema resolution

use thiserror::Error;

/// Errors that can occur while compiling a resolving grammar.
///
/// Ordinary writer/reader mismatches are not reported here; they are
/// embedded in the compiled program as error symbols. These variants are
/// reserved for conditions where no program can be produced at all.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Invalid schema format (e.g. a dangling named reference)
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
    /// Incompatible schema evolution
    #[error("Incompatible schemas: {0}")]
    IncompatibleSchemas(String),
    /// A reader field default could not be encoded under its schema
    #[error("Invalid default for field '{field}': {source}")]
    InvalidDefault {
        field: String,
        #[source]
        source: EncodeError,
    },
    /// The compiler left the program in an inconsistent state
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors that can occur while encoding a default value.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EncodeError {
    /// The literal's kind disagrees with the schema kind
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
    /// A record field is absent from the literal and has no default
    #[error("No default value for: {0}")]
    MissingDefault(String),
    /// Enum literal names a symbol the enum does not declare
    #[error("Unknown enum symbol '{symbol}' for enum '{name}'")]
    UnknownSymbol { name: String, symbol: String },
    /// Numeric literal does not fit the schema type
    #[error("Value {value} out of range for {kind}")]
    OutOfRange { value: String, kind: &'static str },
    /// Named reference with no definition in scope
    #[error("Unresolved named type reference: '{0}'")]
    UnresolvedName(String),
    /// A field default that contains itself through omitted fields
    #[error("Default for field '{0}' refers to itself")]
    RecursiveDefault(String),
}

/// Errors that can occur during decoding
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Invalid Avro data
    #[error("Invalid data: {0}")]
    InvalidData(String),
    /// Unexpected end of data
    #[error("Unexpected end of input")]
    UnexpectedEof,
    /// Type mismatch
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
    /// Invalid varint encoding
    #[error("Invalid varint encoding")]
    InvalidVarint,
    /// String is not valid UTF-8
    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    /// Writer enum ordinal has no counterpart in the reader enum
    #[error("No match for writer enum ordinal {ordinal}")]
    UnmappableEnumSymbol { ordinal: usize },
    /// The program contains an error symbol on the path taken by the data
    #[error("Incompatible schemas: {0}")]
    Incompatible(String),
}
