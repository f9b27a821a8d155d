//! Avro schema resolution compiled to reusable grammars
//!
//! Given the schema data was written with and the schema a consumer wants,
//! this library compiles a [`Program`] once and runs it over any number of
//! writer-encoded payloads, producing reader-shaped values. Resolution
//! covers type promotion, field reordering, reader defaults, enum
//! remapping, and union branch selection.
//!
//! ```
//! use avro_grammar::{compile, AvroSchema, AvroValue, FieldSchema, RecordSchema, ResolvingDecoder};
//! use serde_json::json;
//!
//! let writer = AvroSchema::Record(RecordSchema::new(
//!     "User",
//!     vec![FieldSchema::new("id", AvroSchema::Int)],
//! ));
//! let reader = AvroSchema::Record(RecordSchema::new(
//!     "User",
//!     vec![
//!         FieldSchema::new("id", AvroSchema::Long),
//!         FieldSchema::new("active", AvroSchema::Boolean).with_default(json!(true)),
//!     ],
//! ));
//!
//! let program = compile(&writer, &reader).unwrap();
//! assert!(!program.has_errors());
//!
//! let mut data: &[u8] = &[0x54];
//! let user = ResolvingDecoder::new(&program).decode(&mut data).unwrap();
//! assert_eq!(user.field("id"), Some(&AvroValue::Long(42)));
//! assert_eq!(user.field("active"), Some(&AvroValue::Boolean(true)));
//! ```

pub mod cache;
pub mod encode;
pub mod error;
pub mod grammar;
pub mod reader;
pub mod schema;

// Re-export main types
pub use cache::ProgramCache;
pub use encode::{encode_default, BinaryEncoder};
pub use error::{DecodeError, EncodeError, SchemaError};
pub use grammar::{
    compile, compile_validating, Action, GrammarConfig, Program, ResolvingGrammarGenerator,
    Symbol, SymbolId, Terminal,
};
pub use reader::{AvroValue, ResolvingDecoder};
pub use schema::{
    check_compatibility, AvroSchema, CompatibilityResult, EnumSchema, FieldSchema, FixedSchema,
    LogicalType, LogicalTypeName, NamedTypes, RecordSchema, SchemaKind, TypePromotion,
};
