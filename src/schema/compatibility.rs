//! Schema compatibility checking for Avro schema evolution.
//!
//! A writer/reader pair is compatible exactly when its resolution program
//! has no reachable error symbol. Checking compiles the program and walks
//! it, so no data is needed to find out whether decoding would fail.

use crate::error::SchemaError;
use crate::grammar::{GrammarConfig, Program, ResolvingGrammarGenerator};
use crate::schema::AvroSchema;

/// Result of a schema compatibility check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityResult {
    /// Whether the schemas are compatible.
    pub is_compatible: bool,
    /// Error messages found in the program (empty if compatible).
    pub errors: Vec<String>,
}

impl CompatibilityResult {
    /// Collect the reachable errors of a compiled program.
    pub fn from_program(program: &Program) -> Self {
        let errors: Vec<String> = program.errors().into_iter().map(str::to_string).collect();
        Self {
            is_compatible: errors.is_empty(),
            errors,
        }
    }

    /// Convert to a SchemaError if incompatible.
    pub fn to_error(&self) -> Option<SchemaError> {
        if self.is_compatible {
            None
        } else {
            Some(SchemaError::IncompatibleSchemas(self.errors.join("; ")))
        }
    }
}

/// Check whether data written with `writer` can be read as `reader`.
///
/// # Example
/// ```
/// use avro_grammar::schema::{check_compatibility, AvroSchema};
///
/// assert!(check_compatibility(&AvroSchema::Int, &AvroSchema::Long).unwrap().is_compatible);
/// assert!(!check_compatibility(&AvroSchema::Long, &AvroSchema::Int).unwrap().is_compatible);
/// ```
pub fn check_compatibility(
    writer: &AvroSchema,
    reader: &AvroSchema,
) -> Result<CompatibilityResult, SchemaError> {
    check_compatibility_with_config(writer, reader, GrammarConfig::default())
}

/// [`check_compatibility`] under an explicit compiler configuration.
pub fn check_compatibility_with_config(
    writer: &AvroSchema,
    reader: &AvroSchema,
    config: GrammarConfig,
) -> Result<CompatibilityResult, SchemaError> {
    let program = ResolvingGrammarGenerator::new(config).generate(writer, reader)?;
    Ok(CompatibilityResult::from_program(&program))
}

/// Check compatibility, returning an error describing every incompatibility.
pub fn validate_schema_compatibility(
    writer: &AvroSchema,
    reader: &AvroSchema,
) -> Result<(), SchemaError> {
    match check_compatibility(writer, reader)?.to_error() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSchema, RecordSchema};

    fn person(fields: Vec<FieldSchema>) -> AvroSchema {
        AvroSchema::Record(RecordSchema::new("Person", fields))
    }

    #[test]
    fn test_identical_schemas_compatible() {
        let schema = person(vec![FieldSchema::new("name", AvroSchema::String)]);
        let result = check_compatibility(&schema, &schema).unwrap();
        assert!(result.is_compatible);
        assert!(result.to_error().is_none());
    }

    #[test]
    fn test_missing_field_reported() {
        let writer = person(vec![]);
        let reader = person(vec![FieldSchema::new("age", AvroSchema::Int)]);
        let result = check_compatibility(&writer, &reader).unwrap();
        assert!(!result.is_compatible);
        assert_eq!(
            result.errors,
            vec!["Found Person, expecting Person, missing required field age".to_string()]
        );
        assert!(matches!(
            result.to_error(),
            Some(SchemaError::IncompatibleSchemas(_))
        ));
    }

    #[test]
    fn test_unused_union_branch_error_is_ignored() {
        // Only the selected branch is reachable from the root.
        let reader = AvroSchema::Union(vec![
            person(vec![FieldSchema::new("age", AvroSchema::Int)]),
            AvroSchema::Null,
        ]);
        let result = check_compatibility(&AvroSchema::Null, &reader).unwrap();
        assert!(result.is_compatible);
    }

    #[test]
    fn test_validate_schema_compatibility() {
        assert!(validate_schema_compatibility(&AvroSchema::Int, &AvroSchema::Double).is_ok());
        assert!(validate_schema_compatibility(&AvroSchema::Boolean, &AvroSchema::Int).is_err());
    }
}
