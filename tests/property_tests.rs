//! Property-based tests for grammar compilation.
//!
//! These tests use proptest to check properties over many generated schemas.

use proptest::prelude::*;

use avro_grammar::encode::BinaryEncoder;
use avro_grammar::grammar::compile;
use avro_grammar::reader::{AvroValue, ResolvingDecoder};
use avro_grammar::schema::*;

// ============================================================================
// Schema Generators
// ============================================================================

/// Generate arbitrary Avro primitive schemas.
fn arb_primitive_schema() -> impl Strategy<Value = AvroSchema> {
    prop_oneof![
        Just(AvroSchema::Null),
        Just(AvroSchema::Boolean),
        Just(AvroSchema::Int),
        Just(AvroSchema::Long),
        Just(AvroSchema::Float),
        Just(AvroSchema::Double),
        Just(AvroSchema::Bytes),
        Just(AvroSchema::String),
    ]
}

/// Generate valid Avro names.
fn arb_avro_name() -> impl Strategy<Value = String> {
    "[A-Za-z_][A-Za-z0-9_]{0,15}"
}

/// Generate enum symbols (non-empty list of unique valid names).
fn arb_enum_symbols() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(arb_avro_name(), 1..5).prop_map(|set| set.into_iter().collect())
}

/// Generate a union of distinct primitive types.
fn arb_primitive_union() -> impl Strategy<Value = AvroSchema> {
    prop::collection::btree_set(0usize..8, 1..4).prop_map(|indices| {
        let all = [
            AvroSchema::Null,
            AvroSchema::Boolean,
            AvroSchema::Int,
            AvroSchema::Long,
            AvroSchema::Float,
            AvroSchema::Double,
            AvroSchema::Bytes,
            AvroSchema::String,
        ];
        AvroSchema::Union(indices.into_iter().map(|i| all[i].clone()).collect())
    })
}

/// Generate schemas with nested records, arrays, maps, enums and fixed.
fn arb_schema() -> impl Strategy<Value = AvroSchema> {
    let leaf = prop_oneof![
        4 => arb_primitive_schema(),
        1 => (arb_avro_name(), 1usize..32)
            .prop_map(|(name, size)| AvroSchema::Fixed(FixedSchema::new(name, size))),
        1 => (arb_avro_name(), arb_enum_symbols())
            .prop_map(|(name, symbols)| AvroSchema::Enum(EnumSchema::new(name, symbols))),
        1 => arb_primitive_union(),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(|s| AvroSchema::Array(Box::new(s))),
            inner.clone().prop_map(|s| AvroSchema::Map(Box::new(s))),
            (
                arb_avro_name(),
                prop::collection::btree_map(arb_avro_name(), inner, 0..4)
            )
                .prop_map(|(name, fields)| {
                    let fields = fields
                        .into_iter()
                        .map(|(field, schema)| FieldSchema::new(field, schema))
                        .collect();
                    AvroSchema::Record(RecordSchema::new(name, fields))
                }),
        ]
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_identity_compile_has_no_errors(schema in arb_schema()) {
        let program = compile(&schema, &schema).unwrap();
        prop_assert!(!program.has_errors(), "errors: {:?}", program.errors());
    }

    #[test]
    fn prop_compile_is_total(writer in arb_schema(), reader in arb_schema()) {
        // Mismatches are embedded in the program, never returned.
        prop_assert!(compile(&writer, &reader).is_ok());
    }

    #[test]
    fn prop_int_promotes_to_long(value in any::<i32>()) {
        let program = compile(&AvroSchema::Int, &AvroSchema::Long).unwrap();
        let mut encoder = BinaryEncoder::new();
        encoder.write_int(value);
        let bytes = encoder.finish();
        let mut data: &[u8] = &bytes;
        let decoded = ResolvingDecoder::new(&program).decode(&mut data).unwrap();
        prop_assert_eq!(decoded, AvroValue::Long(i64::from(value)));
        prop_assert!(data.is_empty());
    }

    #[test]
    fn prop_skipped_field_leaves_reader_value_intact(
        kept in any::<i64>(),
        skipped in prop::collection::vec(any::<String>(), 0..8),
    ) {
        let writer = AvroSchema::Record(RecordSchema::new(
            "R",
            vec![
                FieldSchema::new("extra", AvroSchema::Array(Box::new(AvroSchema::String))),
                FieldSchema::new("kept", AvroSchema::Long),
            ],
        ));
        let reader = AvroSchema::Record(RecordSchema::new(
            "R",
            vec![FieldSchema::new("kept", AvroSchema::Long)],
        ));
        let mut encoder = BinaryEncoder::new();
        if !skipped.is_empty() {
            encoder.write_item_count(skipped.len());
            for s in &skipped {
                encoder.write_string(s);
            }
        }
        encoder.write_item_count(0);
        encoder.write_long(kept);
        let bytes = encoder.finish();

        let program = compile(&writer, &reader).unwrap();
        let mut data: &[u8] = &bytes;
        let decoded = ResolvingDecoder::new(&program).decode(&mut data).unwrap();
        prop_assert_eq!(decoded.field("kept"), Some(&AvroValue::Long(kept)));
        prop_assert!(data.is_empty());
    }
}
