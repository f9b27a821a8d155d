//! Avro schema model.
//!
//! This module defines the schema tree the compiler consumes, the
//! named-type registry used to resolve references inside one tree, the
//! allowed type promotions, and compatibility checking.

mod compatibility;
mod names;
mod promotion;
mod types;

pub use compatibility::{
    check_compatibility, check_compatibility_with_config, validate_schema_compatibility,
    CompatibilityResult,
};
pub use names::{NamedTypes, SchemaId};
pub use promotion::{apply_promotion, TypePromotion};
pub use types::*;
