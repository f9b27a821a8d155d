//! Named type lookup and schema node identity.
//!
//! A [`NamedTypes`] registry borrows every record, enum and fixed definition
//! from one schema tree, so that a `Named` reference resolves to the very
//! node that defines it. Identity-keyed memoization relies on this: every
//! path to a record definition yields the same [`SchemaId`].

use std::collections::HashMap;

use crate::schema::AvroSchema;

/// Identity of a schema node within a borrowed schema tree.
///
/// Two ids are equal only when they were taken from the same node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemaId(usize);

impl SchemaId {
    /// Take the identity of a schema node.
    #[inline]
    pub fn of(schema: &AvroSchema) -> Self {
        SchemaId(schema as *const AvroSchema as usize)
    }
}

/// Registry of named types borrowed from a single schema tree.
#[derive(Debug, Clone, Default)]
pub struct NamedTypes<'a> {
    by_fullname: HashMap<String, &'a AvroSchema>,
}

impl<'a> NamedTypes<'a> {
    /// Collect every named definition reachable from `root`.
    pub fn collect(root: &'a AvroSchema) -> Self {
        let mut names = Self::default();
        names.visit(root);
        names
    }

    fn visit(&mut self, schema: &'a AvroSchema) {
        match schema {
            AvroSchema::Record(record) => {
                self.by_fullname.entry(record.fullname()).or_insert(schema);
                for field in &record.fields {
                    self.visit(&field.schema);
                }
            }
            AvroSchema::Enum(e) => {
                self.by_fullname.entry(e.fullname()).or_insert(schema);
            }
            AvroSchema::Fixed(f) => {
                self.by_fullname.entry(f.fullname()).or_insert(schema);
            }
            AvroSchema::Array(inner) | AvroSchema::Map(inner) => self.visit(inner),
            AvroSchema::Union(variants) => {
                for variant in variants {
                    self.visit(variant);
                }
            }
            AvroSchema::Logical(logical) => self.visit(&logical.base),
            _ => {}
        }
    }

    /// Look up a named type.
    ///
    /// An exact full-name match wins; otherwise a reference by short name
    /// resolves when exactly one definition carries that short name.
    pub fn get(&self, name: &str) -> Option<&'a AvroSchema> {
        if let Some(schema) = self.by_fullname.get(name) {
            return Some(*schema);
        }
        let mut candidates = self
            .by_fullname
            .iter()
            .filter(|(fullname, _)| fullname.rsplit('.').next() == Some(name))
            .map(|(_, schema)| *schema);
        match (candidates.next(), candidates.next()) {
            (Some(schema), None) => Some(schema),
            _ => None,
        }
    }
}
