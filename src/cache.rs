//! Shared cache of compiled resolution programs.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::error::SchemaError;
use crate::grammar::{GrammarConfig, Program, ResolvingGrammarGenerator};
use crate::schema::AvroSchema;

/// Thread-safe cache of resolution programs keyed by the JSON form of the
/// (writer, reader) pair.
///
/// Structurally equal schemas share one program, so callers may rebuild
/// the same schema values freely.
///
/// # Example
/// ```
/// use avro_grammar::cache::ProgramCache;
/// use avro_grammar::schema::AvroSchema;
///
/// let cache = ProgramCache::new();
/// let first = cache.get_or_compile(&AvroSchema::Int, &AvroSchema::Long).unwrap();
/// let second = cache.get_or_compile(&AvroSchema::Int, &AvroSchema::Long).unwrap();
/// assert!(std::sync::Arc::ptr_eq(&first, &second));
/// assert_eq!(cache.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ProgramCache {
    generator: ResolvingGrammarGenerator,
    programs: RwLock<HashMap<(String, String), Arc<Program>>>,
}

impl ProgramCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache whose programs are compiled under `config`.
    pub fn with_config(config: GrammarConfig) -> Self {
        Self {
            generator: ResolvingGrammarGenerator::new(config),
            programs: RwLock::default(),
        }
    }

    /// The cached program for the pair, compiling it on first use.
    ///
    /// Compile failures are returned and not cached.
    pub fn get_or_compile(
        &self,
        writer: &AvroSchema,
        reader: &AvroSchema,
    ) -> Result<Arc<Program>, SchemaError> {
        let key = (writer.to_json(), reader.to_json());
        if let Some(program) = self
            .programs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(program));
        }

        debug!(writer = %key.0, reader = %key.1, "Program cache miss");
        let program = Arc::new(self.generator.generate(writer, reader)?);
        let mut programs = self.programs.write().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have compiled the same pair meanwhile.
        Ok(Arc::clone(programs.entry(key).or_insert(program)))
    }

    pub fn len(&self) -> usize {
        self.programs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.programs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Action, Symbol};
    use crate::schema::{EnumSchema, FieldSchema, RecordSchema};
    use std::thread;

    #[test]
    fn test_structurally_equal_schemas_share_program() {
        let cache = ProgramCache::new();
        let make = || {
            AvroSchema::Record(RecordSchema::new(
                "R",
                vec![FieldSchema::new("a", AvroSchema::Int)],
            ))
        };
        let a = cache.get_or_compile(&make(), &make()).unwrap();
        let b = cache.get_or_compile(&make(), &make()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_config_applies_to_cached_programs() {
        let writer = AvroSchema::Enum(EnumSchema::new("E", vec!["A".into(), "Z".into()]));
        let reader =
            AvroSchema::Enum(EnumSchema::new("E", vec!["A".into()]).with_default("A"));
        let strict = ProgramCache::with_config(GrammarConfig::new().with_enum_defaults(false));
        let program = strict.get_or_compile(&writer, &reader).unwrap();
        let Symbol::Sequence(children) = program.root_symbol() else {
            panic!("expected enum sequence");
        };
        let Symbol::Action(Action::EnumRemap(adjust)) = program.symbol(children[1]) else {
            panic!("expected EnumRemap");
        };
        assert_eq!(adjust.resolve(1), None);
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(ProgramCache::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    cache
                        .get_or_compile(&AvroSchema::Float, &AvroSchema::Double)
                        .unwrap()
                })
            })
            .collect();
        let programs: Vec<Arc<Program>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(programs.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(cache.len(), 1);
    }
}
