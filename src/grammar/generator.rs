//! Compiles a (writer, reader) schema pair into a resolution program.
//!
//! The compiler walks both schema trees in lock-step. Writer/reader
//! mismatches that cannot be resolved do not abort compilation; they are
//! emitted as `Error` symbols so that union branch selection can try every
//! branch and keep the ones that resolve.
//!
//! Records are memoised by the identity of the two schema nodes. The memo
//! entry is a reserved symbol registered before any field is compiled, so a
//! record that refers to itself compiles to a back-edge.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::encode::encode_default;
use crate::error::SchemaError;
use crate::grammar::builder::ProgramBuilder;
use crate::grammar::config::GrammarConfig;
use crate::grammar::symbol::{
    Action, Branch, EnumAdjust, Program, ReorderedField, Symbol, SymbolId, Terminal,
};
use crate::schema::{
    AvroSchema, EnumSchema, NamedTypes, RecordSchema, SchemaId, SchemaKind, TypePromotion,
};

/// Memo keys for the two compilation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum MemoKey {
    /// Writer-only grammar of a record
    Validating(SchemaId),
    /// Writer record read as reader record
    Resolving { writer: SchemaId, reader: SchemaId },
}

/// Which schema tree a node was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Writer,
    Reader,
}

#[derive(Debug, Clone, Copy)]
struct Input<'a> {
    schema: &'a AvroSchema,
    side: Side,
}

impl<'a> Input<'a> {
    fn writer(schema: &'a AvroSchema) -> Self {
        Input {
            schema,
            side: Side::Writer,
        }
    }

    fn reader(schema: &'a AvroSchema) -> Self {
        Input {
            schema,
            side: Side::Reader,
        }
    }

    /// A node of the same tree.
    fn child(self, schema: &'a AvroSchema) -> Self {
        Input {
            schema,
            side: self.side,
        }
    }
}

/// Compiles resolving grammars.
///
/// # Example
/// ```
/// use avro_grammar::grammar::{GrammarConfig, ResolvingGrammarGenerator};
/// use avro_grammar::schema::AvroSchema;
///
/// let generator = ResolvingGrammarGenerator::new(GrammarConfig::default());
/// let program = generator.generate(&AvroSchema::Int, &AvroSchema::Long).unwrap();
/// assert!(!program.has_errors());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResolvingGrammarGenerator {
    config: GrammarConfig,
}

impl ResolvingGrammarGenerator {
    pub fn new(config: GrammarConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GrammarConfig {
        &self.config
    }

    /// Compile the program that reads `writer` data as `reader`.
    ///
    /// Incompatibilities are embedded in the program as error symbols; check
    /// [`Program::has_errors`] before decoding. `Err` means no program could
    /// be built at all.
    pub fn generate(
        &self,
        writer: &AvroSchema,
        reader: &AvroSchema,
    ) -> Result<Program, SchemaError> {
        debug!(
            writer = %writer.type_name(),
            reader = %reader.type_name(),
            "Compiling resolving grammar"
        );
        let mut compiler = Compiler::new(self.config, writer, reader);
        let root = compiler.generate(Input::writer(writer), Input::reader(reader))?;
        let program = compiler.builder.finish(root)?;
        debug!(
            symbols = program.len(),
            has_errors = program.has_errors(),
            "Compiled resolving grammar"
        );
        Ok(program)
    }

    /// Compile the writer-only grammar of `schema`.
    pub fn validating(&self, schema: &AvroSchema) -> Result<Program, SchemaError> {
        let mut compiler = Compiler::new(self.config, schema, schema);
        let root = compiler.validating(Input::writer(schema))?;
        compiler.builder.finish(root)
    }
}

/// Compile `writer` against `reader` with the default configuration.
pub fn compile(writer: &AvroSchema, reader: &AvroSchema) -> Result<Program, SchemaError> {
    ResolvingGrammarGenerator::default().generate(writer, reader)
}

/// Compile the writer-only grammar of `schema` with the default
/// configuration.
pub fn compile_validating(schema: &AvroSchema) -> Result<Program, SchemaError> {
    ResolvingGrammarGenerator::default().validating(schema)
}

/// Writer/reader field correspondence of one record pair.
struct FieldMatch {
    /// Reader field index for each writer field
    writer_to_reader: Vec<Option<usize>>,
    reader_matched: Vec<bool>,
}

/// State of one top-level compile call.
struct Compiler<'a> {
    config: GrammarConfig,
    writer_names: NamedTypes<'a>,
    reader_names: NamedTypes<'a>,
    builder: ProgramBuilder,
    memo: HashMap<MemoKey, SymbolId>,
}

impl<'a> Compiler<'a> {
    fn new(config: GrammarConfig, writer: &'a AvroSchema, reader: &'a AvroSchema) -> Self {
        Self {
            config,
            writer_names: NamedTypes::collect(writer),
            reader_names: NamedTypes::collect(reader),
            builder: ProgramBuilder::new(),
            memo: HashMap::new(),
        }
    }

    fn names(&self, side: Side) -> &NamedTypes<'a> {
        match side {
            Side::Writer => &self.writer_names,
            Side::Reader => &self.reader_names,
        }
    }

    /// Look through named references and logical wrappers.
    fn deref(&self, input: Input<'a>) -> Result<Input<'a>, SchemaError> {
        let mut schema = input.schema;
        loop {
            schema = match schema {
                AvroSchema::Named(name) => self.names(input.side).get(name).ok_or_else(|| {
                    SchemaError::InvalidSchema(format!("Unresolved named type reference: {}", name))
                })?,
                AvroSchema::Logical(logical) => logical.base.as_ref(),
                _ => return Ok(input.child(schema)),
            };
        }
    }

    fn generate(&mut self, writer: Input<'a>, reader: Input<'a>) -> Result<SymbolId, SchemaError> {
        let w = self.deref(writer)?;
        let r = self.deref(reader)?;

        let symbol = match (w.schema, r.schema) {
            (AvroSchema::Fixed(wf), AvroSchema::Fixed(rf)) => {
                if wf.fullname() == rf.fullname() && wf.size == rf.size {
                    self.builder.terminal(Terminal::Fixed(wf.size))
                } else {
                    self.mismatch(w.schema, r.schema)
                }
            }
            (AvroSchema::Enum(we), AvroSchema::Enum(re)) => self.resolve_enum(we, re, w, r),
            (AvroSchema::Array(wi), AvroSchema::Array(ri)) => {
                let item = self.generate(w.child(wi), r.child(ri))?;
                self.repeat(Terminal::ArrayStart, Terminal::ArrayEnd, vec![item])
            }
            (AvroSchema::Map(wv), AvroSchema::Map(rv)) => {
                let key = self.builder.terminal(Terminal::String);
                let value = self.generate(w.child(wv), r.child(rv))?;
                self.repeat(Terminal::MapStart, Terminal::MapEnd, vec![key, value])
            }
            (AvroSchema::Record(wr), AvroSchema::Record(rr)) => self.resolve_records(w, r, wr, rr)?,
            // A writer union always dispatches on the index in the stream,
            // whatever the reader is.
            (AvroSchema::Union(branches), _) => self.resolve_union(branches, w, r)?,
            (_, AvroSchema::Union(branches)) => self.resolve_reader_union(w, r, branches)?,
            (ws, rs) if ws.is_primitive() && ws.kind() == rs.kind() => self.primitive(ws)?,
            (ws, rs) => match (ws.kind(), rs.kind()) {
                (Some(wk), Some(rk)) => match TypePromotion::between(wk, rk) {
                    Some(promotion) => {
                        let symbol = self.validating(w)?;
                        self.builder
                            .action(Action::NumericPromote { symbol, promotion })
                    }
                    None => self.mismatch(ws, rs),
                },
                _ => {
                    return Err(SchemaError::Internal(format!(
                        "unexpected schema pair {} / {}",
                        ws.type_name(),
                        rs.type_name()
                    )))
                }
            },
        };
        Ok(symbol)
    }

    fn mismatch(&mut self, writer: &AvroSchema, reader: &AvroSchema) -> SymbolId {
        self.builder.error(format!(
            "Found {}, expecting {}",
            writer.type_name(),
            reader.type_name()
        ))
    }

    fn primitive(&mut self, schema: &AvroSchema) -> Result<SymbolId, SchemaError> {
        let terminal = schema.kind().and_then(Terminal::primitive).ok_or_else(|| {
            SchemaError::Internal(format!("{} is not a primitive type", schema.type_name()))
        })?;
        Ok(self.builder.terminal(terminal))
    }

    /// `Sequence[start, Repeat{end, body}]`
    fn repeat(&mut self, start: Terminal, end: Terminal, body: Vec<SymbolId>) -> SymbolId {
        let start = self.builder.terminal(start);
        let repeat = self.builder.push(Symbol::Repeat { end, body });
        self.builder.push(Symbol::Sequence(vec![start, repeat]))
    }

    fn resolve_enum(
        &mut self,
        writer: &EnumSchema,
        reader: &EnumSchema,
        w: Input<'a>,
        r: Input<'a>,
    ) -> SymbolId {
        if writer.fullname() != reader.fullname() {
            return self.mismatch(w.schema, r.schema);
        }
        let fallback = if self.config.enum_defaults {
            reader
                .default
                .as_deref()
                .and_then(|symbol| reader.symbol_index(symbol))
        } else {
            None
        };
        let adjustments = writer
            .symbols
            .iter()
            .map(|symbol| reader.symbol_index(symbol).or(fallback))
            .collect();
        let terminal = self.builder.terminal(Terminal::Enum);
        let remap = self.builder.action(Action::EnumRemap(EnumAdjust {
            reader_symbols: reader.symbols.clone(),
            adjustments,
        }));
        self.builder.push(Symbol::Sequence(vec![terminal, remap]))
    }

    fn match_fields(&self, writer: &RecordSchema, reader: &RecordSchema) -> FieldMatch {
        let mut writer_to_reader = vec![None; writer.fields.len()];
        let mut reader_matched = vec![false; reader.fields.len()];

        for (ri, rf) in reader.fields.iter().enumerate() {
            if let Some((wi, _)) = writer.field(&rf.name) {
                writer_to_reader[wi] = Some(ri);
                reader_matched[ri] = true;
            }
        }

        if self.config.field_aliases {
            for (ri, rf) in reader.fields.iter().enumerate() {
                if reader_matched[ri] {
                    continue;
                }
                let claimed = rf.aliases.iter().find_map(|alias| {
                    writer
                        .field(alias)
                        .map(|(wi, _)| wi)
                        .filter(|wi| writer_to_reader[*wi].is_none())
                });
                if let Some(wi) = claimed {
                    writer_to_reader[wi] = Some(ri);
                    reader_matched[ri] = true;
                }
            }
        }

        FieldMatch {
            writer_to_reader,
            reader_matched,
        }
    }

    fn resolve_records(
        &mut self,
        w: Input<'a>,
        r: Input<'a>,
        writer: &'a RecordSchema,
        reader: &'a RecordSchema,
    ) -> Result<SymbolId, SchemaError> {
        let key = MemoKey::Resolving {
            writer: SchemaId::of(w.schema),
            reader: SchemaId::of(r.schema),
        };
        if let Some(id) = self.memo.get(&key) {
            trace!(record = %reader.fullname(), symbol = %id, "Record memo hit");
            return Ok(*id);
        }

        let fields = self.match_fields(writer, reader);

        // An unresolvable record is memoised as the error itself.
        let missing = reader
            .fields
            .iter()
            .zip(&fields.reader_matched)
            .find(|(rf, matched)| !**matched && rf.default.is_none());
        if let Some((rf, _)) = missing {
            let error = self.builder.error(format!(
                "Found {}, expecting {}, missing required field {}",
                writer.fullname(),
                reader.fullname(),
                rf.name
            ));
            self.memo.insert(key, error);
            return Ok(error);
        }

        let placeholder = self.builder.reserve();
        self.memo.insert(key, placeholder);
        trace!(record = %reader.fullname(), symbol = %placeholder, "Registered record placeholder");

        let defaulted = fields.reader_matched.iter().filter(|m| !**m).count();
        let mut children = Vec::with_capacity(writer.fields.len() + 3 * defaulted + 1);
        let mut order = Vec::with_capacity(reader.fields.len());

        for (wf, target) in writer.fields.iter().zip(&fields.writer_to_reader) {
            let field_writer = w.child(&wf.schema);
            match *target {
                Some(ri) => {
                    let rf = &reader.fields[ri];
                    children.push(self.generate(field_writer, r.child(&rf.schema))?);
                    order.push(ReorderedField {
                        name: rf.name.clone(),
                        reader_index: ri,
                    });
                }
                None => {
                    let skipped = self.generate(field_writer, field_writer)?;
                    children.push(self.builder.action(Action::Skip(skipped)));
                }
            }
        }

        for (ri, rf) in reader.fields.iter().enumerate() {
            if fields.reader_matched[ri] {
                continue;
            }
            let value = rf.default.as_ref().ok_or_else(|| {
                SchemaError::Internal(format!("field {} has no default", rf.name))
            })?;
            let bytes = encode_default(&rf.schema, value, self.names(r.side)).map_err(|source| {
                SchemaError::InvalidDefault {
                    field: rf.name.clone(),
                    source,
                }
            })?;
            let field_reader = r.child(&rf.schema);
            children.push(self.builder.action(Action::DefaultInject {
                schema: rf.schema.clone(),
                bytes,
            }));
            children.push(self.generate(field_reader, field_reader)?);
            children.push(self.builder.action(Action::DefaultEnd));
            order.push(ReorderedField {
                name: rf.name.clone(),
                reader_index: ri,
            });
        }

        children.push(self.builder.action(Action::FieldReorder(order)));
        self.builder.fill(placeholder, Symbol::Sequence(children));
        Ok(placeholder)
    }

    /// Writer union: one branch per writer branch, each read as `reader`.
    fn resolve_union(
        &mut self,
        branches: &'a [AvroSchema],
        w: Input<'a>,
        r: Input<'a>,
    ) -> Result<SymbolId, SchemaError> {
        let mut alternatives = Vec::with_capacity(branches.len());
        for branch in branches {
            let symbol = self.generate(w.child(branch), r)?;
            alternatives.push(Branch {
                label: branch.type_name(),
                symbol,
            });
        }
        let alternative = self.builder.push(Symbol::Alternative(alternatives));
        Ok(self.builder.action(Action::UnionBranchSelect(alternative)))
    }

    /// Non-union writer read into a reader union.
    fn resolve_reader_union(
        &mut self,
        w: Input<'a>,
        r: Input<'a>,
        branches: &'a [AvroSchema],
    ) -> Result<SymbolId, SchemaError> {
        match self.best_branch(w, r, branches)? {
            Some(index) => {
                debug!(
                    writer = %w.schema.type_name(),
                    branch = index,
                    "Selected reader union branch"
                );
                let symbol = self.generate(w, r.child(&branches[index]))?;
                Ok(self.builder.action(Action::UnionAdjust { index, symbol }))
            }
            None => {
                debug!(writer = %w.schema.type_name(), "No reader union branch matches");
                Ok(self.mismatch(w.schema, r.schema))
            }
        }
    }

    /// Pick the reader union branch a non-union writer type is read into.
    ///
    /// A branch of the same type wins at once, except that named types must
    /// also agree on the full name. Records whose names differ are resolved
    /// structurally: the first error-free one is kept unless a later one has
    /// the writer's short name. Failing that, the first branch reachable by
    /// promotion is taken.
    fn best_branch(
        &mut self,
        w: Input<'a>,
        r: Input<'a>,
        branches: &'a [AvroSchema],
    ) -> Result<Option<usize>, SchemaError> {
        let Some(vt) = w.schema.kind() else {
            return Ok(None);
        };

        let mut structure_match: Option<usize> = None;
        for (j, branch) in branches.iter().enumerate() {
            let b = self.deref(r.child(branch))?;
            if b.schema.kind() != Some(vt) {
                continue;
            }
            match (w.schema, b.schema) {
                (AvroSchema::Record(wr), AvroSchema::Record(br)) => {
                    if wr.fullname() == br.fullname() {
                        return Ok(Some(j));
                    }
                    let resolved = self.resolve_records(w, b, wr, br)?;
                    if !self.builder.has_match_error(resolved)
                        && (structure_match.is_none() || w.schema.name() == b.schema.name())
                    {
                        structure_match = Some(j);
                    }
                }
                (AvroSchema::Enum(_), AvroSchema::Enum(_))
                | (AvroSchema::Fixed(_), AvroSchema::Fixed(_)) => {
                    if w.schema.fullname() == b.schema.fullname() {
                        return Ok(Some(j));
                    }
                }
                _ => return Ok(Some(j)),
            }
        }

        if structure_match.is_some() {
            return Ok(structure_match);
        }

        for (j, branch) in branches.iter().enumerate() {
            let b = self.deref(r.child(branch))?;
            let promotable = matches!(
                (vt, b.schema.kind()),
                (SchemaKind::Int, Some(SchemaKind::Long | SchemaKind::Double))
                    | (SchemaKind::Long | SchemaKind::Float, Some(SchemaKind::Double))
                    | (SchemaKind::String, Some(SchemaKind::Bytes))
                    | (SchemaKind::Bytes, Some(SchemaKind::String))
            );
            if promotable {
                return Ok(Some(j));
            }
        }
        Ok(None)
    }

    /// The writer-only grammar of one schema.
    fn validating(&mut self, input: Input<'a>) -> Result<SymbolId, SchemaError> {
        let input = self.deref(input)?;
        let schema = input.schema;
        let symbol = match schema {
            AvroSchema::Fixed(fixed) => self.builder.terminal(Terminal::Fixed(fixed.size)),
            AvroSchema::Enum(e) => {
                let terminal = self.builder.terminal(Terminal::Enum);
                let remap = self.builder.action(Action::EnumRemap(EnumAdjust {
                    reader_symbols: e.symbols.clone(),
                    adjustments: (0..e.symbols.len()).map(Some).collect(),
                }));
                self.builder.push(Symbol::Sequence(vec![terminal, remap]))
            }
            AvroSchema::Array(items) => {
                let item = self.validating(input.child(items))?;
                self.repeat(Terminal::ArrayStart, Terminal::ArrayEnd, vec![item])
            }
            AvroSchema::Map(values) => {
                let key = self.builder.terminal(Terminal::String);
                let value = self.validating(input.child(values))?;
                self.repeat(Terminal::MapStart, Terminal::MapEnd, vec![key, value])
            }
            AvroSchema::Record(record) => {
                let key = MemoKey::Validating(SchemaId::of(schema));
                if let Some(id) = self.memo.get(&key) {
                    return Ok(*id);
                }
                let placeholder = self.builder.reserve();
                self.memo.insert(key, placeholder);

                let mut children = Vec::with_capacity(record.fields.len() + 1);
                for field in &record.fields {
                    children.push(self.validating(input.child(&field.schema))?);
                }
                let order = record
                    .fields
                    .iter()
                    .enumerate()
                    .map(|(reader_index, field)| ReorderedField {
                        name: field.name.clone(),
                        reader_index,
                    })
                    .collect();
                children.push(self.builder.action(Action::FieldReorder(order)));
                self.builder.fill(placeholder, Symbol::Sequence(children));
                placeholder
            }
            AvroSchema::Union(branches) => {
                let mut alternatives = Vec::with_capacity(branches.len());
                for branch in branches {
                    alternatives.push(Branch {
                        label: branch.type_name(),
                        symbol: self.validating(input.child(branch))?,
                    });
                }
                let tag = self.builder.terminal(Terminal::Union);
                let alternative = self.builder.push(Symbol::Alternative(alternatives));
                self.builder.push(Symbol::Sequence(vec![tag, alternative]))
            }
            other => self.primitive(other)?,
        };
        Ok(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSchema, FixedSchema};
    use serde_json::json;

    fn record(name: &str, fields: Vec<FieldSchema>) -> AvroSchema {
        AvroSchema::Record(RecordSchema::new(name, fields))
    }

    fn int_field(name: &str) -> FieldSchema {
        FieldSchema::new(name, AvroSchema::Int)
    }

    fn reorder(program: &Program) -> &[ReorderedField] {
        let Symbol::Sequence(children) = program.root_symbol() else {
            panic!("expected record sequence");
        };
        match program.symbol(*children.last().unwrap()) {
            Symbol::Action(Action::FieldReorder(fields)) => fields,
            other => panic!("expected FieldReorder, got {:?}", other),
        }
    }

    // ========================================================================
    // Primitives and promotion
    // ========================================================================

    #[test]
    fn test_same_primitive_is_terminal() {
        let program = compile(&AvroSchema::String, &AvroSchema::String).unwrap();
        assert_eq!(program.root_symbol(), &Symbol::Terminal(Terminal::String));
    }

    #[test]
    fn test_promotion_wraps_writer_terminal() {
        let program = compile(&AvroSchema::Long, &AvroSchema::Float).unwrap();
        let Symbol::Action(Action::NumericPromote { symbol, promotion }) = program.root_symbol()
        else {
            panic!("expected NumericPromote");
        };
        assert_eq!(*promotion, TypePromotion::LongToFloat);
        assert_eq!(program.symbol(*symbol), &Symbol::Terminal(Terminal::Long));
    }

    #[test]
    fn test_demotion_is_error() {
        let program = compile(&AvroSchema::Long, &AvroSchema::Int).unwrap();
        assert!(program.has_errors());
        assert_eq!(program.errors(), vec!["Found long, expecting int"]);
    }

    #[test]
    fn test_logical_type_resolves_through_base() {
        use crate::schema::{LogicalType, LogicalTypeName};
        let date = AvroSchema::Logical(LogicalType::new(AvroSchema::Int, LogicalTypeName::Date));
        let program = compile(&date, &AvroSchema::Long).unwrap();
        assert!(!program.has_errors());
    }

    // ========================================================================
    // Named types
    // ========================================================================

    #[test]
    fn test_fixed_requires_name_and_size() {
        let f4 = AvroSchema::Fixed(FixedSchema::new("F", 4));
        let f8 = AvroSchema::Fixed(FixedSchema::new("F", 8));
        let g4 = AvroSchema::Fixed(FixedSchema::new("G", 4));
        assert_eq!(
            compile(&f4, &f4).unwrap().root_symbol(),
            &Symbol::Terminal(Terminal::Fixed(4))
        );
        assert!(compile(&f4, &f8).unwrap().has_errors());
        assert!(compile(&f4, &g4).unwrap().has_errors());
    }

    #[test]
    fn test_enum_names_must_match() {
        let a = AvroSchema::Enum(EnumSchema::new("A", vec!["X".into()]));
        let b = AvroSchema::Enum(EnumSchema::new("B", vec!["X".into()]));
        assert!(compile(&a, &b).unwrap().has_errors());
    }

    #[test]
    fn test_enum_default_fills_unknown_symbols() {
        let writer = AvroSchema::Enum(EnumSchema::new(
            "E",
            vec!["A".into(), "B".into(), "NEW".into()],
        ));
        let reader = AvroSchema::Enum(
            EnumSchema::new("E", vec!["B".into(), "UNKNOWN".into(), "A".into()])
                .with_default("UNKNOWN"),
        );

        let adjust = |config: GrammarConfig| {
            let program = ResolvingGrammarGenerator::new(config)
                .generate(&writer, &reader)
                .unwrap();
            let Symbol::Sequence(children) = program.root_symbol() else {
                panic!("expected enum sequence");
            };
            match program.symbol(children[1]) {
                Symbol::Action(Action::EnumRemap(adjust)) => adjust.adjustments.clone(),
                other => panic!("expected EnumRemap, got {:?}", other),
            }
        };

        assert_eq!(
            adjust(GrammarConfig::default()),
            vec![Some(2), Some(0), Some(1)]
        );
        assert_eq!(
            adjust(GrammarConfig::default().with_enum_defaults(false)),
            vec![Some(2), Some(0), None]
        );
    }

    #[test]
    fn test_unresolved_named_reference_is_fatal() {
        let writer = record("R", vec![FieldSchema::new("x", AvroSchema::Named("Nope".into()))]);
        assert!(matches!(
            compile(&writer, &writer),
            Err(SchemaError::InvalidSchema(_))
        ));
    }

    // ========================================================================
    // Records
    // ========================================================================

    #[test]
    fn test_record_fields_follow_writer_order() {
        let writer = record("R", vec![int_field("b"), int_field("a")]);
        let reader = record("R", vec![int_field("a"), int_field("b")]);
        let program = compile(&writer, &reader).unwrap();
        let order: Vec<(&str, usize)> = reorder(&program)
            .iter()
            .map(|f| (f.name.as_str(), f.reader_index))
            .collect();
        assert_eq!(order, vec![("b", 1), ("a", 0)]);
    }

    #[test]
    fn test_field_alias_matches_writer_field() {
        let writer = record("R", vec![int_field("old")]);
        let reader = record("R", vec![int_field("new").with_alias("old")]);

        let program = compile(&writer, &reader).unwrap();
        assert!(!program.has_errors());
        assert_eq!(reorder(&program)[0].name, "new");

        let strict = ResolvingGrammarGenerator::new(GrammarConfig::new().with_field_aliases(false))
            .generate(&writer, &reader)
            .unwrap();
        assert!(strict.has_errors());
    }

    #[test]
    fn test_exact_name_beats_alias() {
        let writer = record("R", vec![int_field("a"), int_field("b")]);
        let reader = record(
            "R",
            vec![int_field("a"), int_field("c").with_alias("a").with_default(json!(0))],
        );
        let program = compile(&writer, &reader).unwrap();
        let names: Vec<&str> = reorder(&program).iter().map(|f| f.name.as_str()).collect();
        // `c` cannot claim `a`, so it falls back to its default.
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_invalid_default_is_fatal() {
        let writer = record("R", vec![]);
        let reader = record("R", vec![int_field("n").with_default(json!("seven"))]);
        match compile(&writer, &reader) {
            Err(SchemaError::InvalidDefault { field, .. }) => assert_eq!(field, "n"),
            other => panic!("expected InvalidDefault, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_record() {
        let empty = record("E", vec![]);
        let program = compile(&empty, &empty).unwrap();
        assert!(reorder(&program).is_empty());
    }

    // ========================================================================
    // Unions
    // ========================================================================

    #[test]
    fn test_writer_union_labels_branches() {
        let union = AvroSchema::Union(vec![AvroSchema::Null, AvroSchema::String]);
        let program = compile(&union, &union).unwrap();
        let Symbol::Action(Action::UnionBranchSelect(alt)) = program.root_symbol() else {
            panic!("expected UnionBranchSelect");
        };
        let Symbol::Alternative(branches) = program.symbol(*alt) else {
            panic!("expected Alternative");
        };
        let labels: Vec<&str> = branches.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["null", "string"]);
        assert!(!program.has_errors());
    }

    #[test]
    fn test_reader_union_prefers_exact_type_over_promotion() {
        let reader = AvroSchema::Union(vec![AvroSchema::Double, AvroSchema::Int]);
        let program = compile(&AvroSchema::Int, &reader).unwrap();
        let Symbol::Action(Action::UnionAdjust { index, .. }) = program.root_symbol() else {
            panic!("expected UnionAdjust");
        };
        assert_eq!(*index, 1);
    }

    #[test]
    fn test_reader_union_promotion_pass_skips_float() {
        // int may promote to float, but branch selection only looks for
        // long and double.
        let reader = AvroSchema::Union(vec![AvroSchema::Float, AvroSchema::Null]);
        let program = compile(&AvroSchema::Int, &reader).unwrap();
        assert!(program.has_errors());
    }

    #[test]
    fn test_structural_match_first_wins() {
        let writer = record("W", vec![int_field("a")]);
        let reader = AvroSchema::Union(vec![
            record("P", vec![int_field("a")]),
            record("Q", vec![int_field("a")]),
        ]);
        let program = compile(&writer, &reader).unwrap();
        let Symbol::Action(Action::UnionAdjust { index, .. }) = program.root_symbol() else {
            panic!("expected UnionAdjust");
        };
        assert_eq!(*index, 0);
    }

    #[test]
    fn test_failed_structural_match_is_skipped() {
        let writer = record("W", vec![int_field("a")]);
        let reader = AvroSchema::Union(vec![
            record("P", vec![int_field("missing")]),
            record("Q", vec![int_field("a")]),
        ]);
        let program = compile(&writer, &reader).unwrap();
        let Symbol::Action(Action::UnionAdjust { index, .. }) = program.root_symbol() else {
            panic!("expected UnionAdjust");
        };
        assert_eq!(*index, 1);
        assert!(!program.has_errors());
    }

    // ========================================================================
    // Validating grammar
    // ========================================================================

    #[test]
    fn test_validating_union_reads_index_first() {
        let union = AvroSchema::Union(vec![AvroSchema::Null, AvroSchema::Int]);
        let program = compile_validating(&union).unwrap();
        let Symbol::Sequence(children) = program.root_symbol() else {
            panic!("expected Sequence");
        };
        assert_eq!(program.symbol(children[0]), &Symbol::Terminal(Terminal::Union));
        assert!(matches!(program.symbol(children[1]), Symbol::Alternative(_)));
    }

    #[test]
    fn test_validating_record_has_identity_order() {
        let schema = record(
            "Node",
            vec![
                int_field("value"),
                FieldSchema::new(
                    "next",
                    AvroSchema::Union(vec![AvroSchema::Null, AvroSchema::Named("Node".into())]),
                ),
            ],
        );
        let program = compile_validating(&schema).unwrap();
        assert!(!program.has_errors());
        let order: Vec<usize> = reorder(&program).iter().map(|f| f.reader_index).collect();
        assert_eq!(order, vec![0, 1]);
    }
}
