//! The resolution program model.
//!
//! A [`Program`] is an arena of [`Symbol`]s addressed by [`SymbolId`].
//! Children refer to each other by id, so a self-referential record
//! compiles to a finite graph whose recursive field points back at the
//! record's own symbol instead of unrolling.
//!
//! Sequences list their children in execution order:
//!
//! | schema pair       | symbol shape                                                  |
//! |-------------------|---------------------------------------------------------------|
//! | record            | `Sequence[fields.., (DefaultInject, d, DefaultEnd)*, FieldReorder]` |
//! | enum              | `Sequence[Terminal(Enum), EnumRemap]`                         |
//! | array             | `Sequence[Terminal(ArrayStart), Repeat{ArrayEnd, [item]}]`    |
//! | map               | `Sequence[Terminal(MapStart), Repeat{MapEnd, [String, value]}]` |
//! | writer union      | `UnionBranchSelect(Alternative[..])`                          |
//! | reader union only | `UnionAdjust{index, branch}`                                  |
//! | promotion         | `NumericPromote{Terminal(writer), promotion}`                 |

use std::collections::HashSet;
use std::fmt;

use bytes::Bytes;

use crate::schema::{AvroSchema, SchemaKind, TypePromotion};

/// Index of a symbol inside its [`Program`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub(crate) usize);

impl SymbolId {
    /// Position of the symbol in the program arena.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A primitive read instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terminal {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    String,
    Bytes,
    /// Fixed-size byte array of the given length
    Fixed(usize),
    Enum,
    ArrayStart,
    ArrayEnd,
    MapStart,
    MapEnd,
    /// Union branch index
    Union,
}

impl Terminal {
    /// The terminal reading a primitive kind, if `kind` is primitive.
    pub fn primitive(kind: SchemaKind) -> Option<Self> {
        Some(match kind {
            SchemaKind::Null => Terminal::Null,
            SchemaKind::Boolean => Terminal::Boolean,
            SchemaKind::Int => Terminal::Int,
            SchemaKind::Long => Terminal::Long,
            SchemaKind::Float => Terminal::Float,
            SchemaKind::Double => Terminal::Double,
            SchemaKind::String => Terminal::String,
            SchemaKind::Bytes => Terminal::Bytes,
            _ => return None,
        })
    }
}

/// One labelled branch of an [`Symbol::Alternative`].
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    /// Type name of the writer branch
    pub label: String,
    pub symbol: SymbolId,
}

/// A reader field in the order its value arrives from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderedField {
    pub name: String,
    /// Position of the field in the reader record
    pub reader_index: usize,
}

/// Writer-ordinal to reader-ordinal mapping for an enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumAdjust {
    /// Reader symbols in ordinal order
    pub reader_symbols: Vec<String>,
    /// Reader ordinal for each writer ordinal; `None` when the writer
    /// symbol has no reader counterpart
    pub adjustments: Vec<Option<usize>>,
}

impl EnumAdjust {
    /// Number of symbols the reader declares.
    pub fn reader_symbol_count(&self) -> usize {
        self.reader_symbols.len()
    }

    /// Reader ordinal for a writer ordinal.
    pub fn resolve(&self, writer_ordinal: usize) -> Option<usize> {
        self.adjustments.get(writer_ordinal).copied().flatten()
    }
}

/// Non-consuming instructions that shape the decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Reader fields in arrival order; closes every record sequence
    FieldReorder(Vec<ReorderedField>),
    /// Consume and discard a writer-only value
    Skip(SymbolId),
    /// Start replaying pre-encoded default bytes for a reader-only field
    DefaultInject { schema: AvroSchema, bytes: Bytes },
    /// End of a default replay
    DefaultEnd,
    EnumRemap(EnumAdjust),
    /// Decode the narrower writer type, then widen
    NumericPromote {
        symbol: SymbolId,
        promotion: TypePromotion,
    },
    /// Writer-side union: the stream supplies the branch index for the
    /// child alternative
    UnionBranchSelect(SymbolId),
    /// Non-union writer read into reader union branch `index`
    UnionAdjust { index: usize, symbol: SymbolId },
    /// Unresolvable writer/reader pair
    Error(String),
}

/// A node of a resolution program.
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    Terminal(Terminal),
    Sequence(Vec<SymbolId>),
    Repeat { end: Terminal, body: Vec<SymbolId> },
    Alternative(Vec<Branch>),
    Action(Action),
}

impl Symbol {
    /// Whether this symbol is an error action.
    pub fn is_error(&self) -> bool {
        matches!(self, Symbol::Action(Action::Error(_)))
    }

    fn children(&self) -> Vec<SymbolId> {
        match self {
            Symbol::Terminal(_) => Vec::new(),
            Symbol::Sequence(children) | Symbol::Repeat { body: children, .. } => children.clone(),
            Symbol::Alternative(branches) => branches.iter().map(|b| b.symbol).collect(),
            Symbol::Action(action) => match action {
                Action::Skip(id)
                | Action::UnionBranchSelect(id)
                | Action::NumericPromote { symbol: id, .. }
                | Action::UnionAdjust { symbol: id, .. } => vec![*id],
                Action::FieldReorder(_)
                | Action::DefaultInject { .. }
                | Action::DefaultEnd
                | Action::EnumRemap(_)
                | Action::Error(_) => Vec::new(),
            },
        }
    }
}

/// A compiled, immutable resolution program.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub(crate) symbols: Vec<Symbol>,
    pub(crate) root: SymbolId,
}

impl Program {
    /// The entry symbol.
    pub fn root(&self) -> SymbolId {
        self.root
    }

    /// Look up a symbol.
    ///
    /// # Panics
    /// Panics if `id` was not produced by this program.
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    /// Look up a symbol, returning `None` for foreign ids.
    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.index())
    }

    /// The root symbol.
    pub fn root_symbol(&self) -> &Symbol {
        self.symbol(self.root)
    }

    /// Number of symbols in the arena.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the arena is empty. A finished program never is.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Whether any symbol reachable from the root is an error.
    ///
    /// When this is true the writer/reader pair is incompatible and data
    /// should not be decoded with this program.
    pub fn has_errors(&self) -> bool {
        self.reachable().any(|id| self.symbol(id).is_error())
    }

    /// Messages of every reachable error symbol, in discovery order.
    pub fn errors(&self) -> Vec<&str> {
        self.reachable()
            .filter_map(|id| match self.symbol(id) {
                Symbol::Action(Action::Error(message)) => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Depth-first walk over every symbol reachable from the root. Each
    /// symbol is yielded once, so cycles terminate.
    pub fn reachable(&self) -> Reachable<'_> {
        Reachable {
            program: self,
            stack: vec![self.root],
            visited: HashSet::new(),
        }
    }
}

/// Iterator over the reachable symbols of a program.
pub struct Reachable<'p> {
    program: &'p Program,
    stack: Vec<SymbolId>,
    visited: HashSet<SymbolId>,
}

impl Iterator for Reachable<'_> {
    type Item = SymbolId;

    fn next(&mut self) -> Option<SymbolId> {
        while let Some(id) = self.stack.pop() {
            if !self.visited.insert(id) {
                continue;
            }
            let children = self.program.symbol(id).children();
            self.stack.extend(children.into_iter().rev());
            return Some(id);
        }
        None
    }
}
