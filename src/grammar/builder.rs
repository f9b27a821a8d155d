//! Arena construction for resolution programs.

use std::collections::HashMap;

use crate::error::SchemaError;
use crate::grammar::symbol::{Action, Program, Symbol, SymbolId, Terminal};

/// Accumulates symbols while a program is being compiled.
///
/// Record symbols are reserved before their fields are compiled and
/// filled in afterwards, which is what lets a recursive field refer back
/// to the record being built.
#[derive(Debug, Default)]
pub(crate) struct ProgramBuilder {
    slots: Vec<Option<Symbol>>,
    terminals: HashMap<Terminal, SymbolId>,
}

impl ProgramBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> SymbolId {
        SymbolId(self.slots.len())
    }

    /// Add a finished symbol.
    pub(crate) fn push(&mut self, symbol: Symbol) -> SymbolId {
        let id = self.next_id();
        self.slots.push(Some(symbol));
        id
    }

    /// The shared symbol for a terminal.
    pub(crate) fn terminal(&mut self, terminal: Terminal) -> SymbolId {
        if let Some(id) = self.terminals.get(&terminal) {
            return *id;
        }
        let id = self.push(Symbol::Terminal(terminal));
        self.terminals.insert(terminal, id);
        id
    }

    pub(crate) fn action(&mut self, action: Action) -> SymbolId {
        self.push(Symbol::Action(action))
    }

    pub(crate) fn error(&mut self, message: String) -> SymbolId {
        self.action(Action::Error(message))
    }

    /// Reserve a slot to be filled later.
    pub(crate) fn reserve(&mut self) -> SymbolId {
        let id = self.next_id();
        self.slots.push(None);
        id
    }

    pub(crate) fn fill(&mut self, id: SymbolId, symbol: Symbol) {
        self.slots[id.index()] = Some(symbol);
    }

    /// The symbol at `id`, or `None` while its slot is still reserved.
    pub(crate) fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Whether `id` is an error, or a sequence with an error among its
    /// immediate children. Reserved slots count as error free.
    ///
    /// A record that cannot be resolved is either an error itself or
    /// carries the error of one of its fields directly, so this is enough
    /// for union branch selection.
    pub(crate) fn has_match_error(&self, id: SymbolId) -> bool {
        match self.get(id) {
            Some(Symbol::Action(Action::Error(_))) => true,
            Some(Symbol::Sequence(children)) => children
                .iter()
                .any(|c| self.get(*c).is_some_and(Symbol::is_error)),
            _ => false,
        }
    }

    pub(crate) fn finish(self, root: SymbolId) -> Result<Program, SchemaError> {
        let symbols = self
            .slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.ok_or_else(|| {
                    SchemaError::Internal(format!("symbol #{} was reserved but never filled", i))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Program { symbols, root })
    }
}
