//! Resolving grammars: the program model and its compiler.

mod builder;
mod config;
mod generator;
mod symbol;

pub use config::GrammarConfig;
pub use generator::{compile, compile_validating, ResolvingGrammarGenerator};
pub use symbol::{
    Action, Branch, EnumAdjust, Program, Reachable, ReorderedField, Symbol, SymbolId, Terminal,
};
