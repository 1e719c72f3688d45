//! Grammar definitions and the tables compiled from them.
//!
//! A [`Grammar`] is written with the rule builders in this crate and
//! compiled once into a [`CompiledGrammar`]: a symbol table, an LALR(1)
//! [`ParseTable`] and a [`LexTable`] for the lexer.

mod error;
mod grammar;
mod lexical;
mod prepare;
mod rules;
mod table;

use std::sync::Arc;

use tessera_tree::{Symbol, SymbolSet, SymbolTable};

/// Errors found while compiling a grammar.
pub use error::GrammarError;
/// Grammar definition.
pub use grammar::{Grammar, GrammarBuilder};
/// Lexical automaton.
pub use lexical::{LexMode, LexStateId, LexTable, TokenAccept};
/// Rule language.
pub use rules::{
    Assoc, CharClass, Precedence, Rule, blank, choice, class, field, lit, optional, prec,
    prec_left, prec_right, repeat, repeat1, sep_by, sep_by1, seq, sym, token,
};
/// Parse tables.
pub use table::{
    Action, Conflict, ConflictKind, ParseTable, ProductionId, ProductionInfo, Resolution,
};

/// Everything the lexer and parser need to process one language.
#[derive(Debug)]
pub struct CompiledGrammar {
    symbols: Arc<SymbolTable>,
    parse_table: ParseTable,
    lex_table: LexTable,
    externals: Box<[Symbol]>,
    synchronizing: SymbolSet,
}

impl CompiledGrammar {
    pub fn symbols(&self) -> &Arc<SymbolTable> {
        &self.symbols
    }

    pub fn parse_table(&self) -> &ParseTable {
        &self.parse_table
    }

    pub fn lex_table(&self) -> &LexTable {
        &self.lex_table
    }

    /// Symbols of the external tokens, indexed like the grammar's `externals`.
    pub fn externals(&self) -> &[Symbol] {
        &self.externals
    }

    /// Tokens error recovery never skips past.
    pub fn synchronizing(&self) -> &SymbolSet {
        &self.synchronizing
    }
}

#[tracing::instrument(level = "debug", skip_all, fields(grammar = %grammar.name))]
pub fn compile(grammar: &Grammar) -> Result<CompiledGrammar, GrammarError> {
    let prepared = prepare::prepare(grammar)?;
    let lex_table = lexical::build(&prepared.tokens, &prepared.trivia)?;
    let parse_table = table::build(
        &prepared.productions,
        prepared.symbols.terminal_count(),
        prepared.symbols.len(),
    );

    tracing::debug!(
        symbols = prepared.symbols.len(),
        parse_states = parse_table.state_count(),
        lex_states = lex_table.state_count(),
        "compiled grammar"
    );

    Ok(CompiledGrammar {
        symbols: Arc::new(prepared.symbols),
        parse_table,
        lex_table,
        externals: prepared.externals.into(),
        synchronizing: prepared.synchronizing,
    })
}
