//! Grammar symbols, fields, parse states and the per-language symbol table.

use std::fmt;
use std::num::NonZeroU16;

/// A grammar symbol: a terminal, an external token or a non-terminal.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u16);

impl Symbol {
    /// End of input.
    pub const END: Self = Self(0);
    /// Builtin kind of error nodes and unrecognised characters.
    pub const ERROR: Self = Self(u16::MAX);

    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::END => f.write_str("Symbol(END)"),
            Self::ERROR => f.write_str("Symbol(ERROR)"),
            Self(raw) => write!(f, "Symbol({raw})"),
        }
    }
}

/// Identifies the role of a child within its parent (`left`, `operator`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldId(NonZeroU16);

impl FieldId {
    pub const fn new(raw: u16) -> Option<Self> {
        match NonZeroU16::new(raw) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }

    pub const fn raw(self) -> u16 {
        self.0.get()
    }
}

/// A state of the LR automaton.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(u32);

impl StateId {
    pub const START: Self = Self(0);

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// Produced by the lexical table.
    Terminal,
    /// Produced by an external scanner.
    External,
    /// Whitespace, comments and other extras that become trivia.
    Trivia,
    NonTerminal,
    /// Introduced while normalising `repeat` rules.
    Auxiliary,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SymbolMetadata {
    pub name: Box<str>,
    pub kind: SymbolKind,
    pub named: bool,
    pub visible: bool,
}

impl SymbolMetadata {
    pub fn new(name: impl Into<Box<str>>, kind: SymbolKind, named: bool, visible: bool) -> Self {
        Self { name: name.into(), kind, named, visible }
    }
}

/// Names and properties of every symbol and field of one language.
///
/// Terminals (including external and trivia tokens) occupy the indices
/// `0..terminal_count`; non-terminals follow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolTable {
    language: Box<str>,
    symbols: Vec<SymbolMetadata>,
    fields: Vec<Box<str>>,
    terminal_count: usize,
    error: SymbolMetadata,
}

impl SymbolTable {
    pub fn new(
        language: impl Into<Box<str>>,
        symbols: Vec<SymbolMetadata>,
        fields: Vec<Box<str>>,
        terminal_count: usize,
    ) -> Self {
        debug_assert!(terminal_count <= symbols.len());
        debug_assert!(symbols.len() < u16::MAX as usize);
        let error = SymbolMetadata::new("ERROR", SymbolKind::Terminal, true, true);
        Self { language: language.into(), symbols, fields, terminal_count, error }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Number of symbols, excluding the builtin `ERROR`.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn terminal_count(&self) -> usize {
        self.terminal_count
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn is_terminal(&self, symbol: Symbol) -> bool {
        symbol == Symbol::ERROR || symbol.index() < self.terminal_count
    }

    pub fn metadata(&self, symbol: Symbol) -> &SymbolMetadata {
        if symbol == Symbol::ERROR {
            return &self.error;
        }
        &self.symbols[symbol.index()]
    }

    pub fn name(&self, symbol: Symbol) -> &str {
        &self.metadata(symbol).name
    }

    pub fn is_named(&self, symbol: Symbol) -> bool {
        self.metadata(symbol).named
    }

    pub fn is_visible(&self, symbol: Symbol) -> bool {
        self.metadata(symbol).visible
    }

    pub fn symbol_for_name(&self, name: &str, named: bool) -> Option<Symbol> {
        if named && name == "ERROR" {
            return Some(Symbol::ERROR);
        }
        self.symbols
            .iter()
            .position(|meta| meta.named == named && &*meta.name == name)
            .map(|index| Symbol::new(index as u16))
    }

    pub fn field_name(&self, field: FieldId) -> &str {
        &self.fields[field.raw() as usize - 1]
    }

    pub fn field_id(&self, name: &str) -> Option<FieldId> {
        let index = self.fields.iter().position(|field| &**field == name)?;
        FieldId::new(index as u16 + 1)
    }

    pub fn symbols(&self) -> impl Iterator<Item = (Symbol, &SymbolMetadata)> {
        self.symbols.iter().enumerate().map(|(index, meta)| (Symbol::new(index as u16), meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SymbolTable {
        SymbolTable::new(
            "toy",
            vec![
                SymbolMetadata::new("end", SymbolKind::Terminal, false, false),
                SymbolMetadata::new("identifier", SymbolKind::Terminal, true, true),
                SymbolMetadata::new("=", SymbolKind::Terminal, false, true),
                SymbolMetadata::new("assignment", SymbolKind::NonTerminal, true, true),
            ],
            vec!["name".into(), "value".into()],
            3,
        )
    }

    #[test]
    fn lookups() {
        let table = table();

        assert_eq!(table.symbol_for_name("identifier", true), Some(Symbol::new(1)));
        assert_eq!(table.symbol_for_name("identifier", false), None);
        assert_eq!(table.symbol_for_name("=", false), Some(Symbol::new(2)));
        assert_eq!(table.name(Symbol::ERROR), "ERROR");
        assert!(table.is_named(Symbol::ERROR));
        assert!(table.is_terminal(Symbol::new(2)));
        assert!(!table.is_terminal(Symbol::new(3)));

        let value = table.field_id("value").unwrap();
        assert_eq!(table.field_name(value), "value");
        assert_eq!(table.field_id("missing"), None);
    }
}
