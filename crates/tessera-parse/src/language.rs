use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tessera_grammar::{CompiledGrammar, Grammar, GrammarError};
use tessera_lexer::ExternalScanner;
use tessera_tree::{Symbol, SymbolTable};

/// Table format produced by this version of the runtime.
pub const LANGUAGE_VERSION: u32 = 14;
/// Oldest table format the runtime still reads.
pub const MIN_COMPATIBLE_LANGUAGE_VERSION: u32 = 13;

/// The uncompiled form of a language, as returned by a [`LanguageFn`].
pub struct LanguageDef {
    pub abi_version: u32,
    pub grammar: Grammar,
    pub scanner: Option<Arc<dyn ExternalScanner>>,
}

impl LanguageDef {
    pub fn new(grammar: Grammar) -> Self {
        Self { abi_version: LANGUAGE_VERSION, grammar, scanner: None }
    }

    #[must_use]
    pub fn with_scanner(mut self, scanner: impl ExternalScanner) -> Self {
        self.scanner = Some(Arc::new(scanner));
        self
    }
}

/// Entry point a language crate exports.
#[derive(Clone, Copy)]
pub struct LanguageFn(fn() -> LanguageDef);

impl LanguageFn {
    pub const fn from_raw(f: fn() -> LanguageDef) -> Self {
        Self(f)
    }

    pub const fn into_raw(self) -> fn() -> LanguageDef {
        self.0
    }
}

impl fmt::Debug for LanguageFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LanguageFn")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("language `{name}` has unsupported table version {version}")]
    IncompatibleVersion { name: String, version: u32 },
    #[error("grammar `{name}` failed to compile")]
    Grammar {
        name: String,
        #[source]
        source: GrammarError,
    },
}

/// A compiled language, shared by every parser and tree that uses it.
///
/// Cloning is cheap; two values compare equal when they come from the same
/// load.
#[derive(Clone)]
pub struct Language(Arc<LanguageData>);

struct LanguageData {
    abi_version: u32,
    grammar: CompiledGrammar,
    scanner: Option<Arc<dyn ExternalScanner>>,
}

impl Language {
    pub fn try_load(handle: LanguageFn) -> Result<Self, LoadError> {
        let def = (handle.into_raw())();
        let name = def.grammar.name.clone();

        if !(MIN_COMPATIBLE_LANGUAGE_VERSION..=LANGUAGE_VERSION).contains(&def.abi_version) {
            return Err(LoadError::IncompatibleVersion { name, version: def.abi_version });
        }

        let grammar = tessera_grammar::compile(&def.grammar)
            .map_err(|source| LoadError::Grammar { name, source })?;
        Ok(Self(Arc::new(LanguageData {
            abi_version: def.abi_version,
            grammar,
            scanner: def.scanner,
        })))
    }

    pub fn name(&self) -> &str {
        self.symbols().language()
    }

    pub fn abi_version(&self) -> u32 {
        self.0.abi_version
    }

    pub fn symbols(&self) -> &Arc<SymbolTable> {
        self.0.grammar.symbols()
    }

    pub fn grammar(&self) -> &CompiledGrammar {
        &self.0.grammar
    }

    pub fn scanner(&self) -> Option<&dyn ExternalScanner> {
        self.0.scanner.as_deref()
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols().len()
    }

    pub fn field_count(&self) -> usize {
        self.symbols().field_count()
    }

    pub fn symbol_for_name(&self, name: &str, named: bool) -> Option<Symbol> {
        self.symbols().symbol_for_name(name, named)
    }

    pub fn symbol_name(&self, symbol: Symbol) -> &str {
        self.symbols().name(symbol)
    }
}

impl PartialEq for Language {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Language {}

impl Hash for Language {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Language")
            .field("name", &self.name())
            .field("abi_version", &self.abi_version())
            .field("symbols", &self.symbol_count())
            .finish_non_exhaustive()
    }
}

/// Loads the language behind `handle`, or `None` when its tables are not
/// usable by this runtime.
pub fn load_language(handle: LanguageFn) -> Option<Language> {
    match Language::try_load(handle) {
        Ok(language) => Some(language),
        Err(error) => {
            tracing::warn!(%error, "rejected language");
            None
        }
    }
}
