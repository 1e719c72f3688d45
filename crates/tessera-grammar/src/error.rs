use thiserror::Error;

/// Why a grammar could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("grammar `{0}` has no rules")]
    NoRules(String),
    #[error("rule `{rule}` refers to undefined symbol `{name}`")]
    UndefinedSymbol { rule: String, name: String },
    #[error("token `{rule}` refers to non-lexical rule `{name}`")]
    NonLexicalSymbol { rule: String, name: String },
    #[error("token `{0}` matches the empty string")]
    EmptyToken(String),
    #[error("synchronizing token `{0}` is not a token of the grammar")]
    UnknownSynchronizingToken(String),
    #[error("grammar defines {0} symbols, more than a table can address")]
    TooManySymbols(usize),
}
