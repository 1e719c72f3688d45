//! Incremental LR parsing over compiled grammars.
//!
//! A [`Language`] is loaded once from a [`LanguageFn`] and shared; a
//! [`Parser`] turns text into an immutable [`Tree`](tessera_tree::Tree),
//! reusing the unchanged parts of a previous tree after edits.

mod language;
mod parser;
mod recovery;
mod reuse;
mod stack;

/// Loading languages.
pub use language::{
    LANGUAGE_VERSION, Language, LanguageDef, LanguageFn, LoadError,
    MIN_COMPATIBLE_LANGUAGE_VERSION, load_language,
};
/// The parser.
pub use parser::Parser;
