//! The MiniZinc modelling language.
//!
//! [`LANGUAGE`] is the handle to pass to
//! [`load_language`](tessera_parse::load_language); [`language`] returns a
//! copy loaded once per process.

pub mod ast;
mod grammar;
mod scanner;
#[cfg(test)]
mod tests;

use std::sync::LazyLock;

use tessera_parse::{Language, LanguageDef, LanguageFn, load_language};

/// The grammar definition.
pub use grammar::{grammar, infix_precedence};
/// The external scanner for strings.
pub use scanner::StringScanner;

pub const LANGUAGE: LanguageFn = LanguageFn::from_raw(definition);

fn definition() -> LanguageDef {
    LanguageDef::new(grammar()).with_scanner(StringScanner)
}

static LOADED: LazyLock<Option<Language>> = LazyLock::new(|| load_language(LANGUAGE));

pub fn language() -> Option<Language> {
    LOADED.clone()
}
