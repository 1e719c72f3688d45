//! The Essence' constraint modelling language.

pub mod ast;
mod grammar;
#[cfg(test)]
mod tests;

use std::sync::LazyLock;

use tessera_parse::{Language, LanguageDef, LanguageFn, load_language};

pub use grammar::grammar;

pub const LANGUAGE: LanguageFn = LanguageFn::from_raw(definition);

fn definition() -> LanguageDef {
    LanguageDef::new(grammar())
}

static LOADED: LazyLock<Option<Language>> = LazyLock::new(|| load_language(LANGUAGE));

pub fn language() -> Option<Language> {
    LOADED.clone()
}
