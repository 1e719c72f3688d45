//! DataZinc, the data file format of MiniZinc.
//!
//! The grammar extends the MiniZinc one: a file is a list of assignments
//! whose right-hand sides are restricted to literals, calls and a few set and
//! array operators. Numeric literals carry their sign.

#[cfg(test)]
mod tests;

use std::sync::LazyLock;

use tessera_grammar::{Grammar, Rule, choice, field, optional, prec_left, sep_by, seq, sym, token};
use tessera_minizinc::StringScanner;
use tessera_parse::{Language, LanguageDef, LanguageFn, load_language};

const INFIX_OPERATORS: &[(&str, i32)] = &[("..", 10), ("++", 12), ("union", 7), ("∪", 7)];

pub const LANGUAGE: LanguageFn = LanguageFn::from_raw(definition);

fn definition() -> LanguageDef {
    LanguageDef::new(grammar()).with_scanner(StringScanner)
}

static LOADED: LazyLock<Option<Language>> = LazyLock::new(|| load_language(LANGUAGE));

pub fn language() -> Option<Language> {
    LOADED.clone()
}

pub fn grammar() -> Grammar {
    let signed = |number: Rule| token(seq![optional("-"), number]);

    Grammar::extend(&tessera_minizinc::grammar(), "datazinc")
        .rule("source_file", sep_by(";", field("item", sym("assignment"))))
        .rule(
            "_expression",
            choice![
                sym("identifier"),
                sym("absent"),
                sym("array_literal_2d"),
                sym("array_literal"),
                sym("boolean_literal"),
                sym("call"),
                sym("float_literal"),
                sym("infinity"),
                sym("infix_operator"),
                sym("integer_literal"),
                sym("set_literal"),
                sym("string_literal"),
                sym("tuple_literal"),
            ],
        )
        .rule(
            "call",
            seq![
                field("function", sym("identifier")),
                "(",
                sep_by(",", field("argument", sym("_call_arg"))),
                ")",
            ],
        )
        .rule(
            "infix_operator",
            choice(INFIX_OPERATORS.iter().map(|&(operator, precedence)| {
                prec_left(
                    precedence,
                    seq![
                        field("left", sym("_expression")),
                        field("operator", operator),
                        field("right", sym("_expression")),
                    ],
                )
            })),
        )
        .rule_with("float_literal", signed)
        .rule_with("integer_literal", signed)
        .rule_with("infinity", signed)
        .rule(
            "_call_arg",
            choice![
                sym("identifier"),
                sym("call"),
                sym("infix_operator"),
                sym("integer_literal"),
                sym("set_literal"),
            ],
        )
        .build()
}
