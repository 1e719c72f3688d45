use tessera_grammar::{
    CharClass, Grammar, Rule, choice, class, field, lit, optional, prec, prec_left, prec_right,
    repeat, repeat1, sep_by, sep_by1, seq, sym, token,
};

const PREC_NOT: i32 = 20;
const PREC_ABSOLUTE: i32 = 20;
const PREC_POWER: i32 = 18;
const PREC_NEGATION: i32 = 15;
const PREC_MULTIPLICATIVE: i32 = 10;
const PREC_INTERSECT: i32 = 2;
const PREC_ADDITIVE: i32 = 1;
const PREC_UNION: i32 = 1;
const PREC_RANGE: i32 = 0;
const PREC_SET_IN: i32 = 0;
const PREC_COMPARATIVE: i32 = -1;
const PREC_CONJUNCTION: i32 = -2;
const PREC_DISJUNCTION: i32 = -3;
const PREC_IMPLICATION: i32 = -4;
const PREC_EQUIVALENCE: i32 = -5;
const PREC_QUANTIFIERS: i32 = -10;

const PREC_POSTFIX: i32 = PREC_NOT + 1;

const COMPARISON_OPERATORS: &[&str] =
    &["=", "!=", "<", "<=", ">", ">=", "<lex", "<=lex", ">=lex", ">lex"];

fn expression() -> Rule {
    sym("_expression")
}

fn identifier() -> Rule {
    sym("identifier")
}

fn base_domain() -> Rule {
    sym("_base_domain")
}

fn names() -> Rule {
    sep_by1(",", field("name", identifier()))
}

fn binary(operator: Rule, operand: fn() -> Rule) -> Rule {
    seq![field("left", operand()), field("operator", operator), field("right", operand())]
}

fn digits() -> Rule {
    repeat1(class(CharClass::digit()))
}

pub fn grammar() -> Grammar {
    Grammar::builder("eprime")
        .rule(
            "source_file",
            seq![
                optional(field("lang_version", sym("lang_version"))),
                repeat(field(
                    "item",
                    choice![
                        sym("param_decl"),
                        sym("const_def"),
                        sym("domain_alias"),
                        sym("decision_decl"),
                        sym("objective"),
                        sym("branching"),
                        sym("heuristic"),
                        sym("constraint"),
                        sym("output"),
                    ],
                )),
            ],
        )
        .rule(
            "lang_version",
            seq![
                "language",
                "ESSENCE",
                choice!["'", "’"],
                field("version", token(seq![digits(), ".", digits()])),
            ],
        )
        .rule(
            "param_decl",
            seq![
                "given",
                names(),
                ":",
                field("domain", sym("_domain")),
                repeat(seq!["where", field("where", expression())]),
            ],
        )
        .rule(
            "const_def",
            seq![
                "letting",
                field("name", identifier()),
                optional(seq![":", field("domain", sym("_domain"))]),
                choice!["=", "be"],
                field("definition", expression()),
            ],
        )
        .rule(
            "domain_alias",
            seq!["letting", field("name", identifier()), "be", "domain", field("definition", sym("_domain"))],
        )
        .rule("decision_decl", seq!["find", names(), ":", field("domain", sym("_domain"))])
        .rule(
            "objective",
            seq![
                field("strategy", choice!["maximising", "minimising"]),
                field("objective_expr", expression()),
            ],
        )
        .rule("branching", seq!["branching", "on", field("branching_array", sym("matrix_literal"))])
        .rule(
            "heuristic",
            seq![
                "heuristic",
                optional(field("heuristic", choice!["static", "sdf", "srf", "conflict"])),
            ],
        )
        .rule("constraint", seq!["such", "that", sep_by1(",", field("expression", expression()))])
        .rule("output", seq!["showing", field("expression", expression())])
        // Declared before `_expression`: in `[e | i : D, j, k : D]` a name
        // followed by `,` continues a generator rather than ending a condition.
        .rule("generator", seq![names(), ":", field("collection", sym("_domain"))])
        // Expressions
        .rule(
            "_expression",
            choice![
                sym("boolean_literal"),
                sym("integer_literal"),
                sym("string_literal"),
                sym("infinity"),
                sym("matrix_literal"),
                sym("call"),
                identifier(),
                sym("indexed_access"),
                sym("infix_operator"),
                sym("prefix_operator"),
                sym("unary_set_constructor"),
                sym("quantification"),
                sym("matrix_comprehension"),
                sym("absolute_operator"),
                sym("parenthesised_expression"),
                sym("set_constructor"),
            ],
        )
        .rule("parenthesised_expression", seq!["(", field("expression", expression()), ")"])
        .rule(
            "call",
            prec(
                PREC_POSTFIX,
                seq![
                    field("function", identifier()),
                    "(",
                    sep_by(",", field("argument", expression())),
                    ")",
                ],
            ),
        )
        .rule(
            "quantification",
            prec(
                PREC_QUANTIFIERS,
                seq![
                    field("function", identifier()),
                    field("generator", sym("generator")),
                    ".",
                    field("template", expression()),
                ],
            ),
        )
        .rule(
            "matrix_comprehension",
            seq![
                "[",
                field("template", expression()),
                "|",
                field("generator", sym("generator")),
                repeat(seq![",", field("generator", sym("generator"))]),
                repeat(seq![",", field("condition", expression())]),
                optional(seq![";", field("index", base_domain())]),
                "]",
            ],
        )
        .rule(
            "indexed_access",
            prec(
                PREC_POSTFIX,
                seq![
                    field("collection", expression()),
                    "[",
                    sep_by1(",", field("index", choice![lit(".."), expression()])),
                    "]",
                ],
            ),
        )
        .rule("set_constructor", prec_left(PREC_RANGE, binary(lit(".."), expression)))
        .rule(
            "infix_operator",
            choice![
                prec_right(PREC_POWER, binary(lit("**"), expression)),
                prec_left(PREC_MULTIPLICATIVE, binary(choice!["*", "/", "%"], expression)),
                prec_left(PREC_ADDITIVE, binary(choice!["+", "-"], expression)),
                prec_left(
                    PREC_COMPARATIVE,
                    binary(choice(COMPARISON_OPERATORS.iter().map(|&operator| lit(operator))), expression),
                ),
                prec_left(PREC_CONJUNCTION, binary(lit("/\\"), expression)),
                prec_left(PREC_DISJUNCTION, binary(lit("\\/"), expression)),
                prec_left(PREC_IMPLICATION, binary(choice!["->", "=>"], expression)),
                prec_left(PREC_EQUIVALENCE, binary(choice!["<->", "<=>"], expression)),
                prec_left(PREC_SET_IN, binary(lit("in"), expression)),
            ],
        )
        .rule("absolute_operator", prec(PREC_ABSOLUTE, seq!["|", field("operand", expression()), "|"]))
        .rule(
            "prefix_operator",
            choice![
                prec_left(PREC_NOT, seq![field("operator", lit("!")), field("operand", expression())]),
                prec_left(PREC_NEGATION, seq![field("operator", lit("-")), field("operand", expression())]),
            ],
        )
        .rule(
            "unary_set_constructor",
            choice![
                prec_left(PREC_RANGE, seq![field("operator", lit("..")), field("operand", expression())]),
                prec_right(PREC_RANGE, seq![field("operand", expression()), field("operator", lit(".."))]),
            ],
        )
        // Domains
        .rule("_domain", choice![base_domain(), sym("matrix_domain")])
        .rule(
            "matrix_domain",
            seq![
                "matrix",
                "indexed",
                "by",
                "[",
                sep_by1(",", field("index", base_domain())),
                "]",
                "of",
                field("base", base_domain()),
            ],
        )
        .rule(
            "_base_domain",
            choice![
                sym("boolean_domain"),
                sym("integer_domain"),
                sym("any_domain"),
                sym("domain_operation"),
                identifier(),
            ],
        )
        .rule(
            "domain_operation",
            choice![
                prec_left(PREC_INTERSECT, binary(lit("intersect"), base_domain)),
                prec_left(PREC_UNION, binary(lit("union"), base_domain)),
                prec_left(PREC_ADDITIVE, binary(lit("-"), base_domain)),
            ],
        )
        .rule("boolean_domain", "bool")
        .rule(
            "integer_domain",
            seq!["int", optional(seq!["(", sep_by(",", field("member", expression())), ")"])],
        )
        .rule("any_domain", "any")
        .rule(
            "matrix_literal",
            seq![
                "[",
                sep_by(",", field("member", expression())),
                optional(seq![";", field("index", base_domain())]),
                "]",
            ],
        )
        // Tokens
        .rule("boolean_literal", choice!["true", "false"])
        .rule("integer_literal", digits())
        .rule("infinity", choice!["infinity", "∞"])
        .rule("string_literal", string_literal())
        .rule(
            "identifier",
            seq![
                class(CharClass::new([('a', 'z'), ('A', 'Z')])),
                repeat(class(CharClass::ident_continue())),
            ],
        )
        .rule("line_comment", token(seq!["$", repeat(class(CharClass::chars("\n").negate()))]))
        .extras([token(repeat1(class(CharClass::whitespace()))), sym("line_comment")])
        .build()
}

/// A double-quoted string on a single line, with backslash escapes.
fn string_literal() -> Rule {
    token(seq![
        "\"",
        repeat(choice![
            class(CharClass::chars("\"\\\n").negate()),
            seq!["\\", class(CharClass::chars("\n").negate())],
        ]),
        "\"",
    ])
}
