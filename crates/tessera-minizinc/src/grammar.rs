use tessera_grammar::{
    Assoc, CharClass, Grammar, Precedence, Rule, choice, class, field, lit, optional, prec,
    prec_left, repeat, repeat1, sep_by, sep_by1, seq, sym, token,
};

use crate::scanner::StringToken;

const PREC_POSTFIX: i32 = 15;
const PREC_UNARY: i32 = 14;
const PREC_ANNOTATION: i32 = 13;

/// Binary operators and their binding strength. All of them group to the left.
const INFIX_OPERATORS: &[(&str, i32)] = &[
    ("<->", 1),
    ("->", 2),
    ("<-", 2),
    ("\\/", 1),
    ("xor", 2),
    ("/\\", 3),
    ("=", 4),
    ("==", 4),
    ("!=", 4),
    ("<", 4),
    ("<=", 4),
    (">", 4),
    (">=", 4),
    ("in", 4),
    ("subset", 4),
    ("superset", 4),
    ("union", 5),
    ("diff", 6),
    ("symdiff", 7),
    ("..", 8),
    ("intersect", 9),
    ("+", 10),
    ("-", 10),
    ("++", 10),
    ("*", 11),
    ("/", 11),
    ("div", 11),
    ("mod", 11),
    ("^", 12),
];

/// Precedence of a binary operator, as the parser resolves it.
pub fn infix_precedence(operator: &str) -> Option<Precedence> {
    INFIX_OPERATORS
        .iter()
        .find(|&&(name, _)| name == operator)
        .map(|&(_, value)| Precedence::new(value, Assoc::Left))
}

fn expression() -> Rule {
    sym("_expression")
}

fn identifier() -> Rule {
    sym("identifier")
}

fn annotations() -> Rule {
    repeat(seq!["::", field("annotation", sym("_annotation"))])
}

fn parameters() -> Rule {
    seq!["(", sep_by(",", field("parameter", sym("parameter"))), ")"]
}

fn definition(name: &str) -> Rule {
    optional(seq!["=", field(name, expression())])
}

fn var_par() -> Rule {
    optional(field("var_par", choice!["var", "par"]))
}

fn digits() -> Rule {
    repeat1(class(CharClass::digit()))
}

pub fn grammar() -> Grammar {
    Grammar::builder("minizinc")
        .rule("source_file", sep_by(";", field("item", sym("_item"))))
        .rule(
            "_item",
            choice![
                sym("include"),
                sym("assignment"),
                sym("declaration"),
                sym("constraint"),
                sym("enumeration"),
                sym("goal"),
                sym("output"),
                sym("predicate"),
                sym("function_item"),
            ],
        )
        .rule("include", seq!["include", field("file", sym("string_literal"))])
        .rule("assignment", seq![field("name", identifier()), "=", field("definition", expression())])
        .rule(
            "declaration",
            seq![
                field("type", sym("_type")),
                ":",
                field("name", identifier()),
                annotations(),
                definition("definition"),
            ],
        )
        .rule("constraint", seq!["constraint", field("expression", expression())])
        .rule(
            "enumeration",
            seq![
                "enum",
                field("name", identifier()),
                annotations(),
                optional(seq!["=", field("case", sym("enumeration_members"))]),
            ],
        )
        .rule("enumeration_members", seq!["{", sep_by(",", field("member", identifier())), "}"])
        .rule(
            "goal",
            seq![
                "solve",
                annotations(),
                choice![
                    field("strategy", lit("satisfy")),
                    seq![
                        field("strategy", choice!["minimize", "maximize"]),
                        field("objective", expression()),
                    ],
                ],
            ],
        )
        .rule("output", seq!["output", field("expression", expression())])
        .rule(
            "predicate",
            seq![
                field("type", choice!["predicate", "test"]),
                field("name", identifier()),
                parameters(),
                annotations(),
                definition("body"),
            ],
        )
        .rule(
            "function_item",
            seq![
                "function",
                field("type", sym("_type")),
                ":",
                field("name", identifier()),
                parameters(),
                annotations(),
                definition("body"),
            ],
        )
        .rule("parameter", seq![field("type", sym("_type")), optional(seq![":", field("name", identifier())])])
        .rule("_annotation", choice![identifier(), sym("call")])
        // Types
        .rule("_type", choice![sym("type_base"), sym("set_type"), sym("array_type")])
        .rule(
            "type_base",
            seq![
                var_par(),
                optional(field("opt", lit("opt"))),
                field("domain", choice![sym("primitive_type"), expression()]),
            ],
        )
        .rule("set_type", seq![var_par(), "set", "of", field("type", sym("type_base"))])
        .rule(
            "array_type",
            seq![
                "array",
                "[",
                sep_by1(",", field("dimension", sym("type_base"))),
                "]",
                "of",
                field("type", sym("_type")),
            ],
        )
        .rule("primitive_type", choice!["int", "float", "bool", "string", "ann"])
        // Expressions
        .rule(
            "_expression",
            choice![
                identifier(),
                sym("_literal"),
                sym("call"),
                sym("generator_call"),
                sym("indexed_access"),
                sym("infix_operator"),
                sym("prefix_operator"),
                sym("annotated_expression"),
                sym("if_then_else"),
                sym("let_expression"),
                sym("parenthesised_expression"),
                sym("tuple_literal"),
                sym("array_literal"),
                sym("array_literal_2d"),
                sym("array_comprehension"),
                sym("set_literal"),
                sym("set_comprehension"),
                sym("string_interpolation"),
            ],
        )
        .rule(
            "_literal",
            choice![
                sym("absent"),
                sym("boolean_literal"),
                sym("float_literal"),
                sym("integer_literal"),
                sym("infinity"),
                sym("string_literal"),
                sym("anonymous"),
            ],
        )
        .rule(
            "call",
            seq![
                field("function", identifier()),
                "(",
                optional(field("argument", sym("_arguments"))),
                ")",
            ],
        )
        // A call followed by a parenthesised template. Generators are parsed
        // as ordinary `in` expressions; only a `)(` tells the two apart.
        .rule(
            "generator_call",
            seq![
                field("function", identifier()),
                "(",
                field("generator", sym("_arguments")),
                ")",
                "(",
                field("template", expression()),
                ")",
            ],
        )
        .rule("_arguments", sep_by1(",", choice![expression(), sym("generator")]))
        .rule("generator", seq![field("source", expression()), "where", field("where", expression())])
        .rule(
            "indexed_access",
            prec(
                PREC_POSTFIX,
                seq![
                    field("collection", expression()),
                    "[",
                    sep_by1(",", field("index", expression())),
                    "]",
                ],
            ),
        )
        .rule(
            "infix_operator",
            choice(INFIX_OPERATORS.iter().map(|&(operator, precedence)| {
                prec_left(
                    precedence,
                    seq![
                        field("left", expression()),
                        field("operator", lit(operator)),
                        field("right", expression()),
                    ],
                )
            })),
        )
        .rule(
            "prefix_operator",
            prec(
                PREC_UNARY,
                seq![
                    field("operator", choice!["-", "not", "¬"]),
                    field("operand", expression()),
                ],
            ),
        )
        .rule(
            "annotated_expression",
            prec_left(
                PREC_ANNOTATION,
                seq![
                    field("expression", expression()),
                    "::",
                    field("annotation", sym("_annotation")),
                ],
            ),
        )
        .rule(
            "if_then_else",
            seq![
                "if",
                field("condition", expression()),
                "then",
                field("result", expression()),
                repeat(seq![
                    "elseif",
                    field("condition", expression()),
                    "then",
                    field("result", expression()),
                ]),
                optional(seq!["else", field("else", expression())]),
                "endif",
            ],
        )
        .rule(
            "let_expression",
            seq![
                "let",
                "{",
                optional(seq![
                    field("item", sym("_let_item")),
                    repeat(seq![choice![",", ";"], field("item", sym("_let_item"))]),
                    optional(choice![",", ";"]),
                ]),
                "}",
                "in",
                field("in", expression()),
            ],
        )
        .rule("_let_item", choice![sym("declaration"), sym("constraint")])
        .rule("parenthesised_expression", seq!["(", field("expression", expression()), ")"])
        .rule(
            "tuple_literal",
            seq![
                "(",
                field("member", expression()),
                ",",
                optional(sep_by1(",", field("member", expression()))),
                ")",
            ],
        )
        .rule("array_literal", seq!["[", sep_by(",", field("member", expression())), "]"])
        .rule(
            "array_literal_2d",
            seq!["[|", sep_by("|", field("row", sym("array_literal_2d_row"))), "|]"],
        )
        .rule("array_literal_2d_row", sep_by1(",", field("member", expression())))
        .rule(
            "array_comprehension",
            seq![
                "[",
                field("template", expression()),
                "|",
                field("generator", sym("_arguments")),
                "]",
            ],
        )
        .rule("set_literal", seq!["{", sep_by(",", field("member", expression())), "}"])
        .rule(
            "set_comprehension",
            seq![
                "{",
                field("template", expression()),
                "|",
                field("generator", sym("_arguments")),
                "}",
            ],
        )
        .rule(
            "string_interpolation",
            seq![
                sym(StringToken::Start.name()),
                field("item", expression()),
                repeat(seq![sym(StringToken::Middle.name()), field("item", expression())]),
                sym(StringToken::End.name()),
            ],
        )
        // Tokens
        .rule("absent", "<>")
        .rule("boolean_literal", choice!["true", "false"])
        .rule(
            "float_literal",
            token(choice![
                seq![digits(), ".", digits()],
                seq![
                    digits(),
                    optional(seq![".", digits()]),
                    class(CharClass::chars("eE")),
                    optional(class(CharClass::chars("+-"))),
                    digits(),
                ],
            ]),
        )
        .rule(
            "integer_literal",
            token(choice![
                digits(),
                seq!["0x", repeat1(class(CharClass::hex_digit()))],
                seq!["0b", repeat1(class(CharClass::chars("01")))],
                seq!["0o", repeat1(class(CharClass::range('0', '7')))],
            ]),
        )
        .rule("infinity", choice!["infinity", "∞"])
        .rule("anonymous", "_")
        .rule(
            "identifier",
            seq![
                class(CharClass::new([('a', 'z'), ('A', 'Z')])),
                repeat(class(CharClass::ident_continue())),
            ],
        )
        .rule("line_comment", token(seq!["%", repeat(class(CharClass::chars("\n").negate()))]))
        .rule("block_comment", block_comment())
        .extras([
            token(repeat1(class(CharClass::whitespace()))),
            sym("line_comment"),
            sym("block_comment"),
        ])
        .externals(StringToken::ALL.map(StringToken::name))
        .synchronizing([lit(";")])
        .build()
}

/// `/* ... */`, not nested.
fn block_comment() -> Rule {
    let star = || class(CharClass::chars("*"));
    let not_star = || class(CharClass::chars("*").negate());
    token(seq![
        "/*",
        repeat(not_star()),
        repeat1(star()),
        repeat(seq![class(CharClass::chars("*/").negate()), repeat(not_star()), repeat1(star())]),
        "/",
    ])
}
