use std::fmt::Write as _;

use expect_test::{Expect, expect};
use tessera_grammar::{
    CharClass, CompiledGrammar, Grammar, class, compile, lit, repeat, repeat1, sym, token,
};
use tessera_grammar::{choice, seq};
use tessera_lexer::{ExternalScanner, Lexer, ScanCursor};
use tessera_tree::{ScannerState, Symbol};

struct Strings;

impl ExternalScanner for Strings {
    fn scan(&self, cursor: &mut ScanCursor<'_>, _state: &mut ScannerState) -> Option<usize> {
        if cursor.lookahead() != Some('"') {
            return None;
        }
        cursor.advance();
        while let Some(ch) = cursor.advance() {
            if ch == '"' {
                return Some(0);
            }
        }
        None
    }
}

/// Declines every position, counting the opening parentheses it has seen.
struct ParenCounter;

impl ExternalScanner for ParenCounter {
    fn scan(&self, cursor: &mut ScanCursor<'_>, state: &mut ScannerState) -> Option<usize> {
        if cursor.lookahead() == Some('(') {
            let bytes = state.bytes_mut();
            match bytes.first_mut() {
                Some(depth) => *depth += 1,
                None => bytes.push(1),
            }
        }
        None
    }
}

fn grammar() -> CompiledGrammar {
    let grammar = Grammar::builder("toy")
        .rule("file", repeat(choice![sym("assignment"), sym("group")]))
        .rule("assignment", seq![sym("identifier"), "=", choice![sym("number"), sym("string")], ";"])
        .rule("group", seq!["(", sym("identifier"), ")"])
        .rule(
            "identifier",
            seq([class(CharClass::ident_start()), repeat(class(CharClass::ident_continue()))]),
        )
        .rule("number", repeat1(class(CharClass::digit())))
        .rule("comment", seq([lit("%"), repeat(class(CharClass::chars("\n").negate()))]))
        .extras([token(repeat1(class(CharClass::whitespace()))), sym("comment")])
        .externals(["string"])
        .build();
    compile(&grammar).unwrap()
}

fn check(text: &str, scanner: &dyn ExternalScanner, expect: Expect) {
    let grammar = grammar();
    let symbols = grammar.symbols();

    let mut out = String::new();
    for token in Lexer::new(text, &grammar, Some(scanner)).tokenize() {
        let leading = token
            .leading
            .iter()
            .map(|piece| format!("{} {}", symbols.name(piece.kind), u32::from(piece.len)))
            .collect::<Vec<_>>();
        writeln!(
            out,
            "{} {:?} la={} {:?} {:?}",
            symbols.name(token.kind),
            token.range,
            token.lookahead,
            leading,
            token.scanner_after.as_bytes(),
        )
        .unwrap();
    }
    expect.assert_eq(&out);
}

#[test]
fn tokens_with_trivia_and_external_strings() {
    check(
        "x = 12; % note\ny=\"a b\";?",
        &Strings,
        expect![[r#"
            identifier 0..1 la=1 [] []
            = 2..3 la=1 ["_extras_token1 1"] []
            number 4..6 la=1 ["_extras_token1 1"] []
            ; 6..7 la=1 [] []
            identifier 15..16 la=1 ["_extras_token1 1", "comment 6", "_extras_token1 1"] []
            = 16..17 la=1 [] []
            string 17..22 la=0 [] []
            ; 22..23 la=1 [] []
            ERROR 23..24 la=0 [] []
            end 24..24 la=1 [] []
        "#]],
    );
}

#[test]
fn unterminated_string_is_an_error() {
    check(
        "x=\"ab",
        &Strings,
        expect![[r#"
            identifier 0..1 la=1 [] []
            = 1..2 la=1 [] []
            ERROR 2..3 la=3 [] []
            identifier 3..5 la=1 [] []
            end 5..5 la=1 [] []
        "#]],
    );
}

#[test]
fn scanner_state_survives_declines() {
    check(
        "( (x)",
        &ParenCounter,
        expect![[r#"
            ( 0..1 la=1 [] [1]
            ( 2..3 la=1 ["_extras_token1 1"] [2]
            identifier 3..4 la=1 [] [2]
            ) 4..5 la=1 [] [2]
            end 5..5 la=1 [] [2]
        "#]],
    );
}

#[test]
fn seek_resumes_with_state() {
    let grammar = grammar();
    let mut lexer = Lexer::new("a = 1; b = 2;", &grammar, Some(&Strings));

    lexer.seek(6.into(), ScannerState::from_bytes(&[3]));
    let token = lexer.next_token();

    assert_eq!(grammar.symbols().name(token.kind), "identifier");
    assert_eq!(token.full_start(), 6.into());
    assert_eq!(u32::from(token.range.start()), 7);
    assert_eq!(token.scanner_before.as_bytes(), [3]);
    assert_ne!(token.kind, Symbol::ERROR);
}
