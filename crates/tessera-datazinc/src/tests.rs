use expect_test::{Expect, expect};
use tessera_parse::{Parser, load_language};

use crate::{LANGUAGE, language};

fn check(text: &str, expect: Expect) {
    let tree = Parser::new(language().unwrap()).parse(text, None, &[]);
    expect.assert_eq(&tree.to_sexp());
}

#[test]
fn can_load_grammar() {
    assert!(load_language(LANGUAGE).is_some(), "Error loading Datazinc grammar");
}

#[test]
fn signed_literals() {
    check(
        "n = -3; f = -1.5; u = -infinity;",
        expect![[
            r#"(source_file item: (assignment name: (identifier) definition: (integer_literal)) item: (assignment name: (identifier) definition: (float_literal)) item: (assignment name: (identifier) definition: (infinity)))"#
        ]],
    );
}

#[test]
fn call_arguments() {
    check(
        "x = f(1..3, {1});",
        expect![[
            r#"(source_file item: (assignment name: (identifier) definition: (call function: (identifier) argument: (infix_operator left: (integer_literal) right: (integer_literal)) argument: (set_literal member: (integer_literal)))))"#
        ]],
    );
}

#[test]
fn data_file() {
    let text = "n = 3;\nsizes = [1, 2, 3];\ngrid = [| 1, 0 | 0, 1 |];\nnames = {\"a\", \"b\"} union {};\npair = (1, true);\n";
    let tree = Parser::new(language().unwrap()).parse(text, None, &[]);
    assert!(!tree.has_error(), "{}", tree.to_sexp());
    assert_eq!(tree.root_node().named_child_count(), 5);
}

#[test]
fn model_items_are_errors() {
    let tree = Parser::new(language().unwrap()).parse("constraint x > 1;", None, &[]);
    assert!(tree.has_error());
}
