use expect_test::{Expect, expect};
use tessera_parse::{Parser, load_language};
use tessera_tree::Tree;

use crate::ast::{Domain, Expression, Item, SourceFile, Strategy};
use crate::{LANGUAGE, language};

const MAGIC_SQUARE: &str = r#"language ESSENCE' 1.0
$ every row, column and diagonal adds up to the same number
given n : int(1..)
letting N be n * n
letting RANGE be domain int(1..N)
find square : matrix indexed by [int(1..n), int(1..n)] of RANGE
such that
    allDiff(flatten(square)),
    forAll i : int(1..n) . sum([ square[i, j] | j : int(1..n) ]) = n * (N + 1) / 2,
    sum k : int(1..n) . square[k, k] = n * (N + 1) / 2
heuristic sdf
"#;

fn parse(text: &str) -> Tree {
    Parser::new(language().unwrap()).parse(text, None, &[])
}

fn check(text: &str, expect: Expect) {
    expect.assert_eq(&parse(text).to_sexp());
}

#[test]
fn can_load_grammar() {
    assert!(load_language(LANGUAGE).is_some(), "Error loading Eprime grammar");
}

#[test]
fn declarations() {
    check(
        "language ESSENCE' 1.3\ngiven n : int(1..10)\nfind x : int(1..n)\nsuch that x > 2\n",
        expect![[
            r#"(source_file lang_version: (lang_version) item: (param_decl name: (identifier) domain: (integer_domain member: (set_constructor left: (integer_literal) right: (integer_literal)))) item: (decision_decl name: (identifier) domain: (integer_domain member: (set_constructor left: (integer_literal) right: (identifier)))) item: (constraint expression: (infix_operator left: (identifier) right: (integer_literal))))"#
        ]],
    );
}

#[test]
fn header_is_lexed_token_by_token() {
    let text = "language  ESSENCE’\t1.3\n";
    let tree = parse(text);
    assert!(!tree.has_error(), "{}", tree.to_sexp());

    let header = tree.root_node().child_by_field_name("lang_version").unwrap();
    let header = header.as_node().unwrap();
    let kinds = header.children().map(|child| child.kind_name()).collect::<Vec<_>>();
    assert_eq!(kinds.len(), 4);
    assert_eq!(kinds[..3], ["language", "ESSENCE", "’"]);
    let version = header.child_by_field_name("version").unwrap();
    assert_eq!(version.utf8_text(text), "1.3");
}

#[test]
fn quantification() {
    check(
        "such that forAll i, j : D . i != j",
        expect![[
            r#"(source_file item: (constraint expression: (quantification function: (identifier) generator: (generator name: (identifier) name: (identifier) collection: (identifier)) template: (infix_operator left: (identifier) right: (identifier)))))"#
        ]],
    );
}

#[test]
fn comprehension_with_condition() {
    check(
        "letting s be sum([ x[i] | i : int(1..3), i > 1 ])",
        expect![[
            r#"(source_file item: (const_def name: (identifier) definition: (call function: (identifier) argument: (matrix_comprehension template: (indexed_access collection: (identifier) index: (identifier)) generator: (generator name: (identifier) collection: (integer_domain member: (set_constructor left: (integer_literal) right: (integer_literal)))) condition: (infix_operator left: (identifier) right: (integer_literal))))))"#
        ]],
    );
}

#[test]
fn power_groups_to_the_right() {
    check(
        "letting p = 2 ** 3 ** 2",
        expect![[
            r#"(source_file item: (const_def name: (identifier) definition: (infix_operator left: (integer_literal) right: (infix_operator left: (integer_literal) right: (integer_literal)))))"#
        ]],
    );
}

#[test]
fn absolute_value() {
    check(
        "minimising |x - 3|",
        expect![[
            r#"(source_file item: (objective objective_expr: (absolute_operator operand: (infix_operator left: (identifier) right: (integer_literal)))))"#
        ]],
    );
}

#[test]
fn whole_model() {
    let tree = parse(MAGIC_SQUARE);
    assert!(!tree.has_error(), "{}", tree.to_sexp());
    assert_eq!(tree.root_node().named_child_count(), 7);
}

#[test]
fn domains_and_trailing_items() {
    let tree = parse(
        "letting D be domain int(1..3)\nfind m : matrix indexed by [D, D] of bool\nbranching on [m]\nheuristic static\nshowing m\n",
    );
    assert!(!tree.has_error(), "{}", tree.to_sexp());
    assert_eq!(tree.root_node().named_child_count(), 5);
}

#[test]
fn incomplete_constraint() {
    assert!(parse("such that x >").has_error());
}

#[test]
fn typed_model() {
    let tree = parse(MAGIC_SQUARE);
    let file = SourceFile::new(&tree).unwrap();
    assert_eq!(file.lang_version().and_then(|header| header.version(MAGIC_SQUARE)), Some("1.0"));
    let items = file.items().collect::<Vec<_>>();
    assert_eq!(items.len(), 6);

    let Item::ParamDecl(given) = &items[0] else { panic!("expected `given`, got {:?}", items[0]) };
    let names = given.names().map(|name| name.text(MAGIC_SQUARE)).collect::<Vec<_>>();
    assert_eq!(names, ["n"]);
    let Some(Domain::IntegerDomain(int)) = given.domain() else { panic!("expected an integer domain") };
    let members = int.members().collect::<Vec<_>>();
    let [Expression::UnarySetConstructor(from)] = &members[..] else { panic!("expected `1..`, got {members:?}") };
    assert_eq!(from.operator(), Some(".."));
    assert!(matches!(from.operand(), Some(Expression::IntegerLiteral(one)) if one.text(MAGIC_SQUARE) == "1"));

    let Item::ConstDef(letting) = &items[1] else { panic!("expected `letting`, got {:?}", items[1]) };
    assert_eq!(letting.name().unwrap().text(MAGIC_SQUARE), "N");
    assert!(letting.domain().is_none());
    assert!(matches!(letting.definition(), Some(Expression::InfixOperator(product)) if product.operator() == Some("*")));

    let Item::DomainAlias(alias) = &items[2] else { panic!("expected a domain alias, got {:?}", items[2]) };
    assert_eq!(alias.name().unwrap().text(MAGIC_SQUARE), "RANGE");
    assert!(matches!(alias.definition(), Some(Domain::IntegerDomain(_))));

    let Item::DecisionDecl(find) = &items[3] else { panic!("expected `find`, got {:?}", items[3]) };
    let Some(Domain::MatrixDomain(matrix)) = find.domain() else { panic!("expected a matrix domain") };
    assert_eq!(matrix.indices().count(), 2);
    assert!(matches!(matrix.base(), Some(Domain::Identifier(range)) if range.text(MAGIC_SQUARE) == "RANGE"));

    let Item::Constraint(such_that) = &items[4] else { panic!("expected `such that`, got {:?}", items[4]) };
    let constraints = such_that.expressions().collect::<Vec<_>>();
    assert_eq!(constraints.len(), 3);
    let Expression::Call(all_diff) = &constraints[0] else { panic!("expected a call, got {:?}", constraints[0]) };
    assert_eq!(all_diff.function().unwrap().text(MAGIC_SQUARE), "allDiff");
    assert!(matches!(all_diff.arguments().next(), Some(Expression::Call(_))));

    let Expression::Quantification(for_all) = &constraints[1] else {
        panic!("expected a quantification, got {:?}", constraints[1])
    };
    assert_eq!(for_all.function().unwrap().text(MAGIC_SQUARE), "forAll");
    let generator = for_all.generator().unwrap();
    assert_eq!(generator.names().map(|name| name.text(MAGIC_SQUARE)).collect::<Vec<_>>(), ["i"]);
    assert!(matches!(generator.collection(), Some(Domain::IntegerDomain(_))));
    assert!(matches!(for_all.template(), Some(Expression::InfixOperator(equals)) if equals.operator() == Some("=")));

    let Item::Heuristic(heuristic) = &items[5] else { panic!("expected a heuristic, got {:?}", items[5]) };
    assert_eq!(heuristic.name(), Some("sdf"));
}

#[test]
fn typed_trailing_items() {
    let text = "find m : matrix indexed by [int(1..2)] of bool\nbranching on [m]\nminimising sum(m)\nshowing m[1]\n";
    let tree = parse(text);
    assert!(!tree.has_error(), "{}", tree.to_sexp());
    let file = SourceFile::new(&tree).unwrap();
    assert!(file.lang_version().is_none());
    let items = file.items().collect::<Vec<_>>();

    let Item::DecisionDecl(find) = &items[0] else { panic!("expected `find`, got {:?}", items[0]) };
    let Some(Domain::MatrixDomain(matrix)) = find.domain() else { panic!("expected a matrix domain") };
    assert!(matches!(matrix.base(), Some(Domain::BooleanDomain(_))));

    let Item::Branching(branching) = &items[1] else { panic!("expected `branching`, got {:?}", items[1]) };
    assert_eq!(branching.variables().unwrap().members().count(), 1);

    let Item::Objective(objective) = &items[2] else { panic!("expected an objective, got {:?}", items[2]) };
    assert_eq!(objective.strategy(), Some(Strategy::Minimising));
    assert!(matches!(objective.expression(), Some(Expression::Call(_))));

    let Item::Output(output) = &items[3] else { panic!("expected `showing`, got {:?}", items[3]) };
    let Some(Expression::IndexedAccess(access)) = output.expression() else { panic!("expected an indexed access") };
    let indices = access.indices().collect::<Vec<_>>();
    assert!(matches!(&indices[..], [Some(Expression::IntegerLiteral(_))]));
}
