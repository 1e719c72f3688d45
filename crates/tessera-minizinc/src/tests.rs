use expect_test::{Expect, expect};
use tessera_lexer::Lexer;
use tessera_parse::{Parser, load_language};
use tessera_tree::{InputEdit, Tree};
use text_size::TextRange;

use crate::ast::{Argument, Expression, Item, SourceFile, Strategy, Type};
use crate::{LANGUAGE, StringScanner, grammar, infix_precedence, language};

const QUEENS: &str = r#"include "alldifferent.mzn";

% one queen per column
int: n = 8;
array[1..n] of var 1..n: q;

constraint alldifferent(q);
constraint alldifferent([q[i] + i | i in 1..n]);
constraint forall(i, j in 1..n where i < j)(q[i] != q[j]);

solve satisfy;
/* show the rows */
output ["q = \(q)\n"];
"#;

fn parse(text: &str) -> Tree {
    Parser::new(language().unwrap()).parse(text, None, &[])
}

fn check(text: &str, expect: Expect) {
    expect.assert_eq(&parse(text).to_sexp());
}

#[test]
fn can_load_grammar() {
    assert!(load_language(LANGUAGE).is_some(), "Error loading Minizinc grammar");
}

#[test]
fn declaration() {
    check(
        "int: n = 3;",
        expect![[
            r#"(source_file item: (declaration type: (type_base domain: (primitive_type)) name: (identifier) definition: (integer_literal)))"#
        ]],
    );
}

#[test]
fn operator_precedence() {
    check(
        "x = 1 + 2 * 3;",
        expect![[
            r#"(source_file item: (assignment name: (identifier) definition: (infix_operator left: (integer_literal) right: (infix_operator left: (integer_literal) right: (integer_literal)))))"#
        ]],
    );
    assert_eq!(infix_precedence("*").map(|precedence| precedence.value), Some(11));
    assert_eq!(infix_precedence("<->").map(|precedence| precedence.value), Some(1));
    assert_eq!(infix_precedence("**"), None);
}

#[test]
fn generator_call() {
    check(
        "constraint forall(i in 1..n)(x[i] > 0);",
        expect![[
            r#"(source_file item: (constraint expression: (generator_call function: (identifier) generator: (infix_operator left: (identifier) right: (infix_operator left: (integer_literal) right: (identifier))) template: (infix_operator left: (indexed_access collection: (identifier) index: (identifier)) right: (integer_literal)))))"#
        ]],
    );
}

#[test]
fn let_and_if() {
    check(
        "x = let { int: y = 2 } in if y > 1 then y else 0 endif;",
        expect![[
            r#"(source_file item: (assignment name: (identifier) definition: (let_expression item: (declaration type: (type_base domain: (primitive_type)) name: (identifier) definition: (integer_literal)) in: (if_then_else condition: (infix_operator left: (identifier) right: (integer_literal)) result: (identifier) else: (integer_literal)))))"#
        ]],
    );
}

#[test]
fn string_interpolation() {
    check(
        r#"output ["x = \(x)\n"];"#,
        expect![[
            r#"(source_file item: (output expression: (array_literal member: (string_interpolation (string_start) item: (identifier) (string_end)))))"#
        ]],
    );
}

#[test]
fn interpolated_calls_keep_their_parentheses() {
    let grammar = tessera_grammar::compile(&grammar()).unwrap();
    let symbols = grammar.symbols();
    let kinds = Lexer::new(r#""a\(f(x))b""#, &grammar, Some(&StringScanner))
        .tokenize()
        .map(|token| symbols.name(token.kind).to_owned())
        .collect::<Vec<_>>();
    assert_eq!(kinds, ["string_start", "identifier", "(", "identifier", ")", "string_end", "end"]);
}

#[test]
fn deeply_nested_interpolation_resumes_the_string() {
    let grammar = tessera_grammar::compile(&grammar()).unwrap();
    let symbols = grammar.symbols();
    let nested = format!("{}x{}", "(".repeat(300), ")".repeat(300));
    let text = format!(r#""a\({nested})b""#);
    let kinds = Lexer::new(&text, &grammar, Some(&StringScanner))
        .tokenize()
        .map(|token| symbols.name(token.kind).to_owned())
        .collect::<Vec<_>>();

    assert_eq!(kinds.len(), 604);
    assert_eq!(kinds[0], "string_start");
    assert_eq!(kinds[301], "identifier");
    assert_eq!(kinds[602..], ["string_end", "end"]);
    assert_eq!(kinds.iter().filter(|kind| *kind == "(").count(), 300);
    assert_eq!(kinds.iter().filter(|kind| *kind == ")").count(), 300);
}

#[test]
fn whole_model() {
    let tree = parse(QUEENS);
    assert!(!tree.has_error(), "{}", tree.to_sexp());
    assert_eq!(tree.root_node().named_child_count(), 8);
}

#[test]
fn unclosed_bracket_is_contained() {
    let text = "x = [1, 2;\ny = 3;";
    let tree = parse(text);
    assert!(tree.has_error());
    assert_eq!(usize::from(tree.len()), text.len());

    let root = tree.root_node();
    let markers = root
        .descendants()
        .filter(|element| element.is_missing() || element.is_error())
        .map(|element| (element.kind_name(), element.is_missing(), element.text_range()))
        .collect::<Vec<_>>();
    assert_eq!(markers, [("]", true, TextRange::empty(9.into()))]);

    let items = root.named_children().collect::<Vec<_>>();
    assert_eq!(items.len(), 2);
    let second = items[1].as_node().unwrap();
    assert_eq!(second.kind_name(), "assignment");
    assert!(!second.has_error());
    assert_eq!(second.utf8_text(text), "y = 3");
}

#[test]
fn reparse_after_editing_an_interpolation() {
    let mut parser = Parser::new(language().unwrap());
    let old = parser.parse(QUEENS, None, &[]);

    let start = QUEENS.find(r"\(q)").unwrap() + 2;
    let range = TextRange::new((start as u32).into(), (start as u32 + 1).into());
    let (edit, text) = InputEdit::replace(QUEENS, range, "f(q)");

    let reparsed = parser.parse(&text, Some(&old), &[edit]);
    assert_eq!(reparsed, parser.parse(&text, None, &[]));
    assert!(!reparsed.has_error());
}

#[test]
fn typed_items() {
    let tree = parse(QUEENS);
    let file = SourceFile::new(&tree).unwrap();
    let items = file.items().collect::<Vec<_>>();
    assert_eq!(items.len(), 8);

    let Item::Include(include) = &items[0] else { panic!("expected an include, got {:?}", items[0]) };
    assert_eq!(include.file().unwrap().text(QUEENS), r#""alldifferent.mzn""#);

    let Item::Declaration(n) = &items[1] else { panic!("expected a declaration, got {:?}", items[1]) };
    assert_eq!(n.name().unwrap().text(QUEENS), "n");
    let Some(Type::TypeBase(int)) = n.declared_type() else { panic!("expected a base type") };
    assert!(!int.is_var());
    assert_eq!(int.primitive().and_then(|primitive| primitive.name()), Some("int"));
    assert!(matches!(n.definition(), Some(Expression::IntegerLiteral(_))));

    let Item::Declaration(q) = &items[2] else { panic!("expected a declaration, got {:?}", items[2]) };
    let Some(Type::ArrayType(array)) = q.declared_type() else { panic!("expected an array type") };
    assert_eq!(array.dimensions().count(), 1);
    let Some(Type::TypeBase(element)) = array.element_type() else { panic!("expected a base type") };
    assert!(element.is_var());
    assert!(element.primitive().is_none());
    let Some(Expression::InfixOperator(range)) = element.domain() else { panic!("expected a range") };
    assert_eq!(range.operator(), Some(".."));

    let Item::Goal(goal) = &items[6] else { panic!("expected a goal, got {:?}", items[6]) };
    assert_eq!(goal.strategy(), Some(Strategy::Satisfy));
    assert!(goal.objective().is_none());

    let Item::Output(output) = &items[7] else { panic!("expected an output, got {:?}", items[7]) };
    let Some(Expression::ArrayLiteral(strings)) = output.expression() else { panic!("expected an array") };
    let Some(Expression::StringInterpolation(string)) = strings.members().next() else {
        panic!("expected an interpolated string")
    };
    let interpolated = string.items().collect::<Vec<_>>();
    assert!(matches!(&interpolated[..], [Expression::Identifier(q)] if q.text(QUEENS) == "q"));
}

#[test]
fn typed_expressions() {
    let tree = parse(QUEENS);
    let file = SourceFile::new(&tree).unwrap();
    let constraints = file
        .items()
        .filter_map(|item| match item {
            Item::Constraint(constraint) => constraint.expression(),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(constraints.len(), 3);

    let Expression::Call(call) = &constraints[1] else { panic!("expected a call, got {:?}", constraints[1]) };
    assert_eq!(call.function().unwrap().text(QUEENS), "alldifferent");
    let Some(Argument::Expression(Expression::ArrayComprehension(comprehension))) = call.arguments().next() else {
        panic!("expected a comprehension")
    };
    let Some(Expression::InfixOperator(sum)) = comprehension.template() else { panic!("expected `+`") };
    assert_eq!(sum.operator(), Some("+"));
    let Some(Expression::IndexedAccess(access)) = sum.left() else { panic!("expected `q[i]`") };
    assert!(matches!(access.collection(), Some(Expression::Identifier(q)) if q.text(QUEENS) == "q"));
    assert_eq!(access.indices().count(), 1);
    assert_eq!(comprehension.generators().count(), 1);

    let Expression::GeneratorCall(forall) = &constraints[2] else {
        panic!("expected a generator call, got {:?}", constraints[2])
    };
    assert_eq!(forall.function().unwrap().text(QUEENS), "forall");
    let generators = forall.generators().collect::<Vec<_>>();
    assert_eq!(generators.len(), 2);
    assert!(matches!(&generators[0], Argument::Expression(Expression::Identifier(i)) if i.text(QUEENS) == "i"));
    let Argument::Generator(generator) = &generators[1] else { panic!("expected a generator") };
    assert!(matches!(generator.source(), Some(Expression::InfixOperator(source)) if source.operator() == Some("in")));
    assert!(matches!(generator.condition(), Some(Expression::InfixOperator(condition)) if condition.operator() == Some("<")));
    assert!(matches!(forall.template(), Some(Expression::InfixOperator(template)) if template.operator() == Some("!=")));
}

#[test]
fn typed_let_and_goal() {
    let text = "enum Colour = {Red, Green};\nx = let { int: y = 2 } in if y > 1 then y else 0 endif;\nsolve minimize x;\n";
    let tree = parse(text);
    assert!(!tree.has_error(), "{}", tree.to_sexp());
    let items = SourceFile::new(&tree).unwrap().items().collect::<Vec<_>>();

    let Item::Enumeration(colour) = &items[0] else { panic!("expected an enum, got {:?}", items[0]) };
    assert_eq!(colour.name().unwrap().text(text), "Colour");
    let members = colour.members().map(|member| member.text(text)).collect::<Vec<_>>();
    assert_eq!(members, ["Red", "Green"]);

    let Item::Assignment(x) = &items[1] else { panic!("expected an assignment, got {:?}", items[1]) };
    let Some(Expression::LetExpression(binding)) = x.definition() else { panic!("expected a let") };
    let declared = binding.items().collect::<Vec<_>>();
    assert!(matches!(&declared[..], [Item::Declaration(y)] if y.name().unwrap().text(text) == "y"));
    let Some(Expression::IfThenElse(conditional)) = binding.body() else { panic!("expected an if") };
    assert_eq!(conditional.branches().count(), 1);
    assert!(matches!(conditional.else_result(), Some(Expression::IntegerLiteral(zero)) if zero.text(text) == "0"));

    let Item::Goal(goal) = &items[2] else { panic!("expected a goal, got {:?}", items[2]) };
    assert_eq!(goal.strategy(), Some(Strategy::Minimize));
    assert!(matches!(goal.objective(), Some(Expression::Identifier(_))));
}
