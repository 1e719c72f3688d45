//! Typed views over MiniZinc syntax trees.

use tessera_tree::ast::{child, children, keyword};
use tessera_tree::{AstNode, NodeOrToken, SyntaxElement, Tree, ast_enum, ast_node, ast_token};

ast_node!(SourceFile = "source_file");

impl<'a> SourceFile<'a> {
    pub fn new(tree: &'a Tree) -> Option<Self> {
        Self::cast(NodeOrToken::Node(tree.root_node()))
    }

    pub fn items(&self) -> impl Iterator<Item = Item<'a>> + use<'a> {
        children(&self.0, "item")
    }
}

ast_enum!(Item {
    Include,
    Assignment,
    Declaration,
    Constraint,
    Enumeration,
    Goal,
    Output,
    Predicate,
    FunctionItem,
});

ast_node!(Include = "include");

impl<'a> Include<'a> {
    pub fn file(&self) -> Option<StringLiteral<'a>> {
        child(&self.0, "file")
    }
}

ast_node!(Assignment = "assignment");

impl<'a> Assignment<'a> {
    pub fn name(&self) -> Option<Identifier<'a>> {
        child(&self.0, "name")
    }

    pub fn definition(&self) -> Option<Expression<'a>> {
        child(&self.0, "definition")
    }
}

ast_node!(
    /// A variable or parameter declaration, also the items of a `let`.
    Declaration = "declaration"
);

impl<'a> Declaration<'a> {
    pub fn declared_type(&self) -> Option<Type<'a>> {
        child(&self.0, "type")
    }

    pub fn name(&self) -> Option<Identifier<'a>> {
        child(&self.0, "name")
    }

    pub fn annotations(&self) -> impl Iterator<Item = Expression<'a>> + use<'a> {
        children(&self.0, "annotation")
    }

    pub fn definition(&self) -> Option<Expression<'a>> {
        child(&self.0, "definition")
    }
}

ast_node!(Constraint = "constraint");

impl<'a> Constraint<'a> {
    pub fn expression(&self) -> Option<Expression<'a>> {
        child(&self.0, "expression")
    }
}

ast_node!(Enumeration = "enumeration");

impl<'a> Enumeration<'a> {
    pub fn name(&self) -> Option<Identifier<'a>> {
        child(&self.0, "name")
    }

    /// Members of `enum E = {A, B}`; empty for an enumeration without cases.
    pub fn members(&self) -> impl Iterator<Item = Identifier<'a>> + use<'a> {
        self.0
            .child_by_field_name("case")
            .and_then(NodeOrToken::into_node)
            .into_iter()
            .flat_map(|cases| children(&cases, "member"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    Satisfy,
    Minimize,
    Maximize,
}

ast_node!(Goal = "goal");

impl<'a> Goal<'a> {
    pub fn strategy(&self) -> Option<Strategy> {
        match keyword(&self.0, "strategy")? {
            "satisfy" => Some(Strategy::Satisfy),
            "minimize" => Some(Strategy::Minimize),
            "maximize" => Some(Strategy::Maximize),
            _ => None,
        }
    }

    pub fn objective(&self) -> Option<Expression<'a>> {
        child(&self.0, "objective")
    }
}

ast_node!(Output = "output");

impl<'a> Output<'a> {
    pub fn expression(&self) -> Option<Expression<'a>> {
        child(&self.0, "expression")
    }
}

ast_node!(
    /// A `predicate` or `test` item.
    Predicate = "predicate"
);

impl<'a> Predicate<'a> {
    pub fn is_test(&self) -> bool {
        keyword(&self.0, "type") == Some("test")
    }

    pub fn name(&self) -> Option<Identifier<'a>> {
        child(&self.0, "name")
    }

    pub fn parameters(&self) -> impl Iterator<Item = Parameter<'a>> + use<'a> {
        children(&self.0, "parameter")
    }

    pub fn body(&self) -> Option<Expression<'a>> {
        child(&self.0, "body")
    }
}

ast_node!(FunctionItem = "function_item");

impl<'a> FunctionItem<'a> {
    pub fn return_type(&self) -> Option<Type<'a>> {
        child(&self.0, "type")
    }

    pub fn name(&self) -> Option<Identifier<'a>> {
        child(&self.0, "name")
    }

    pub fn parameters(&self) -> impl Iterator<Item = Parameter<'a>> + use<'a> {
        children(&self.0, "parameter")
    }

    pub fn body(&self) -> Option<Expression<'a>> {
        child(&self.0, "body")
    }
}

ast_node!(Parameter = "parameter");

impl<'a> Parameter<'a> {
    pub fn declared_type(&self) -> Option<Type<'a>> {
        child(&self.0, "type")
    }

    pub fn name(&self) -> Option<Identifier<'a>> {
        child(&self.0, "name")
    }
}

ast_enum!(Type { TypeBase, SetType, ArrayType });

ast_node!(TypeBase = "type_base");

impl<'a> TypeBase<'a> {
    pub fn is_var(&self) -> bool {
        keyword(&self.0, "var_par") == Some("var")
    }

    pub fn is_opt(&self) -> bool {
        keyword(&self.0, "opt").is_some()
    }

    pub fn primitive(&self) -> Option<PrimitiveType<'a>> {
        child(&self.0, "domain")
    }

    /// The domain expression, for types such as `1..n`.
    pub fn domain(&self) -> Option<Expression<'a>> {
        child(&self.0, "domain")
    }
}

ast_node!(PrimitiveType = "primitive_type");

impl<'a> PrimitiveType<'a> {
    /// `int`, `float`, `bool`, `string` or `ann`.
    pub fn name(&self) -> Option<&'a str> {
        self.0.first_child().map(|word| word.kind_name())
    }
}

ast_node!(SetType = "set_type");

impl<'a> SetType<'a> {
    pub fn is_var(&self) -> bool {
        keyword(&self.0, "var_par") == Some("var")
    }

    pub fn element_type(&self) -> Option<TypeBase<'a>> {
        child(&self.0, "type")
    }
}

ast_node!(ArrayType = "array_type");

impl<'a> ArrayType<'a> {
    pub fn dimensions(&self) -> impl Iterator<Item = TypeBase<'a>> + use<'a> {
        children(&self.0, "dimension")
    }

    pub fn element_type(&self) -> Option<Type<'a>> {
        child(&self.0, "type")
    }
}

ast_enum!(Expression {
    Identifier,
    Absent,
    BooleanLiteral,
    FloatLiteral,
    IntegerLiteral,
    Infinity,
    StringLiteral,
    Anonymous,
    Call,
    GeneratorCall,
    IndexedAccess,
    InfixOperator,
    PrefixOperator,
    AnnotatedExpression,
    IfThenElse,
    LetExpression,
    ParenthesisedExpression,
    TupleLiteral,
    ArrayLiteral,
    ArrayLiteral2d,
    ArrayComprehension,
    SetLiteral,
    SetComprehension,
    StringInterpolation,
});

ast_token!(Identifier = "identifier");
ast_token!(Absent = "absent");
ast_token!(FloatLiteral = "float_literal");
ast_token!(IntegerLiteral = "integer_literal");
ast_token!(StringLiteral = "string_literal");
ast_token!(Anonymous = "anonymous");

ast_node!(BooleanLiteral = "boolean_literal");

impl BooleanLiteral<'_> {
    pub fn value(&self) -> bool {
        self.0.first_child().is_some_and(|word| word.kind_name() == "true")
    }
}

ast_node!(Infinity = "infinity");

ast_node!(Call = "call");

impl<'a> Call<'a> {
    pub fn function(&self) -> Option<Identifier<'a>> {
        child(&self.0, "function")
    }

    pub fn arguments(&self) -> impl Iterator<Item = Argument<'a>> + use<'a> {
        children(&self.0, "argument")
    }
}

ast_node!(
    /// `forall(i in 1..n)(x[i] > 0)`
    GeneratorCall = "generator_call"
);

impl<'a> GeneratorCall<'a> {
    pub fn function(&self) -> Option<Identifier<'a>> {
        child(&self.0, "function")
    }

    pub fn generators(&self) -> impl Iterator<Item = Argument<'a>> + use<'a> {
        children(&self.0, "generator")
    }

    pub fn template(&self) -> Option<Expression<'a>> {
        child(&self.0, "template")
    }
}

/// An argument of a call or a comprehension. Generators without a `where`
/// clause are plain `in` expressions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Argument<'a> {
    Expression(Expression<'a>),
    Generator(Generator<'a>),
}

impl<'a> AstNode<'a> for Argument<'a> {
    fn cast(element: SyntaxElement<'a>) -> Option<Self> {
        match Generator::cast(element.clone()) {
            Some(generator) => Some(Self::Generator(generator)),
            None => Expression::cast(element).map(Self::Expression),
        }
    }

    fn syntax(&self) -> SyntaxElement<'a> {
        match self {
            Self::Expression(expression) => expression.syntax(),
            Self::Generator(generator) => generator.syntax(),
        }
    }
}

ast_node!(
    /// `i in 1..n where i > 1`
    Generator = "generator"
);

impl<'a> Generator<'a> {
    pub fn source(&self) -> Option<Expression<'a>> {
        child(&self.0, "source")
    }

    pub fn condition(&self) -> Option<Expression<'a>> {
        child(&self.0, "where")
    }
}

ast_node!(IndexedAccess = "indexed_access");

impl<'a> IndexedAccess<'a> {
    pub fn collection(&self) -> Option<Expression<'a>> {
        child(&self.0, "collection")
    }

    pub fn indices(&self) -> impl Iterator<Item = Expression<'a>> + use<'a> {
        children(&self.0, "index")
    }
}

ast_node!(InfixOperator = "infix_operator");

impl<'a> InfixOperator<'a> {
    pub fn left(&self) -> Option<Expression<'a>> {
        child(&self.0, "left")
    }

    pub fn operator(&self) -> Option<&'a str> {
        keyword(&self.0, "operator")
    }

    pub fn right(&self) -> Option<Expression<'a>> {
        child(&self.0, "right")
    }
}

ast_node!(PrefixOperator = "prefix_operator");

impl<'a> PrefixOperator<'a> {
    pub fn operator(&self) -> Option<&'a str> {
        keyword(&self.0, "operator")
    }

    pub fn operand(&self) -> Option<Expression<'a>> {
        child(&self.0, "operand")
    }
}

ast_node!(AnnotatedExpression = "annotated_expression");

impl<'a> AnnotatedExpression<'a> {
    pub fn expression(&self) -> Option<Expression<'a>> {
        child(&self.0, "expression")
    }

    pub fn annotation(&self) -> Option<Expression<'a>> {
        child(&self.0, "annotation")
    }
}

ast_node!(IfThenElse = "if_then_else");

impl<'a> IfThenElse<'a> {
    /// The `if` and `elseif` branches, in order.
    pub fn branches(&self) -> impl Iterator<Item = (Expression<'a>, Expression<'a>)> + use<'a> {
        children(&self.0, "condition").zip(children(&self.0, "result"))
    }

    pub fn else_result(&self) -> Option<Expression<'a>> {
        child(&self.0, "else")
    }
}

ast_node!(LetExpression = "let_expression");

impl<'a> LetExpression<'a> {
    pub fn items(&self) -> impl Iterator<Item = Item<'a>> + use<'a> {
        children(&self.0, "item")
    }

    pub fn body(&self) -> Option<Expression<'a>> {
        child(&self.0, "in")
    }
}

ast_node!(ParenthesisedExpression = "parenthesised_expression");

impl<'a> ParenthesisedExpression<'a> {
    pub fn expression(&self) -> Option<Expression<'a>> {
        child(&self.0, "expression")
    }
}

ast_node!(TupleLiteral = "tuple_literal");
ast_node!(ArrayLiteral = "array_literal");
ast_node!(SetLiteral = "set_literal");
ast_node!(ArrayLiteral2dRow = "array_literal_2d_row");

macro_rules! members {
    ($($name:ident),+) => {
        $(
            impl<'a> $name<'a> {
                pub fn members(&self) -> impl Iterator<Item = Expression<'a>> + use<'a> {
                    children(&self.0, "member")
                }
            }
        )+
    };
}

members!(TupleLiteral, ArrayLiteral, SetLiteral, ArrayLiteral2dRow);

ast_node!(ArrayLiteral2d = "array_literal_2d");

impl<'a> ArrayLiteral2d<'a> {
    pub fn rows(&self) -> impl Iterator<Item = ArrayLiteral2dRow<'a>> + use<'a> {
        children(&self.0, "row")
    }
}

ast_node!(ArrayComprehension = "array_comprehension");
ast_node!(SetComprehension = "set_comprehension");

macro_rules! comprehension {
    ($($name:ident),+) => {
        $(
            impl<'a> $name<'a> {
                pub fn template(&self) -> Option<Expression<'a>> {
                    child(&self.0, "template")
                }

                pub fn generators(&self) -> impl Iterator<Item = Argument<'a>> + use<'a> {
                    children(&self.0, "generator")
                }
            }
        )+
    };
}

comprehension!(ArrayComprehension, SetComprehension);

ast_node!(
    /// `"x = \(x)"`
    StringInterpolation = "string_interpolation"
);

impl<'a> StringInterpolation<'a> {
    pub fn items(&self) -> impl Iterator<Item = Expression<'a>> + use<'a> {
        children(&self.0, "item")
    }
}
