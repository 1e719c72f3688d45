//! Typed views over Essence' syntax trees.

use tessera_tree::ast::{child, children, keyword};
use tessera_tree::{AstNode, NodeOrToken, Tree, ast_enum, ast_node, ast_token};

ast_node!(SourceFile = "source_file");

impl<'a> SourceFile<'a> {
    pub fn new(tree: &'a Tree) -> Option<Self> {
        Self::cast(NodeOrToken::Node(tree.root_node()))
    }

    pub fn lang_version(&self) -> Option<LangVersion<'a>> {
        child(&self.0, "lang_version")
    }

    pub fn items(&self) -> impl Iterator<Item = Item<'a>> + use<'a> {
        children(&self.0, "item")
    }
}

ast_node!(
    /// `language ESSENCE' 1.3`
    LangVersion = "lang_version"
);

impl LangVersion<'_> {
    pub fn version<'s>(&self, source: &'s str) -> Option<&'s str> {
        let version = self.0.child_by_field_name("version")?;
        (!version.is_missing()).then(|| version.utf8_text(source))
    }
}

ast_enum!(Item {
    ParamDecl,
    ConstDef,
    DomainAlias,
    DecisionDecl,
    Objective,
    Branching,
    Heuristic,
    Constraint,
    Output,
});

ast_node!(
    /// `given n, m : int(1..10) where n < m`
    ParamDecl = "param_decl"
);

impl<'a> ParamDecl<'a> {
    pub fn names(&self) -> impl Iterator<Item = Identifier<'a>> + use<'a> {
        children(&self.0, "name")
    }

    pub fn domain(&self) -> Option<Domain<'a>> {
        child(&self.0, "domain")
    }

    pub fn conditions(&self) -> impl Iterator<Item = Expression<'a>> + use<'a> {
        children(&self.0, "where")
    }
}

ast_node!(ConstDef = "const_def");

impl<'a> ConstDef<'a> {
    pub fn name(&self) -> Option<Identifier<'a>> {
        child(&self.0, "name")
    }

    pub fn domain(&self) -> Option<Domain<'a>> {
        child(&self.0, "domain")
    }

    pub fn definition(&self) -> Option<Expression<'a>> {
        child(&self.0, "definition")
    }
}

ast_node!(
    /// `letting D be domain int(1..n)`
    DomainAlias = "domain_alias"
);

impl<'a> DomainAlias<'a> {
    pub fn name(&self) -> Option<Identifier<'a>> {
        child(&self.0, "name")
    }

    pub fn definition(&self) -> Option<Domain<'a>> {
        child(&self.0, "definition")
    }
}

ast_node!(DecisionDecl = "decision_decl");

impl<'a> DecisionDecl<'a> {
    pub fn names(&self) -> impl Iterator<Item = Identifier<'a>> + use<'a> {
        children(&self.0, "name")
    }

    pub fn domain(&self) -> Option<Domain<'a>> {
        child(&self.0, "domain")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    Maximising,
    Minimising,
}

ast_node!(Objective = "objective");

impl<'a> Objective<'a> {
    pub fn strategy(&self) -> Option<Strategy> {
        match keyword(&self.0, "strategy")? {
            "maximising" => Some(Strategy::Maximising),
            "minimising" => Some(Strategy::Minimising),
            _ => None,
        }
    }

    pub fn expression(&self) -> Option<Expression<'a>> {
        child(&self.0, "objective_expr")
    }
}

ast_node!(Branching = "branching");

impl<'a> Branching<'a> {
    pub fn variables(&self) -> Option<MatrixLiteral<'a>> {
        child(&self.0, "branching_array")
    }
}

ast_node!(Heuristic = "heuristic");

impl<'a> Heuristic<'a> {
    /// `static`, `sdf`, `srf` or `conflict`.
    pub fn name(&self) -> Option<&'a str> {
        keyword(&self.0, "heuristic")
    }
}

ast_node!(
    /// `such that` and its comma separated constraints.
    Constraint = "constraint"
);

impl<'a> Constraint<'a> {
    pub fn expressions(&self) -> impl Iterator<Item = Expression<'a>> + use<'a> {
        children(&self.0, "expression")
    }
}

ast_node!(Output = "output");

impl<'a> Output<'a> {
    pub fn expression(&self) -> Option<Expression<'a>> {
        child(&self.0, "expression")
    }
}

ast_enum!(Domain {
    BooleanDomain,
    IntegerDomain,
    AnyDomain,
    DomainOperation,
    Identifier,
    MatrixDomain,
});

ast_token!(BooleanDomain = "boolean_domain");
ast_token!(AnyDomain = "any_domain");

ast_node!(IntegerDomain = "integer_domain");

impl<'a> IntegerDomain<'a> {
    /// Values and ranges between the parentheses; empty for a bare `int`.
    pub fn members(&self) -> impl Iterator<Item = Expression<'a>> + use<'a> {
        children(&self.0, "member")
    }
}

ast_node!(DomainOperation = "domain_operation");

impl<'a> DomainOperation<'a> {
    pub fn left(&self) -> Option<Domain<'a>> {
        child(&self.0, "left")
    }

    pub fn operator(&self) -> Option<&'a str> {
        keyword(&self.0, "operator")
    }

    pub fn right(&self) -> Option<Domain<'a>> {
        child(&self.0, "right")
    }
}

ast_node!(MatrixDomain = "matrix_domain");

impl<'a> MatrixDomain<'a> {
    pub fn indices(&self) -> impl Iterator<Item = Domain<'a>> + use<'a> {
        children(&self.0, "index")
    }

    pub fn base(&self) -> Option<Domain<'a>> {
        child(&self.0, "base")
    }
}

ast_enum!(Expression {
    BooleanLiteral,
    IntegerLiteral,
    StringLiteral,
    Infinity,
    MatrixLiteral,
    Call,
    Identifier,
    IndexedAccess,
    InfixOperator,
    PrefixOperator,
    UnarySetConstructor,
    Quantification,
    MatrixComprehension,
    AbsoluteOperator,
    ParenthesisedExpression,
    SetConstructor,
});

ast_token!(Identifier = "identifier");
ast_token!(IntegerLiteral = "integer_literal");
ast_token!(StringLiteral = "string_literal");

ast_node!(BooleanLiteral = "boolean_literal");

impl BooleanLiteral<'_> {
    pub fn value(&self) -> bool {
        self.0.first_child().is_some_and(|word| word.kind_name() == "true")
    }
}

ast_node!(Infinity = "infinity");

ast_node!(MatrixLiteral = "matrix_literal");

impl<'a> MatrixLiteral<'a> {
    pub fn members(&self) -> impl Iterator<Item = Expression<'a>> + use<'a> {
        children(&self.0, "member")
    }

    pub fn index(&self) -> Option<Domain<'a>> {
        child(&self.0, "index")
    }
}

ast_node!(Call = "call");

impl<'a> Call<'a> {
    pub fn function(&self) -> Option<Identifier<'a>> {
        child(&self.0, "function")
    }

    pub fn arguments(&self) -> impl Iterator<Item = Expression<'a>> + use<'a> {
        children(&self.0, "argument")
    }
}

ast_node!(IndexedAccess = "indexed_access");

impl<'a> IndexedAccess<'a> {
    pub fn collection(&self) -> Option<Expression<'a>> {
        child(&self.0, "collection")
    }

    /// One entry per index; `None` for a `..` slice.
    pub fn indices(&self) -> impl Iterator<Item = Option<Expression<'a>>> + use<'a> {
        self.0
            .children_by_field_name("index")
            .filter(|index| !index.is_missing())
            .map(Expression::cast)
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

ast_node!(
    /// `!e` and `-e`.
    PrefixOperator = "prefix_operator"
);
ast_node!(
    /// `..e` and `e..`.
    UnarySetConstructor = "unary_set_constructor"
);

macro_rules! unary {
    ($($name:ident),+) => {
        $(
            impl<'a> $name<'a> {
                pub fn operator(&self) -> Option<&'a str> {
                    keyword(&self.0, "operator")
                }

                pub fn operand(&self) -> Option<Expression<'a>> {
                    child(&self.0, "operand")
                }
            }
        )+
    };
}

unary!(PrefixOperator, UnarySetConstructor);

ast_node!(AbsoluteOperator = "absolute_operator");

impl<'a> AbsoluteOperator<'a> {
    pub fn operand(&self) -> Option<Expression<'a>> {
        child(&self.0, "operand")
    }
}

ast_node!(
    /// `forAll i : D . e`, and the other quantifiers and folds.
    Quantification = "quantification"
);

impl<'a> Quantification<'a> {
    pub fn function(&self) -> Option<Identifier<'a>> {
        child(&self.0, "function")
    }

    pub fn generator(&self) -> Option<Generator<'a>> {
        child(&self.0, "generator")
    }

    pub fn template(&self) -> Option<Expression<'a>> {
        child(&self.0, "template")
    }
}

ast_node!(MatrixComprehension = "matrix_comprehension");

impl<'a> MatrixComprehension<'a> {
    pub fn template(&self) -> Option<Expression<'a>> {
        child(&self.0, "template")
    }

    pub fn generators(&self) -> impl Iterator<Item = Generator<'a>> + use<'a> {
        children(&self.0, "generator")
    }

    pub fn conditions(&self) -> impl Iterator<Item = Expression<'a>> + use<'a> {
        children(&self.0, "condition")
    }

    pub fn index(&self) -> Option<Domain<'a>> {
        child(&self.0, "index")
    }
}

ast_node!(Generator = "generator");

impl<'a> Generator<'a> {
    pub fn names(&self) -> impl Iterator<Item = Identifier<'a>> + use<'a> {
        children(&self.0, "name")
    }

    pub fn collection(&self) -> Option<Domain<'a>> {
        child(&self.0, "collection")
    }
}

ast_node!(ParenthesisedExpression = "parenthesised_expression");

impl<'a> ParenthesisedExpression<'a> {
    pub fn expression(&self) -> Option<Expression<'a>> {
        child(&self.0, "expression")
    }
}

ast_node!(
    /// `a..b`
    SetConstructor = "set_constructor"
);

impl<'a> SetConstructor<'a> {
    pub fn left(&self) -> Option<Expression<'a>> {
        child(&self.0, "left")
    }

    pub fn right(&self) -> Option<Expression<'a>> {
        child(&self.0, "right")
    }
}
