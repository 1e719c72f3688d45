//! Typed views over the untyped tree.
//!
//! Grammar crates declare one wrapper per node or token kind with
//! [`ast_node!`](crate::ast_node) and [`ast_token!`](crate::ast_token), and
//! group alternatives with [`ast_enum!`](crate::ast_enum). A wrapper is only
//! ever built by [`AstNode::cast`], which checks the kind name.

use crate::{SyntaxElement, SyntaxNode};

pub trait AstNode<'a>: Sized {
    fn cast(element: SyntaxElement<'a>) -> Option<Self>;

    fn syntax(&self) -> SyntaxElement<'a>;
}

/// The first child in `field` that casts to `N`.
pub fn child<'a, N: AstNode<'a>>(node: &SyntaxNode<'a>, field: &str) -> Option<N> {
    node.children_by_field_name(field).find_map(N::cast)
}

/// The children in `field` that cast to `N`.
pub fn children<'a, N: AstNode<'a>>(
    node: &SyntaxNode<'a>,
    field: &str,
) -> impl Iterator<Item = N> + use<'a, N> {
    node.children_by_field_name(field).filter_map(N::cast)
}

/// The kind name of the first child in `field`, for fields holding a keyword
/// or an operator.
pub fn keyword<'a>(node: &SyntaxNode<'a>, field: &str) -> Option<&'a str> {
    node.child_by_field_name(field).filter(|child| !child.is_missing()).map(|child| child.kind_name())
}

/// Declares a wrapper around nodes of one kind.
#[macro_export]
macro_rules! ast_node {
    ($(#[$attr:meta])* $name:ident = $kind:literal) => {
        $(#[$attr])*
        #[derive(Clone, Debug, PartialEq, Eq)]
        pub struct $name<'a>($crate::SyntaxNode<'a>);

        impl<'a> $name<'a> {
            pub fn syntax_node(&self) -> &$crate::SyntaxNode<'a> {
                &self.0
            }
        }

        impl<'a> $crate::AstNode<'a> for $name<'a> {
            fn cast(element: $crate::SyntaxElement<'a>) -> Option<Self> {
                element.into_node().filter(|node| node.kind_name() == $kind).map(Self)
            }

            fn syntax(&self) -> $crate::SyntaxElement<'a> {
                $crate::NodeOrToken::Node(self.0.clone())
            }
        }
    };
}

/// Declares a wrapper around tokens of one kind.
#[macro_export]
macro_rules! ast_token {
    ($(#[$attr:meta])* $name:ident = $kind:literal) => {
        $(#[$attr])*
        #[derive(Clone, Debug, PartialEq, Eq)]
        pub struct $name<'a>($crate::SyntaxToken<'a>);

        impl<'a> $name<'a> {
            pub fn syntax_token(&self) -> &$crate::SyntaxToken<'a> {
                &self.0
            }

            pub fn text<'s>(&self, source: &'s str) -> &'s str {
                self.0.utf8_text(source)
            }
        }

        impl<'a> $crate::AstNode<'a> for $name<'a> {
            fn cast(element: $crate::SyntaxElement<'a>) -> Option<Self> {
                element
                    .into_token()
                    .filter(|token| !token.is_missing() && token.kind_name() == $kind)
                    .map(Self)
            }

            fn syntax(&self) -> $crate::SyntaxElement<'a> {
                $crate::NodeOrToken::Token(self.0.clone())
            }
        }
    };
}

/// Declares an enum over wrappers, each variant named after its wrapper.
#[macro_export]
macro_rules! ast_enum {
    ($(#[$attr:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$attr])*
        #[derive(Clone, Debug, PartialEq, Eq)]
        pub enum $name<'a> {
            $($variant($variant<'a>),)+
        }

        impl<'a> $crate::AstNode<'a> for $name<'a> {
            fn cast(element: $crate::SyntaxElement<'a>) -> Option<Self> {
                $(
                    if let Some(inner) = <$variant<'a> as $crate::AstNode<'a>>::cast(element.clone()) {
                        return Some(Self::$variant(inner));
                    }
                )+
                None
            }

            fn syntax(&self) -> $crate::SyntaxElement<'a> {
                match self {
                    $(Self::$variant(inner) => $crate::AstNode::syntax(inner),)+
                }
            }
        }
    };
}
