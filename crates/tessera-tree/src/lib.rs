//! Lossless, immutable concrete syntax trees shared between parses.
//!
//! The green layer stores kinds, lengths, trivia and the bookkeeping needed
//! for incremental re-parsing; `SyntaxNode` and `SyntaxToken` are cheap
//! views over it with absolute offsets and parent links.

pub mod ast;
mod cursor;
mod edit;
mod green;
mod symbol;
mod symbol_set;
mod syntax;
mod trivia;

/// Typed views over the tree.
pub use ast::AstNode;
/// Preorder traversal of a subtree.
pub use cursor::{Preorder, WalkEvent};
/// Describing edits to the parsed text.
pub use edit::{InputEdit, Point};
/// Position-independent tree storage.
pub use green::{
    GreenChild, GreenElement, GreenNode, GreenToken, LexInfo, ParseInfo, ScannerState,
};
/// Grammar symbols and their names.
pub use symbol::{FieldId, StateId, Symbol, SymbolKind, SymbolMetadata, SymbolTable};
/// Compact set of grammar symbols.
pub use symbol_set::SymbolSet;
/// Primary syntax tree API types.
pub use syntax::{Children, NodeOrToken, SyntaxElement, SyntaxNode, SyntaxToken, Tree};
/// Trivia pieces attached to tokens.
pub use trivia::TriviaPiece;
