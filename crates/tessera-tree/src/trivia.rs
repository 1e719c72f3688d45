//! Trivia pieces attached to tokens.

use text_size::TextSize;

use crate::Symbol;

/// A run of trivia (whitespace, a comment, ...) preceding a token.
///
/// `kind` is the grammar symbol of the `extras` token that matched it.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TriviaPiece {
    pub kind: Symbol,
    pub len: TextSize,
}

impl TriviaPiece {
    /// Creates a new trivia piece with the given kind and length.
    pub fn new(kind: Symbol, len: TextSize) -> Self {
        Self { kind, len }
    }
}
