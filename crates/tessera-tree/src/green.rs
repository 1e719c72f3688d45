//! Position-independent green tree.
//!
//! Green elements know their kind, length and children but not their
//! absolute offset, so an unchanged subtree can be shared verbatim between
//! an old tree and the tree produced by re-parsing an edited text.

use std::fmt;

use text_size::TextSize;
use triomphe::Arc;

use crate::{FieldId, NodeOrToken, StateId, Symbol, TriviaPiece};

pub type GreenElement = NodeOrToken<GreenNode, GreenToken>;

impl GreenElement {
    pub fn kind(&self) -> Symbol {
        match self {
            NodeOrToken::Node(node) => node.kind(),
            NodeOrToken::Token(token) => token.kind(),
        }
    }

    /// Length including leading trivia.
    pub fn full_len(&self) -> TextSize {
        match self {
            NodeOrToken::Node(node) => node.full_len(),
            NodeOrToken::Token(token) => token.full_len(),
        }
    }

    pub fn leading_len(&self) -> TextSize {
        match self {
            NodeOrToken::Node(node) => node.leading_len(),
            NodeOrToken::Token(token) => token.leading_len(),
        }
    }

    /// Bytes past the end of this element that influenced how it was built.
    pub fn lookahead(&self) -> u32 {
        match self {
            NodeOrToken::Node(node) => node.lookahead(),
            NodeOrToken::Token(token) => token.lookahead(),
        }
    }

    pub fn has_error(&self) -> bool {
        match self {
            NodeOrToken::Node(node) => node.has_error(),
            NodeOrToken::Token(token) => token.has_error(),
        }
    }

    pub fn has_changes(&self) -> bool {
        match self {
            NodeOrToken::Node(node) => node.has_changes(),
            NodeOrToken::Token(token) => token.has_changes(),
        }
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
struct Flags(u8);

impl Flags {
    const HAS_ERROR: u8 = 1;
    const MISSING: u8 = 1 << 1;
    const CHANGED: u8 = 1 << 2;
    const FRAGILE: u8 = 1 << 3;

    const fn contains(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    const fn with(self, flag: u8, enabled: bool) -> Self {
        if enabled { Self(self.0 | flag) } else { Self(self.0 & !flag) }
    }

    /// The part of the flags that is visible in the shape of the tree.
    const fn structural(self) -> u8 {
        self.0 & (Self::HAS_ERROR | Self::MISSING)
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_set();
        for (flag, name) in [
            (Self::HAS_ERROR, "HAS_ERROR"),
            (Self::MISSING, "MISSING"),
            (Self::CHANGED, "CHANGED"),
            (Self::FRAGILE, "FRAGILE"),
        ] {
            if self.contains(flag) {
                list.entry(&name);
            }
        }
        list.finish()
    }
}

/// Opaque state blob of an external scanner.
///
/// Stored before and after every token so that a token or a node starting
/// with it can only be reused when the scanner would start in the same state.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ScannerState(Vec<u8>);

impl ScannerState {
    pub const MAX_LEN: usize = 1024;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        debug_assert!(bytes.len() <= Self::MAX_LEN);
        Self(bytes.to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn bytes_mut(&mut self) -> &mut Vec<u8> {
        &mut self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ScannerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScannerState({:?})", self.0)
    }
}

/// What the lexer recorded while producing a token.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct LexInfo {
    pub lookahead: u32,
    pub scanner_before: ScannerState,
    pub scanner_after: ScannerState,
}

/// What the parser recorded while reducing a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseInfo {
    /// State on top of the stack before the node's first child was pushed.
    pub state: StateId,
    pub lookahead: u32,
    /// Error recovery ran while the node was being built.
    pub fragile: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GreenChild {
    pub field: Option<FieldId>,
    pub element: GreenElement,
}

impl GreenChild {
    pub fn new(field: Option<FieldId>, element: impl Into<GreenElement>) -> Self {
        Self { field, element: element.into() }
    }
}

#[derive(Clone)]
pub struct GreenNode(Arc<GreenNodeData>);

struct GreenNodeData {
    kind: Symbol,
    flags: Flags,
    parse_state: StateId,
    lookahead: u32,
    full_len: TextSize,
    children: Box<[GreenChild]>,
}

impl GreenNode {
    pub fn new(kind: Symbol, children: Vec<GreenChild>) -> Self {
        Self::with_parse_info(kind, children, ParseInfo::default())
    }

    pub fn with_parse_info(kind: Symbol, children: Vec<GreenChild>, info: ParseInfo) -> Self {
        Self::from_parts(kind, children, info, Flags::default())
    }

    pub(crate) fn with_changed_children(&self, children: Vec<GreenChild>) -> Self {
        let info = ParseInfo { state: self.0.parse_state, lookahead: self.0.lookahead, fragile: true };
        Self::from_parts(self.0.kind, children, info, Flags::default().with(Flags::CHANGED, true))
    }

    fn from_parts(kind: Symbol, children: Vec<GreenChild>, info: ParseInfo, flags: Flags) -> Self {
        let full_len = children.iter().map(|child| child.element.full_len()).sum();
        let has_error =
            kind == Symbol::ERROR || children.iter().any(|child| child.element.has_error());
        let flags = flags.with(Flags::HAS_ERROR, has_error).with(Flags::FRAGILE, info.fragile);

        Self(Arc::new(GreenNodeData {
            kind,
            flags,
            parse_state: info.state,
            lookahead: info.lookahead,
            full_len,
            children: children.into_boxed_slice(),
        }))
    }

    pub fn kind(&self) -> Symbol {
        self.0.kind
    }

    pub fn full_len(&self) -> TextSize {
        self.0.full_len
    }

    pub fn children(&self) -> &[GreenChild] {
        &self.0.children
    }

    pub fn parse_state(&self) -> StateId {
        self.0.parse_state
    }

    pub fn lookahead(&self) -> u32 {
        self.0.lookahead
    }

    pub fn is_error(&self) -> bool {
        self.0.kind == Symbol::ERROR
    }

    pub fn has_error(&self) -> bool {
        self.0.flags.contains(Flags::HAS_ERROR)
    }

    pub fn has_changes(&self) -> bool {
        self.0.flags.contains(Flags::CHANGED)
    }

    pub fn is_fragile(&self) -> bool {
        self.0.flags.contains(Flags::FRAGILE)
    }

    /// Length of the trivia in front of the node's first token.
    pub fn leading_len(&self) -> TextSize {
        self.children().first().map_or(TextSize::new(0), |child| child.element.leading_len())
    }

    /// The first token of the node, possibly zero-width.
    pub fn first_token(&self) -> Option<&GreenToken> {
        match &self.children().first()?.element {
            NodeOrToken::Node(node) => node.first_token(),
            NodeOrToken::Token(token) => Some(token),
        }
    }

    /// The last token of the node, possibly zero-width.
    pub fn last_token(&self) -> Option<&GreenToken> {
        match &self.children().last()?.element {
            NodeOrToken::Node(node) => node.last_token(),
            NodeOrToken::Token(token) => Some(token),
        }
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for GreenNode {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.0.kind == other.0.kind
                && self.0.full_len == other.0.full_len
                && self.0.flags.structural() == other.0.flags.structural()
                && self.0.children == other.0.children)
    }
}

impl Eq for GreenNode {}

impl fmt::Debug for GreenNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreenNode")
            .field("kind", &self.0.kind)
            .field("full_len", &self.0.full_len)
            .field("flags", &self.0.flags)
            .field("children", &self.0.children)
            .finish()
    }
}

#[derive(Clone)]
pub struct GreenToken(Arc<GreenTokenData>);

struct GreenTokenData {
    kind: Symbol,
    flags: Flags,
    leading: Box<[TriviaPiece]>,
    text_len: TextSize,
    full_len: TextSize,
    lex: LexInfo,
}

impl GreenToken {
    pub fn new(kind: Symbol, leading: Vec<TriviaPiece>, text_len: TextSize, lex: LexInfo) -> Self {
        let flags = Flags::default().with(Flags::HAS_ERROR, kind == Symbol::ERROR);
        Self::from_parts(kind, leading, text_len, lex, flags)
    }

    /// A zero-width token inserted by error recovery.
    pub fn missing(kind: Symbol, scanner_state: ScannerState) -> Self {
        let lex = LexInfo {
            lookahead: 0,
            scanner_before: scanner_state.clone(),
            scanner_after: scanner_state,
        };
        let flags = Flags::default().with(Flags::MISSING, true).with(Flags::HAS_ERROR, true);
        Self::from_parts(kind, Vec::new(), TextSize::new(0), lex, flags)
    }

    fn from_parts(
        kind: Symbol,
        leading: Vec<TriviaPiece>,
        text_len: TextSize,
        lex: LexInfo,
        flags: Flags,
    ) -> Self {
        let leading_len: TextSize = leading.iter().map(|piece| piece.len).sum();

        Self(Arc::new(GreenTokenData {
            kind,
            flags,
            leading: leading.into_boxed_slice(),
            text_len,
            full_len: leading_len + text_len,
            lex,
        }))
    }

    pub(crate) fn with_changed_len(&self, full_len: TextSize) -> Self {
        let flags = Flags::default().with(Flags::CHANGED, true);
        Self::from_parts(self.0.kind, Vec::new(), full_len, self.0.lex.clone(), flags)
    }

    pub fn kind(&self) -> Symbol {
        self.0.kind
    }

    pub fn leading(&self) -> &[TriviaPiece] {
        &self.0.leading
    }

    pub fn leading_len(&self) -> TextSize {
        self.0.full_len - self.0.text_len
    }

    pub fn text_len(&self) -> TextSize {
        self.0.text_len
    }

    pub fn full_len(&self) -> TextSize {
        self.0.full_len
    }

    pub fn lookahead(&self) -> u32 {
        self.0.lex.lookahead
    }

    pub fn scanner_before(&self) -> &ScannerState {
        &self.0.lex.scanner_before
    }

    pub fn scanner_after(&self) -> &ScannerState {
        &self.0.lex.scanner_after
    }

    pub fn is_missing(&self) -> bool {
        self.0.flags.contains(Flags::MISSING)
    }

    pub fn is_error(&self) -> bool {
        self.0.kind == Symbol::ERROR
    }

    pub fn has_error(&self) -> bool {
        self.0.flags.contains(Flags::HAS_ERROR)
    }

    pub fn has_changes(&self) -> bool {
        self.0.flags.contains(Flags::CHANGED)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for GreenToken {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.0.kind == other.0.kind
                && self.0.text_len == other.0.text_len
                && self.0.flags.structural() == other.0.flags.structural()
                && self.0.leading == other.0.leading)
    }
}

impl Eq for GreenToken {}

impl fmt::Debug for GreenToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreenToken")
            .field("kind", &self.0.kind)
            .field("leading", &self.0.leading)
            .field("text_len", &self.0.text_len)
            .field("flags", &self.0.flags)
            .finish()
    }
}

impl From<GreenNode> for GreenElement {
    fn from(node: GreenNode) -> Self {
        NodeOrToken::Node(node)
    }
}

impl From<GreenToken> for GreenElement {
    fn from(token: GreenToken) -> Self {
        NodeOrToken::Token(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whitespace(len: u32) -> TriviaPiece {
        TriviaPiece::new(Symbol::new(9), len.into())
    }

    fn token(kind: u16, leading: u32, len: u32) -> GreenToken {
        let leading = if leading == 0 { Vec::new() } else { vec![whitespace(leading)] };
        GreenToken::new(Symbol::new(kind), leading, len.into(), LexInfo::default())
    }

    #[test]
    fn lengths_include_trivia() {
        let node = GreenNode::new(
            Symbol::new(20),
            vec![
                GreenChild::new(None, token(1, 2, 3)),
                GreenChild::new(FieldId::new(1), token(2, 1, 1)),
            ],
        );

        assert_eq!(node.full_len(), TextSize::new(7));
        assert_eq!(node.leading_len(), TextSize::new(2));
        assert!(!node.has_error());
    }

    #[test]
    fn missing_tokens_mark_errors() {
        let missing = GreenToken::missing(Symbol::new(3), ScannerState::new());
        let node = GreenNode::new(
            Symbol::new(20),
            vec![GreenChild::new(None, token(1, 0, 3)), GreenChild::new(None, missing)],
        );

        assert!(node.has_error());
        assert_eq!(node.full_len(), TextSize::new(3));
    }

    #[test]
    fn equality_ignores_bookkeeping() {
        let children = vec![GreenChild::new(None, token(1, 0, 3))];
        let left = GreenNode::with_parse_info(
            Symbol::new(20),
            children.clone(),
            ParseInfo { state: StateId::new(4), lookahead: 2, fragile: false },
        );
        let right = GreenNode::with_parse_info(
            Symbol::new(20),
            children,
            ParseInfo { state: StateId::new(7), lookahead: 0, fragile: true },
        );

        assert_eq!(left, right);
        assert!(!left.ptr_eq(&right));
    }
}
