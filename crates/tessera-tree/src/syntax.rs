//! Public syntax tree API: parent-linked views over the green tree.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use text_size::{TextRange, TextSize};

use crate::cursor::{Preorder, WalkEvent};
use crate::edit::InputEdit;
use crate::{FieldId, GreenChild, GreenNode, GreenToken, Symbol, SymbolTable};

/// A parsed text: the root green node plus the symbol table of the language
/// that produced it.
///
/// The tree does not own the text it was parsed from.
#[derive(Clone)]
pub struct Tree {
    root: GreenNode,
    symbols: Arc<SymbolTable>,
}

impl Tree {
    pub fn new(root: GreenNode, symbols: Arc<SymbolTable>) -> Self {
        Self { root, symbols }
    }

    /// Returns the root syntax node.
    #[inline]
    pub fn root_node(&self) -> SyntaxNode<'_> {
        SyntaxNode::new_root(self)
    }

    #[inline]
    pub fn green(&self) -> &GreenNode {
        &self.root
    }

    #[inline]
    pub fn symbols(&self) -> &Arc<SymbolTable> {
        &self.symbols
    }

    #[inline]
    pub fn len(&self) -> TextSize {
        self.root.full_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.full_len() == TextSize::new(0)
    }

    pub fn has_error(&self) -> bool {
        self.root.has_error()
    }

    /// Returns a copy of this tree adjusted for `edit`.
    ///
    /// Elements touched by the edit are copied and marked as changed; all
    /// other subtrees are shared with `self`, which is left untouched.
    pub fn edit(&self, edit: &InputEdit) -> Self {
        let edit = edit.relative(self.len());
        Self { root: self.root.edit(edit), symbols: Arc::clone(&self.symbols) }
    }

    pub fn to_sexp(&self) -> String {
        self.root_node().to_sexp()
    }
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.symbols, &other.symbols) || self.symbols == other.symbols)
            && self.root == other.root
    }
}

impl Eq for Tree {}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("language", &self.symbols.language())
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

unsafe impl salsa::Update for Tree {
    unsafe fn maybe_update(old_pointer: *mut Self, new_value: Self) -> bool {
        let old_value = unsafe { &mut *old_pointer };
        if *old_value == new_value {
            false
        } else {
            *old_value = new_value;
            true
        }
    }
}

/// Node handle tied to the lifetime of the tree.
#[derive(Clone)]
pub struct SyntaxNode<'a> {
    tree: &'a Tree,
    data: Rc<NodeData<'a>>,
}

struct NodeData<'a> {
    green: &'a GreenNode,
    offset: TextSize,
    index: usize,
    field: Option<FieldId>,
    parent: Option<SyntaxNode<'a>>,
}

impl<'a> SyntaxNode<'a> {
    fn new_root(tree: &'a Tree) -> Self {
        let data =
            NodeData { green: &tree.root, offset: TextSize::new(0), index: 0, field: None, parent: None };
        Self { tree, data: Rc::new(data) }
    }

    #[inline]
    pub fn green(&self) -> &'a GreenNode {
        self.data.green
    }

    #[inline]
    pub fn kind(&self) -> Symbol {
        self.data.green.kind()
    }

    #[inline]
    pub fn kind_name(&self) -> &'a str {
        self.tree.symbols.name(self.kind())
    }

    #[inline]
    pub fn is_named(&self) -> bool {
        self.tree.symbols.is_named(self.kind())
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.data.green.is_error()
    }

    #[inline]
    pub fn has_error(&self) -> bool {
        self.data.green.has_error()
    }

    #[inline]
    pub fn has_changes(&self) -> bool {
        self.data.green.has_changes()
    }

    /// The range covered by this node, leading trivia excluded.
    #[inline]
    pub fn text_range(&self) -> TextRange {
        let full = self.full_range();
        TextRange::new(full.start() + self.data.green.leading_len(), full.end())
    }

    /// The range covered by this node including the trivia in front of it.
    #[inline]
    pub fn full_range(&self) -> TextRange {
        TextRange::at(self.data.offset, self.data.green.full_len())
    }

    /// Returns the text of this node, given the text the tree was parsed from.
    pub fn utf8_text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.text_range()]
    }

    #[inline]
    pub fn field(&self) -> Option<FieldId> {
        self.data.field
    }

    pub fn field_name(&self) -> Option<&'a str> {
        Some(self.tree.symbols.field_name(self.data.field?))
    }

    /// Position of this node among its parent's children.
    #[inline]
    pub fn index(&self) -> usize {
        self.data.index
    }

    #[inline]
    pub fn parent(&self) -> Option<Self> {
        self.data.parent.clone()
    }

    #[inline]
    pub fn child_count(&self) -> usize {
        self.data.green.children().len()
    }

    pub fn child(&self, index: usize) -> Option<SyntaxElement<'a>> {
        let children = self.data.green.children();
        children.get(index)?;

        let offset = children[..index]
            .iter()
            .fold(self.data.offset, |offset, child| offset + child.element.full_len());
        Some(self.make_child(index, offset))
    }

    fn make_child(&self, index: usize, offset: TextSize) -> SyntaxElement<'a> {
        let GreenChild { field, element } = &self.data.green.children()[index];
        let field = *field;

        match element {
            NodeOrToken::Node(green) => {
                let data = NodeData { green, offset, index, field, parent: Some(self.clone()) };
                NodeOrToken::Node(SyntaxNode { tree: self.tree, data: Rc::new(data) })
            }
            NodeOrToken::Token(green) => NodeOrToken::Token(SyntaxToken {
                tree: self.tree,
                green,
                offset,
                index,
                field,
                parent: self.clone(),
            }),
        }
    }

    /// Iterates over all children, tokens included.
    pub fn children(&self) -> Children<'a> {
        Children { parent: self.clone(), index: 0, offset: self.data.offset }
    }

    /// Iterates over the children that are named nodes or named tokens.
    pub fn named_children(&self) -> impl Iterator<Item = SyntaxElement<'a>> + use<'a> {
        self.children().filter(|child| child.is_named())
    }

    pub fn named_child_count(&self) -> usize {
        self.named_children().count()
    }

    /// Returns the first child with the given field name.
    pub fn child_by_field_name(&self, name: &str) -> Option<SyntaxElement<'a>> {
        self.children_by_field_name(name).next()
    }

    pub fn children_by_field_name(
        &self,
        name: &str,
    ) -> impl Iterator<Item = SyntaxElement<'a>> + use<'a> {
        let field = self.tree.symbols.field_id(name);
        self.children().filter(move |child| field.is_some() && child.field() == field)
    }

    pub fn first_child(&self) -> Option<SyntaxElement<'a>> {
        self.child(0)
    }

    pub fn next_sibling(&self) -> Option<SyntaxElement<'a>> {
        let parent = self.parent()?;
        let offset = self.data.offset + self.data.green.full_len();
        (self.data.index + 1 < parent.child_count())
            .then(|| parent.make_child(self.data.index + 1, offset))
    }

    /// Walks the subtree rooted at this node in preorder.
    pub fn preorder(&self) -> Preorder<'a> {
        Preorder::new(NodeOrToken::Node(self.clone()))
    }

    /// All descendants of this node, tokens included, in preorder.
    pub fn descendants(&self) -> impl Iterator<Item = SyntaxElement<'a>> + use<'a> {
        self.preorder().filter_map(|event| match event {
            WalkEvent::Enter(element) => Some(element),
            WalkEvent::Leave(_) => None,
        })
    }

    /// Returns the smallest element that fully covers `range`.
    pub fn covering_element(&self, range: TextRange) -> SyntaxElement<'a> {
        let mut node = self.clone();
        'descend: loop {
            for child in node.children() {
                if child.full_range().len() > TextSize::new(0) && child.text_range().contains_range(range)
                {
                    match child {
                        NodeOrToken::Node(child) => {
                            node = child;
                            continue 'descend;
                        }
                        NodeOrToken::Token(_) => return child,
                    }
                }
            }
            return NodeOrToken::Node(node);
        }
    }

    /// Renders the named structure of this node as an s-expression.
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        write_sexp(&NodeOrToken::Node(self.clone()), &mut out);
        out
    }
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree)
            && std::ptr::eq(self.data.green, other.data.green)
            && self.data.offset == other.data.offset
    }
}

impl Eq for SyntaxNode<'_> {}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:?}", self.kind_name(), self.text_range())
    }
}

/// Iterator over the children of a node.
#[derive(Clone)]
pub struct Children<'a> {
    parent: SyntaxNode<'a>,
    index: usize,
    offset: TextSize,
}

impl<'a> Iterator for Children<'a> {
    type Item = SyntaxElement<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let child = self.parent.data.green.children().get(self.index)?;
        let element = self.parent.make_child(self.index, self.offset);

        self.index += 1;
        self.offset += child.element.full_len();
        Some(element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.parent.child_count() - self.index;
        (len, Some(len))
    }
}

impl ExactSizeIterator for Children<'_> {}

/// Token handle tied to the lifetime of the tree.
#[derive(Clone)]
pub struct SyntaxToken<'a> {
    tree: &'a Tree,
    green: &'a GreenToken,
    offset: TextSize,
    index: usize,
    field: Option<FieldId>,
    parent: SyntaxNode<'a>,
}

impl<'a> SyntaxToken<'a> {
    #[inline]
    pub fn green(&self) -> &'a GreenToken {
        self.green
    }

    #[inline]
    pub fn kind(&self) -> Symbol {
        self.green.kind()
    }

    #[inline]
    pub fn kind_name(&self) -> &'a str {
        self.tree.symbols.name(self.kind())
    }

    #[inline]
    pub fn is_named(&self) -> bool {
        self.tree.symbols.is_named(self.kind())
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        self.green.is_missing()
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.green.is_error()
    }

    /// Returns the token text range excluding trivia.
    #[inline]
    pub fn text_range(&self) -> TextRange {
        TextRange::at(self.offset + self.green.leading_len(), self.green.text_len())
    }

    /// Returns the range including leading trivia.
    #[inline]
    pub fn full_range(&self) -> TextRange {
        TextRange::at(self.offset, self.green.full_len())
    }

    pub fn utf8_text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.text_range()]
    }

    #[inline]
    pub fn field(&self) -> Option<FieldId> {
        self.field
    }

    pub fn field_name(&self) -> Option<&'a str> {
        Some(self.tree.symbols.field_name(self.field?))
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the parent node.
    #[inline]
    pub fn parent(&self) -> SyntaxNode<'a> {
        self.parent.clone()
    }

    pub fn next_sibling(&self) -> Option<SyntaxElement<'a>> {
        let offset = self.offset + self.green.full_len();
        (self.index + 1 < self.parent.child_count())
            .then(|| self.parent.make_child(self.index + 1, offset))
    }
}

impl PartialEq for SyntaxToken<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.green, other.green) && self.offset == other.offset
    }
}

impl Eq for SyntaxToken<'_> {}

impl fmt::Debug for SyntaxToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?}", self.kind_name(), self.text_range())
    }
}

/// Node or token element inside the tree.
pub type SyntaxElement<'a> = NodeOrToken<SyntaxNode<'a>, SyntaxToken<'a>>;

impl<'a> SyntaxElement<'a> {
    pub fn kind(&self) -> Symbol {
        match self {
            NodeOrToken::Node(node) => node.kind(),
            NodeOrToken::Token(token) => token.kind(),
        }
    }

    pub fn kind_name(&self) -> &'a str {
        match self {
            NodeOrToken::Node(node) => node.kind_name(),
            NodeOrToken::Token(token) => token.kind_name(),
        }
    }

    pub fn is_named(&self) -> bool {
        match self {
            NodeOrToken::Node(node) => node.is_named(),
            NodeOrToken::Token(token) => token.is_named(),
        }
    }

    pub fn is_missing(&self) -> bool {
        match self {
            NodeOrToken::Node(_) => false,
            NodeOrToken::Token(token) => token.is_missing(),
        }
    }

    pub fn is_error(&self) -> bool {
        match self {
            NodeOrToken::Node(node) => node.is_error(),
            NodeOrToken::Token(token) => token.is_error(),
        }
    }

    pub fn has_error(&self) -> bool {
        match self {
            NodeOrToken::Node(node) => node.has_error(),
            NodeOrToken::Token(token) => token.green().has_error(),
        }
    }

    pub fn text_range(&self) -> TextRange {
        match self {
            NodeOrToken::Node(node) => node.text_range(),
            NodeOrToken::Token(token) => token.text_range(),
        }
    }

    pub fn full_range(&self) -> TextRange {
        match self {
            NodeOrToken::Node(node) => node.full_range(),
            NodeOrToken::Token(token) => token.full_range(),
        }
    }

    pub fn field(&self) -> Option<FieldId> {
        match self {
            NodeOrToken::Node(node) => node.field(),
            NodeOrToken::Token(token) => token.field(),
        }
    }

    pub fn field_name(&self) -> Option<&'a str> {
        match self {
            NodeOrToken::Node(node) => node.field_name(),
            NodeOrToken::Token(token) => token.field_name(),
        }
    }

    pub fn parent(&self) -> Option<SyntaxNode<'a>> {
        match self {
            NodeOrToken::Node(node) => node.parent(),
            NodeOrToken::Token(token) => Some(token.parent()),
        }
    }

    pub fn next_sibling(&self) -> Option<Self> {
        match self {
            NodeOrToken::Node(node) => node.next_sibling(),
            NodeOrToken::Token(token) => token.next_sibling(),
        }
    }

    pub fn utf8_text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.text_range()]
    }
}

fn write_sexp(element: &SyntaxElement<'_>, out: &mut String) {
    let missing = element.is_missing();
    let visible = element.is_named() || missing;

    if visible {
        if !out.is_empty() && !out.ends_with('(') {
            out.push(' ');
        }
        if let Some(field) = element.field_name() {
            out.push_str(field);
            out.push_str(": ");
        }
        out.push('(');
        if missing {
            out.push_str("MISSING ");
            if element.is_named() {
                out.push_str(element.kind_name());
            } else {
                out.push('"');
                out.push_str(element.kind_name());
                out.push('"');
            }
        } else {
            out.push_str(element.kind_name());
        }
    }

    if let NodeOrToken::Node(node) = element {
        for child in node.children() {
            write_sexp(&child, out);
        }
    }

    if visible {
        out.push(')');
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeOrToken<N, T> {
    Node(N),
    Token(T),
}

impl<N, T> NodeOrToken<N, T> {
    /// Converts into the node variant, if any.
    pub fn into_node(self) -> Option<N> {
        match self {
            NodeOrToken::Node(node) => Some(node),
            NodeOrToken::Token(_) => None,
        }
    }

    /// Converts into the token variant, if any.
    pub fn into_token(self) -> Option<T> {
        match self {
            NodeOrToken::Node(_) => None,
            NodeOrToken::Token(token) => Some(token),
        }
    }

    /// Returns a shared reference to the node, if any.
    pub fn as_node(&self) -> Option<&N> {
        match self {
            NodeOrToken::Node(node) => Some(node),
            NodeOrToken::Token(_) => None,
        }
    }

    /// Returns a shared reference to the token, if any.
    pub fn as_token(&self) -> Option<&T> {
        match self {
            NodeOrToken::Node(_) => None,
            NodeOrToken::Token(token) => Some(token),
        }
    }
}
