use std::collections::VecDeque;
use std::sync::Arc;

use tessera_grammar::{Action, CompiledGrammar, ParseTable, ProductionId};
use tessera_lexer::Lexer;
use tessera_tree::{
    FieldId, GreenChild, GreenElement, GreenNode, GreenToken, InputEdit, NodeOrToken, ParseInfo,
    StateId, Symbol, SymbolTable, Tree,
};
use text_size::TextSize;

use crate::Language;
use crate::reuse::{self, ReuseCursor};
use crate::stack::{Entry, Stack};

/// An LR parser for one language.
///
/// The parser keeps its stack allocation between calls; trees it returns
/// never refer back to it.
pub struct Parser {
    language: Language,
    stack: Stack,
}

impl Parser {
    pub fn new(language: Language) -> Self {
        Self { language, stack: Stack::default() }
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    /// Parses `text`, reusing the parts of `old_tree` that `edits` leave
    /// untouched.
    ///
    /// `old_tree` must describe the text before `edits` were applied; it is
    /// not modified. Malformed input produces `ERROR` nodes and `MISSING`
    /// tokens rather than a failure.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(language = self.language.name(), len = text.len(), incremental = old_tree.is_some())
    )]
    pub fn parse(&mut self, text: &str, old_tree: Option<&Tree>, edits: &[InputEdit]) -> Tree {
        let symbols = self.language.symbols();
        let old_tree = old_tree.filter(|tree| {
            let same = Arc::ptr_eq(tree.symbols(), symbols) || tree.symbols() == symbols;
            if !same {
                let other = tree.symbols().language();
                tracing::debug!(other, "ignoring a tree of another language");
            }
            same
        });
        let reuse = old_tree
            .map(|tree| edits.iter().fold(tree.clone(), |tree, edit| tree.edit(edit)))
            .map(|tree| ReuseCursor::new(tree.green().clone()));

        let grammar = self.language.grammar();
        self.stack.clear();
        let run = ParseRun {
            grammar,
            lexer: Lexer::new(text, grammar, self.language.scanner()),
            stack: &mut self.stack,
            lookahead: VecDeque::new(),
            reuse,
            recoveries: 0,
            missing_at: None,
        };
        let root = run.run();
        Tree::new(root, Arc::clone(symbols))
    }
}

/// A token the parser has lexed or taken from the old tree but not yet
/// shifted.
#[derive(Clone, Debug)]
pub(crate) struct Lookahead {
    pub(crate) token: GreenToken,
    pub(crate) start: TextSize,
}

impl Lookahead {
    pub(crate) fn kind(&self) -> Symbol {
        self.token.kind()
    }

    pub(crate) fn end(&self) -> TextSize {
        self.start + self.token.full_len()
    }

    pub(crate) fn lookahead_end(&self) -> TextSize {
        self.end() + TextSize::new(self.token.lookahead())
    }
}

pub(crate) struct ParseRun<'a> {
    pub(crate) grammar: &'a CompiledGrammar,
    pub(crate) lexer: Lexer<'a>,
    pub(crate) stack: &'a mut Stack,
    /// Tokens ahead of the stack; the first one is the current lookahead.
    pub(crate) lookahead: VecDeque<Lookahead>,
    pub(crate) reuse: Option<ReuseCursor>,
    /// Number of error recoveries so far.
    pub(crate) recoveries: u32,
    /// Position of the last attempt to insert a missing token.
    pub(crate) missing_at: Option<TextSize>,
}

impl<'a> ParseRun<'a> {
    fn run(mut self) -> GreenNode {
        loop {
            if self.reuse_node() {
                continue;
            }

            let state = self.stack.state();
            let kind = self.peek().kind();
            match self.table().action(state, kind) {
                Action::Shift(next) => self.shift(next),
                Action::Reduce(production) => self.reduce(production),
                Action::Accept => return self.accept(),
                Action::Error => {
                    if let Some(root) = self.recover() {
                        return root;
                    }
                }
            }
        }
    }

    pub(crate) fn table(&self) -> &'a ParseTable {
        self.grammar.parse_table()
    }

    pub(crate) fn symbols(&self) -> &'a SymbolTable {
        self.grammar.symbols()
    }

    pub(crate) fn peek(&mut self) -> &Lookahead {
        self.fill(1);
        &self.lookahead[0]
    }

    /// Makes sure `count` tokens are buffered. Returns `false` when the
    /// input ends before that.
    pub(crate) fn fill(&mut self, count: usize) -> bool {
        while self.lookahead.len() < count {
            if self.lookahead.back().is_some_and(|token| token.kind() == Symbol::END) {
                return false;
            }
            let token = self.lex();
            self.lookahead.push_back(token);
        }
        true
    }

    fn lex(&mut self) -> Lookahead {
        let start = self.lexer.position();
        if let Some(token) = self.reusable_token(start) {
            tracing::trace!(kind = ?token.kind(), offset = u32::from(start), "reused token");
            self.lexer.seek(start + token.full_len(), token.scanner_after().clone());
            return Lookahead { token, start };
        }

        let token = self.lexer.next_token();
        let start = token.full_start();
        Lookahead { token: token.into_green(), start }
    }

    fn reusable_token(&mut self, position: TextSize) -> Option<GreenToken> {
        let mut element = self.reuse.as_mut()?.seek(position)?;
        let token = loop {
            match element {
                NodeOrToken::Node(node) => element = reuse::first_child(&node)?.clone(),
                NodeOrToken::Token(token) => break token,
            }
        };

        let reusable =
            !token.has_changes() && token.scanner_before() == self.lexer.scanner_state();
        reusable.then_some(token)
    }

    /// Pushes a subtree of the old tree that starts at the current position,
    /// if one can stand in for what the parser would build next.
    fn reuse_node(&mut self) -> bool {
        if self.lookahead.len() > 1 {
            return false;
        }
        let (position, scanner_state) = match self.lookahead.front() {
            Some(token) => (token.start, token.token.scanner_before()),
            None => (self.lexer.position(), self.lexer.scanner_state()),
        };
        let Some(cursor) = self.reuse.as_mut() else { return false };
        let mut candidate = cursor.seek(position);

        let table = self.grammar.parse_table();
        let state = self.stack.state();
        let found = loop {
            let Some(NodeOrToken::Node(node)) = candidate else { return false };
            let next = table.goto(state, node.kind());
            let reusable = !node.has_changes()
                && !node.has_error()
                && !node.is_fragile()
                && node.parse_state() == state
                && node.first_token().is_some_and(|token| token.scanner_before() == scanner_state);
            if let (true, Some(next)) = (reusable, next) {
                break (node, next);
            }
            candidate = reuse::first_child(&node).cloned();
        };

        let (node, next) = found;
        let end = position + node.full_len();
        let scanner_after = node.last_token().map(|token| token.scanner_after().clone());
        tracing::trace!(kind = ?node.kind(), offset = u32::from(position), "reused node");

        self.lookahead.clear();
        self.lexer.seek(end, scanner_after.unwrap_or_default());
        self.stack.push(Entry {
            state: next,
            start: position,
            lookahead_end: end + TextSize::new(node.lookahead()),
            element: node.into(),
            extra: false,
            recoveries: self.recoveries,
        });
        true
    }

    fn shift(&mut self, state: StateId) {
        let Some(token) = self.lookahead.pop_front() else { return };
        self.stack.push(Entry {
            state,
            start: token.start,
            lookahead_end: token.lookahead_end(),
            element: token.token.into(),
            extra: false,
            recoveries: self.recoveries,
        });
    }

    fn reduce(&mut self, production: ProductionId) {
        let table = self.table();
        let info = table.production(production);
        let (position, lookahead_end) = {
            let lookahead = self.peek();
            (lookahead.start, lookahead.lookahead_end())
        };

        let mut children = self.stack.pop(info.child_count());
        let split = children.iter().rposition(|entry| !entry.extra).map_or(0, |index| index + 1);
        let trailing = children.split_off(split);

        let start = children.first().map_or(position, |entry| entry.start);
        let end = children.last().map_or(position, Entry::end);
        let recoveries = children.first().map_or(self.recoveries, |entry| entry.recoveries);
        let lookahead_end = children
            .iter()
            .map(|entry| entry.lookahead_end)
            .fold(lookahead_end, TextSize::max);
        let fragile = recoveries != self.recoveries
            || children.iter().any(|entry| match &entry.element {
                NodeOrToken::Node(node) => node.is_fragile(),
                NodeOrToken::Token(_) => false,
            });

        let mut fields = info.fields.iter().copied();
        let mut green = Vec::with_capacity(children.len());
        for entry in children {
            let field = if entry.extra { None } else { fields.next().flatten() };
            splice(self.symbols(), field, entry.element, &mut green);
        }

        let below = self.stack.state();
        let node = GreenNode::with_parse_info(
            info.lhs,
            green,
            ParseInfo { state: below, lookahead: u32::from(lookahead_end - end), fragile },
        );
        let mut entry = Entry {
            state: below,
            element: node.into(),
            start,
            lookahead_end,
            extra: false,
            recoveries,
        };

        match table.goto(below, info.lhs) {
            Some(state) => {
                entry.state = state;
                self.stack.push(entry);
            }
            None => {
                tracing::error!(state = below.index(), lhs = ?info.lhs, "missing goto");
                entry.element = wrap_error(entry.element);
                self.stack.push_extra(entry);
            }
        }
        for entry in trailing {
            self.stack.push_extra(entry);
        }
    }

    fn accept(mut self) -> GreenNode {
        let end = self.lookahead.pop_front();
        let entries = self.stack.take();
        let kind =
            entries.iter().find(|entry| !entry.extra).map_or(Symbol::ERROR, |e| e.element.kind());

        let mut children = Vec::new();
        for entry in entries {
            match entry.element {
                NodeOrToken::Node(node) if !entry.extra => {
                    children.extend(node.children().iter().cloned());
                }
                element => children.push(GreenChild::new(None, element)),
            }
        }
        children.extend(end.map(|token| GreenChild::new(None, token.token)));
        GreenNode::new(kind, children)
    }
}

/// Adds `element` to `children`, replacing hidden nodes by their children.
/// Spliced children without a field of their own take the hidden node's.
pub(crate) fn splice(
    symbols: &SymbolTable,
    field: Option<FieldId>,
    element: GreenElement,
    children: &mut Vec<GreenChild>,
) {
    match element {
        NodeOrToken::Node(node) if !node.is_error() && !symbols.is_visible(node.kind()) => {
            children.extend(
                node.children()
                    .iter()
                    .map(|child| GreenChild::new(child.field.or(field), child.element.clone())),
            );
        }
        element => children.push(GreenChild::new(field, element)),
    }
}

fn wrap_error(element: GreenElement) -> GreenElement {
    let info = ParseInfo { fragile: true, ..ParseInfo::default() };
    GreenNode::with_parse_info(Symbol::ERROR, vec![GreenChild::new(None, element)], info).into()
}
