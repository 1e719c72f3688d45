//! Error recovery.
//!
//! When the lookahead has no action the parser first tries to insert a
//! single missing token. Failing that it searches for the cheapest way to
//! continue by skipping tokens and popping subtrees, and wraps everything it
//! discarded in an `ERROR` node. As a last resort it skips one token, or at
//! the end of the input turns what it has into an `ERROR` root.

use tessera_tree::{
    GreenChild, GreenElement, GreenNode, GreenToken, NodeOrToken, ParseInfo, StateId, Symbol,
};
use text_size::TextSize;

use crate::parser::{Lookahead, ParseRun, splice};
use crate::stack::{Entry, Simulation};

const TOKEN_COST: u32 = 100;
const BYTE_COST: u32 = 1;
const SUBTREE_COST: u32 = 100;
const MAX_SKIPPED_TOKENS: usize = 64;

#[derive(Clone, Copy, Debug)]
struct Candidate {
    cost: u32,
    skip: usize,
    pop: usize,
}

impl ParseRun<'_> {
    /// Recovers from an error at the current lookahead. Returns the root of
    /// the tree when the input ended without a way to continue.
    pub(crate) fn recover(&mut self) -> Option<GreenNode> {
        let position = self.peek().start;
        if self.missing_at != Some(position) {
            self.missing_at = Some(position);
            if self.insert_missing() {
                return None;
            }
        }

        if let Some(candidate) = self.cheapest_recovery() {
            tracing::debug!(
                offset = u32::from(position),
                skipped = candidate.skip,
                popped = candidate.pop,
                cost = candidate.cost,
                "recovering"
            );
            self.discard(candidate.pop, candidate.skip);
            return None;
        }

        if self.peek().kind() == Symbol::END {
            tracing::debug!(offset = u32::from(position), "giving up at end of input");
            return Some(self.error_root());
        }
        tracing::debug!(offset = u32::from(position), "skipping one token");
        self.discard(0, 1);
        None
    }

    /// Inserts a zero-width token in front of the lookahead when that is
    /// enough for the lookahead to be accepted.
    fn insert_missing(&mut self) -> bool {
        let table = self.table();
        let states = self.stack.states();
        let lookahead = self.peek().clone();

        let missing = table
            .expected(self.stack.state())
            .filter(|&symbol| symbol != Symbol::END)
            .find(|&symbol| {
                let mut simulation = Simulation::new(&states);
                simulation.feed(table, symbol) && simulation.feed(table, lookahead.kind())
            });
        let Some(missing) = missing else { return false };

        tracing::debug!(
            offset = u32::from(lookahead.start),
            kind = self.symbols().name(missing),
            "inserting missing token"
        );
        self.recoveries += 1;
        let token = GreenToken::missing(missing, lookahead.token.scanner_before().clone());
        self.lookahead.push_front(Lookahead { token, start: lookahead.start });
        true
    }

    /// Finds how many tokens to skip and subtrees to pop so that the next
    /// token is accepted, at the lowest cost. Ties go to fewer skipped tokens,
    /// then fewer popped subtrees.
    fn cheapest_recovery(&mut self) -> Option<Candidate> {
        let table = self.table();
        let states = self.stack.states();
        let depth = states.len() - 1;
        let mut best: Option<Candidate> = None;
        let mut skipped_bytes = 0;

        for skip in 0..=MAX_SKIPPED_TOKENS {
            if !self.fill(skip + 1) {
                break;
            }
            let token_cost = skip as u32 * TOKEN_COST + skipped_bytes * BYTE_COST;
            if best.is_some_and(|best| best.cost <= token_cost) {
                break;
            }

            let resume = &self.lookahead[skip];
            for pop in 0..=depth {
                if skip == 0 && pop == 0 {
                    continue;
                }
                let cost = token_cost + pop as u32 * SUBTREE_COST;
                if best.is_some_and(|best| best.cost <= cost) {
                    break;
                }
                if Simulation::new(&states[..=depth - pop]).feed(table, resume.kind()) {
                    best = Some(Candidate { cost, skip, pop });
                    break;
                }
            }

            let kind = resume.kind();
            if kind == Symbol::END || self.grammar.synchronizing().contains(kind) {
                break;
            }
            skipped_bytes += u32::from(resume.token.full_len());
        }
        best
    }

    /// Pops `pop` subtrees and skips `skip` tokens, keeping everything in an
    /// `ERROR` node on top of the stack.
    fn discard(&mut self, pop: usize, skip: usize) {
        let popped = self.stack.pop(pop);
        let position = self.lookahead.front().map_or(TextSize::new(0), |token| token.start);
        let start = popped.first().map_or(position, |entry| entry.start);
        let mut lookahead_end = position;

        let mut children = Vec::new();
        for entry in popped {
            lookahead_end = lookahead_end.max(entry.lookahead_end);
            match entry.element {
                NodeOrToken::Node(node) if node.is_error() => {
                    children.extend(node.children().iter().cloned());
                }
                element => splice(self.symbols(), None, element, &mut children),
            }
        }
        for token in self.lookahead.drain(..skip) {
            lookahead_end = lookahead_end.max(token.lookahead_end());
            children.push(GreenChild::new(None, token.token));
        }
        if children.is_empty() {
            return;
        }

        self.recoveries += 1;
        let node = error_node(children, self.stack.state(), lookahead_end, start);
        let entry = Entry {
            state: self.stack.state(),
            start,
            lookahead_end,
            element: node,
            extra: true,
            recoveries: self.recoveries,
        };
        self.stack.push_extra(entry);
    }

    fn error_root(&mut self) -> GreenNode {
        let end = self.lookahead.pop_front();
        let mut children = Vec::new();
        for entry in self.stack.take() {
            match entry.element {
                NodeOrToken::Node(node) if node.is_error() => {
                    children.extend(node.children().iter().cloned());
                }
                element => splice(self.symbols(), None, element, &mut children),
            }
        }
        children.extend(end.map(|token| GreenChild::new(None, token.token)));
        GreenNode::new(Symbol::ERROR, children)
    }
}

fn error_node(
    children: Vec<GreenChild>,
    state: StateId,
    lookahead_end: TextSize,
    start: TextSize,
) -> GreenElement {
    let len: TextSize = children.iter().map(|child| child.element.full_len()).sum();
    let lookahead = u32::from(lookahead_end.max(start + len) - (start + len));
    let info = ParseInfo { state, lookahead, fragile: true };
    GreenNode::with_parse_info(Symbol::ERROR, children, info).into()
}
