use tessera_grammar::{Action, ParseTable};
use tessera_tree::{GreenElement, StateId, Symbol};
use text_size::TextSize;

#[derive(Clone, Debug)]
pub(crate) struct Entry {
    /// State after the entry was pushed.
    pub(crate) state: StateId,
    pub(crate) element: GreenElement,
    /// Absolute offset of the element, including its leading trivia.
    pub(crate) start: TextSize,
    /// Furthest offset examined while the element was produced.
    pub(crate) lookahead_end: TextSize,
    /// Error nodes are kept on the stack but never counted by reductions.
    pub(crate) extra: bool,
    /// Value of the recovery counter when the element's first token was pushed.
    pub(crate) recoveries: u32,
}

impl Entry {
    pub(crate) fn end(&self) -> TextSize {
        self.start + self.element.full_len()
    }
}

#[derive(Debug, Default)]
pub(crate) struct Stack {
    entries: Vec<Entry>,
}

impl Stack {
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn state(&self) -> StateId {
        self.entries.last().map_or(StateId::START, |entry| entry.state)
    }

    pub(crate) fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Pushes an entry that leaves the parser in its current state.
    pub(crate) fn push_extra(&mut self, mut entry: Entry) {
        entry.state = self.state();
        entry.extra = true;
        self.entries.push(entry);
    }

    /// Pops `count` entries that take part in reductions, together with the
    /// extras above and between them. Entries come back in text order.
    pub(crate) fn pop(&mut self, count: usize) -> Vec<Entry> {
        let mut popped = Vec::new();
        let mut remaining = count;
        while remaining > 0 {
            let Some(entry) = self.entries.pop() else { break };
            if !entry.extra {
                remaining -= 1;
            }
            popped.push(entry);
        }
        popped.reverse();
        popped
    }

    /// States after each entry that takes part in reductions, bottom first,
    /// starting with the initial state.
    pub(crate) fn states(&self) -> Vec<StateId> {
        let entries = self.entries.iter().filter(|entry| !entry.extra);
        std::iter::once(StateId::START).chain(entries.map(|entry| entry.state)).collect()
    }

    pub(crate) fn take(&mut self) -> Vec<Entry> {
        std::mem::take(&mut self.entries)
    }
}

/// Replays table actions on a copy of the stack states without building
/// anything.
pub(crate) struct Simulation<'s> {
    base: &'s [StateId],
    pushed: Vec<StateId>,
}

impl<'s> Simulation<'s> {
    pub(crate) fn new(base: &'s [StateId]) -> Self {
        Self { base, pushed: Vec::new() }
    }

    fn top(&self) -> Option<StateId> {
        self.pushed.last().or(self.base.last()).copied()
    }

    fn pop(&mut self, count: usize) -> bool {
        let from_pushed = count.min(self.pushed.len());
        self.pushed.truncate(self.pushed.len() - from_pushed);
        let rest = count - from_pushed;
        if rest >= self.base.len() {
            return false;
        }
        self.base = &self.base[..self.base.len() - rest];
        true
    }

    /// Runs the reductions `symbol` triggers and then shifts it. Returns
    /// `false` when the symbol ends in an error.
    pub(crate) fn feed(&mut self, table: &ParseTable, symbol: Symbol) -> bool {
        loop {
            let Some(state) = self.top() else { return false };
            match table.action(state, symbol) {
                Action::Shift(next) => {
                    self.pushed.push(next);
                    return true;
                }
                Action::Accept => return true,
                Action::Error => return false,
                Action::Reduce(production) => {
                    let info = table.production(production);
                    if !self.pop(info.child_count()) {
                        return false;
                    }
                    let Some(next) = self.top().and_then(|top| table.goto(top, info.lhs)) else {
                        return false;
                    };
                    self.pushed.push(next);
                }
            }
        }
    }
}
