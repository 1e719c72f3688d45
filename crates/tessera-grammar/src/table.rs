//! LALR(1) parse tables.
//!
//! States are built from LR(1) item sets whose cores are merged as soon as
//! they are discovered; lookaheads are propagated until nothing changes.
//! Conflicts are resolved statically and kept for inspection.

use std::cmp::Ordering;
use std::collections::VecDeque;

use indexmap::IndexMap;
use indexmap::map::Entry;
use rustc_hash::FxHashMap;
use tessera_tree::{FieldId, StateId, Symbol, SymbolSet};

use crate::prepare::{Production, Step, productions_by_lhs};
use crate::{Assoc, Precedence};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProductionId(u32);

impl ProductionId {
    /// The augmented production `start' -> start`.
    pub const ACCEPT: Self = Self(0);

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Action {
    #[default]
    Error,
    Shift(StateId),
    Reduce(ProductionId),
    Accept,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductionInfo {
    pub lhs: Symbol,
    /// Field of every child, in order.
    pub fields: Box<[Option<FieldId>]>,
    pub precedence: Option<Precedence>,
}

impl ProductionInfo {
    pub fn child_count(&self) -> usize {
        self.fields.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConflictKind {
    ShiftReduce,
    ReduceReduce,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// A higher precedence won.
    Precedence,
    /// Equal precedence, decided by the reduced production's associativity.
    Associativity,
    /// Nothing else applied; the production declared first won.
    DeclarationOrder,
}

/// A table cell that had more than one candidate action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conflict {
    pub state: StateId,
    pub lookahead: Symbol,
    pub kind: ConflictKind,
    pub chosen: Action,
    pub rejected: Vec<Action>,
    pub resolution: Resolution,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseTable {
    terminal_count: usize,
    nonterminal_count: usize,
    state_count: usize,
    actions: Box<[Action]>,
    gotos: Box<[Option<StateId>]>,
    productions: Box<[ProductionInfo]>,
    conflicts: Vec<Conflict>,
}

impl ParseTable {
    pub fn state_count(&self) -> usize {
        self.state_count
    }

    /// The action for terminal `lookahead` in `state`. Anything that is not
    /// a terminal of the grammar, including [`Symbol::ERROR`], is an error.
    pub fn action(&self, state: StateId, lookahead: Symbol) -> Action {
        if lookahead.index() >= self.terminal_count {
            return Action::Error;
        }
        self.actions[state.index() * self.terminal_count + lookahead.index()]
    }

    pub fn goto(&self, state: StateId, symbol: Symbol) -> Option<StateId> {
        let column = symbol.index().checked_sub(self.terminal_count)?;
        if column >= self.nonterminal_count {
            return None;
        }
        self.gotos[state.index() * self.nonterminal_count + column]
    }

    pub fn production(&self, production: ProductionId) -> &ProductionInfo {
        &self.productions[production.index()]
    }

    pub fn production_count(&self) -> usize {
        self.productions.len()
    }

    /// Terminals with a non-error action in `state`.
    pub fn expected(&self, state: StateId) -> impl Iterator<Item = Symbol> + '_ {
        let row = &self.actions[state.index() * self.terminal_count..][..self.terminal_count];
        row.iter()
            .enumerate()
            .filter(|(_, action)| **action != Action::Error)
            .map(|(terminal, _)| Symbol::new(terminal as u16))
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Item {
    production: u32,
    dot: u32,
}

impl Item {
    fn advance(self) -> Self {
        Self { production: self.production, dot: self.dot + 1 }
    }
}

struct ItemSet {
    kernel: Vec<Item>,
    lookaheads: Vec<SymbolSet>,
}

struct TableBuilder<'a> {
    productions: &'a [Production],
    by_lhs: Vec<Vec<usize>>,
    terminal_count: usize,
    first: Vec<SymbolSet>,
    nullable: Vec<bool>,
    states: Vec<ItemSet>,
    transitions: Vec<IndexMap<Symbol, usize>>,
    conflicts: Vec<Conflict>,
}

#[tracing::instrument(level = "debug", skip_all)]
pub(crate) fn build(
    productions: &[Production],
    terminal_count: usize,
    symbol_count: usize,
) -> ParseTable {
    let mut builder = TableBuilder {
        productions,
        by_lhs: productions_by_lhs(productions, symbol_count),
        terminal_count,
        first: Vec::new(),
        nullable: vec![false; symbol_count],
        states: Vec::new(),
        transitions: Vec::new(),
        conflicts: Vec::new(),
    };
    builder.compute_first(symbol_count);
    builder.build_states();
    builder.into_table(symbol_count)
}

impl TableBuilder<'_> {
    fn is_terminal(&self, symbol: Symbol) -> bool {
        symbol.index() < self.terminal_count
    }

    fn precedence(&self, production: usize) -> i32 {
        self.productions[production].precedence.map_or(0, |precedence| precedence.value)
    }

    fn compute_first(&mut self, symbol_count: usize) {
        self.first = (0..symbol_count)
            .map(|index| {
                let mut set = SymbolSet::with_capacity(self.terminal_count);
                if index < self.terminal_count {
                    set.insert(Symbol::new(index as u16));
                }
                set
            })
            .collect();

        let productions = self.productions;
        let mut changed = true;
        while changed {
            changed = false;
            for production in &productions[1..] {
                let lhs = production.lhs.index();
                let mut nullable = true;
                for step in &production.steps {
                    let first = self.first[step.symbol.index()].clone();
                    changed |= self.first[lhs].union_with(&first);
                    if !self.nullable[step.symbol.index()] {
                        nullable = false;
                        break;
                    }
                }
                if nullable && !self.nullable[lhs] {
                    self.nullable[lhs] = true;
                    changed = true;
                }
            }
        }
    }

    fn first_of(&self, steps: &[Step], lookahead: &SymbolSet) -> SymbolSet {
        let mut set = SymbolSet::with_capacity(self.terminal_count);
        for step in steps {
            set.union_with(&self.first[step.symbol.index()]);
            if !self.nullable[step.symbol.index()] {
                return set;
            }
        }
        set.union_with(lookahead);
        set
    }

    fn closure(&self, state: &ItemSet) -> IndexMap<Item, SymbolSet> {
        let mut items = state
            .kernel
            .iter()
            .copied()
            .zip(state.lookaheads.iter().cloned())
            .collect::<IndexMap<_, _>>();
        let mut queue = (0..items.len()).collect::<Vec<_>>();

        while let Some(index) = queue.pop() {
            let Some((&item, lookahead)) = items.get_index(index) else { continue };
            let production = &self.productions[item.production as usize];
            let Some(step) = production.steps.get(item.dot as usize) else { continue };
            if self.is_terminal(step.symbol) {
                continue;
            }

            let follow = self.first_of(&production.steps[item.dot as usize + 1..], lookahead);
            for &expanded in &self.by_lhs[step.symbol.index()] {
                let expanded = Item { production: expanded as u32, dot: 0 };
                match items.entry(expanded) {
                    Entry::Occupied(mut entry) => {
                        if entry.get_mut().union_with(&follow) {
                            queue.push(entry.index());
                        }
                    }
                    Entry::Vacant(entry) => {
                        queue.push(entry.index());
                        entry.insert(follow.clone());
                    }
                }
            }
        }
        items
    }

    fn build_states(&mut self) {
        let mut index = FxHashMap::<Vec<Item>, usize>::default();
        let start = Item { production: 0, dot: 0 };
        let lookahead = [Symbol::END].into_iter().collect();
        self.states.push(ItemSet { kernel: vec![start], lookaheads: vec![lookahead] });
        self.transitions.push(IndexMap::new());
        index.insert(vec![start], 0);

        let mut queue = VecDeque::from([0]);
        let mut queued = vec![true];

        while let Some(state) = queue.pop_front() {
            queued[state] = false;

            let mut successors = IndexMap::<Symbol, Vec<(Item, SymbolSet)>>::new();
            for (item, lookahead) in self.closure(&self.states[state]) {
                let production = &self.productions[item.production as usize];
                if let Some(step) = production.steps.get(item.dot as usize) {
                    successors.entry(step.symbol).or_default().push((item.advance(), lookahead));
                }
            }

            for (symbol, mut kernel) in successors {
                kernel.sort_unstable_by_key(|(item, _)| *item);
                let core = kernel.iter().map(|(item, _)| *item).collect::<Vec<_>>();

                let target = match index.get(&core) {
                    Some(&target) => {
                        let mut changed = false;
                        for (existing, (_, lookahead)) in
                            self.states[target].lookaheads.iter_mut().zip(&kernel)
                        {
                            changed |= existing.union_with(lookahead);
                        }
                        if changed && !queued[target] {
                            queued[target] = true;
                            queue.push_back(target);
                        }
                        target
                    }
                    None => {
                        let target = self.states.len();
                        let lookaheads = kernel.into_iter().map(|(_, lookahead)| lookahead).collect();
                        self.states.push(ItemSet { kernel: core.clone(), lookaheads });
                        self.transitions.push(IndexMap::new());
                        index.insert(core, target);
                        queued.push(true);
                        queue.push_back(target);
                        target
                    }
                };
                self.transitions[state].insert(symbol, target);
            }
        }
    }

    fn into_table(mut self, symbol_count: usize) -> ParseTable {
        let state_count = self.states.len();
        let nonterminal_count = symbol_count - self.terminal_count;
        let mut actions = vec![Action::Error; state_count * self.terminal_count];
        let mut gotos = vec![None; state_count * nonterminal_count];

        for state in 0..state_count {
            let mut shifts = FxHashMap::<Symbol, Vec<usize>>::default();
            let mut reduces = FxHashMap::<Symbol, Vec<usize>>::default();
            let mut accepts = false;

            for (item, lookahead) in self.closure(&self.states[state]) {
                let production = item.production as usize;
                match self.productions[production].steps.get(item.dot as usize) {
                    Some(step) if self.is_terminal(step.symbol) => {
                        shifts.entry(step.symbol).or_default().push(production);
                    }
                    Some(_) => {}
                    None if production == 0 => accepts = true,
                    None => {
                        for terminal in lookahead.iter() {
                            reduces.entry(terminal).or_default().push(production);
                        }
                    }
                }
            }

            for terminal in (0..self.terminal_count).map(|index| Symbol::new(index as u16)) {
                let shift = shifts.get(&terminal).map(|shifting| {
                    let target = StateId::new(self.transitions[state][&terminal] as u32);
                    (target, shifting.as_slice())
                });
                let mut reducing = reduces.get(&terminal).cloned().unwrap_or_default();
                reducing.sort_unstable();
                reducing.dedup();

                let accept = accepts && terminal == Symbol::END;
                let action =
                    self.resolve(StateId::new(state as u32), terminal, shift, &reducing, accept);
                actions[state * self.terminal_count + terminal.index()] = action;
            }

            for (&symbol, &target) in &self.transitions[state] {
                if !self.is_terminal(symbol) {
                    let column = symbol.index() - self.terminal_count;
                    gotos[state * nonterminal_count + column] = Some(StateId::new(target as u32));
                }
            }
        }

        let productions = self
            .productions
            .iter()
            .map(|production| ProductionInfo {
                lhs: production.lhs,
                fields: production.steps.iter().map(|step| step.field).collect(),
                precedence: production.precedence,
            })
            .collect();

        tracing::debug!(states = state_count, conflicts = self.conflicts.len(), "built parse table");

        ParseTable {
            terminal_count: self.terminal_count,
            nonterminal_count,
            state_count,
            actions: actions.into(),
            gotos: gotos.into(),
            productions,
            conflicts: std::mem::take(&mut self.conflicts),
        }
    }

    fn resolve(
        &mut self,
        state: StateId,
        lookahead: Symbol,
        shift: Option<(StateId, &[usize])>,
        reducing: &[usize],
        accept: bool,
    ) -> Action {
        let kind = ConflictKind::ReduceReduce;
        if accept {
            if !reducing.is_empty() {
                let rejected = reducing.iter().map(|&p| reduce(p)).collect();
                let resolution = Resolution::DeclarationOrder;
                self.record(state, lookahead, kind, Action::Accept, rejected, resolution);
            }
            return Action::Accept;
        }

        // Highest precedence, then lowest id.
        let reduced = reducing.iter().copied().max_by(|&a, &b| {
            self.precedence(a).cmp(&self.precedence(b)).then(b.cmp(&a))
        });

        if let (Some(winner), true) = (reduced, reducing.len() > 1) {
            let resolution = if reducing
                .iter()
                .all(|&p| p == winner || self.precedence(p) < self.precedence(winner))
            {
                Resolution::Precedence
            } else {
                Resolution::DeclarationOrder
            };
            let rejected = reducing.iter().filter(|&&p| p != winner).map(|&p| reduce(p)).collect();
            self.record(state, lookahead, kind, reduce(winner), rejected, resolution);
        }

        match (shift, reduced) {
            (None, None) => Action::Error,
            (Some((target, _)), None) => Action::Shift(target),
            (None, Some(winner)) => reduce(winner),
            (Some((target, shifting)), Some(winner)) => {
                let shift_precedence =
                    shifting.iter().map(|&p| self.precedence(p)).max().unwrap_or_default();
                let first_shifting = shifting.iter().copied().min().unwrap_or(usize::MAX);

                let (shifts, resolution) = match self.precedence(winner).cmp(&shift_precedence) {
                    Ordering::Greater => (false, Resolution::Precedence),
                    Ordering::Less => (true, Resolution::Precedence),
                    Ordering::Equal => match self.productions[winner].precedence.map(|p| p.assoc) {
                        Some(Assoc::Left) => (false, Resolution::Associativity),
                        Some(Assoc::Right) => (true, Resolution::Associativity),
                        _ => (first_shifting <= winner, Resolution::DeclarationOrder),
                    },
                };

                let (chosen, rejected) = if shifts {
                    (Action::Shift(target), reduce(winner))
                } else {
                    (reduce(winner), Action::Shift(target))
                };
                let kind = ConflictKind::ShiftReduce;
                self.record(state, lookahead, kind, chosen, vec![rejected], resolution);
                chosen
            }
        }
    }

    fn record(
        &mut self,
        state: StateId,
        lookahead: Symbol,
        kind: ConflictKind,
        chosen: Action,
        rejected: Vec<Action>,
        resolution: Resolution,
    ) {
        tracing::debug!(
            ?state,
            ?lookahead,
            ?kind,
            ?chosen,
            ?rejected,
            ?resolution,
            "resolved conflict"
        );
        self.conflicts.push(Conflict { state, lookahead, kind, chosen, rejected, resolution });
    }
}

fn reduce(production: usize) -> Action {
    Action::Reduce(ProductionId::new(production as u32))
}
