//! The lexical automaton.
//!
//! Token rules are compiled into one Thompson NFA and determinised into a
//! table of character-range transitions. There are two start states: one
//! for ordinary tokens and one for trivia.

use std::cmp::Ordering;

use rustc_hash::FxHashMap;
use tessera_tree::Symbol;

use crate::prepare::LexicalToken;
use crate::{GrammarError, Rule};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LexStateId(u32);

impl LexStateId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LexMode {
    Token,
    Trivia,
}

/// The token a state accepts, with what is needed to break ties between
/// tokens of equal length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenAccept {
    pub symbol: Symbol,
    pub precedence: i32,
    pub is_string: bool,
    /// Declaration order among tokens of the same mode.
    pub order: u32,
}

impl TokenAccept {
    /// Higher precedence first, then literals over patterns, then the
    /// token declared first.
    fn priority(&self, other: &Self) -> Ordering {
        self.precedence
            .cmp(&other.precedence)
            .then(self.is_string.cmp(&other.is_string))
            .then(other.order.cmp(&self.order))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Transition {
    start: char,
    end: char,
    target: LexStateId,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct LexState {
    transitions: Box<[Transition]>,
    accept: Option<TokenAccept>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LexTable {
    states: Vec<LexState>,
    token_start: LexStateId,
    trivia_start: LexStateId,
}

impl LexTable {
    pub fn start(&self, mode: LexMode) -> LexStateId {
        match mode {
            LexMode::Token => self.token_start,
            LexMode::Trivia => self.trivia_start,
        }
    }

    pub fn next(&self, state: LexStateId, ch: char) -> Option<LexStateId> {
        let transitions = &self.states[state.index()].transitions;
        let index = transitions
            .binary_search_by(|transition| {
                if transition.end < ch {
                    Ordering::Less
                } else if transition.start > ch {
                    Ordering::Greater
                } else {
                    Ordering::Equal
                }
            })
            .ok()?;
        Some(transitions[index].target)
    }

    pub fn accept(&self, state: LexStateId) -> Option<TokenAccept> {
        self.states[state.index()].accept
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }
}

#[derive(Default)]
struct NfaState {
    transitions: Vec<(u32, u32, usize)>,
    epsilon: Vec<usize>,
    accept: Option<TokenAccept>,
}

#[derive(Default)]
struct Nfa {
    states: Vec<NfaState>,
}

impl Nfa {
    fn add(&mut self) -> usize {
        self.states.push(NfaState::default());
        self.states.len() - 1
    }

    fn epsilon(&mut self, from: usize, to: usize) {
        self.states[from].epsilon.push(to);
    }

    fn compile(&mut self, token: &str, rule: &Rule) -> Result<(usize, usize), GrammarError> {
        Ok(match rule {
            Rule::Blank => {
                let state = self.add();
                (state, state)
            }
            Rule::String(text) => {
                let start = self.add();
                let mut end = start;
                for ch in text.chars() {
                    let next = self.add();
                    self.states[end].transitions.push((u32::from(ch), u32::from(ch), next));
                    end = next;
                }
                (start, end)
            }
            Rule::Class(class) => {
                let (start, end) = (self.add(), self.add());
                self.states[start].transitions.extend(
                    class.normalized().into_iter().map(|(lo, hi)| (u32::from(lo), u32::from(hi), end)),
                );
                (start, end)
            }
            Rule::Symbol(name) => {
                return Err(GrammarError::NonLexicalSymbol {
                    rule: token.to_owned(),
                    name: name.to_string(),
                });
            }
            Rule::Seq(rules) => {
                let start = self.add();
                let mut end = start;
                for rule in rules {
                    let (inner_start, inner_end) = self.compile(token, rule)?;
                    self.epsilon(end, inner_start);
                    end = inner_end;
                }
                (start, end)
            }
            Rule::Choice(rules) => {
                let (start, end) = (self.add(), self.add());
                for rule in rules {
                    let (inner_start, inner_end) = self.compile(token, rule)?;
                    self.epsilon(start, inner_start);
                    self.epsilon(inner_end, end);
                }
                (start, end)
            }
            Rule::Repeat(inner) | Rule::Repeat1(inner) => {
                let (start, end) = (self.add(), self.add());
                let (inner_start, inner_end) = self.compile(token, inner)?;
                self.epsilon(start, inner_start);
                self.epsilon(inner_end, inner_start);
                self.epsilon(inner_end, end);
                if matches!(rule, Rule::Repeat(_)) {
                    self.epsilon(start, end);
                }
                (start, end)
            }
            Rule::Prec { rule, .. } | Rule::Field { rule, .. } | Rule::Token(rule) => {
                self.compile(token, rule)?
            }
        })
    }

    /// Adds every state reachable through epsilon moves, sorted.
    fn close(&self, set: &mut Vec<usize>) {
        let mut seen = vec![false; self.states.len()];
        for &state in set.iter() {
            seen[state] = true;
        }
        let mut stack = set.clone();
        while let Some(state) = stack.pop() {
            for &next in &self.states[state].epsilon {
                if !seen[next] {
                    seen[next] = true;
                    set.push(next);
                    stack.push(next);
                }
            }
        }
        set.sort_unstable();
        set.dedup();
    }
}

pub(crate) fn build(
    tokens: &[LexicalToken],
    trivia: &[LexicalToken],
) -> Result<LexTable, GrammarError> {
    let mut nfa = Nfa::default();
    let token_starts = add_tokens(&mut nfa, tokens)?;
    let trivia_starts = add_tokens(&mut nfa, trivia)?;

    let mut builder =
        DfaBuilder { nfa: &nfa, index: FxHashMap::default(), states: Vec::new(), queue: Vec::new() };
    let token_start = builder.intern(token_starts);
    let trivia_start = builder.intern(trivia_starts);
    builder.run();

    Ok(LexTable { states: builder.states, token_start, trivia_start })
}

fn add_tokens(nfa: &mut Nfa, tokens: &[LexicalToken]) -> Result<Vec<usize>, GrammarError> {
    let mut starts = Vec::with_capacity(tokens.len());
    for (order, token) in tokens.iter().enumerate() {
        let (start, end) = nfa.compile(&token.name, &token.rule)?;

        let mut reachable = vec![start];
        nfa.close(&mut reachable);
        if reachable.binary_search(&end).is_ok() {
            return Err(GrammarError::EmptyToken(token.name.clone()));
        }

        nfa.states[end].accept = Some(TokenAccept {
            symbol: token.symbol,
            precedence: token.precedence,
            is_string: token.is_string,
            order: order as u32,
        });
        starts.push(start);
    }
    Ok(starts)
}

struct DfaBuilder<'a> {
    nfa: &'a Nfa,
    index: FxHashMap<Vec<usize>, LexStateId>,
    states: Vec<LexState>,
    queue: Vec<(Vec<usize>, LexStateId)>,
}

impl DfaBuilder<'_> {
    fn intern(&mut self, mut set: Vec<usize>) -> LexStateId {
        self.nfa.close(&mut set);
        if let Some(&id) = self.index.get(&set) {
            return id;
        }
        let id = LexStateId(self.states.len() as u32);
        self.states.push(LexState::default());
        self.index.insert(set.clone(), id);
        self.queue.push((set, id));
        id
    }

    fn run(&mut self) {
        while let Some((set, id)) = self.queue.pop() {
            let edges = set
                .iter()
                .flat_map(|&state| self.nfa.states[state].transitions.iter().copied())
                .collect::<Vec<_>>();

            let mut bounds = edges.iter().flat_map(|&(lo, hi, _)| [lo, hi + 1]).collect::<Vec<_>>();
            bounds.sort_unstable();
            bounds.dedup();

            let mut transitions: Vec<Transition> = Vec::new();
            for window in bounds.windows(2) {
                let (lo, hi) = (window[0], window[1] - 1);
                let targets = edges
                    .iter()
                    .filter(|&&(start, end, _)| start <= lo && hi <= end)
                    .map(|&(_, _, target)| target)
                    .collect::<Vec<_>>();
                if targets.is_empty() {
                    continue;
                }
                let (Some(start), Some(end)) = (char::from_u32(lo), char::from_u32(hi)) else {
                    continue;
                };

                let target = self.intern(targets);
                match transitions.last_mut() {
                    Some(last) if last.target == target && u32::from(last.end) + 1 == lo => {
                        last.end = end;
                    }
                    _ => transitions.push(Transition { start, end, target }),
                }
            }

            let accept = set
                .iter()
                .filter_map(|&state| self.nfa.states[state].accept)
                .max_by(TokenAccept::priority);

            self.states[id.index()] = LexState { transitions: transitions.into(), accept };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CharClass, class, lit, optional, prec, repeat, repeat1, seq};

    fn token(symbol: u16, name: &str, rule: Rule) -> LexicalToken {
        let (precedence, body) = rule.lexical_parts();
        LexicalToken {
            symbol: Symbol::new(symbol),
            name: name.to_owned(),
            is_string: matches!(body, Rule::String(_)),
            rule: body.clone(),
            precedence,
        }
    }

    fn longest_match(table: &LexTable, mode: LexMode, text: &str) -> Option<(Symbol, usize)> {
        let mut state = table.start(mode);
        let mut best = None;
        for (offset, ch) in text.char_indices() {
            match table.next(state, ch) {
                Some(next) => state = next,
                None => break,
            }
            if let Some(accept) = table.accept(state) {
                best = Some((accept.symbol, offset + ch.len_utf8()));
            }
        }
        best
    }

    fn table() -> LexTable {
        let identifier =
            seq([class(CharClass::ident_start()), repeat(class(CharClass::ident_continue()))]);
        let integer = repeat1(class(CharClass::digit()));
        let float = seq([
            repeat1(class(CharClass::digit())),
            lit("."),
            repeat1(class(CharClass::digit())),
            optional(seq([class(CharClass::chars("eE")), repeat1(class(CharClass::digit()))])),
        ]);
        let tokens = vec![
            token(1, "identifier", identifier),
            token(2, "integer", integer),
            token(3, "float", float),
            token(4, "in", lit("in")),
            token(5, "..", lit("..")),
            token(6, "special", prec(1, lit("int"))),
            token(7, "int", lit("int")),
        ];
        let trivia = vec![token(8, "whitespace", repeat1(class(CharClass::whitespace())))];
        build(&tokens, &trivia).unwrap()
    }

    #[test]
    fn longest_match_wins() {
        let table = table();

        assert_eq!(longest_match(&table, LexMode::Token, "inside"), Some((Symbol::new(1), 6)));
        assert_eq!(longest_match(&table, LexMode::Token, "1.5e3"), Some((Symbol::new(3), 5)));
        assert_eq!(longest_match(&table, LexMode::Token, "1..5"), Some((Symbol::new(2), 1)));
        assert_eq!(longest_match(&table, LexMode::Token, "?"), None);
        assert_eq!(longest_match(&table, LexMode::Trivia, " \n x"), Some((Symbol::new(8), 3)));
        assert_eq!(longest_match(&table, LexMode::Trivia, "x"), None);
    }

    #[test]
    fn ties_prefer_precedence_then_literals() {
        let table = table();

        assert_eq!(longest_match(&table, LexMode::Token, "in "), Some((Symbol::new(4), 2)));
        assert_eq!(longest_match(&table, LexMode::Token, "int"), Some((Symbol::new(6), 3)));
    }

    #[test]
    fn empty_tokens_are_rejected() {
        let tokens = vec![token(1, "maybe", repeat(lit("a")))];

        assert_eq!(build(&tokens, &[]), Err(GrammarError::EmptyToken("maybe".to_owned())));
    }
}
