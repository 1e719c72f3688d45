//! Normalising a [`Grammar`] into numbered symbols, flat productions and
//! lexical token definitions.

use indexmap::IndexSet;
use rustc_hash::{FxHashMap, FxHashSet};
use tessera_tree::{FieldId, Symbol, SymbolKind, SymbolMetadata, SymbolSet, SymbolTable};

use crate::{Grammar, GrammarError, Precedence, Rule};

const MAX_INLINE_DEPTH: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Step {
    pub(crate) symbol: Symbol,
    pub(crate) field: Option<FieldId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Production {
    pub(crate) lhs: Symbol,
    pub(crate) steps: Vec<Step>,
    pub(crate) precedence: Option<Precedence>,
}

/// A terminal matched by the lexical table.
#[derive(Clone, Debug)]
pub(crate) struct LexicalToken {
    pub(crate) symbol: Symbol,
    pub(crate) name: String,
    /// Body with references to other lexical rules inlined.
    pub(crate) rule: Rule,
    pub(crate) precedence: i32,
    pub(crate) is_string: bool,
}

pub(crate) struct PreparedGrammar {
    pub(crate) symbols: SymbolTable,
    /// Production 0 is the augmented `start' -> start`; its `lhs` is
    /// [`Symbol::ERROR`], which no other production uses.
    pub(crate) productions: Vec<Production>,
    pub(crate) tokens: Vec<LexicalToken>,
    pub(crate) trivia: Vec<LexicalToken>,
    pub(crate) externals: Vec<Symbol>,
    pub(crate) synchronizing: SymbolSet,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum TokenKey<'g> {
    Named(&'g str),
    Literal(&'g str),
    Inline(&'g Rule),
}

#[derive(Clone, Debug)]
struct Alternative {
    steps: Vec<Step>,
    precedence: Option<Precedence>,
}

impl Alternative {
    fn empty() -> Self {
        Self { steps: Vec::new(), precedence: None }
    }

    fn single(symbol: Symbol) -> Self {
        Self { steps: vec![Step { symbol, field: None }], precedence: None }
    }
}

struct Preparer<'g> {
    lexical_bodies: FxHashMap<&'g str, &'g Rule>,
    symbols: Vec<SymbolMetadata>,
    terminals: FxHashMap<TokenKey<'g>, Symbol>,
    nonterminals: FxHashMap<&'g str, Symbol>,
    tokens: Vec<LexicalToken>,
    trivia: Vec<LexicalToken>,
    externals: Vec<Symbol>,
    fields: IndexSet<&'g str>,
    productions: Vec<Production>,
    inline_counts: FxHashMap<&'g str, usize>,
    repeat_counts: FxHashMap<&'g str, usize>,
}

pub(crate) fn prepare(grammar: &Grammar) -> Result<PreparedGrammar, GrammarError> {
    let Some((start, _)) = grammar.rules.first() else {
        return Err(GrammarError::NoRules(grammar.name.clone()));
    };

    let externals = grammar.externals.iter().map(String::as_str).collect::<FxHashSet<_>>();
    let lexical_bodies = grammar
        .rules
        .iter()
        .filter(|(name, rule)| !externals.contains(name.as_str()) && rule.is_lexical())
        .map(|(name, rule)| (name.as_str(), rule))
        .collect::<FxHashMap<_, _>>();

    let reachable = reachable_rules(grammar, start, &externals, &lexical_bodies)?;

    let mut preparer = Preparer {
        lexical_bodies,
        symbols: vec![SymbolMetadata::new("end", SymbolKind::Terminal, false, false)],
        terminals: FxHashMap::default(),
        nonterminals: FxHashMap::default(),
        tokens: Vec::new(),
        trivia: Vec::new(),
        externals: Vec::new(),
        fields: IndexSet::new(),
        productions: Vec::new(),
        inline_counts: FxHashMap::default(),
        repeat_counts: FxHashMap::default(),
    };

    let trivia_names = grammar
        .extras
        .iter()
        .filter_map(|extra| match extra {
            Rule::Symbol(name) => Some(&**name),
            _ => None,
        })
        .collect::<FxHashSet<_>>();

    // Named lexical rules, in declaration order.
    for &(name, rule) in &reachable {
        if preparer.lexical_bodies.contains_key(name) && !trivia_names.contains(name) {
            preparer.add_token(TokenKey::Named(name), name, rule, SymbolKind::Terminal)?;
        }
    }

    // Literals and inline tokens, in order of appearance.
    for &(name, rule) in &reachable {
        if !preparer.lexical_bodies.contains_key(name) {
            preparer.collect_inline_tokens(name, rule)?;
        }
    }

    for name in &grammar.externals {
        let symbol = preparer.push_symbol(SymbolMetadata::new(
            name.as_str(),
            SymbolKind::External,
            !name.starts_with('_'),
            !name.starts_with('_'),
        ));
        preparer.terminals.insert(TokenKey::Named(name), symbol);
        preparer.externals.push(symbol);
    }

    for extra in &grammar.extras {
        preparer.add_trivia(extra)?;
    }

    let terminal_count = preparer.symbols.len();

    for &(name, _) in &reachable {
        if !preparer.lexical_bodies.contains_key(name) {
            let hidden = name.starts_with('_');
            let symbol =
                preparer.push_symbol(SymbolMetadata::new(name, SymbolKind::NonTerminal, true, !hidden));
            preparer.nonterminals.insert(name, symbol);
        }
    }

    let start_symbol = preparer.resolve(start, start)?;
    preparer.productions.push(Production {
        lhs: Symbol::ERROR,
        steps: vec![Step { symbol: start_symbol, field: None }],
        precedence: None,
    });

    for &(name, rule) in &reachable {
        let Some(&lhs) = preparer.nonterminals.get(name) else { continue };
        for alternative in preparer.flatten(name, rule)? {
            preparer.productions.push(Production {
                lhs,
                steps: alternative.steps,
                precedence: alternative.precedence,
            });
        }
    }

    let synchronizing = grammar
        .synchronizing
        .iter()
        .map(|token| preparer.synchronizing_symbol(token))
        .collect::<Result<SymbolSet, _>>()?;

    if preparer.symbols.len() >= usize::from(u16::MAX) {
        return Err(GrammarError::TooManySymbols(preparer.symbols.len()));
    }

    let fields = preparer.fields.iter().map(|&name| Box::from(name)).collect();
    let symbols = SymbolTable::new(grammar.name.as_str(), preparer.symbols, fields, terminal_count);

    Ok(PreparedGrammar {
        symbols,
        productions: preparer.productions,
        tokens: preparer.tokens,
        trivia: preparer.trivia,
        externals: preparer.externals,
        synchronizing,
    })
}

/// Rules reachable from the start rule or the extras, in declaration order.
fn reachable_rules<'g>(
    grammar: &'g Grammar,
    start: &'g str,
    externals: &FxHashSet<&str>,
    lexical_bodies: &FxHashMap<&str, &Rule>,
) -> Result<Vec<(&'g str, &'g Rule)>, GrammarError> {
    let mut seen = FxHashSet::default();
    let mut stack = vec![(start, start)];
    for extra in &grammar.extras {
        let mut names = Vec::new();
        symbol_refs(extra, &mut names);
        stack.extend(names.into_iter().map(|name| ("extras", name)));
    }

    while let Some((referrer, name)) = stack.pop() {
        if externals.contains(name) || !seen.insert(name) {
            continue;
        }
        let Some(rule) = grammar.rules.get(name) else {
            return Err(GrammarError::UndefinedSymbol {
                rule: referrer.to_owned(),
                name: name.to_owned(),
            });
        };
        if lexical_bodies.contains_key(name) {
            continue;
        }
        let mut names = Vec::new();
        symbol_refs(rule, &mut names);
        stack.extend(names.into_iter().rev().map(|referred| (name, referred)));
    }

    Ok(grammar
        .rules
        .iter()
        .map(|(name, rule)| (name.as_str(), rule))
        .filter(|(name, _)| seen.contains(name))
        .collect())
}

fn symbol_refs<'g>(rule: &'g Rule, names: &mut Vec<&'g str>) {
    match rule {
        Rule::Blank | Rule::String(_) | Rule::Class(_) | Rule::Token(_) => {}
        Rule::Symbol(name) => names.push(name),
        Rule::Seq(rules) | Rule::Choice(rules) => {
            for rule in rules {
                symbol_refs(rule, names);
            }
        }
        Rule::Repeat(rule)
        | Rule::Repeat1(rule)
        | Rule::Prec { rule, .. }
        | Rule::Field { rule, .. } => symbol_refs(rule, names),
    }
}

impl<'g> Preparer<'g> {
    fn push_symbol(&mut self, metadata: SymbolMetadata) -> Symbol {
        let symbol = Symbol::new(self.symbols.len() as u16);
        self.symbols.push(metadata);
        symbol
    }

    fn lexical_token(
        &self,
        symbol: Symbol,
        name: &str,
        rule: &Rule,
    ) -> Result<LexicalToken, GrammarError> {
        let (precedence, body) = rule.lexical_parts();
        Ok(LexicalToken {
            symbol,
            name: name.to_owned(),
            rule: self.inline_lexical(name, body, 0)?,
            precedence,
            is_string: matches!(body, Rule::String(_)),
        })
    }

    fn add_token(
        &mut self,
        key: TokenKey<'g>,
        name: &str,
        rule: &Rule,
        kind: SymbolKind,
    ) -> Result<Symbol, GrammarError> {
        if let Some(&symbol) = self.terminals.get(&key) {
            return Ok(symbol);
        }

        let (named, visible) = match key {
            TokenKey::Named(name) => (true, !name.starts_with('_')),
            TokenKey::Literal(_) => (false, true),
            TokenKey::Inline(_) => (false, false),
        };
        let symbol = self.push_symbol(SymbolMetadata::new(name, kind, named, visible));
        self.terminals.insert(key, symbol);

        let token = self.lexical_token(symbol, name, rule)?;
        match kind {
            SymbolKind::Trivia => self.trivia.push(token),
            _ => self.tokens.push(token),
        }
        Ok(symbol)
    }

    fn inline_name(&mut self, owner: &'g str, suffix: &str) -> String {
        let count = self.inline_counts.entry(owner).or_default();
        *count += 1;
        format!("{}_{suffix}{count}", owner.trim_start_matches('_'))
    }

    fn collect_inline_tokens(&mut self, owner: &'g str, rule: &'g Rule) -> Result<(), GrammarError> {
        match rule {
            Rule::Blank | Rule::Symbol(_) => {}
            Rule::String(text) => {
                self.add_token(TokenKey::Literal(text), text, rule, SymbolKind::Terminal)?;
            }
            Rule::Class(_) | Rule::Token(_) => {
                if !self.terminals.contains_key(&TokenKey::Inline(rule)) {
                    let name = self.inline_name(owner, "token");
                    self.add_token(TokenKey::Inline(rule), &name, rule, SymbolKind::Terminal)?;
                }
            }
            Rule::Seq(rules) | Rule::Choice(rules) => {
                for rule in rules {
                    self.collect_inline_tokens(owner, rule)?;
                }
            }
            Rule::Repeat(rule)
            | Rule::Repeat1(rule)
            | Rule::Prec { rule, .. }
            | Rule::Field { rule, .. } => self.collect_inline_tokens(owner, rule)?,
        }
        Ok(())
    }

    fn add_trivia(&mut self, extra: &'g Rule) -> Result<(), GrammarError> {
        match extra {
            Rule::Symbol(name) => {
                let Some(rule) = self.lexical_bodies.get(&**name).copied() else {
                    return Err(GrammarError::NonLexicalSymbol {
                        rule: "extras".to_owned(),
                        name: name.to_string(),
                    });
                };
                self.add_token(TokenKey::Named(name), name, rule, SymbolKind::Trivia)?;
            }
            _ => {
                let name = self.inline_name("extras", "token");
                let name = format!("_{name}");
                self.add_token(TokenKey::Inline(extra), &name, extra, SymbolKind::Trivia)?;
            }
        }
        Ok(())
    }

    /// Replaces references to lexical rules with their bodies.
    fn inline_lexical(&self, owner: &str, rule: &Rule, depth: usize) -> Result<Rule, GrammarError> {
        let inline_all = |rules: &[Rule]| -> Result<Vec<Rule>, GrammarError> {
            rules.iter().map(|rule| self.inline_lexical(owner, rule, depth)).collect()
        };
        let inline_one =
            |rule: &Rule| self.inline_lexical(owner, rule, depth).map(Box::new);

        Ok(match rule {
            Rule::Blank | Rule::String(_) | Rule::Class(_) => rule.clone(),
            Rule::Symbol(name) => match self.lexical_bodies.get(&**name) {
                Some(body) if depth < MAX_INLINE_DEPTH => {
                    self.inline_lexical(owner, body.lexical_parts().1, depth + 1)?
                }
                _ => {
                    return Err(GrammarError::NonLexicalSymbol {
                        rule: owner.to_owned(),
                        name: name.to_string(),
                    });
                }
            },
            Rule::Seq(rules) => Rule::Seq(inline_all(rules)?),
            Rule::Choice(rules) => Rule::Choice(inline_all(rules)?),
            Rule::Repeat(rule) => Rule::Repeat(inline_one(rule)?),
            Rule::Repeat1(rule) => Rule::Repeat1(inline_one(rule)?),
            Rule::Prec { rule, .. } | Rule::Field { rule, .. } | Rule::Token(rule) => {
                self.inline_lexical(owner, rule, depth)?
            }
        })
    }

    fn resolve(&self, owner: &str, name: &str) -> Result<Symbol, GrammarError> {
        self.nonterminals
            .get(name)
            .or_else(|| self.terminals.get(&TokenKey::Named(name)))
            .copied()
            .ok_or_else(|| GrammarError::UndefinedSymbol {
                rule: owner.to_owned(),
                name: name.to_owned(),
            })
    }

    fn field_id(&mut self, name: &'g str) -> Option<FieldId> {
        let (index, _) = self.fields.insert_full(name);
        FieldId::new(index as u16 + 1)
    }

    fn flatten(&mut self, owner: &'g str, rule: &'g Rule) -> Result<Vec<Alternative>, GrammarError> {
        Ok(match rule {
            Rule::Blank => vec![Alternative::empty()],
            Rule::String(text) => vec![Alternative::single(self.terminals[&TokenKey::Literal(text)])],
            Rule::Class(_) | Rule::Token(_) => {
                vec![Alternative::single(self.terminals[&TokenKey::Inline(rule)])]
            }
            Rule::Symbol(name) => vec![Alternative::single(self.resolve(owner, name)?)],
            Rule::Seq(rules) => {
                let mut product = vec![Alternative::empty()];
                for rule in rules {
                    let suffixes = self.flatten(owner, rule)?;
                    product = product
                        .iter()
                        .flat_map(|prefix| {
                            suffixes.iter().map(move |suffix| Alternative {
                                steps: prefix.steps.iter().chain(&suffix.steps).copied().collect(),
                                precedence: prefix.precedence.or(suffix.precedence),
                            })
                        })
                        .collect();
                }
                product
            }
            Rule::Choice(rules) => {
                let mut alternatives = Vec::new();
                for rule in rules {
                    alternatives.extend(self.flatten(owner, rule)?);
                }
                alternatives
            }
            Rule::Repeat1(inner) => vec![Alternative::single(self.repetition(owner, inner)?)],
            Rule::Repeat(inner) => {
                vec![Alternative::single(self.repetition(owner, inner)?), Alternative::empty()]
            }
            Rule::Prec { precedence, rule } => {
                let mut alternatives = self.flatten(owner, rule)?;
                for alternative in &mut alternatives {
                    alternative.precedence = alternative.precedence.or(Some(*precedence));
                }
                alternatives
            }
            Rule::Field { name, rule } => {
                let field = self.field_id(name);
                let mut alternatives = self.flatten(owner, rule)?;
                for step in alternatives.iter_mut().flat_map(|alternative| &mut alternative.steps) {
                    step.field = step.field.or(field);
                }
                alternatives
            }
        })
    }

    /// Introduces `aux -> x | aux x` for every alternative `x` of `inner`.
    fn repetition(&mut self, owner: &'g str, inner: &'g Rule) -> Result<Symbol, GrammarError> {
        let count = self.repeat_counts.entry(owner).or_default();
        *count += 1;
        let name = format!("{}_repeat{count}", owner.trim_start_matches('_'));
        let aux = self.push_symbol(SymbolMetadata::new(name, SymbolKind::Auxiliary, false, false));

        let alternatives = self.flatten(owner, inner)?;
        for alternative in &alternatives {
            self.productions.push(Production {
                lhs: aux,
                steps: alternative.steps.clone(),
                precedence: alternative.precedence,
            });
        }
        for alternative in alternatives {
            let mut steps = Vec::with_capacity(alternative.steps.len() + 1);
            steps.push(Step { symbol: aux, field: None });
            steps.extend(alternative.steps);
            self.productions.push(Production { lhs: aux, steps, precedence: alternative.precedence });
        }
        Ok(aux)
    }

    fn synchronizing_symbol(&self, token: &Rule) -> Result<Symbol, GrammarError> {
        let symbol = match token {
            Rule::String(text) => self.terminals.get(&TokenKey::Literal(text)),
            Rule::Symbol(name) => self.terminals.get(&TokenKey::Named(name)),
            _ => None,
        };
        symbol.copied().ok_or_else(|| {
            GrammarError::UnknownSynchronizingToken(match token {
                Rule::String(text) | Rule::Symbol(text) => text.to_string(),
                other => format!("{other:?}"),
            })
        })
    }
}

/// Productions grouped by left-hand side, for the table builder.
pub(crate) fn productions_by_lhs(
    productions: &[Production],
    symbol_count: usize,
) -> Vec<Vec<usize>> {
    let mut by_lhs = vec![Vec::new(); symbol_count];
    for (index, production) in productions.iter().enumerate().skip(1) {
        by_lhs[production.lhs.index()].push(index);
    }
    by_lhs
}

#[cfg(test)]
mod tests {
    use std::fmt::Write as _;

    use expect_test::{Expect, expect};

    use super::*;
    use crate::{CharClass, choice, class, field, optional, prec_left, repeat, repeat1, seq, sym, token};

    fn check(grammar: &Grammar, expect: Expect) {
        let prepared = prepare(grammar).unwrap();
        let symbols = &prepared.symbols;

        let mut out = String::new();
        for (symbol, metadata) in symbols.symbols() {
            writeln!(
                out,
                "{:>2} {:?} {}{}",
                symbol.raw(),
                metadata.kind,
                metadata.name,
                if metadata.visible { "" } else { " (hidden)" }
            )
            .unwrap();
        }
        for production in &prepared.productions[1..] {
            let steps = production
                .steps
                .iter()
                .map(|step| match step.field {
                    Some(field) => format!("{}:{}", symbols.field_name(field), symbols.name(step.symbol)),
                    None => symbols.name(step.symbol).to_owned(),
                })
                .collect::<Vec<_>>();
            let line = format!("{} -> {}", symbols.name(production.lhs), steps.join(" "));
            writeln!(out, "{}", line.trim_end()).unwrap();
        }
        expect.assert_eq(&out);
    }

    fn identifier() -> Rule {
        seq([class(CharClass::ident_start()), repeat(class(CharClass::ident_continue()))])
    }

    #[test]
    fn normalises_rules() {
        let grammar = Grammar::builder("toy")
            .rule("file", repeat(sym("statement")))
            .rule(
                "statement",
                seq![field("name", sym("identifier")), optional(seq!["=", field("value", sym("_value"))]), ";"],
            )
            .rule("_value", choice![sym("identifier"), sym("number")])
            .rule("unused", seq!["?", sym("identifier")])
            .rule("identifier", identifier())
            .rule("number", repeat1(class(CharClass::digit())))
            .extras([class(CharClass::whitespace())])
            .build();

        check(
            &grammar,
            expect![[r#"
                 0 Terminal end (hidden)
                 1 Terminal identifier
                 2 Terminal number
                 3 Terminal =
                 4 Terminal ;
                 5 Trivia _extras_token1 (hidden)
                 6 NonTerminal file
                 7 NonTerminal statement
                 8 NonTerminal _value (hidden)
                 9 Auxiliary file_repeat1 (hidden)
                file_repeat1 -> statement
                file_repeat1 -> file_repeat1 statement
                file -> file_repeat1
                file ->
                statement -> name:identifier = value:_value ;
                statement -> name:identifier ;
                _value -> identifier
                _value -> number
            "#]],
        );
    }

    #[test]
    fn precedence_applies_to_alternatives() {
        let grammar = Grammar::builder("expr")
            .rule(
                "expression",
                choice![
                    prec_left(1, seq![sym("expression"), "+", sym("expression")]),
                    sym("number"),
                ],
            )
            .rule("number", repeat1(class(CharClass::digit())))
            .build();

        let prepared = prepare(&grammar).unwrap();
        let precedences =
            prepared.productions.iter().map(|production| production.precedence.map(|p| p.value)).collect::<Vec<_>>();
        assert_eq!(precedences, [None, Some(1), None]);
    }

    #[test]
    fn inline_token_in_sequence_stays_a_nonterminal() {
        let digits = || repeat1(class(CharClass::digit()));
        let grammar = Grammar::builder("header")
            .rule("file", sym("header"))
            .rule("header", seq!["version", field("number", token(seq![digits(), ".", digits()]))])
            .extras([class(CharClass::whitespace())])
            .build();

        let prepared = prepare(&grammar).unwrap();
        let symbols = &prepared.symbols;
        let header = symbols.symbol_for_name("header", true).unwrap();
        assert_eq!(symbols.metadata(header).kind, SymbolKind::NonTerminal);

        let production = prepared.productions.iter().find(|production| production.lhs == header).unwrap();
        let steps = production.steps.iter().map(|step| symbols.name(step.symbol)).collect::<Vec<_>>();
        assert_eq!(steps, ["version", "header_token1"]);
        assert!(production.steps[1].field.is_some());
        assert!(prepared.tokens.iter().any(|token| token.name == "header_token1"));
    }

    #[test]
    fn undefined_symbol() {
        let grammar = Grammar::builder("broken").rule("file", seq!["(", sym("nothing"), ")"]).build();

        assert_eq!(
            prepare(&grammar).err(),
            Some(GrammarError::UndefinedSymbol { rule: "file".to_owned(), name: "nothing".to_owned() })
        );
    }

    #[test]
    fn synchronizing_tokens_must_exist() {
        let grammar = Grammar::builder("sync")
            .rule("file", repeat(crate::lit(";")))
            .synchronizing([crate::lit(";"), crate::lit("!")])
            .build();

        assert_eq!(
            prepare(&grammar).err(),
            Some(GrammarError::UnknownSynchronizingToken("!".to_owned()))
        );
    }
}
