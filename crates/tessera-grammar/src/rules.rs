//! The rule language grammars are written in.

/// How an operator groups with operators of the same precedence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Assoc {
    #[default]
    None,
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Precedence {
    pub value: i32,
    pub assoc: Assoc,
}

impl Precedence {
    pub const fn new(value: i32, assoc: Assoc) -> Self {
        Self { value, assoc }
    }
}

/// A set of characters, given as inclusive ranges.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CharClass {
    ranges: Vec<(char, char)>,
    negated: bool,
}

impl CharClass {
    pub fn new(ranges: impl IntoIterator<Item = (char, char)>) -> Self {
        Self { ranges: ranges.into_iter().collect(), negated: false }
    }

    pub fn range(start: char, end: char) -> Self {
        Self::new([(start, end)])
    }

    /// Any of the given characters.
    pub fn chars(chars: &str) -> Self {
        Self::new(chars.chars().map(|ch| (ch, ch)))
    }

    /// Every character.
    pub fn any() -> Self {
        Self { ranges: Vec::new(), negated: true }
    }

    pub fn digit() -> Self {
        Self::range('0', '9')
    }

    pub fn hex_digit() -> Self {
        Self::new([('0', '9'), ('a', 'f'), ('A', 'F')])
    }

    /// `[A-Za-z_]`
    pub fn ident_start() -> Self {
        Self::new([('a', 'z'), ('A', 'Z'), ('_', '_')])
    }

    /// `[A-Za-z0-9_]`
    pub fn ident_continue() -> Self {
        Self::new([('a', 'z'), ('A', 'Z'), ('0', '9'), ('_', '_')])
    }

    pub fn whitespace() -> Self {
        Self::chars(" \t\r\n\u{000B}\u{000C}")
    }

    /// Adds the characters of `other`. Both classes must have the same polarity.
    pub fn union(mut self, other: Self) -> Self {
        debug_assert_eq!(self.negated, other.negated);
        self.ranges.extend(other.ranges);
        self
    }

    /// Every character not in this class.
    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn contains(&self, ch: char) -> bool {
        self.ranges.iter().any(|&(start, end)| start <= ch && ch <= end) != self.negated
    }

    /// Sorted, non-overlapping, non-adjacent positive ranges.
    pub(crate) fn normalized(&self) -> Vec<(char, char)> {
        let mut ranges = self
            .ranges
            .iter()
            .filter(|(start, end)| start <= end)
            .map(|&(start, end)| (u32::from(start), u32::from(end)))
            .collect::<Vec<_>>();
        ranges.sort_unstable();

        let mut merged: Vec<(u32, u32)> = Vec::with_capacity(ranges.len());
        for (start, end) in ranges {
            match merged.last_mut() {
                Some(last) if start <= last.1 + 1 => last.1 = last.1.max(end),
                _ => merged.push((start, end)),
            }
        }

        if self.negated {
            let mut complement = Vec::with_capacity(merged.len() + 1);
            let mut next = 0;
            for (start, end) in merged {
                if start > next {
                    complement.push((next, start - 1));
                }
                next = end + 1;
            }
            if next <= u32::from(char::MAX) {
                complement.push((next, u32::from(char::MAX)));
            }
            merged = complement;
        }

        merged.into_iter().flat_map(|(start, end)| split_surrogates(start, end)).collect()
    }
}

const SURROGATES: (u32, u32) = (0xD800, 0xDFFF);

fn split_surrogates(start: u32, end: u32) -> impl Iterator<Item = (char, char)> {
    let below = (start, end.min(SURROGATES.0 - 1));
    let above = (start.max(SURROGATES.1 + 1), end);
    [below, above].into_iter().filter_map(|(start, end)| {
        if start > end {
            return None;
        }
        Some((char::from_u32(start)?, char::from_u32(end)?))
    })
}

/// A grammar rule.
///
/// Named rules refer to each other through [`Rule::Symbol`]. A named rule
/// built only from strings, classes and `token` is lexical: it becomes a
/// terminal matched by the lexer rather than a node built by the parser.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Rule {
    /// Matches the empty string.
    Blank,
    /// A literal string.
    String(Box<str>),
    /// One character of a class.
    Class(CharClass),
    /// Reference to a named rule or external token.
    Symbol(Box<str>),
    Seq(Vec<Rule>),
    Choice(Vec<Rule>),
    /// Zero or more repetitions.
    Repeat(Box<Rule>),
    /// One or more repetitions.
    Repeat1(Box<Rule>),
    Prec { precedence: Precedence, rule: Box<Rule> },
    Field { name: Box<str>, rule: Box<Rule> },
    /// Lexes the whole content as one token.
    Token(Box<Rule>),
}

impl Rule {
    pub(crate) fn contains_symbol(&self) -> bool {
        match self {
            Self::Blank | Self::String(_) | Self::Class(_) => false,
            Self::Symbol(_) => true,
            Self::Seq(rules) | Self::Choice(rules) => rules.iter().any(Self::contains_symbol),
            Self::Repeat(rule)
            | Self::Repeat1(rule)
            | Self::Prec { rule, .. }
            | Self::Field { rule, .. } => rule.contains_symbol(),
            Self::Token(_) => false,
        }
    }

    fn contains_class(&self) -> bool {
        match self {
            Self::Blank | Self::String(_) | Self::Symbol(_) | Self::Token(_) => false,
            Self::Class(_) => true,
            Self::Seq(rules) | Self::Choice(rules) => rules.iter().any(Self::contains_class),
            Self::Repeat(rule)
            | Self::Repeat1(rule)
            | Self::Prec { rule, .. }
            | Self::Field { rule, .. } => rule.contains_class(),
        }
    }

    /// Whether a named rule with this body is a terminal.
    pub(crate) fn is_lexical(&self) -> bool {
        match self {
            Self::String(_) | Self::Token(_) => true,
            Self::Prec { rule, .. } => rule.is_lexical(),
            _ => !self.contains_symbol() && self.contains_class(),
        }
    }

    /// Lexical precedence and the rule with the outer `prec` and `token`
    /// wrappers removed.
    pub(crate) fn lexical_parts(&self) -> (i32, &Self) {
        match self {
            Self::Prec { precedence, rule } => (precedence.value, rule.lexical_parts().1),
            Self::Token(rule) => rule.lexical_parts(),
            _ => (0, self),
        }
    }
}

impl From<&str> for Rule {
    fn from(text: &str) -> Self {
        lit(text)
    }
}

impl From<CharClass> for Rule {
    fn from(class: CharClass) -> Self {
        Self::Class(class)
    }
}

/// Builds a [`Rule::Seq`] from rules and string literals.
#[macro_export]
macro_rules! seq {
    ($($rule:expr),* $(,)?) => {
        $crate::seq([$($crate::Rule::from($rule)),*])
    };
}

/// Builds a [`Rule::Choice`] from rules and string literals.
#[macro_export]
macro_rules! choice {
    ($($rule:expr),* $(,)?) => {
        $crate::choice([$($crate::Rule::from($rule)),*])
    };
}

pub fn blank() -> Rule {
    Rule::Blank
}

pub fn lit(text: &str) -> Rule {
    Rule::String(text.into())
}

pub fn class(class: CharClass) -> Rule {
    Rule::Class(class)
}

pub fn sym(name: &str) -> Rule {
    Rule::Symbol(name.into())
}

pub fn seq(rules: impl IntoIterator<Item = Rule>) -> Rule {
    let mut rules = rules.into_iter().collect::<Vec<_>>();
    if rules.len() == 1 {
        return rules.remove(0);
    }
    Rule::Seq(rules)
}

pub fn choice(rules: impl IntoIterator<Item = Rule>) -> Rule {
    let mut rules = rules.into_iter().collect::<Vec<_>>();
    if rules.len() == 1 {
        return rules.remove(0);
    }
    Rule::Choice(rules)
}

pub fn optional(rule: impl Into<Rule>) -> Rule {
    Rule::Choice(vec![rule.into(), Rule::Blank])
}

pub fn repeat(rule: impl Into<Rule>) -> Rule {
    Rule::Repeat(Box::new(rule.into()))
}

pub fn repeat1(rule: impl Into<Rule>) -> Rule {
    Rule::Repeat1(Box::new(rule.into()))
}

pub fn field(name: &str, rule: impl Into<Rule>) -> Rule {
    Rule::Field { name: name.into(), rule: Box::new(rule.into()) }
}

pub fn prec(value: i32, rule: impl Into<Rule>) -> Rule {
    Rule::Prec { precedence: Precedence::new(value, Assoc::None), rule: Box::new(rule.into()) }
}

pub fn prec_left(value: i32, rule: impl Into<Rule>) -> Rule {
    Rule::Prec { precedence: Precedence::new(value, Assoc::Left), rule: Box::new(rule.into()) }
}

pub fn prec_right(value: i32, rule: impl Into<Rule>) -> Rule {
    Rule::Prec { precedence: Precedence::new(value, Assoc::Right), rule: Box::new(rule.into()) }
}

pub fn token(rule: impl Into<Rule>) -> Rule {
    Rule::Token(Box::new(rule.into()))
}

/// One or more `rule`s separated by `separator`, with an optional trailing separator.
pub fn sep_by1(separator: &str, rule: impl Into<Rule>) -> Rule {
    let rule = rule.into();
    seq([rule.clone(), repeat(seq([lit(separator), rule])), optional(lit(separator))])
}

/// Like [`sep_by1`], but also matches nothing.
pub fn sep_by(separator: &str, rule: impl Into<Rule>) -> Rule {
    optional(sep_by1(separator, rule))
}
