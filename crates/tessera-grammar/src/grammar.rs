use indexmap::IndexMap;

use crate::Rule;

/// A named set of rules. The first rule is the start rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grammar {
    pub name: String,
    pub rules: IndexMap<String, Rule>,
    /// Tokens allowed anywhere between other tokens, kept as trivia.
    pub extras: Vec<Rule>,
    /// Tokens produced by an external scanner, by index.
    pub externals: Vec<String>,
    /// Tokens error recovery never skips past.
    pub synchronizing: Vec<Rule>,
}

impl Grammar {
    pub fn builder(name: &str) -> GrammarBuilder {
        GrammarBuilder {
            grammar: Self {
                name: name.to_owned(),
                rules: IndexMap::new(),
                extras: Vec::new(),
                externals: Vec::new(),
                synchronizing: Vec::new(),
            },
        }
    }

    /// Starts from every rule and setting of `base`.
    ///
    /// Redefined rules keep their position, so the start rule stays the start
    /// rule unless it is itself redefined.
    pub fn extend(base: &Self, name: &str) -> GrammarBuilder {
        GrammarBuilder { grammar: Self { name: name.to_owned(), ..base.clone() } }
    }

    pub fn start_rule(&self) -> Option<&str> {
        self.rules.keys().next().map(String::as_str)
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }
}

#[derive(Clone, Debug)]
pub struct GrammarBuilder {
    grammar: Grammar,
}

impl GrammarBuilder {
    /// Defines or redefines a rule.
    #[must_use]
    pub fn rule(mut self, name: &str, rule: impl Into<Rule>) -> Self {
        self.grammar.rules.insert(name.to_owned(), rule.into());
        self
    }

    /// Redefines a rule in terms of its current definition.
    #[must_use]
    pub fn rule_with(mut self, name: &str, f: impl FnOnce(Rule) -> Rule) -> Self {
        let original = self.grammar.rules.get(name).cloned().unwrap_or(Rule::Blank);
        self.grammar.rules.insert(name.to_owned(), f(original));
        self
    }

    #[must_use]
    pub fn extras(mut self, extras: impl IntoIterator<Item = Rule>) -> Self {
        self.grammar.extras = extras.into_iter().collect();
        self
    }

    #[must_use]
    pub fn externals<S: Into<String>>(mut self, externals: impl IntoIterator<Item = S>) -> Self {
        self.grammar.externals = externals.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn synchronizing(mut self, tokens: impl IntoIterator<Item = Rule>) -> Self {
        self.grammar.synchronizing = tokens.into_iter().collect();
        self
    }

    pub fn build(self) -> Grammar {
        self.grammar
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lit, seq, sym};

    #[test]
    fn extension_keeps_rule_order() {
        let base = Grammar::builder("base")
            .rule("file", sym("item"))
            .rule("item", lit("a"))
            .rule("other", lit("b"))
            .build();

        let derived = Grammar::extend(&base, "derived")
            .rule_with("item", |item| seq([item, lit(";")]))
            .rule("extra", lit("c"))
            .build();

        assert_eq!(derived.start_rule(), Some("file"));
        assert_eq!(derived.rules.keys().collect::<Vec<_>>(), ["file", "item", "other", "extra"]);
        assert_eq!(derived.rule("item"), Some(&seq([lit("a"), lit(";")])));
        assert_eq!(base.rule("item"), Some(&lit("a")));
    }
}
