//! Context-free lexing driven by a compiled grammar's lexical table.
//!
//! At every position the lexer first consumes trivia, then offers the
//! position to the external scanner, then takes the longest match of the
//! lexical table. Input nothing recognises becomes a one-character `ERROR`
//! token, so lexing never fails.

mod cursor;
mod scanner;

use tessera_grammar::{CompiledGrammar, LexMode, TokenAccept};
use tessera_tree::{GreenToken, LexInfo, ScannerState, Symbol, TriviaPiece};
use text_size::{TextRange, TextSize};

pub use cursor::ScanCursor;
pub use scanner::ExternalScanner;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: Symbol,
    pub leading: Vec<TriviaPiece>,
    /// Range of the token text, excluding leading trivia.
    pub range: TextRange,
    /// Bytes past the end of the token the lexer looked at.
    pub lookahead: u32,
    pub scanner_before: ScannerState,
    pub scanner_after: ScannerState,
}

impl Token {
    pub fn full_start(&self) -> TextSize {
        self.range.start() - self.leading.iter().map(|piece| piece.len).sum::<TextSize>()
    }

    pub fn full_range(&self) -> TextRange {
        TextRange::new(self.full_start(), self.range.end())
    }

    pub fn into_green(self) -> GreenToken {
        let lex = LexInfo {
            lookahead: self.lookahead,
            scanner_before: self.scanner_before,
            scanner_after: self.scanner_after,
        };
        GreenToken::new(self.kind, self.leading, self.range.len(), lex)
    }
}

pub struct Lexer<'a> {
    text: &'a str,
    grammar: &'a CompiledGrammar,
    scanner: Option<&'a dyn ExternalScanner>,
    position: usize,
    state: ScannerState,
}

impl<'a> Lexer<'a> {
    pub fn new(
        text: &'a str,
        grammar: &'a CompiledGrammar,
        scanner: Option<&'a dyn ExternalScanner>,
    ) -> Self {
        Self { text, grammar, scanner, position: 0, state: ScannerState::new() }
    }

    pub fn position(&self) -> TextSize {
        TextSize::new(self.position as u32)
    }

    pub fn scanner_state(&self) -> &ScannerState {
        &self.state
    }

    /// Continues lexing at `position`, with the scanner in `state`.
    pub fn seek(&mut self, position: TextSize, state: ScannerState) {
        self.position = usize::from(position).min(self.text.len());
        self.state = state;
    }

    pub fn next_token(&mut self) -> Token {
        let scanner_before = self.state.clone();
        let mut examined = self.position;

        let mut leading = Vec::new();
        while let Some((accept, end)) = self.longest_match(LexMode::Trivia, &mut examined) {
            leading.push(TriviaPiece::new(accept.symbol, text_len(self.position, end)));
            self.position = end;
        }

        let start = self.position;
        let (kind, end) = match self.external(&mut examined) {
            Some(token) => token,
            None => match self.longest_match(LexMode::Token, &mut examined) {
                Some((accept, end)) => (accept.symbol, end),
                None => match self.text[start..].chars().next() {
                    Some(ch) => {
                        tracing::trace!(offset = start, ?ch, "unrecognised character");
                        (Symbol::ERROR, start + ch.len_utf8())
                    }
                    None => (Symbol::END, start),
                },
            },
        };
        self.position = end;

        Token {
            kind,
            leading,
            range: TextRange::new(offset(start), offset(end)),
            lookahead: examined.saturating_sub(end) as u32,
            scanner_before,
            scanner_after: self.state.clone(),
        }
    }

    /// Tokens up to and including the end token.
    pub fn tokenize(self) -> Tokenize<'a> {
        Tokenize { lexer: self, done: false }
    }

    fn external(&mut self, examined: &mut usize) -> Option<(Symbol, usize)> {
        let scanner = self.scanner?;
        let mut cursor = ScanCursor::new(self.text, self.position);
        let index = scanner.scan(&mut cursor, &mut self.state);
        *examined = (*examined).max(cursor.examined());
        debug_assert!(self.state.as_bytes().len() <= ScannerState::MAX_LEN);

        let end = cursor.token_end();
        let symbol = self.grammar.externals().get(index?).copied();
        if symbol.is_none() {
            tracing::warn!(?index, "external scanner returned an unknown token");
        }
        symbol.filter(|_| end > self.position).map(|symbol| (symbol, end))
    }

    fn longest_match(&self, mode: LexMode, examined: &mut usize) -> Option<(TokenAccept, usize)> {
        let table = self.grammar.lex_table();
        let mut cursor = ScanCursor::new(self.text, self.position);
        let mut state = table.start(mode);
        let mut best = None;

        while let Some(ch) = cursor.lookahead() {
            let Some(next) = table.next(state, ch) else { break };
            cursor.advance();
            state = next;
            if let Some(accept) = table.accept(state) {
                best = Some((accept, cursor.position()));
            }
        }

        *examined = (*examined).max(cursor.examined());
        best
    }
}

pub struct Tokenize<'a> {
    lexer: Lexer<'a>,
    done: bool,
}

impl Iterator for Tokenize<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.done {
            return None;
        }
        let token = self.lexer.next_token();
        self.done = token.kind == Symbol::END;
        Some(token)
    }
}

fn offset(position: usize) -> TextSize {
    TextSize::new(position as u32)
}

fn text_len(start: usize, end: usize) -> TextSize {
    TextSize::new((end - start) as u32)
}
