/// A cursor over the text following the current position, recording how
/// far it has looked ahead.
pub struct ScanCursor<'a> {
    text: &'a str,
    start: usize,
    position: usize,
    marked_end: Option<usize>,
    examined: usize,
}

impl<'a> ScanCursor<'a> {
    pub(crate) fn new(text: &'a str, start: usize) -> Self {
        Self { text, start, position: start, marked_end: None, examined: start }
    }

    /// The next character, without consuming it. Looking at the end of the
    /// input counts as examining one byte past it.
    pub fn lookahead(&mut self) -> Option<char> {
        let ch = self.text[self.position..].chars().next();
        self.examined = self.examined.max(self.position + ch.map_or(1, char::len_utf8));
        ch
    }

    /// The character after the next one.
    pub fn second(&mut self) -> Option<char> {
        let mut chars = self.text[self.position..].chars();
        let first = chars.next()?;
        let second = chars.next();
        let seen = first.len_utf8() + second.map_or(1, char::len_utf8);
        self.examined = self.examined.max(self.position + seen);
        second
    }

    pub fn advance(&mut self) -> Option<char> {
        let ch = self.lookahead()?;
        self.position += ch.len_utf8();
        Some(ch)
    }

    /// Ends the token at the current position; later advances only look ahead.
    pub fn mark_end(&mut self) {
        self.marked_end = Some(self.position);
    }

    /// Text consumed since the token started.
    pub fn consumed(&self) -> &'a str {
        &self.text[self.start..self.position]
    }

    pub(crate) fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn token_end(&self) -> usize {
        self.marked_end.unwrap_or(self.position)
    }

    pub(crate) fn examined(&self) -> usize {
        self.examined
    }
}
