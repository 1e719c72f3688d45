//! Describing text edits and applying them to green trees.

use line_index::LineIndex;
use text_size::{TextRange, TextSize};

use crate::{GreenChild, GreenElement, GreenNode, NodeOrToken};

/// Zero-based row and byte column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub row: u32,
    pub column: u32,
}

impl Point {
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    pub fn of(index: &LineIndex, offset: TextSize) -> Self {
        let line_col = index.line_col(offset);
        Self { row: line_col.line, column: line_col.col }
    }
}

/// A single replacement of `start_byte..old_end_byte` by text ending at
/// `new_end_byte`, with the matching row/column positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InputEdit {
    pub start_byte: TextSize,
    pub old_end_byte: TextSize,
    pub new_end_byte: TextSize,
    pub start_position: Point,
    pub old_end_position: Point,
    pub new_end_position: Point,
}

impl InputEdit {
    /// Replaces `range` of `text` with `replacement`, returning the edit that
    /// describes it together with the new text.
    pub fn replace(text: &str, range: TextRange, replacement: &str) -> (Self, String) {
        let old_index = LineIndex::new(text);

        let mut new_text = String::with_capacity(text.len() + replacement.len());
        new_text.push_str(&text[..usize::from(range.start())]);
        new_text.push_str(replacement);
        new_text.push_str(&text[usize::from(range.end())..]);

        let new_index = LineIndex::new(&new_text);
        let new_end = range.start() + TextSize::of(replacement);

        let edit = Self {
            start_byte: range.start(),
            old_end_byte: range.end(),
            new_end_byte: new_end,
            start_position: Point::of(&old_index, range.start()),
            old_end_position: Point::of(&old_index, range.end()),
            new_end_position: Point::of(&new_index, new_end),
        };

        (edit, new_text)
    }

    /// Clamps the edit to a tree of `len` bytes.
    pub(crate) fn relative(&self, len: TextSize) -> Edit {
        let start = self.start_byte.min(len);
        let old_end = self.old_end_byte.max(start).min(len);
        let inserted = self.new_end_byte.checked_sub(self.start_byte).unwrap_or_default();
        Edit { start, old_end, new_end: start + inserted }
    }
}

/// An edit in coordinates relative to the start of the element it applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Edit {
    pub(crate) start: TextSize,
    pub(crate) old_end: TextSize,
    pub(crate) new_end: TextSize,
}

impl Edit {
    fn inserted(self) -> TextSize {
        self.new_end - self.start
    }

    fn deleted(self) -> TextSize {
        self.old_end - self.start
    }
}

impl GreenElement {
    fn can_absorb(&self) -> bool {
        match self {
            NodeOrToken::Node(node) => {
                node.children().iter().any(|child| child.element.can_absorb())
            }
            NodeOrToken::Token(_) => true,
        }
    }

    fn edit(&self, edit: Edit) -> Self {
        match self {
            NodeOrToken::Node(node) => NodeOrToken::Node(node.edit(edit)),
            NodeOrToken::Token(token) => {
                let full_len = token.full_len() - edit.deleted() + edit.inserted();
                NodeOrToken::Token(token.with_changed_len(full_len))
            }
        }
    }
}

impl GreenNode {
    /// Copies the path to every child touched by `edit`, sharing the rest.
    ///
    /// A child is touched when the edit overlaps it or starts inside the
    /// window its builder looked ahead into. The first touched child that
    /// contains the edit start takes the inserted text; the others only lose
    /// their deleted part.
    pub(crate) fn edit(&self, edit: Edit) -> Self {
        let mut children = Vec::with_capacity(self.children().len());
        let mut insertion_pending = true;
        let mut offset = TextSize::new(0);

        for child in self.children() {
            let start = offset;
            let end = start + child.element.full_len();
            offset = end;

            let lookahead_end = end + TextSize::new(child.element.lookahead());
            let touched = edit.start <= lookahead_end
                && (edit.old_end > start || (insertion_pending && edit.start == start));

            if !touched {
                children.push(child.clone());
                continue;
            }

            let absorbs = insertion_pending && edit.start <= end && child.element.can_absorb();
            if absorbs {
                insertion_pending = false;
            }

            let child_start = edit.start.clamp(start, end) - start;
            let child_old_end = edit.old_end.clamp(start, end) - start;
            let inserted = if absorbs { edit.inserted() } else { TextSize::new(0) };
            let child_edit = Edit {
                start: child_start,
                old_end: child_old_end.max(child_start),
                new_end: child_start + inserted,
            };

            children.push(GreenChild { field: child.field, element: child.element.edit(child_edit) });
        }

        self.with_changed_children(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LexInfo, Symbol, TriviaPiece};

    fn token(kind: u16, leading: u32, len: u32, lookahead: u32) -> GreenChild {
        let leading = if leading == 0 {
            Vec::new()
        } else {
            vec![TriviaPiece::new(Symbol::new(9), leading.into())]
        };
        let lex = LexInfo { lookahead, ..LexInfo::default() };
        GreenChild::new(None, crate::GreenToken::new(Symbol::new(kind), leading, len.into(), lex))
    }

    fn edit(start: u32, old_end: u32, new_end: u32) -> Edit {
        Edit { start: start.into(), old_end: old_end.into(), new_end: new_end.into() }
    }

    // `ab = 12;` as [ab][ =][ 12][;]
    fn assignment() -> GreenNode {
        GreenNode::new(
            Symbol::new(20),
            vec![token(1, 0, 2, 1), token(2, 1, 1, 0), token(3, 1, 2, 1), token(4, 0, 1, 0)],
        )
    }

    #[test]
    fn replacement_inside_a_token() {
        let node = assignment();
        let edited = node.edit(edit(5, 7, 8));

        assert_eq!(edited.full_len(), TextSize::new(9));
        assert!(edited.has_changes());
        let changed = edited.children().iter().map(|c| c.element.has_changes()).collect::<Vec<_>>();
        assert_eq!(changed, [false, false, true, false]);
    }

    #[test]
    fn insertion_at_end_goes_to_preceding_token() {
        let node = assignment();
        let edited = node.edit(edit(2, 2, 3));

        let lens = edited.children().iter().map(|c| c.element.full_len()).collect::<Vec<_>>();
        assert_eq!(lens, [TextSize::new(3), TextSize::new(2), TextSize::new(3), TextSize::new(1)]);
        assert!(edited.children()[0].element.has_changes());
        assert!(!edited.children()[2].element.has_changes());
    }

    #[test]
    fn insertion_at_start() {
        let node = assignment();
        let edited = node.edit(edit(0, 0, 4));

        assert_eq!(edited.full_len(), TextSize::new(12));
        assert!(edited.children()[0].element.has_changes());
        assert!(!edited.children()[1].element.has_changes());
    }

    #[test]
    fn deletion_across_tokens() {
        let node = assignment();
        let edited = node.edit(edit(1, 6, 1));

        let lens = edited.children().iter().map(|c| c.element.full_len()).collect::<Vec<_>>();
        assert_eq!(lens, [TextSize::new(1), TextSize::new(0), TextSize::new(1), TextSize::new(1)]);
        assert!(!edited.children()[3].element.has_changes());
    }

    #[test]
    fn replace_computes_positions() {
        let (edit, text) = InputEdit::replace("a = 1;\nb = 2;\n", TextRange::new(11.into(), 12.into()), "30\n");

        assert_eq!(text, "a = 1;\nb = 30\n;\n");
        assert_eq!(edit.start_position, Point::new(1, 4));
        assert_eq!(edit.old_end_position, Point::new(1, 5));
        assert_eq!(edit.new_end_position, Point::new(2, 0));
        assert_eq!(edit.new_end_byte, TextSize::new(14));
    }
}
