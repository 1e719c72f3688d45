//! Walking an edited tree for subtrees the parser can take over unchanged.

use tessera_tree::{GreenElement, GreenNode, NodeOrToken};
use text_size::TextSize;

/// A cursor over the children of an old tree that only moves forward.
pub(crate) struct ReuseCursor {
    stack: Vec<Frame>,
}

struct Frame {
    node: GreenNode,
    /// Index of the current child.
    index: usize,
    /// Absolute offset of the current child.
    start: TextSize,
}

impl ReuseCursor {
    pub(crate) fn new(root: GreenNode) -> Self {
        Self { stack: vec![Frame { node: root, index: 0, start: TextSize::new(0) }] }
    }

    /// The outermost non-empty element starting exactly at `position`.
    ///
    /// Everything ending at or before `position` is skipped for good, so
    /// positions passed in must never decrease. The root itself is never
    /// returned.
    pub(crate) fn seek(&mut self, position: TextSize) -> Option<GreenElement> {
        loop {
            let frame = self.stack.last()?;
            let start = frame.start;
            let Some(element) = frame.node.children().get(frame.index).map(|c| c.element.clone())
            else {
                self.stack.pop();
                self.step_over();
                continue;
            };

            if start + element.full_len() <= position {
                self.step_over();
                continue;
            }
            if start < position {
                match element {
                    NodeOrToken::Node(node) => {
                        self.stack.push(Frame { node, index: 0, start });
                        continue;
                    }
                    NodeOrToken::Token(_) => return None,
                }
            }
            return (start == position).then_some(element);
        }
    }

    fn step_over(&mut self) {
        let Some(frame) = self.stack.last_mut() else { return };
        let len = frame.node.children().get(frame.index).map(|child| child.element.full_len());
        frame.start += len.unwrap_or_default();
        frame.index += 1;
    }
}

/// The first non-empty child of `node`, which starts where `node` starts.
pub(crate) fn first_child(node: &GreenNode) -> Option<&GreenElement> {
    node.children()
        .iter()
        .map(|child| &child.element)
        .find(|element| element.full_len() > TextSize::new(0))
}
