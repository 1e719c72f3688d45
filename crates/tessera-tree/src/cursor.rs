use crate::{NodeOrToken, SyntaxElement};

/// Preorder walk over a subtree, tokens included.
pub struct Preorder<'a> {
    start: SyntaxElement<'a>,
    next: Option<WalkEvent<'a>>,
    skip_subtree: bool,
}

impl<'a> Preorder<'a> {
    pub(crate) fn new(start: SyntaxElement<'a>) -> Self {
        let next = Some(WalkEvent::Enter(start.clone()));
        Self { start, next, skip_subtree: false }
    }

    /// Does not descend into the element that was just entered.
    pub fn skip_subtree(&mut self) {
        self.skip_subtree = true;
    }
}

impl<'a> Iterator for Preorder<'a> {
    type Item = WalkEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.skip_subtree {
            self.next = self.next.take().and_then(|next| match next {
                WalkEvent::Enter(first_child) => {
                    first_child.parent().map(|parent| WalkEvent::Leave(NodeOrToken::Node(parent)))
                }
                WalkEvent::Leave(parent) => Some(WalkEvent::Leave(parent)),
            });
            self.skip_subtree = false;
        }

        let next = self.next.take();

        self.next = next.as_ref().and_then(|event| {
            Some(match event {
                WalkEvent::Enter(element) => {
                    match element.as_node().and_then(|node| node.first_child()) {
                        Some(child) => WalkEvent::Enter(child),
                        None => WalkEvent::Leave(element.clone()),
                    }
                }
                WalkEvent::Leave(element) => {
                    if element == &self.start {
                        return None;
                    }

                    match element.next_sibling() {
                        Some(sibling) => WalkEvent::Enter(sibling),
                        None => WalkEvent::Leave(NodeOrToken::Node(element.parent()?)),
                    }
                }
            })
        });

        next
    }
}

#[derive(Debug, Clone)]
pub enum WalkEvent<'a> {
    Enter(SyntaxElement<'a>),
    Leave(SyntaxElement<'a>),
}
