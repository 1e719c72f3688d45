use tessera_tree::ScannerState;

use crate::ScanCursor;

/// Hand-written lexing for tokens a grammar lists as `externals`.
///
/// The lexer offers every token position to the scanner after skipping
/// trivia. Returning `Some(index)` produces the external token at `index`,
/// ending where the cursor marked the end (or where it stopped). Changes to
/// `state` are kept even when the scanner declines, so it can follow
/// context such as bracket nesting. A token of zero length is a decline.
pub trait ExternalScanner: Send + Sync + 'static {
    fn scan(&self, cursor: &mut ScanCursor<'_>, state: &mut ScannerState) -> Option<usize>;
}
