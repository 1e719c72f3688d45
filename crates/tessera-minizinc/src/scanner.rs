//! String literals and string interpolation.
//!
//! `"a\(x)b\(y)c"` is lexed as `string_start` (`"a\(`), `x`, `string_middle`
//! (`)b\(`), `y`, `string_end` (`)c"`). The scanner state holds a little-endian
//! `u16` per open interpolation, counting the parentheses opened inside it,
//! so that only the `)` closing the interpolation resumes the string.

use tessera_lexer::{ExternalScanner, ScanCursor};
use tessera_tree::ScannerState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StringToken {
    Literal,
    Start,
    Middle,
    End,
}

impl StringToken {
    /// In the order of the grammar's `externals`.
    pub(crate) const ALL: [Self; 4] = [Self::Literal, Self::Start, Self::Middle, Self::End];

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Literal => "string_literal",
            Self::Start => "string_start",
            Self::Middle => "string_middle",
            Self::End => "string_end",
        }
    }
}

enum Body {
    Closed,
    Interpolation,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct StringScanner;

impl ExternalScanner for StringScanner {
    fn scan(&self, cursor: &mut ScanCursor<'_>, state: &mut ScannerState) -> Option<usize> {
        let depths = state.bytes_mut();
        let token = match cursor.lookahead()? {
            '"' => {
                cursor.advance();
                match string_body(cursor)? {
                    Body::Closed => StringToken::Literal,
                    Body::Interpolation if depths.len() + LEVEL <= ScannerState::MAX_LEN => {
                        push_level(depths);
                        StringToken::Start
                    }
                    Body::Interpolation => return None,
                }
            }
            '(' => {
                match innermost(depths).map(|depth| depth.checked_add(1)) {
                    Some(Some(depth)) => set_innermost(depths, depth),
                    Some(None) => {
                        tracing::warn!("too many parentheses in a string interpolation");
                        pop_level(depths);
                    }
                    None => {}
                }
                return None;
            }
            ')' => match innermost(depths) {
                Some(0) => {
                    pop_level(depths);
                    cursor.advance();
                    match string_body(cursor)? {
                        Body::Closed => StringToken::End,
                        Body::Interpolation => {
                            push_level(depths);
                            StringToken::Middle
                        }
                    }
                }
                Some(depth) => {
                    set_innermost(depths, depth - 1);
                    return None;
                }
                None => return None,
            },
            _ => return None,
        };
        Some(token as usize)
    }
}

/// Bytes of state per open interpolation.
const LEVEL: usize = size_of::<u16>();

fn innermost(depths: &[u8]) -> Option<u16> {
    let start = depths.len().checked_sub(LEVEL)?;
    Some(u16::from_le_bytes([depths[start], depths[start + 1]]))
}

fn set_innermost(depths: &mut [u8], depth: u16) {
    let start = depths.len() - LEVEL;
    depths[start..].copy_from_slice(&depth.to_le_bytes());
}

fn push_level(depths: &mut Vec<u8>) {
    depths.extend_from_slice(&0u16.to_le_bytes());
}

fn pop_level(depths: &mut Vec<u8>) {
    depths.truncate(depths.len().saturating_sub(LEVEL));
}

/// Consumes string content up to and including the closing quote or the
/// `\(` opening an interpolation. A string ends at the end of its line.
fn string_body(cursor: &mut ScanCursor<'_>) -> Option<Body> {
    loop {
        match cursor.advance()? {
            '"' => return Some(Body::Closed),
            '\n' => return None,
            '\\' => match cursor.advance()? {
                '(' => return Some(Body::Interpolation),
                '\n' => return None,
                _ => {}
            },
            _ => {}
        }
    }
}
