use crate::Span;
use crate::cond::EOF;

/// Tracks the current lexical position of a tokenizer.
///
/// `LexerCursor` advances over raw input codes, keeping a character offset
/// and a [`Span`] whose `end` is the next unread position. It is `Copy`, so
/// maximal-munch backtracking restores an earlier snapshot instead of
/// retreating code by code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LexerCursor {
    pub offset: usize,
    pub span: Span,
}

impl LexerCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by consuming `code`, updating offset and span end.
    pub fn advance(&mut self, code: i32) {
        if code == EOF {
            return;
        }
        if code == '\n' as i32 {
            self.span.end.line += 1;
            self.span.end.column = 0;
        } else {
            self.span.end.column += 1;
        }
        self.offset += 1;
    }

    /// Begin a new token at the current position.
    pub fn mark(&mut self) {
        self.span.collapse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span;

    #[test]
    fn advance_tracks_lines_and_columns() {
        let mut c = LexerCursor::new();
        for ch in "ab\ncd".chars() {
            c.advance(ch as i32);
        }
        assert_eq!(c.offset, 5);
        assert_eq!(c.span, span!(0, 0, 1, 2));
        c.mark();
        assert!(c.span.is_empty());
    }

    #[test]
    fn eof_does_not_move() {
        let mut c = LexerCursor::new();
        c.advance('x' as i32);
        c.advance(EOF);
        assert_eq!(c.offset, 1);
        assert_eq!(c.span.end.column, 1);
    }
}
