//! Error and source-location types shared by every stage of the toolkit.
//!
//! Construction-time failures ([`LlError::PatternSyntax`],
//! [`LlError::UnresolvedState`], [`LlError::AmbiguousGrammar`] and the grammar
//! definition errors) are fatal to the build that raised them; no partially
//! built automaton or table is ever returned alongside them. Parse-time
//! failures ([`LlError::Syntax`], [`LlError::ActionEvaluation`]) are reported
//! per session and never retried internally.
//!
//! # Examples
//!
//! ```rust
//! # use llkit::{LlError, Position, Span};
//! let span = Span::new(Position::new(0, 3), Position::new(0, 4));
//! let err = LlError::Syntax {
//!     span,
//!     expected: "`+`".into(),
//!     found: "`)`".into(),
//! };
//! assert!(err.to_string().contains("expected `+`"));
//! ```

use smartstring::alias::String;
use thiserror::Error;

/// A 0-based line/column position in source text.
#[derive(Debug, Clone, Default, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// 0-based line number.
    pub line: usize,
    /// 0-based column number (character position in the line).
    pub column: usize,
}

impl Position {
    /// Creates a new `Position`.
    #[inline]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open source range: `[start, end)`.
///
/// Invariants are not enforced here, but it is conventional for `start <= end`
/// in lexicographic `(line, column)` ordering.
#[derive(Debug, Clone, Default, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    /// Creates a new `Span`.
    #[inline]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Start (or restart) this span at its current `end` position.
    /// Effect: span(x,y, z,w) -> span(z,w, z,w)
    pub fn collapse(&mut self) {
        self.start = self.end;
    }

    /// Is this span empty (start == end)?
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Every failure the toolkit reports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlError {
    /// Malformed mini-pattern, raised when an edge or terminal is defined.
    #[error("bad pattern {pattern:?} at offset {offset}: {message}")]
    PatternSyntax {
        pattern: String,
        offset: usize,
        message: String,
    },

    /// An edge targets a state that was never defined.
    #[error("unresolved state {state}")]
    UnresolvedState { state: String },

    /// Two productions compete for the same analyze-table cell.
    #[error(
        "grammar is not LL(1): {nonterminal} has productions {first} and {second} on lookahead {lookahead}"
    )]
    AmbiguousGrammar {
        nonterminal: String,
        lookahead: String,
        first: usize,
        second: usize,
    },

    /// A grammar production names a symbol that is neither a terminal nor a nonterminal.
    #[error("unknown symbol {name:?} in production of {lhs}")]
    UnknownSymbol { name: String, lhs: String },

    /// The same name was registered twice (e.g. a terminal and a nonterminal).
    #[error("duplicate symbol {name:?}")]
    DuplicateSymbol { name: String },

    /// The grammar has no nonterminals, or the start symbol is not one.
    #[error("empty grammar: {message}")]
    EmptyGrammar { message: String },

    /// The lookahead does not match the expected terminal or has no table entry.
    #[error("syntax error at {span}: expected {expected}, found {found}")]
    Syntax {
        span: Span,
        expected: String,
        found: String,
    },

    /// A semantic action failed at runtime.
    #[error("action evaluation failed in {function}: {message}")]
    ActionEvaluation { function: String, message: String },

    /// A rendered analyze-table grid could not be read back.
    #[error("malformed grid at line {line}: {message}")]
    Grid { line: usize, message: String },
}

impl LlError {
    pub(crate) fn pattern(pattern: &str, offset: usize, message: &str) -> Self {
        LlError::PatternSyntax {
            pattern: pattern.into(),
            offset,
            message: message.into(),
        }
    }

    /// Returns `true` for errors raised while building an automaton or grammar.
    pub fn is_construction(&self) -> bool {
        !matches!(self, LlError::Syntax { .. } | LlError::ActionEvaluation { .. })
    }
}

/// Build a [`Span`] inline from 0-based line/column coordinates.
///
/// # Examples
///
/// ```rust
/// # use llkit::span;
/// let s = span!(0, 0, 1, 4);
/// assert_eq!(s.end.column, 4);
/// ```
#[macro_export]
macro_rules! span {
    ($line_start:expr, $col_start:expr, $line_end:expr, $col_end:expr) => {
        $crate::Span {
            start: $crate::Position {
                line: $line_start,
                column: $col_start,
            },
            end: $crate::Position {
                line: $line_end,
                column: $col_end,
            },
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_makes_empty() {
        let mut s = span!(0, 1, 2, 3);
        assert!(!s.is_empty());
        s.collapse();
        assert!(s.is_empty());
        assert_eq!(s.start, Position::new(2, 3));
    }

    #[test]
    fn construction_errors_are_classified() {
        assert!(LlError::UnresolvedState { state: "q1".into() }.is_construction());
        assert!(LlError::pattern("(a", 2, "unterminated group").is_construction());
        let syntax = LlError::Syntax {
            span: Span::default(),
            expected: "x".into(),
            found: "y".into(),
        };
        assert!(!syntax.is_construction());
        assert!(syntax.to_string().contains("0:0 to 0:0"));
    }

    fn _assert_send_sync_static<T: Send + Sync + 'static>() {}
    #[test]
    fn error_is_send_sync_static() {
        _assert_send_sync_static::<LlError>();
    }
}
