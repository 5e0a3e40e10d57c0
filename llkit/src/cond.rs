//! Character-class conditions and the compact pattern syntax that builds them.
//!
//! A [`Condition`] tests a single integer input code. Codes are raw integers
//! (no Unicode classification); [`EOF`] is the reserved end-of-input sentinel.
//!
//! Pattern syntax, parsed by [`Condition::parse`]:
//!
//! ```text
//! a        the code of `a`
//! a-z      inclusive range
//! ^t       any code not matched by term `t` (including end of input)
//! (...)    group; its terms are alternatives
//! $        end of input
//! \c       `c` taken literally (`\n`, `\t`, `\r` are control codes)
//! |        optional separator between alternatives
//! ```
//!
//! Several terms side by side are alternatives, so `a-zA-Z_` and
//! `(a-z)|(A-Z)|_` denote the same condition.

use crate::LlError;
use std::fmt;

/// The end-of-input sentinel.
pub const EOF: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Condition {
    True,
    Equals(i32),
    Range(i32, i32),
    Not(Box<Condition>),
    Or(Vec<Condition>),
}

impl Condition {
    pub fn range(min: i32, max: i32) -> Self {
        Condition::Range(min, max)
    }

    pub fn negate(cond: Condition) -> Self {
        Condition::Not(Box::new(cond))
    }

    /// Disjunction of `conds`, collapsing the single-element case.
    pub fn any_of(mut conds: Vec<Condition>) -> Self {
        if conds.len() == 1 {
            conds.pop().unwrap_or(Condition::Or(Vec::new()))
        } else {
            Condition::Or(conds)
        }
    }

    /// Does `code` satisfy this condition?
    pub fn test(&self, code: i32) -> bool {
        match self {
            Condition::True => true,
            Condition::Equals(c) => *c == code,
            Condition::Range(lo, hi) => *lo <= code && code <= *hi,
            Condition::Not(sub) => !sub.test(code),
            Condition::Or(subs) => subs.iter().any(|s| s.test(code)),
        }
    }

    /// Parse a mini-pattern into a condition tree.
    pub fn parse(pattern: &str) -> Result<Condition, LlError> {
        let mut parser = PatternParser {
            pattern,
            chars: pattern.chars().collect(),
            pos: 0,
        };
        let terms = parser.parse_seq(None)?;
        if terms.is_empty() {
            return Err(LlError::pattern(pattern, 0, "empty pattern"));
        }
        Ok(Condition::any_of(terms))
    }
}

impl From<char> for Condition {
    fn from(c: char) -> Self {
        Condition::Equals(c as i32)
    }
}

impl From<i32> for Condition {
    fn from(code: i32) -> Self {
        Condition::Equals(code)
    }
}

fn fmt_code(f: &mut fmt::Formatter<'_>, code: i32) -> fmt::Result {
    if code == EOF {
        return write!(f, "$");
    }
    match char::from_u32(code as u32) {
        Some('\n') => write!(f, "\\n"),
        Some('\t') => write!(f, "\\t"),
        Some('\r') => write!(f, "\\r"),
        Some(c) if "^$()|\\-".contains(c) => write!(f, "\\{}", c),
        Some(c) if !c.is_control() => write!(f, "{}", c),
        _ => write!(f, "#{}", code),
    }
}

/// Renders the condition back in pattern syntax (`True` renders as `*`).
impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::True => write!(f, "*"),
            Condition::Equals(c) => fmt_code(f, *c),
            Condition::Range(lo, hi) => {
                fmt_code(f, *lo)?;
                write!(f, "-")?;
                fmt_code(f, *hi)
            }
            Condition::Not(sub) => match sub.as_ref() {
                Condition::Or(_) => write!(f, "^{}", sub),
                _ => write!(f, "^({})", sub),
            },
            Condition::Or(subs) => {
                write!(f, "(")?;
                for s in subs {
                    write!(f, "{}", s)?;
                }
                write!(f, ")")
            }
        }
    }
}

struct PatternParser<'p> {
    pattern: &'p str,
    chars: Vec<char>,
    pos: usize,
}

impl PatternParser<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn error(&self, offset: usize, message: &str) -> LlError {
        LlError::pattern(self.pattern, offset, message)
    }

    /// Terms up to end of input (`open == None`) or the `)` closing the group opened at `open`.
    fn parse_seq(&mut self, open: Option<usize>) -> Result<Vec<Condition>, LlError> {
        let mut terms = Vec::new();
        loop {
            match self.peek() {
                None => match open {
                    Some(at) => return Err(self.error(at, "unterminated group")),
                    None => return Ok(terms),
                },
                Some(')') => match open {
                    Some(_) => {
                        self.pos += 1;
                        return Ok(terms);
                    }
                    None => return Err(self.error(self.pos, "unmatched `)`")),
                },
                Some('|') => {
                    self.pos += 1;
                }
                Some(_) => terms.push(self.parse_term()?),
            }
        }
    }

    fn parse_term(&mut self) -> Result<Condition, LlError> {
        let at = self.pos;
        match self.peek() {
            Some('^') => {
                self.pos += 1;
                match self.peek() {
                    None | Some(')') | Some('|') => Err(self.error(at, "dangling `^`")),
                    Some(_) => Ok(Condition::negate(self.parse_term()?)),
                }
            }
            Some('(') => {
                self.pos += 1;
                let terms = self.parse_seq(Some(at))?;
                Ok(Condition::any_of(terms))
            }
            _ => {
                let lo = self.parse_atom()?;
                let is_range = self.peek() == Some('-')
                    && !matches!(self.chars.get(self.pos + 1), None | Some(')') | Some('|'));
                if !is_range {
                    return Ok(Condition::Equals(lo));
                }
                self.pos += 1;
                let hi = self.parse_atom()?;
                if lo == EOF || hi == EOF {
                    return Err(self.error(at, "`$` cannot bound a range"));
                }
                if lo > hi {
                    return Err(self.error(at, "reversed range"));
                }
                Ok(Condition::Range(lo, hi))
            }
        }
    }

    fn parse_atom(&mut self) -> Result<i32, LlError> {
        let at = self.pos;
        match self.bump() {
            Some('\\') => match self.bump() {
                Some('n') => Ok('\n' as i32),
                Some('t') => Ok('\t' as i32),
                Some('r') => Ok('\r' as i32),
                Some(c) => Ok(c as i32),
                None => Err(self.error(at, "dangling escape")),
            },
            Some('$') => Ok(EOF),
            Some(c) => Ok(c as i32),
            None => Err(self.error(at, "unexpected end of pattern")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(c: char) -> i32 {
        c as i32
    }

    #[test]
    fn letters_class() {
        let cond = Condition::parse("a-zA-Z").unwrap();
        assert_eq!(
            cond,
            Condition::Or(vec![
                Condition::Range(code('a'), code('z')),
                Condition::Range(code('A'), code('Z')),
            ])
        );
        for c in 65..=90 {
            assert!(cond.test(c));
        }
        for c in 97..=122 {
            assert!(cond.test(c));
        }
        assert!(!cond.test(48));
        assert!(!cond.test(EOF));
    }

    #[test]
    fn negation_accepts_eof() {
        let cond = Condition::parse("^x").unwrap();
        assert!(!cond.test(code('x')));
        assert!(cond.test(code('y')));
        assert!(cond.test(EOF));
        assert!(cond.test(0x1F600));
    }

    #[test]
    fn groups_and_separators() {
        let a = Condition::parse("(ab)|(cd)").unwrap();
        for c in "abcd".chars() {
            assert!(a.test(code(c)));
        }
        assert!(!a.test(code('e')));
        let b = Condition::parse("^(0-9)").unwrap();
        assert!(b.test(code('a')));
        assert!(!b.test(code('5')));
    }

    #[test]
    fn escapes_and_sentinel() {
        let cond = Condition::parse(r"\^\-\\$").unwrap();
        assert!(cond.test(code('^')));
        assert!(cond.test(code('-')));
        assert!(cond.test(code('\\')));
        assert!(cond.test(EOF));
        assert!(!cond.test(code('$')));
        assert_eq!(Condition::parse(r"\n").unwrap(), Condition::Equals(10));
    }

    #[test]
    fn dash_is_literal_at_edges() {
        let cond = Condition::parse("-a-").unwrap();
        assert!(cond.test(code('-')));
        assert!(cond.test(code('a')));
        assert!(!cond.test(code('b')));
    }

    #[test]
    fn malformed_patterns() {
        for (pattern, offset) in [("(ab", 0), ("ab)", 2), ("a\\", 1), ("x^", 1), ("z-a", 0), ("a-$", 0)] {
            match Condition::parse(pattern) {
                Err(LlError::PatternSyntax { offset: at, .. }) => {
                    assert_eq!(at, offset, "pattern {:?}", pattern)
                }
                other => panic!("expected pattern error for {:?}, got {:?}", pattern, other),
            }
        }
        assert!(Condition::parse("").is_err());
    }

    #[test]
    fn empty_group_matches_nothing() {
        let cond = Condition::parse("()").unwrap();
        assert_eq!(cond, Condition::Or(Vec::new()));
        assert!(!cond.test(code('a')));
    }

    #[test]
    fn display_reparses_to_same_condition() {
        for pattern in ["a-z0-9_", "^x", "^(ab)", r"\(\)$", "(a-c)|(x-z)"] {
            let cond = Condition::parse(pattern).unwrap();
            let shown = cond.to_string();
            assert_eq!(Condition::parse(&shown).unwrap().to_string(), shown, "{}", pattern);
        }
    }
}
