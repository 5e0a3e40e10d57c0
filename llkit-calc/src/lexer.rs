//! Tokenizer tables for calculator input.
//!
//! States are named after the terminal they accept. Each terminal's pattern
//! is the edge into its state: from the start state, except `size`, whose
//! pattern is the suffix that turns a number into a size. Whitespace is
//! skipped.

use llkit::{Accept, Grammar, Lexicon, LlError, TerminalId, TransitionBuilder};
use smartstring::alias::String;

pub type CalcLexicon = Lexicon<String, ()>;

const START: &str = "start";
const BLANK: &str = "blank";
const NUM: &str = "num";
const SIZE: &str = "size";
const ID: &str = "id";

/// Build the tokenizer for `g`; every accepting state maps to the
/// terminal of the same name.
pub fn lexicon(g: &Grammar) -> Result<CalcLexicon, LlError> {
    for name in [NUM, SIZE, ID] {
        if g.terminal_id(name).is_none() {
            return Err(LlError::UnknownSymbol {
                name: name.into(),
                lhs: "tokenizer".into(),
            });
        }
    }

    let mut b = TransitionBuilder::<String, ()>::new();
    for t in g.terminals() {
        let from = if t.name.as_str() == SIZE { NUM } else { START };
        b.add_edge(from.into(), t.pattern.as_str(), t.name.clone(), None)?;
        b.declare(t.name.clone());
    }
    b.add_edge(NUM.into(), "0-9", NUM.into(), None)?
        .add_edge(ID.into(), "a-zA-Z_0-9", ID.into(), None)?
        .add_edge(START.into(), " \t\r\n", BLANK.into(), None)?
        .add_edge(BLANK.into(), " \t\r\n", BLANK.into(), None)?;

    let mut lex = Lexicon::new(b.build(&START.into())?);
    for (i, t) in g.terminals().iter().enumerate() {
        lex.accept(&t.name, Accept::Token(TerminalId(i)))?;
    }
    lex.accept(&BLANK.into(), Accept::Skip)?;
    Ok(lex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::grammar;
    use llkit::TokenSource;

    fn names(input: &str) -> Vec<(String, String)> {
        let g = grammar().unwrap();
        let lex = lexicon(g).unwrap();
        let mut t = lex.tokenizer(input.chars());
        let mut out = Vec::new();
        loop {
            let tok = t.next_token().unwrap();
            let Some(id) = tok.terminal else { break };
            out.push((g.terminal(id).name.as_str().into(), tok.text.as_str().into()));
        }
        out
    }

    #[test]
    fn sizes_numbers_and_identifiers() {
        let toks = names(" 10k*x_1 -(3)\n");
        let expected = [
            ("size", "10k"),
            ("star", "*"),
            ("id", "x_1"),
            ("minus", "-"),
            ("lp", "("),
            ("num", "3"),
            ("rp", ")"),
        ];
        assert_eq!(toks.len(), expected.len());
        for ((name, text), (en, et)) in toks.iter().zip(expected) {
            assert_eq!((name.as_str(), text.as_str()), (en, et));
        }
    }

    #[test]
    fn parentheses_and_suffixes_come_from_terminal_patterns() {
        let toks = names("(2)(1G)");
        let kinds: Vec<&str> = toks.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(kinds, ["lp", "num", "rp", "lp", "size", "rp"]);
        assert_eq!(toks[4].1.as_str(), "1G");
    }

    #[test]
    fn unknown_character_fails() {
        let g = grammar().unwrap();
        let lex = lexicon(g).unwrap();
        let err = lex.tokenizer("1 % 2".chars()).tokens().unwrap_err();
        assert!(matches!(err, LlError::Syntax { .. }));
    }
}
