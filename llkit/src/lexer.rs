//! Maximal-munch tokenizer driven by a compiled [`Automaton`].
//!
//! A [`Lexicon`] pairs an automaton with the states that accept a token. The
//! [`Tokenizer`] walks the automaton from the start state until no transition
//! applies, then commits the longest prefix that ended in an accepting state
//! and pushes the rest back onto its unread stack. At end of input the
//! automaton is offered the [`EOF`] code once; an edge on `$` may complete a
//! token there.

use crate::cond::EOF;
use crate::cursor::LexerCursor;
use crate::grammar::TerminalId;
use crate::trans::{Automaton, StateId};
use crate::{LlError, Span};
use smartstring::alias::String;
use std::fmt::Debug;
use std::hash::Hash;

/// Supplier of raw input codes; returns [`EOF`] once exhausted.
pub trait CharSource {
    fn read(&mut self) -> i32;
}

impl<I: Iterator<Item = char>> CharSource for I {
    fn read(&mut self) -> i32 {
        self.next().map_or(EOF, |c| c as i32)
    }
}

/// What an accepting state produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    Token(TerminalId),
    /// Consume the match silently (whitespace, comments).
    Skip,
}

/// A compiled automaton plus its accepting states.
#[derive(Debug, Clone)]
pub struct Lexicon<K, A> {
    automaton: Automaton<K, A>,
    accepts: Vec<Option<Accept>>,
}

impl<K, A> Lexicon<K, A>
where
    K: Eq + Hash + Debug,
{
    pub fn new(automaton: Automaton<K, A>) -> Self {
        let accepts = vec![None; automaton.len()];
        Self { automaton, accepts }
    }

    /// Mark the state named `key` as accepting.
    pub fn accept(&mut self, key: &K, accept: Accept) -> Result<&mut Self, LlError> {
        let state = self
            .automaton
            .state_id(key)
            .ok_or_else(|| LlError::UnresolvedState {
                state: format!("{:?}", key).into(),
            })?;
        self.accepts[state.0] = Some(accept);
        Ok(self)
    }

    pub fn accepting(&self, state: StateId) -> Option<Accept> {
        self.accepts.get(state.0).copied().flatten()
    }

    pub fn automaton(&self) -> &Automaton<K, A> {
        &self.automaton
    }

    pub fn tokenizer<S: CharSource>(&self, source: S) -> Tokenizer<'_, K, A, S> {
        Tokenizer::new(self, source)
    }
}

/// A matched token. `terminal` is `None` for the end-of-input token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub terminal: Option<TerminalId>,
    pub text: String,
    pub span: Span,
    /// Character offsets `[start, end)`.
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn end_of_input(cursor: &LexerCursor) -> Self {
        let at = cursor.span.end;
        Self {
            terminal: None,
            text: String::new(),
            span: Span::new(at, at),
            start: cursor.offset,
            end: cursor.offset,
        }
    }

    pub fn is_end(&self) -> bool {
        self.terminal.is_none()
    }
}

/// Anything the evaluator can pull tokens from.
pub trait TokenSource {
    /// Next token; once input is exhausted every call returns the end token.
    fn next_token(&mut self) -> Result<Token, LlError>;
}

impl<T: TokenSource + ?Sized> TokenSource for &mut T {
    fn next_token(&mut self) -> Result<Token, LlError> {
        (**self).next_token()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LexerStats {
    pub chars: usize,
    pub unreads: usize,
    pub matches: usize,
}

type EdgeCallback<'a, A> = Box<dyn FnMut(&A, i32, usize) + 'a>;

/// Accepted prefix of the current scan.
#[derive(Debug, Clone, Copy)]
struct Match {
    accept: Accept,
    consumed: usize,
    cursor: LexerCursor,
    text_len: usize,
    actions: usize,
}

/// One tokenization session over a shared [`Lexicon`].
pub struct Tokenizer<'a, K, A, S> {
    lexicon: &'a Lexicon<K, A>,
    input: S,
    exhausted: bool,
    unread: Vec<i32>,
    cursor: LexerCursor,
    end: bool,
    callback: Option<EdgeCallback<'a, A>>,
    stats: LexerStats,
}

impl<'a, K, A, S> Tokenizer<'a, K, A, S>
where
    K: Eq + Hash + Debug,
    S: CharSource,
{
    pub fn new(lexicon: &'a Lexicon<K, A>, input: S) -> Self {
        Self {
            lexicon,
            input,
            exhausted: false,
            unread: Vec::new(),
            cursor: LexerCursor::new(),
            end: false,
            callback: None,
            stats: LexerStats::default(),
        }
    }

    /// Report edge actions of committed transitions to `f` as
    /// `(action, input code, offset of the code)`.
    pub fn with_callback(mut self, f: impl FnMut(&A, i32, usize) + 'a) -> Self {
        self.callback = Some(Box::new(f));
        self
    }

    pub fn stats(&self) -> LexerStats {
        self.stats.clone()
    }

    pub fn cursor(&self) -> &LexerCursor {
        &self.cursor
    }

    fn read(&mut self) -> i32 {
        if let Some(code) = self.unread.pop() {
            return code;
        }
        if self.exhausted {
            return EOF;
        }
        let code = self.input.read();
        if code == EOF {
            self.exhausted = true;
        } else {
            self.stats.chars += 1;
        }
        code
    }

    /// Scan one match from the current position; `None` at end of input.
    fn scan(&mut self) -> Result<Option<(Accept, Token)>, LlError> {
        let lexicon = self.lexicon;
        let automaton = lexicon.automaton();
        self.cursor.mark();
        let origin = self.cursor;
        let mut state = automaton.start();
        let mut consumed: Vec<i32> = Vec::new();
        let mut text = String::new();
        let mut actions: Vec<(i32, usize, &'a A)> = Vec::new();
        let mut last: Option<Match> = None;

        loop {
            let code = self.read();
            let Some((next, action)) = automaton.step(state, code) else {
                self.unread.push(code);
                break;
            };
            if let Some(a) = action {
                actions.push((code, self.cursor.offset, a));
            }
            consumed.push(code);
            self.cursor.advance(code);
            if code != EOF {
                if let Some(c) = char::from_u32(code as u32) {
                    text.push(c);
                }
            }
            state = next;
            if let Some(accept) = lexicon.accepting(state) {
                last = Some(Match {
                    accept,
                    consumed: consumed.len(),
                    cursor: self.cursor,
                    text_len: text.len(),
                    actions: actions.len(),
                });
            }
            if code == EOF {
                break;
            }
        }

        let Some(m) = last else {
            let span = Span::new(origin.span.start, self.cursor.span.end);
            for &code in consumed.iter().rev() {
                self.unread.push(code);
            }
            self.cursor = origin;
            let found = match self.unread.last() {
                Some(&code) => code,
                None => EOF,
            };
            if found == EOF {
                return Ok(None);
            }
            return Err(LlError::Syntax {
                span,
                expected: "a token".into(),
                found: describe(found).into(),
            });
        };

        for &code in consumed[m.consumed..].iter().rev() {
            self.unread.push(code);
            self.stats.unreads += 1;
        }
        self.cursor = m.cursor;
        self.stats.matches += 1;
        if let Some(f) = self.callback.as_mut() {
            for &(code, offset, a) in &actions[..m.actions] {
                f(a, code, offset);
            }
        }
        if consumed[..m.consumed].last() == Some(&EOF) {
            self.end = true;
        }
        text.truncate(m.text_len);
        let token = Token {
            terminal: match m.accept {
                Accept::Token(t) => Some(t),
                Accept::Skip => None,
            },
            text,
            span: self.cursor.span,
            start: origin.offset,
            end: self.cursor.offset,
        };
        Ok(Some((m.accept, token)))
    }

    /// Drain the session into a vector, end token excluded.
    pub fn tokens(mut self) -> Result<Vec<Token>, LlError> {
        let mut out = Vec::new();
        loop {
            let token = self.next_token()?;
            if token.is_end() {
                return Ok(out);
            }
            out.push(token);
        }
    }
}

impl<K, A, S> TokenSource for Tokenizer<'_, K, A, S>
where
    K: Eq + Hash + Debug,
    S: CharSource,
{
    fn next_token(&mut self) -> Result<Token, LlError> {
        while !self.end {
            match self.scan()? {
                None => self.end = true,
                Some((Accept::Skip, token)) => {
                    log::trace!("SKIP: {:?} at {}", token.text, token.span);
                }
                Some((Accept::Token(_), token)) => {
                    log::trace!("TOKEN: {:?} {:?} at {}", token.terminal, token.text, token.span);
                    return Ok(token);
                }
            }
        }
        Ok(Token::end_of_input(&self.cursor))
    }
}

/// Pre-built token sequence.
#[derive(Debug, Clone)]
pub struct VecTokens {
    tokens: std::vec::IntoIter<Token>,
    end: LexerCursor,
}

impl VecTokens {
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut end = LexerCursor::new();
        if let Some(last) = tokens.last() {
            end.offset = last.end;
            end.span = Span::new(last.span.end, last.span.end);
        }
        Self {
            tokens: tokens.into_iter(),
            end,
        }
    }

    /// Tokens laid out on one line, separated by single spaces.
    pub fn from_texts<'t>(items: impl IntoIterator<Item = (TerminalId, &'t str)>) -> Self {
        let mut cursor = LexerCursor::new();
        let mut tokens = Vec::new();
        for (terminal, text) in items {
            if !tokens.is_empty() {
                cursor.advance(' ' as i32);
            }
            cursor.mark();
            let start = cursor.offset;
            for c in text.chars() {
                cursor.advance(c as i32);
            }
            tokens.push(Token {
                terminal: Some(terminal),
                text: text.into(),
                span: cursor.span,
                start,
                end: cursor.offset,
            });
        }
        Self::new(tokens)
    }
}

impl TokenSource for VecTokens {
    fn next_token(&mut self) -> Result<Token, LlError> {
        Ok(self
            .tokens
            .next()
            .unwrap_or_else(|| Token::end_of_input(&self.end)))
    }
}

/// Printable form of an input code for diagnostics.
pub fn describe(code: i32) -> std::string::String {
    if code == EOF {
        return "end of input".to_string();
    }
    match char::from_u32(code as u32) {
        Some(c) => format!("{:?}", c),
        None => format!("code {}", code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trans::TransitionBuilder;
    use crate::{Input, span};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    const NUM: TerminalId = TerminalId(0);
    const ID: TerminalId = TerminalId(1);
    const OP: TerminalId = TerminalId(2);
    const ARROW: TerminalId = TerminalId(3);

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum S {
        Start,
        Num,
        Id,
        Ws,
        Minus,
        Arrow,
    }

    fn lexicon() -> Lexicon<S, char> {
        let mut b = TransitionBuilder::<S, char>::new();
        b.add_edge(S::Start, "0-9", S::Num, Some('d'))
            .unwrap()
            .add_edge(S::Num, "0-9", S::Num, Some('d'))
            .unwrap()
            .add_edge(S::Start, "a-zA-Z_", S::Id, None)
            .unwrap()
            .add_edge(S::Id, "a-zA-Z_0-9", S::Id, None)
            .unwrap()
            .add_edge(S::Start, " |\n|\t", S::Ws, None)
            .unwrap()
            .add_edge(S::Ws, " |\n|\t", S::Ws, None)
            .unwrap()
            .add_edge(S::Start, '-', S::Minus, None)
            .unwrap()
            .add_edge(S::Minus, '>', S::Arrow, None)
            .unwrap();
        b.declare(S::Arrow);
        let mut lex = Lexicon::new(b.build(&S::Start).unwrap());
        lex.accept(&S::Num, Accept::Token(NUM))
            .unwrap()
            .accept(&S::Id, Accept::Token(ID))
            .unwrap()
            .accept(&S::Minus, Accept::Token(OP))
            .unwrap()
            .accept(&S::Arrow, Accept::Token(ARROW))
            .unwrap()
            .accept(&S::Ws, Accept::Skip)
            .unwrap();
        lex
    }

    fn kinds(tokens: &[Token]) -> Vec<(TerminalId, &str)> {
        tokens
            .iter()
            .map(|t| (t.terminal.unwrap(), t.text.as_str()))
            .collect()
    }

    #[test]
    fn longest_match_wins() {
        init_logger();
        let lex = lexicon();
        let tokens = lex.tokenizer("x1 42->-\n y".chars()).tokens().unwrap();
        assert_eq!(
            kinds(&tokens),
            [(ID, "x1"), (NUM, "42"), (ARROW, "->"), (OP, "-"), (ID, "y")]
        );
        assert_eq!(tokens[1].span, span!(0, 3, 0, 5));
        assert_eq!((tokens[1].start, tokens[1].end), (3, 5));
        assert_eq!(tokens[4].span, span!(1, 1, 1, 2));
    }

    #[test]
    fn end_token_repeats() {
        let lex = lexicon();
        let mut t = lex.tokenizer("7".chars());
        assert_eq!(t.next_token().unwrap().terminal, Some(NUM));
        let end = t.next_token().unwrap();
        assert!(end.is_end());
        assert_eq!(end.start, 1);
        assert!(t.next_token().unwrap().is_end());
    }

    #[test]
    fn bad_input_is_a_syntax_error() {
        let lex = lexicon();
        let mut t = lex.tokenizer("12 ?".chars());
        assert_eq!(t.next_token().unwrap().text, "12");
        match t.next_token() {
            Err(LlError::Syntax { span, found, .. }) => {
                assert_eq!(found, "'?'");
                assert_eq!(span.start, crate::Position::new(0, 3));
            }
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn callback_sees_committed_transitions_only() {
        let lex = lexicon();
        let mut seen = Vec::new();
        {
            let t = lex
                .tokenizer("12 3".chars())
                .with_callback(|a, code, offset| seen.push((*a, code as u8 as char, offset)));
            assert_eq!(t.tokens().unwrap().len(), 2);
        }
        assert_eq!(seen, [('d', '1', 0), ('d', '2', 1), ('d', '3', 3)]);
    }

    #[test]
    fn rollback_is_counted() {
        let lex = lexicon();
        let mut t = lex.tokenizer("ab".chars());
        t.next_token().unwrap();
        let stats = t.stats();
        assert_eq!(stats.chars, 2);
        assert_eq!(stats.matches, 1);
        assert_eq!(stats.unreads, 0);
    }

    #[test]
    fn eof_edge_is_offered_once() {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        enum Q {
            Start,
            Word,
            Done,
        }
        let mut b = TransitionBuilder::<Q, ()>::new();
        b.add_edge(Q::Start, "a-z", Q::Word, None)
            .unwrap()
            .add_edge(Q::Word, "a-z", Q::Word, None)
            .unwrap()
            .add_edge(Q::Word, Input::pattern("$"), Q::Done, None)
            .unwrap();
        b.declare(Q::Done);
        let mut lex = Lexicon::new(b.build(&Q::Start).unwrap());
        lex.accept(&Q::Done, Accept::Token(TerminalId(0))).unwrap();
        let tokens = lex.tokenizer("abc".chars()).tokens().unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "abc");
        // only a word closed by end of input is a token
        assert!(lex.tokenizer("ab cd".chars()).tokens().is_err());
    }

    #[test]
    fn vec_tokens_lay_out_positions() {
        let mut v = VecTokens::from_texts([(NUM, "1"), (OP, "+"), (NUM, "22")]);
        let a = v.next_token().unwrap();
        let b = v.next_token().unwrap();
        let c = v.next_token().unwrap();
        assert_eq!((a.start, b.start, c.start, c.end), (0, 2, 4, 6));
        let end = v.next_token().unwrap();
        assert!(end.is_end());
        assert_eq!(end.start, 6);
    }
}
