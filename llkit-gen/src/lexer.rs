//! Lexer for `.llg` grammar files.
//!
//! Built on [`logos`]. Blanks and `--` comments are skipped; line feeds are
//! kept because every declaration and production ends at the end of its line.
//! Lower-case identifiers name terminals (and action functions and fields),
//! capitalized identifiers name nonterminals.
//!
//! String literals accept `\"` and `\\`; any other backslash pair is kept as
//! written, so mini-patterns such as `"\-"` reach the pattern parser intact.

use anyhow::{Result, bail};
use logos::Logos;
use smartstring::alias::String;
use std::fmt;

/// Tokens produced by the grammar lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// End of a line, closing a declaration or production.
    LineFeed,
    /// `->`
    Arrow,
    /// `%term`
    TermDecl,
    /// `%start`
    StartDecl,
    /// `%eps`
    Eps,
    /// `$`, the production's result.
    Result,
    /// `$@`, the production's scratch namespace.
    Local,
    /// `$<n>`, a right-hand-side position.
    Slot(usize),
    /// A lower-case identifier.
    Term(String),
    /// A capitalized identifier.
    NonTerm(String),
    Int(i64),
    Str(String),
    LBrace,
    RBrace,
    LParen,
    RParen,
    Dot,
    Comma,
    Eq,
    Semi,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LineFeed => write!(f, "end of line"),
            Token::Arrow => write!(f, "`->`"),
            Token::TermDecl => write!(f, "`%term`"),
            Token::StartDecl => write!(f, "`%start`"),
            Token::Eps => write!(f, "`%eps`"),
            Token::Result => write!(f, "`$`"),
            Token::Local => write!(f, "`$@`"),
            Token::Slot(n) => write!(f, "`${}`", n),
            Token::Term(s) | Token::NonTerm(s) => write!(f, "`{}`", s),
            Token::Int(n) => write!(f, "`{}`", n),
            Token::Str(s) => write!(f, "{:?}", s.as_str()),
            Token::LBrace => write!(f, "`{{`"),
            Token::RBrace => write!(f, "`}}`"),
            Token::LParen => write!(f, "`(`"),
            Token::RParen => write!(f, "`)`"),
            Token::Dot => write!(f, "`.`"),
            Token::Comma => write!(f, "`,`"),
            Token::Eq => write!(f, "`=`"),
            Token::Semi => write!(f, "`;`"),
        }
    }
}

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\f\r]+")]
enum LogosToken {
    #[token("\n")]
    LineFeed,

    #[regex(r"--[^\n]*")]
    Comment,

    #[token("->")]
    Arrow,

    #[token("%term")]
    TermDecl,

    #[token("%start")]
    StartDecl,

    #[token("%eps")]
    Eps,

    #[token("$")]
    Result,

    #[token("$@")]
    Local,

    #[regex(r"\$[0-9]+")]
    Slot,

    #[regex(r"[a-z_][a-zA-Z0-9_]*")]
    Lower,

    #[regex(r"[A-Z][a-zA-Z0-9_]*")]
    Upper,

    #[regex(r"-?[0-9]+")]
    Int,

    #[regex(r#""([^"\\\n]|\\[^\n])*""#)]
    Str,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token(".")]
    Dot,

    #[token(",")]
    Comma,

    #[token("=")]
    Eq,

    #[token(";")]
    Semi,
}

/// Strip the quotes and resolve `\"` and `\\`.
fn unquote(slice: &str) -> String {
    let body = &slice[1..slice.len() - 1];
    let mut out = String::new();
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(e @ ('"' | '\\')) => out.push(e),
            Some(e) => {
                out.push('\\');
                out.push(e);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Token stream of a grammar file with the 1-based line of every token.
#[derive(Debug, Default)]
pub struct Tokens {
    pub tokens: Vec<Token>,
    pub lines: Vec<usize>,
}

impl Tokens {
    /// Line of the token at `index`; past the end, the last line.
    pub fn line(&self, index: usize) -> usize {
        self.lines
            .get(index)
            .or(self.lines.last())
            .copied()
            .unwrap_or(1)
    }
}

pub struct Lexer<'source> {
    inner: logos::Lexer<'source, LogosToken>,
    line: usize,
}

impl<'source> Lexer<'source> {
    pub fn new(input: &'source str) -> Self {
        Self {
            inner: LogosToken::lexer(input),
            line: 1,
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    /// Next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        while let Some(kind) = self.inner.next() {
            let slice = self.inner.slice();
            let token = match kind {
                Ok(LogosToken::Comment) => continue,
                Ok(LogosToken::LineFeed) => {
                    self.line += 1;
                    Token::LineFeed
                }
                Ok(LogosToken::Arrow) => Token::Arrow,
                Ok(LogosToken::TermDecl) => Token::TermDecl,
                Ok(LogosToken::StartDecl) => Token::StartDecl,
                Ok(LogosToken::Eps) => Token::Eps,
                Ok(LogosToken::Result) => Token::Result,
                Ok(LogosToken::Local) => Token::Local,
                Ok(LogosToken::Slot) => match slice[1..].parse() {
                    Ok(n) => Token::Slot(n),
                    Err(_) => bail!("line {}: position {} is out of range", self.line, slice),
                },
                Ok(LogosToken::Lower) => Token::Term(slice.into()),
                Ok(LogosToken::Upper) => Token::NonTerm(slice.into()),
                Ok(LogosToken::Int) => match slice.parse() {
                    Ok(n) => Token::Int(n),
                    Err(_) => bail!("line {}: integer {} is out of range", self.line, slice),
                },
                Ok(LogosToken::Str) => Token::Str(unquote(slice)),
                Ok(LogosToken::LBrace) => Token::LBrace,
                Ok(LogosToken::RBrace) => Token::RBrace,
                Ok(LogosToken::LParen) => Token::LParen,
                Ok(LogosToken::RParen) => Token::RParen,
                Ok(LogosToken::Dot) => Token::Dot,
                Ok(LogosToken::Comma) => Token::Comma,
                Ok(LogosToken::Eq) => Token::Eq,
                Ok(LogosToken::Semi) => Token::Semi,
                Err(()) => bail!("line {}: unexpected {:?}", self.line, slice),
            };
            return Ok(Some(token));
        }
        Ok(None)
    }

    /// Lex the whole input. A final line feed is supplied when the input
    /// does not end with one.
    pub fn tokenize_all(input: &'source str) -> Result<Tokens> {
        let mut lex = Lexer::new(input);
        let mut out = Tokens::default();
        loop {
            let line = lex.line();
            match lex.next_token()? {
                Some(token) => {
                    out.tokens.push(token);
                    out.lines.push(line);
                }
                None => break,
            }
        }
        if !matches!(out.tokens.last(), None | Some(Token::LineFeed)) {
            out.tokens.push(Token::LineFeed);
            out.lines.push(lex.line());
        }
        Ok(out)
    }
}
