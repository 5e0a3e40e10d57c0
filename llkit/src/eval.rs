//! Table-driven parser and action evaluator.
//!
//! Parsing runs on two explicit stacks: entries still to be matched or
//! executed, and one frame per production instance in progress. Derivation
//! depth is bounded by heap memory, never by the native call stack.
//!
//! Variable addressing inside a frame:
//!
//! * `$k.f` and `$@.f` live in the frame itself; matching a terminal at slot
//!   `k` binds `$k.text`, `$k.start` and `$k.end`;
//! * `$.f` lives in the parent frame at the slot this production fills, so
//!   writes publish results and reads see values the parent stored there.

use crate::action::{Action, Expr, Value, Variable};
use crate::convert::LlGrammar;
use crate::grammar::{NonterminalId, Symbol};
use crate::lexer::{Token, TokenSource};
use crate::LlError;
use indexmap::IndexMap;
use smartstring::alias::String;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Native callable behind a function-call expression.
pub type NativeFn = Box<dyn Fn(&[Value]) -> Result<Value, std::string::String> + Send + Sync>;

/// Result fields of the start symbol.
pub type Namespace = BTreeMap<String, Value>;

/// Function name to native callable.
#[derive(Default)]
pub struct FunctionTable {
    functions: IndexMap<String, NativeFn>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `f` under `name`, replacing any earlier registration.
    pub fn register<F, E>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(&[Value]) -> Result<Value, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        self.functions.insert(
            name.into(),
            Box::new(move |args| f(args).map_err(|e| e.to_string())),
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&NativeFn> {
        self.functions.get(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.functions.keys()).finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserStats {
    pub tokens: usize,
    pub expansions: usize,
    pub actions: usize,
}

#[derive(Debug, Clone, Copy)]
enum Entry<'g> {
    Symbol(usize, Symbol),
    Action(&'g Action),
    Close,
}

/// One production instance: its own slots and locals.
#[derive(Debug, Default)]
struct Frame {
    /// Slot this production fills in its parent.
    slot: usize,
    values: HashMap<Variable, Value>,
}

/// Drives a converted grammar over a token source.
#[derive(Debug)]
pub struct Evaluator<'g> {
    grammar: &'g LlGrammar,
    functions: &'g FunctionTable,
    stats: ParserStats,
}

impl<'g> Evaluator<'g> {
    pub fn new(grammar: &'g LlGrammar, functions: &'g FunctionTable) -> Self {
        Self {
            grammar,
            functions,
            stats: ParserStats::default(),
        }
    }

    pub fn stats(&self) -> ParserStats {
        self.stats.clone()
    }

    /// Parse the whole token stream from the start symbol and return its
    /// result fields.
    pub fn parse<S: TokenSource>(&mut self, mut source: S) -> Result<Namespace, LlError> {
        let grammar = self.grammar;
        let mut stack = vec![Entry::Symbol(0, Symbol::Nonterminal(grammar.start()))];
        let mut frames = vec![Frame::default()];
        let mut lookahead = source.next_token()?;

        while let Some(entry) = stack.pop() {
            log::trace!("STACK: {} entries, top {:?}, lookahead {:?}", stack.len() + 1, entry, lookahead.text);
            match entry {
                Entry::Symbol(_, Symbol::Epsilon) => {}
                Entry::Symbol(slot, Symbol::Terminal(t)) => {
                    if lookahead.terminal != Some(t) {
                        let expected = format!("`{}`", grammar.terminal(t).display);
                        return Err(self.syntax_error(&lookahead, &expected));
                    }
                    let frame = top(&mut frames);
                    frame.values.insert(Variable::slot(slot, "text"), Value::Str(lookahead.text.clone()));
                    frame.values.insert(Variable::slot(slot, "start"), Value::Int(lookahead.start as i64));
                    frame.values.insert(Variable::slot(slot, "end"), Value::Int(lookahead.end as i64));
                    self.stats.tokens += 1;
                    lookahead = source.next_token()?;
                }
                Entry::Symbol(slot, Symbol::Nonterminal(n)) => {
                    let Some((index, production)) = grammar.expand(n, lookahead.terminal) else {
                        let expected = self.expected(n);
                        return Err(self.syntax_error(&lookahead, &expected));
                    };
                    log::trace!("EXPAND: {}", grammar.production_string(n, index));
                    self.stats.expansions += 1;
                    stack.push(Entry::Close);
                    frames.push(Frame {
                        slot,
                        values: HashMap::new(),
                    });
                    for (pos, e) in production.elements.iter().enumerate().rev() {
                        stack.extend(e.actions.iter().rev().map(Entry::Action));
                        stack.push(Entry::Symbol(pos, e.symbol));
                    }
                }
                Entry::Action(action) => {
                    log::trace!("ACTION: {}", action);
                    let value = self.eval(&action.expr, &frames)?;
                    store(&mut frames, &action.dest, value);
                    self.stats.actions += 1;
                }
                Entry::Close => {
                    frames.pop();
                }
            }
        }

        if !lookahead.is_end() {
            return Err(self.syntax_error(&lookahead, "end of input"));
        }
        let root = frames.pop().unwrap_or_default();
        Ok(root
            .values
            .into_iter()
            .filter(|(v, _)| v.pos == 0)
            .map(|(v, value)| (v.field, value))
            .collect())
    }

    fn eval(&self, expr: &Expr, frames: &[Frame]) -> Result<Value, LlError> {
        match expr {
            Expr::Var(v) => Ok(load(frames, v)),
            Expr::Const(c) => Ok(c.clone()),
            Expr::Call(name, args) => {
                let f = self
                    .functions
                    .get(name)
                    .ok_or_else(|| LlError::ActionEvaluation {
                        function: name.clone(),
                        message: "unknown function".into(),
                    })?;
                let values = args
                    .iter()
                    .map(|a| self.eval(a, frames))
                    .collect::<Result<Vec<_>, _>>()?;
                f(&values).map_err(|message| LlError::ActionEvaluation {
                    function: name.clone(),
                    message: message.into(),
                })
            }
        }
    }

    fn expected(&self, n: NonterminalId) -> std::string::String {
        let names: Vec<_> = self
            .grammar
            .expected(n)
            .into_iter()
            .map(|d| format!("`{}`", d))
            .collect();
        match names.len() {
            0 => format!("nothing ({} derives no input)", self.grammar.nonterminal(n).name),
            1 => names[0].clone(),
            _ => format!("one of {}", names.join(", ")),
        }
    }

    fn syntax_error(&self, token: &Token, expected: &str) -> LlError {
        let found = match token.terminal {
            None => "end of input".to_string(),
            Some(t) => match self.grammar.terminals().get(t.0) {
                Some(term) => format!("`{}` {:?}", term.display, token.text.as_str()),
                None => format!("terminal #{} {:?}", t.0, token.text.as_str()),
            },
        };
        LlError::Syntax {
            span: token.span,
            expected: expected.into(),
            found: found.into(),
        }
    }
}

fn top(frames: &mut [Frame]) -> &mut Frame {
    let last = frames.len() - 1;
    &mut frames[last]
}

/// Frame index and key addressed by `v` from the innermost frame.
fn locate(frames: &[Frame], v: &Variable) -> (usize, Variable) {
    let current = frames.len() - 1;
    if v.is_result() {
        (current - 1, Variable::slot(frames[current].slot, &v.field))
    } else {
        (current, v.clone())
    }
}

fn load(frames: &[Frame], v: &Variable) -> Value {
    let (index, key) = locate(frames, v);
    frames[index].values.get(&key).cloned().unwrap_or_default()
}

fn store(frames: &mut [Frame], v: &Variable, value: Value) {
    let (index, key) = locate(frames, v);
    frames[index].values.insert(key, value);
}
