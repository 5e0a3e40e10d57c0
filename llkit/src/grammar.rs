//! Grammar model: an arena of terminals and nonterminals addressed by dense
//! ids, productions holding ids rather than references.
//!
//! Grammars are defined through [`GrammarBuilder`] and then handed to
//! [`convert`](crate::convert::convert), which rewrites them in place and
//! freezes the result.

use crate::LlError;
use crate::action::Action;
use crate::cond::Condition;
use crate::symtab::Symtab;
use smartstring::alias::String;
use std::collections::BTreeSet;
use std::fmt::{self, Write};

/// Dense terminal ordinal; also the analyze-table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TerminalId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NonterminalId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Terminal(TerminalId),
    Nonterminal(NonterminalId),
    Epsilon,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminal {
    pub name: String,
    /// Human-facing name used in diagnostics.
    pub display: String,
    /// Defining mini-pattern, checked on registration; tokenizer builders
    /// use it for the terminal's entry edge.
    pub pattern: String,
}

/// FIRST set of a production or nonterminal; `empty` when it derives ε.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirstSet {
    pub terms: BTreeSet<TerminalId>,
    pub empty: bool,
}

/// FOLLOW set of a nonterminal; `end` when end-of-input may follow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowSet {
    pub terms: BTreeSet<TerminalId>,
    pub end: bool,
}

/// One right-hand-side position: a symbol and the actions run after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub symbol: Symbol,
    pub actions: Vec<Action>,
}

impl Element {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            actions: Vec::new(),
        }
    }

    pub fn with_actions(symbol: Symbol, actions: Vec<Action>) -> Self {
        Self { symbol, actions }
    }

    /// An ε element without actions contributes nothing and may be dropped.
    pub fn is_bare_epsilon(&self) -> bool {
        self.symbol == Symbol::Epsilon && self.actions.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Production {
    pub elements: Vec<Element>,
    pub first: FirstSet,
}

impl Production {
    pub fn new(elements: Vec<Element>) -> Self {
        let elements = if elements.is_empty() {
            vec![Element::new(Symbol::Epsilon)]
        } else {
            elements
        };
        Self {
            elements,
            first: FirstSet::default(),
        }
    }

    pub fn leading(&self) -> Symbol {
        self.elements
            .first()
            .map_or(Symbol::Epsilon, |e| e.symbol)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Nonterminal {
    pub name: String,
    pub productions: Vec<Production>,
    pub first: FirstSet,
    pub follow: FollowSet,
    /// Production index per terminal ordinal, plus a trailing end-of-input column.
    pub table: Vec<Option<usize>>,
    /// Introduced by left-recursion elimination.
    pub synthesized: bool,
}

/// An arena-backed context-free grammar with semantic actions.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub(crate) terminals: Vec<Terminal>,
    pub(crate) nonterminals: Vec<Nonterminal>,
    pub(crate) start: NonterminalId,
}

impl Grammar {
    pub fn terminals(&self) -> &[Terminal] {
        &self.terminals
    }

    pub fn nonterminals(&self) -> &[Nonterminal] {
        &self.nonterminals
    }

    pub fn terminal(&self, id: TerminalId) -> &Terminal {
        &self.terminals[id.0]
    }

    pub fn nonterminal(&self, id: NonterminalId) -> &Nonterminal {
        &self.nonterminals[id.0]
    }

    pub fn start(&self) -> NonterminalId {
        self.start
    }

    pub fn terminal_id(&self, name: &str) -> Option<TerminalId> {
        self.terminals
            .iter()
            .position(|t| t.name == name)
            .map(TerminalId)
    }

    pub fn nonterminal_id(&self, name: &str) -> Option<NonterminalId> {
        self.nonterminals
            .iter()
            .position(|n| n.name == name)
            .map(NonterminalId)
    }

    /// Name of a symbol as written in grammar listings.
    pub fn symbol_name(&self, sym: Symbol) -> &str {
        match sym {
            Symbol::Terminal(t) => &self.terminals[t.0].name,
            Symbol::Nonterminal(n) => &self.nonterminals[n.0].name,
            Symbol::Epsilon => "%eps",
        }
    }

    /// Name of an analyze-table column; the trailing column is end-of-input.
    pub fn column_name(&self, column: usize) -> &str {
        self.terminals
            .get(column)
            .map_or("$", |t| t.name.as_str())
    }

    /// `Lhs -> a B {action} c`, the listing form of one production.
    pub fn production_string(&self, nt: NonterminalId, index: usize) -> String {
        let n = &self.nonterminals[nt.0];
        let mut out = String::new();
        let _ = write!(out, "{} ->", n.name);
        for e in &n.productions[index].elements {
            let _ = write!(out, " {}", self.symbol_name(e.symbol));
            for a in &e.actions {
                let _ = write!(out, " {{{}}}", a);
            }
        }
        out
    }

    pub(crate) fn add_nonterminal(&mut self, name: String, productions: Vec<Production>) -> NonterminalId {
        self.nonterminals.push(Nonterminal {
            name,
            productions,
            synthesized: true,
            ..Nonterminal::default()
        });
        NonterminalId(self.nonterminals.len() - 1)
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, n) in self.nonterminals.iter().enumerate() {
            for p in 0..n.productions.len() {
                writeln!(f, "{}", self.production_string(NonterminalId(i), p))?;
            }
        }
        Ok(())
    }
}

/// A right-hand-side entry as written by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// `None` denotes ε.
    name: Option<String>,
    actions: Vec<Action>,
}

impl Item {
    pub fn sym(name: &str) -> Self {
        Self {
            name: Some(name.into()),
            actions: Vec::new(),
        }
    }

    pub fn epsilon() -> Self {
        Self {
            name: None,
            actions: Vec::new(),
        }
    }

    /// Attach an action that runs after this symbol has been matched.
    pub fn act(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }
}

/// Collects terminals and productions, resolving names on [`build`](GrammarBuilder::build).
#[derive(Debug, Clone, Default)]
pub struct GrammarBuilder {
    terms: Symtab,
    terminals: Vec<Terminal>,
    nonterms: Symtab,
    rules: Vec<(usize, Vec<Item>)>,
    start: Option<String>,
    duplicate: Option<String>,
    bad_pattern: Option<LlError>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a terminal; its ordinal is the registration order. A
    /// malformed `pattern` is reported by [`build`](GrammarBuilder::build).
    pub fn terminal(&mut self, name: &str, display: &str, pattern: &str) -> &mut Self {
        if self.terms.idx(name).is_some() {
            self.duplicate.get_or_insert_with(|| name.into());
            return self;
        }
        if let Err(e) = Condition::parse(pattern) {
            self.bad_pattern.get_or_insert(e);
        }
        self.terms.add(name);
        self.terminals.push(Terminal {
            name: name.into(),
            display: display.into(),
            pattern: pattern.into(),
        });
        self
    }

    pub fn has_terminal(&self, name: &str) -> bool {
        self.terms.idx(name).is_some()
    }

    /// Add `lhs -> items`; an empty `items` is an ε-production.
    pub fn production(&mut self, lhs: &str, items: impl IntoIterator<Item = Item>) -> &mut Self {
        let lhs = self.nonterms.add(lhs);
        self.rules.push((lhs, items.into_iter().collect()));
        self
    }

    /// Choose the start nonterminal (default: the first left-hand side).
    pub fn start(&mut self, name: &str) -> &mut Self {
        self.start = Some(name.into());
        self
    }

    pub fn build(self) -> Result<Grammar, LlError> {
        if let Some(name) = self.duplicate {
            return Err(LlError::DuplicateSymbol { name });
        }
        if let Some(e) = self.bad_pattern {
            return Err(e);
        }
        if let Some(name) = self.nonterms.iter().find(|n| self.terms.idx(n).is_some()) {
            return Err(LlError::DuplicateSymbol { name: name.into() });
        }
        if self.nonterms.is_empty() {
            return Err(LlError::EmptyGrammar {
                message: "no productions".into(),
            });
        }
        let start = match &self.start {
            Some(name) => self.nonterms.idx(name).ok_or_else(|| LlError::EmptyGrammar {
                message: format!("start symbol {:?} has no productions", name.as_str()).into(),
            })?,
            None => 0,
        };

        let mut nonterminals: Vec<Nonterminal> = self
            .nonterms
            .iter()
            .map(|name| Nonterminal {
                name: name.into(),
                ..Nonterminal::default()
            })
            .collect();

        for (lhs, items) in self.rules {
            let mut elements = Vec::with_capacity(items.len());
            for item in items {
                let symbol = match &item.name {
                    None => Symbol::Epsilon,
                    Some(name) => {
                        if let Some(n) = self.nonterms.idx(name) {
                            Symbol::Nonterminal(NonterminalId(n))
                        } else if let Some(t) = self.terms.idx(name) {
                            Symbol::Terminal(TerminalId(t))
                        } else {
                            return Err(LlError::UnknownSymbol {
                                name: name.clone(),
                                lhs: nonterminals[lhs].name.clone(),
                            });
                        }
                    }
                };
                elements.push(Element::with_actions(symbol, item.actions));
            }
            nonterminals[lhs].productions.push(Production::new(elements));
        }

        log::debug!(
            "grammar defined: {} terminals, {} nonterminals, start {}",
            self.terminals.len(),
            nonterminals.len(),
            nonterminals[start].name
        );
        Ok(Grammar {
            terminals: self.terminals,
            nonterminals,
            start: NonterminalId(start),
        })
    }
}
