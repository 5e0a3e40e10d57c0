//! Action rewriting for grammar transformations.
//!
//! Conversion moves right-hand-side elements between productions. Each move
//! is described here as a variable mapping applied to every action of the
//! moved elements, so attribute references keep denoting the same runtime
//! values. Actions are rebuilt, never edited in place.
//!
//! Two extra kinds of field carry values across the seams a rewrite creates:
//!
//! * production-local fields (`$@.#3.v`) hold a spliced prefix's results
//!   inside the production that absorbed it;
//! * inherited fields (`#in.v`) pass the partial result of a left-recursive
//!   nonterminal into its synthesized tail, which reads them as `$.#in.v`.

use crate::action::{Action, Expr, Variable};
use crate::grammar::{Element, NonterminalId, Production, Symbol};
use smartstring::alias::String;
use std::collections::BTreeSet;

const INHERITED: &str = "#in.";

/// Name of the inherited field that carries result field `field`.
pub fn inherited(field: &str) -> String {
    let mut s = String::from(INHERITED);
    s.push_str(field);
    s
}

impl Expr {
    /// Rebuild this expression with every variable passed through `f`.
    pub fn remap(&self, f: &impl Fn(&Variable) -> Variable) -> Expr {
        match self {
            Expr::Var(v) => Expr::Var(f(v)),
            Expr::Const(c) => Expr::Const(c.clone()),
            Expr::Call(name, args) => Expr::Call(name.clone(), args.iter().map(|a| a.remap(f)).collect()),
        }
    }
}

impl Action {
    /// Rebuild this action with its destination and every source variable
    /// passed through `f`.
    pub fn remap(&self, f: &impl Fn(&Variable) -> Variable) -> Action {
        Action::new(f(&self.dest), self.expr.remap(f))
    }
}

fn remap_element(e: &Element, f: &impl Fn(&Variable) -> Variable) -> Element {
    Element::with_actions(e.symbol, e.actions.iter().map(|a| a.remap(f)).collect())
}

fn is_lone_bare_epsilon(elements: &[Element]) -> bool {
    matches!(elements, [e] if e.is_bare_epsilon())
}

/// Substitution of a prefix production for the leading nonterminal of a tail
/// production: `i -> j γ` with `j -> δ` becomes `i -> δ γ`.
#[derive(Debug)]
pub struct Splice<'a> {
    /// Right-hand side of the substituted `j` production.
    pub prefix: &'a [Element],
    /// Full right-hand side of the `i` production, leading `j` included.
    pub tail: &'a [Element],
    /// Unique tag naming the local fields that hold the prefix's results.
    pub serial: usize,
}

impl Splice<'_> {
    fn local(&self, field: &str) -> Variable {
        Variable::local(&format!("#{}.{}", self.serial, field))
    }

    pub fn apply(&self) -> Vec<Element> {
        let Some((lead, gamma)) = self.tail.split_first() else {
            return self.prefix.to_vec();
        };
        let keep_prefix = !(is_lone_bare_epsilon(self.prefix) && lead.actions.is_empty());
        let mut elements: Vec<Element> = if keep_prefix {
            let to_local = |v: &Variable| {
                if v.is_result() {
                    self.local(&v.field)
                } else {
                    v.clone()
                }
            };
            self.prefix.iter().map(|e| remap_element(e, &to_local)).collect()
        } else {
            Vec::new()
        };

        let width = elements.len() as i32;
        let shift = |v: &Variable| match v.pos {
            0 => self.local(&v.field),
            k if k > 0 => Variable::new(k - 1 + width, &v.field),
            _ => v.clone(),
        };
        if let Some(last) = elements.last_mut() {
            last.actions
                .extend(lead.actions.iter().map(|a| a.remap(&shift)));
        }
        elements.extend(gamma.iter().map(|e| remap_element(e, &shift)));
        elements
    }
}

/// Direct left-recursion elimination of one nonterminal `A` through a
/// synthesized tail nonterminal:
///
/// ```text
/// A   -> A α | β      becomes     A   -> β TMP
///                                 TMP -> α TMP | ε
/// ```
#[derive(Debug)]
pub struct Recursion {
    /// The nonterminal being rewritten.
    pub nonterminal: NonterminalId,
    /// The synthesized tail.
    pub tail: NonterminalId,
    /// Result fields of `A` that the tail carries.
    pub fields: BTreeSet<String>,
}

impl Recursion {
    pub fn new(nonterminal: NonterminalId, tail: NonterminalId, productions: &[Production]) -> Self {
        Self {
            nonterminal,
            tail,
            fields: result_fields(nonterminal, productions),
        }
    }

    pub fn is_recursive(&self, production: &Production) -> bool {
        production.leading() == Symbol::Nonterminal(self.nonterminal)
    }

    /// Tail element with actions copying the tail's results from `slot`.
    fn tail_element(&self, slot: usize) -> Element {
        let actions = self
            .fields
            .iter()
            .map(|f| Action::copy(Variable::result(f), Variable::slot(slot, f)))
            .collect();
        Element::with_actions(Symbol::Nonterminal(self.tail), actions)
    }

    /// `A -> β` becomes `A -> β TMP`; β's results seed the tail's inherited fields.
    pub fn base(&self, beta: &Production) -> Production {
        let elements = if is_lone_bare_epsilon(&beta.elements) {
            &beta.elements[..0]
        } else {
            &beta.elements[..]
        };
        let slot = elements.len();
        let to_tail = |v: &Variable| {
            if v.is_result() {
                Variable::slot(slot, &inherited(&v.field))
            } else {
                v.clone()
            }
        };
        let mut out: Vec<Element> = elements.iter().map(|e| remap_element(e, &to_tail)).collect();
        out.push(self.tail_element(slot));
        Production::new(out)
    }

    /// `A -> A α` becomes `TMP -> α TMP`; the leading `A` is read from the
    /// inherited fields and α's results seed the next tail. Returns `None` for
    /// the degenerate `A -> A`.
    pub fn step(&self, production: &Production) -> Option<Production> {
        let (lead, alpha) = production.elements.split_first()?;
        let carrier = !lead.actions.is_empty();
        if alpha.is_empty() && !carrier {
            return None;
        }
        let offset = if carrier { 0 } else { 1 };
        let slot = alpha.len() + usize::from(carrier);
        let map = |v: &Variable| match v.pos {
            0 => Variable::result(&inherited(&v.field)),
            k if k > 0 => Variable::new(k - offset, &v.field),
            Variable::RESULT => Variable::slot(slot, &inherited(&v.field)),
            _ => v.clone(),
        };
        let mut out = Vec::with_capacity(slot + 1);
        if carrier {
            out.push(Element::with_actions(
                Symbol::Epsilon,
                lead.actions.iter().map(|a| a.remap(&map)).collect(),
            ));
        }
        out.extend(alpha.iter().map(|e| remap_element(e, &map)));
        out.push(self.tail_element(slot));
        Some(Production::new(out))
    }

    /// `TMP -> ε`, whose results are the inherited values.
    pub fn empty(&self) -> Production {
        let actions = self
            .fields
            .iter()
            .map(|f| Action::copy(Variable::result(f), Variable::result(&inherited(f))))
            .collect();
        Production::new(vec![Element::with_actions(Symbol::Epsilon, actions)])
    }
}

/// Fields of `nt`'s result touched by its productions: every `$.f`, plus
/// every `$0.f` of a left-recursive production.
pub fn result_fields(nt: NonterminalId, productions: &[Production]) -> BTreeSet<String> {
    let mut fields = BTreeSet::new();
    for p in productions {
        let recursive = p.leading() == Symbol::Nonterminal(nt);
        let mut visit = |v: &Variable| {
            if v.is_result() || (recursive && v.pos == 0) {
                fields.insert(v.field.clone());
            }
        };
        for e in &p.elements {
            for a in &e.actions {
                visit(&a.dest);
                a.expr.for_each_var(&mut visit);
            }
        }
    }
    fields
}
