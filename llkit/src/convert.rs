//! LL(1) conversion of a [`Grammar`].
//!
//! [`convert`] runs, in order:
//!
//! 1. left-recursion removal over the nonterminals in declaration order:
//!    productions of `i` led by an earlier `j` are expanded with each of `j`'s
//!    productions, then direct left recursion of `i` is replaced by a
//!    synthesized tail nonterminal (`Name'`);
//! 2. the FIRST fixed point;
//! 3. the FOLLOW fixed point, seeded with end-of-input on the start symbol;
//! 4. analyze-table construction, failing on the first contested cell.
//!
//! Left recursion that only appears through a later nonterminal is not
//! rewritten; such grammars surface as [`LlError::AmbiguousGrammar`].

use crate::LlError;
use crate::grammar::{
    Element, FirstSet, FollowSet, Grammar, NonterminalId, Production, Symbol, TerminalId,
};
use crate::rewrite::{Recursion, Splice};
use smartstring::alias::String;
use std::ops::Deref;

/// A converted grammar: left-recursion free, FIRST/FOLLOW complete and one
/// analyze table per nonterminal. Read-only from here on.
#[derive(Debug, Clone)]
pub struct LlGrammar {
    grammar: Grammar,
}

impl LlGrammar {
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn into_grammar(self) -> Grammar {
        self.grammar
    }

    /// Index of the trailing end-of-input column.
    pub fn end_column(&self) -> usize {
        self.grammar.terminals.len()
    }

    /// Table column for a lookahead; `None` is end-of-input. A terminal
    /// outside this grammar has no column.
    pub fn column(&self, lookahead: Option<TerminalId>) -> Option<usize> {
        match lookahead {
            None => Some(self.end_column()),
            Some(t) if t.0 < self.end_column() => Some(t.0),
            Some(_) => None,
        }
    }

    /// The production `nt` expands to on `lookahead`, with its index.
    pub fn expand(&self, nt: NonterminalId, lookahead: Option<TerminalId>) -> Option<(usize, &Production)> {
        let n = self.grammar.nonterminal(nt);
        let index = (*n.table.get(self.column(lookahead)?)?)?;
        Some((index, &n.productions[index]))
    }

    /// Lookaheads with an entry in `nt`'s table, by display name.
    pub fn expected(&self, nt: NonterminalId) -> Vec<&str> {
        self.grammar
            .nonterminal(nt)
            .table
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_some())
            .map(|(column, _)| self.display(column))
            .collect()
    }

    /// Display name of a table column.
    pub fn display(&self, column: usize) -> &str {
        self.grammar
            .terminals
            .get(column)
            .map_or("end of input", |t| t.display.as_str())
    }
}

impl Deref for LlGrammar {
    type Target = Grammar;

    fn deref(&self) -> &Grammar {
        &self.grammar
    }
}

/// Convert `grammar` to LL(1) form and build its analyze tables.
pub fn convert(mut grammar: Grammar) -> Result<LlGrammar, LlError> {
    let declared = grammar.nonterminals.len();
    remove_left_recursion(&mut grammar);
    log::debug!(
        "left recursion removed: {} nonterminals ({} synthesized)",
        grammar.nonterminals.len(),
        grammar.nonterminals.len() - declared
    );

    let passes = compute_first(&mut grammar);
    log::debug!("FIRST converged after {} passes", passes);
    let passes = compute_follow(&mut grammar);
    log::debug!("FOLLOW converged after {} passes", passes);

    build_tables(&mut grammar)?;
    log::debug!(
        "analyze tables built: {} x {}",
        grammar.nonterminals.len(),
        grammar.terminals.len() + 1
    );
    Ok(LlGrammar { grammar })
}

/// Step 1 of [`convert`] on its own: rewrite `g` so no production is led by
/// its own nonterminal or an earlier one. Actions are rewritten alongside.
pub fn remove_left_recursion(g: &mut Grammar) {
    let declared = g.nonterminals.len();
    let mut serial = 0;
    for i in 0..declared {
        for j in 0..i {
            let lead = Symbol::Nonterminal(NonterminalId(j));
            if !g.nonterminals[i].productions.iter().any(|p| p.leading() == lead) {
                continue;
            }
            let productions = std::mem::take(&mut g.nonterminals[i].productions);
            let mut out = Vec::with_capacity(productions.len());
            for p in productions {
                if p.leading() != lead {
                    out.push(p);
                    continue;
                }
                for prefix in &g.nonterminals[j].productions {
                    let splice = Splice {
                        prefix: &prefix.elements,
                        tail: &p.elements,
                        serial,
                    };
                    out.push(Production::new(splice.apply()));
                    serial += 1;
                }
            }
            log::trace!(
                "substituted {} into {}: {} productions",
                g.nonterminals[j].name,
                g.nonterminals[i].name,
                out.len()
            );
            g.nonterminals[i].productions = out;
        }
        eliminate_direct(g, NonterminalId(i));
    }
}

fn eliminate_direct(g: &mut Grammar, nt: NonterminalId) {
    let lead = Symbol::Nonterminal(nt);
    if !g.nonterminals[nt.0].productions.iter().any(|p| p.leading() == lead) {
        return;
    }
    let name = tail_name(g, nt);
    let tail = NonterminalId(g.nonterminals.len());
    let productions = std::mem::take(&mut g.nonterminals[nt.0].productions);
    let rewrite = Recursion::new(nt, tail, &productions);

    let mut own = Vec::new();
    let mut tail_productions = Vec::new();
    for p in &productions {
        if rewrite.is_recursive(p) {
            tail_productions.extend(rewrite.step(p));
        } else {
            own.push(rewrite.base(p));
        }
    }
    tail_productions.push(rewrite.empty());
    if own.is_empty() {
        log::warn!("{} derives no terminal string", g.nonterminals[nt.0].name);
    }
    log::trace!(
        "direct left recursion of {} moved to {} ({} fields)",
        g.nonterminals[nt.0].name,
        name,
        rewrite.fields.len()
    );
    g.nonterminals[nt.0].productions = own;
    g.add_nonterminal(name, tail_productions);
}

fn tail_name(g: &Grammar, nt: NonterminalId) -> String {
    let mut name = g.nonterminals[nt.0].name.clone();
    loop {
        name.push('\'');
        if g.nonterminal_id(&name).is_none() && g.terminal_id(&name).is_none() {
            return name;
        }
    }
}

/// FIRST of a symbol sequence; `empty` when every symbol is nullable.
fn first_of(g: &Grammar, elements: &[Element]) -> FirstSet {
    let mut first = FirstSet::default();
    for e in elements {
        match e.symbol {
            Symbol::Epsilon => {}
            Symbol::Terminal(t) => {
                first.terms.insert(t);
                return first;
            }
            Symbol::Nonterminal(n) => {
                let f = &g.nonterminals[n.0].first;
                first.terms.extend(f.terms.iter().copied());
                if !f.empty {
                    return first;
                }
            }
        }
    }
    first.empty = true;
    first
}

fn merge_first(dst: &mut FirstSet, src: &FirstSet) -> bool {
    let before = dst.terms.len();
    dst.terms.extend(src.terms.iter().copied());
    let grew = dst.terms.len() != before || (src.empty && !dst.empty);
    dst.empty |= src.empty;
    grew
}

fn merge_follow(dst: &mut FollowSet, src: &FollowSet) -> bool {
    let before = dst.terms.len();
    dst.terms.extend(src.terms.iter().copied());
    let grew = dst.terms.len() != before || (src.end && !dst.end);
    dst.end |= src.end;
    grew
}

/// One FIRST pass over every production; returns `true` if anything was added.
pub fn first_pass(g: &mut Grammar) -> bool {
    let mut changed = false;
    for n in 0..g.nonterminals.len() {
        for p in 0..g.nonterminals[n].productions.len() {
            let first = first_of(g, &g.nonterminals[n].productions[p].elements);
            let nt = &mut g.nonterminals[n];
            changed |= merge_first(&mut nt.productions[p].first, &first);
            changed |= merge_first(&mut nt.first, &first);
        }
    }
    changed
}

/// One FOLLOW pass over every nonterminal occurrence; returns `true` if
/// anything was added.
pub fn follow_pass(g: &mut Grammar) -> bool {
    let mut changed = false;
    for n in 0..g.nonterminals.len() {
        for p in 0..g.nonterminals[n].productions.len() {
            let len = g.nonterminals[n].productions[p].elements.len();
            for i in 0..len {
                let elements = &g.nonterminals[n].productions[p].elements;
                let Symbol::Nonterminal(b) = elements[i].symbol else {
                    continue;
                };
                let rest = first_of(g, &elements[i + 1..]);
                let mut add = FollowSet {
                    terms: rest.terms,
                    end: false,
                };
                if rest.empty {
                    let lhs = &g.nonterminals[n].follow;
                    add.terms.extend(lhs.terms.iter().copied());
                    add.end = lhs.end;
                }
                changed |= merge_follow(&mut g.nonterminals[b.0].follow, &add);
            }
        }
    }
    changed
}

fn compute_first(g: &mut Grammar) -> usize {
    let mut passes = 1;
    while first_pass(g) {
        log::trace!("FIRST pass {} changed", passes);
        passes += 1;
    }
    passes
}

fn compute_follow(g: &mut Grammar) -> usize {
    let start = g.start.0;
    g.nonterminals[start].follow.end = true;
    let mut passes = 1;
    while follow_pass(g) {
        log::trace!("FOLLOW pass {} changed", passes);
        passes += 1;
    }
    passes
}

fn build_tables(g: &mut Grammar) -> Result<(), LlError> {
    let width = g.terminals.len() + 1;
    let mut tables = Vec::with_capacity(g.nonterminals.len());
    for nt in &g.nonterminals {
        let mut table: Vec<Option<usize>> = vec![None; width];
        for (index, p) in nt.productions.iter().enumerate() {
            let mut columns: Vec<usize> = p.first.terms.iter().map(|t| t.0).collect();
            if p.first.empty {
                columns.extend(nt.follow.terms.iter().map(|t| t.0));
                if nt.follow.end {
                    columns.push(width - 1);
                }
            }
            for column in columns {
                match table[column] {
                    Some(prev) if prev != index => {
                        return Err(LlError::AmbiguousGrammar {
                            nonterminal: nt.name.clone(),
                            lookahead: g.column_name(column).into(),
                            first: prev,
                            second: index,
                        });
                    }
                    _ => table[column] = Some(index),
                }
            }
        }
        tables.push(table);
    }
    for (nt, table) in g.nonterminals.iter_mut().zip(tables) {
        nt.table = table;
    }
    Ok(())
}
