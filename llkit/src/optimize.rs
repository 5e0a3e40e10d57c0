//! Per-state dispatch construction.
//!
//! A state's edges are compiled into a [`Transfer`]. Cheap states keep the
//! ordered edge list and evaluate it linearly. Busier states get a flat lookup
//! array over the low input codes `0..bound` plus an ordered fallback list for
//! everything outside it (negative codes, the [`EOF`](crate::EOF) sentinel and
//! codes at or above the bound).
//!
//! Every condition is resolved into an exact coverage map of the low range and
//! a list of conditions that decide the remaining codes, so the array answer is
//! final for low codes and the fallback list is only consulted outside the
//! array. Entries are assigned in edge order, which keeps first-match-wins
//! semantics in both parts.

use crate::cond::Condition;
use crate::trans::{Edge, StateId};

/// Knobs for [`Transfer::compile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizeConfig {
    /// States whose estimated number of low-code comparisons is at or below
    /// this value keep linear dispatch.
    pub threshold: usize,
    /// Size of the lookup array; codes `0..bound` are dispatched by index.
    pub bound: usize,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            threshold: 4,
            bound: 128,
        }
    }
}

/// Destination and action reached by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target<A> {
    pub dest: StateId,
    pub action: Option<A>,
}

/// Compiled dispatch for one state.
#[derive(Debug, Clone)]
pub enum Transfer<A> {
    Linear(Vec<Edge<A>>),
    Table(TableTransfer<A>),
}

/// Array lookup for low codes, ordered fallback for the rest.
#[derive(Debug, Clone)]
pub struct TableTransfer<A> {
    /// `lookup[code]` is `entry index + 1`, or 0 when no edge covers `code`.
    lookup: Box<[u16]>,
    entries: Vec<Target<A>>,
    fallback: Vec<(Condition, u16)>,
}

/// Exact split of a condition: `low[c]` for `0 <= c < bound`, `rest` elsewhere.
struct Resolved {
    low: Vec<bool>,
    rest: Vec<Condition>,
}

fn resolve(cond: &Condition, bound: usize) -> Resolved {
    let in_low = |c: i32| c >= 0 && (c as usize) < bound;
    match cond {
        Condition::True => Resolved {
            low: vec![true; bound],
            rest: vec![Condition::True],
        },
        Condition::Equals(c) => {
            let mut low = vec![false; bound];
            let mut rest = Vec::new();
            if in_low(*c) {
                low[*c as usize] = true;
            } else {
                rest.push(cond.clone());
            }
            Resolved { low, rest }
        }
        Condition::Range(lo, hi) => {
            let mut low = vec![false; bound];
            let from = (*lo).max(0);
            let to = (*hi).min(bound as i32 - 1);
            for c in from..=to {
                low[c as usize] = true;
            }
            let rest = if *lo < 0 || *hi >= bound as i32 {
                vec![cond.clone()]
            } else {
                Vec::new()
            };
            Resolved { low, rest }
        }
        Condition::Or(subs) => {
            let mut low = vec![false; bound];
            let mut rest = Vec::new();
            for sub in subs {
                let r = resolve(sub, bound);
                for (dst, src) in low.iter_mut().zip(r.low) {
                    *dst |= src;
                }
                rest.extend(r.rest);
            }
            Resolved { low, rest }
        }
        Condition::Not(sub) => {
            let mut r = resolve(sub, bound);
            let low = r.low.into_iter().map(|b| !b).collect();
            let rest = match r.rest.len() {
                0 => vec![Condition::True],
                1 => vec![Condition::negate(r.rest.remove(0))],
                _ => vec![Condition::negate(Condition::Or(r.rest))],
            };
            Resolved { low, rest }
        }
    }
}

/// Estimated number of comparisons against codes below `bound`.
fn small_comparisons(cond: &Condition, bound: usize) -> usize {
    let bound = bound as i32;
    match cond {
        Condition::True => 0,
        Condition::Equals(c) => usize::from(*c >= 0 && *c < bound),
        Condition::Range(lo, hi) => usize::from(*hi >= 0 && *lo < bound),
        Condition::Not(sub) => small_comparisons(sub, bound as usize),
        Condition::Or(subs) => subs
            .iter()
            .map(|s| small_comparisons(s, bound as usize))
            .sum(),
    }
}

impl<A: Clone + PartialEq> Transfer<A> {
    /// Compile one state's ordered edge list.
    pub fn compile(edges: Vec<Edge<A>>, config: &OptimizeConfig) -> Self {
        let cost: usize = edges
            .iter()
            .map(|e| small_comparisons(&e.cond, config.bound))
            .sum();
        if cost <= config.threshold || edges.len() >= u16::MAX as usize {
            log::trace!("linear transfer: {} edges, cost {}", edges.len(), cost);
            return Transfer::Linear(edges);
        }

        let mut lookup = vec![0u16; config.bound].into_boxed_slice();
        let mut entries: Vec<Target<A>> = Vec::new();
        let mut fallback = Vec::new();
        for edge in edges {
            let target = Target {
                dest: edge.dest,
                action: edge.action,
            };
            let index = match entries.iter().position(|t| *t == target) {
                Some(i) => i,
                None => {
                    entries.push(target);
                    entries.len() - 1
                }
            };
            let entry = index as u16;
            let r = resolve(&edge.cond, config.bound);
            for (code, hit) in r.low.into_iter().enumerate() {
                if hit && lookup[code] == 0 {
                    lookup[code] = entry + 1;
                }
            }
            fallback.extend(r.rest.into_iter().map(|c| (c, entry)));
        }
        log::trace!(
            "table transfer: cost {}, {} entries, {} fallback conditions",
            cost,
            entries.len(),
            fallback.len()
        );
        Transfer::Table(TableTransfer {
            lookup,
            entries,
            fallback,
        })
    }
}

impl<A> Transfer<A> {
    /// First edge matching `code`, if any.
    #[inline]
    pub fn dispatch(&self, code: i32) -> Option<(StateId, Option<&A>)> {
        match self {
            Transfer::Linear(edges) => edges
                .iter()
                .find(|e| e.cond.test(code))
                .map(|e| (e.dest, e.action.as_ref())),
            Transfer::Table(t) => {
                let entry = if code >= 0 && (code as usize) < t.lookup.len() {
                    match t.lookup[code as usize] {
                        0 => return None,
                        i => i - 1,
                    }
                } else {
                    t.fallback.iter().find(|(c, _)| c.test(code))?.1
                };
                let target = &t.entries[entry as usize];
                Some((target.dest, target.action.as_ref()))
            }
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self, Transfer::Table(_))
    }
}
