//! Transition builder: edges keyed by caller-chosen state names, compiled into
//! an immutable [`Automaton`].
//!
//! ```rust
//! # use llkit::{Input, TransitionBuilder};
//! let mut b = TransitionBuilder::<&str, ()>::new();
//! b.add_edge("start", Input::pattern("a-zA-Z"), "word", None)?
//!     .add_edge("word", Input::pattern("a-zA-Z0-9"), "word", None)?;
//! let dfa = b.build(&"start")?;
//! let word = dfa.state_id(&"word").unwrap();
//! assert_eq!(dfa.step(dfa.start(), 'q' as i32).map(|(s, _)| s), Some(word));
//! assert!(dfa.step(dfa.start(), '0' as i32).is_none());
//! # Ok::<(), llkit::LlError>(())
//! ```

use crate::LlError;
use crate::cond::Condition;
use crate::optimize::{OptimizeConfig, Transfer};
use indexmap::IndexMap;
use smartstring::alias::String;
use std::fmt::{self, Debug};
use std::hash::Hash;

/// Dense identifier of a compiled state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StateId(pub usize);

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// One outgoing edge of a state, destination already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge<A> {
    pub cond: Condition,
    pub dest: StateId,
    pub action: Option<A>,
}

/// The input side of an edge.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Matches every code, end of input included.
    Any,
    Cond(Condition),
    /// A mini-pattern, parsed when the edge is added.
    Pattern(String),
}

impl Input {
    pub fn pattern(p: &str) -> Self {
        Input::Pattern(p.into())
    }

    fn into_condition(self) -> Result<Condition, LlError> {
        match self {
            Input::Any => Ok(Condition::True),
            Input::Cond(c) => Ok(c),
            Input::Pattern(p) => Condition::parse(&p),
        }
    }
}

impl From<char> for Input {
    fn from(c: char) -> Self {
        Input::Cond(Condition::from(c))
    }
}

impl From<i32> for Input {
    fn from(code: i32) -> Self {
        Input::Cond(Condition::from(code))
    }
}

impl From<Condition> for Input {
    fn from(c: Condition) -> Self {
        Input::Cond(c)
    }
}

impl From<&str> for Input {
    fn from(p: &str) -> Self {
        Input::pattern(p)
    }
}

/// Accumulates edges per source state.
#[derive(Debug)]
pub struct TransitionBuilder<K, A> {
    /// Every referenced key in first-reference order; `true` once it is a
    /// source of edges or explicitly declared.
    states: IndexMap<K, bool>,
    edges: Vec<(usize, Condition, usize, Option<A>)>,
    config: OptimizeConfig,
}

impl<K, A> Default for TransitionBuilder<K, A>
where
    K: Clone + Eq + Hash + Debug,
    A: Clone + PartialEq + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, A> TransitionBuilder<K, A>
where
    K: Clone + Eq + Hash + Debug,
    A: Clone + PartialEq + Debug,
{
    pub fn new() -> Self {
        Self::with_config(OptimizeConfig::default())
    }

    pub fn with_config(config: OptimizeConfig) -> Self {
        Self {
            states: IndexMap::new(),
            edges: Vec::new(),
            config,
        }
    }

    fn intern(&mut self, key: K, defined: bool) -> usize {
        let entry = self.states.entry(key);
        let index = entry.index();
        let flag = entry.or_insert(false);
        *flag |= defined;
        index
    }

    /// Record an edge `from --input--> to`, optionally firing `action`.
    pub fn add_edge(
        &mut self,
        from: K,
        input: impl Into<Input>,
        to: K,
        action: Option<A>,
    ) -> Result<&mut Self, LlError> {
        let cond = input.into().into_condition()?;
        let from = self.intern(from, true);
        let to = self.intern(to, false);
        self.edges.push((from, cond, to, action));
        Ok(self)
    }

    /// Declare a state that may have no outgoing edges.
    pub fn declare(&mut self, key: K) -> &mut Self {
        self.intern(key, true);
        self
    }

    /// Resolve every state, compile each state's dispatch and return the automaton.
    pub fn build(self, start: &K) -> Result<Automaton<K, A>, LlError> {
        let Some(start_index) = self.states.get_index_of(start) else {
            return Err(LlError::UnresolvedState {
                state: format!("{:?}", start).into(),
            });
        };
        if let Some((key, _)) = self.states.iter().find(|(_, defined)| !**defined) {
            return Err(LlError::UnresolvedState {
                state: format!("{:?}", key).into(),
            });
        }

        let mut per_state: Vec<Vec<Edge<A>>> = vec![Vec::new(); self.states.len()];
        for (from, cond, to, action) in self.edges {
            per_state[from].push(Edge {
                cond,
                dest: StateId(to),
                action,
            });
        }
        let transfers: Vec<Option<Transfer<A>>> = per_state
            .into_iter()
            .map(|edges| {
                if edges.is_empty() {
                    None
                } else {
                    Some(Transfer::compile(edges, &self.config))
                }
            })
            .collect();
        log::debug!(
            "automaton built: {} states, {} table transfers",
            transfers.len(),
            transfers
                .iter()
                .filter(|t| t.as_ref().is_some_and(|t| t.is_table()))
                .count()
        );

        Ok(Automaton {
            keys: self.states.into_keys().collect(),
            transfers,
            start: StateId(start_index),
        })
    }
}

/// A compiled, immutable automaton.
///
/// Shareable read-only across any number of tokenizer sessions.
#[derive(Debug, Clone)]
pub struct Automaton<K, A> {
    keys: indexmap::IndexSet<K>,
    transfers: Vec<Option<Transfer<A>>>,
    start: StateId,
}

impl<K, A> Automaton<K, A>
where
    K: Eq + Hash + Debug,
{
    pub fn start(&self) -> StateId {
        self.start
    }

    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    pub fn state_id(&self, key: &K) -> Option<StateId> {
        self.keys.get_index_of(key).map(StateId)
    }

    pub fn key(&self, state: StateId) -> Option<&K> {
        self.keys.get_index(state.0)
    }

    /// `true` when the state rejects every input.
    pub fn is_terminal(&self, state: StateId) -> bool {
        self.transfers.get(state.0).map_or(true, |t| t.is_none())
    }

    /// Take one transition from `state` on `code`.
    #[inline]
    pub fn step(&self, state: StateId, code: i32) -> Option<(StateId, Option<&A>)> {
        let next = self.transfers.get(state.0)?.as_ref()?.dispatch(code);
        log::trace!(
            "STEP: {:?} --{}--> {:?}",
            self.key(state),
            code,
            next.map(|(s, _)| self.key(s))
        );
        next
    }
}
