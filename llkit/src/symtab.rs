//! Name interning for grammar symbols, built on [`indexmap::IndexMap`].
//!
//! Each unique name receives a stable index in insertion order; the indices
//! are the dense terminal ordinals and nonterminal ids of a grammar.

use indexmap::IndexMap;
use smartstring::alias::String;

#[derive(Debug, Clone, Default)]
pub struct Symtab {
    map: IndexMap<String, ()>,
}

impl Symtab {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `sym` if missing and returns its index.
    pub fn add(&mut self, sym: &str) -> usize {
        self.map.insert_full(String::from(sym), ()).0
    }

    pub fn idx(&self, sym: &str) -> Option<usize> {
        self.map.get_index_of(sym)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(|k| k.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Symtab;

    #[test]
    fn new_is_empty() {
        let st = Symtab::new();
        assert!(st.is_empty());
        assert_eq!(st.idx("anything"), None);
    }

    #[test]
    fn add_and_retrieve() {
        let mut st = Symtab::new();
        assert_eq!(st.add("foo"), 0);
        assert_eq!(st.add("bar"), 1);
        assert_eq!(st.idx("bar"), Some(1));
        assert_eq!(st.iter().next(), Some("foo"));
    }

    #[test]
    fn duplicate_add_returns_same_index() {
        let mut st = Symtab::new();
        let first = st.add("dup");
        let second = st.add("dup");
        assert_eq!(first, second);
        assert_eq!(st.len(), 1);
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut st = Symtab::new();
        for name in ["c", "a", "b", "a"] {
            st.add(name);
        }
        assert_eq!(st.iter().collect::<Vec<_>>(), ["c", "a", "b"]);
    }
}
