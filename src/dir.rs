use crate::node::NodeId;

use std::collections::HashMap;

/// A hierarchical name bound to exactly one node.
///
/// Distinct symbols may share a node (aliasing); names are unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub node: NodeId,
}

/// Ordered collection of all symbols of a trace.
///
/// Supports exact-name lookup and enumeration in name order.
#[derive(Debug, Default)]
pub struct Directory {
    symbols: Vec<Symbol>,
    by_name: HashMap<String, usize>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn lookup(&self, name: impl AsRef<str>) -> Option<&Symbol> {
        self.by_name
            .get(name.as_ref())
            .map(|&i| &self.symbols[i])
    }

    /// Bind `name` to `node`, or resolve to the existing binding.
    ///
    /// Idempotent: re-declaring a known name returns the node it is already
    /// bound to, regardless of the `node` argument.
    pub fn insert(&mut self, name: impl Into<String>, node: NodeId) -> NodeId {
        let name = name.into();

        if let Some(&i) = self.by_name.get(&name) {
            return self.symbols[i].node;
        }

        self.by_name.insert(name.clone(), self.symbols.len());
        self.symbols.push(Symbol { name, node });
        node
    }

    /// Restore name order after a declaration pass.
    pub fn sort(&mut self) {
        self.symbols.sort_by(|a, b| a.name.cmp(&b.name));
        self.by_name = self.symbols.iter()
            .enumerate()
            .map(|(i, sym)| (sym.name.clone(), i))
            .collect();
    }

    /// All symbols in name order. Finite and restartable.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }
}
