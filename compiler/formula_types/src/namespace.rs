//! Namespace tree nodes.

use formula_ir::Name;
use rustc_hash::FxHashMap;

use crate::ids::{NamespaceId, SymbolId};

/// A node in a table's naming tree.
///
/// Children and symbols keep insertion order; lookups by name go through
/// the side indexes. Namespaces are created on demand and never removed.
#[derive(Clone, Debug)]
pub struct Namespace {
    /// `Name::EMPTY` for the root.
    pub name: Name,
    pub parent: Option<NamespaceId>,
    /// Root is 0.
    pub depth: u32,
    children: Vec<NamespaceId>,
    child_index: FxHashMap<Name, NamespaceId>,
    symbols: Vec<SymbolId>,
    symbol_index: FxHashMap<Name, SymbolId>,
}

impl Namespace {
    pub(crate) fn new(name: Name, parent: Option<NamespaceId>, depth: u32) -> Self {
        Namespace {
            name,
            parent,
            depth,
            children: Vec::new(),
            child_index: FxHashMap::default(),
            symbols: Vec::new(),
            symbol_index: FxHashMap::default(),
        }
    }

    pub fn child(&self, name: Name) -> Option<NamespaceId> {
        self.child_index.get(&name).copied()
    }

    /// Children in creation order.
    pub fn children(&self) -> &[NamespaceId] {
        &self.children
    }

    pub fn symbol(&self, name: Name) -> Option<SymbolId> {
        self.symbol_index.get(&name).copied()
    }

    /// Named symbols in registration order.
    pub fn symbols(&self) -> &[SymbolId] {
        &self.symbols
    }

    pub(crate) fn add_child(&mut self, name: Name, id: NamespaceId) {
        self.child_index.insert(name, id);
        self.children.push(id);
    }

    /// Returns the existing symbol on a name clash.
    pub(crate) fn add_symbol(&mut self, name: Name, id: SymbolId) -> Result<(), SymbolId> {
        if let Some(&existing) = self.symbol_index.get(&name) {
            return Err(existing);
        }
        self.symbol_index.insert(name, id);
        self.symbols.push(id);
        Ok(())
    }
}
