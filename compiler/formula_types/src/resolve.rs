//! Name resolution over the namespace tree.
//!
//! # Algorithm
//!
//! A query `a.b.c` is split into a qualifier (`a.b`) and a final name
//! (`c`). Resolution walks `(namespace, matched)` pairs breadth first from a
//! priority namespace, where `matched` counts qualifier segments already
//! matched by child namespace names:
//!
//! - a pair with the whole qualifier matched looks the final name up;
//! - otherwise the next qualifier segment is followed into a child;
//! - pairs with nothing matched also spawn searches into every child, so
//!   names resolve into imported namespaces.
//!
//! The first match becomes the candidate. A second, different match at the
//! same depth is the ambiguity witness. The walk stops once it dequeues a
//! namespace deeper than the candidate, so the shallowest match wins.
//! Failing under a non-root priority namespace restarts from the root.

use std::collections::VecDeque;

use formula_ir::{Name, QualifiedId};

use crate::ids::{NamespaceId, SymbolId};
use crate::symbol::{Symbol, SymbolKind};
use crate::table::SymbolTable;

/// Outcome of a lookup.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Resolution<T> {
    Found(T),
    /// Two distinct matches at the same minimal depth.
    Ambiguous(T, T),
    NotFound,
}

impl<T: Copy> Resolution<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Resolution::Found(t) => Some(t),
            Resolution::Ambiguous(..) | Resolution::NotFound => None,
        }
    }
}

/// Restricts which symbols count as matches.
pub type SymbolFilter<'a> = &'a dyn Fn(&Symbol) -> bool;

/// Symbols a type term may name.
pub fn type_defining(symbol: &Symbol) -> bool {
    symbol.kind.is_type_defining()
}

/// How a foreign symbol's path is rewritten before lookup.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ForeignPath {
    /// Replaces the foreign module's own name as the leading segment; with
    /// `None` the leading segment is dropped and lookup starts at the root.
    pub rename: Option<Name>,
    /// Drop the second-to-last segment, looking one namespace up.
    pub drop_parent: bool,
}

impl SymbolTable {
    /// Resolve a symbol by dotted path.
    pub fn resolve_symbol(
        &self,
        path: &[Name],
        priority: Option<NamespaceId>,
        filter: Option<SymbolFilter<'_>>,
    ) -> Resolution<SymbolId> {
        let Some((&last, qualifier)) = path.split_last() else {
            return Resolution::NotFound;
        };
        let matcher = |ns: NamespaceId| {
            self.namespace(ns)
                .symbol(last)
                .filter(|&id| filter.map_or(true, |f| f(self.symbol(id))))
        };
        self.with_restart(priority, |start| self.search(start, qualifier, &matcher))
    }

    /// Resolve a namespace by dotted path.
    pub fn resolve_namespace(
        &self,
        path: &[Name],
        priority: Option<NamespaceId>,
    ) -> Resolution<NamespaceId> {
        if path.is_empty() {
            return Resolution::Found(priority.unwrap_or(NamespaceId::ROOT));
        }
        self.with_restart(priority, |start| self.search(start, path, &|ns| Some(ns)))
    }

    /// Resolve a syntactic identifier from the root.
    pub fn resolve_id(
        &self,
        id: &QualifiedId,
        filter: Option<SymbolFilter<'_>>,
    ) -> Resolution<SymbolId> {
        self.resolve_symbol(&id.segments, None, filter)
    }

    /// Resolve a dotted string without interning new names.
    pub fn lookup(&self, dotted: &str) -> Resolution<SymbolId> {
        let path: Option<Vec<Name>> = dotted
            .split('.')
            .map(|seg| self.interner().get(seg))
            .collect();
        match path {
            Some(path) => self.resolve_symbol(&path, None, None),
            None => Resolution::NotFound,
        }
    }

    fn with_restart<T: Copy>(
        &self,
        priority: Option<NamespaceId>,
        run: impl Fn(NamespaceId) -> Resolution<T>,
    ) -> Resolution<T> {
        let start = priority.unwrap_or(NamespaceId::ROOT);
        match run(start) {
            Resolution::NotFound if start != NamespaceId::ROOT => run(NamespaceId::ROOT),
            result => result,
        }
    }

    fn search<T: Copy + PartialEq>(
        &self,
        start: NamespaceId,
        qualifier: &[Name],
        matcher: &dyn Fn(NamespaceId) -> Option<T>,
    ) -> Resolution<T> {
        let mut queue = VecDeque::from([(start, 0usize)]);
        let mut candidate: Option<(T, u32)> = None;
        let mut witness: Option<T> = None;

        while let Some((ns, matched)) = queue.pop_front() {
            let node = self.namespace(ns);
            if candidate.is_some_and(|(_, depth)| node.depth > depth) {
                break;
            }
            if matched == qualifier.len() {
                if let Some(found) = matcher(ns) {
                    match candidate {
                        None => candidate = Some((found, node.depth)),
                        Some((first, depth))
                            if depth == node.depth && first != found && witness.is_none() =>
                        {
                            witness = Some(found);
                        }
                        Some(_) => {}
                    }
                }
            } else if let Some(child) = node.child(qualifier[matched]) {
                queue.push_back((child, matched + 1));
            }
            if matched == 0 {
                queue.extend(node.children().iter().map(|&child| (child, 0)));
            }
        }

        match (candidate, witness) {
            (Some((first, _)), Some(second)) => Resolution::Ambiguous(first, second),
            (Some((first, _)), None) => Resolution::Found(first),
            (None, _) => Resolution::NotFound,
        }
    }

    /// Find the local copy of `symbol` from `foreign`.
    ///
    /// The path is rebuilt from the foreign module name, namespaces and
    /// symbol name, rewritten per `path`, then walked exactly from the root.
    /// The match must have the same arity.
    pub fn resolve_foreign(
        &self,
        foreign: &SymbolTable,
        symbol: SymbolId,
        path: ForeignPath,
    ) -> Option<SymbolId> {
        let original = foreign.symbol(symbol);
        let (named, is_sort) = match &original.kind {
            SymbolKind::UserSort { data, .. } => (foreign.symbol(*data), true),
            _ => (original, false),
        };

        let mut segments = vec![foreign.module_name()];
        segments.extend(foreign.namespace_path(named.namespace));
        segments.push(named.name);
        match path.rename {
            Some(rename) => segments[0] = rename,
            None => {
                segments.remove(0);
            }
        }
        if path.drop_parent && segments.len() >= 2 {
            segments.remove(segments.len() - 2);
        }

        let (&last, qualifier) = segments.split_last()?;
        let mut ns = NamespaceId::ROOT;
        for &seg in qualifier {
            ns = self.namespace(ns).child(seg)?;
        }
        let local = self.namespace(ns).symbol(last)?;
        if self.symbol(local).arity != named.arity {
            return None;
        }
        if is_sort {
            self.sort_of(local)
        } else {
            Some(local)
        }
    }
}
