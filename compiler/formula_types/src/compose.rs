//! Importing another module's table.
//!
//! # Placement
//!
//! Every namespace of the foreign table is recreated below the destination:
//! the renaming's namespace (`R:: Other`) or, without a renaming, the root.
//! Symbols are cloned into the corresponding namespace with their canonical
//! forms and sizes rewritten to local ids. Exceptions:
//!
//! - built-in operators and constants map to the local built-ins, and the
//!   `%sub` helper is never cloned;
//! - base sorts landing in the root map to the local base sorts;
//! - enumeration and symbolic constants merge into the root, deduplicated by
//!   name and arity;
//! - the foreign root's convenience unions are dropped when landing in the
//!   root, where this module's own ones take their place.
//!
//! A name clash with a symbol cloned from the same original (a diamond
//! import) reuses the existing symbol; any other clash is a duplicate.

use formula_ir::{CompositionKind, Location, ModuleKind, ModuleRef};
use rustc_hash::FxHashMap;

use crate::cancel::Ticker;
use crate::canon::check_id;
use crate::error::{CheckAbort, CheckErrorKind, InternalError};
use crate::ids::{NamespaceId, SymbolId};
use crate::resolve::ForeignPath;
use crate::symbol::{ConstantKind, Symbol, SymbolKind, SymbolOrigin};
use crate::table::SymbolTable;

/// How strictly an import is validated.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ImportOptions {
    /// Skip renaming and composition-kind checks and short-name collision
    /// detection. Used by throwaway scratch tables.
    internal: bool,
}

impl ImportOptions {
    pub(crate) fn internal() -> Self {
        ImportOptions { internal: true }
    }
}

/// Why a module may not compose another, if it may not.
fn composition_error(
    importer: ModuleKind,
    how: CompositionKind,
    imported: ModuleKind,
) -> Option<&'static str> {
    use CompositionKind::{Extends, Includes, Input, Of, Output};
    use ModuleKind::{Domain, Model, Transform, TransformSystem};
    match (importer, how, imported) {
        (Domain, Includes | Extends, Domain)
        | (Model, Of, Domain)
        | (Model, Includes, Model)
        | (Transform, Input | Output | Includes, Domain)
        | (TransformSystem, _, _) => None,
        (Domain, ..) => Some("a domain may only include or extend domains"),
        (Model, ..) => Some("a model must be `of` a domain and may only include models"),
        (Transform, ..) => Some("transform inputs and outputs must be domains"),
    }
}

/// Import `foreign` into `table` as `reference` describes.
///
/// Problems with the composition are reported on `table`; the import is
/// then skipped. `Err` only for cancellation and internal faults.
#[tracing::instrument(level = "debug", skip_all, fields(module = foreign.interner().lookup(foreign.module_name())))]
pub(crate) fn import(
    table: &mut SymbolTable,
    reference: &ModuleRef,
    foreign: &SymbolTable,
    options: ImportOptions,
    ticker: &mut Ticker<'_>,
) -> Result<(), CheckAbort> {
    let location = Location::new(table.file(), reference.span);
    let module = foreign.interner().lookup(foreign.module_name());
    let bad = |reason: String| CheckErrorKind::BadComposition { reason };

    if !foreign.is_valid() {
        table.report(location, bad(format!("module `{module}` has errors")));
        return Ok(());
    }
    if !options.internal {
        if let Some(reason) = composition_error(table.module_kind(), reference.kind, foreign.module_kind()) {
            table.report(location, bad(reason.to_owned()));
            return Ok(());
        }
        if let Some(rename) = reference.rename {
            if !check_id(table, location, rename, "a renaming") {
                return Ok(());
            }
        }
        let clash = foreign.dependencies().iter().find(|(name, id)| {
            table
                .dependencies()
                .get(name)
                .is_some_and(|existing| existing != *id)
        });
        if let Some((name, _)) = clash {
            let name = table.interner().lookup(*name);
            table.report(location, bad(format!("two different modules are named `{name}`")));
            return Ok(());
        }
    }
    let dependencies: Vec<_> = foreign.dependencies().iter().map(|(n, id)| (*n, *id)).collect();
    table.dependencies_mut().extend(dependencies);
    for &literal in foreign.literals() {
        table.add_literal(literal);
    }

    let destination = match reference.rename {
        Some(rename) => table.child_namespace(NamespaceId::ROOT, rename),
        None => NamespaceId::ROOT,
    };
    let mut namespaces = vec![destination];
    for ns in foreign.namespace_ids().skip(1) {
        let node = foreign.namespace(ns);
        let parent = node.parent.map_or(destination, |p| namespaces[p.index()]);
        namespaces.push(table.child_namespace(parent, node.name));
    }

    let mut importer = Importer {
        table,
        foreign,
        location,
        namespaces,
        ids: FxHashMap::default(),
        created: Vec::new(),
    };
    for symbol in foreign.symbols() {
        ticker.tick()?;
        importer.place(symbol);
    }
    importer.translate()?;
    importer.verify(reference)?;
    tracing::debug!(
        created = importer.created.len(),
        mapped = importer.ids.len(),
        "imported"
    );
    Ok(())
}

struct Importer<'a> {
    table: &'a mut SymbolTable,
    foreign: &'a SymbolTable,
    location: Location,
    /// Foreign namespace index to local namespace.
    namespaces: Vec<NamespaceId>,
    /// Foreign symbol to local symbol.
    ids: FxHashMap<SymbolId, SymbolId>,
    /// `(foreign, local)` for symbols cloned by this import.
    created: Vec<(SymbolId, SymbolId)>,
}

/// Companion sort and `#Name` constant of a constructor or map.
fn companions(kind: &SymbolKind) -> Option<(SymbolId, SymbolId)> {
    match kind {
        SymbolKind::Constructor(info) => Some((info.sort, info.type_constant)),
        SymbolKind::Map(info) => Some((info.sort, info.type_constant)),
        _ => None,
    }
}

fn merges_into_root(kind: &SymbolKind) -> bool {
    matches!(kind, SymbolKind::UserConstant(k) if k.merges_into_root())
}

impl Importer<'_> {
    fn origin(&self, symbol: &Symbol) -> SymbolOrigin {
        symbol.origin.unwrap_or(SymbolOrigin {
            table: self.foreign.id(),
            symbol: symbol.id,
        })
    }

    fn place(&mut self, symbol: &Symbol) {
        if self.ids.contains_key(&symbol.id) {
            return;
        }
        let target = self.namespaces[symbol.namespace.index()];
        let root = NamespaceId::ROOT;
        match &symbol.kind {
            SymbolKind::BaseOperator(_) | SymbolKind::BaseConstant(_) => self.map_builtin(symbol),
            SymbolKind::BaseSort(_) if target == root => self.map_builtin(symbol),
            kind if merges_into_root(kind) => self.clone_into(symbol, root),
            SymbolKind::Union {
                convenience: Some(_),
            } if target == root => {}
            // Placed with their data symbol.
            SymbolKind::UserSort { .. } | SymbolKind::UserConstant(ConstantKind::Type { .. }) => {}
            _ => self.clone_into(symbol, target),
        }
    }

    fn map_builtin(&mut self, symbol: &Symbol) {
        if let Some(local) = self.table.namespace(NamespaceId::ROOT).symbol(symbol.name) {
            self.ids.insert(symbol.id, local);
        }
    }

    /// Whether `existing` stands for the same symbol as `symbol`.
    fn is_same(&self, symbol: &Symbol, existing: &Symbol) -> bool {
        if existing.origin == Some(self.origin(symbol)) {
            return true;
        }
        merges_into_root(&symbol.kind)
            && merges_into_root(&existing.kind)
            && symbol.arity == existing.arity
    }

    fn clone_into(&mut self, symbol: &Symbol, target: NamespaceId) {
        if let Some(existing) = self.table.namespace(target).symbol(symbol.name) {
            if self.is_same(symbol, self.table.symbol(existing)) {
                self.map_existing(symbol, existing);
            } else {
                self.table.report_duplicate(self.location, symbol.name, existing);
            }
            return;
        }

        let registered = if symbol.kind.is_data() {
            let kind = symbol.kind.clone();
            self.table.register_data(target, symbol.name, symbol.arity, symbol.location, |sort, tc| {
                let mut kind = kind;
                match &mut kind {
                    SymbolKind::Constructor(info) => (info.sort, info.type_constant) = (sort, tc),
                    SymbolKind::Map(info) => (info.sort, info.type_constant) = (sort, tc),
                    _ => {}
                }
                kind
            })
        } else {
            let kind = symbol.kind.clone();
            self.table.register_symbol(target, symbol.name, symbol.arity, symbol.location, kind)
        };
        let Ok(local) = registered else {
            return;
        };
        let mut pairs = vec![(symbol.id, local)];
        if let (Some((sort, tc)), Some((local_sort, local_tc))) = (
            companions(&symbol.kind),
            companions(&self.table.symbol(local).kind),
        ) {
            pairs.push((sort, local_sort));
            pairs.push((tc, local_tc));
        }
        for (foreign, local) in pairs {
            let origin = self.origin(self.foreign.symbol(foreign));
            self.table.set_origin(local, origin);
            self.created.push((foreign, local));
            self.ids.insert(foreign, local);
        }
    }

    fn map_existing(&mut self, symbol: &Symbol, existing: SymbolId) {
        self.ids.insert(symbol.id, existing);
        if let (Some((sort, tc)), Some((local_sort, local_tc))) = (
            companions(&symbol.kind),
            companions(&self.table.symbol(existing).kind),
        ) {
            self.ids.insert(sort, local_sort);
            self.ids.insert(tc, local_tc);
        }
    }

    /// Rewrite canonical forms and sizes of cloned symbols to local ids.
    fn translate(&mut self) -> Result<(), InternalError> {
        let ids = &self.ids;
        let map = |id: SymbolId| ids.get(&id).copied();
        for &(foreign, local) in &self.created {
            let original = self.foreign.symbol(foreign);
            if let Some(form) = original.canonical() {
                self.table.set_canonical(local, form.map_ids(map))?;
            }
            if let Some(size) = original.size() {
                self.table.set_sort_size(local, size.map_ids(&map))?;
            }
        }
        Ok(())
    }

    /// Every cloned named symbol must be found again by its renamed path.
    fn verify(&self, reference: &ModuleRef) -> Result<(), InternalError> {
        let path = ForeignPath {
            rename: reference.rename,
            drop_parent: false,
        };
        for &(foreign, local) in &self.created {
            let original = self.foreign.symbol(foreign);
            if original.name.is_empty() || merges_into_root(&original.kind) {
                continue;
            }
            if self.table.resolve_foreign(self.foreign, foreign, path) != Some(local) {
                return Err(InternalError::RelabelFailed {
                    path: self.foreign.qualified_name(foreign),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
