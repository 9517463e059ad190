//! Shared test utilities for checking built modules end to end.
//!
//! Only compiled in test builds.

use std::sync::Arc;

use formula_diagnostic::ErrorCode;
use formula_ir::{Module, Name, SharedInterner, Syntax};

use crate::check::{check_module, CheckConfig, CheckOutput, ModuleSet};
use crate::error::CheckError;
use crate::ids::SymbolId;
use crate::resolve::Resolution;
use crate::table::SymbolTable;

/// An interner and the modules checked so far.
pub(crate) struct Workspace {
    pub(crate) interner: SharedInterner,
    pub(crate) modules: ModuleSet,
}

impl Workspace {
    pub(crate) fn new() -> Self {
        Workspace {
            interner: SharedInterner::new(),
            modules: ModuleSet::new(),
        }
    }

    pub(crate) fn syntax(&self) -> Syntax<'_> {
        Syntax::new(&self.interner)
    }

    pub(crate) fn name(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    /// Check `module` against the modules added so far.
    pub(crate) fn check(&self, module: &Module) -> CheckOutput {
        check_module(module, &self.interner, &self.modules, &CheckConfig::unlimited())
            .unwrap_or_else(|e| panic!("internal error: {e}"))
    }

    /// Check `module` and make it importable.
    pub(crate) fn add(&mut self, module: &Module) -> Arc<SymbolTable> {
        let output = self.check(module);
        self.modules.insert(output.table)
    }
}

/// Codes of the table's errors and warnings, in report order.
pub(crate) fn codes(table: &SymbolTable) -> Vec<ErrorCode> {
    table.errors().iter().map(CheckError::code).collect()
}

/// Resolve a dotted name that must exist.
pub(crate) fn find(table: &SymbolTable, dotted: &str) -> SymbolId {
    match table.lookup(dotted) {
        Resolution::Found(id) => id,
        other => panic!("`{dotted}` did not resolve: {other:?}"),
    }
}

/// Companion sort of the data symbol named `dotted`.
pub(crate) fn sort(table: &SymbolTable, dotted: &str) -> SymbolId {
    let data = find(table, dotted);
    table
        .sort_of(data)
        .unwrap_or_else(|| panic!("`{dotted}` has no sort"))
}
