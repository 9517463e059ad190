//! The per-module checking pipeline.
//!
//! ```text
//! imports -> collect -> resolve -> finalize -> productivity -> sizes -> contracts
//! ```
//!
//! Passes run in order on one table. User errors are collected and do not
//! stop later passes; cancellation stops the pipeline and leaves the table
//! invalid. Validity is resolved last, so a table is terminal before it can
//! be handed to a [`ModuleSet`] and imported elsewhere.

use std::sync::Arc;

use formula_diagnostic::{Diagnostic, DiagnosticConfig, DiagnosticQueue};
use formula_ir::{Location, Module, Name, SharedInterner};
use rustc_hash::FxHashMap;

use crate::cancel::{CancellationToken, Ticker};
use crate::canon::Canonicalizer;
use crate::compose::{import, ImportOptions};
use crate::contract::check_contracts;
use crate::error::{CheckAbort, CheckErrorKind, InternalError};
use crate::productivity::check_productivity;
use crate::rules::IntroducedRule;
use crate::size::compute_sizes;
use crate::table::SymbolTable;

/// Source of already-checked tables for imports.
pub trait ModuleLoader {
    /// The terminal table of the module named `module`, if there is one.
    fn table(&self, module: Name) -> Option<Arc<SymbolTable>>;
}

/// Checked tables by module name.
#[derive(Debug, Default)]
pub struct ModuleSet {
    tables: FxHashMap<Name, Arc<SymbolTable>>,
}

impl ModuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a checked table, replacing any table of the same module name.
    pub fn insert(&mut self, table: SymbolTable) -> Arc<SymbolTable> {
        let table = Arc::new(table);
        self.tables.insert(table.module_name(), Arc::clone(&table));
        table
    }

    pub fn get(&self, module: Name) -> Option<&Arc<SymbolTable>> {
        self.tables.get(&module)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl ModuleLoader for ModuleSet {
    fn table(&self, module: Name) -> Option<Arc<SymbolTable>> {
        self.tables.get(&module).cloned()
    }
}

/// Knobs for one [`check_module`] run.
#[derive(Clone, Debug)]
pub struct CheckConfig {
    /// Steps between cancellation polls.
    pub cancel_batch_size: usize,
    /// Maximum errors kept as diagnostics (0 = unlimited). Validity counts
    /// every error regardless.
    pub error_limit: usize,
    pub cancel: CancellationToken,
}

impl Default for CheckConfig {
    fn default() -> Self {
        CheckConfig {
            cancel_batch_size: 256,
            error_limit: DiagnosticConfig::default().error_limit,
            cancel: CancellationToken::new(),
        }
    }
}

impl CheckConfig {
    /// No error limit, polling every step (for testing).
    pub fn unlimited() -> Self {
        CheckConfig {
            cancel_batch_size: 1,
            error_limit: 0,
            cancel: CancellationToken::new(),
        }
    }

    fn diagnostics(&self) -> DiagnosticConfig {
        DiagnosticConfig {
            error_limit: self.error_limit,
            ..DiagnosticConfig::default()
        }
    }
}

/// Result of checking one module.
#[derive(Debug)]
pub struct CheckOutput {
    pub table: SymbolTable,
    /// Sorted by primary location.
    pub diagnostics: Vec<Diagnostic>,
    pub cancelled: bool,
}

impl CheckOutput {
    pub fn is_valid(&self) -> bool {
        self.table.is_valid()
    }

    pub fn rules(&self) -> &[IntroducedRule] {
        self.table.rules()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }
}

/// Check `module`, importing its dependencies from `loader`.
///
/// `Err` only for broken compiler invariants. Cancellation is reported
/// through [`CheckOutput::cancelled`].
#[tracing::instrument(level = "debug", skip_all, fields(module = interner.lookup(module.name)))]
pub fn check_module(
    module: &Module,
    interner: &SharedInterner,
    loader: &dyn ModuleLoader,
    config: &CheckConfig,
) -> Result<CheckOutput, InternalError> {
    let mut table = SymbolTable::new(interner.clone(), module.name, module.kind, module.file);
    let mut ticker = Ticker::new(&config.cancel, config.cancel_batch_size);

    let cancelled = match run_passes(&mut table, module, loader, &mut ticker) {
        Ok(()) => false,
        Err(CheckAbort::Cancelled) => {
            tracing::debug!("cancelled");
            table.invalidate();
            true
        }
        Err(CheckAbort::Internal(error)) => return Err(error),
    };
    table.resolve_validity()?;

    let mut queue = DiagnosticQueue::with_config(config.diagnostics());
    for error in table.errors() {
        queue.add(error.to_diagnostic());
    }
    let diagnostics = queue.flush();
    for diagnostic in &diagnostics {
        tracing::trace!(diagnostic = %diagnostic.render(interner), "reported");
    }
    tracing::debug!(
        valid = table.is_valid(),
        symbols = table.symbol_count(),
        rules = table.rules().len(),
        diagnostics = diagnostics.len(),
        "checked"
    );
    Ok(CheckOutput {
        table,
        diagnostics,
        cancelled,
    })
}

fn run_passes(
    table: &mut SymbolTable,
    module: &Module,
    loader: &dyn ModuleLoader,
    ticker: &mut Ticker<'_>,
) -> Result<(), CheckAbort> {
    for reference in module.module_refs() {
        ticker.tick()?;
        match loader.table(reference.module) {
            Some(foreign) => import(table, reference, &foreign, ImportOptions::default(), ticker)?,
            None => {
                let name = table.interner().lookup(reference.module);
                table.report(
                    Location::new(module.file, reference.span),
                    CheckErrorKind::BadComposition {
                        reason: format!("module `{name}` is not available"),
                    },
                );
            }
        }
    }

    let mut canonicalizer = Canonicalizer::new(table, module, ticker);
    canonicalizer.collect()?;
    canonicalizer.resolve()?;
    canonicalizer.finalize()?;

    let productive = check_productivity(table, ticker)?;
    compute_sizes(table, &productive, ticker)?;
    check_contracts(table, module, ticker)?;
    Ok(())
}

#[cfg(test)]
mod tests;
