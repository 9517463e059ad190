//! Diagnostic queue: error limits, deduplication and ordering.

use formula_ir::Location;
use rustc_hash::FxHashSet;

use crate::{Diagnostic, ErrorCode};

/// Configuration for diagnostic collection.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct DiagnosticConfig {
    /// Maximum number of errors kept (0 = unlimited). Warnings never count.
    pub error_limit: usize,
    /// Drop diagnostics identical in code, primary location and message.
    pub deduplicate: bool,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        DiagnosticConfig {
            error_limit: 100,
            deduplicate: true,
        }
    }
}

/// Collects diagnostics in emission order.
///
/// ```text
/// let mut queue = DiagnosticQueue::new();
/// queue.add(diagnostic);
/// let sorted = queue.flush();
/// ```
#[derive(Clone, Debug, Default)]
pub struct DiagnosticQueue {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    seen: FxHashSet<(ErrorCode, Option<Location>, String)>,
    config: DiagnosticConfig,
}

impl DiagnosticQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DiagnosticConfig) -> Self {
        DiagnosticQueue {
            config,
            ..Self::default()
        }
    }

    /// Add a diagnostic. Returns `false` if it was filtered.
    pub fn add(&mut self, diag: Diagnostic) -> bool {
        let is_error = diag.is_error();
        if is_error && self.limit_reached() {
            return false;
        }
        if self.config.deduplicate {
            let key = (diag.code, diag.primary_location(), diag.message.clone());
            if !self.seen.insert(key) {
                return false;
            }
        }
        if is_error {
            self.error_count += 1;
        }
        self.diagnostics.push(diag);
        true
    }

    pub fn limit_reached(&self) -> bool {
        self.config.error_limit > 0 && self.error_count >= self.config.error_limit
    }

    /// Number of errors kept in the queue.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Take all diagnostics sorted by primary location.
    ///
    /// The sort is stable, so diagnostics at the same location keep their
    /// emission order. Clears the queue.
    pub fn flush(&mut self) -> Vec<Diagnostic> {
        let mut result = std::mem::take(&mut self.diagnostics);
        result.sort_by_key(Diagnostic::primary_location);
        self.error_count = 0;
        self.seen.clear();
        result
    }
}
