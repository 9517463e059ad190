//! Checker errors.
//!
//! Two families, kept apart:
//! - [`CheckError`]: problems in the user's module. Collected, turned into
//!   diagnostics, and they invalidate the table. Checking continues.
//! - [`CheckAbort`] / [`InternalError`]: cancellation and broken compiler
//!   invariants. Returned through `Result` and never shown as diagnostics.

use formula_diagnostic::{Diagnostic, ErrorCode};
use formula_ir::Location;

/// A problem in the checked module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckError {
    pub location: Location,
    pub kind: CheckErrorKind,
}

/// What went wrong. Names are pre-rendered dotted paths.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CheckErrorKind {
    #[error("undefined symbol `{name}`")]
    UndefinedSymbol { name: String },

    #[error("`{name}` is ambiguous")]
    AmbiguousSymbol {
        name: String,
        first: Location,
        second: Location,
    },

    #[error("bad composition: {reason}")]
    BadComposition { reason: String },

    #[error("`{id}` cannot be used as {usage}")]
    BadId { id: String, usage: &'static str },

    #[error("`{name}` is already defined")]
    DuplicateDefinition { name: String, previous: Location },

    #[error("`{map}` {reason}")]
    TotalityError { map: String, reason: String },

    #[error("`{sort}` recursively depends on itself through the non-relational position `{position}`")]
    RelationalError { sort: String, position: String },

    #[error("cardinality contract over `{sort}`, which is not constructed with `new`")]
    CardNewnessError { sort: String },

    #[error("cardinality contract over `{sort}` {reason}")]
    CardContractWarning { sort: String, reason: String },

    #[error("transform parameter `{param}` accepts `new` data `{sort}` of an output")]
    TransNewnessError { param: String, sort: String },

    #[error("field label `{label}` is also a namespace name")]
    LabelClashError { label: String },

    #[error("`{name}` {reason}")]
    BadTypeDecl { name: String, reason: String },

    #[error("`new` data `{symbol}` takes derived data `{arg}` as an argument")]
    ArgNewnessError { symbol: String, arg: String },

    #[error("`new` data `{symbol}` takes derived data `{arg}` through `{via}`")]
    SubArgNewnessError {
        symbol: String,
        arg: String,
        via: String,
    },
}

impl CheckErrorKind {
    pub fn code(&self) -> ErrorCode {
        match self {
            CheckErrorKind::UndefinedSymbol { .. } => ErrorCode::E1001,
            CheckErrorKind::AmbiguousSymbol { .. } => ErrorCode::E1002,
            CheckErrorKind::DuplicateDefinition { .. } => ErrorCode::E1003,
            CheckErrorKind::BadId { .. } => ErrorCode::E1004,
            CheckErrorKind::LabelClashError { .. } => ErrorCode::E1005,
            CheckErrorKind::BadTypeDecl { .. } => ErrorCode::E2001,
            CheckErrorKind::ArgNewnessError { .. } => ErrorCode::E2002,
            CheckErrorKind::SubArgNewnessError { .. } => ErrorCode::E2003,
            CheckErrorKind::TransNewnessError { .. } => ErrorCode::E2004,
            CheckErrorKind::TotalityError { .. } => ErrorCode::E3001,
            CheckErrorKind::RelationalError { .. } => ErrorCode::E3002,
            CheckErrorKind::CardNewnessError { .. } => ErrorCode::E3003,
            CheckErrorKind::BadComposition { .. } => ErrorCode::E4001,
            CheckErrorKind::CardContractWarning { .. } => ErrorCode::W3001,
        }
    }

    pub fn is_warning(&self) -> bool {
        self.code().is_warning()
    }
}

impl CheckError {
    pub fn new(location: Location, kind: CheckErrorKind) -> Self {
        CheckError { location, kind }
    }

    pub fn code(&self) -> ErrorCode {
        self.kind.code()
    }

    pub fn is_warning(&self) -> bool {
        self.kind.is_warning()
    }

    /// Convert to a diagnostic for the reporter.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let code = self.code();
        let base = if self.is_warning() {
            Diagnostic::warning(code)
        } else {
            Diagnostic::error(code)
        };
        let diag = base
            .with_message(self.kind.to_string())
            .with_label(self.location, code.title());
        match &self.kind {
            CheckErrorKind::AmbiguousSymbol { first, second, .. } => diag
                .with_secondary_label(*first, "could refer to this")
                .with_secondary_label(*second, "or to this"),
            CheckErrorKind::DuplicateDefinition { previous, .. } => {
                diag.with_secondary_label(*previous, "previously defined here")
            }
            CheckErrorKind::RelationalError { .. } => {
                diag.with_note("mark the position `any` or break the cycle")
            }
            _ => diag,
        }
    }
}

/// A compiler invariant was violated.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InternalError {
    #[error("decision already resolved to {old}, cannot resolve to {new}")]
    LiftedRewrite { old: bool, new: bool },

    #[error("canonical form of symbol {symbol} written twice")]
    CanonicalRewrite { symbol: u32 },

    #[error("size of sort {symbol} written twice")]
    SizeRewrite { symbol: u32 },

    #[error("symbol {symbol} is not a sort or type-valued constant")]
    NotCoercible { symbol: u32 },

    #[error("relabeling `{path}` failed after it type-checked")]
    RelabelFailed { path: String },
}

/// Why a pass stopped early.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CheckAbort {
    #[error("checking was cancelled")]
    Cancelled,

    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[cfg(test)]
mod tests;
