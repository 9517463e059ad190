//! Symbol resolution and type well-formedness for FORMULA modules.
//!
//! Given a module's syntax tree and the checked tables of the modules it
//! composes, [`check_module`] builds the module's [`SymbolTable`]:
//! - every name resolved to a unique symbol in the namespace tree
//! - a canonical accepted-value form for each argument position
//! - productivity and cardinality bounds of every data sort
//! - the functionality, injectivity, totality and relational rules implied by
//!   the declarations, plus contract rules
//!
//! # Validity
//!
//! A table's validity is a write-once [`Lifted`] decision. Any error in
//! [`CheckErrorKind`] falsifies it; the pipeline keeps going so that one run
//! reports as much as possible. Only valid tables may be imported.
//!
//! # Identity
//!
//! Symbols and namespaces live in per-table arenas addressed by
//! [`SymbolId`] and [`NamespaceId`]. Ids are handed out in registration
//! order and never reused.

mod cancel;
mod canon;
mod canonical;
mod check;
mod coerce;
mod compose;
mod contract;
mod error;
mod ids;
mod lifted;
mod namespace;
mod productivity;
mod resolve;
mod rules;
mod size;
mod stack;
mod symbol;
mod table;

pub use cancel::CancellationToken;
pub use canonical::{AcceptedValues, CanonicalForm, ConstantValue};
pub use check::{check_module, CheckConfig, CheckOutput, ModuleLoader, ModuleSet};
pub use coerce::{coerce_across, Coercibility};
pub use error::{CheckAbort, CheckError, CheckErrorKind, InternalError};
pub use ids::{NamespaceId, SymbolId, TableId};
pub use lifted::Lifted;
pub use namespace::Namespace;
pub use resolve::{type_defining, ForeignPath, Resolution, SymbolFilter};
pub use rules::{IntroducedRule, RuleKind};
pub use size::SizeExpr;
pub use symbol::{
    BaseConstant, BaseOp, BaseSort, BaseSortSet, ConstantKind, ConstructorInfo, Convenience,
    KindTag, MapFlags, MapInfo, Symbol, SymbolKind, SymbolOrigin, SUB_CONSTRAINT,
};
pub use table::SymbolTable;

#[cfg(test)]
mod test_helpers;
