//! Diagnostics for the FORMULA front end.
//!
//! Every user-facing problem found while checking a module becomes a
//! [`Diagnostic`] carrying:
//! - a stable [`ErrorCode`] for searchability
//! - a severity (errors invalidate a module, warnings do not)
//! - a message and labeled [`Location`](formula_ir::Location)s, which may
//!   point into other files when symbols were imported
//!
//! Rendering to terminals is the driver's job; `Display` gives a plain
//! one-block form for logs and tests.

mod diagnostic;
mod error_code;
pub mod queue;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use queue::{DiagnosticConfig, DiagnosticQueue};
