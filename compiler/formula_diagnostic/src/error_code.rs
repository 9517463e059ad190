//! Stable codes for every diagnostic the checker emits.

use std::fmt;

/// Error codes for all checker diagnostics.
///
/// Format: E#### (or W#### for warnings) where the first digit is the
/// checking stage:
/// - 1xxx: names and identifiers
/// - 2xxx: type declarations
/// - 3xxx: sizes, totality and contracts
/// - 4xxx: module composition
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub enum ErrorCode {
    // Names (E1xxx)
    /// Name does not resolve
    E1001,
    /// Name resolves to two symbols at equal depth
    E1002,
    /// Name already defined in this namespace
    E1003,
    /// Identifier used where it is not allowed
    E1004,
    /// Field label equals a namespace name
    E1005,

    // Type declarations (E2xxx)
    /// Sort accepts no finite terms
    E2001,
    /// `new` data takes derived data as a direct argument
    E2002,
    /// `new` data takes derived data through a union
    E2003,
    /// Transform parameter accepts `new` data of an output
    E2004,

    // Sizes and contracts (E3xxx)
    /// Map kind cannot hold for the argument sizes
    E3001,
    /// Non-relational position inside a recursive cycle
    E3002,
    /// Cardinality contract over non-`new` data
    E3003,

    // Composition (E4xxx)
    /// Illegal import or conflicting module short names
    E4001,

    // Warnings
    /// Cardinality contract is unsatisfiable or vacuous
    W3001,
}

impl ErrorCode {
    /// All variants, for exhaustive testing.
    ///
    /// `as_str()` is exhaustive by construction; keep this in step with it.
    pub const ALL: &[ErrorCode] = &[
        ErrorCode::E1001,
        ErrorCode::E1002,
        ErrorCode::E1003,
        ErrorCode::E1004,
        ErrorCode::E1005,
        ErrorCode::E2001,
        ErrorCode::E2002,
        ErrorCode::E2003,
        ErrorCode::E2004,
        ErrorCode::E3001,
        ErrorCode::E3002,
        ErrorCode::E3003,
        ErrorCode::E4001,
        ErrorCode::W3001,
    ];

    /// The code as written in output (e.g. `"E1001"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E1004 => "E1004",
            ErrorCode::E1005 => "E1005",
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E3001 => "E3001",
            ErrorCode::E3002 => "E3002",
            ErrorCode::E3003 => "E3003",
            ErrorCode::E4001 => "E4001",
            ErrorCode::W3001 => "W3001",
        }
    }

    /// Short human title, used as a fallback message.
    pub fn title(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "undefined symbol",
            ErrorCode::E1002 => "ambiguous symbol",
            ErrorCode::E1003 => "duplicate definition",
            ErrorCode::E1004 => "bad identifier",
            ErrorCode::E1005 => "label clash",
            ErrorCode::E2001 => "bad type declaration",
            ErrorCode::E2002 => "argument newness",
            ErrorCode::E2003 => "sub-argument newness",
            ErrorCode::E2004 => "transform newness",
            ErrorCode::E3001 => "totality",
            ErrorCode::E3002 => "relational recursion",
            ErrorCode::E3003 => "cardinality newness",
            ErrorCode::E4001 => "bad composition",
            ErrorCode::W3001 => "cardinality contract",
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, ErrorCode::W3001)
    }

    pub fn is_name_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::E1001
                | ErrorCode::E1002
                | ErrorCode::E1003
                | ErrorCode::E1004
                | ErrorCode::E1005
        )
    }

    pub fn is_size_error(&self) -> bool {
        matches!(self, ErrorCode::E3001 | ErrorCode::E3002 | ErrorCode::E3003)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
