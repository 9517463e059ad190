//! Arena handles.
//!
//! Symbols and namespaces live in their table's arenas and refer to each
//! other only through these ids. Ids from different tables are unrelated.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Index of a symbol in its table. Assigned at registration, strictly
/// increasing, never reused.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(u32);

impl SymbolId {
    #[inline]
    pub(crate) const fn from_index(index: usize) -> Self {
        SymbolId(index as u32)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Index of a namespace in its table. The root is always `ROOT`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NamespaceId(u32);

impl NamespaceId {
    pub const ROOT: NamespaceId = NamespaceId(0);

    #[inline]
    pub(crate) const fn from_index(index: usize) -> Self {
        NamespaceId(index as u32)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ns{}", self.0)
    }
}

/// Process-unique identity of a symbol table.
///
/// Two tables with the same module name but different ids are different
/// modules as far as composition is concerned.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct TableId(u32);

static NEXT_TABLE: AtomicU32 = AtomicU32::new(1);

impl TableId {
    pub(crate) fn fresh() -> Self {
        TableId(NEXT_TABLE.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}
