//! String interner for identifiers and string literals.
//!
//! All tables that take part in one composition must share a single
//! interner: imported symbols keep the foreign table's `Name`s.

// Arc is needed here for SharedInterner - tables compiled on different
// threads resolve names through the same interner.
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::Name;

/// Error when interning a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternError {
    /// More than `u32::MAX` distinct strings.
    Overflow { count: usize },
}

impl std::fmt::Display for InternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InternError::Overflow { count } => write!(
                f,
                "interner exceeded capacity: {count} strings, max is {}",
                u32::MAX
            ),
        }
    }
}

impl std::error::Error for InternError {}

#[derive(Default)]
struct InternStore {
    map: FxHashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

/// Thread-safe string interner.
///
/// Strings are leaked to obtain `'static` lifetimes; an interner lives for
/// the whole compilation session.
pub struct StringInterner {
    store: RwLock<InternStore>,
}

/// Reserved identifiers interned up front so their `Name`s are stable.
const RESERVED: &[&str] = &[
    // Base sorts
    "Natural",
    "PosInteger",
    "NegInteger",
    "Integer",
    "Real",
    "String",
    "Boolean",
    // Base constants
    "TRUE",
    "FALSE",
    // Convenience unions
    "Any",
    "Data",
    "Constant",
    // Keywords that cannot name a declaration
    "new",
    "any",
    "sub",
    "fun",
    "inj",
    "sur",
    "bij",
    "domain",
    "model",
    "transform",
    "includes",
    "extends",
    "requires",
    "ensures",
    "conforms",
];

impl StringInterner {
    /// Create a new interner with reserved identifiers pre-interned.
    pub fn new() -> Self {
        let mut store = InternStore::default();
        let empty: &'static str = "";
        store.map.insert(empty, 0);
        store.strings.push(empty);
        let interner = StringInterner {
            store: RwLock::new(store),
        };
        for word in RESERVED {
            interner.intern(word);
        }
        interner
    }

    /// Try to intern a string, returning its `Name` or an error on overflow.
    pub fn try_intern(&self, s: &str) -> Result<Name, InternError> {
        if let Some(&raw) = self.store.read().map.get(s) {
            return Ok(Name::from_raw(raw));
        }

        let mut guard = self.store.write();
        // Double-check after acquiring the write lock
        if let Some(&raw) = guard.map.get(s) {
            return Ok(Name::from_raw(raw));
        }

        let raw = u32::try_from(guard.strings.len()).map_err(|_| InternError::Overflow {
            count: guard.strings.len(),
        })?;
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        guard.strings.push(leaked);
        guard.map.insert(leaked, raw);
        Ok(Name::from_raw(raw))
    }

    /// Intern a string, returning its `Name`.
    ///
    /// # Panics
    /// Panics if the interner exceeds `u32::MAX` strings.
    #[inline]
    pub fn intern(&self, s: &str) -> Name {
        self.try_intern(s).unwrap_or_else(|e| panic!("{}", e))
    }

    /// Look up an already interned string without interning it.
    pub fn get(&self, s: &str) -> Option<Name> {
        self.store.read().map.get(s).map(|&raw| Name::from_raw(raw))
    }

    /// Look up the string for a `Name`.
    ///
    /// Unknown names (from a different interner) render as the empty string.
    pub fn lookup(&self, name: Name) -> &'static str {
        self.store
            .read()
            .strings
            .get(name.index())
            .copied()
            .unwrap_or("")
    }

    /// Number of interned strings, including the empty string.
    pub fn len(&self) -> usize {
        self.store.read().strings.len()
    }

    /// Whether only the empty string is interned.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// Join names with `.` into a dotted path.
    pub fn join(&self, names: &[Name]) -> String {
        let mut out = String::new();
        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push_str(self.lookup(*name));
        }
        out
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Interner shared between tables compiled on different threads.
#[derive(Clone, Default)]
pub struct SharedInterner(Arc<StringInterner>);

impl SharedInterner {
    pub fn new() -> Self {
        SharedInterner(Arc::new(StringInterner::new()))
    }
}

impl std::ops::Deref for SharedInterner {
    type Target = StringInterner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
