//! Coercion between renamings.
//!
//! A value built under namespace `from` is coercible to namespace `to` when
//! the same-named symbol exists under `to` and accepts everything the source
//! accepts, position by position. Nested user sorts and type-valued
//! constants are retested recursively under the same pair of namespaces.
//!
//! Answers are memoized per `(symbol, from, to)` in a write-once cache
//! guarded by the table's coercion lock. An entry is `Pending` while its
//! check runs; see [`assume_pending_coercion_holds`] for what re-entering
//! such an entry means.

use formula_ir::{CompositionKind, ModuleKind, ModuleRef, Name, Span};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::cancel::{CancellationToken, Ticker};
use crate::canonical::{AcceptedValues, ConstantValue};
use crate::compose::{import, ImportOptions};
use crate::error::{CheckAbort, InternalError};
use crate::ids::{NamespaceId, SymbolId};
use crate::lifted::Lifted;
use crate::stack::ensure_sufficient_stack;
use crate::symbol::{ConstantKind, SymbolKind};
use crate::table::SymbolTable;

type CoercionKey = (SymbolId, NamespaceId, NamespaceId);

#[derive(Copy, Clone, Debug)]
struct CoercionEntry {
    state: Lifted,
    target: Option<SymbolId>,
}

/// Memoized coercion decisions of one table.
#[derive(Default, Debug)]
pub(crate) struct CoercionCache {
    entries: FxHashMap<CoercionKey, CoercionEntry>,
}

impl CoercionCache {
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Answer to a coercion query.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Coercibility {
    pub coercible: bool,
    /// The corresponding symbol under the destination namespace.
    pub target: Option<SymbolId>,
}

impl Coercibility {
    const NO: Coercibility = Coercibility {
        coercible: false,
        target: None,
    };
}

/// Re-entering a coercion that is still being decided counts as success.
///
/// This lets mutually recursive sorts be compared without looping, but it
/// is optimistic: a recursive coercion that fails later may already have
/// been relied on by an inner query, whose cached `True` then stands.
#[inline]
fn assume_pending_coercion_holds() -> bool {
    true
}

impl SymbolTable {
    /// Whether values of `symbol` built under `from` can be used under `to`.
    ///
    /// `symbol` must be a user sort or a type-valued constant unless
    /// `from == to`, which holds trivially for every symbol.
    pub fn is_coercible(
        &self,
        symbol: SymbolId,
        from: NamespaceId,
        to: NamespaceId,
    ) -> Result<Coercibility, InternalError> {
        let mut cache = self.coercions.lock();
        Coercer {
            table: self,
            cache: &mut cache,
        }
        .coerce(symbol, from, to)
    }

    /// Cached state of a query, `Pending` if it was never asked.
    pub fn cached_coercion(&self, symbol: SymbolId, from: NamespaceId, to: NamespaceId) -> Lifted {
        self.coercions
            .lock()
            .entries
            .get(&(symbol, from, to))
            .map_or(Lifted::Pending, |e| e.state)
    }

    pub fn coercion_cache_len(&self) -> usize {
        self.coercions.lock().len()
    }
}

struct Coercer<'a> {
    table: &'a SymbolTable,
    cache: &'a mut CoercionCache,
}

impl Coercer<'_> {
    fn coerce(
        &mut self,
        symbol: SymbolId,
        from: NamespaceId,
        to: NamespaceId,
    ) -> Result<Coercibility, InternalError> {
        if from == to {
            return Ok(Coercibility {
                coercible: true,
                target: Some(symbol),
            });
        }
        if !is_coercible_kind(&self.table.symbol(symbol).kind) {
            return Err(InternalError::NotCoercible {
                symbol: symbol.raw(),
            });
        }

        let key = (symbol, from, to);
        if let Some(entry) = self.cache.entries.get(&key) {
            return Ok(match entry.state {
                Lifted::True => Coercibility {
                    coercible: true,
                    target: entry.target,
                },
                Lifted::False => Coercibility::NO,
                Lifted::Pending => Coercibility {
                    coercible: assume_pending_coercion_holds(),
                    target: entry.target,
                },
            });
        }

        let target = self.destination(symbol, from, to);
        self.cache.entries.insert(
            key,
            CoercionEntry {
                state: Lifted::Pending,
                target,
            },
        );
        let holds = match target {
            None => false,
            Some(t) if t == symbol => true,
            Some(t) => match ensure_sufficient_stack(|| self.check(symbol, t, from, to)) {
                Ok(holds) => holds,
                Err(error) => {
                    // An aborted check leaves no answer behind.
                    self.cache.entries.remove(&key);
                    return Err(error);
                }
            },
        };
        tracing::trace!(symbol = ?symbol, ?from, ?to, holds, "coercion decided");

        if let Some(entry) = self.cache.entries.get_mut(&key) {
            entry.state.resolve(holds)?;
        }
        Ok(if holds {
            Coercibility {
                coercible: true,
                target,
            }
        } else {
            Coercibility::NO
        })
    }

    /// The symbol at the same relative path under `to`, if it has the same
    /// kind and arity. Symbols outside `from` are shared and map to
    /// themselves.
    fn destination(&self, symbol: SymbolId, from: NamespaceId, to: NamespaceId) -> Option<SymbolId> {
        let table = self.table;
        let source = table.symbol(symbol);
        let named = match &source.kind {
            SymbolKind::UserSort { data, .. } => table.symbol(*data),
            _ => source,
        };
        if !table.is_within(named.namespace, from) {
            return Some(symbol);
        }

        let depth = table.namespace_path(from).len();
        let relative = table.namespace_path(named.namespace);
        let mut ns = to;
        for &segment in relative.get(depth..).unwrap_or_default() {
            ns = table.namespace(ns).child(segment)?;
        }
        let found = table.namespace(ns).symbol(named.name)?;
        let candidate = table.symbol(found);
        if candidate.kind.tag() != named.kind.tag() || candidate.arity != named.arity {
            return None;
        }
        match &source.kind {
            SymbolKind::UserSort { .. } => table.sort_of(found),
            _ => Some(found),
        }
    }

    fn check(
        &mut self,
        source: SymbolId,
        target: SymbolId,
        from: NamespaceId,
        to: NamespaceId,
    ) -> Result<bool, InternalError> {
        let table = self.table;
        if let SymbolKind::UserConstant(ConstantKind::Type { sort }) = table.symbol(source).kind {
            let SymbolKind::UserConstant(ConstantKind::Type { sort: expected }) =
                table.symbol(target).kind
            else {
                return Ok(false);
            };
            let inner = self.coerce(sort, from, to)?;
            return Ok(inner.coercible && inner.target == Some(expected));
        }

        let (Some(src), Some(dst)) = (table.symbol(source).canonical(), table.symbol(target).canonical())
        else {
            return Ok(false);
        };
        if src.len() != dst.len() {
            return Ok(false);
        }

        let mut pending: SmallVec<[(SymbolId, usize); 8]> = SmallVec::new();
        for (position, (s, d)) in src.positions().iter().zip(dst.positions()).enumerate() {
            if !self.accepts_directly(s, d, position, &mut pending) {
                return Ok(false);
            }
        }
        for (nested, position) in pending {
            let answer = self.coerce(nested, from, to)?;
            let Some(mapped) = answer.target.filter(|_| answer.coercible) else {
                return Ok(false);
            };
            let Some(d) = dst.get(position) else {
                return Ok(false);
            };
            if !(d.sorts().contains(&mapped) || d.accepts_constant(ConstantValue::Symbol(mapped), false)) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Literal, range and base-sort checks for one position. Nested sorts
    /// and type-valued constants are queued in `pending`.
    fn accepts_directly(
        &self,
        src: &AcceptedValues,
        dst: &AcceptedValues,
        position: usize,
        pending: &mut SmallVec<[(SymbolId, usize); 8]>,
    ) -> bool {
        if !dst.accepts_base(src.base()) {
            return false;
        }
        if !src.ranges().iter().all(|&(low, high)| dst.accepts_range(low, high)) {
            return false;
        }
        for &value in src.constants() {
            match value {
                ConstantValue::String(_) => {
                    if !dst.accepts_constant(value, false) {
                        return false;
                    }
                }
                ConstantValue::Symbol(c) => match &self.table.symbol(c).kind {
                    SymbolKind::UserConstant(kind) if kind.is_type_valued() => {
                        pending.push((c, position));
                    }
                    kind => {
                        let is_boolean = matches!(kind, SymbolKind::BaseConstant(_));
                        if !dst.accepts_constant(value, is_boolean) {
                            return false;
                        }
                    }
                },
            }
        }
        pending.extend(src.sorts().iter().map(|&s| (s, position)));
        true
    }
}

fn is_coercible_kind(kind: &SymbolKind) -> bool {
    match kind {
        SymbolKind::UserSort { .. } => true,
        SymbolKind::UserConstant(k) => k.is_type_valued(),
        _ => false,
    }
}

const SCRATCH_MODULE: &str = "%scratch";
const SCRATCH_LEFT: &str = "%a";
const SCRATCH_RIGHT: &str = "%b";

/// Decide whether values of the sort `path` in `left` coerce to `right`.
///
/// Both tables are imported into a throwaway table under internal
/// renamings; the table is dropped afterwards and neither input is touched.
/// `path` is a dotted name relative to `left`'s root.
pub fn coerce_across(
    left: &SymbolTable,
    right: &SymbolTable,
    path: &str,
) -> Result<Coercibility, CheckAbort> {
    let interner = left.interner().clone();
    let module = interner.intern(SCRATCH_MODULE);
    let mut scratch =
        SymbolTable::new(interner.clone(), module, ModuleKind::TransformSystem, module);
    let options = ImportOptions::internal();
    let token = CancellationToken::new();
    let mut ticker = Ticker::new(&token, usize::MAX);

    let mut namespaces: SmallVec<[NamespaceId; 2]> = SmallVec::new();
    for (rename, foreign) in [(SCRATCH_LEFT, left), (SCRATCH_RIGHT, right)] {
        let rename = interner.intern(rename);
        let reference = ModuleRef {
            rename: Some(rename),
            module: foreign.module_name(),
            kind: CompositionKind::Includes,
            span: Span::DUMMY,
        };
        import(&mut scratch, &reference, foreign, options, &mut ticker)?;
        let Some(ns) = scratch.namespace(scratch.root()).child(rename) else {
            return Ok(Coercibility::NO);
        };
        namespaces.push(ns);
    }

    let segments: Option<Vec<Name>> = path.split('.').map(|s| interner.get(s)).collect();
    let Some(segments) = segments else {
        return Ok(Coercibility::NO);
    };
    let Some(symbol) = scratch.resolve_symbol(&segments, Some(namespaces[0]), None).found() else {
        return Ok(Coercibility::NO);
    };
    if !scratch.is_within(scratch.symbol(symbol).namespace, namespaces[0]) {
        return Ok(Coercibility::NO);
    }
    let symbol = scratch.sort_of(symbol).unwrap_or(symbol);
    if !is_coercible_kind(&scratch.symbol(symbol).kind) {
        return Ok(Coercibility::NO);
    }
    let answer = scratch.is_coercible(symbol, namespaces[0], namespaces[1])?;
    tracing::debug!(path, coercible = answer.coercible, "cross-table coercion");
    // Ids of the scratch table mean nothing to the caller.
    Ok(Coercibility {
        coercible: answer.coercible,
        target: None,
    })
}
