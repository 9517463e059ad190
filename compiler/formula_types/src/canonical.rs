//! Canonical forms: what each argument position accepts.
//!
//! Integer literals are stored as ranges so membership and coverage are
//! decided on one normalized interval list.

use std::collections::BTreeSet;

use formula_ir::Name;
use smallvec::SmallVec;

use crate::ids::SymbolId;
use crate::symbol::BaseSortSet;

/// Non-integer constant values.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConstantValue {
    String(Name),
    /// A user or base constant symbol (`RED`, `TRUE`, `#V`, `valid`).
    Symbol(SymbolId),
}

/// Flattened union of values accepted at one position.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AcceptedValues {
    constants: BTreeSet<ConstantValue>,
    /// Sorted, disjoint and non-adjacent inclusive ranges.
    ranges: Vec<(i64, i64)>,
    base: BaseSortSet,
    /// Companion sorts of constructors and maps.
    sorts: BTreeSet<SymbolId>,
}

impl AcceptedValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constants(&self) -> &BTreeSet<ConstantValue> {
        &self.constants
    }

    pub fn ranges(&self) -> &[(i64, i64)] {
        &self.ranges
    }

    pub fn base(&self) -> BaseSortSet {
        self.base
    }

    pub fn sorts(&self) -> &BTreeSet<SymbolId> {
        &self.sorts
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
            && self.ranges.is_empty()
            && self.base.is_empty()
            && self.sorts.is_empty()
    }

    /// Accepts some value that is not a user sort.
    pub fn has_ground_values(&self) -> bool {
        !self.constants.is_empty() || !self.ranges.is_empty() || !self.base.is_empty()
    }

    pub fn add_integer(&mut self, value: i64) {
        self.add_range(value, value);
    }

    /// Add `[low, high]`. Empty ranges are ignored.
    pub fn add_range(&mut self, low: i64, high: i64) {
        if low > high {
            return;
        }
        self.ranges.push((low, high));
        self.ranges = merge_ranges(self.ranges.iter().map(|&(l, h)| (l.into(), h.into())))
            .into_iter()
            .map(|(l, h)| (narrow(l), narrow(h)))
            .collect();
    }

    pub fn add_string(&mut self, value: Name) {
        self.constants.insert(ConstantValue::String(value));
    }

    pub fn add_constant(&mut self, symbol: SymbolId) {
        self.constants.insert(ConstantValue::Symbol(symbol));
    }

    pub fn add_base(&mut self, base: BaseSortSet) {
        self.base |= base;
    }

    pub fn add_sort(&mut self, sort: SymbolId) {
        self.sorts.insert(sort);
    }

    pub fn union_with(&mut self, other: &AcceptedValues) {
        self.constants.extend(other.constants.iter().copied());
        self.base |= other.base;
        self.sorts.extend(other.sorts.iter().copied());
        for &(low, high) in &other.ranges {
            self.add_range(low, high);
        }
    }

    pub fn accepts_integer(&self, value: i64) -> bool {
        self.base.accepts_integer(value)
            || self
                .ranges
                .iter()
                .any(|&(low, high)| low <= value && value <= high)
    }

    /// Whether every integer in `[low, high]` is accepted.
    pub fn accepts_range(&self, low: i64, high: i64) -> bool {
        if low > high {
            return true;
        }
        covers(&self.integer_intervals(), i128::from(low), i128::from(high))
    }

    /// Whether every value of the base sorts `other` is accepted, counting
    /// integer ranges towards the integer sorts.
    pub fn accepts_base(&self, other: BaseSortSet) -> bool {
        if !self.base.closure().contains(other & BaseSortSet::NON_INTEGER) {
            return false;
        }
        let covered = self.integer_intervals();
        other
            .integer_intervals()
            .iter()
            .all(|&(low, high)| covers(&covered, low, high))
    }

    /// Accepted integers as merged intervals.
    fn integer_intervals(&self) -> SmallVec<[(i128, i128); 4]> {
        merge_ranges(
            self.ranges
                .iter()
                .map(|&(l, h)| (i128::from(l), i128::from(h)))
                .chain(self.base.integer_intervals()),
        )
    }

    /// Whether a constant value is accepted. Booleans are accepted by the
    /// `Boolean` base sort through `is_boolean`.
    pub fn accepts_constant(&self, value: ConstantValue, is_boolean: bool) -> bool {
        if self.constants.contains(&value) {
            return true;
        }
        match value {
            ConstantValue::String(_) => self.base.contains(BaseSortSet::STRING),
            ConstantValue::Symbol(_) => is_boolean && self.base.contains(BaseSortSet::BOOLEAN),
        }
    }

    /// Number of values accepted, ignoring user sorts. `None` when a base
    /// sort other than `Boolean` makes it infinite.
    pub fn ground_count(&self) -> Option<u64> {
        if !(self.base - BaseSortSet::BOOLEAN).is_empty() {
            return None;
        }
        let mut count = self.constants.len() as u64;
        if self.base.contains(BaseSortSet::BOOLEAN) {
            count = count.checked_add(2)?;
        }
        for &(low, high) in &self.ranges {
            let len = u64::try_from(i128::from(high) - i128::from(low) + 1).ok()?;
            count = count.checked_add(len)?;
        }
        Some(count)
    }

    /// Rewrite symbol references. References `f` maps to `None` are dropped.
    #[must_use]
    pub fn map_ids(&self, f: impl Fn(SymbolId) -> Option<SymbolId>) -> AcceptedValues {
        AcceptedValues {
            constants: self
                .constants
                .iter()
                .filter_map(|c| match *c {
                    ConstantValue::Symbol(id) => f(id).map(ConstantValue::Symbol),
                    s @ ConstantValue::String(_) => Some(s),
                })
                .collect(),
            ranges: self.ranges.clone(),
            base: self.base,
            sorts: self.sorts.iter().filter_map(|&s| f(s)).collect(),
        }
    }

    /// Symbol constants, in order.
    pub fn constant_symbols(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.constants.iter().filter_map(|c| match c {
            ConstantValue::Symbol(id) => Some(*id),
            ConstantValue::String(_) => None,
        })
    }
}

/// Sort and merge overlapping or adjacent intervals.
fn merge_ranges(ranges: impl IntoIterator<Item = (i128, i128)>) -> SmallVec<[(i128, i128); 4]> {
    let mut all: SmallVec<[(i128, i128); 4]> = ranges.into_iter().collect();
    all.sort_unstable();
    let mut out: SmallVec<[(i128, i128); 4]> = SmallVec::new();
    for (low, high) in all {
        match out.last_mut() {
            Some(last) if low <= last.1.saturating_add(1) => last.1 = last.1.max(high),
            _ => out.push((low, high)),
        }
    }
    out
}

/// Whether ascending `intervals` cover `[low, high]` without a gap.
fn covers(intervals: &[(i128, i128)], low: i128, high: i128) -> bool {
    let mut next = low;
    for &(l, h) in intervals {
        if l > next {
            return false;
        }
        if h >= high {
            return true;
        }
        next = next.max(h + 1);
    }
    false
}

/// Interval bounds built from `i64` ranges always fit back.
fn narrow(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

/// One [`AcceptedValues`] per argument position.
///
/// Unions have a single position holding their flattened members.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CanonicalForm(Vec<AcceptedValues>);

impl CanonicalForm {
    pub fn new(positions: Vec<AcceptedValues>) -> Self {
        CanonicalForm(positions)
    }

    pub fn positions(&self) -> &[AcceptedValues] {
        &self.0
    }

    pub fn get(&self, position: usize) -> Option<&AcceptedValues> {
        self.0.get(position)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn map_ids(&self, f: impl Fn(SymbolId) -> Option<SymbolId>) -> CanonicalForm {
        CanonicalForm(self.0.iter().map(|p| p.map_ids(&f)).collect())
    }
}
