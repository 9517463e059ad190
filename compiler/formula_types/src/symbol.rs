//! Symbols and their kinds.

use bitflags::bitflags;
use formula_ir::{Location, MapKind, Name};
use smallvec::SmallVec;

use crate::canonical::CanonicalForm;
use crate::ids::{NamespaceId, SymbolId, TableId};
use crate::size::SizeExpr;

/// Built-in sorts.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaseSort {
    Natural,
    PosInteger,
    NegInteger,
    Integer,
    Real,
    String,
    Boolean,
}

impl BaseSort {
    pub const ALL: [BaseSort; 7] = [
        BaseSort::Natural,
        BaseSort::PosInteger,
        BaseSort::NegInteger,
        BaseSort::Integer,
        BaseSort::Real,
        BaseSort::String,
        BaseSort::Boolean,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BaseSort::Natural => "Natural",
            BaseSort::PosInteger => "PosInteger",
            BaseSort::NegInteger => "NegInteger",
            BaseSort::Integer => "Integer",
            BaseSort::Real => "Real",
            BaseSort::String => "String",
            BaseSort::Boolean => "Boolean",
        }
    }

    pub fn flag(self) -> BaseSortSet {
        match self {
            BaseSort::Natural => BaseSortSet::NATURAL,
            BaseSort::PosInteger => BaseSortSet::POS_INTEGER,
            BaseSort::NegInteger => BaseSortSet::NEG_INTEGER,
            BaseSort::Integer => BaseSortSet::INTEGER,
            BaseSort::Real => BaseSortSet::REAL,
            BaseSort::String => BaseSortSet::STRING,
            BaseSort::Boolean => BaseSortSet::BOOLEAN,
        }
    }
}

bitflags! {
    /// A set of base sorts accepted at one argument position.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
    pub struct BaseSortSet: u8 {
        const NATURAL = 1 << 0;
        const POS_INTEGER = 1 << 1;
        const NEG_INTEGER = 1 << 2;
        const INTEGER = 1 << 3;
        const REAL = 1 << 4;
        const STRING = 1 << 5;
        const BOOLEAN = 1 << 6;
    }
}

impl BaseSortSet {
    /// Close the set under subsorting: `Integer` also accepts `Natural`,
    /// `Real` also accepts `Integer`, and so on.
    #[must_use]
    pub fn closure(self) -> BaseSortSet {
        let mut out = self;
        if out.contains(BaseSortSet::REAL) {
            out |= BaseSortSet::INTEGER;
        }
        if out.contains(BaseSortSet::INTEGER) {
            out |= BaseSortSet::NATURAL | BaseSortSet::NEG_INTEGER;
        }
        if out.contains(BaseSortSet::NATURAL) {
            out |= BaseSortSet::POS_INTEGER;
        }
        out
    }

    /// Sorts whose values are not all integers.
    pub const NON_INTEGER: BaseSortSet = BaseSortSet::REAL
        .union(BaseSortSet::STRING)
        .union(BaseSortSet::BOOLEAN);

    /// Whether the integer `value` belongs to one of the sorts.
    pub fn accepts_integer(self, value: i64) -> bool {
        let set = self.closure();
        (set.contains(BaseSortSet::POS_INTEGER) && value > 0)
            || (set.contains(BaseSortSet::NATURAL) && value >= 0)
            || (set.contains(BaseSortSet::NEG_INTEGER) && value < 0)
    }

    /// Integer intervals `[low, high]` covered by the set, as `i128` bounds.
    pub(crate) fn integer_intervals(self) -> SmallVec<[(i128, i128); 2]> {
        let set = self.closure();
        let mut out = SmallVec::new();
        if set.contains(BaseSortSet::NEG_INTEGER) {
            out.push((i128::MIN, -1));
        }
        if set.contains(BaseSortSet::NATURAL) {
            out.push((0, i128::MAX));
        } else if set.contains(BaseSortSet::POS_INTEGER) {
            out.push((1, i128::MAX));
        }
        out
    }
}

bitflags! {
    /// Obligations a map places on its relation.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct MapFlags: u8 {
        /// At most one codomain tuple per domain tuple.
        const FUNCTIONAL = 1 << 0;
        /// Distinct domain tuples map to distinct codomain tuples.
        const INJECTIVE = 1 << 1;
        /// Every domain tuple is mapped.
        const TOTAL = 1 << 2;
        /// Every codomain tuple is hit.
        const SURJECTIVE = 1 << 3;
    }
}

impl MapFlags {
    pub fn from_kind(kind: MapKind, partial: bool) -> Self {
        let mut flags = MapFlags::FUNCTIONAL;
        if !partial {
            flags |= MapFlags::TOTAL;
        }
        match kind {
            MapKind::Function => {}
            MapKind::Injection => flags |= MapFlags::INJECTIVE,
            MapKind::Surjection => flags |= MapFlags::SURJECTIVE,
            MapKind::Bijection => flags |= MapFlags::INJECTIVE | MapFlags::SURJECTIVE,
        }
        flags
    }
}

/// Built-in operators visible in every table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BaseOp {
    Count,
    Max,
    Min,
    And,
    Or,
    Not,
    ToString,
    StrLength,
    /// `%sub`: the per-table helper relational rules are phrased with.
    SubConstraint,
}

impl BaseOp {
    pub const ALL: [BaseOp; 9] = [
        BaseOp::Count,
        BaseOp::Max,
        BaseOp::Min,
        BaseOp::And,
        BaseOp::Or,
        BaseOp::Not,
        BaseOp::ToString,
        BaseOp::StrLength,
        BaseOp::SubConstraint,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BaseOp::Count => "count",
            BaseOp::Max => "max",
            BaseOp::Min => "min",
            BaseOp::And => "and",
            BaseOp::Or => "or",
            BaseOp::Not => "not",
            BaseOp::ToString => "toString",
            BaseOp::StrLength => "strLength",
            BaseOp::SubConstraint => SUB_CONSTRAINT,
        }
    }

    pub fn arity(self) -> u32 {
        match self {
            BaseOp::Count | BaseOp::Not | BaseOp::ToString | BaseOp::StrLength => 1,
            BaseOp::Max | BaseOp::Min | BaseOp::And | BaseOp::Or => 2,
            BaseOp::SubConstraint => 3,
        }
    }
}

/// Name of the sub-constraint helper. Never imported, always regenerated.
pub const SUB_CONSTRAINT: &str = "%sub";

/// Built-in constants.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BaseConstant {
    True,
    False,
}

impl BaseConstant {
    pub fn name(self) -> &'static str {
        match self {
            BaseConstant::True => "TRUE",
            BaseConstant::False => "FALSE",
        }
    }
}

/// Per-namespace convenience unions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Convenience {
    /// Every data sort, constant and base sort.
    Any,
    /// Every constructor and map sort.
    Data,
    /// Every data constant and type constant.
    Constant,
}

impl Convenience {
    pub const ALL: [Convenience; 3] = [Convenience::Any, Convenience::Data, Convenience::Constant];

    pub fn name(self) -> &'static str {
        match self {
            Convenience::Any => "Any",
            Convenience::Data => "Data",
            Convenience::Constant => "Constant",
        }
    }
}

/// Kind of user constant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConstantKind {
    /// Declared by an enumeration, e.g. `RED` in `{RED, BLUE}`.
    Enum,
    /// Boolean constant defined by rules, e.g. `valid`.
    Derived,
    /// Names a model fact, e.g. `v1` in `v1 is V(1)`.
    Symbolic,
    /// Transform value parameter.
    Variable,
    /// `#Name`: the type of a constructor or map as a value.
    Type { sort: SymbolId },
}

impl ConstantKind {
    /// Whether coercion recurses into this constant.
    pub fn is_type_valued(self) -> bool {
        matches!(self, ConstantKind::Derived | ConstantKind::Type { .. })
    }

    /// Merged into the importing table's root instead of being renamed.
    pub fn merges_into_root(self) -> bool {
        matches!(self, ConstantKind::Enum | ConstantKind::Symbolic)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstructorInfo {
    /// Declared with `new`.
    pub new: bool,
    pub labels: SmallVec<[Option<Name>; 4]>,
    /// Per position: marked `any`.
    pub any: SmallVec<[bool; 4]>,
    /// Companion sort.
    pub sort: SymbolId,
    /// `#Name`.
    pub type_constant: SymbolId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapInfo {
    pub kind: MapKind,
    pub partial: bool,
    pub flags: MapFlags,
    /// Positions `0..domain_arity` are the domain, the rest the codomain.
    pub domain_arity: u32,
    pub labels: SmallVec<[Option<Name>; 4]>,
    pub any: SmallVec<[bool; 4]>,
    pub sort: SymbolId,
    pub type_constant: SymbolId,
}

impl MapInfo {
    pub fn is_codomain(&self, position: usize) -> bool {
        position >= self.domain_arity as usize
    }
}

/// Tagged symbol kinds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    BaseSort(BaseSort),
    BaseOperator(BaseOp),
    BaseConstant(BaseConstant),
    /// The sort of a constructor or map, registered next to it.
    UserSort {
        data: SymbolId,
        /// Write-once cardinality bound.
        size: Option<SizeExpr>,
    },
    Constructor(ConstructorInfo),
    Map(MapInfo),
    Union { convenience: Option<Convenience> },
    UserConstant(ConstantKind),
}

/// Coarse kind tags, for compatibility checks and filters.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum KindTag {
    BaseSort,
    BaseOperator,
    BaseConstant,
    UserSort,
    Constructor,
    Map,
    Union,
    UserConstant,
}

impl SymbolKind {
    pub fn tag(&self) -> KindTag {
        match self {
            SymbolKind::BaseSort(_) => KindTag::BaseSort,
            SymbolKind::BaseOperator(_) => KindTag::BaseOperator,
            SymbolKind::BaseConstant(_) => KindTag::BaseConstant,
            SymbolKind::UserSort { .. } => KindTag::UserSort,
            SymbolKind::Constructor(_) => KindTag::Constructor,
            SymbolKind::Map(_) => KindTag::Map,
            SymbolKind::Union { .. } => KindTag::Union,
            SymbolKind::UserConstant(_) => KindTag::UserConstant,
        }
    }

    /// Symbols a type term may name.
    pub fn is_type_defining(&self) -> bool {
        matches!(
            self,
            SymbolKind::BaseSort(_)
                | SymbolKind::Constructor(_)
                | SymbolKind::Map(_)
                | SymbolKind::Union { .. }
        )
    }

    /// Constructors and maps.
    pub fn is_data(&self) -> bool {
        matches!(self, SymbolKind::Constructor(_) | SymbolKind::Map(_))
    }

    /// Companion sort of a constructor or map.
    pub fn data_sort(&self) -> Option<SymbolId> {
        match self {
            SymbolKind::Constructor(c) => Some(c.sort),
            SymbolKind::Map(m) => Some(m.sort),
            _ => None,
        }
    }

    /// `new` constructors and all maps.
    pub fn is_new(&self) -> bool {
        match self {
            SymbolKind::Constructor(c) => c.new,
            SymbolKind::Map(_) => true,
            _ => false,
        }
    }

    /// Per-position `any` marks of a constructor or map.
    pub fn any_flags(&self) -> &[bool] {
        match self {
            SymbolKind::Constructor(c) => &c.any,
            SymbolKind::Map(m) => &m.any,
            _ => &[],
        }
    }

    pub fn labels(&self) -> &[Option<Name>] {
        match self {
            SymbolKind::Constructor(c) => &c.labels,
            SymbolKind::Map(m) => &m.labels,
            _ => &[],
        }
    }

    pub fn convenience(&self) -> Option<Convenience> {
        match self {
            SymbolKind::Union { convenience } => *convenience,
            _ => None,
        }
    }
}

/// Where an imported symbol was first defined.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SymbolOrigin {
    pub table: TableId,
    pub symbol: SymbolId,
}

/// A registered symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub id: SymbolId,
    /// `Name::EMPTY` for companion sorts, which are not registered by name.
    pub name: Name,
    pub namespace: NamespaceId,
    pub arity: u32,
    pub location: Location,
    pub kind: SymbolKind,
    pub(crate) canonical: Option<CanonicalForm>,
    /// Set on symbols cloned from another table.
    pub origin: Option<SymbolOrigin>,
    /// Resolution of its declaration failed; later passes skip it.
    pub failed: bool,
}

impl Symbol {
    pub fn canonical(&self) -> Option<&CanonicalForm> {
        self.canonical.as_ref()
    }

    pub fn is_imported(&self) -> bool {
        self.origin.is_some()
    }

    /// Cardinality bound of a finalized user sort.
    pub fn size(&self) -> Option<&SizeExpr> {
        match &self.kind {
            SymbolKind::UserSort { size, .. } => size.as_ref(),
            _ => None,
        }
    }
}
