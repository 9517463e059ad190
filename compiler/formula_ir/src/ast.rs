//! Module syntax trees consumed by the symbol-resolution core.
//!
//! The parser produces these; the core never mutates them. Module
//! references are already resolved to module names, whose compiled tables
//! are supplied separately by the driver.

use smallvec::SmallVec;

use crate::{Name, Span};

/// A possibly qualified identifier such as `Graph.V` or `L.Color.RED`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QualifiedId {
    pub segments: SmallVec<[Name; 2]>,
    pub span: Span,
}

impl QualifiedId {
    pub fn new(segments: impl IntoIterator<Item = Name>, span: Span) -> Self {
        QualifiedId {
            segments: segments.into_iter().collect(),
            span,
        }
    }

    /// The last segment, naming the symbol itself.
    pub fn last(&self) -> Name {
        self.segments.last().copied().unwrap_or(Name::EMPTY)
    }

    /// All segments but the last, naming the namespace path.
    pub fn qualifier(&self) -> &[Name] {
        match self.segments.split_last() {
            Some((_, prefix)) => prefix,
            None => &[],
        }
    }

    pub fn is_qualified(&self) -> bool {
        self.segments.len() > 1
    }
}

/// Kind of module.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    Domain,
    Model,
    Transform,
    TransformSystem,
}

/// How a module reference composes the referenced module.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CompositionKind {
    /// `domain D includes R:: E`
    Includes,
    /// `domain D extends R:: E`
    Extends,
    /// `model M of D`
    Of,
    /// Transform model parameter.
    Input,
    /// Transform output model.
    Output,
}

/// Reference to another, separately compiled module.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModuleRef {
    /// Optional renaming: `R:: Other`.
    pub rename: Option<Name>,
    /// Name of the referenced module.
    pub module: Name,
    pub kind: CompositionKind,
    pub span: Span,
}

/// Transform parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Param {
    /// Value parameter with a declared type, e.g. `(x: Integer)`.
    Value {
        name: Name,
        ty: Vec<TypeTerm>,
        span: Span,
    },
    /// Model parameter, e.g. `(in:: Graph)`.
    Model(ModuleRef),
}

/// Literal constants.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Literal {
    Integer(i64),
    String(Name),
}

/// Element of an enumeration `{RED, 1..4, "x", 7}`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EnumElement {
    /// A user constant: declared here if unqualified and not yet defined.
    Constant(QualifiedId),
    Literal(Literal, Span),
    /// Inclusive integer range.
    Range { low: i64, high: i64, span: Span },
}

/// One member of a union-typed position.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeTerm {
    /// Reference to a sort, union, base sort or constant.
    Id(QualifiedId),
    /// Inline enumeration.
    Enum(Vec<EnumElement>, Span),
}

impl TypeTerm {
    pub fn span(&self) -> Span {
        match self {
            TypeTerm::Id(id) => id.span,
            TypeTerm::Enum(_, span) => *span,
        }
    }
}

/// Argument position of a constructor or map.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Field {
    pub label: Option<Name>,
    /// Union of accepted type terms.
    pub ty: Vec<TypeTerm>,
    /// `any` marks an unconstrained (non-relational) position.
    pub any: bool,
    pub span: Span,
}

/// Constructor flavor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConstructorKind {
    /// `C ::= new (...)`: data that may appear as model facts.
    New,
    /// `C ::= (...)`: data produced only by rules.
    Derived,
}

/// Map flavor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MapKind {
    Function,
    Injection,
    Surjection,
    Bijection,
}

/// Kind of type declaration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeDeclKind {
    /// `U ::= A + B + {X, Y}`
    Union(Vec<TypeTerm>),
    /// `C ::= new (x: A, y: B)`
    Constructor {
        kind: ConstructorKind,
        fields: Vec<Field>,
    },
    /// `F ::= fun (x: A -> y: B)`; `partial` for `=>`.
    Map {
        kind: MapKind,
        partial: bool,
        domain: Vec<Field>,
        codomain: Vec<Field>,
    },
}

/// A type declaration `Name ::= ...`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeDecl {
    pub name: Name,
    pub span: Span,
    pub kind: TypeDeclKind,
}

/// Kind of declared constant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConstantDeclKind {
    /// Derived constant, defined by rules (e.g. `valid`).
    Derived,
    /// Symbolic constant naming a model fact (e.g. `v1` in `v1 is V(1)`).
    Symbolic,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConstantDecl {
    pub name: Name,
    pub kind: ConstantDeclKind,
    pub span: Span,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ContractKind {
    Requires,
    Ensures,
    Conforms,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CardinalityKind {
    Some,
    AtLeast(u64),
    AtMost(u64),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ContractItem {
    /// `requires atleast 2 V.`
    Cardinality {
        kind: CardinalityKind,
        sort: QualifiedId,
    },
    /// `conforms valid, acyclic.`
    Holds(Vec<QualifiedId>),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContractDecl {
    pub kind: ContractKind,
    pub item: ContractItem,
    pub span: Span,
}

/// One module: a domain, model, transform or transform system.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Module {
    pub kind: ModuleKind,
    pub name: Name,
    /// Interned path of the source file.
    pub file: Name,
    pub span: Span,
    pub compositions: Vec<ModuleRef>,
    pub params: Vec<Param>,
    pub outputs: Vec<ModuleRef>,
    pub types: Vec<TypeDecl>,
    pub constants: Vec<ConstantDecl>,
    pub contracts: Vec<ContractDecl>,
}

impl Module {
    /// Empty module of the given kind.
    pub fn new(kind: ModuleKind, name: Name, file: Name) -> Self {
        Module {
            kind,
            name,
            file,
            span: Span::DUMMY,
            compositions: Vec::new(),
            params: Vec::new(),
            outputs: Vec::new(),
            types: Vec::new(),
            constants: Vec::new(),
            contracts: Vec::new(),
        }
    }

    /// Every module reference, in import order: compositions, model
    /// parameters, then outputs.
    pub fn module_refs(&self) -> impl Iterator<Item = &ModuleRef> {
        let params = self.params.iter().filter_map(|p| match p {
            Param::Model(r) => Some(r),
            Param::Value { .. } => None,
        });
        self.compositions.iter().chain(params).chain(self.outputs.iter())
    }
}
