//! Plain constructors for module syntax trees.
//!
//! Used by drivers that synthesize modules and by tests. There is no shared
//! builder instance: [`Syntax`] only borrows the interner, and each
//! [`ModuleBuilder`] owns the module it builds.
//!
//! ```text
//! let s = Syntax::new(&interner);
//! let graph = ModuleBuilder::domain(&interner, "Graph")
//!     .constructor("V", ConstructorKind::New, vec![s.field("lbl", "Integer")])
//!     .constructor("E", ConstructorKind::New, vec![s.field("src", "V"), s.field("dst", "V")])
//!     .build();
//! ```

use std::cell::Cell;

use crate::ast::{
    CardinalityKind, CompositionKind, ConstantDecl, ConstantDeclKind, ConstructorKind,
    ContractDecl, ContractItem, ContractKind, EnumElement, Field, Literal, MapKind, Module,
    ModuleKind, ModuleRef, Param, QualifiedId, TypeDecl, TypeDeclKind, TypeTerm,
};
use crate::{Name, Span, StringInterner};

/// Hands out distinct synthetic spans so built declarations are
/// distinguishable in diagnostics.
#[derive(Default)]
struct SpanCounter(Cell<u32>);

impl SpanCounter {
    fn next(&self) -> Span {
        let start = self.0.get();
        self.0.set(start + 2);
        Span::new(start, start + 1)
    }
}

/// Term-level constructors bound to an interner.
pub struct Syntax<'a> {
    interner: &'a StringInterner,
    spans: SpanCounter,
}

impl<'a> Syntax<'a> {
    pub fn new(interner: &'a StringInterner) -> Self {
        Syntax {
            interner,
            spans: SpanCounter::default(),
        }
    }

    pub fn name(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    /// Dotted identifier, split on `.`.
    pub fn id(&self, dotted: &str) -> QualifiedId {
        QualifiedId::new(
            dotted.split('.').map(|seg| self.interner.intern(seg.trim())),
            self.spans.next(),
        )
    }

    /// A single type reference.
    pub fn term(&self, dotted: &str) -> TypeTerm {
        TypeTerm::Id(self.id(dotted))
    }

    /// A `+`-separated union of type references: `"V + {NIL}"` is not
    /// supported here; use [`Syntax::enumeration`] for enum members.
    pub fn terms(&self, union: &str) -> Vec<TypeTerm> {
        union
            .split('+')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| self.term(s))
            .collect()
    }

    pub fn enumeration(&self, elements: Vec<EnumElement>) -> TypeTerm {
        TypeTerm::Enum(elements, self.spans.next())
    }

    pub fn constant(&self, dotted: &str) -> EnumElement {
        EnumElement::Constant(self.id(dotted))
    }

    pub fn int(&self, value: i64) -> EnumElement {
        EnumElement::Literal(Literal::Integer(value), self.spans.next())
    }

    pub fn string(&self, value: &str) -> EnumElement {
        EnumElement::Literal(Literal::String(self.interner.intern(value)), self.spans.next())
    }

    pub fn range(&self, low: i64, high: i64) -> EnumElement {
        EnumElement::Range {
            low,
            high,
            span: self.spans.next(),
        }
    }

    /// Labeled, relational field over a `+`-separated union of references.
    pub fn field(&self, label: &str, union: &str) -> Field {
        self.field_with(Some(label), self.terms(union), false)
    }

    /// Labeled `any` field.
    pub fn any_field(&self, label: &str, union: &str) -> Field {
        self.field_with(Some(label), self.terms(union), true)
    }

    /// Unlabeled field.
    pub fn unlabeled(&self, union: &str) -> Field {
        self.field_with(None, self.terms(union), false)
    }

    pub fn field_with(&self, label: Option<&str>, ty: Vec<TypeTerm>, any: bool) -> Field {
        Field {
            label: label.map(|l| self.interner.intern(l)),
            ty,
            any,
            span: self.spans.next(),
        }
    }
}

/// Owns a [`Module`] under construction.
pub struct ModuleBuilder<'a> {
    interner: &'a StringInterner,
    spans: SpanCounter,
    module: Module,
}

impl<'a> ModuleBuilder<'a> {
    pub fn new(interner: &'a StringInterner, kind: ModuleKind, name: &str) -> Self {
        let name = interner.intern(name);
        let file = interner.intern(&format!("{}.4ml", interner.lookup(name)));
        ModuleBuilder {
            interner,
            // Offset so module and term spans rarely coincide.
            spans: SpanCounter(Cell::new(10_000)),
            module: Module::new(kind, name, file),
        }
    }

    pub fn domain(interner: &'a StringInterner, name: &str) -> Self {
        Self::new(interner, ModuleKind::Domain, name)
    }

    pub fn model(interner: &'a StringInterner, name: &str) -> Self {
        Self::new(interner, ModuleKind::Model, name)
    }

    pub fn transform(interner: &'a StringInterner, name: &str) -> Self {
        Self::new(interner, ModuleKind::Transform, name)
    }

    #[must_use]
    pub fn file(mut self, path: &str) -> Self {
        self.module.file = self.interner.intern(path);
        self
    }

    fn module_ref(&self, rename: Option<&str>, module: &str, kind: CompositionKind) -> ModuleRef {
        ModuleRef {
            rename: rename.map(|r| self.interner.intern(r)),
            module: self.interner.intern(module),
            kind,
            span: self.spans.next(),
        }
    }

    #[must_use]
    pub fn includes(mut self, rename: Option<&str>, module: &str) -> Self {
        let r = self.module_ref(rename, module, CompositionKind::Includes);
        self.module.compositions.push(r);
        self
    }

    #[must_use]
    pub fn extends(mut self, rename: Option<&str>, module: &str) -> Self {
        let r = self.module_ref(rename, module, CompositionKind::Extends);
        self.module.compositions.push(r);
        self
    }

    #[must_use]
    pub fn of(mut self, module: &str) -> Self {
        let r = self.module_ref(None, module, CompositionKind::Of);
        self.module.compositions.push(r);
        self
    }

    #[must_use]
    pub fn input(mut self, rename: &str, module: &str) -> Self {
        let r = self.module_ref(Some(rename), module, CompositionKind::Input);
        self.module.params.push(Param::Model(r));
        self
    }

    #[must_use]
    pub fn output(mut self, rename: &str, module: &str) -> Self {
        let r = self.module_ref(Some(rename), module, CompositionKind::Output);
        self.module.outputs.push(r);
        self
    }

    #[must_use]
    pub fn value_param(mut self, name: &str, ty: Vec<TypeTerm>) -> Self {
        let param = Param::Value {
            name: self.interner.intern(name),
            ty,
            span: self.spans.next(),
        };
        self.module.params.push(param);
        self
    }

    fn push_type(&mut self, name: &str, kind: TypeDeclKind) {
        let decl = TypeDecl {
            name: self.interner.intern(name),
            span: self.spans.next(),
            kind,
        };
        self.module.types.push(decl);
    }

    #[must_use]
    pub fn union(mut self, name: &str, members: Vec<TypeTerm>) -> Self {
        self.push_type(name, TypeDeclKind::Union(members));
        self
    }

    #[must_use]
    pub fn constructor(mut self, name: &str, kind: ConstructorKind, fields: Vec<Field>) -> Self {
        self.push_type(name, TypeDeclKind::Constructor { kind, fields });
        self
    }

    #[must_use]
    pub fn map(
        mut self,
        name: &str,
        kind: MapKind,
        partial: bool,
        domain: Vec<Field>,
        codomain: Vec<Field>,
    ) -> Self {
        self.push_type(
            name,
            TypeDeclKind::Map {
                kind,
                partial,
                domain,
                codomain,
            },
        );
        self
    }

    #[must_use]
    pub fn constant(mut self, name: &str, kind: ConstantDeclKind) -> Self {
        let decl = ConstantDecl {
            name: self.interner.intern(name),
            kind,
            span: self.spans.next(),
        };
        self.module.constants.push(decl);
        self
    }

    #[must_use]
    pub fn cardinality(mut self, kind: ContractKind, card: CardinalityKind, sort: &str) -> Self {
        let span = self.spans.next();
        let sort = QualifiedId::new(sort.split('.').map(|s| self.interner.intern(s)), span);
        self.module.contracts.push(ContractDecl {
            kind,
            item: ContractItem::Cardinality { kind: card, sort },
            span,
        });
        self
    }

    #[must_use]
    pub fn holds(mut self, kind: ContractKind, constants: &[&str]) -> Self {
        let span = self.spans.next();
        let ids = constants
            .iter()
            .map(|c| QualifiedId::new(c.split('.').map(|s| self.interner.intern(s)), span))
            .collect();
        self.module.contracts.push(ContractDecl {
            kind,
            item: ContractItem::Holds(ids),
            span,
        });
        self
    }

    pub fn build(self) -> Module {
        self.module
    }
}
