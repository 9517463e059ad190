//! Predicate-sequence traversal over module syntax trees.
//!
//! [`select`] walks a tree and hands every node that ends a matching
//! descendant chain to a visitor, returning whatever the visitor produced.
//! A pattern `[TypeDecl, Field]` matches every `Field` that has a `TypeDecl`
//! ancestor; `[Field, QualifiedId]` matches identifiers inside field types.
//!
//! ```text
//! let labels = select(Node::Module(&module), &[NodeKind::TypeDecl, NodeKind::Field], |n| {
//!     match n {
//!         Node::Field(f) => f.label,
//!         _ => None,
//!     }
//! });
//! ```
//!
//! The walk is iterative, so deeply nested trees cannot overflow the stack.

use crate::ast::{
    ConstantDecl, ContractDecl, ContractItem, EnumElement, Field, Module, ModuleRef, Param,
    QualifiedId, TypeDecl, TypeDeclKind, TypeTerm,
};

/// Uniform view of a syntax tree node.
#[derive(Copy, Clone, Debug)]
pub enum Node<'a> {
    Module(&'a Module),
    ModuleRef(&'a ModuleRef),
    Param(&'a Param),
    TypeDecl(&'a TypeDecl),
    Field(&'a Field),
    TypeTerm(&'a TypeTerm),
    EnumElement(&'a EnumElement),
    QualifiedId(&'a QualifiedId),
    ConstantDecl(&'a ConstantDecl),
    ContractDecl(&'a ContractDecl),
}

/// Discriminant of [`Node`], for kind-only patterns.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Module,
    ModuleRef,
    Param,
    TypeDecl,
    Field,
    TypeTerm,
    EnumElement,
    QualifiedId,
    ConstantDecl,
    ContractDecl,
}

impl<'a> Node<'a> {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Module(_) => NodeKind::Module,
            Node::ModuleRef(_) => NodeKind::ModuleRef,
            Node::Param(_) => NodeKind::Param,
            Node::TypeDecl(_) => NodeKind::TypeDecl,
            Node::Field(_) => NodeKind::Field,
            Node::TypeTerm(_) => NodeKind::TypeTerm,
            Node::EnumElement(_) => NodeKind::EnumElement,
            Node::QualifiedId(_) => NodeKind::QualifiedId,
            Node::ConstantDecl(_) => NodeKind::ConstantDecl,
            Node::ContractDecl(_) => NodeKind::ContractDecl,
        }
    }

    /// Direct children, in source order.
    pub fn children(&self) -> Vec<Node<'a>> {
        match *self {
            Node::Module(m) => {
                let mut out = Vec::with_capacity(
                    m.compositions.len()
                        + m.params.len()
                        + m.outputs.len()
                        + m.types.len()
                        + m.constants.len()
                        + m.contracts.len(),
                );
                out.extend(m.compositions.iter().map(Node::ModuleRef));
                out.extend(m.params.iter().map(Node::Param));
                out.extend(m.outputs.iter().map(Node::ModuleRef));
                out.extend(m.types.iter().map(Node::TypeDecl));
                out.extend(m.constants.iter().map(Node::ConstantDecl));
                out.extend(m.contracts.iter().map(Node::ContractDecl));
                out
            }
            Node::Param(Param::Value { ty, .. }) => ty.iter().map(Node::TypeTerm).collect(),
            Node::Param(Param::Model(r)) => vec![Node::ModuleRef(r)],
            Node::TypeDecl(decl) => match &decl.kind {
                TypeDeclKind::Union(terms) => terms.iter().map(Node::TypeTerm).collect(),
                TypeDeclKind::Constructor { fields, .. } => fields.iter().map(Node::Field).collect(),
                TypeDeclKind::Map {
                    domain, codomain, ..
                } => domain.iter().chain(codomain).map(Node::Field).collect(),
            },
            Node::Field(f) => f.ty.iter().map(Node::TypeTerm).collect(),
            Node::TypeTerm(TypeTerm::Id(id)) => vec![Node::QualifiedId(id)],
            Node::TypeTerm(TypeTerm::Enum(elements, _)) => {
                elements.iter().map(Node::EnumElement).collect()
            }
            Node::EnumElement(EnumElement::Constant(id)) => vec![Node::QualifiedId(id)],
            Node::ContractDecl(c) => match &c.item {
                ContractItem::Cardinality { sort, .. } => vec![Node::QualifiedId(sort)],
                ContractItem::Holds(ids) => ids.iter().map(Node::QualifiedId).collect(),
            },
            Node::ModuleRef(_)
            | Node::EnumElement(_)
            | Node::QualifiedId(_)
            | Node::ConstantDecl(_) => Vec::new(),
        }
    }
}

/// Select nodes ending a descendant chain of `kinds`.
pub fn select<'a, R>(
    root: Node<'a>,
    kinds: &[NodeKind],
    visit: impl FnMut(Node<'a>) -> Option<R>,
) -> Vec<R> {
    walk(root, kinds.len(), |i, n| n.kind() == kinds[i], visit)
}

/// Ancestors are matched greedily, which finds the longest matched prefix
/// for every node, so each node is visited at most once.
fn walk<'a, R>(
    root: Node<'a>,
    len: usize,
    matches: impl Fn(usize, Node<'a>) -> bool,
    mut visit: impl FnMut(Node<'a>) -> Option<R>,
) -> Vec<R> {
    let Some(last) = len.checked_sub(1) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    // (node, number of predicates matched by strict ancestors)
    let mut stack = vec![(root, 0usize)];
    while let Some((node, matched)) = stack.pop() {
        let hit = matches(matched, node);
        if hit && matched == last {
            if let Some(r) = visit(node) {
                out.push(r);
            }
        }
        let next = if hit && matched < last {
            matched + 1
        } else {
            matched
        };
        stack.extend(node.children().into_iter().rev().map(|c| (c, next)));
    }
    out
}

/// Every qualified identifier below `root`, in source order.
pub fn qualified_ids(root: Node<'_>) -> Vec<&QualifiedId> {
    select(root, &[NodeKind::QualifiedId], |n| match n {
        Node::QualifiedId(id) => Some(id),
        _ => None,
    })
}

/// Fields of every type declaration in `module`, paired with their owner.
pub fn declared_fields(module: &Module) -> Vec<(&TypeDecl, &Field)> {
    module
        .types
        .iter()
        .flat_map(|decl| {
            select(Node::TypeDecl(decl), &[NodeKind::Field], move |n| match n {
                Node::Field(f) => Some((decl, f)),
                _ => None,
            })
        })
        .collect()
}
