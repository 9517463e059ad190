//! Formula IR - names, locations and module syntax trees
//!
//! This crate holds the data the symbol-resolution core consumes:
//! - `Name` for interned identifiers and the shared `StringInterner`
//! - `Span` and `Location` for source positions across files
//! - The module syntax tree (`ast`) produced by the parser
//! - `builder` for constructing trees without a parser
//! - `traverse` for predicate-sequence selection over trees
//!
//! Every syntax type is `Clone + Eq + Hash + Debug` so trees can be compared
//! in tests and used as cache keys by drivers.

/// Compile-time assertion that a type has a specific size.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

pub mod ast;
pub mod builder;
mod interner;
mod name;
mod span;
pub mod traverse;

pub use ast::{
    CardinalityKind, CompositionKind, ConstantDecl, ConstantDeclKind, ConstructorKind,
    ContractDecl, ContractItem, ContractKind, EnumElement, Field, Literal, MapKind, Module,
    ModuleKind, ModuleRef, Param, QualifiedId, TypeDecl, TypeDeclKind, TypeTerm,
};
pub use builder::{ModuleBuilder, Syntax};
pub use interner::{InternError, SharedInterner, StringInterner};
pub use name::Name;
pub use span::{Location, Span};
pub use traverse::{Node, NodeKind};

static_assert_size!(Name, 4);
static_assert_size!(Span, 8);
static_assert_size!(Location, 12);
