//! Canonical forms for a module's declarations.
//!
//! Runs in three stages over one module, after imports:
//!
//! 1. **collect** registers every declaration: type declarations with their
//!    companion sorts and `#Name` constants, derived and symbolic constants,
//!    transform value parameters, enumeration-declared constants, and the
//!    root convenience unions `Any`, `Data` and `Constant`.
//! 2. **resolve** resolves every type term and enumeration element.
//! 3. **finalize** flattens unions and writes canonical forms, then checks
//!    newness, field labels and transform parameters.
//!
//! A declaration that fails to resolve, or names one that did, is marked
//! failed and gets no canonical form; later passes skip it.

use formula_ir::traverse::{declared_fields, select, Node, NodeKind};
use formula_ir::{
    ConstantDeclKind, ConstructorKind, EnumElement, Field, Literal, Location, Module, ModuleKind,
    Name, Param, QualifiedId, Span, TypeDeclKind, TypeTerm,
};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::cancel::Ticker;
use crate::canonical::{AcceptedValues, CanonicalForm};
use crate::error::{CheckAbort, CheckErrorKind};
use crate::ids::{NamespaceId, SymbolId};
use crate::resolve::{type_defining, Resolution, SymbolFilter};
use crate::symbol::{
    BaseSortSet, ConstantKind, ConstructorInfo, Convenience, MapFlags, MapInfo, SymbolKind,
};
use crate::table::SymbolTable;

/// Names no declaration, constant, parameter or renaming may take.
const RESERVED: &[&str] = &[
    "Natural",
    "PosInteger",
    "NegInteger",
    "Integer",
    "Real",
    "String",
    "Boolean",
    "TRUE",
    "FALSE",
    "Any",
    "Data",
    "Constant",
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

/// Whether `name` is a legal unqualified identifier.
pub(crate) fn is_legal_id(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !RESERVED.contains(&name)
}

/// Report `BadId` unless `name` is legal.
pub(crate) fn check_id(
    table: &mut SymbolTable,
    location: Location,
    name: Name,
    usage: &'static str,
) -> bool {
    let text = table.interner().lookup(name);
    if is_legal_id(text) {
        return true;
    }
    table.report(
        location,
        CheckErrorKind::BadId {
            id: text.to_owned(),
            usage,
        },
    );
    false
}

/// One position's members before union flattening.
#[derive(Clone, Debug)]
enum Member {
    Values(AcceptedValues),
    Union(SymbolId),
}

/// A position after resolution.
#[derive(Clone, Debug, Default)]
struct ResolvedPosition {
    members: Vec<Member>,
    /// Every symbol a term or enumeration element resolved to.
    refs: SmallVec<[SymbolId; 2]>,
}

/// A type declaration registered by this module.
struct Declared {
    /// Index into `Module::types`.
    decl: usize,
    symbol: SymbolId,
    positions: Vec<ResolvedPosition>,
}

pub(crate) struct Canonicalizer<'a, 'c> {
    table: &'a mut SymbolTable,
    module: &'a Module,
    ticker: &'a mut Ticker<'c>,
    declared: Vec<Declared>,
    /// `(index into Module::params, symbol, resolved type)`
    params: Vec<(usize, SymbolId, Option<ResolvedPosition>)>,
    conveniences: SmallVec<[(Convenience, SymbolId); 3]>,
}

impl<'a, 'c> Canonicalizer<'a, 'c> {
    pub(crate) fn new(
        table: &'a mut SymbolTable,
        module: &'a Module,
        ticker: &'a mut Ticker<'c>,
    ) -> Self {
        Canonicalizer {
            table,
            module,
            ticker,
            declared: Vec::new(),
            params: Vec::new(),
            conveniences: SmallVec::new(),
        }
    }

    fn location(&self, span: Span) -> Location {
        Location::new(self.module.file, span)
    }

    // Collect

    #[tracing::instrument(level = "debug", skip_all)]
    pub(crate) fn collect(&mut self) -> Result<(), CheckAbort> {
        let root = NamespaceId::ROOT;
        let at = self.location(self.module.span);
        for convenience in Convenience::ALL {
            let name = self.table.interner().intern(convenience.name());
            let kind = SymbolKind::Union {
                convenience: Some(convenience),
            };
            if let Ok(id) = self.table.register_symbol(root, name, 0, at, kind) {
                self.conveniences.push((convenience, id));
            }
        }

        let module = self.module;
        for (index, decl) in module.types.iter().enumerate() {
            self.ticker.tick()?;
            let location = self.location(decl.span);
            if !check_id(self.table, location, decl.name, "a type name") {
                continue;
            }
            let registered = match &decl.kind {
                TypeDeclKind::Union(_) => self.table.register_symbol(
                    root,
                    decl.name,
                    0,
                    location,
                    SymbolKind::Union { convenience: None },
                ),
                TypeDeclKind::Constructor { kind, fields } => {
                    let (labels, any) = field_shape(fields.iter());
                    let new = *kind == ConstructorKind::New;
                    self.table
                        .register_data(root, decl.name, arity(fields.len()), location, |sort, tc| {
                            SymbolKind::Constructor(ConstructorInfo {
                                new,
                                labels,
                                any,
                                sort,
                                type_constant: tc,
                            })
                        })
                }
                TypeDeclKind::Map {
                    kind,
                    partial,
                    domain,
                    codomain,
                } => {
                    let (labels, any) = field_shape(domain.iter().chain(codomain));
                    let (kind, partial) = (*kind, *partial);
                    let domain_arity = arity(domain.len());
                    let total = arity(domain.len() + codomain.len());
                    self.table
                        .register_data(root, decl.name, total, location, |sort, tc| {
                            SymbolKind::Map(MapInfo {
                                kind,
                                partial,
                                flags: MapFlags::from_kind(kind, partial),
                                domain_arity,
                                labels,
                                any,
                                sort,
                                type_constant: tc,
                            })
                        })
                }
            };
            match registered {
                Ok(symbol) => self.declared.push(Declared {
                    decl: index,
                    symbol,
                    positions: Vec::new(),
                }),
                Err(previous) => self.table.report_duplicate(location, decl.name, previous),
            }
        }

        for constant in &module.constants {
            self.ticker.tick()?;
            let location = self.location(constant.span);
            if !check_id(self.table, location, constant.name, "a constant") {
                continue;
            }
            let kind = match constant.kind {
                ConstantDeclKind::Derived => ConstantKind::Derived,
                ConstantDeclKind::Symbolic => ConstantKind::Symbolic,
            };
            let kind = SymbolKind::UserConstant(kind);
            if let Err(previous) = self.table.register_symbol(root, constant.name, 0, location, kind) {
                self.table.report_duplicate(location, constant.name, previous);
            }
        }

        if module.kind == ModuleKind::Transform {
            for (index, param) in module.params.iter().enumerate() {
                let Param::Value { name, span, .. } = param else {
                    continue;
                };
                let location = self.location(*span);
                if !check_id(self.table, location, *name, "a parameter") {
                    continue;
                }
                let kind = SymbolKind::UserConstant(ConstantKind::Variable);
                match self.table.register_symbol(root, *name, 0, location, kind) {
                    Ok(symbol) => self.params.push((index, symbol, None)),
                    Err(previous) => self.table.report_duplicate(location, *name, previous),
                }
            }
        }

        let elements = select(Node::Module(module), &[NodeKind::EnumElement], |n| match n {
            Node::EnumElement(e) => Some(e),
            _ => None,
        });
        for element in elements {
            self.ticker.tick()?;
            match element {
                EnumElement::Constant(id) => self.declare_enum_constant(id),
                EnumElement::Literal(literal, _) => self.table.add_literal(*literal),
                EnumElement::Range { low, high, .. } => {
                    self.table.add_literal(Literal::Integer(*low));
                    self.table.add_literal(Literal::Integer(*high));
                }
            }
        }

        self.write_conveniences()?;
        tracing::debug!(
            declared = self.declared.len(),
            symbols = self.table.symbol_count(),
            "collected declarations"
        );
        Ok(())
    }

    /// An unqualified enumeration identifier that does not resolve declares
    /// a constant in the root.
    fn declare_enum_constant(&mut self, id: &QualifiedId) {
        if id.is_qualified() || self.table.resolve_id(id, None) != Resolution::NotFound {
            return;
        }
        let location = self.location(id.span);
        if !check_id(self.table, location, id.last(), "an enumeration constant") {
            return;
        }
        let kind = SymbolKind::UserConstant(ConstantKind::Enum);
        // Not found means no clash in the root.
        let _ = self.table.register_symbol(NamespaceId::ROOT, id.last(), 0, location, kind);
    }

    /// Canonical forms of the root `Any`, `Data` and `Constant` unions.
    fn write_conveniences(&mut self) -> Result<(), CheckAbort> {
        let mut data = AcceptedValues::new();
        let mut constants = AcceptedValues::new();
        for symbol in self.table.symbols() {
            match &symbol.kind {
                SymbolKind::UserSort { .. } => data.add_sort(symbol.id),
                SymbolKind::UserConstant(
                    ConstantKind::Enum | ConstantKind::Symbolic | ConstantKind::Type { .. },
                ) => constants.add_constant(symbol.id),
                _ => {}
            }
        }
        let mut any = data.clone();
        any.union_with(&constants);
        any.add_base(BaseSortSet::all());

        for &(convenience, symbol) in &self.conveniences {
            let values = match convenience {
                Convenience::Any => any.clone(),
                Convenience::Data => data.clone(),
                Convenience::Constant => constants.clone(),
            };
            self.table
                .set_canonical(symbol, CanonicalForm::new(vec![values]))?;
        }
        Ok(())
    }

    // Resolve

    #[tracing::instrument(level = "debug", skip_all)]
    pub(crate) fn resolve(&mut self) -> Result<(), CheckAbort> {
        let module = self.module;
        let mut declared = std::mem::take(&mut self.declared);
        for entry in &mut declared {
            self.ticker.tick()?;
            let decl = &module.types[entry.decl];
            let owner = self.table.interner().lookup(decl.name);
            let terms: Vec<&[TypeTerm]> = match &decl.kind {
                TypeDeclKind::Union(terms) => vec![terms.as_slice()],
                TypeDeclKind::Constructor { fields, .. } => {
                    fields.iter().map(|f| f.ty.as_slice()).collect()
                }
                TypeDeclKind::Map {
                    domain, codomain, ..
                } => domain.iter().chain(codomain).map(|f| f.ty.as_slice()).collect(),
            };
            let mut failed = false;
            for position in terms {
                match self.resolve_terms(position, owner) {
                    Some(resolved) => entry.positions.push(resolved),
                    None => failed = true,
                }
            }
            if failed {
                self.fail(entry.symbol);
            }
        }
        self.declared = declared;

        let mut params = std::mem::take(&mut self.params);
        for (index, symbol, resolved) in &mut params {
            if let Some(Param::Value { name, ty, .. }) = module.params.get(*index) {
                let owner = self.table.interner().lookup(*name);
                *resolved = self.resolve_terms(ty, owner);
                if resolved.is_none() {
                    self.table.mark_failed(*symbol);
                }
            }
        }
        self.params = params;
        Ok(())
    }

    /// A declaration naming a failed symbol fails too, transitively, so
    /// later passes neither flatten it to nothing nor report it again.
    fn propagate_failures(&mut self) -> Result<(), CheckAbort> {
        loop {
            let mut failing: Vec<SymbolId> = Vec::new();
            for entry in &self.declared {
                self.ticker.tick()?;
                let table = &*self.table;
                if table.symbol(entry.symbol).failed {
                    continue;
                }
                if entry
                    .positions
                    .iter()
                    .flat_map(|p| &p.refs)
                    .any(|&r| table.symbol(r).failed)
                {
                    failing.push(entry.symbol);
                }
            }
            if failing.is_empty() {
                break;
            }
            tracing::trace!(count = failing.len(), "failing through references");
            for symbol in failing {
                self.fail(symbol);
            }
        }

        for (_, symbol, resolved) in &mut self.params {
            let reaches_failed = resolved
                .as_ref()
                .is_some_and(|p| p.refs.iter().any(|&r| self.table.symbol(r).failed));
            if reaches_failed {
                self.table.mark_failed(*symbol);
                *resolved = None;
            }
        }
        Ok(())
    }

    fn fail(&mut self, symbol: SymbolId) {
        self.table.mark_failed(symbol);
        if let Some(sort) = self.table.symbol(symbol).kind.data_sort() {
            self.table.mark_failed(sort);
        }
    }

    /// Resolve the terms of one position. All terms are tried so every
    /// problem is reported; `None` if any failed.
    fn resolve_terms(&mut self, terms: &[TypeTerm], owner: &str) -> Option<ResolvedPosition> {
        let mut out = ResolvedPosition::default();
        let mut ok = true;
        for term in terms {
            ok &= match term {
                TypeTerm::Id(id) => self.resolve_type_id(id, &mut out),
                TypeTerm::Enum(elements, _) => self.resolve_enum(elements, owner, &mut out),
            };
        }
        ok.then_some(out)
    }

    fn resolve_type_id(&mut self, id: &QualifiedId, out: &mut ResolvedPosition) -> bool {
        let filter: SymbolFilter<'_> = &type_defining;
        let Some(symbol) = self.resolved(id, Some(filter), "a type") else {
            return false;
        };
        out.refs.push(symbol);
        let member = match &self.table.symbol(symbol).kind {
            SymbolKind::BaseSort(base) => {
                let mut values = AcceptedValues::new();
                values.add_base(base.flag());
                Member::Values(values)
            }
            SymbolKind::Union { .. } => Member::Union(symbol),
            kind => {
                let mut values = AcceptedValues::new();
                if let Some(sort) = kind.data_sort() {
                    values.add_sort(sort);
                }
                Member::Values(values)
            }
        };
        out.members.push(member);
        true
    }

    fn resolve_enum(
        &mut self,
        elements: &[EnumElement],
        owner: &str,
        out: &mut ResolvedPosition,
    ) -> bool {
        let mut values = AcceptedValues::new();
        let mut ok = true;
        for element in elements {
            match element {
                EnumElement::Constant(id) => {
                    let Some(symbol) = self.resolved(id, None, "an enumeration constant") else {
                        ok = false;
                        continue;
                    };
                    let kind = &self.table.symbol(symbol).kind;
                    if matches!(kind, SymbolKind::UserConstant(_) | SymbolKind::BaseConstant(_)) {
                        values.add_constant(symbol);
                        out.refs.push(symbol);
                    } else {
                        let location = self.location(id.span);
                        let text = self.table.interner().join(&id.segments);
                        self.table.report(
                            location,
                            CheckErrorKind::BadId {
                                id: text,
                                usage: "an enumeration constant",
                            },
                        );
                        ok = false;
                    }
                }
                EnumElement::Literal(Literal::Integer(value), _) => values.add_integer(*value),
                EnumElement::Literal(Literal::String(value), _) => values.add_string(*value),
                EnumElement::Range { low, high, span } => {
                    if low > high {
                        let location = self.location(*span);
                        self.table.report(
                            location,
                            CheckErrorKind::BadTypeDecl {
                                name: owner.to_owned(),
                                reason: format!("has the empty range {low}..{high}"),
                            },
                        );
                        ok = false;
                    } else {
                        values.add_range(*low, *high);
                    }
                }
            }
        }
        out.members.push(Member::Values(values));
        ok
    }

    /// Resolve `id`, reporting undefined, ambiguous and wrongly-kinded names.
    fn resolved(
        &mut self,
        id: &QualifiedId,
        filter: Option<SymbolFilter<'_>>,
        usage: &'static str,
    ) -> Option<SymbolId> {
        let location = self.location(id.span);
        let name = self.table.interner().join(&id.segments);
        match self.table.resolve_id(id, filter) {
            Resolution::Found(symbol) => Some(symbol),
            Resolution::Ambiguous(a, b) => {
                let (first, second) = (self.table.symbol(a).location, self.table.symbol(b).location);
                self.table.report(
                    location,
                    CheckErrorKind::AmbiguousSymbol {
                        name,
                        first,
                        second,
                    },
                );
                None
            }
            Resolution::NotFound => {
                let exists = filter.is_some() && self.table.resolve_id(id, None).found().is_some();
                let kind = if exists {
                    CheckErrorKind::BadId { id: name, usage }
                } else {
                    CheckErrorKind::UndefinedSymbol { name }
                };
                self.table.report(location, kind);
                None
            }
        }
    }

    // Finalize

    #[tracing::instrument(level = "debug", skip_all)]
    pub(crate) fn finalize(&mut self) -> Result<(), CheckAbort> {
        self.propagate_failures()?;
        let unions: FxHashMap<SymbolId, Vec<Member>> = self
            .declared
            .iter()
            .filter(|d| {
                let symbol = self.table.symbol(d.symbol);
                !symbol.failed && matches!(symbol.kind, SymbolKind::Union { .. })
            })
            .map(|d| {
                let members = d.positions.iter().flat_map(|p| p.members.iter().cloned()).collect();
                (d.symbol, members)
            })
            .collect();

        for entry in &self.declared {
            self.ticker.tick()?;
            if self.table.symbol(entry.symbol).failed {
                continue;
            }
            let positions: Vec<AcceptedValues> = entry
                .positions
                .iter()
                .map(|p| flatten(self.table, &unions, &p.members))
                .collect();
            let form = CanonicalForm::new(positions);
            if let Some(sort) = self.table.symbol(entry.symbol).kind.data_sort() {
                self.table.set_canonical(sort, form.clone())?;
            }
            self.table.set_canonical(entry.symbol, form)?;
        }

        for (_, symbol, resolved) in &self.params {
            if let Some(position) = resolved {
                let values = flatten(self.table, &unions, &position.members);
                self.table
                    .set_canonical(*symbol, CanonicalForm::new(vec![values]))?;
            }
        }

        // Constants carry no positions.
        let constants: Vec<SymbolId> = self
            .table
            .symbols()
            .iter()
            .filter(|s| {
                s.canonical().is_none()
                    && !s.failed
                    && matches!(s.kind, SymbolKind::UserConstant(k) if k != ConstantKind::Variable)
            })
            .map(|s| s.id)
            .collect();
        for constant in constants {
            self.table.set_canonical(constant, CanonicalForm::default())?;
        }

        self.check_newness();
        self.check_labels();
        self.check_transform_params();
        Ok(())
    }

    /// `new` data may not take derived data or derived constants, whether
    /// named directly or reached through a union.
    fn check_newness(&mut self) {
        let mut found = Vec::new();
        for entry in &self.declared {
            let symbol = self.table.symbol(entry.symbol);
            if symbol.failed || !symbol.kind.is_new() {
                continue;
            }
            for position in &entry.positions {
                for &referenced in &position.refs {
                    if let Some(arg) = self.derived_ref(referenced) {
                        found.push((entry.symbol, arg, None));
                    } else if let SymbolKind::Union { .. } = self.table.symbol(referenced).kind {
                        let union = self.table.symbol(referenced);
                        let Some(values) = union.canonical().and_then(|f| f.get(0)) else {
                            continue;
                        };
                        let members: Vec<SymbolId> = values
                            .sorts()
                            .iter()
                            .copied()
                            .chain(values.constant_symbols())
                            .collect();
                        for member in members {
                            if let Some(arg) = self.derived_ref(member) {
                                found.push((entry.symbol, arg, Some(referenced)));
                            }
                        }
                    }
                }
            }
        }

        for (symbol, arg, via) in found {
            let location = self.table.symbol(symbol).location;
            let name = self.table.qualified_name(symbol);
            let arg = self.table.qualified_name(arg);
            let kind = match via {
                None => CheckErrorKind::ArgNewnessError { symbol: name, arg },
                Some(via) => CheckErrorKind::SubArgNewnessError {
                    symbol: name,
                    arg,
                    via: self.table.qualified_name(via),
                },
            };
            self.table.report(location, kind);
        }
    }

    /// The symbol itself if it is derived data or a derived constant.
    fn derived_ref(&self, symbol: SymbolId) -> Option<SymbolId> {
        let data = self.table.data_of(symbol).unwrap_or(symbol);
        match &self.table.symbol(data).kind {
            SymbolKind::Constructor(info) if !info.new => Some(data),
            SymbolKind::UserConstant(ConstantKind::Derived) => Some(data),
            _ => None,
        }
    }

    /// Field labels may not shadow namespace names.
    fn check_labels(&mut self) {
        let namespaces: FxHashSet<Name> = self.table.namespace_names().collect();
        if namespaces.is_empty() {
            return;
        }
        let clashes: Vec<(Location, Name)> = declared_fields(self.module)
            .into_iter()
            .filter_map(|(_, field)| {
                let label = field.label.filter(|l| namespaces.contains(l))?;
                Some((self.location(field.span), label))
            })
            .collect();
        for (location, label) in clashes {
            let label = self.table.interner().lookup(label).to_owned();
            self.table.report(location, CheckErrorKind::LabelClashError { label });
        }
    }

    /// Transform value parameters may not accept `new` data of an output.
    fn check_transform_params(&mut self) {
        if self.module.kind != ModuleKind::Transform {
            return;
        }
        let outputs: Vec<NamespaceId> = self
            .module
            .outputs
            .iter()
            .filter_map(|r| r.rename)
            .filter_map(|r| self.table.namespace(NamespaceId::ROOT).child(r))
            .collect();
        let mut found = Vec::new();
        for &(_, param, _) in &self.params {
            let Some(values) = self.table.symbol(param).canonical().and_then(|f| f.get(0)) else {
                continue;
            };
            for &sort in values.sorts() {
                let Some(data) = self.table.data_of(sort) else {
                    continue;
                };
                let symbol = self.table.symbol(data);
                let in_output = outputs
                    .iter()
                    .any(|&ns| self.table.is_within(symbol.namespace, ns));
                if symbol.kind.is_new() && in_output {
                    found.push((param, data));
                }
            }
        }
        for (param, data) in found {
            let location = self.table.symbol(param).location;
            let param = self.table.qualified_name(param);
            let sort = self.table.qualified_name(data);
            self.table.report(location, CheckErrorKind::TransNewnessError { param, sort });
        }
    }
}

/// Flatten members, expanding unions transitively. Cycles between unions
/// are cut by the visited set; unions with a canonical form (imported or
/// convenience unions) contribute it directly.
fn flatten(
    table: &SymbolTable,
    unions: &FxHashMap<SymbolId, Vec<Member>>,
    members: &[Member],
) -> AcceptedValues {
    let mut out = AcceptedValues::new();
    let mut seen = FxHashSet::default();
    let mut stack: Vec<&Member> = members.iter().rev().collect();
    while let Some(member) = stack.pop() {
        match member {
            Member::Values(values) => out.union_with(values),
            Member::Union(union) => {
                if !seen.insert(*union) {
                    continue;
                }
                if let Some(own) = unions.get(union) {
                    stack.extend(own.iter().rev());
                } else if let Some(values) = table.symbol(*union).canonical().and_then(|f| f.get(0)) {
                    out.union_with(values);
                }
            }
        }
    }
    out
}

fn field_shape<'f>(
    fields: impl Iterator<Item = &'f Field>,
) -> (SmallVec<[Option<Name>; 4]>, SmallVec<[bool; 4]>) {
    fields.map(|f| (f.label, f.any)).unzip()
}

fn arity(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
