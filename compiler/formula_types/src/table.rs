//! The symbol table: arenas of namespaces and symbols for one module.
//!
//! # Lifecycle
//!
//! A table is created per module and only grows: namespaces and symbols are
//! added, rules appended, diagnostics collected. Once the pipeline finishes,
//! validity is resolved and the table is frozen. Other modules may import it
//! only when it is valid.
//!
//! # Ids
//!
//! [`SymbolTable::register_symbol`] is the only place symbol ids are handed
//! out, so ids follow registration order.

use std::collections::{BTreeMap, BTreeSet};

use formula_ir::{Literal, Location, ModuleKind, Name, SharedInterner};
use parking_lot::Mutex;

use crate::canonical::CanonicalForm;
use crate::coerce::CoercionCache;
use crate::error::{CheckError, CheckErrorKind, InternalError};
use crate::ids::{NamespaceId, SymbolId, TableId};
use crate::lifted::Lifted;
use crate::namespace::Namespace;
use crate::rules::IntroducedRule;
use crate::size::SizeExpr;
use crate::symbol::{
    BaseConstant, BaseOp, BaseSort, ConstantKind, Symbol, SymbolKind, SymbolOrigin,
};

/// Arena-backed symbol table for one module.
pub struct SymbolTable {
    id: TableId,
    module: Name,
    kind: ModuleKind,
    file: Name,
    interner: SharedInterner,
    namespaces: Vec<Namespace>,
    symbols: Vec<Symbol>,
    validity: Lifted,
    errors: Vec<CheckError>,
    rules: Vec<IntroducedRule>,
    /// Literal constants of this module and everything it imports.
    literals: BTreeSet<Literal>,
    /// Short module name to table, for this module and all transitive imports.
    dependencies: BTreeMap<Name, TableId>,
    pub(crate) coercions: Mutex<CoercionCache>,
    sub_constraint: SymbolId,
}

impl SymbolTable {
    /// Empty table with the built-in sorts, operators and constants
    /// registered in the root.
    pub fn new(interner: SharedInterner, module: Name, kind: ModuleKind, file: Name) -> Self {
        let id = TableId::fresh();
        let mut dependencies = BTreeMap::new();
        dependencies.insert(module, id);
        let mut table = SymbolTable {
            id,
            module,
            kind,
            file,
            interner,
            namespaces: vec![Namespace::new(Name::EMPTY, None, 0)],
            symbols: Vec::new(),
            validity: Lifted::Pending,
            errors: Vec::new(),
            rules: Vec::new(),
            literals: BTreeSet::new(),
            dependencies,
            coercions: Mutex::new(CoercionCache::default()),
            sub_constraint: SymbolId::from_index(0),
        };
        table.register_builtins();
        table
    }

    fn register_builtins(&mut self) {
        let root = NamespaceId::ROOT;
        for base in BaseSort::ALL {
            let name = self.interner.intern(base.name());
            self.register_builtin(name, 0, SymbolKind::BaseSort(base));
        }
        for op in BaseOp::ALL {
            let name = self.interner.intern(op.name());
            let id = self.register_builtin(name, op.arity(), SymbolKind::BaseOperator(op));
            if op == BaseOp::SubConstraint {
                self.sub_constraint = id;
            }
        }
        for constant in [BaseConstant::True, BaseConstant::False] {
            let name = self.interner.intern(constant.name());
            self.register_builtin(name, 0, SymbolKind::BaseConstant(constant));
        }
        debug_assert!(self.namespaces[root.index()].symbols().len() == self.symbols.len());
    }

    fn register_builtin(&mut self, name: Name, arity: u32, kind: SymbolKind) -> SymbolId {
        // Built-in names are distinct, so this never clashes.
        match self.register_symbol(NamespaceId::ROOT, name, arity, Location::GENERATED, kind) {
            Ok(id) | Err(id) => id,
        }
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn module_name(&self) -> Name {
        self.module
    }

    pub fn module_kind(&self) -> ModuleKind {
        self.kind
    }

    pub fn file(&self) -> Name {
        self.file
    }

    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    // Namespaces

    pub fn root(&self) -> NamespaceId {
        NamespaceId::ROOT
    }

    pub fn namespace(&self, id: NamespaceId) -> &Namespace {
        &self.namespaces[id.index()]
    }

    pub fn namespace_count(&self) -> usize {
        self.namespaces.len()
    }

    pub fn namespace_ids(&self) -> impl Iterator<Item = NamespaceId> {
        (0..self.namespaces.len()).map(NamespaceId::from_index)
    }

    /// Get the child `name` of `parent`, creating it if absent.
    pub fn child_namespace(&mut self, parent: NamespaceId, name: Name) -> NamespaceId {
        if let Some(existing) = self.namespace(parent).child(name) {
            return existing;
        }
        let id = NamespaceId::from_index(self.namespaces.len());
        let depth = self.namespace(parent).depth + 1;
        self.namespaces.push(Namespace::new(name, Some(parent), depth));
        self.namespaces[parent.index()].add_child(name, id);
        id
    }

    /// Names from the root down to `ns`, excluding the root.
    pub fn namespace_path(&self, ns: NamespaceId) -> Vec<Name> {
        let mut path = Vec::new();
        let mut cur = Some(ns);
        while let Some(id) = cur {
            let node = self.namespace(id);
            if node.parent.is_some() {
                path.push(node.name);
            }
            cur = node.parent;
        }
        path.reverse();
        path
    }

    /// Whether `ns` is `ancestor` or lies below it.
    pub fn is_within(&self, ns: NamespaceId, ancestor: NamespaceId) -> bool {
        let mut cur = Some(ns);
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.namespace(id).parent;
        }
        false
    }

    /// Names of every namespace except the root.
    pub fn namespace_names(&self) -> impl Iterator<Item = Name> + '_ {
        self.namespaces.iter().skip(1).map(|ns| ns.name)
    }

    // Symbols

    /// Register a symbol; the only source of symbol ids.
    ///
    /// Named symbols are added to `namespace`; on a name clash nothing is
    /// registered and the existing symbol is returned as the error. Pass
    /// `Name::EMPTY` for companion sorts, which live only in the arena.
    pub fn register_symbol(
        &mut self,
        namespace: NamespaceId,
        name: Name,
        arity: u32,
        location: Location,
        kind: SymbolKind,
    ) -> Result<SymbolId, SymbolId> {
        let id = SymbolId::from_index(self.symbols.len());
        if !name.is_empty() {
            self.namespaces[namespace.index()].add_symbol(name, id)?;
        }
        self.symbols.push(Symbol {
            id,
            name,
            namespace,
            arity,
            location,
            kind,
            canonical: None,
            origin: None,
            failed: false,
        });
        tracing::trace!(id = id.raw(), name = self.interner.lookup(name), "registered symbol");
        Ok(id)
    }

    /// Register a constructor or map with its companion sort and its `#Name`
    /// type constant, in that order. `make` receives the ids the companions
    /// will get.
    pub(crate) fn register_data(
        &mut self,
        namespace: NamespaceId,
        name: Name,
        arity: u32,
        location: Location,
        make: impl FnOnce(SymbolId, SymbolId) -> SymbolKind,
    ) -> Result<SymbolId, SymbolId> {
        let next = self.symbols.len();
        let sort = SymbolId::from_index(next + 1);
        let type_constant = SymbolId::from_index(next + 2);
        let data = self.register_symbol(namespace, name, arity, location, make(sort, type_constant))?;
        let kind = SymbolKind::UserSort { data, size: None };
        let registered_sort = self.register_symbol(namespace, Name::EMPTY, 0, location, kind);
        let hashed = self.interner.intern(&format!("#{}", self.interner.lookup(name)));
        let kind = SymbolKind::UserConstant(ConstantKind::Type { sort });
        // `#` never starts a declared name, so this cannot clash.
        let registered_constant = match self.register_symbol(namespace, hashed, 0, location, kind) {
            Ok(id) | Err(id) => id,
        };
        debug_assert_eq!(registered_sort, Ok(sort));
        debug_assert_eq!(registered_constant, type_constant);
        Ok(data)
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn get_symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.index())
    }

    /// All symbols in registration order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub(crate) fn set_origin(&mut self, id: SymbolId, origin: SymbolOrigin) {
        self.symbols[id.index()].origin = Some(origin);
    }

    pub(crate) fn mark_failed(&mut self, id: SymbolId) {
        self.symbols[id.index()].failed = true;
    }

    /// Write a canonical form. A second write is an internal fault.
    pub(crate) fn set_canonical(
        &mut self,
        id: SymbolId,
        form: CanonicalForm,
    ) -> Result<(), InternalError> {
        let symbol = &mut self.symbols[id.index()];
        if symbol.canonical.is_some() {
            return Err(InternalError::CanonicalRewrite { symbol: id.raw() });
        }
        symbol.canonical = Some(form);
        Ok(())
    }

    /// Write the size of a user sort. A second write is an internal fault.
    pub(crate) fn set_sort_size(&mut self, id: SymbolId, expr: SizeExpr) -> Result<(), InternalError> {
        match &mut self.symbols[id.index()].kind {
            SymbolKind::UserSort { size: size @ None, .. } => {
                *size = Some(expr);
                Ok(())
            }
            _ => Err(InternalError::SizeRewrite { symbol: id.raw() }),
        }
    }

    /// Dotted name of a symbol; companion sorts print as their data symbol.
    pub fn qualified_name(&self, id: SymbolId) -> String {
        let symbol = self.symbol(id);
        let name = match &symbol.kind {
            SymbolKind::UserSort { data, .. } => self.symbol(*data).name,
            _ => symbol.name,
        };
        let mut path = self.namespace_path(symbol.namespace);
        path.push(name);
        self.interner.join(&path)
    }

    /// The `%sub` helper of this table.
    pub fn sub_constraint(&self) -> SymbolId {
        self.sub_constraint
    }

    /// Companion sort of a constructor or map, or the symbol itself if it
    /// already is a sort.
    pub fn sort_of(&self, id: SymbolId) -> Option<SymbolId> {
        match &self.symbol(id).kind {
            SymbolKind::UserSort { .. } => Some(id),
            kind => kind.data_sort(),
        }
    }

    /// Data symbol of a companion sort.
    pub fn data_of(&self, sort: SymbolId) -> Option<SymbolId> {
        match &self.symbol(sort).kind {
            SymbolKind::UserSort { data, .. } => Some(*data),
            _ => None,
        }
    }

    // Diagnostics and validity

    /// Record a problem. Errors invalidate the table; warnings do not.
    pub fn report(&mut self, location: Location, kind: CheckErrorKind) {
        let error = CheckError::new(location, kind);
        tracing::debug!(code = %error.code(), "{}", error.kind);
        if !error.is_warning() {
            self.validity.falsify();
        }
        self.errors.push(error);
    }

    /// Report `name` as already defined at `previous`.
    pub(crate) fn report_duplicate(&mut self, location: Location, name: Name, previous: SymbolId) {
        let previous = self.symbol(previous).location;
        let name = self.interner.lookup(name).to_owned();
        self.report(location, CheckErrorKind::DuplicateDefinition { name, previous });
    }

    pub fn errors(&self) -> &[CheckError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(|e| !e.is_warning())
    }

    pub fn validity(&self) -> Lifted {
        self.validity
    }

    pub fn is_valid(&self) -> bool {
        self.validity == Lifted::True
    }

    pub(crate) fn invalidate(&mut self) {
        self.validity.falsify();
    }

    /// Freeze validity: still-pending tables become valid.
    pub(crate) fn resolve_validity(&mut self) -> Result<(), InternalError> {
        if self.validity.is_pending() {
            self.validity.resolve(true)?;
        }
        Ok(())
    }

    // Rules, literals, dependencies

    pub fn rules(&self) -> &[IntroducedRule] {
        &self.rules
    }

    pub(crate) fn push_rule(&mut self, rule: IntroducedRule) {
        self.rules.push(rule);
    }

    pub fn literals(&self) -> &BTreeSet<Literal> {
        &self.literals
    }

    pub(crate) fn add_literal(&mut self, literal: Literal) {
        self.literals.insert(literal);
    }

    pub fn dependencies(&self) -> &BTreeMap<Name, TableId> {
        &self.dependencies
    }

    pub(crate) fn dependencies_mut(&mut self) -> &mut BTreeMap<Name, TableId> {
        &mut self.dependencies
    }
}

impl std::fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolTable")
            .field("id", &self.id)
            .field("module", &self.interner.lookup(self.module))
            .field("symbols", &self.symbols.len())
            .field("namespaces", &self.namespaces.len())
            .field("validity", &self.validity)
            .finish_non_exhaustive()
    }
}
