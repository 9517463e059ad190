use formula_diagnostic::ErrorCode;
use formula_ir::{ConstructorKind, Field, MapKind, ModuleBuilder, Syntax};
use pretty_assertions::assert_eq;

use super::*;
use crate::test_helpers::{codes, sort, Workspace};

fn size_of(table: &SymbolTable, name: &str) -> Option<SizeExpr> {
    table.symbol(sort(table, name)).size().cloned()
}

fn range(s: &Syntax<'_>, label: &str, low: i64, high: i64) -> Field {
    s.field_with(Some(label), vec![s.enumeration(vec![s.range(low, high)])], false)
}

fn letters(s: &Syntax<'_>, label: &str, names: &[&str]) -> Field {
    let elements = names.iter().map(|n| s.constant(n)).collect();
    s.field_with(Some(label), vec![s.enumeration(elements)], false)
}

#[test]
fn constructor_size_is_the_product_of_positions() {
    let ws = Workspace::new();
    let s = ws.syntax();
    let module = ModuleBuilder::domain(&ws.interner, "D")
        .constructor(
            "P",
            ConstructorKind::New,
            vec![range(&s, "a", 1, 3), letters(&s, "b", &["A", "B"])],
        )
        .constructor("Flag", ConstructorKind::New, vec![s.field("on", "Boolean")])
        .build();
    let out = ws.check(&module);
    assert!(out.is_valid(), "{:?}", out.diagnostics);
    assert_eq!(size_of(&out.table, "P"), Some(SizeExpr::Count(6)));
    assert_eq!(size_of(&out.table, "Flag"), Some(SizeExpr::Count(2)));
}

#[test]
fn nested_finite_sorts_multiply() {
    let ws = Workspace::new();
    let s = ws.syntax();
    let module = ModuleBuilder::domain(&ws.interner, "D")
        .constructor("V", ConstructorKind::New, vec![range(&s, "x", 1, 2)])
        .constructor(
            "E",
            ConstructorKind::New,
            vec![s.field("src", "V"), s.field("dst", "V")],
        )
        .build();
    let out = ws.check(&module);
    assert_eq!(size_of(&out.table, "V"), Some(SizeExpr::Count(2)));
    assert_eq!(size_of(&out.table, "E"), Some(SizeExpr::Count(4)));
}

#[test]
fn recursive_sorts_are_infinite() {
    let ws = Workspace::new();
    let s = ws.syntax();
    let mut tail = s.terms("List");
    tail.push(s.enumeration(vec![s.constant("NIL")]));
    let module = ModuleBuilder::domain(&ws.interner, "D")
        .constructor(
            "List",
            ConstructorKind::New,
            vec![range(&s, "hd", 0, 1), s.field_with(Some("tl"), tail, false)],
        )
        .build();
    let out = ws.check(&module);
    assert!(out.is_valid(), "{:?}", out.diagnostics);
    assert_eq!(size_of(&out.table, "List"), Some(SizeExpr::Infinity));
}

#[test]
fn infinite_sorts_count_facts_at_relational_positions() {
    let ws = Workspace::new();
    let s = ws.syntax();
    let module = ModuleBuilder::domain(&ws.interner, "D")
        .constructor("V", ConstructorKind::New, vec![s.field("lbl", "Integer")])
        .constructor(
            "E",
            ConstructorKind::New,
            vec![s.field("src", "V"), range(&s, "w", 1, 2)],
        )
        .constructor("Loose", ConstructorKind::New, vec![s.any_field("v", "V")])
        .build();
    let out = ws.check(&module);
    let t = &out.table;
    let v = sort(t, "V");
    assert_eq!(size_of(t, "V"), Some(SizeExpr::Infinity));

    let e = size_of(t, "E").unwrap_or(SizeExpr::Infinity);
    assert!(!e.is_infinite());
    assert_eq!(e.evaluate(&|s| (s == v).then_some(5)), Some(10));
    assert_eq!(size_of(t, "Loose"), Some(SizeExpr::Infinity));
}

#[test]
fn map_size_counts_the_domain() {
    let ws = Workspace::new();
    let s = ws.syntax();
    let module = ModuleBuilder::domain(&ws.interner, "D")
        .map(
            "F",
            MapKind::Function,
            false,
            vec![range(&s, "k", 1, 3)],
            vec![s.field("v", "Integer")],
        )
        .build();
    let out = ws.check(&module);
    assert!(out.is_valid(), "{:?}", out.diagnostics);
    assert_eq!(size_of(&out.table, "F"), Some(SizeExpr::Count(3)));
}

#[test]
fn map_obligations_must_fit_the_sizes() {
    let ws = Workspace::new();
    let s = ws.syntax();
    let module = ModuleBuilder::domain(&ws.interner, "D")
        .map(
            "Bij",
            MapKind::Bijection,
            false,
            vec![range(&s, "k", 1, 3)],
            vec![letters(&s, "v", &["A", "B"])],
        )
        .map(
            "Inj",
            MapKind::Injection,
            false,
            vec![range(&s, "k", 1, 3)],
            vec![letters(&s, "v", &["A", "B"])],
        )
        .map(
            "Sur",
            MapKind::Surjection,
            true,
            vec![letters(&s, "k", &["A"])],
            vec![letters(&s, "v", &["A", "B"])],
        )
        .map(
            "Tot",
            MapKind::Function,
            false,
            vec![s.field("k", "Integer")],
            vec![s.field("v", "Integer")],
        )
        .map(
            "Fine",
            MapKind::Injection,
            false,
            vec![letters(&s, "k", &["A"])],
            vec![letters(&s, "v", &["A", "B"])],
        )
        .build();
    let out = ws.check(&module);
    assert_eq!(
        codes(&out.table),
        vec![ErrorCode::E3001, ErrorCode::E3001, ErrorCode::E3001, ErrorCode::E3001]
    );
    let maps: Vec<&str> = out
        .table
        .errors()
        .iter()
        .filter_map(|e| match &e.kind {
            CheckErrorKind::TotalityError { map, .. } => Some(map.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(maps, vec!["Bij", "Inj", "Sur", "Tot"]);
}

#[test]
fn recursion_through_a_codomain_is_relational() {
    let ws = Workspace::new();
    let s = ws.syntax();
    let mut next = s.terms("Chain");
    next.push(s.enumeration(vec![s.constant("END")]));
    let module = ModuleBuilder::domain(&ws.interner, "D")
        .map(
            "Chain",
            MapKind::Function,
            true,
            vec![s.field("at", "Integer")],
            vec![s.field_with(Some("next"), next.clone(), false)],
        )
        .map(
            "Loose",
            MapKind::Function,
            true,
            vec![s.field("at", "Integer")],
            vec![s.field_with(Some("next"), s.terms("Loose").into_iter().chain(next).collect(), true)],
        )
        .build();
    let out = ws.check(&module);
    assert_eq!(codes(&out.table), vec![ErrorCode::E3002]);
    assert_eq!(
        out.table.errors()[0].kind,
        CheckErrorKind::RelationalError {
            sort: "Chain".to_owned(),
            position: "next".to_owned(),
        }
    );
}

#[test]
fn imported_sizes_carry_over() {
    let mut ws = Workspace::new();
    let s = ws.syntax();
    let base = ModuleBuilder::domain(&ws.interner, "Base")
        .constructor("V", ConstructorKind::New, vec![range(&s, "x", 1, 2)])
        .build();
    ws.add(&base);

    let s = ws.syntax();
    let module = ModuleBuilder::domain(&ws.interner, "D")
        .includes(None, "Base")
        .constructor("W", ConstructorKind::New, vec![s.field("v", "V"), range(&s, "y", 1, 3)])
        .build();
    let out = ws.check(&module);
    assert!(out.is_valid(), "{:?}", out.diagnostics);
    assert_eq!(size_of(&out.table, "V"), Some(SizeExpr::Count(2)));
    assert_eq!(size_of(&out.table, "W"), Some(SizeExpr::Count(6)));
}
