use formula_diagnostic::ErrorCode;
use formula_ir::{ConstructorKind, ModuleBuilder};
use pretty_assertions::assert_eq;

use super::*;
use crate::test_helpers::{codes, find, sort, Workspace};

#[test]
fn self_recursion_without_base_case() {
    let ws = Workspace::new();
    let s = ws.syntax();
    let module = ModuleBuilder::domain(&ws.interner, "D")
        .constructor("C", ConstructorKind::New, vec![s.unlabeled("C")])
        .build();
    let out = ws.check(&module);
    assert!(!out.is_valid());
    assert_eq!(codes(&out.table), vec![ErrorCode::E2001]);
    assert_eq!(
        out.table.errors()[0].kind,
        CheckErrorKind::BadTypeDecl {
            name: "C".to_owned(),
            reason: "does not accept any finite terms".to_owned(),
        }
    );
    // Unproductive sorts are not sized.
    assert_eq!(out.table.symbol(sort(&out.table, "C")).size(), None);
}

#[test]
fn mutual_recursion_needs_a_base_case() {
    let ws = Workspace::new();
    let s = ws.syntax();
    let module = ModuleBuilder::domain(&ws.interner, "D")
        .constructor("A", ConstructorKind::New, vec![s.field("b", "B")])
        .constructor("B", ConstructorKind::New, vec![s.field("a", "A")])
        .build();
    let out = ws.check(&module);
    assert_eq!(codes(&out.table), vec![ErrorCode::E2001, ErrorCode::E2001]);

    let module = ModuleBuilder::domain(&ws.interner, "D")
        .constructor("A", ConstructorKind::New, vec![s.field("b", "B")])
        .constructor("B", ConstructorKind::New, vec![s.field("a", "A + Integer")])
        .build();
    let out = ws.check(&module);
    assert!(out.is_valid(), "{:?}", out.diagnostics);
}

#[test]
fn every_position_must_be_producible() {
    let ws = Workspace::new();
    let s = ws.syntax();
    let module = ModuleBuilder::domain(&ws.interner, "D")
        .constructor("Leaf", ConstructorKind::New, vec![s.field("v", "Integer")])
        .constructor(
            "Half",
            ConstructorKind::New,
            vec![s.field("l", "Leaf"), s.field("rest", "Half")],
        )
        .constructor("Whole", ConstructorKind::New, vec![s.field("l", "Leaf"), s.field("h", "Leaf")])
        .build();
    let out = ws.check(&module);
    assert_eq!(codes(&out.table), vec![ErrorCode::E2001]);
    assert!(out.table.errors()[0].kind.to_string().starts_with("`Half`"));
}

#[test]
fn imported_sorts_are_ground() {
    let mut ws = Workspace::new();
    let s = ws.syntax();
    let base = ModuleBuilder::domain(&ws.interner, "Base")
        .constructor("V", ConstructorKind::New, vec![s.field("x", "Integer")])
        .build();
    ws.add(&base);

    let s = ws.syntax();
    let module = ModuleBuilder::domain(&ws.interner, "D")
        .includes(Some("B"), "Base")
        .constructor("W", ConstructorKind::New, vec![s.field("v", "B.V")])
        .build();
    let mut out = ws.check(&module);
    assert!(out.is_valid(), "{:?}", out.diagnostics);

    let token = crate::cancel::CancellationToken::new();
    let mut ticker = Ticker::new(&token, 1);
    let productive = check_productivity(&mut out.table, &mut ticker);
    let w = find(&out.table, "W");
    assert_eq!(productive, Ok(FxHashSet::from_iter([w])));
}

#[test]
fn failed_declarations_are_skipped() {
    let ws = Workspace::new();
    let s = ws.syntax();
    let module = ModuleBuilder::domain(&ws.interner, "D")
        .constructor("E", ConstructorKind::New, vec![s.field("x", "Missing")])
        .build();
    let out = ws.check(&module);
    assert_eq!(codes(&out.table), vec![ErrorCode::E1001]);

    // Through a union that failed to resolve.
    let module = ModuleBuilder::domain(&ws.interner, "D")
        .union("U", s.terms("Missing"))
        .constructor("C", ConstructorKind::New, vec![s.field("x", "U")])
        .build();
    let out = ws.check(&module);
    assert_eq!(codes(&out.table), vec![ErrorCode::E1001]);
    assert_eq!(out.table.symbol(sort(&out.table, "C")).size(), None);
}

#[test]
fn cancellation_stops_the_fixpoint() {
    let ws = Workspace::new();
    let s = ws.syntax();
    let module = ModuleBuilder::domain(&ws.interner, "D")
        .constructor("V", ConstructorKind::New, vec![s.field("x", "Integer")])
        .build();
    let mut out = ws.check(&module);
    let token = crate::cancel::CancellationToken::new();
    token.cancel();
    let mut ticker = Ticker::new(&token, 1);
    assert_eq!(
        check_productivity(&mut out.table, &mut ticker),
        Err(CheckAbort::Cancelled)
    );
}
