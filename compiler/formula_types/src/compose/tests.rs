use std::sync::Arc;

use formula_diagnostic::ErrorCode;
use formula_ir::{ConstructorKind, Module, ModuleBuilder, Span};
use pretty_assertions::assert_eq;

use super::*;
use crate::cancel::CancellationToken;
use crate::canonical::ConstantValue;
use crate::error::CheckAbort;
use crate::resolve::Resolution;
use crate::test_helpers::{codes, find, sort, Workspace};

/// `V ::= new (lbl: Integer)`, `E ::= new (src: V, dst: V)` and
/// `Color ::= {RED, 1..2}`.
fn graph(ws: &Workspace, name: &str) -> Module {
    let s = ws.syntax();
    let color = s.enumeration(vec![s.constant("RED"), s.range(1, 2)]);
    ModuleBuilder::domain(&ws.interner, name)
        .constructor("V", ConstructorKind::New, vec![s.field("lbl", "Integer")])
        .constructor(
            "E",
            ConstructorKind::New,
            vec![s.field("src", "V"), s.field("dst", "V")],
        )
        .union("Color", vec![color])
        .build()
}

fn including(ws: &Workspace, name: &str, refs: &[(Option<&str>, &str)]) -> Module {
    refs.iter()
        .fold(ModuleBuilder::domain(&ws.interner, name), |b, (rename, module)| {
            b.includes(*rename, module)
        })
        .build()
}

#[test]
fn plain_imports_land_in_the_root() {
    let mut ws = Workspace::new();
    let base = ws.add(&graph(&ws, "Graph"));
    let out = ws.check(&including(&ws, "D", &[(None, "Graph")]));
    assert!(out.is_valid(), "{:?}", out.diagnostics);

    let t = &out.table;
    let v = find(t, "V");
    assert_eq!(t.symbol(v).namespace, NamespaceId::ROOT);
    assert_eq!(
        t.symbol(v).origin,
        Some(SymbolOrigin {
            table: base.id(),
            symbol: find(&base, "V"),
        })
    );
    // Canonical forms point at local ids.
    let src = t.symbol(find(t, "E")).canonical().and_then(|f| f.get(0)).cloned();
    assert_eq!(
        src.map(|p| p.sorts().iter().copied().collect::<Vec<_>>()),
        Some(vec![sort(t, "V")])
    );
    assert!(t.literals().contains(&formula_ir::Literal::Integer(2)));
    assert_eq!(t.dependencies().get(&ws.name("Graph")), Some(&base.id()));

    // This module's own convenience unions replace the imported ones.
    let any = find(t, "Any");
    assert_eq!(t.symbol(any).origin, None);
    let data = t.symbol(find(t, "Data")).canonical().and_then(|f| f.get(0)).cloned();
    assert!(data.is_some_and(|d| d.sorts().contains(&sort(t, "V"))));
}

#[test]
fn renamed_imports_round_trip() {
    let mut ws = Workspace::new();
    let base = ws.add(&graph(&ws, "Graph"));
    let out = ws.check(&including(&ws, "D", &[(Some("R"), "Graph")]));
    assert!(out.is_valid(), "{:?}", out.diagnostics);

    let t = &out.table;
    let path = ForeignPath {
        rename: Some(ws.name("R")),
        drop_parent: false,
    };
    for name in ["V", "E", "#V", "Color", "Any"] {
        let original = find(&base, name);
        let local = t.resolve_foreign(&base, original, path);
        assert_eq!(local, Some(find(t, &format!("R.{name}"))), "{name}");
    }
    let original_sort = sort(&base, "V");
    assert_eq!(t.resolve_foreign(&base, original_sort, path), Some(sort(t, "R.V")));

    // Enumeration constants merge into the root.
    let red = find(t, "RED");
    assert_eq!(t.symbol(red).namespace, NamespaceId::ROOT);
    assert_eq!(t.lookup("R.RED"), Resolution::NotFound);

    // The renamed `Any` is rebuilt from the imported one.
    let any = t.symbol(find(t, "R.Any")).canonical().and_then(|f| f.get(0)).cloned();
    let any = any.unwrap_or_default();
    assert!(any.sorts().contains(&sort(t, "R.V")));
    assert!(any.constants().contains(&ConstantValue::Symbol(red)));
}

#[test]
fn two_renamings_are_independent() {
    let mut ws = Workspace::new();
    ws.add(&graph(&ws, "Graph"));
    let out = ws.check(&including(&ws, "D", &[(Some("L"), "Graph"), (Some("R"), "Graph")]));
    assert!(out.is_valid(), "{:?}", out.diagnostics);

    let t = &out.table;
    let (l, r) = (find(t, "L.V"), find(t, "R.V"));
    assert_ne!(l, r);
    assert_eq!(t.symbol(l).origin, t.symbol(r).origin);
    assert_ne!(sort(t, "L.V"), sort(t, "R.V"));
    assert!(matches!(t.lookup("V"), Resolution::Ambiguous(..)));
    // One shared root constant.
    assert!(matches!(t.lookup("RED"), Resolution::Found(_)));
}

#[test]
fn diamonds_share_symbols() {
    let mut ws = Workspace::new();
    ws.add(&graph(&ws, "Graph"));
    ws.add(&including(&ws, "Left", &[(None, "Graph")]));
    ws.add(&including(&ws, "Right", &[(None, "Graph")]));
    let out = ws.check(&including(&ws, "Top", &[(None, "Left"), (None, "Right")]));
    assert!(out.is_valid(), "{:?}", out.diagnostics);
    assert!(matches!(out.table.lookup("V"), Resolution::Found(_)));
}

#[test]
fn unrelated_symbols_clash() {
    let mut ws = Workspace::new();
    ws.add(&graph(&ws, "One"));
    ws.add(&graph(&ws, "Two"));
    let out = ws.check(&including(&ws, "D", &[(None, "One"), (None, "Two")]));
    assert!(!out.is_valid());
    assert!(codes(&out.table).iter().all(|&c| c == ErrorCode::E1003));
    assert!(!out.table.errors().is_empty());
}

#[test]
fn distinct_modules_with_one_name() {
    let mut ws = Workspace::new();
    ws.add(&graph(&ws, "Graph"));
    ws.add(&including(&ws, "A", &[(None, "Graph")]));

    let s = ws.syntax();
    let other = ModuleBuilder::domain(&ws.interner, "Graph")
        .file("elsewhere/graph.4ml")
        .constructor("W", ConstructorKind::New, vec![s.field("x", "Integer")])
        .build();
    ws.add(&other);
    ws.add(&including(&ws, "B", &[(None, "Graph")]));

    let out = ws.check(&including(&ws, "Top", &[(Some("X"), "A"), (Some("Y"), "B")]));
    assert_eq!(codes(&out.table), vec![ErrorCode::E4001]);
}

#[test]
fn composition_rules() {
    let mut ws = Workspace::new();
    ws.add(&graph(&ws, "Graph"));

    let bad_rename = ws.check(&including(&ws, "D", &[(Some("Integer"), "Graph")]));
    assert_eq!(codes(&bad_rename.table), vec![ErrorCode::E1004]);

    let model = ModuleBuilder::model(&ws.interner, "M").of("Graph").build();
    let model_table = ws.add(&model);
    assert!(model_table.is_valid());

    let wrong = ModuleBuilder::model(&ws.interner, "M2").includes(None, "Graph").build();
    assert_eq!(codes(&ws.check(&wrong).table), vec![ErrorCode::E4001]);

    let domain_of_model = including(&ws, "D2", &[(None, "M")]);
    assert_eq!(codes(&ws.check(&domain_of_model).table), vec![ErrorCode::E4001]);
}

#[test]
fn invalid_modules_cannot_be_imported() {
    let mut ws = Workspace::new();
    let s = ws.syntax();
    let broken = ModuleBuilder::domain(&ws.interner, "Broken")
        .constructor("C", ConstructorKind::New, vec![s.unlabeled("C")])
        .build();
    let broken = ws.add(&broken);
    assert!(!broken.is_valid());

    let out = ws.check(&including(&ws, "D", &[(None, "Broken")]));
    assert_eq!(codes(&out.table), vec![ErrorCode::E4001]);
    assert_eq!(out.table.lookup("C"), Resolution::NotFound);
}

#[test]
fn import_polls_for_cancellation() {
    let mut ws = Workspace::new();
    let base: Arc<SymbolTable> = ws.add(&graph(&ws, "Graph"));
    let mut table = SymbolTable::new(
        ws.interner.clone(),
        ws.name("D"),
        formula_ir::ModuleKind::Domain,
        ws.name("d.4ml"),
    );
    let reference = ModuleRef {
        rename: None,
        module: ws.name("Graph"),
        kind: CompositionKind::Includes,
        span: Span::DUMMY,
    };
    let token = CancellationToken::new();
    token.cancel();
    let mut ticker = Ticker::new(&token, 1);
    assert_eq!(
        import(&mut table, &reference, &base, ImportOptions::default(), &mut ticker),
        Err(CheckAbort::Cancelled)
    );
}
