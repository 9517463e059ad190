use formula_diagnostic::ErrorCode;
use formula_ir::{ConstructorKind, Module, ModuleBuilder};
use pretty_assertions::assert_eq;

use super::*;
use crate::test_helpers::{codes, Workspace};

/// Three self-recursive constructors and one missing reference.
fn broken(ws: &Workspace) -> Module {
    let s = ws.syntax();
    ModuleBuilder::domain(&ws.interner, "Broken")
        .constructor("A", ConstructorKind::New, vec![s.unlabeled("A")])
        .constructor("B", ConstructorKind::New, vec![s.field("x", "Missing")])
        .constructor("C", ConstructorKind::New, vec![s.unlabeled("C")])
        .constructor("D", ConstructorKind::New, vec![s.unlabeled("D")])
        .build()
}

#[test]
fn valid_modules_produce_no_diagnostics() {
    let ws = Workspace::new();
    let s = ws.syntax();
    let module = ModuleBuilder::domain(&ws.interner, "Graph")
        .constructor("V", ConstructorKind::New, vec![s.field("lbl", "Integer")])
        .constructor(
            "E",
            ConstructorKind::New,
            vec![s.field("src", "V"), s.field("dst", "V")],
        )
        .build();
    let out = ws.check(&module);
    assert!(out.is_valid());
    assert!(!out.cancelled);
    assert!(out.diagnostics.is_empty());
    assert_eq!(out.error_count(), 0);
    assert_eq!(out.rules().len(), 2);
}

#[test]
fn diagnostics_are_sorted_by_location() {
    let ws = Workspace::new();
    let out = ws.check(&broken(&ws));
    assert!(!out.is_valid());
    assert_eq!(out.error_count(), 4);
    let locations: Vec<_> = out.diagnostics.iter().map(|d| d.primary_location()).collect();
    let mut sorted = locations.clone();
    sorted.sort();
    assert_eq!(locations, sorted);
}

#[test]
fn error_limit_truncates_diagnostics_not_validity() {
    let ws = Workspace::new();
    let config = CheckConfig {
        error_limit: 2,
        ..CheckConfig::unlimited()
    };
    let out = check_module(&broken(&ws), &ws.interner, &ws.modules, &config)
        .unwrap_or_else(|e| panic!("internal error: {e}"));
    assert_eq!(out.error_count(), 2);
    assert_eq!(out.table.errors().len(), 4);
    assert!(!out.is_valid());
}

#[test]
fn cancelled_checks_are_invalid() {
    let ws = Workspace::new();
    let s = ws.syntax();
    let module = ModuleBuilder::domain(&ws.interner, "D")
        .constructor("V", ConstructorKind::New, vec![s.field("x", "Integer")])
        .build();
    let config = CheckConfig::unlimited();
    config.cancel.cancel();
    let out = check_module(&module, &ws.interner, &ws.modules, &config)
        .unwrap_or_else(|e| panic!("internal error: {e}"));
    assert!(out.cancelled);
    assert!(!out.is_valid());
    assert!(out.diagnostics.is_empty());
}

#[test]
fn missing_modules_are_reported() {
    let ws = Workspace::new();
    let module = ModuleBuilder::domain(&ws.interner, "D")
        .includes(None, "Nowhere")
        .build();
    let out = ws.check(&module);
    assert_eq!(codes(&out.table), vec![ErrorCode::E4001]);
    assert_eq!(
        out.table.errors()[0].kind,
        CheckErrorKind::BadComposition {
            reason: "module `Nowhere` is not available".to_owned(),
        }
    );
}

#[test]
fn module_sets_replace_by_name() {
    let mut ws = Workspace::new();
    assert!(ws.modules.is_empty());
    let first = ws.add(&ModuleBuilder::domain(&ws.interner, "D").build());
    let second = ws.add(&ModuleBuilder::domain(&ws.interner, "D").build());
    assert_eq!(ws.modules.len(), 1);
    assert_ne!(first.id(), second.id());
    let name = ws.name("D");
    assert_eq!(ws.modules.get(name).map(|t| t.id()), Some(second.id()));
    assert_eq!(ws.modules.table(ws.name("E")).map(|t| t.id()), None);
}
