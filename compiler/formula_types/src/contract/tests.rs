use formula_diagnostic::ErrorCode;
use formula_ir::{ConstantDeclKind, ConstructorKind, ContractKind, MapKind, ModuleBuilder};
use pretty_assertions::assert_eq;

use super::*;
use crate::test_helpers::{codes, find, Workspace};

fn contract_rules(table: &SymbolTable) -> Vec<String> {
    table
        .rules()
        .iter()
        .filter(|r| matches!(r.kind, RuleKind::Contract(_)))
        .map(ToString::to_string)
        .collect()
}

#[test]
fn cardinality_over_new_data() {
    let ws = Workspace::new();
    let s = ws.syntax();
    let module = ModuleBuilder::domain(&ws.interner, "D")
        .constructor("V", ConstructorKind::New, vec![s.field("x", "Integer")])
        .map(
            "F",
            MapKind::Function,
            true,
            vec![s.field("k", "V")],
            vec![s.field("v", "Integer")],
        )
        .cardinality(ContractKind::Requires, CardinalityKind::Some, "V")
        .cardinality(ContractKind::Ensures, CardinalityKind::AtMost(4), "F")
        .build();
    let out = ws.check(&module);
    assert!(out.is_valid(), "{:?}", out.diagnostics);
    assert_eq!(
        contract_rules(&out.table),
        vec![
            "%requires :- count(V) >= 1.".to_owned(),
            "%ensures :- count(F) <= 4.".to_owned(),
        ]
    );
    let v = find(&out.table, "V");
    let rule = out.table.rules().iter().find(|r| r.kind == RuleKind::Contract(ContractKind::Requires));
    assert_eq!(rule.map(|r| r.subject), Some(v));
}

#[test]
fn cardinality_needs_new_data() {
    let ws = Workspace::new();
    let s = ws.syntax();
    let module = ModuleBuilder::domain(&ws.interner, "D")
        .constructor("Der", ConstructorKind::Derived, vec![s.field("x", "Integer")])
        .cardinality(ContractKind::Requires, CardinalityKind::Some, "Der")
        .cardinality(ContractKind::Requires, CardinalityKind::Some, "Missing")
        .build();
    let out = ws.check(&module);
    assert_eq!(codes(&out.table), vec![ErrorCode::E3003, ErrorCode::E1001]);
    assert!(contract_rules(&out.table).is_empty());
}

#[test]
fn closed_sizes_warn() {
    let ws = Workspace::new();
    let s = ws.syntax();
    let small = s.field_with(Some("x"), vec![s.enumeration(vec![s.range(1, 2)])], false);
    let module = ModuleBuilder::domain(&ws.interner, "D")
        .constructor("Small", ConstructorKind::New, vec![small])
        .cardinality(ContractKind::Requires, CardinalityKind::AtLeast(3), "Small")
        .cardinality(ContractKind::Requires, CardinalityKind::AtMost(2), "Small")
        .cardinality(ContractKind::Requires, CardinalityKind::AtLeast(2), "Small")
        .build();
    let out = ws.check(&module);
    // Warnings do not invalidate.
    assert!(out.is_valid());
    assert_eq!(codes(&out.table), vec![ErrorCode::W3001, ErrorCode::W3001]);
    assert_eq!(
        out.table.errors()[0].kind,
        CheckErrorKind::CardContractWarning {
            sort: "Small".to_owned(),
            reason: "can never hold: `Small` has at most 2 values".to_owned(),
        }
    );
    assert_eq!(contract_rules(&out.table).len(), 3);
}

#[test]
fn holds_over_derived_constants() {
    let ws = Workspace::new();
    let s = ws.syntax();
    let module = ModuleBuilder::domain(&ws.interner, "D")
        .constructor("V", ConstructorKind::New, vec![s.field("x", "Integer")])
        .constant("ok", ConstantDeclKind::Derived)
        .constant("sane", ConstantDeclKind::Derived)
        .holds(ContractKind::Conforms, &["ok", "sane"])
        .holds(ContractKind::Conforms, &["ok", "V"])
        .holds(ContractKind::Conforms, &["nope"])
        .build();
    let out = ws.check(&module);
    assert_eq!(codes(&out.table), vec![ErrorCode::E1004, ErrorCode::E1001]);
    assert_eq!(
        contract_rules(&out.table),
        vec!["%conforms :- ok, sane.".to_owned()]
    );
}
