use formula_ir::{ConstructorKind, MapKind, ModuleBuilder};
use pretty_assertions::assert_eq;

use super::*;
use crate::test_helpers::{find, Workspace};

fn rules_of(table: &SymbolTable, name: &str) -> Vec<IntroducedRule> {
    let subject = find(table, name);
    table
        .rules()
        .iter()
        .filter(|r| r.subject == subject)
        .cloned()
        .collect()
}

#[test]
fn partial_functions_are_only_functional() {
    let ws = Workspace::new();
    let s = ws.syntax();
    let module = ModuleBuilder::domain(&ws.interner, "D")
        .map(
            "F",
            MapKind::Function,
            true,
            vec![s.field("k", "Integer")],
            vec![s.field("v", "String")],
        )
        .build();
    let out = ws.check(&module);
    let rendered: Vec<String> = rules_of(&out.table, "F").iter().map(ToString::to_string).collect();
    assert_eq!(
        rendered,
        vec!["F.%notFunctional :- F(x0, y0), F(x0, z0), y0 != z0.".to_owned()]
    );
}

#[test]
fn total_bijections_get_every_map_rule() {
    let ws = Workspace::new();
    let s = ws.syntax();
    let dom = s.field_with(None, vec![s.enumeration(vec![s.range(1, 2)])], false);
    let cod = s.field_with(
        None,
        vec![s.enumeration(vec![s.constant("A"), s.constant("B")])],
        false,
    );
    let module = ModuleBuilder::domain(&ws.interner, "D")
        .map("F", MapKind::Bijection, false, vec![dom], vec![cod])
        .build();
    let out = ws.check(&module);
    assert!(out.is_valid(), "{:?}", out.diagnostics);

    let rules = rules_of(&out.table, "F");
    let kinds: Vec<RuleKind> = rules.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            RuleKind::Functionality,
            RuleKind::Injectivity,
            RuleKind::Totality,
            RuleKind::InverseTotality,
        ]
    );
    assert_eq!(
        rules[1].to_string(),
        "F.%notInjective :- F(x0, y0), F(w0, y0), x0 != w0."
    );
    assert_eq!(
        rules[2].to_string(),
        "F.%notTotal :- %sub(#F, 0, x0), no F(x0, _)."
    );
    assert_eq!(
        rules[3].to_string(),
        "F.%notInvTotal :- %sub(#F, 1, y0), no F(_, y0)."
    );
}

#[test]
fn multi_argument_maps_use_tuples() {
    let ws = Workspace::new();
    let s = ws.syntax();
    let module = ModuleBuilder::domain(&ws.interner, "D")
        .map(
            "G",
            MapKind::Injection,
            true,
            vec![s.field("a", "Integer"), s.field("b", "Integer")],
            vec![s.field("c", "String"), s.field("d", "String")],
        )
        .build();
    let out = ws.check(&module);
    let rules = rules_of(&out.table, "G");
    assert_eq!(
        rules[0].to_string(),
        "G.%notFunctional :- G(x0, x1, y0, y1), G(x0, x1, z0, z1), (y0, y1) != (z0, z1)."
    );
    assert_eq!(rules[1].kind, RuleKind::Injectivity);
    assert_eq!(rules.len(), 2);
}

#[test]
fn relational_rules_skip_any_positions() {
    let ws = Workspace::new();
    let s = ws.syntax();
    let module = ModuleBuilder::domain(&ws.interner, "Graph")
        .constructor("V", ConstructorKind::New, vec![s.field("lbl", "Integer")])
        .constructor(
            "E",
            ConstructorKind::New,
            vec![s.field("src", "V"), s.any_field("dst", "V")],
        )
        .build();
    let out = ws.check(&module);
    assert!(rules_of(&out.table, "V").is_empty());

    let rules = rules_of(&out.table, "E");
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].kind, RuleKind::Relational);
    assert_eq!(rules[0].position, Some(0));
    assert_eq!(
        rules[0].to_string(),
        "E.%notRelational :- E(a0, a1), %sub(#E, 0, a0), no a0."
    );
}

#[test]
fn contract_heads() {
    assert_eq!(contract_head(ContractKind::Requires), "%requires");
    assert_eq!(contract_head(ContractKind::Ensures), "%ensures");
    assert_eq!(contract_head(ContractKind::Conforms), "%conforms");
}
