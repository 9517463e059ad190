//! Compiler-introduced rules.
//!
//! The checker does not evaluate rules. It emits them in a readable textual
//! form for the rule engine, which owns their semantics. Relational rules
//! are phrased with the table's `%sub` helper: `%sub(#C, i, x)` holds when
//! `x` is accepted at position `i` of `C`.

use std::fmt;

use formula_ir::ContractKind;

use crate::ids::SymbolId;
use crate::symbol::{MapFlags, SymbolKind};
use crate::table::SymbolTable;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Functionality,
    Injectivity,
    Totality,
    InverseTotality,
    Relational,
    Contract(ContractKind),
}

/// One synthesized rule `head :- body.`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntroducedRule {
    pub kind: RuleKind,
    /// Constructor or map the rule constrains, or the contract's subject.
    pub subject: SymbolId,
    /// Argument position for per-position rules.
    pub position: Option<u32>,
    pub head: String,
    pub body: Vec<String>,
}

impl fmt::Display for IntroducedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} :- {}.", self.head, self.body.join(", "))
    }
}

fn vars(prefix: char, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{prefix}{i}")).collect()
}

fn tuple(parts: &[String]) -> String {
    match parts {
        [single] => single.clone(),
        _ => format!("({})", parts.join(", ")),
    }
}

fn app(name: &str, args: &[String]) -> String {
    format!("{name}({})", args.join(", "))
}

/// Rules implied by the declaration of the data symbol `data`.
///
/// Maps get functionality, injectivity, totality and inverse-totality rules
/// per their flags. Every non-`any` position that accepts user sorts gets a
/// relational rule.
pub(crate) fn synthesize(table: &SymbolTable, data: SymbolId) -> Vec<IntroducedRule> {
    let symbol = table.symbol(data);
    let name = table.qualified_name(data);
    let arity = symbol.arity as usize;
    let mut rules = Vec::new();
    let rule = |kind, position: Option<u32>, head: String, body: Vec<String>| IntroducedRule {
        kind,
        subject: data,
        position,
        head,
        body,
    };

    if let SymbolKind::Map(info) = &symbol.kind {
        let d = info.domain_arity as usize;
        let xs = vars('x', d);
        let ys = vars('y', arity - d);
        let zs = vars('z', arity - d);
        let ws = vars('w', d);
        let applied = |dom: &[String], cod: &[String]| {
            app(&name, &dom.iter().chain(cod).cloned().collect::<Vec<_>>())
        };

        rules.push(rule(
            RuleKind::Functionality,
            None,
            format!("{name}.%notFunctional"),
            vec![
                applied(&xs, &ys),
                applied(&xs, &zs),
                format!("{} != {}", tuple(&ys), tuple(&zs)),
            ],
        ));
        if info.flags.contains(MapFlags::INJECTIVE) {
            rules.push(rule(
                RuleKind::Injectivity,
                None,
                format!("{name}.%notInjective"),
                vec![
                    applied(&xs, &ys),
                    applied(&ws, &ys),
                    format!("{} != {}", tuple(&xs), tuple(&ws)),
                ],
            ));
        }
        let blanks = |n: usize| vec!["_".to_owned(); n];
        if info.flags.contains(MapFlags::TOTAL) {
            let mut body: Vec<String> = xs
                .iter()
                .enumerate()
                .map(|(i, x)| format!("%sub(#{name}, {i}, {x})"))
                .collect();
            body.push(format!("no {}", applied(&xs, &blanks(arity - d))));
            rules.push(rule(RuleKind::Totality, None, format!("{name}.%notTotal"), body));
        }
        if info.flags.contains(MapFlags::SURJECTIVE) {
            let mut body: Vec<String> = ys
                .iter()
                .enumerate()
                .map(|(i, y)| format!("%sub(#{name}, {}, {y})", d + i))
                .collect();
            body.push(format!("no {}", applied(&blanks(d), &ys)));
            rules.push(rule(
                RuleKind::InverseTotality,
                None,
                format!("{name}.%notInvTotal"),
                body,
            ));
        }
    }

    let (Some(form), any) = (symbol.canonical(), symbol.kind.any_flags()) else {
        return rules;
    };
    let args = vars('a', arity);
    for (i, accepted) in form.positions().iter().enumerate() {
        if any.get(i).copied().unwrap_or(false) || accepted.sorts().is_empty() {
            continue;
        }
        rules.push(rule(
            RuleKind::Relational,
            u32::try_from(i).ok(),
            format!("{name}.%notRelational"),
            vec![
                app(&name, &args),
                format!("%sub(#{name}, {i}, {})", args[i]),
                format!("no {}", args[i]),
            ],
        ));
    }
    rules
}

pub(crate) fn contract_head(kind: ContractKind) -> &'static str {
    match kind {
        ContractKind::Requires => "%requires",
        ContractKind::Ensures => "%ensures",
        ContractKind::Conforms => "%conforms",
    }
}

#[cfg(test)]
mod tests;
