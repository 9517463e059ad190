//! Requires, ensures and conforms contracts.

use formula_ir::traverse::{qualified_ids, Node};
use formula_ir::{CardinalityKind, ContractDecl, ContractItem, Location, Module, QualifiedId};

use crate::cancel::Ticker;
use crate::error::{CheckAbort, CheckErrorKind};
use crate::ids::SymbolId;
use crate::resolve::{type_defining, Resolution, SymbolFilter};
use crate::rules::{contract_head, IntroducedRule, RuleKind};
use crate::symbol::{ConstantKind, SymbolKind};
use crate::table::SymbolTable;

/// Check every contract of `module` and emit its rule.
#[tracing::instrument(level = "debug", skip_all)]
pub(crate) fn check_contracts(
    table: &mut SymbolTable,
    module: &Module,
    ticker: &mut Ticker<'_>,
) -> Result<(), CheckAbort> {
    for contract in &module.contracts {
        ticker.tick()?;
        let location = Location::new(module.file, contract.span);
        match &contract.item {
            ContractItem::Cardinality { kind, sort } => {
                let filter: SymbolFilter<'_> = &type_defining;
                let Some(symbol) = resolve_reported(table, location, sort, Some(filter)) else {
                    continue;
                };
                cardinality(table, contract, location, *kind, symbol);
            }
            ContractItem::Holds(_) => {
                let ids = qualified_ids(Node::ContractDecl(contract));
                let mut names = Vec::with_capacity(ids.len());
                let mut subject = None;
                for &id in &ids {
                    let Some(symbol) = resolve_reported(table, location, id, None) else {
                        continue;
                    };
                    match table.symbol(symbol).kind {
                        SymbolKind::UserConstant(ConstantKind::Derived)
                        | SymbolKind::BaseConstant(_) => {
                            subject.get_or_insert(symbol);
                            names.push(table.qualified_name(symbol));
                        }
                        _ => {
                            let id = table.interner().join(&id.segments);
                            table.report(
                                location,
                                CheckErrorKind::BadId {
                                    id,
                                    usage: "a contract condition",
                                },
                            );
                        }
                    }
                }
                if let Some(subject) = subject.filter(|_| names.len() == ids.len()) {
                    table.push_rule(IntroducedRule {
                        kind: RuleKind::Contract(contract.kind),
                        subject,
                        position: None,
                        head: contract_head(contract.kind).to_owned(),
                        body: names,
                    });
                }
            }
        }
    }
    Ok(())
}

fn resolve_reported(
    table: &mut SymbolTable,
    location: Location,
    id: &QualifiedId,
    filter: Option<SymbolFilter<'_>>,
) -> Option<SymbolId> {
    let name = table.interner().join(&id.segments);
    match table.resolve_id(id, filter) {
        Resolution::Found(symbol) => Some(symbol),
        Resolution::Ambiguous(a, b) => {
            let (first, second) = (table.symbol(a).location, table.symbol(b).location);
            table.report(
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
            table.report(location, CheckErrorKind::UndefinedSymbol { name });
            None
        }
    }
}

/// Cardinality contracts need `new` data. A closed size can make the
/// contract vacuous or unsatisfiable, which is worth a warning.
fn cardinality(
    table: &mut SymbolTable,
    contract: &ContractDecl,
    location: Location,
    kind: CardinalityKind,
    symbol: SymbolId,
) {
    let name = table.qualified_name(symbol);
    if !table.symbol(symbol).kind.is_new() {
        table.report(location, CheckErrorKind::CardNewnessError { sort: name });
        return;
    }
    let size = table
        .sort_of(symbol)
        .and_then(|s| table.symbol(s).size())
        .and_then(|s| s.closed());

    let (bound, at_least) = match kind {
        CardinalityKind::Some => (1, true),
        CardinalityKind::AtLeast(n) => (n, true),
        CardinalityKind::AtMost(n) => (n, false),
    };
    let reason = match size {
        Some(size) if at_least && size < bound => {
            Some(format!("can never hold: `{name}` has at most {size} values"))
        }
        Some(size) if !at_least && size <= bound => {
            Some(format!("always holds: `{name}` has at most {size} values"))
        }
        _ => None,
    };
    let comparison = if at_least { ">=" } else { "<=" };
    if let Some(reason) = reason {
        table.report(
            location,
            CheckErrorKind::CardContractWarning {
                sort: name.clone(),
                reason,
            },
        );
    }

    table.push_rule(IntroducedRule {
        kind: RuleKind::Contract(contract.kind),
        subject: symbol,
        position: None,
        head: contract_head(contract.kind).to_owned(),
        body: vec![format!("count({name}) {comparison} {bound}")],
    });
}

#[cfg(test)]
mod tests;
