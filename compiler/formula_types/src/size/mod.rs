//! Size analysis over the sort dependency graph.
//!
//! # Graph
//!
//! Nodes are `Sort(s)`, the size of a companion sort, and `Slot(s, i)`, the
//! size of position `i` of `s`. `Sort(s)` depends on each of its slots and a
//! slot depends on every own sort it accepts. Edges are tagged when the
//! reference may be used unboundedly; only the edge into a non-`any` map
//! codomain slot is untagged.
//!
//! # Sizes
//!
//! Components are sized dependencies first. A slot counts its ground values
//! and adds the sizes of the sorts it accepts; an infinite sort at a
//! relational (non-`any`) position contributes `Card(sort)` instead, the
//! number of its facts. A constructor is the product of its slots, a map of
//! its domain slots. Cyclic components are infinite, and an untagged edge
//! inside one is a relational error.
//!
//! Once a sort's size is written, its map obligations are checked and its
//! rules synthesized.

mod expr;
mod graph;

use rustc_hash::{FxHashMap, FxHashSet};

pub use expr::SizeExpr;
use graph::DepGraph;

use crate::cancel::Ticker;
use crate::error::{CheckAbort, CheckErrorKind};
use crate::ids::SymbolId;
use crate::rules;
use crate::symbol::{MapFlags, SymbolKind};
use crate::table::SymbolTable;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum SizeNode {
    Sort(SymbolId),
    Slot(SymbolId, u32),
}

type Sizes = FxHashMap<SizeNode, SizeExpr>;

/// Size every productive own sort, check totality and emit rules.
#[tracing::instrument(level = "debug", skip_all)]
pub(crate) fn compute_sizes(
    table: &mut SymbolTable,
    productive: &FxHashSet<SymbolId>,
    ticker: &mut Ticker<'_>,
) -> Result<(), CheckAbort> {
    let mut data: Vec<SymbolId> = productive.iter().copied().collect();
    data.sort_unstable();

    let mut graph = DepGraph::new();
    for &d in &data {
        let Some(sort) = table.sort_of(d) else {
            continue;
        };
        let symbol = table.symbol(d);
        graph.add_node(SizeNode::Sort(sort));
        for position in 0..symbol.arity {
            let slot = SizeNode::Slot(sort, position);
            let tagged = match &symbol.kind {
                SymbolKind::Map(info) => {
                    let i = position as usize;
                    !info.is_codomain(i) || info.any.get(i).copied().unwrap_or(false)
                }
                _ => true,
            };
            graph.add_edge(SizeNode::Sort(sort), slot, tagged);
            let Some(values) = symbol.canonical().and_then(|f| f.get(position as usize)) else {
                continue;
            };
            for &target in values.sorts() {
                if table.data_of(target).is_some_and(|t| productive.contains(&t)) {
                    graph.add_edge(slot, SizeNode::Sort(target), true);
                }
            }
        }
    }

    let mut sizes = Sizes::default();
    let components = graph.components();
    tracing::debug!(nodes = graph.len(), components = components.len(), "size graph");
    for component in components {
        ticker.tick()?;
        if graph.is_cyclic(&component) {
            for &i in &component {
                sizes.insert(graph.node(i), SizeExpr::Infinity);
            }
            report_relational(table, &graph, &component);
            for &i in &component {
                if let SizeNode::Sort(sort) = graph.node(i) {
                    finish_sort(table, sort, &sizes)?;
                }
            }
            continue;
        }

        let node = graph.node(component[0]);
        let size = match node {
            SizeNode::Slot(sort, position) => slot_size(table, sort, position, &sizes),
            SizeNode::Sort(sort) => sort_size(table, sort, &sizes),
        };
        tracing::trace!(?node, %size, "sized");
        sizes.insert(node, size);
        if let SizeNode::Sort(sort) = node {
            finish_sort(table, sort, &sizes)?;
        }
    }
    Ok(())
}

fn slot_size(table: &SymbolTable, sort: SymbolId, position: u32, sizes: &Sizes) -> SizeExpr {
    let Some(values) = table
        .symbol(sort)
        .canonical()
        .and_then(|f| f.get(position as usize))
    else {
        return SizeExpr::Count(0);
    };
    let any = table
        .data_of(sort)
        .map(|d| table.symbol(d).kind.any_flags())
        .and_then(|flags| flags.get(position as usize).copied())
        .unwrap_or(false);

    let ground = values
        .ground_count()
        .map_or(SizeExpr::Infinity, SizeExpr::Count);
    let referenced = values.sorts().iter().map(|&target| {
        let size = match sizes.get(&SizeNode::Sort(target)) {
            Some(size) => size.clone(),
            None if table.symbol(target).is_imported() => {
                table.symbol(target).size().cloned().unwrap_or(SizeExpr::Infinity)
            }
            // Not productive: no terms.
            None => SizeExpr::Count(0),
        };
        if size.is_infinite() && !any {
            SizeExpr::Card(target)
        } else {
            size
        }
    });
    SizeExpr::sum(std::iter::once(ground).chain(referenced))
}

fn sort_size(table: &SymbolTable, sort: SymbolId, sizes: &Sizes) -> SizeExpr {
    let Some(data) = table.data_of(sort) else {
        return SizeExpr::Infinity;
    };
    let symbol = table.symbol(data);
    let counted = match &symbol.kind {
        SymbolKind::Map(info) => info.domain_arity,
        _ => symbol.arity,
    };
    SizeExpr::product((0..counted).map(|i| slot(sizes, sort, i)))
}

fn slot(sizes: &Sizes, sort: SymbolId, position: u32) -> SizeExpr {
    sizes
        .get(&SizeNode::Slot(sort, position))
        .cloned()
        .unwrap_or(SizeExpr::Infinity)
}

/// Write the size, check map obligations and synthesize rules, once.
fn finish_sort(table: &mut SymbolTable, sort: SymbolId, sizes: &Sizes) -> Result<(), CheckAbort> {
    let size = sizes
        .get(&SizeNode::Sort(sort))
        .cloned()
        .unwrap_or(SizeExpr::Infinity);
    table.set_sort_size(sort, size)?;
    let Some(data) = table.data_of(sort) else {
        return Ok(());
    };
    check_totality(table, data, sort, sizes);
    for rule in rules::synthesize(table, data) {
        table.push_rule(rule);
    }
    Ok(())
}

fn position_name(table: &SymbolTable, data: SymbolId, position: usize) -> String {
    match table.symbol(data).kind.labels().get(position).copied().flatten() {
        Some(label) => table.interner().lookup(label).to_owned(),
        None => position.to_string(),
    }
}

fn check_totality(table: &mut SymbolTable, data: SymbolId, sort: SymbolId, sizes: &Sizes) {
    let SymbolKind::Map(info) = &table.symbol(data).kind else {
        return;
    };
    let flags = info.flags;
    let domain_arity = info.domain_arity;
    let arity = table.symbol(data).arity;

    let mut problems = Vec::new();
    let unbounded = |range: std::ops::Range<u32>| -> Vec<u32> {
        range
            .filter(|&i| slot(sizes, sort, i).is_infinite())
            .collect()
    };
    if flags.contains(MapFlags::TOTAL) {
        for i in unbounded(0..domain_arity) {
            let name = position_name(table, data, i as usize);
            problems.push(format!("is total but its domain position `{name}` is unbounded"));
        }
    }
    if flags.contains(MapFlags::SURJECTIVE) {
        for i in unbounded(domain_arity..arity) {
            let name = position_name(table, data, i as usize);
            problems.push(format!("is surjective but its codomain position `{name}` is unbounded"));
        }
    }

    let domain = SizeExpr::product((0..domain_arity).map(|i| slot(sizes, sort, i))).closed();
    let codomain = SizeExpr::product((domain_arity..arity).map(|i| slot(sizes, sort, i))).closed();
    if let (Some(dom), Some(cod)) = (domain, codomain) {
        let bijective = flags.contains(MapFlags::INJECTIVE | MapFlags::SURJECTIVE | MapFlags::TOTAL);
        if bijective && dom != cod {
            problems.push(format!(
                "is a bijection but its domain has {dom} values and its codomain {cod}"
            ));
        } else if !bijective && flags.contains(MapFlags::INJECTIVE | MapFlags::TOTAL) && dom > cod {
            problems.push(format!("is injective and total but maps {dom} values into {cod}"));
        } else if !bijective && flags.contains(MapFlags::SURJECTIVE) && cod > dom {
            problems.push(format!("is surjective but maps {dom} values onto {cod}"));
        }
    }

    if problems.is_empty() {
        return;
    }
    let location = table.symbol(data).location;
    let map = table.qualified_name(data);
    for reason in problems {
        table.report(
            location,
            CheckErrorKind::TotalityError {
                map: map.clone(),
                reason,
            },
        );
    }
}

/// Report every untagged edge inside a cyclic component.
fn report_relational(table: &mut SymbolTable, graph: &DepGraph<SizeNode>, component: &[usize]) {
    let members: FxHashSet<usize> = component.iter().copied().collect();
    let mut found = Vec::new();
    for &u in component {
        for &(v, tagged) in graph.edges(u) {
            if tagged || !members.contains(&v) {
                continue;
            }
            if let SizeNode::Slot(sort, position) = graph.node(v) {
                found.push((sort, position));
            }
        }
    }
    for (sort, position) in found {
        let Some(data) = table.data_of(sort) else {
            continue;
        };
        let location = table.symbol(data).location;
        let name = table.qualified_name(data);
        let position = position_name(table, data, position as usize);
        table.report(
            location,
            CheckErrorKind::RelationalError {
                sort: name,
                position,
            },
        );
    }
}

#[cfg(test)]
mod tests;
