//! Productivity: every data sort must admit at least one finite term.
//!
//! Nodes are a root, one function node per constructor or map, and one
//! argument node per position. An argument node needs one enabling
//! producer: the root, if the position accepts ground values or sorts from
//! an imported (already valid) table, or the function node of any sort the
//! position accepts. A function node needs all of its argument nodes.
//! Counters only decrease, so the worklist drains.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::cancel::Ticker;
use crate::error::{CheckAbort, CheckErrorKind};
use crate::ids::SymbolId;
use crate::table::SymbolTable;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum ProductivityNode {
    Root,
    Function(SymbolId),
    Argument(SymbolId, u32),
}

struct NodeState {
    /// Producers still needed.
    required: u32,
    enables: SmallVec<[usize; 4]>,
}

struct ProductivityGraph {
    nodes: Vec<ProductivityNode>,
    index: FxHashMap<ProductivityNode, usize>,
    states: Vec<NodeState>,
}

impl ProductivityGraph {
    fn new() -> Self {
        let mut graph = ProductivityGraph {
            nodes: Vec::new(),
            index: FxHashMap::default(),
            states: Vec::new(),
        };
        graph.add(ProductivityNode::Root, 0);
        graph
    }

    fn add(&mut self, node: ProductivityNode, required: u32) -> usize {
        let i = self.nodes.len();
        self.nodes.push(node);
        self.index.insert(node, i);
        self.states.push(NodeState {
            required,
            enables: SmallVec::new(),
        });
        i
    }

    fn enable(&mut self, from: ProductivityNode, to: usize) {
        if let Some(&from) = self.index.get(&from) {
            self.states[from].enables.push(to);
        }
    }

    /// Worklist fixpoint. Returns the productive nodes.
    fn solve(&mut self, ticker: &mut Ticker<'_>) -> Result<FxHashSet<ProductivityNode>, CheckAbort> {
        let mut productive = FxHashSet::default();
        let mut worklist: Vec<usize> = (0..self.nodes.len())
            .filter(|&i| self.states[i].required == 0)
            .collect();
        productive.extend(worklist.iter().map(|&i| self.nodes[i]));

        while let Some(node) = worklist.pop() {
            ticker.tick()?;
            for k in 0..self.states[node].enables.len() {
                let next = self.states[node].enables[k];
                let state = &mut self.states[next];
                if state.required == 0 {
                    continue;
                }
                state.required -= 1;
                if state.required == 0 {
                    tracing::trace!(node = ?self.nodes[next], "productive");
                    productive.insert(self.nodes[next]);
                    worklist.push(next);
                }
            }
        }
        Ok(productive)
    }
}

/// Check the table's own constructors and maps, reporting each
/// non-productive one. Returns the productive data symbols.
#[tracing::instrument(level = "debug", skip_all)]
pub(crate) fn check_productivity(
    table: &mut SymbolTable,
    ticker: &mut Ticker<'_>,
) -> Result<FxHashSet<SymbolId>, CheckAbort> {
    let own: Vec<SymbolId> = table
        .symbols()
        .iter()
        .filter(|s| s.kind.is_data() && !s.failed && !s.is_imported())
        .map(|s| s.id)
        .collect();

    let mut graph = ProductivityGraph::new();
    for &data in &own {
        let function = graph.add(ProductivityNode::Function(data), table.symbol(data).arity);
        for position in 0..table.symbol(data).arity {
            let argument = graph.add(ProductivityNode::Argument(data, position), 1);
            graph.states[argument].enables.push(function);
        }
    }

    for &data in &own {
        let Some(form) = table.symbol(data).canonical() else {
            continue;
        };
        for (position, values) in form.positions().iter().enumerate() {
            let node = ProductivityNode::Argument(data, u32::try_from(position).unwrap_or(u32::MAX));
            let Some(&argument) = graph.index.get(&node) else {
                continue;
            };
            if values.has_ground_values() {
                graph.enable(ProductivityNode::Root, argument);
            }
            for &sort in values.sorts() {
                let Some(producer) = table.data_of(sort) else {
                    continue;
                };
                if table.symbol(producer).is_imported() {
                    graph.enable(ProductivityNode::Root, argument);
                } else {
                    graph.enable(ProductivityNode::Function(producer), argument);
                }
            }
        }
    }

    let productive_nodes = graph.solve(ticker)?;
    let mut productive = FxHashSet::default();
    for data in own {
        if productive_nodes.contains(&ProductivityNode::Function(data)) {
            productive.insert(data);
            continue;
        }
        let location = table.symbol(data).location;
        let name = table.qualified_name(data);
        table.report(
            location,
            CheckErrorKind::BadTypeDecl {
                name,
                reason: "does not accept any finite terms".to_owned(),
            },
        );
    }
    tracing::debug!(productive = productive.len(), "productivity solved");
    Ok(productive)
}

#[cfg(test)]
mod tests;
