//! Dependency graph with tagged edges and iterative SCC decomposition.

use std::hash::Hash;

use rustc_hash::FxHashMap;

/// Directed graph; an edge `u -> v` reads "u depends on v".
pub(crate) struct DepGraph<N> {
    nodes: Vec<N>,
    index: FxHashMap<N, usize>,
    /// `(target, admits unbounded use)`
    edges: Vec<Vec<(usize, bool)>>,
}

impl<N: Copy + Eq + Hash> DepGraph<N> {
    pub(crate) fn new() -> Self {
        DepGraph {
            nodes: Vec::new(),
            index: FxHashMap::default(),
            edges: Vec::new(),
        }
    }

    /// Index of `node`, adding it if absent.
    pub(crate) fn add_node(&mut self, node: N) -> usize {
        if let Some(&i) = self.index.get(&node) {
            return i;
        }
        let i = self.nodes.len();
        self.nodes.push(node);
        self.index.insert(node, i);
        self.edges.push(Vec::new());
        i
    }

    pub(crate) fn add_edge(&mut self, from: N, to: N, tagged: bool) {
        let from = self.add_node(from);
        let to = self.add_node(to);
        self.edges[from].push((to, tagged));
    }

    pub(crate) fn node(&self, i: usize) -> N {
        self.nodes[i]
    }

    pub(crate) fn edges(&self, i: usize) -> &[(usize, bool)] {
        &self.edges[i]
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Strongly connected components, each listed after every component it
    /// depends on. Iterative Tarjan, so deep chains do not recurse.
    pub(crate) fn components(&self) -> Vec<Vec<usize>> {
        const UNVISITED: u32 = u32::MAX;
        let n = self.nodes.len();
        let mut index = vec![UNVISITED; n];
        let mut low = vec![0u32; n];
        let mut on_stack = vec![false; n];
        let mut stack = Vec::new();
        let mut out = Vec::new();
        let mut counter = 0u32;
        // (node, next edge to explore)
        let mut frames: Vec<(usize, usize)> = Vec::new();

        for start in 0..n {
            if index[start] != UNVISITED {
                continue;
            }
            index[start] = counter;
            low[start] = counter;
            counter += 1;
            stack.push(start);
            on_stack[start] = true;
            frames.push((start, 0));

            while let Some(&(v, next)) = frames.last() {
                if let Some(&(w, _)) = self.edges[v].get(next) {
                    if let Some(frame) = frames.last_mut() {
                        frame.1 += 1;
                    }
                    if index[w] == UNVISITED {
                        index[w] = counter;
                        low[w] = counter;
                        counter += 1;
                        stack.push(w);
                        on_stack[w] = true;
                        frames.push((w, 0));
                    } else if on_stack[w] {
                        low[v] = low[v].min(index[w]);
                    }
                    continue;
                }

                frames.pop();
                if let Some(&(parent, _)) = frames.last() {
                    low[parent] = low[parent].min(low[v]);
                }
                if low[v] == index[v] {
                    let mut component = Vec::new();
                    while let Some(w) = stack.pop() {
                        on_stack[w] = false;
                        component.push(w);
                        if w == v {
                            break;
                        }
                    }
                    out.push(component);
                }
            }
        }
        out
    }

    /// A component is cyclic if it has several nodes or a self loop.
    pub(crate) fn is_cyclic(&self, component: &[usize]) -> bool {
        match component {
            [single] => self.edges[*single].iter().any(|&(t, _)| t == *single),
            _ => true,
        }
    }
}
