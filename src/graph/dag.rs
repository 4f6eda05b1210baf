//! Acyclic transform of a sub-graph
//!
//! Holds the vertex-duplicated graph produced from one [`SubGraph`]: the
//! synthetic `r`/`r'`, the component members under their sub-graph local
//! ids, and one duplicate per member at a fixed offset. The duplicate
//! mapping `dup(i) = i + n` is frozen at construction so it stays a total
//! involution regardless of later pruning.

use ahash::AHashMap;

use crate::core::multigraph::MultiDigraph;
use crate::graph::subgraph::{SubGraph, SOURCE, TERMINAL};

/// Vertex-duplicated DAG of one sub-graph.
#[derive(Debug, Clone)]
pub struct DagGraph {
    name: String,
    graph: MultiDigraph<usize>,
    /// Number of component members; originals occupy `[2, n + 1]` and
    /// duplicates `[n + 2, 2n + 1]`.
    interior: usize,
    global_of_local: AHashMap<usize, usize>,
}

impl DagGraph {
    /// Allocates `r`, `r'`, every member and its duplicate. No edges yet.
    pub fn new(name: impl Into<String>, sub: &SubGraph) -> Self {
        let n = sub.interior_count();
        let mut graph = MultiDigraph::new();
        graph.add_vertex(SOURCE);
        graph.add_vertex(TERMINAL);
        let mut global_of_local = AHashMap::new();
        for local in 2..2 + n {
            graph.add_vertex(local);
            if let Some(global) = sub.global_of_local(local) {
                global_of_local.insert(local, global);
                global_of_local.insert(local + n, global);
            }
        }
        for local in 2..2 + n {
            graph.add_vertex(local + n);
        }
        Self {
            name: name.into(),
            graph,
            interior: n,
            global_of_local,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn graph(&self) -> &MultiDigraph<usize> {
        &self.graph
    }

    pub(crate) fn graph_mut(&mut self) -> &mut MultiDigraph<usize> {
        &mut self.graph
    }

    /// Number of component members behind this DAG.
    pub fn interior_count(&self) -> usize {
        self.interior
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.vertex_count()
    }

    /// The duplicate partner of a local id; `None` for `r` and `r'`.
    pub fn dup(&self, local: usize) -> Option<usize> {
        let n = self.interior;
        if (2..2 + n).contains(&local) {
            Some(local + n)
        } else if (2 + n..2 + 2 * n).contains(&local) {
            Some(local - n)
        } else {
            None
        }
    }

    pub fn is_duplicate(&self, local: usize) -> bool {
        (2 + self.interior..2 + 2 * self.interior).contains(&local)
    }

    /// Global id a local vertex stands for. Duplicates map to the same
    /// global as their original; `r`/`r'` have none.
    pub fn global_of_local(&self, local: usize) -> Option<usize> {
        self.global_of_local.get(&local).copied()
    }

    pub(crate) fn forget_global(&mut self, local: usize) {
        self.global_of_local.remove(&local);
    }
}
