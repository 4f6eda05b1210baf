//! Per-component sub-graph view
//!
//! A [`SubGraph`] re-homes one strongly connected component (or the bucket
//! of all singleton components) under fresh local ids, together with a
//! synthetic entrance `r` and terminal `r'`. Edges crossing the component
//! boundary are folded onto `r` and `r'`.

use ahash::AHashMap;

use crate::core::errors::PipelineError;
use crate::core::multigraph::{IdGraph, MultiDigraph};

/// Local id of the synthetic entrance vertex `r`.
pub const SOURCE: usize = 0;
/// Local id of the synthetic terminal vertex `r'`.
pub const TERMINAL: usize = 1;

/// One partition of the id graph: a component plus `r` and `r'`.
#[derive(Debug, Clone)]
pub struct SubGraph {
    name: String,
    graph: MultiDigraph<usize>,
    local_of_global: AHashMap<usize, usize>,
    global_of_local: AHashMap<usize, usize>,
}

impl SubGraph {
    /// Builds the sub-graph for the bucket holding every singleton
    /// component.
    ///
    /// A member with no parents (or with a parent outside the bucket) hangs
    /// off `r`; a member with no children (or a child outside) feeds `r'`.
    pub fn from_singletons(
        base: &IdGraph,
        members: &[usize],
        name: impl Into<String>,
    ) -> Result<Self, PipelineError> {
        let mut sub = Self::empty(name, members)?;
        for &global in members {
            let local = sub.local_of_global[&global];
            let children: Vec<usize> = base.children(&global).copied().collect();
            if children.is_empty() {
                sub.graph.add_edge(&local, &TERMINAL)?;
            } else {
                for child in children {
                    match sub.local_of_global.get(&child) {
                        Some(&local_child) => sub.graph.add_edge(&local, &local_child)?,
                        None => sub.graph.add_edge(&local, &TERMINAL)?,
                    }
                }
            }
            let mut parents = base.parents(&global).peekable();
            if parents.peek().is_none() {
                sub.graph.add_edge(&SOURCE, &local)?;
            } else if parents.any(|p| !sub.local_of_global.contains_key(p)) {
                sub.graph.add_edge(&SOURCE, &local)?;
            }
        }
        Ok(sub)
    }

    /// Builds the sub-graph for one non-singleton component.
    ///
    /// Boundary vertices are wired to `r`/`r'`. A component without any
    /// entering boundary edge gets `r -> v` for every member so that `r`
    /// can reach it; symmetrically for `r'` when nothing leaves.
    pub fn from_component(
        base: &IdGraph,
        members: &[usize],
        name: impl Into<String>,
    ) -> Result<Self, PipelineError> {
        let mut sub = Self::empty(name, members)?;
        let has_entrance = members.iter().any(|g| {
            base.parents(g)
                .any(|p| !sub.local_of_global.contains_key(p))
        });
        let has_exit = members.iter().any(|g| {
            base.children(g)
                .any(|c| !sub.local_of_global.contains_key(c))
        });
        for &global in members {
            let local = sub.local_of_global[&global];
            for child in base.children(&global) {
                match sub.local_of_global.get(child) {
                    Some(&local_child) => sub.graph.add_edge(&local, &local_child)?,
                    None => sub.graph.add_edge(&local, &TERMINAL)?,
                }
            }
            if !has_exit {
                sub.graph.add_edge(&local, &TERMINAL)?;
            }
            if !has_entrance {
                sub.graph.add_edge(&SOURCE, &local)?;
            } else if base
                .parents(&global)
                .any(|p| !sub.local_of_global.contains_key(p))
            {
                sub.graph.add_edge(&SOURCE, &local)?;
            }
        }
        Ok(sub)
    }

    fn empty(name: impl Into<String>, members: &[usize]) -> Result<Self, PipelineError> {
        let mut graph = MultiDigraph::new();
        graph.add_vertex(SOURCE);
        graph.add_vertex(TERMINAL);
        let mut local_of_global = AHashMap::new();
        let mut global_of_local = AHashMap::new();
        let mut next_local = 2;
        for &global in members {
            if local_of_global.insert(global, next_local).is_some() {
                return Err(PipelineError::InternalInconsistency(format!(
                    "vertex {global} appears twice in one component"
                )));
            }
            global_of_local.insert(next_local, global);
            graph.add_vertex(next_local);
            next_local += 1;
        }
        Ok(Self {
            name: name.into(),
            graph,
            local_of_global,
            global_of_local,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn graph(&self) -> &MultiDigraph<usize> {
        &self.graph
    }

    /// Number of component members (excludes `r` and `r'`).
    pub fn interior_count(&self) -> usize {
        self.graph.vertex_count() - 2
    }

    /// Global id behind a local id; `None` for `r`, `r'`, and unknown ids.
    pub fn global_of_local(&self, local: usize) -> Option<usize> {
        self.global_of_local.get(&local).copied()
    }

    pub fn local_of_global(&self, global: usize) -> Option<usize> {
        self.local_of_global.get(&global).copied()
    }
}
