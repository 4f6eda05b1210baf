//! Directed multigraph with parallel-edge weights
//!
//! The backing store is an arena of adjacency slots addressed by dense
//! integer ids; the public API is keyed by an opaque vertex type. Parallel
//! edges are collapsed into one bundle per (from, to) pair whose weight is
//! the edge multiplicity, so `children`/`parents` hold each neighbour once.
//! A global edge counter tracks the total multiplicity and refuses to wrap.
//!
//! Iteration over vertices is in insertion order and stays stable across
//! deletions, which the compression stage relies on for determinism.

use std::fmt::Display;
use std::hash::Hash;

use ahash::AHashMap;

use crate::core::errors::GraphError;

/// Bound for graph vertex keys. Blanket-implemented; `String` labels and
/// dense integer ids are the two instantiations used by the pipeline.
pub trait VertexKey: Clone + Eq + Hash + Display {}
impl<T: Clone + Eq + Hash + Display> VertexKey for T {}

/// K-mer labelled de Bruijn multigraph.
pub type KmerGraph = MultiDigraph<String>;

/// Multigraph over dense integer ids produced by the indexer.
pub type IdGraph = MultiDigraph<usize>;

/// Per-vertex adjacency record.
///
/// `children` and `parents` hold arena slot ids in first-seen order;
/// `weights` maps a child slot to the multiplicity of the outgoing bundle.
#[derive(Debug, Clone)]
struct Adjacency<V> {
    key: V,
    children: Vec<usize>,
    parents: Vec<usize>,
    weights: AHashMap<usize, u64>,
}

impl<V> Adjacency<V> {
    fn new(key: V) -> Self {
        Self {
            key,
            children: Vec::new(),
            parents: Vec::new(),
            weights: AHashMap::new(),
        }
    }
}

/// Directed multigraph with weighted parallel-edge bundles and a reverse
/// adjacency index.
#[derive(Debug, Clone, Default)]
pub struct MultiDigraph<V: VertexKey> {
    slots: Vec<Option<Adjacency<V>>>,
    index: AHashMap<V, usize>,
    vertex_count: usize,
    edge_count: u64,
}

impl<V: VertexKey> MultiDigraph<V> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            index: AHashMap::new(),
            vertex_count: 0,
            edge_count: 0,
        }
    }

    /* ------------------------------ queries ------------------------------ */

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Total edge multiplicity across all bundles.
    pub fn edge_count(&self) -> u64 {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }

    pub fn contains_vertex(&self, v: &V) -> bool {
        self.index.contains_key(v)
    }

    pub fn contains_edge(&self, from: &V, to: &V) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&sf), Some(&st)) => self.slot(sf).weights.contains_key(&st),
            _ => false,
        }
    }

    /// Multiplicity of the bundle `from -> to`.
    pub fn weight_of(&self, from: &V, to: &V) -> Result<u64, GraphError> {
        let sf = self.lookup(from)?;
        let st = self.lookup(to)?;
        self.slot(sf)
            .weights
            .get(&st)
            .copied()
            .ok_or_else(|| GraphError::MissingEdge(from.to_string(), to.to_string()))
    }

    /// Number of distinct parents.
    pub fn in_degree(&self, v: &V) -> Result<usize, GraphError> {
        Ok(self.slot(self.lookup(v)?).parents.len())
    }

    /// Number of distinct children.
    pub fn out_degree(&self, v: &V) -> Result<usize, GraphError> {
        Ok(self.slot(self.lookup(v)?).children.len())
    }

    /// Sum of incoming bundle weights.
    pub fn in_weighted(&self, v: &V) -> Result<u64, GraphError> {
        let sv = self.lookup(v)?;
        let total = self
            .slot(sv)
            .parents
            .iter()
            .map(|&p| self.slot(p).weights.get(&sv).copied().unwrap_or(0))
            .sum();
        Ok(total)
    }

    /// Sum of outgoing bundle weights.
    pub fn out_weighted(&self, v: &V) -> Result<u64, GraphError> {
        Ok(self.slot(self.lookup(v)?).weights.values().sum())
    }

    /// Vertices in insertion order. Stable across deletions.
    pub fn vertices(&self) -> impl Iterator<Item = &V> {
        self.slots.iter().flatten().map(|adj| &adj.key)
    }

    /// Children of `v` in first-seen order; empty if `v` is absent.
    pub fn children(&self, v: &V) -> impl Iterator<Item = &V> {
        self.index
            .get(v)
            .into_iter()
            .flat_map(move |&sv| self.slot(sv).children.iter().map(move |&c| &self.slot(c).key))
    }

    /// Parents of `v` in first-seen order; empty if `v` is absent.
    pub fn parents(&self, v: &V) -> impl Iterator<Item = &V> {
        self.index
            .get(v)
            .into_iter()
            .flat_map(move |&sv| self.slot(sv).parents.iter().map(move |&p| &self.slot(p).key))
    }

    /// Children of `v` paired with the bundle weight.
    pub fn children_weighted(&self, v: &V) -> impl Iterator<Item = (&V, u64)> {
        self.index.get(v).into_iter().flat_map(move |&sv| {
            let adj = self.slot(sv);
            adj.children
                .iter()
                .map(move |&c| (&self.slot(c).key, adj.weights[&c]))
        })
    }

    /* --------------------------- manipulation ---------------------------- */

    /// Adds a vertex. Returns `false` when the key was already present.
    pub fn add_vertex(&mut self, v: V) -> bool {
        if self.index.contains_key(&v) {
            return false;
        }
        let slot = self.slots.len();
        self.index.insert(v.clone(), slot);
        self.slots.push(Some(Adjacency::new(v)));
        self.vertex_count += 1;
        true
    }

    /// Adds one edge `from -> to`. Both endpoints must exist.
    pub fn add_edge(&mut self, from: &V, to: &V) -> Result<(), GraphError> {
        let sf = self.lookup(from)?;
        let st = self.lookup(to)?;
        self.bump_edge(sf, st, 1)
    }

    /// Adds `weight` parallel edges `from -> to`. Both endpoints must exist.
    pub fn add_edge_weighted(&mut self, from: &V, to: &V, weight: u64) -> Result<(), GraphError> {
        let sf = self.lookup(from)?;
        let st = self.lookup(to)?;
        self.bump_edge(sf, st, weight)
    }

    /// Adds one edge `from -> to`, creating missing endpoints first.
    pub fn add_edge_ensuring(&mut self, from: V, to: V) -> Result<(), GraphError> {
        let sf = self.ensure(from);
        let st = self.ensure(to);
        self.bump_edge(sf, st, 1)
    }

    /// Removes one parallel edge from the bundle `from -> to`; the bundle
    /// disappears when its weight reaches zero.
    pub fn remove_edge(&mut self, from: &V, to: &V) -> Result<(), GraphError> {
        let sf = self.lookup(from)?;
        let st = self.lookup(to)?;
        let weight = {
            let adj = self.slot_mut(sf);
            match adj.weights.get_mut(&st) {
                None => {
                    return Err(GraphError::MissingEdge(from.to_string(), to.to_string()));
                }
                Some(w) if *w > 1 => {
                    *w -= 1;
                    *w
                }
                Some(_) => {
                    adj.weights.remove(&st);
                    adj.children.retain(|&c| c != st);
                    0
                }
            }
        };
        if weight == 0 {
            self.slot_mut(st).parents.retain(|&p| p != sf);
        }
        self.edge_count -= 1;
        Ok(())
    }

    /// Removes the whole bundle `from -> to` in one step; returns its
    /// weight.
    pub fn remove_all_edges(&mut self, from: &V, to: &V) -> Result<u64, GraphError> {
        let sf = self.lookup(from)?;
        let st = self.lookup(to)?;
        let weight = {
            let adj = self.slot_mut(sf);
            let Some(weight) = adj.weights.remove(&st) else {
                return Err(GraphError::MissingEdge(from.to_string(), to.to_string()));
            };
            adj.children.retain(|&c| c != st);
            weight
        };
        self.slot_mut(st).parents.retain(|&p| p != sf);
        self.edge_count -= weight;
        Ok(weight)
    }

    /// Removes `v` and every incident bundle, keeping the reverse index and
    /// the edge counter consistent.
    pub fn remove_vertex(&mut self, v: &V) -> Result<(), GraphError> {
        let sv = self.lookup(v)?;
        let adj = self.slots[sv]
            .take()
            .ok_or_else(|| GraphError::MissingVertex(v.to_string()))?;
        self.index.remove(v);
        self.vertex_count -= 1;

        // Outgoing bundles, including a self-loop, live in the removed
        // record's own weight map.
        self.edge_count -= adj.weights.values().sum::<u64>();

        for &p in &adj.parents {
            if p == sv {
                continue;
            }
            let parent = self.slot_mut(p);
            let removed = parent.weights.remove(&sv);
            parent.children.retain(|&c| c != sv);
            if let Some(w) = removed {
                self.edge_count -= w;
            }
        }
        for &c in &adj.children {
            if c == sv {
                continue;
            }
            self.slot_mut(c).parents.retain(|&p| p != sv);
        }
        Ok(())
    }

    /* ----------------------------- internals ------------------------------ */

    fn lookup(&self, v: &V) -> Result<usize, GraphError> {
        self.index
            .get(v)
            .copied()
            .ok_or_else(|| GraphError::MissingVertex(v.to_string()))
    }

    fn ensure(&mut self, v: V) -> usize {
        match self.index.get(&v) {
            Some(&slot) => slot,
            None => {
                let slot = self.slots.len();
                self.index.insert(v.clone(), slot);
                self.slots.push(Some(Adjacency::new(v)));
                self.vertex_count += 1;
                slot
            }
        }
    }

    fn slot(&self, id: usize) -> &Adjacency<V> {
        self.slots[id].as_ref().expect("live arena slot")
    }

    fn slot_mut(&mut self, id: usize) -> &mut Adjacency<V> {
        self.slots[id].as_mut().expect("live arena slot")
    }

    fn bump_edge(&mut self, sf: usize, st: usize, weight: u64) -> Result<(), GraphError> {
        let new_count =
            self.edge_count
                .checked_add(weight)
                .ok_or(GraphError::Overflow {
                    current: self.edge_count,
                    added: weight,
                })?;
        let first_edge = {
            let adj = self.slot_mut(sf);
            match adj.weights.get_mut(&st) {
                Some(w) => {
                    *w += weight;
                    false
                }
                None => {
                    adj.weights.insert(st, weight);
                    adj.children.push(st);
                    true
                }
            }
        };
        if first_edge {
            self.slot_mut(st).parents.push(sf);
        }
        self.edge_count = new_count;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(edges: &[(&str, &str)]) -> KmerGraph {
        let mut g = KmerGraph::new();
        for &(u, v) in edges {
            g.add_edge_ensuring(u.to_string(), v.to_string()).unwrap();
        }
        g
    }

    #[test]
    fn parallel_edges_accumulate_weight_only() {
        let g = graph_with(&[("TGC", "GCA"), ("TGC", "GCA")]);
        assert_eq!(g.vertex_count(), 2);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.weight_of(&"TGC".into(), &"GCA".into()).unwrap(), 2);
        assert_eq!(g.out_degree(&"TGC".into()).unwrap(), 1);
        assert_eq!(g.in_degree(&"GCA".into()).unwrap(), 1);
    }

    #[test]
    fn adjacency_stays_symmetric() {
        let g = graph_with(&[("A", "B"), ("A", "C"), ("B", "C")]);
        for u in g.vertices() {
            for v in g.children(u) {
                assert!(g.parents(v).any(|p| p == u));
                assert!(g.weight_of(u, v).unwrap() >= 1);
            }
        }
    }

    #[test]
    fn edge_count_matches_bundle_weights() {
        let mut g = graph_with(&[("A", "B"), ("A", "B"), ("B", "C"), ("C", "A")]);
        g.remove_edge(&"A".into(), &"B".into()).unwrap();
        let total: u64 = g
            .vertices()
            .map(|v| g.out_weighted(v).unwrap())
            .sum();
        assert_eq!(total, g.edge_count());
        assert_eq!(g.edge_count(), 3);
    }

    #[test]
    fn missing_endpoints_are_typed_errors() {
        let mut g = graph_with(&[("A", "B")]);
        assert_eq!(
            g.add_edge(&"A".into(), &"Z".into()),
            Err(GraphError::MissingVertex("Z".into()))
        );
        assert_eq!(
            g.remove_edge(&"B".into(), &"A".into()),
            Err(GraphError::MissingEdge("B".into(), "A".into()))
        );
    }

    #[test]
    fn self_loops_are_permitted() {
        let mut g = KmerGraph::new();
        g.add_edge_ensuring("AAA".into(), "AAA".into()).unwrap();
        g.add_edge(&"AAA".into(), &"AAA".into()).unwrap();
        assert_eq!(g.vertex_count(), 1);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.in_degree(&"AAA".into()).unwrap(), 1);
        assert_eq!(g.out_degree(&"AAA".into()).unwrap(), 1);
        assert_eq!(g.weight_of(&"AAA".into(), &"AAA".into()).unwrap(), 2);
    }

    #[test]
    fn removing_a_vertex_clears_every_incident_bundle() {
        let mut g = graph_with(&[("A", "B"), ("B", "C"), ("C", "B"), ("B", "B")]);
        g.add_edge(&"C".into(), &"B".into()).unwrap();
        assert_eq!(g.edge_count(), 5);
        g.remove_vertex(&"B".into()).unwrap();
        assert_eq!(g.vertex_count(), 2);
        assert_eq!(g.edge_count(), 0);
        assert!(!g.contains_vertex(&"B".into()));
        assert_eq!(g.out_degree(&"A".into()).unwrap(), 0);
        assert_eq!(g.in_degree(&"C".into()).unwrap(), 0);
    }

    #[test]
    fn remove_all_edges_drops_the_bundle_at_once() {
        let mut g = graph_with(&[("A", "B"), ("A", "B"), ("A", "B")]);
        let removed = g.remove_all_edges(&"A".into(), &"B".into()).unwrap();
        assert_eq!(removed, 3);
        assert_eq!(g.edge_count(), 0);
        assert!(!g.contains_edge(&"A".into(), &"B".into()));
    }

    #[test]
    fn iteration_order_is_insertion_order_and_survives_deletion() {
        let mut g = graph_with(&[("A", "B"), ("C", "D"), ("D", "A")]);
        g.remove_vertex(&"C".into()).unwrap();
        let order: Vec<&String> = g.vertices().collect();
        assert_eq!(order, ["A", "B", "D"]);
        g.add_vertex("E".to_string());
        let order: Vec<&String> = g.vertices().collect();
        assert_eq!(order, ["A", "B", "D", "E"]);
    }

    #[test]
    fn weighted_degrees_sum_bundles() {
        let g = graph_with(&[("A", "C"), ("A", "C"), ("B", "C"), ("C", "D")]);
        assert_eq!(g.in_weighted(&"C".into()).unwrap(), 3);
        assert_eq!(g.out_weighted(&"C".into()).unwrap(), 1);
        assert_eq!(g.in_degree(&"C".into()).unwrap(), 2);
    }
}
