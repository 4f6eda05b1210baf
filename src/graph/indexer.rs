//! K-mer indexing
//!
//! Assigns every k-mer label a dense integer id in first-seen order and
//! rebuilds the graph over those ids. The bijection is the canonical
//! handoff between the label world and the rest of the pipeline, and the
//! shape persisted by the database layer.

use ahash::AHashMap;
use tracing::info;

use crate::core::cancel::CancelToken;
use crate::core::errors::PipelineError;
use crate::core::multigraph::{IdGraph, KmerGraph};

/// Bijection between k-mer labels and dense ids in `[0, N)`.
#[derive(Debug, Clone, Default)]
pub struct KmerIndex {
    labels: Vec<String>,
    ids: AHashMap<String, usize>,
}

impl KmerIndex {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn id_of(&self, label: &str) -> Option<usize> {
        self.ids.get(label).copied()
    }

    pub fn label_of(&self, id: usize) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    /// Labels in id order.
    pub fn labels(&self) -> impl Iterator<Item = (usize, &str)> {
        self.labels.iter().enumerate().map(|(i, l)| (i, l.as_str()))
    }

    fn insert(&mut self, label: &str) -> usize {
        match self.ids.get(label) {
            Some(&id) => id,
            None => {
                let id = self.labels.len();
                self.labels.push(label.to_string());
                self.ids.insert(label.to_string(), id);
                id
            }
        }
    }
}

/// Indexes a k-mer graph: every label gets a dense id in first-seen order
/// and the edges are replayed with their weights onto an [`IdGraph`].
pub fn index_graph(
    graph: &KmerGraph,
    cancel: &CancelToken,
) -> Result<(KmerIndex, IdGraph), PipelineError> {
    let mut index = KmerIndex::default();
    let mut id_graph = IdGraph::new();

    for label in graph.vertices() {
        cancel.checkpoint()?;
        let id = index.insert(label);
        id_graph.add_vertex(id);
    }
    for label in graph.vertices() {
        cancel.checkpoint()?;
        let from = index
            .id_of(label)
            .ok_or_else(|| {
                PipelineError::InternalInconsistency(format!(
                    "label `{label}` missing from the index it was just added to"
                ))
            })?;
        for (child, weight) in graph.children_weighted(label) {
            let to = index.id_of(child).ok_or_else(|| {
                PipelineError::InternalInconsistency(format!(
                    "edge target `{child}` missing from the k-mer index"
                ))
            })?;
            id_graph.add_edge_weighted(&from, &to, weight)?;
        }
    }

    info!(
        kmers = index.len(),
        edges = id_graph.edge_count(),
        "graph indexed"
    );
    Ok((index, id_graph))
}
