//! Superbubble identification
//!
//! Three interchangeable detectors run over the DAG list: the quasi-linear
//! finder (range queries over a sparse table), the `n log n` finder (the
//! same scan over a segment tree) and the quadratic definition checker.

pub mod linear;
pub mod quadratic;
pub mod rmq;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::cancel::CancelToken;
use crate::core::errors::PipelineError;
use crate::graph::dag::DagGraph;
use rmq::{SegmentTree, SparseTable};

/// Which detection algorithm to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SbAlgorithm {
    /// Candidate scan with constant-time range queries.
    #[default]
    QuasiLinear,
    /// Candidate scan with logarithmic range queries.
    NLogN,
    /// Direct definition checking per candidate pair.
    Quadratic,
}

impl std::fmt::Display for SbAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SbAlgorithm::QuasiLinear => write!(f, "quasi-linear"),
            SbAlgorithm::NLogN => write!(f, "n-log-n"),
            SbAlgorithm::Quadratic => write!(f, "quadratic"),
        }
    }
}

/// One superbubble in DAG-local vertex ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SuperBubble {
    pub entrance: usize,
    pub exit: usize,
}

/// Detection result for one DAG.
#[derive(Debug, Clone)]
pub struct DagBubbles {
    pub dag_name: String,
    pub bubbles: Vec<SuperBubble>,
}

/// Runs the selected detector over every DAG, in order.
pub fn detect(
    dags: &[DagGraph],
    algorithm: SbAlgorithm,
    whole_graph: bool,
    cancel: &CancelToken,
) -> Result<Vec<DagBubbles>, PipelineError> {
    let mut results = Vec::with_capacity(dags.len());
    for dag in dags {
        cancel.checkpoint()?;
        let bubbles = match algorithm {
            SbAlgorithm::QuasiLinear => {
                linear::find_superbubbles::<SparseTable>(dag, whole_graph, cancel)?
            }
            SbAlgorithm::NLogN => {
                linear::find_superbubbles::<SegmentTree>(dag, whole_graph, cancel)?
            }
            SbAlgorithm::Quadratic => quadratic::find_superbubbles(dag, whole_graph, cancel)?,
        };
        results.push(DagBubbles {
            dag_name: dag.name().to_string(),
            bubbles,
        });
    }
    let total: usize = results.iter().map(|r| r.bubbles.len()).sum();
    info!(%algorithm, dags = dags.len(), superbubbles = total, "detection finished");
    Ok(results)
}
