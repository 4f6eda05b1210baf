//! Graph partitioning
//!
//! Turns the component list into per-component [`SubGraph`]s: one for the
//! singleton bucket (when it has members), then one per non-singleton
//! component, in the same order the decomposition emitted them.

use tracing::info;

use crate::algorithm::tarjan::SccForest;
use crate::core::cancel::CancelToken;
use crate::core::errors::PipelineError;
use crate::core::multigraph::IdGraph;
use crate::graph::subgraph::SubGraph;

/// Partitions `graph` along `forest` into sub-graphs with synthetic
/// entrance and terminal vertices.
pub fn partition(
    graph: &IdGraph,
    forest: &SccForest,
    cancel: &CancelToken,
) -> Result<Vec<SubGraph>, PipelineError> {
    let mut sub_graphs = Vec::new();
    let bucket = forest.singleton_bucket();
    if !bucket.is_empty() {
        cancel.checkpoint()?;
        sub_graphs.push(SubGraph::from_singletons(
            graph,
            bucket,
            format!("subgraph_{}", sub_graphs.len()),
        )?);
    }
    for component in forest.non_singletons() {
        cancel.checkpoint()?;
        sub_graphs.push(SubGraph::from_component(
            graph,
            component,
            format!("subgraph_{}", sub_graphs.len()),
        )?);
    }
    info!(sub_graphs = sub_graphs.len(), "graph partitioned");
    Ok(sub_graphs)
}
