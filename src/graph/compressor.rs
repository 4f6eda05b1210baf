//! Unary chain compression
//!
//! Contracts maximal unary chains of the k-mer graph into single vertices
//! whose labels follow the de Bruijn overlap convention: the head label,
//! extended by the last character of each successive chain member.
//!
//! A vertex is chain-internal when it has exactly one parent, exactly one
//! child, and its incoming bundle weight equals its outgoing one. A chain
//! tail may also be a terminal vertex (one parent, no children). Chains are
//! directed paths; self-loops and closed unary cycles are left intact.

use ahash::AHashSet;
use tracing::{debug, info};

use crate::core::cancel::CancelToken;
use crate::core::errors::PipelineError;
use crate::core::multigraph::KmerGraph;

/// Summary of one compression pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompressionStats {
    pub chains_merged: usize,
    pub vertices_removed: usize,
}

/// Compresses maximal unary chains in place.
#[derive(Debug)]
pub struct ChainCompressor<'a> {
    graph: &'a mut KmerGraph,
}

impl<'a> ChainCompressor<'a> {
    pub fn new(graph: &'a mut KmerGraph) -> Self {
        Self { graph }
    }

    /// Runs compression to a fixed point over a snapshot of the vertex keys.
    ///
    /// The snapshot keeps iteration stable while vertices are deleted;
    /// merged vertices are appended so a newly formed chain is revisited.
    /// Running the pass twice yields the same graph.
    pub fn compress(&mut self, cancel: &CancelToken) -> Result<CompressionStats, PipelineError> {
        let mut worklist: Vec<String> = self.graph.vertices().cloned().collect();
        let mut stats = CompressionStats::default();
        let mut cursor = 0;
        while cursor < worklist.len() {
            cancel.checkpoint()?;
            let key = worklist[cursor].clone();
            cursor += 1;
            if !self.graph.contains_vertex(&key) {
                continue;
            }
            if let Some(merged) = self.compress_chain(&key)? {
                stats.chains_merged += 1;
                stats.vertices_removed += merged.removed;
                worklist.push(merged.label);
            }
        }
        info!(
            chains = stats.chains_merged,
            removed = stats.vertices_removed,
            "chain compression finished"
        );
        Ok(stats)
    }

    /// Walks upward from `start` to the farthest chain-internal ancestor.
    ///
    /// The chain weight is fixed by the first unary vertex encountered and
    /// every bundle above must match it. The walk stops at a self-loop and
    /// when it would wrap around a unary cycle back to `start`.
    fn seek_head(&self, start: &str) -> Result<String, PipelineError> {
        let mut previous = start.to_string();
        let mut current = start.to_string();
        let mut chain_weight: u64 = 0;
        loop {
            if self.graph.in_degree(&current)? != 1 || self.graph.out_degree(&current)? != 1 {
                return Ok(previous);
            }
            let child = self
                .graph
                .children(&current)
                .next()
                .cloned()
                .ok_or_else(|| {
                    PipelineError::InternalInconsistency(format!(
                        "vertex `{current}` reports out-degree 1 but has no child"
                    ))
                })?;
            if chain_weight == 0 {
                chain_weight = self.graph.weight_of(&current, &child)?;
            }
            let parent = self
                .graph
                .parents(&current)
                .next()
                .cloned()
                .ok_or_else(|| {
                    PipelineError::InternalInconsistency(format!(
                        "vertex `{current}` reports in-degree 1 but has no parent"
                    ))
                })?;
            if parent == current {
                return Ok(previous);
            }
            if self.graph.weight_of(&parent, &current)? != chain_weight {
                return Ok(previous);
            }
            if parent == start {
                return Ok(current);
            }
            previous = current;
            current = parent;
        }
    }

    /// A candidate extends the chain when it hangs off a single parent and
    /// either continues with one matching-weight child or terminates.
    fn validate_candidate(&self, candidate: &str, chain_weight: u64) -> Result<bool, PipelineError> {
        let candidate = candidate.to_string();
        if self.graph.in_degree(&candidate)? != 1 {
            return Ok(false);
        }
        match self.graph.out_degree(&candidate)? {
            0 => Ok(true),
            1 => {
                let child = self.graph.children(&candidate).next().cloned();
                match child {
                    Some(child) => Ok(self.graph.weight_of(&candidate, &child)? == chain_weight),
                    None => Ok(false),
                }
            }
            _ => Ok(false),
        }
    }

    /// Attempts to compress the chain containing `key`. Returns the merged
    /// vertex when a contraction happened.
    fn compress_chain(&mut self, key: &String) -> Result<Option<MergedChain>, PipelineError> {
        let head = self.seek_head(key)?;
        if self.graph.out_degree(&head)? != 1 {
            return Ok(None);
        }

        // Collect the chain members below the head.
        let mut queue: Vec<String> = Vec::new();
        let mut current = head.clone();
        loop {
            let children: Vec<String> = self.graph.children(&current).cloned().collect();
            if children.len() != 1 {
                break;
            }
            let next = children.into_iter().next().expect("one child");
            if next == head {
                // Closed unary cycle; not a path, so nothing to contract.
                return Ok(None);
            }
            let weight = self.graph.weight_of(&current, &next)?;
            if !self.validate_candidate(&next, weight)? {
                break;
            }
            queue.push(next.clone());
            current = next;
        }
        if queue.len() < 2 {
            return Ok(None);
        }

        let tail = queue.last().cloned().expect("non-empty queue");
        let mut merged = head.clone();
        for member in &queue {
            merged.extend(member.chars().last());
        }

        let mut chain: AHashSet<&String> = queue.iter().collect();
        chain.insert(&head);
        let incoming: Vec<(String, u64)> = self
            .graph
            .parents(&head)
            .filter(|p| !chain.contains(p))
            .map(|p| {
                let w = self.graph.weight_of(p, &head)?;
                Ok((p.clone(), w))
            })
            .collect::<Result<_, PipelineError>>()?;
        let outgoing: Vec<(String, u64)> = self
            .graph
            .children_weighted(&tail)
            .filter(|(c, _)| !chain.contains(c))
            .map(|(c, w)| (c.clone(), w))
            .collect();
        drop(chain);

        debug!(
            head = %head,
            tail = %tail,
            members = queue.len() + 1,
            merged = %merged,
            "contracting unary chain"
        );

        self.graph.remove_vertex(&head)?;
        for member in &queue {
            self.graph.remove_vertex(member)?;
        }
        let removed = queue.len() + 1;

        self.graph.add_vertex(merged.clone());
        for (parent, weight) in incoming {
            self.graph.add_edge_weighted(&parent, &merged, weight)?;
        }
        for (child, weight) in outgoing {
            self.graph.add_edge_weighted(&merged, &child, weight)?;
        }
        Ok(Some(MergedChain {
            label: merged,
            removed,
        }))
    }
}

struct MergedChain {
    label: String,
    removed: usize,
}
