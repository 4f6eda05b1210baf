//! K-mer graph construction from sequencer reads
//!
//! Every read is decomposed into its length-k windows in order; each
//! adjacent window pair contributes one edge to the de Bruijn multigraph,
//! with duplicate pairs accumulating as bundle weight.

use tracing::debug;

use crate::core::errors::PipelineError;
use crate::core::multigraph::KmerGraph;

/// Streams reads into a [`KmerGraph`], counting k-mers and reads consumed.
#[derive(Debug)]
pub struct GraphBuilder<'a> {
    graph: &'a mut KmerGraph,
    k: usize,
    kmers_processed: u64,
    reads_consumed: u64,
}

impl<'a> GraphBuilder<'a> {
    /// Creates a builder for k-mers of length `k`. Lengths below 2 cannot
    /// form overlapping windows and are rejected.
    pub fn new(graph: &'a mut KmerGraph, k: usize) -> Result<Self, PipelineError> {
        if k < 2 {
            return Err(PipelineError::BadInput(format!(
                "k-mer length must be at least 2, got {k}"
            )));
        }
        Ok(Self {
            graph,
            k,
            kmers_processed: 0,
            reads_consumed: 0,
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Total k-mers fed into the graph so far.
    pub fn kmer_count(&self) -> u64 {
        self.kmers_processed
    }

    /// Total reads consumed so far.
    pub fn read_count(&self) -> u64 {
        self.reads_consumed
    }

    /// Decomposes one read into k-mers and adds the consecutive-pair edges.
    ///
    /// A read must be strictly longer than `k` so that at least one edge can
    /// be formed; shorter reads produce [`PipelineError::ReadTooShort`] and
    /// leave the graph untouched.
    pub fn add_read(&mut self, read: &[u8]) -> Result<(), PipelineError> {
        if read.len() <= self.k {
            return Err(PipelineError::ReadTooShort {
                length: read.len(),
                k: self.k,
            });
        }
        let mut previous: Option<String> = None;
        for window in read.windows(self.k) {
            let kmer = std::str::from_utf8(window)
                .map_err(|_| {
                    PipelineError::BadInput("read contains non-UTF-8 bytes".to_string())
                })?
                .to_string();
            self.kmers_processed += 1;
            if let Some(prev) = previous.replace(kmer.clone()) {
                self.graph.add_edge_ensuring(prev, kmer)?;
            }
        }
        self.reads_consumed += 1;
        debug!(
            read_len = read.len(),
            kmers = read.len() - self.k + 1,
            "read added to k-mer graph"
        );
        Ok(())
    }
}
