//! # bubble-forge
//!
//! De Bruijn graph construction and superbubble identification for
//! sequencer reads. The pipeline builds a k-mer multigraph from FASTA
//! input, optionally contracts unary chains, indexes the labels into a
//! dense integer graph, decomposes it into strongly connected components,
//! transforms every component into a DAG, and reports the superbubbles
//! each DAG contains. Graphs can be persisted in SQLite and exported to
//! DOT along the way.

pub mod algorithm;
pub mod cli;
pub mod core;
pub mod graph;
pub mod io;
pub mod pipeline;
pub mod utils;

// Re-export the types most callers touch.
pub use crate::algorithm::superbubble::{SbAlgorithm, SuperBubble};
pub use crate::core::cancel::CancelToken;
pub use crate::core::errors::{GraphError, PipelineError};
pub use crate::core::multigraph::{IdGraph, KmerGraph, MultiDigraph};
pub use crate::pipeline::{PipelineRunner, PipelineSummary};
pub use crate::utils::configuration::PipelineConfig;
