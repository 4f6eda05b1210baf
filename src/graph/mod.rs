//! Graph construction, compression, indexing, and derived views

pub mod builder;
pub mod compressor;
pub mod dag;
pub mod indexer;
pub mod subgraph;

pub use builder::GraphBuilder;
pub use compressor::{ChainCompressor, CompressionStats};
pub use dag::DagGraph;
pub use indexer::{index_graph, KmerIndex};
pub use subgraph::{SubGraph, SOURCE, TERMINAL};
