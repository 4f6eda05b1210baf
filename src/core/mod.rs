//! Core data structures and error types

pub mod cancel;
pub mod errors;
pub mod multigraph;

pub use cancel::CancelToken;
pub use errors::{GraphError, PipelineError};
pub use multigraph::{IdGraph, KmerGraph, MultiDigraph, VertexKey};
