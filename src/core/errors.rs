//! Error types shared across the pipeline
//!
//! Two layers: [`GraphError`] covers query-level failures on the multigraph
//! (missing keys, counter overflow) and is returned to callers without
//! tearing down a stage. [`PipelineError`] is the stage-level error that
//! aborts a run; the CLI maps each variant to a distinct exit code.

use thiserror::Error;

/// Query-level errors raised by [`crate::core::MultiDigraph`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A vertex key passed to an operation is not in the graph.
    #[error("vertex `{0}` is not in the graph")]
    MissingVertex(String),

    /// The requested edge does not exist between two present vertices.
    #[error("edge `{0}` -> `{1}` is not in the graph")]
    MissingEdge(String, String),

    /// Adding the edge would wrap the global edge counter.
    #[error("edge counter overflow: {current} + {added} exceeds u64 range")]
    Overflow { current: u64, added: u64 },
}

/// Stage-level pipeline errors.
///
/// Every failure that can abort a stage is enumerated here so the binary
/// can report a single diagnostic line and a stable exit code per kind.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed FASTA, a k-mer length out of range, or any other input
    /// the pipeline refuses to process.
    #[error("bad input: {0}")]
    BadInput(String),

    /// A read shorter than the k-mer window. Reported per read; the
    /// construction stage skips the read and keeps going.
    #[error("read of length {length} is too short for k = {k}")]
    ReadTooShort { length: usize, k: usize },

    /// Graph query failure escalated out of a stage.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A back edge was found where an acyclic graph was required.
    #[error("graph is not a DAG: back edge {from} -> {to}")]
    NotADag { from: usize, to: usize },

    /// An internal invariant did not hold at a checkpoint.
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),

    /// Filesystem failure while reading reads or writing exports.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// Database failure while persisting or loading a graph.
    #[error("database failure: {0}")]
    Db(#[from] rusqlite::Error),

    /// The run was cancelled cooperatively.
    #[error("operation cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Process exit code for this error kind. Zero is reserved for success.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::BadInput(_) | PipelineError::ReadTooShort { .. } => 2,
            PipelineError::Graph(GraphError::MissingVertex(_))
            | PipelineError::Graph(GraphError::MissingEdge(_, _)) => 3,
            PipelineError::Graph(GraphError::Overflow { .. }) => 4,
            PipelineError::NotADag { .. } => 5,
            PipelineError::InternalInconsistency(_) => 6,
            PipelineError::Io(_) | PipelineError::Db(_) => 7,
            PipelineError::Cancelled => 8,
        }
    }
}
