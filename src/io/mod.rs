//! Input and output collaborators: FASTA reads, DOT export, persistence

pub mod database;
pub mod dot;
pub mod fasta;

pub use database::GraphStore;
pub use dot::{export_to_file, write_dot, EdgeStyle};
pub use fasta::ReadSource;
