//! FASTA read input
//!
//! Thin pull adapter over `bio`'s FASTA reader: descriptions are consumed
//! by the parser, blank sequences are skipped, and multi-line records
//! arrive already reassembled. Only the read payloads reach the graph
//! builder.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use bio::io::fasta;
use tracing::debug;

use crate::core::errors::PipelineError;

/// Streaming source of read payloads from one FASTA file.
#[derive(Debug)]
pub struct ReadSource {
    records: fasta::Records<BufReader<File>>,
    reads_yielded: u64,
}

impl ReadSource {
    pub fn open(path: &Path) -> Result<Self, PipelineError> {
        let file = File::open(path)?;
        let reader = fasta::Reader::new(file);
        debug!(path = %path.display(), "FASTA file opened");
        Ok(Self {
            records: reader.records(),
            reads_yielded: 0,
        })
    }

    /// Reads handed out so far.
    pub fn reads_yielded(&self) -> u64 {
        self.reads_yielded
    }
}

impl Iterator for ReadSource {
    type Item = Result<Vec<u8>, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.records.next()? {
                Ok(record) => {
                    if record.seq().is_empty() {
                        continue;
                    }
                    self.reads_yielded += 1;
                    return Some(Ok(record.seq().to_vec()));
                }
                Err(err) if err.kind() == std::io::ErrorKind::InvalidData => {
                    return Some(Err(PipelineError::BadInput(format!(
                        "malformed FASTA record: {err}"
                    ))));
                }
                Err(err) => return Some(Err(PipelineError::Io(err))),
            }
        }
    }
}
