//! Pipeline configuration
//!
//! One flat config struct assembled from CLI options, optionally seeded
//! from a JSON file, and validated before anything runs. Stage code only
//! ever sees a validated config.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::algorithm::superbubble::SbAlgorithm;
use crate::core::errors::PipelineError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file `{path}`: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed config file: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("{0}")]
    Invalid(String),
}

impl From<ConfigError> for PipelineError {
    fn from(err: ConfigError) -> Self {
        PipelineError::BadInput(err.to_string())
    }
}

/// Everything one pipeline run needs to know.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// FASTA input with the sequencer reads.
    pub fasta: Option<PathBuf>,
    /// K-mer length for graph construction.
    pub k: Option<usize>,
    /// Database file holding persisted graphs.
    pub database: PathBuf,
    /// Export a DOT file after each graph stage.
    pub dot_export: bool,
    /// Run chain compression between construction and indexing.
    pub compress: bool,
    /// Persist the indexed graph under this name.
    pub store_as: Option<String>,
    /// Which superbubble detector to run.
    pub algorithm: SbAlgorithm,
    /// Also report the pair spanning a whole DAG.
    pub whole_graph: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fasta: None,
            k: None,
            database: PathBuf::from("graphs.db"),
            dot_export: false,
            compress: false,
            store_as: None,
            algorithm: SbAlgorithm::default(),
            whole_graph: false,
        }
    }
}

impl PipelineConfig {
    /// Loads a config file (JSON).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Cross-field validation, run once before the pipeline starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(k) = self.k {
            if k < 2 {
                return Err(ConfigError::Invalid(format!(
                    "k-mer length must be at least 2, got {k}"
                )));
            }
        }
        if self.fasta.is_some() && self.k.is_none() {
            return Err(ConfigError::Invalid(
                "a k-mer length (-k) is required when a FASTA file is given".to_string(),
            ));
        }
        Ok(())
    }

    /// Name the current graph is known by: the explicit store name, else
    /// the FASTA file stem, else a fixed fallback.
    pub fn graph_name(&self) -> String {
        if let Some(name) = &self.store_as {
            return name.clone();
        }
        self.fasta
            .as_deref()
            .and_then(Path::file_stem)
            .and_then(|s| s.to_str())
            .unwrap_or("graph")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_is_valid() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn fasta_without_k_is_invalid() {
        let config = PipelineConfig {
            fasta: Some(PathBuf::from("reads.fasta")),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn tiny_k_is_invalid() {
        let config = PipelineConfig {
            fasta: Some(PathBuf::from("reads.fasta")),
            k: Some(1),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn graph_name_prefers_the_store_name() {
        let mut config = PipelineConfig {
            fasta: Some(PathBuf::from("/data/sample01.fasta")),
            k: Some(5),
            ..Default::default()
        };
        assert_eq!(config.graph_name(), "sample01");
        config.store_as = Some("stored".to_string());
        assert_eq!(config.graph_name(), "stored");
    }

    #[test]
    fn loads_partial_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"k": 7, "compress": true}}"#).unwrap();
        file.flush().unwrap();
        let config = PipelineConfig::load(file.path()).unwrap();
        assert_eq!(config.k, Some(7));
        assert!(config.compress);
        assert_eq!(config.database, PathBuf::from("graphs.db"));
    }
}
