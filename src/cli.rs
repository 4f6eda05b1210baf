//! Command line interface
//!
//! Flags mirror the pipeline stages: input and k-mer length, DOT export
//! toggles, database maintenance, compression, and the detector choice.
//! A JSON config file can seed any of these; explicit flags win.

use std::path::PathBuf;

use clap::Parser;

use crate::algorithm::superbubble::SbAlgorithm;
use crate::utils::configuration::{ConfigError, PipelineConfig};

#[derive(Parser, Debug)]
#[command(
    name = "bubble-forge",
    version,
    about = "De Bruijn graph construction and superbubble identification pipeline"
)]
pub struct Cli {
    /// FASTA file with the sequencer reads
    #[arg(short = 'f', long = "fasta", value_name = "PATH")]
    pub fasta: Option<PathBuf>,

    /// K-mer length used for graph construction
    #[arg(short = 'k', long = "kmer", value_name = "INT")]
    pub k: Option<usize>,

    /// Export a DOT file after each graph stage
    #[arg(short = 'd', long = "dot")]
    pub dot: bool,

    /// Export a stored graph to DOT with k-mer labels
    #[arg(long = "dk", value_name = "NAME")]
    pub dot_kmers: Option<String>,

    /// Export a stored graph to DOT with integer labels
    #[arg(long = "di", value_name = "NAME")]
    pub dot_ids: Option<String>,

    /// Persist the indexed graph in the database under NAME
    #[arg(short = 's', long = "store", value_name = "NAME")]
    pub store: Option<String>,

    /// Remove graph NAME from the database
    #[arg(short = 'r', long = "remove", value_name = "NAME")]
    pub remove: Option<String>,

    /// List the graph names in the database
    #[arg(short = 'l', long = "list")]
    pub list: bool,

    /// Run chain compression on the k-mer graph
    #[arg(short = 'c', long = "compress")]
    pub compress: bool,

    /// Use the quasi-linear superbubble detector (default)
    #[arg(long = "sb1", group = "detector")]
    pub sb1: bool,

    /// Use the n-log-n superbubble detector
    #[arg(long = "sb2", group = "detector")]
    pub sb2: bool,

    /// Use the quadratic superbubble detector
    #[arg(long = "sb3", group = "detector")]
    pub sb3: bool,

    /// Database file holding persisted graphs
    #[arg(long = "db", value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// JSON config file providing defaults for the options above
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Cli {
    /// Merges the optional config file with the explicit flags.
    pub fn into_config(self) -> Result<PipelineConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(fasta) = self.fasta {
            config.fasta = Some(fasta);
        }
        if let Some(k) = self.k {
            config.k = Some(k);
        }
        if let Some(database) = self.database {
            config.database = database;
        }
        if let Some(store) = self.store {
            config.store_as = Some(store);
        }
        config.dot_export |= self.dot;
        config.compress |= self.compress;
        if self.sb1 {
            config.algorithm = SbAlgorithm::QuasiLinear;
        } else if self.sb2 {
            config.algorithm = SbAlgorithm::NLogN;
        } else if self.sb3 {
            config.algorithm = SbAlgorithm::Quadratic;
        }
        config.validate()?;
        Ok(config)
    }
}
