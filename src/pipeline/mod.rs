//! Pipeline orchestration
//!
//! Runs the stages in dependency order: read loading, optional chain
//! compression, indexing, optional persistence, component decomposition,
//! partitioning, DAG transformation and superbubble detection. Each stage
//! owns its input exclusively and intermediate artifacts are dropped as
//! soon as the next stage has consumed them. All stages honour one shared
//! cancellation token.

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::algorithm::superbubble::{detect, DagBubbles};
use crate::algorithm::{dagify, find_sccs, partition};
use crate::core::cancel::CancelToken;
use crate::core::errors::PipelineError;
use crate::core::multigraph::KmerGraph;
use crate::graph::builder::GraphBuilder;
use crate::graph::compressor::{ChainCompressor, CompressionStats};
use crate::graph::dag::DagGraph;
use crate::graph::indexer::{index_graph, KmerIndex};
use crate::graph::subgraph::{SOURCE, TERMINAL};
use crate::io::dot::{export_to_file, EdgeStyle};
use crate::io::database::GraphStore;
use crate::io::fasta::ReadSource;
use crate::utils::configuration::PipelineConfig;

/// A superbubble endpoint translated out of DAG-local ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BubbleEndpoint {
    /// A k-mer vertex: dense id plus its label.
    Kmer { id: usize, label: String },
    /// An id-graph vertex with no label table at hand.
    Id(usize),
    /// The synthetic entrance `r`.
    Source,
    /// The synthetic terminal `r'`.
    Terminal,
}

impl fmt::Display for BubbleEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BubbleEndpoint::Kmer { label, .. } => write!(f, "{label}"),
            BubbleEndpoint::Id(id) => write!(f, "{id}"),
            BubbleEndpoint::Source => write!(f, "r"),
            BubbleEndpoint::Terminal => write!(f, "r'"),
        }
    }
}

/// One reported superbubble, in global terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedBubble {
    pub dag_name: String,
    pub entrance: BubbleEndpoint,
    pub exit: BubbleEndpoint,
}

impl fmt::Display for ReportedBubble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.entrance, self.exit)
    }
}

/// Wall-clock duration of one stage.
#[derive(Debug, Clone, Copy)]
pub struct StageTiming {
    pub stage: &'static str,
    pub duration: Duration,
}

/// Counters and results of one full run.
#[derive(Debug, Default)]
pub struct PipelineSummary {
    pub reads_consumed: u64,
    pub reads_skipped: u64,
    pub kmers_processed: u64,
    pub compression: Option<CompressionStats>,
    pub vertex_count: usize,
    pub edge_count: u64,
    pub superbubbles: Vec<ReportedBubble>,
    pub timings: Vec<StageTiming>,
}

/// Which label table to use when exporting a stored graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredLabels {
    Kmers,
    Ids,
}

/// Owns one validated configuration and drives the stages.
pub struct PipelineRunner {
    config: PipelineConfig,
    cancel: CancelToken,
}

impl PipelineRunner {
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: CancelToken::new(),
        })
    }

    /// Token callers can use to cancel the run from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Runs the full pipeline: reads to superbubble list.
    pub fn run(&self) -> Result<PipelineSummary, PipelineError> {
        let fasta = self.config.fasta.clone().ok_or_else(|| {
            PipelineError::BadInput("a FASTA input (-f) is required to run the pipeline".into())
        })?;
        let k = self.config.k.ok_or_else(|| {
            PipelineError::BadInput("a k-mer length (-k) is required to run the pipeline".into())
        })?;
        let name = self.config.graph_name();
        let mut summary = PipelineSummary::default();

        // Stage 1: k-mer graph construction.
        let started = Instant::now();
        let mut kmer_graph = KmerGraph::new();
        {
            let mut builder = GraphBuilder::new(&mut kmer_graph, k)?;
            let source = ReadSource::open(&fasta)?;
            for read in source {
                self.cancel.checkpoint()?;
                let read = read?;
                match builder.add_read(&read) {
                    Ok(()) => {}
                    Err(PipelineError::ReadTooShort { length, k }) => {
                        warn!(length, k, "skipping read shorter than the k-mer window");
                        summary.reads_skipped += 1;
                    }
                    Err(other) => return Err(other),
                }
            }
            summary.reads_consumed = builder.read_count();
            summary.kmers_processed = builder.kmer_count();
        }
        summary.timings.push(StageTiming {
            stage: "construction",
            duration: started.elapsed(),
        });
        info!(
            reads = summary.reads_consumed,
            skipped = summary.reads_skipped,
            kmers = summary.kmers_processed,
            vertices = kmer_graph.vertex_count(),
            edges = kmer_graph.edge_count(),
            "k-mer graph constructed"
        );
        if self.config.dot_export {
            export_to_file(
                &PathBuf::from(format!("{name}_kmers.dot")),
                &name,
                &kmer_graph,
                EdgeStyle::WeightLabel,
            )?;
        }

        // Stage 2: chain compression (optional).
        if self.config.compress {
            let started = Instant::now();
            let stats = ChainCompressor::new(&mut kmer_graph).compress(&self.cancel)?;
            summary.compression = Some(stats);
            summary.timings.push(StageTiming {
                stage: "compression",
                duration: started.elapsed(),
            });
            if self.config.dot_export {
                export_to_file(
                    &PathBuf::from(format!("{name}_compressed.dot")),
                    &name,
                    &kmer_graph,
                    EdgeStyle::WeightLabel,
                )?;
            }
        }

        // Stage 3: indexing; the label graph is no longer needed after.
        let started = Instant::now();
        let (index, id_graph) = index_graph(&kmer_graph, &self.cancel)?;
        drop(kmer_graph);
        summary.vertex_count = id_graph.vertex_count();
        summary.edge_count = id_graph.edge_count();
        summary.timings.push(StageTiming {
            stage: "indexing",
            duration: started.elapsed(),
        });
        if self.config.dot_export {
            export_to_file(
                &PathBuf::from(format!("{name}_indexed.dot")),
                &name,
                &id_graph,
                EdgeStyle::WeightLabel,
            )?;
        }

        // Optional persistence of the indexed graph.
        if let Some(store_name) = &self.config.store_as {
            let started = Instant::now();
            let mut store = GraphStore::open(&self.config.database)?;
            store.store_graph(store_name, &index, &id_graph)?;
            summary.timings.push(StageTiming {
                stage: "persistence",
                duration: started.elapsed(),
            });
        }

        // Stage 4: strongly connected components.
        let started = Instant::now();
        let forest = find_sccs(&id_graph, &self.cancel)?;
        summary.timings.push(StageTiming {
            stage: "scc",
            duration: started.elapsed(),
        });

        // Stage 5: partitioning; the component list dies here.
        let started = Instant::now();
        let sub_graphs = partition(&id_graph, &forest, &self.cancel)?;
        drop(forest);
        drop(id_graph);
        summary.timings.push(StageTiming {
            stage: "partition",
            duration: started.elapsed(),
        });

        // Stage 6: DAG transformation; sub-graphs die here.
        let started = Instant::now();
        let mut dags = Vec::with_capacity(sub_graphs.len());
        for (i, sub) in sub_graphs.iter().enumerate() {
            dags.push(dagify(sub, format!("dag_{i}"), &self.cancel)?);
        }
        drop(sub_graphs);
        summary.timings.push(StageTiming {
            stage: "dagify",
            duration: started.elapsed(),
        });

        // Stage 7: detection, then translation back to global terms.
        let started = Instant::now();
        let results = detect(
            &dags,
            self.config.algorithm,
            self.config.whole_graph,
            &self.cancel,
        )?;
        summary.superbubbles = translate(&dags, &results, &index)?;
        drop(dags);
        summary.timings.push(StageTiming {
            stage: "detection",
            duration: started.elapsed(),
        });

        info!(
            superbubbles = summary.superbubbles.len(),
            "pipeline finished"
        );
        Ok(summary)
    }

    /// Names of all graphs in the database.
    pub fn list_graphs(&self) -> Result<Vec<String>, PipelineError> {
        GraphStore::open(&self.config.database)?.list()
    }

    /// Removes a stored graph.
    pub fn remove_graph(&self, name: &str) -> Result<(), PipelineError> {
        GraphStore::open(&self.config.database)?.remove(name)
    }

    /// Exports a stored graph to DOT with the requested label kind;
    /// returns the written path.
    pub fn export_stored(
        &self,
        name: &str,
        labels: StoredLabels,
    ) -> Result<PathBuf, PipelineError> {
        let store = GraphStore::open(&self.config.database)?;
        let path = match labels {
            StoredLabels::Kmers => {
                let graph = store.load_kmer_graph(name)?;
                let path = PathBuf::from(format!("{name}_kmers.dot"));
                export_to_file(&path, name, &graph, EdgeStyle::WeightLabel)?;
                path
            }
            StoredLabels::Ids => {
                let graph = store.load_id_graph(name)?;
                let path = PathBuf::from(format!("{name}_indexed.dot"));
                export_to_file(&path, name, &graph, EdgeStyle::WeightLabel)?;
                path
            }
        };
        Ok(path)
    }
}

/// Maps DAG-local endpoints back to global ids and k-mer labels.
fn translate(
    dags: &[DagGraph],
    results: &[DagBubbles],
    index: &KmerIndex,
) -> Result<Vec<ReportedBubble>, PipelineError> {
    let mut reported = Vec::new();
    for (dag, result) in dags.iter().zip(results) {
        for bubble in &result.bubbles {
            reported.push(ReportedBubble {
                dag_name: result.dag_name.clone(),
                entrance: endpoint(dag, bubble.entrance, index)?,
                exit: endpoint(dag, bubble.exit, index)?,
            });
        }
    }
    Ok(reported)
}

fn endpoint(
    dag: &DagGraph,
    local: usize,
    index: &KmerIndex,
) -> Result<BubbleEndpoint, PipelineError> {
    if local == SOURCE {
        return Ok(BubbleEndpoint::Source);
    }
    if local == TERMINAL {
        return Ok(BubbleEndpoint::Terminal);
    }
    let global = dag.global_of_local(local).ok_or_else(|| {
        PipelineError::InternalInconsistency(format!(
            "DAG vertex {local} has no global counterpart"
        ))
    })?;
    Ok(match index.label_of(global) {
        Some(label) => BubbleEndpoint::Kmer {
            id: global,
            label: label.to_string(),
        },
        None => BubbleEndpoint::Id(global),
    })
}
