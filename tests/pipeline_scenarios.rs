//! End-to-end pipeline scenarios over literal FASTA inputs
//!
//! Each test drives the public pipeline API the way the binary does:
//! temp FASTA in, counters, graphs, database state and superbubble
//! reports out.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use tempfile::{NamedTempFile, TempDir};

use bubble_forge::algorithm::superbubble::SbAlgorithm;
use bubble_forge::io::database::GraphStore;
use bubble_forge::pipeline::{BubbleEndpoint, PipelineRunner, StoredLabels};
use bubble_forge::utils::configuration::PipelineConfig;

fn fasta_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn base_config(fasta: &Path, k: usize) -> PipelineConfig {
    PipelineConfig {
        fasta: Some(fasta.to_path_buf()),
        k: Some(k),
        ..Default::default()
    }
}

#[test]
fn overlapping_reads_build_the_expected_weighted_graph() -> Result<()> {
    // Reads ATGCA and TGCAA at k = 3 share the TGC -> GCA edge.
    let file = fasta_file(">r1\nATGCA\n>r2\nTGCAA\n");
    let config = base_config(file.path(), 3);
    let summary = PipelineRunner::new(config)?.run()?;

    assert_eq!(summary.reads_consumed, 2);
    assert_eq!(summary.kmers_processed, 6);
    assert_eq!(summary.vertex_count, 4);
    assert_eq!(summary.edge_count, 4);
    assert!(summary.superbubbles.is_empty());
    Ok(())
}

#[test]
fn mismatched_weights_leave_compression_a_no_op() -> Result<()> {
    // TGC carries weight 1 in and 2 out, which blocks the whole chain.
    let file = fasta_file(">r1\nATGCA\n>r2\nTGCAA\n");
    let mut config = base_config(file.path(), 3);
    config.compress = true;
    let summary = PipelineRunner::new(config)?.run()?;

    let stats = summary.compression.expect("compression stage ran");
    assert_eq!(stats.chains_merged, 0);
    assert_eq!(stats.vertices_removed, 0);
    assert_eq!(summary.vertex_count, 4);
    assert_eq!(summary.edge_count, 4);
    Ok(())
}

#[test]
fn homopolymer_self_loop_survives_compression() -> Result<()> {
    // AAAAA at k = 3 is a single AAA vertex with a weight-2 self-loop.
    let file = fasta_file(">r1\nAAAAA\n");
    let mut config = base_config(file.path(), 3);
    config.compress = true;
    let summary = PipelineRunner::new(config)?.run()?;

    let stats = summary.compression.expect("compression stage ran");
    assert_eq!(stats.chains_merged, 0);
    assert_eq!(summary.vertex_count, 1);
    assert_eq!(summary.edge_count, 2);
    assert!(summary.superbubbles.is_empty());
    Ok(())
}

#[test]
fn compressible_chain_collapses_before_detection() -> Result<()> {
    // A single read is one long unary chain.
    let file = fasta_file(">r1\nATGCATT\n");
    let mut config = base_config(file.path(), 3);
    config.compress = true;
    let summary = PipelineRunner::new(config)?.run()?;

    let stats = summary.compression.expect("compression stage ran");
    assert_eq!(stats.chains_merged, 1);
    assert_eq!(summary.vertex_count, 1);
    assert_eq!(summary.edge_count, 0);
    Ok(())
}

#[test]
fn allele_split_reads_report_one_superbubble() -> Result<()> {
    // Two reads that agree on a prefix and suffix but differ in the
    // middle base fork and rejoin: a textbook bubble.
    let file = fasta_file(">a\nAATCGAA\n>b\nAATGGAA\n");
    let config = base_config(file.path(), 3);
    let summary = PipelineRunner::new(config)?.run()?;

    assert_eq!(summary.superbubbles.len(), 1);
    let bubble = &summary.superbubbles[0];
    match (&bubble.entrance, &bubble.exit) {
        (
            BubbleEndpoint::Kmer { label: entrance, .. },
            BubbleEndpoint::Kmer { label: exit, .. },
        ) => {
            assert_eq!(entrance, "AAT");
            assert_eq!(exit, "GAA");
        }
        other => panic!("expected k-mer endpoints, got {other:?}"),
    }
    Ok(())
}

#[test]
fn empty_input_completes_cleanly() -> Result<()> {
    let file = fasta_file("");
    let summary = PipelineRunner::new(base_config(file.path(), 3))?.run()?;
    assert_eq!(summary.reads_consumed, 0);
    assert_eq!(summary.vertex_count, 0);
    assert!(summary.superbubbles.is_empty());
    Ok(())
}

#[test]
fn reads_shorter_than_k_are_skipped_not_fatal() -> Result<()> {
    let file = fasta_file(">r1\nATGCA\n>r2\nATGCATTAGA\n");
    let summary = PipelineRunner::new(base_config(file.path(), 6))?.run()?;
    assert_eq!(summary.reads_consumed, 1);
    assert_eq!(summary.reads_skipped, 1);
    Ok(())
}

#[test]
fn stored_graphs_round_trip_through_the_database() -> Result<()> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("graphs.db");
    let file = fasta_file(">r1\nATGCA\n>r2\nTGCAA\n");

    let mut config = base_config(file.path(), 3);
    config.database = db_path.clone();
    config.store_as = Some("scenario".to_string());
    PipelineRunner::new(config.clone())?.run()?;

    let store = GraphStore::open(&db_path)?;
    assert!(store.exists("scenario")?);
    assert_eq!(store.list()?, vec!["scenario".to_string()]);

    let kmer_graph = store.load_kmer_graph("scenario")?;
    assert_eq!(kmer_graph.vertex_count(), 4);
    assert_eq!(
        kmer_graph
            .weight_of(&"TGC".to_string(), &"GCA".to_string())
            .unwrap(),
        2
    );
    let id_graph = store.load_id_graph("scenario")?;
    assert_eq!(id_graph.edge_count(), 4);

    // A second run under the same name must refuse to overwrite.
    assert!(PipelineRunner::new(config)?.run().is_err());
    Ok(())
}

#[test]
fn database_maintenance_list_and_remove() -> Result<()> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("graphs.db");
    let file = fasta_file(">r1\nATGCA\n");

    let mut config = base_config(file.path(), 3);
    config.database = db_path.clone();
    config.store_as = Some("g1".to_string());
    PipelineRunner::new(config)?.run()?;

    let maintenance = PipelineRunner::new(PipelineConfig {
        database: db_path,
        ..Default::default()
    })?;
    assert_eq!(maintenance.list_graphs()?, vec!["g1".to_string()]);
    maintenance.remove_graph("g1")?;
    assert!(maintenance.list_graphs()?.is_empty());
    assert!(maintenance.remove_graph("g1").is_err());
    Ok(())
}

#[test]
fn dot_exports_appear_for_every_stage() -> Result<()> {
    let dir = TempDir::new()?;
    // DOT files land in the working directory, exactly like the binary.
    std::env::set_current_dir(dir.path())?;
    let file = fasta_file(">r1\nATGCA\n>r2\nTGCAA\n");

    let mut config = base_config(file.path(), 3);
    config.database = dir.path().join("graphs.db");
    config.dot_export = true;
    config.compress = true;
    config.store_as = Some("dots".to_string());
    PipelineRunner::new(config)?.run()?;

    for suffix in ["kmers", "compressed", "indexed"] {
        let path = dir.path().join(format!("dots_{suffix}.dot"));
        let text = std::fs::read_to_string(&path)?;
        assert!(text.starts_with("digraph dots {"), "{suffix} export");
    }

    let maintenance = PipelineRunner::new(PipelineConfig {
        database: dir.path().join("graphs.db"),
        ..Default::default()
    })?;
    let exported = maintenance.export_stored("dots", StoredLabels::Ids)?;
    assert!(dir.path().join(exported).exists());
    Ok(())
}

#[test]
fn all_three_detectors_agree_end_to_end() -> Result<()> {
    let content = ">a\nAATCGAA\n>b\nAATGGAA\n>c\nGAATTC\n";
    let mut reports = Vec::new();
    for algorithm in [
        SbAlgorithm::QuasiLinear,
        SbAlgorithm::NLogN,
        SbAlgorithm::Quadratic,
    ] {
        let file = fasta_file(content);
        let mut config = base_config(file.path(), 3);
        config.algorithm = algorithm;
        let summary = PipelineRunner::new(config)?.run()?;
        reports.push(summary.superbubbles);
    }
    assert_eq!(reports[0], reports[1]);
    assert_eq!(reports[1], reports[2]);
    Ok(())
}
