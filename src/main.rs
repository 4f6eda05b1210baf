use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use bubble_forge::cli::Cli;
use bubble_forge::core::errors::PipelineError;
use bubble_forge::pipeline::{PipelineRunner, StoredLabels};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            let code = err
                .downcast_ref::<PipelineError>()
                .map(PipelineError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let list = cli.list;
    let remove = cli.remove.clone();
    let export_kmers = cli.dot_kmers.clone();
    let export_ids = cli.dot_ids.clone();

    let config = cli.into_config().context("invalid configuration")?;
    let run_pipeline = config.fasta.is_some();
    let runner = PipelineRunner::new(config)?;

    // Database maintenance can run on its own or ahead of a pipeline run.
    let mut acted = false;
    if let Some(name) = remove {
        runner.remove_graph(&name)?;
        println!("removed graph `{name}`");
        acted = true;
    }
    if list {
        for name in runner.list_graphs()? {
            println!("{name}");
        }
        acted = true;
    }
    if let Some(name) = export_kmers {
        let path = runner.export_stored(&name, StoredLabels::Kmers)?;
        println!("exported {}", path.display());
        acted = true;
    }
    if let Some(name) = export_ids {
        let path = runner.export_stored(&name, StoredLabels::Ids)?;
        println!("exported {}", path.display());
        acted = true;
    }

    if run_pipeline {
        let summary = runner.run()?;
        println!(
            "{} reads parsed ({} skipped), {} k-mers processed",
            summary.reads_consumed, summary.reads_skipped, summary.kmers_processed
        );
        if let Some(stats) = summary.compression {
            println!(
                "compression: {} chains merged, {} vertices removed",
                stats.chains_merged, stats.vertices_removed
            );
        }
        println!(
            "{} nodes and {} edges in the indexed graph",
            summary.vertex_count, summary.edge_count
        );
        println!("{} superbubbles found", summary.superbubbles.len());
        for bubble in &summary.superbubbles {
            println!("  {} {}", bubble.dag_name, bubble);
        }
    } else if !acted {
        return Err(PipelineError::BadInput(
            "nothing to do: pass a FASTA input (-f) or a database command (-l, -r, --dk, --di)"
                .into(),
        )
        .into());
    }
    Ok(())
}
