use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::info;
use std::fs;
use std::path::PathBuf;

use dedupe_lib::blocking::BlockingStrategy;
use dedupe_lib::ingestion::read_batch_file;
use dedupe_lib::models::core::SourceBatch;
use dedupe_lib::output::write_csv_file;
use dedupe_lib::pipeline::{build_scorer, run_dedupe_pipeline};
use dedupe_lib::schema::SchemaRegistry;
use dedupe_lib::utils::config::MatchingConfig;
use dedupe_lib::utils::env::load_env;
use dedupe_lib::utils::get_memory_usage;
use dedupe_lib::utils::progress_bars::progress_config::ProgressConfig;

#[derive(Parser)]
#[command(author, version, about = "Cluster probable duplicate patient records across sources", long_about = None)]
struct Cli {
    /// Input batch as SOURCE=PATH (.csv or .json); repeat per source
    #[arg(long = "batch", value_name = "SOURCE=PATH", required = true)]
    batches: Vec<String>,

    /// Directory the CSV tables are written to
    #[arg(long, default_value = "dedupe_output")]
    output_dir: PathBuf,

    /// Match threshold, overriding DEDUPE_MATCH_THRESHOLD
    #[arg(long)]
    threshold: Option<f64>,

    /// Blocking strategy: soundex_birth_year, extended or exhaustive
    #[arg(long)]
    blocking: Option<BlockingStrategy>,

    /// Scoring batches in flight at once
    #[arg(long)]
    parallelism: Option<usize>,

    /// JSON logistic model replacing the weighted scorer
    #[arg(long)]
    scorer_model: Option<PathBuf>,

    /// JSON array of extra source schemas
    #[arg(long)]
    schemas: Option<PathBuf>,

    /// Also write every scored pair to pair_scores.csv
    #[arg(long)]
    audit_pairs: bool,

    /// Free-text note stored with the run statistics
    #[arg(long)]
    description: Option<String>,
}

fn parse_batch_arg(arg: &str) -> Result<(String, PathBuf)> {
    let (source, path) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("--batch expects SOURCE=PATH, got '{}'", arg))?;
    let source = source.trim();
    if source.is_empty() || path.trim().is_empty() {
        return Err(anyhow!("--batch expects SOURCE=PATH, got '{}'", arg));
    }
    Ok((source.to_string(), PathBuf::from(path.trim())))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    info!("Starting patient record deduplication");
    load_env();

    let cli = Cli::parse();

    let mut config = MatchingConfig::from_env().context("Invalid matching configuration in environment")?;
    if let Some(threshold) = cli.threshold {
        config.match_threshold = threshold;
    }
    if let Some(strategy) = cli.blocking {
        config.blocking_strategy = strategy;
    }
    if let Some(parallelism) = cli.parallelism {
        config.parallelism = parallelism;
    }
    if let Some(path) = cli.scorer_model.clone() {
        config.scorer_model_path = Some(path);
    }
    config.validate().context("Invalid matching configuration")?;
    config.log_config();

    let progress_config = ProgressConfig::from_env();
    info!(
        "Progress tracking: enabled={}, detailed={}",
        progress_config.enabled, progress_config.detailed
    );
    let multi_progress = progress_config.create_multi_progress();

    let mut registry = SchemaRegistry::with_builtin_sources();
    if let Some(path) = &cli.schemas {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema file {}", path.display()))?;
        let added = registry
            .extend_from_json(&json)
            .with_context(|| format!("Invalid schema file {}", path.display()))?;
        info!("Registered {} schemas from {}", added, path.display());
    }

    let mut batches: Vec<SourceBatch> = Vec::with_capacity(cli.batches.len());
    for arg in &cli.batches {
        let (source, path) = parse_batch_arg(arg)?;
        let batch = read_batch_file(&source, &path)
            .with_context(|| format!("Failed to load batch {}", path.display()))?;
        batches.push(batch);
    }

    let scorer = build_scorer(&config).context("Failed to build scorer")?;
    let mut output = run_dedupe_pipeline(
        &batches,
        &config,
        &registry,
        scorer,
        progress_config.detailed_progress(&multi_progress),
    )
    .await
    .context("Deduplication pipeline failed")?;
    output.stats.description = cli.description.clone();

    fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("Failed to create {}", cli.output_dir.display()))?;
    let out = |name: &str| cli.output_dir.join(name);

    write_csv_file(&out("dedupe_report.csv"), &output.report)
        .context("Failed to write dedupe report")?;
    write_csv_file(&out("exceptions.csv"), &output.exception_rows())
        .context("Failed to write exceptions")?;
    write_csv_file(&out("cluster_summary.csv"), &output.cluster_summary())
        .context("Failed to write cluster summary")?;
    if cli.audit_pairs {
        write_csv_file(&out("pair_scores.csv"), &output.pair_score_rows())
            .context("Failed to write pair scores")?;
    }
    fs::write(
        out("run_stats.json"),
        serde_json::to_string_pretty(&output.stats)?,
    )
    .context("Failed to write run statistics")?;

    let stats = &output.stats;
    info!("=== Pipeline Summary ===");
    info!("Run ID: {}", stats.run_id);
    info!(
        "Records: {} raw, {} canonical, {} exceptions, {} warnings",
        stats.total_raw_records, stats.total_canonical_records, stats.total_exceptions, stats.total_warnings
    );
    info!(
        "Blocking: {} blocks (largest {}), {} candidate pairs",
        stats.total_blocks, stats.largest_block, stats.total_candidate_pairs
    );
    info!(
        "Clusters: {} total, {} with 2+ records, {} weakly chained",
        stats.total_clusters, stats.multi_member_clusters, stats.weakly_chained_clusters
    );
    info!("=== Timing Breakdown ===");
    info!("Mapping: {:.2}s", stats.mapping_time);
    info!("Blocking: {:.2}s", stats.blocking_time);
    info!("Scoring: {:.2}s", stats.scoring_time);
    info!("Clustering: {:.2}s", stats.clustering_time);
    info!("Total execution time: {:.2}s", stats.total_processing_time);
    info!("Memory in use: {} MB", get_memory_usage().await);
    info!("Output written to {}", cli.output_dir.display());

    Ok(())
}
