// src/pipeline.rs
//! Runs the stages in order: map and normalize, block, score, cluster, emit.

use indicatif::MultiProgress;
use log::info;
use std::collections::BTreeSet;
use std::fs;
use std::sync::Arc;
use std::time::Instant;

use crate::blocking::{block, candidate_pairs, summarize_blocks};
use crate::clustering::resolve_clusters;
use crate::errors::{ConfigurationError, DedupeResult, NormalizationWarning, SchemaMismatchError};
use crate::ingestion::ingest_batches;
use crate::matching::manager::score_candidate_pairs;
use crate::matching::scorer::{LogisticScorer, MatchScorer, WeightedScorer};
use crate::models::cluster::Cluster;
use crate::models::core::{CanonicalRecord, RawRecord, RecordKey, SourceBatch};
use crate::models::matching::PairScore;
use crate::models::stats_models::PipelineRunStats;
use crate::output::{
    emit, emit_exceptions, emit_pair_scores, summarize_clusters, ClusterSummaryRow,
    DedupeReportRow, ExceptionRow, PairScoreRow,
};
use crate::schema::SchemaRegistry;
use crate::utils::config::MatchingConfig;
use crate::utils::instantiate_run::create_initial_pipeline_run;
use crate::utils::progress_bars::logging::{PipelineStage, StageLogger};

/// A normalization warning tied to the record it was raised on.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordWarning {
    pub key: RecordKey,
    pub warning: NormalizationWarning,
}

/// Canonical records, exceptions and warnings from the mapping stage.
#[derive(Debug, Clone, Default)]
pub struct MappedBatch {
    /// Sorted by key; candidate pair indices refer to this order.
    pub records: Vec<CanonicalRecord>,
    pub exceptions: Vec<SchemaMismatchError>,
    pub warnings: Vec<RecordWarning>,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub records: Vec<CanonicalRecord>,
    pub exceptions: Vec<SchemaMismatchError>,
    pub warnings: Vec<RecordWarning>,
    pub pair_scores: Vec<PairScore>,
    pub clusters: Vec<Cluster>,
    pub report: Vec<DedupeReportRow>,
    pub stats: PipelineRunStats,
}

impl PipelineOutput {
    pub fn exception_rows(&self) -> Vec<ExceptionRow> {
        emit_exceptions(&self.exceptions)
    }

    pub fn cluster_summary(&self) -> Vec<ClusterSummaryRow> {
        summarize_clusters(&self.clusters)
    }

    pub fn pair_score_rows(&self) -> Vec<PairScoreRow> {
        emit_pair_scores(&self.records, &self.pair_scores)
    }
}

/// Maps every raw record through its source schema. Mismatches go to the
/// exceptions list; a repeated id within a source keeps its first occurrence.
pub fn map_and_normalize(raw_records: &[RawRecord], registry: &SchemaRegistry) -> MappedBatch {
    let mut mapped = MappedBatch::default();
    let mut seen: BTreeSet<RecordKey> = BTreeSet::new();

    for raw in raw_records {
        let normalized = match registry.map_record(raw) {
            Ok(normalized) => normalized,
            Err(e) => {
                mapped.exceptions.push(e);
                continue;
            }
        };
        let key = normalized.record.key.clone();
        if !seen.insert(key.clone()) {
            let id_field = registry
                .get(&key.source)
                .map(|s| s.id_field.clone())
                .unwrap_or_else(|| "id".to_string());
            let rejected = RecordKey::new(
                &key.source,
                format!("{}#row{}", key.source_record_id, raw.row_number),
            );
            mapped.exceptions.push(SchemaMismatchError::new(
                rejected,
                id_field,
                format!(
                    "duplicate id '{}' within source; the first row with this id is kept",
                    key.source_record_id
                ),
            ));
            continue;
        }
        mapped.warnings.extend(normalized.warnings.into_iter().map(|warning| RecordWarning {
            key: key.clone(),
            warning,
        }));
        mapped.records.push(normalized.record);
    }

    mapped.records.sort_by(|a, b| a.key.cmp(&b.key));
    mapped.exceptions.sort_by(|a, b| a.key.cmp(&b.key));
    mapped.warnings.sort_by(|a, b| a.key.cmp(&b.key));
    mapped
}

/// The scorer `config` asks for: a logistic model loaded from
/// `scorer_model_path`, or the weighted scorer over `config.weights`.
pub fn build_scorer(config: &MatchingConfig) -> DedupeResult<Arc<dyn MatchScorer>> {
    match &config.scorer_model_path {
        Some(path) => {
            let json = fs::read_to_string(path).map_err(|e| {
                ConfigurationError::InvalidModel(format!("{}: {}", path.display(), e))
            })?;
            let model = LogisticScorer::from_json(&json)?;
            info!(
                "Loaded logistic scorer from {} ({} training updates)",
                path.display(),
                model.trials()
            );
            Ok(Arc::new(model))
        }
        None => Ok(Arc::new(WeightedScorer::new(config.weights))),
    }
}

/// Runs the whole deduplication over `batches`.
///
/// The configuration is validated before any record is touched. Schema
/// mismatches never abort the run; they are returned as exceptions.
pub async fn run_dedupe_pipeline(
    batches: &[SourceBatch],
    config: &MatchingConfig,
    registry: &SchemaRegistry,
    scorer: Arc<dyn MatchScorer>,
    multi_progress: Option<MultiProgress>,
) -> DedupeResult<PipelineOutput> {
    config.validate()?;
    let run_start = Instant::now();
    let mut stats = create_initial_pipeline_run(None);

    // Mapping and normalization
    let logger = StageLogger::new(PipelineStage::Mapping);
    let raw_records = ingest_batches(batches);
    logger.log_start(&stats.run_id, raw_records.len(), "raw records");
    let mapped = map_and_normalize(&raw_records, registry);
    logger.log_data_quality_issue("schema mismatches", mapped.exceptions.len());
    logger.log_data_quality_issue("normalization warnings", mapped.warnings.len());
    for w in &mapped.warnings {
        logger.log_debug(&format!("{}: {}", w.key, w.warning));
    }
    stats.total_raw_records = raw_records.len();
    stats.total_canonical_records = mapped.records.len();
    stats.total_exceptions = mapped.exceptions.len();
    stats.total_warnings = mapped.warnings.len();
    stats.mapping_time = logger.elapsed_secs();
    logger.log_completion(&format!(
        "{} canonical records, {} exceptions",
        mapped.records.len(),
        mapped.exceptions.len()
    ));

    let MappedBatch {
        records,
        exceptions,
        warnings,
    } = mapped;

    // Blocking
    let logger = StageLogger::new(PipelineStage::Blocking);
    logger.log_start(&stats.run_id, records.len(), "records");
    logger.log_phase("Building blocks", Some(config.blocking_strategy.as_str()));
    let blocks = block(&records, config.blocking_strategy);
    let summary = summarize_blocks(&blocks);
    let pairs = candidate_pairs(&blocks);
    logger.log_data_quality_issue("records in fallback blocks", summary.fallback_records);
    stats.total_blocks = summary.total_blocks;
    stats.largest_block = summary.largest_block;
    stats.total_candidate_pairs = pairs.len();
    stats.blocking_time = logger.elapsed_secs();
    logger.log_completion(&format!(
        "{} blocks (largest {}), {} candidate pairs",
        summary.total_blocks,
        summary.largest_block,
        pairs.len()
    ));

    // Scoring
    let logger = StageLogger::new(PipelineStage::Scoring);
    logger.log_start(&stats.run_id, pairs.len(), "candidate pairs");
    let records = Arc::new(records);
    let pair_scores = score_candidate_pairs(
        Arc::clone(&records),
        pairs,
        scorer,
        config.match_threshold,
        config.parallelism,
        multi_progress,
    )
    .await?;
    stats.total_matching_pairs = pair_scores.iter().filter(|s| s.is_match).count();
    stats.scoring_time = logger.elapsed_secs();
    logger.log_completion(&format!(
        "{} of {} pairs at or above {:.3}",
        stats.total_matching_pairs,
        pair_scores.len(),
        config.match_threshold
    ));

    // Clustering
    let logger = StageLogger::new(PipelineStage::Clustering);
    logger.log_start(&stats.run_id, records.len(), "records");
    let clusters = resolve_clusters(
        &records,
        &pair_scores,
        config.match_threshold,
        config.weak_link_margin,
    );
    stats.total_clusters = clusters.len();
    stats.multi_member_clusters = clusters.iter().filter(|c| !c.is_singleton()).count();
    stats.weakly_chained_clusters = clusters.iter().filter(|c| c.confidence.weak_chaining).count();
    logger.log_data_quality_issue("weakly chained clusters", stats.weakly_chained_clusters);
    stats.clustering_time = logger.elapsed_secs();
    logger.log_completion(&format!(
        "{} clusters, {} with 2+ records",
        stats.total_clusters, stats.multi_member_clusters
    ));

    // Emitting
    let logger = StageLogger::new(PipelineStage::Emitting);
    let report = emit(&clusters);
    logger.log_completion(&format!("{} report rows", report.len()));

    stats.total_processing_time = run_start.elapsed().as_secs_f64();
    let records = Arc::try_unwrap(records).unwrap_or_else(|shared| (*shared).clone());

    Ok(PipelineOutput {
        records,
        exceptions,
        warnings,
        pair_scores,
        clusters,
        report,
        stats,
    })
}
