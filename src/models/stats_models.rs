// src/models/stats_models.rs
use chrono::NaiveDateTime;
use serde::Serialize;

/// Counts and timings for one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRunStats {
    pub run_id: String,
    pub run_timestamp: NaiveDateTime,
    pub description: Option<String>,
    pub total_raw_records: usize,
    pub total_canonical_records: usize,
    pub total_exceptions: usize,
    pub total_warnings: usize,
    pub total_blocks: usize,
    pub largest_block: usize,
    pub total_candidate_pairs: usize,
    pub total_matching_pairs: usize,
    pub total_clusters: usize,
    pub multi_member_clusters: usize,
    pub weakly_chained_clusters: usize,
    pub mapping_time: f64,
    pub blocking_time: f64,
    pub scoring_time: f64,
    pub clustering_time: f64,
    pub total_processing_time: f64,
}
