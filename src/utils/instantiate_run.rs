use chrono::Utc;
use log::info;
use uuid::Uuid;

use crate::models::stats_models::PipelineRunStats;

/// Fresh statistics for a new run: new id, current UTC timestamp, zero counts.
pub fn create_initial_pipeline_run(description: Option<&str>) -> PipelineRunStats {
    let run_id = Uuid::new_v4().to_string();
    info!("Instantiated pipeline run with ID: {}", run_id);

    PipelineRunStats {
        run_id,
        run_timestamp: Utc::now().naive_utc(),
        description: description.map(str::to_string),
        total_raw_records: 0,
        total_canonical_records: 0,
        total_exceptions: 0,
        total_warnings: 0,
        total_blocks: 0,
        largest_block: 0,
        total_candidate_pairs: 0,
        total_matching_pairs: 0,
        total_clusters: 0,
        multi_member_clusters: 0,
        weakly_chained_clusters: 0,
        mapping_time: 0.0,
        blocking_time: 0.0,
        scoring_time: 0.0,
        clustering_time: 0.0,
        total_processing_time: 0.0,
    }
}
