// src/matching/manager.rs - Batch-parallel scoring of candidate pairs
use futures::future::join_all;
use indicatif::MultiProgress;
use std::sync::Arc;

use crate::errors::{DedupeError, DedupeResult};
use crate::matching::scorer::MatchScorer;
use crate::models::core::CanonicalRecord;
use crate::models::matching::{CandidatePair, PairScore};
use crate::utils::get_memory_usage;
use crate::utils::progress_bars::logging::{PipelineStage, StageLogger};
use crate::utils::progress_bars::progress_config::stage_progress_bar;

pub const BATCH_SIZE: usize = 500;

/// Scores `pairs` on the current thread. Pairs pointing outside `records` are skipped.
pub fn score_pairs(
    records: &[CanonicalRecord],
    pairs: &[CandidatePair],
    scorer: &dyn MatchScorer,
    threshold: f64,
) -> Vec<PairScore> {
    pairs
        .iter()
        .filter_map(|&pair| {
            let left = records.get(pair.left())?;
            let right = records.get(pair.right())?;
            Some(scorer.score(pair, left, right, threshold))
        })
        .collect()
}

/// Scores all candidate pairs in batches of `BATCH_SIZE`, running
/// `parallelism` batches at a time on the blocking pool. The result is
/// sorted by pair regardless of completion order.
pub async fn score_candidate_pairs(
    records: Arc<Vec<CanonicalRecord>>,
    pairs: Vec<CandidatePair>,
    scorer: Arc<dyn MatchScorer>,
    threshold: f64,
    parallelism: usize,
    multi_progress: Option<MultiProgress>,
) -> DedupeResult<Vec<PairScore>> {
    let logger = StageLogger::new(PipelineStage::Scoring);
    let parallelism = parallelism.max(1);
    let total_pairs = pairs.len();
    let total_batches = total_pairs.div_ceil(BATCH_SIZE);
    let wave_size = BATCH_SIZE * parallelism;
    let total_waves = total_pairs.div_ceil(wave_size);

    logger.log_batch_processing_start(total_pairs, BATCH_SIZE);
    logger.log_debug(&format!("Scorer: {}, threshold {:.3}", scorer.name(), threshold));

    let batch_pb = stage_progress_bar(
        multi_progress.as_ref(),
        total_batches as u64,
        "👤",
        "Scoring candidate pairs...",
    );

    let mut scores = Vec::with_capacity(total_pairs);
    for (wave_idx, wave) in pairs.chunks(wave_size).enumerate() {
        let mut batch_futures = Vec::new();
        for batch in wave.chunks(BATCH_SIZE) {
            let batch = batch.to_vec();
            let records = Arc::clone(&records);
            let scorer = Arc::clone(&scorer);
            batch_futures.push(tokio::task::spawn_blocking(move || {
                score_pairs(&records, &batch, scorer.as_ref(), threshold)
            }));
        }

        let results = join_all(batch_futures).await;
        batch_pb.inc(results.len() as u64);
        for result in results {
            match result {
                Ok(batch_scores) => scores.extend(batch_scores),
                Err(e) => {
                    logger.log_warning(&format!("Scoring batch task failed: {}", e));
                    batch_pb.abandon_with_message("Scoring aborted");
                    return Err(DedupeError::Worker(e.to_string()));
                }
            }
        }

        logger.log_batch_progress(wave_idx + 1, total_waves, wave.len());
        if wave_idx % 5 == 0 {
            let current_memory = get_memory_usage().await;
            batch_pb.set_message(format!(
                "Scoring batches... (Memory: {} MB, Pairs: {})",
                current_memory,
                scores.len()
            ));
        }
    }

    batch_pb.finish_with_message("Pair scoring complete");
    scores.sort_by_key(|s| s.pair);
    Ok(scores)
}
