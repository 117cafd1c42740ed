// src/utils/progress_bars/logging.rs - Tagged logging helpers for pipeline stages
use log::{debug, info, warn};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Mapping,
    Blocking,
    Scoring,
    Clustering,
    Emitting,
}

impl PipelineStage {
    pub fn tag(&self) -> (&'static str, &'static str) {
        match self {
            PipelineStage::Mapping => ("MAPPING", "🗂️"),
            PipelineStage::Blocking => ("BLOCKING", "🧱"),
            PipelineStage::Scoring => ("SCORING", "👤"),
            PipelineStage::Clustering => ("CLUSTERING", "🔗"),
            PipelineStage::Emitting => ("EMITTING", "📝"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StageLogger {
    stage_name: &'static str,
    stage_emoji: &'static str,
    start_time: Instant,
}

impl StageLogger {
    pub fn new(stage: PipelineStage) -> Self {
        let (stage_name, stage_emoji) = stage.tag();
        Self {
            stage_name,
            stage_emoji,
            start_time: Instant::now(),
        }
    }

    pub fn log_start(&self, run_id: &str, input_count: usize, input_kind: &str) {
        info!(
            "[{}] {} 🚀 Starting {} for {} {} (run ID: {})",
            self.stage_name,
            self.stage_emoji,
            self.stage_name.to_lowercase(),
            input_count,
            input_kind,
            run_id
        );
    }

    pub fn log_phase(&self, phase: &str, details: Option<&str>) {
        let elapsed = self.start_time.elapsed().as_secs_f32();
        match details {
            Some(details) => info!(
                "[{}] {} 🔄 Phase: {} - {} [+{:.1}s]",
                self.stage_name, self.stage_emoji, phase, details, elapsed
            ),
            None => info!(
                "[{}] {} 🔄 Phase: {} [+{:.1}s]",
                self.stage_name, self.stage_emoji, phase, elapsed
            ),
        }
    }

    pub fn log_batch_processing_start(&self, total_pairs: usize, batch_size: usize) {
        let batch_count = total_pairs.div_ceil(batch_size.max(1));
        info!(
            "[{}] {} ⚙️  Processing {} pairs in {} batches (batch size: {})",
            self.stage_name, self.stage_emoji, total_pairs, batch_count, batch_size
        );
    }

    pub fn log_batch_progress(&self, batch_num: usize, total_batches: usize, pairs_in_batch: usize) {
        if batch_num % 5 == 0 || batch_num == 1 || batch_num == total_batches {
            info!(
                "[{}] {} 📦 Processed batch wave {}/{} ({} pairs)",
                self.stage_name, self.stage_emoji, batch_num, total_batches, pairs_in_batch
            );
        }
    }

    pub fn log_data_quality_issue(&self, issue_type: &str, count: usize) {
        if count > 0 {
            warn!(
                "[{}] {} ⚠️  Data quality: {} instances of {}",
                self.stage_name, self.stage_emoji, count, issue_type
            );
        }
    }

    /// Final line for the stage, with its wall time.
    pub fn log_completion(&self, summary: &str) {
        info!(
            "[{}] {} 🎉 COMPLETED in {:.2?}: {}",
            self.stage_name,
            self.stage_emoji,
            self.start_time.elapsed(),
            summary
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!("[{}] {} ⚠️  {}", self.stage_name, self.stage_emoji, message);
    }

    pub fn log_debug(&self, message: &str) {
        debug!("[{}] {} {}", self.stage_name, self.stage_emoji, message);
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_tags_are_distinct() {
        let stages = [
            PipelineStage::Mapping,
            PipelineStage::Blocking,
            PipelineStage::Scoring,
            PipelineStage::Clustering,
            PipelineStage::Emitting,
        ];
        let mut names: Vec<_> = stages.iter().map(|s| s.tag().0).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), stages.len());
    }
}
