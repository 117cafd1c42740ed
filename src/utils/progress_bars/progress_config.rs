// src/utils/progress_bars/progress_config.rs

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::env;

/// Progress bar settings for a pipeline run.
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Whether to show progress bars at all
    pub enabled: bool,
    /// Whether the scoring stage shows its per-batch bar
    pub detailed: bool,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            detailed: true,
        }
    }
}

fn env_flag(var: &str, default: bool) -> bool {
    env::var(var)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl ProgressConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: env_flag("PROGRESS_ENABLED", true),
            detailed: env_flag("PROGRESS_DETAILED", true),
        }
    }

    /// A MultiProgress when bars are enabled.
    pub fn create_multi_progress(&self) -> Option<MultiProgress> {
        if self.enabled {
            Some(MultiProgress::new())
        } else {
            None
        }
    }

    /// The MultiProgress handed to detailed (per-batch) bars, if any.
    pub fn detailed_progress(&self, multi_progress: &Option<MultiProgress>) -> Option<MultiProgress> {
        if self.detailed {
            multi_progress.clone()
        } else {
            None
        }
    }
}

/// Bar attached to `multi_progress`, or a hidden bar when progress is off.
pub fn stage_progress_bar(
    multi_progress: Option<&MultiProgress>,
    len: u64,
    emoji: &str,
    message: &str,
) -> ProgressBar {
    let Some(mp) = multi_progress else {
        return ProgressBar::hidden();
    };
    let pb = mp.add(ProgressBar::new(len));
    let template = format!(
        "  {} [{{elapsed_precise}}] {{bar:30.green/blue}} {{pos}}/{{len}} {{msg}}",
        emoji
    );
    match ProgressStyle::default_bar().template(&template) {
        Ok(style) => pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏  ")),
        Err(e) => log::debug!("Progress template rejected: {}", e),
    }
    pb.set_message(message.to_string());
    pb
}
