// src/utils/progress_bars/logging.rs - Logging helpers for the matching stages
use log::{debug, info, warn};
use std::time::{Duration, Instant};

use crate::models::stats_models::{MatchStage, RunSummary, StageStats};

#[derive(Clone)]
pub struct StageLogger {
    stage_name: &'static str,
    stage_emoji: &'static str,
    start_time: Instant,
}

impl StageLogger {
    pub fn new(stage: MatchStage) -> Self {
        let (stage_name, stage_emoji) = match stage {
            MatchStage::TopToSfdc => ("TOP→SFDC", "🏷️"),
            MatchStage::SfdcToSap => ("SFDC→SAP", "🔗"),
        };
        Self {
            stage_name,
            stage_emoji,
            start_time: Instant::now(),
        }
    }

    pub fn log_start(&self, threshold: f64, source_rows: usize, target_rows: usize) {
        info!(
            "[{}] {} 🚀 Starting matching: {} source rows against {} target rows (threshold {:.3})",
            self.stage_name, self.stage_emoji, source_rows, target_rows, threshold
        );
    }

    pub fn log_phase(&self, phase: &str, details: Option<&str>) {
        let elapsed = self.start_time.elapsed();
        let msg = if let Some(details) = details {
            format!(
                "[{}] {} 🔄 Phase: {} - {} [+{:.1}s]",
                self.stage_name, self.stage_emoji, phase, details, elapsed.as_secs_f32()
            )
        } else {
            format!(
                "[{}] {} 🔄 Phase: {} [+{:.1}s]",
                self.stage_name, self.stage_emoji, phase, elapsed.as_secs_f32()
            )
        };
        info!("{}", msg);
    }

    pub fn log_filtering_results(&self, total: usize, eligible: usize, reason: &str) {
        let percent_kept = if total > 0 {
            (eligible as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        info!(
            "[{}] {} 🎯 {}: {} total → {} eligible ({:.1}% kept)",
            self.stage_name, self.stage_emoji, reason, total, eligible, percent_kept
        );
    }

    pub fn log_blocks(&self, block_count: usize, indexed: usize, largest_block: usize) {
        info!(
            "[{}] {} 🧱 Block index: {} records in {} blocks (largest block: {})",
            self.stage_name, self.stage_emoji, indexed, block_count, largest_block
        );
    }

    pub fn log_progress_update(&self, current: usize, total: usize, additional_info: Option<&str>) {
        // every 5000 rows, plus every 10% on larger inputs
        let should_log = current % 5000 == 0
            || current == total
            || (total >= 100 && current % (total / 10) == 0);

        if should_log && current > 0 {
            let percent = (current as f64 / total as f64) * 100.0;
            let msg = if let Some(info) = additional_info {
                format!("Progress: {}/{} ({:.1}%) - {}", current, total, percent, info)
            } else {
                format!("Progress: {}/{} ({:.1}%)", current, total, percent)
            };
            debug!("[{}] {} 📊 {}", self.stage_name, self.stage_emoji, msg);
        }
    }

    pub fn log_completion(&self, stats: &StageStats) {
        let duration = self.start_time.elapsed();
        info!(
            "[{}] {} 🎉 COMPLETED: {} rows emitted in {:.2?}",
            self.stage_name, self.stage_emoji, stats.rows_emitted, duration
        );
        info!(
            "[{}] {} 📊 Results: {} pairs compared, {} source rows without candidates",
            self.stage_name, self.stage_emoji, stats.pairs_compared, stats.sources_without_candidates
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!("[{}] {} ⚠️  {}", self.stage_name, self.stage_emoji, message);
    }

    pub fn log_debug(&self, message: &str) {
        debug!("[{}] {} {}", self.stage_name, self.stage_emoji, message);
    }
}

pub fn log_pipeline_start(run_id: &str, worker_threads: usize, deadline: Option<Duration>) {
    info!("🚀 Starting account matching pipeline (run ID: {})", run_id);
    info!(
        "⚙️  Configuration: {} worker threads, deadline: {}",
        worker_threads,
        deadline.map_or("none".to_string(), |d| format!("{:?}", d))
    );
}

pub fn log_pipeline_phase(phase: &str, details: Option<&str>) {
    if let Some(details) = details {
        info!("🔄 Pipeline phase: {} - {}", phase, details);
    } else {
        info!("🔄 Pipeline phase: {}", phase);
    }
}

pub fn log_pipeline_completion(summary: &RunSummary, memory_mb: u64) {
    info!(
        "🎉 Pipeline {} completed in {:.2}s",
        summary.run_id, summary.total_duration_secs
    );
    info!(
        "📊 Stage1 rows: {}, auto-matched: {}, manual review: {}",
        summary.stage1_rows, summary.auto_matches, summary.manual_review
    );
    for (decision, count) in &summary.decisions {
        info!("   {}: {}", decision, count);
    }
    debug!("Memory usage at completion: {} MB", memory_mb);
}
