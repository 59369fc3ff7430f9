// src/models/stats_models.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStage {
    TopToSfdc,
    SfdcToSap,
}

impl MatchStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStage::TopToSfdc => "Top→SFDC",
            MatchStage::SfdcToSap => "SFDC→SAP",
        }
    }
}

/// Per-stage counters reported in the run summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageStats {
    pub source_rows: usize,
    pub target_rows: usize,
    /// Target rows left after the language filter (and dedup, for SAP).
    pub target_rows_eligible: usize,
    pub blocks: usize,
    pub pairs_compared: usize,
    pub rows_emitted: usize,
    /// Source rows that produced no output row at all.
    pub sources_without_candidates: usize,
    pub duration_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub run_timestamp: String,
    pub top_sfdc_threshold: f64,
    pub sfdc_sap_threshold: f64,
    pub stage1: StageStats,
    pub stage2: Option<StageStats>,
    pub stage1_rows: usize,
    pub auto_matches: usize,
    pub manual_review: usize,
    /// Emitted row count per decision label.
    pub decisions: BTreeMap<String, usize>,
    pub total_duration_secs: f64,
}
