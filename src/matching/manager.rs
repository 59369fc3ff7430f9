// src/matching/manager.rs - Two-stage pipeline coordination and run summary
use chrono::Utc;
use log::{info, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::error::{MatchError, MatchResult};
use crate::matching::sfdc_sap::{match_sfdc_to_sap, SfdcSapConfig};
use crate::matching::top_sfdc::{match_top_to_sfdc, TopSfdcConfig};
use crate::matching::{validate_threshold, StageContext};
use crate::models::core::{SapColumns, SfdcColumns, Table};
use crate::models::matching::{Decision, MatchTables, SfdcMatch};
use crate::models::stats_models::{MatchStage, RunSummary};
use crate::utils::constants::{
    DEFAULT_SFDC_SAP_THRESHOLD, DEFAULT_TOP_COLUMN, DEFAULT_TOP_HEADER_ROW,
    DEFAULT_TOP_SFDC_THRESHOLD,
};
use crate::utils::get_memory_usage;
use crate::utils::progress_bars::logging::{
    log_pipeline_completion, log_pipeline_phase, log_pipeline_start,
};

/// Run configuration. Every field has a default so partial JSON files work.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub top_sfdc_threshold: f64,
    pub sfdc_sap_threshold: f64,
    pub top_column: String,
    /// Rows above the Top header row.
    pub top_header_row: usize,
    pub sfdc_columns: SfdcColumns,
    pub sap_columns: SapColumns,
    /// 0 means one worker per CPU.
    pub worker_threads: usize,
    pub timeout_secs: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_sfdc_threshold: DEFAULT_TOP_SFDC_THRESHOLD,
            sfdc_sap_threshold: DEFAULT_SFDC_SAP_THRESHOLD,
            top_column: DEFAULT_TOP_COLUMN.to_string(),
            top_header_row: DEFAULT_TOP_HEADER_ROW,
            sfdc_columns: SfdcColumns::default(),
            sap_columns: SapColumns::default(),
            worker_threads: 0,
            timeout_secs: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_file(path: &Path) -> MatchResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| MatchError::Parse(format!("config {}: {}", path.display(), e)))
    }

    /// Overlays `TOP_SFDC_THRESHOLD`, `SFDC_SAP_THRESHOLD`,
    /// `MATCH_WORKER_THREADS` and `MATCH_TIMEOUT_SECS` when set.
    pub fn apply_env(&mut self) {
        if let Some(v) = env_value("TOP_SFDC_THRESHOLD") {
            self.top_sfdc_threshold = v;
        }
        if let Some(v) = env_value("SFDC_SAP_THRESHOLD") {
            self.sfdc_sap_threshold = v;
        }
        if let Some(v) = env_value("MATCH_WORKER_THREADS") {
            self.worker_threads = v;
        }
        if let Some(v) = env_value("MATCH_TIMEOUT_SECS") {
            self.timeout_secs = Some(v);
        }
    }

    pub fn validate(&self) -> MatchResult<()> {
        validate_threshold(MatchStage::TopToSfdc, self.top_sfdc_threshold)?;
        validate_threshold(MatchStage::SfdcToSap, self.sfdc_sap_threshold)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn top_sfdc_config(&self) -> TopSfdcConfig {
        TopSfdcConfig {
            threshold: self.top_sfdc_threshold,
            top_column: self.top_column.clone(),
            sfdc_columns: self.sfdc_columns.clone(),
        }
    }

    pub fn sfdc_sap_config(&self) -> SfdcSapConfig {
        SfdcSapConfig {
            threshold: self.sfdc_sap_threshold,
            sap_columns: self.sap_columns.clone(),
        }
    }
}

fn env_value<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid value", key, raw);
            None
        }
    }
}

/// Input tables of one run. Without a SAP table the run stops after Stage1.
#[derive(Debug, Clone, Default)]
pub struct PipelineInputs {
    pub top: Table,
    pub sfdc: Table,
    pub sap: Option<Table>,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub stage1: Vec<SfdcMatch>,
    pub tables: MatchTables,
    pub summary: RunSummary,
}

pub fn run_account_matching_pipeline(
    inputs: &PipelineInputs,
    config: &PipelineConfig,
    ctx: &StageContext,
) -> MatchResult<PipelineOutput> {
    let start_time = Instant::now();
    let run_id = Uuid::new_v4().to_string();
    let run_timestamp = Utc::now().to_rfc3339();

    // both thresholds are checked before any stage runs
    config.validate()?;
    if let Some(sap) = &inputs.sap {
        config.sap_columns.require_in(sap)?;
    }
    log_pipeline_start(&run_id, rayon::current_num_threads(), config.timeout());

    log_pipeline_phase("Top→SFDC", Some("matching Top names to SFDC accounts"));
    let (stage1, stage1_stats) =
        match_top_to_sfdc(&inputs.top, &inputs.sfdc, &config.top_sfdc_config(), ctx)?;

    let (tables, stage2_stats) = match &inputs.sap {
        Some(sap) => {
            log_pipeline_phase("SFDC→SAP", Some("classifying SFDC matches against SAP"));
            let (tables, stats) =
                match_sfdc_to_sap(&stage1, sap, &config.sfdc_sap_config(), ctx)?;
            (tables, Some(stats))
        }
        None => {
            info!("No SAP table supplied, stopping after Top→SFDC");
            (MatchTables::default(), None)
        }
    };

    let mut decisions: BTreeMap<String, usize> = Decision::ALL
        .iter()
        .map(|d| (d.as_str().to_string(), 0))
        .collect();
    for row in tables.auto_matches.iter().chain(tables.manual_review.iter()) {
        *decisions.entry(row.decision.as_str().to_string()).or_default() += 1;
    }

    let summary = RunSummary {
        run_id,
        run_timestamp,
        top_sfdc_threshold: config.top_sfdc_threshold,
        sfdc_sap_threshold: config.sfdc_sap_threshold,
        stage1: stage1_stats,
        stage2: stage2_stats,
        stage1_rows: stage1.len(),
        auto_matches: tables.auto_matches.len(),
        manual_review: tables.manual_review.len(),
        decisions,
        total_duration_secs: start_time.elapsed().as_secs_f64(),
    };
    log_pipeline_completion(&summary, get_memory_usage());

    Ok(PipelineOutput {
        stage1,
        tables,
        summary,
    })
}
