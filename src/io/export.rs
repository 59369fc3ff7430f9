// src/io/export.rs - CSV result tables and the JSON run summary
use anyhow::{Context, Result};
use log::info;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::matching::manager::PipelineOutput;
use crate::models::stats_models::RunSummary;

pub const STAGE1_FILE: &str = "sfdc_matches.csv";
pub const AUTO_MATCHES_FILE: &str = "auto_matches.csv";
pub const MANUAL_REVIEW_FILE: &str = "manual_review.csv";
pub const SUMMARY_FILE: &str = "run_summary.json";

/// Writes one CSV row per record, headers taken from the serde field names.
/// An empty slice produces an empty file.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write row to {}", path.display()))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    let file = fs::File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, summary)
        .with_context(|| format!("Failed to write summary to {}", path.display()))?;
    Ok(())
}

/// Writes every table of the run into `out_dir`, creating it if needed.
/// The SFDC→SAP tables are skipped when Stage2 did not run.
pub fn write_outputs(out_dir: &Path, output: &PipelineOutput) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let mut written = Vec::new();

    let stage1_path = out_dir.join(STAGE1_FILE);
    write_csv(&stage1_path, &output.stage1)?;
    written.push(stage1_path);

    if output.summary.stage2.is_some() {
        let auto_path = out_dir.join(AUTO_MATCHES_FILE);
        write_csv(&auto_path, &output.tables.auto_matches)?;
        written.push(auto_path);

        let manual_path = out_dir.join(MANUAL_REVIEW_FILE);
        write_csv(&manual_path, &output.tables.manual_review)?;
        written.push(manual_path);
    }

    let summary_path = out_dir.join(SUMMARY_FILE);
    write_summary(&summary_path, &output.summary)?;
    written.push(summary_path);

    for path in &written {
        info!("📄 Wrote {}", path.display());
    }
    Ok(written)
}
