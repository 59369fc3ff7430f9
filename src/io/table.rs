// src/io/table.rs - Reading input tables from delimited text and spreadsheets
use anyhow::{anyhow, bail, Context, Result};
use calamine::{open_workbook_auto, Data, Reader, Sheets};
use log::{debug, info};
use std::path::Path;

use crate::models::core::{Cell, RawRecord, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Delimited(u8),
    Spreadsheet,
}

fn source_kind(path: &Path) -> Result<SourceKind> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "csv" | "txt" => Ok(SourceKind::Delimited(b',')),
        "tsv" => Ok(SourceKind::Delimited(b'\t')),
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(SourceKind::Spreadsheet),
        other => bail!("Unsupported input format '{}' for {}", other, path.display()),
    }
}

/// Reads `path` into a [`Table`]. The first `header_row` rows are skipped and
/// the next one names the columns. Spreadsheets use their first worksheet.
pub fn read_table(path: &Path, header_row: usize) -> Result<Table> {
    let rows = match source_kind(path)? {
        SourceKind::Delimited(delimiter) => read_delimited(path, delimiter)?,
        SourceKind::Spreadsheet => read_spreadsheet(path)?,
    };
    let table = table_from_rows(rows, header_row)
        .with_context(|| format!("Failed to read header row {} of {}", header_row, path.display()))?;
    info!(
        "Loaded {} rows x {} columns from {}",
        table.len(),
        table.headers().len(),
        path.display()
    );
    Ok(table)
}

fn table_from_rows(rows: Vec<RawRecord>, header_row: usize) -> Result<Table> {
    let mut rows = rows.into_iter().skip(header_row);
    let Some(header) = rows.next() else {
        bail!("input has no header row");
    };
    let headers = header
        .iter()
        .map(|c| c.as_text().map(|s| s.trim().to_string()).unwrap_or_default())
        .collect();
    // rows that are blank across every column carry no record
    let body = rows.filter(|r| r.iter().any(|c| !c.is_empty())).collect();
    Ok(Table::new(headers, body))
}

fn read_delimited(path: &Path, delimiter: u8) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Bad record {} in {}", i + 1, path.display()))?;
        rows.push(record.iter().map(Cell::from_text).collect());
    }
    Ok(rows)
}

fn read_spreadsheet(path: &Path) -> Result<Vec<RawRecord>> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| anyhow!("Failed to open workbook {}: {}", path.display(), e))?;
    let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
        bail!("Workbook {} has no worksheets", path.display());
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| anyhow!("Failed to read worksheet '{}': {}", sheet_name, e))?;

    // the range starts at the first used cell; pad back to A1 so header
    // offsets count from the top of the sheet
    let (start_row, start_col) = range
        .start()
        .map_or((0, 0), |(r, c)| (r as usize, c as usize));
    debug!(
        "Worksheet '{}' used range starts at row {}, column {}",
        sheet_name, start_row, start_col
    );

    let mut rows: Vec<RawRecord> = vec![Vec::new(); start_row];
    for row in range.rows() {
        let mut record = vec![Cell::Empty; start_col];
        record.extend(row.iter().map(cell_from_data));
        rows.push(record);
    }
    Ok(rows)
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::from_text(s),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::from_text(s),
    }
}
