// src/models/core.rs - Tabular inputs and the typed records resolved from them
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{MatchError, MatchResult};
use crate::matching::name::is_english_row;
use crate::utils::constants::*;

/// A single value read from a tabular source.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    /// Blank text is treated as a missing value.
    pub fn from_text(s: &str) -> Self {
        if s.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Display form of the value, `None` when missing.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) => Some(format_number(*n)),
            Cell::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
        }
    }
}

/// Whole numbers print without a fractional part so that numeric IDs and
/// postal codes read back the way they were typed.
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// One row of a tabular input, in column order.
pub type RawRecord = Vec<Cell>;

static EMPTY_CELL: Cell = Cell::Empty;

/// Header plus rows, as handed over by whichever reader loaded the source.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<RawRecord>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<RawRecord>) -> Self {
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[RawRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    pub fn require_column(
        &self,
        table: &'static str,
        role: &'static str,
        column: &str,
    ) -> MatchResult<usize> {
        self.column_index(column)
            .ok_or_else(|| MatchError::MissingColumn {
                table,
                role,
                column: column.to_string(),
            })
    }

    /// Ragged rows read as `Empty` past their end.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }
}

fn cell_text(row: &[Cell], col: usize) -> Option<String> {
    row.get(col).and_then(Cell::as_text)
}

/// Column names backing each SFDC role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SfdcColumns {
    pub id: String,
    pub name: String,
    pub website: String,
    pub street: String,
    pub state: String,
    pub parent: String,
}

impl Default for SfdcColumns {
    fn default() -> Self {
        Self {
            id: DEFAULT_SFDC_ID_COLUMN.to_string(),
            name: DEFAULT_SFDC_NAME_COLUMN.to_string(),
            website: DEFAULT_SFDC_WEBSITE_COLUMN.to_string(),
            street: DEFAULT_SFDC_STREET_COLUMN.to_string(),
            state: DEFAULT_SFDC_STATE_COLUMN.to_string(),
            parent: DEFAULT_SFDC_PARENT_COLUMN.to_string(),
        }
    }
}

/// Column names backing each SAP role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SapColumns {
    pub customer: String,
    pub name1: String,
    pub name2: String,
    pub street: String,
    pub city: String,
    pub region: String,
    pub postal: String,
}

impl Default for SapColumns {
    fn default() -> Self {
        Self {
            customer: DEFAULT_SAP_CUSTOMER_COLUMN.to_string(),
            name1: DEFAULT_SAP_NAME1_COLUMN.to_string(),
            name2: DEFAULT_SAP_NAME2_COLUMN.to_string(),
            street: DEFAULT_SAP_STREET_COLUMN.to_string(),
            city: DEFAULT_SAP_CITY_COLUMN.to_string(),
            region: DEFAULT_SAP_REGION_COLUMN.to_string(),
            postal: DEFAULT_SAP_POSTAL_COLUMN.to_string(),
        }
    }
}

impl SapColumns {
    fn roles(&self) -> [(&'static str, &str); 7] {
        [
            ("customer", &self.customer),
            ("name1", &self.name1),
            ("name2", &self.name2),
            ("street", &self.street),
            ("city", &self.city),
            ("region", &self.region),
            ("postal", &self.postal),
        ]
    }

    /// Fails on the first role whose column `table` lacks.
    pub fn require_in(&self, table: &Table) -> MatchResult<()> {
        for (role, column) in self.roles() {
            table.require_column("SAP", role, column)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SfdcAccount {
    pub id: String,
    pub name: String,
    pub website: Option<String>,
    pub street: Option<String>,
    pub state: Option<String>,
    pub parent: Option<String>,
    /// Every text field of the source row is 7-bit ASCII.
    pub is_english: bool,
}

impl SfdcAccount {
    /// `street, state` with stray separators trimmed.
    pub fn display_address(&self) -> String {
        let joined = format!(
            "{}, {}",
            self.street.as_deref().unwrap_or(""),
            self.state.as_deref().unwrap_or("")
        );
        strip_separators(&joined).to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SapCustomer {
    pub customer: Option<String>,
    pub name1: Option<String>,
    pub name2: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal: Option<String>,
    pub is_english: bool,
}

impl SapCustomer {
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.name1.as_deref().unwrap_or(""),
            self.name2.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }

    /// `street, city, region postal` with stray separators trimmed.
    pub fn display_address(&self) -> String {
        let joined = format!(
            "{}, {}, {} {}",
            self.street.as_deref().unwrap_or(""),
            self.city.as_deref().unwrap_or(""),
            self.region.as_deref().unwrap_or(""),
            self.postal.as_deref().unwrap_or("")
        );
        strip_separators(&joined).to_string()
    }
}

/// Trims commas and spaces from both ends.
pub fn strip_separators(s: &str) -> &str {
    s.trim_matches(|c: char| c == ',' || c == ' ')
}

/// Values of the Top column: missing cells dropped, duplicates removed,
/// first occurrence order kept.
pub fn top_names_from_table(table: &Table, column: &str) -> MatchResult<Vec<String>> {
    let idx = table.require_column("Top", "name", column)?;
    let mut seen = HashSet::new();
    let names = table
        .rows()
        .iter()
        .filter_map(|row| cell_text(row, idx))
        .filter(|name| seen.insert(name.clone()))
        .collect();
    Ok(names)
}

/// Resolves every SFDC role to its column once, failing before any row is read.
pub fn sfdc_accounts_from_table(
    table: &Table,
    columns: &SfdcColumns,
) -> MatchResult<Vec<SfdcAccount>> {
    let id = table.require_column("SFDC", "id", &columns.id)?;
    let name = table.require_column("SFDC", "name", &columns.name)?;
    let website = table.require_column("SFDC", "website", &columns.website)?;
    let street = table.require_column("SFDC", "street", &columns.street)?;
    let state = table.require_column("SFDC", "state", &columns.state)?;
    let parent = table.require_column("SFDC", "parent", &columns.parent)?;

    Ok(table
        .rows()
        .iter()
        .map(|row| SfdcAccount {
            id: cell_text(row, id).unwrap_or_default(),
            name: cell_text(row, name).unwrap_or_default(),
            website: cell_text(row, website),
            street: cell_text(row, street),
            state: cell_text(row, state),
            parent: cell_text(row, parent),
            is_english: is_english_row(row),
        })
        .collect())
}

pub fn sap_customers_from_table(
    table: &Table,
    columns: &SapColumns,
) -> MatchResult<Vec<SapCustomer>> {
    let customer = table.require_column("SAP", "customer", &columns.customer)?;
    let name1 = table.require_column("SAP", "name1", &columns.name1)?;
    let name2 = table.require_column("SAP", "name2", &columns.name2)?;
    let street = table.require_column("SAP", "street", &columns.street)?;
    let city = table.require_column("SAP", "city", &columns.city)?;
    let region = table.require_column("SAP", "region", &columns.region)?;
    let postal = table.require_column("SAP", "postal", &columns.postal)?;

    Ok(table
        .rows()
        .iter()
        .map(|row| SapCustomer {
            customer: cell_text(row, customer),
            name1: cell_text(row, name1),
            name2: cell_text(row, name2),
            street: cell_text(row, street),
            city: cell_text(row, city),
            region: cell_text(row, region),
            postal: cell_text(row, postal),
            is_english: is_english_row(row),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn sfdc_table() -> Table {
        Table::new(
            vec![
                "Account ID".into(),
                "Account Name".into(),
                "Website".into(),
                "Billing Street".into(),
                "Billing State/Province".into(),
                "Parent Account".into(),
            ],
            vec![
                vec![text("001A"), text("Acme Inc."), text("acme.com"), text("1 Main St"), text("CA"), Cell::Empty],
                vec![text("001B"), text("Café Nord"), Cell::Empty, Cell::Empty, text("QC"), Cell::Empty],
            ],
        )
    }

    #[test]
    fn test_number_cells_render_without_trailing_fraction() {
        assert_eq!(Cell::Number(95134.0).as_text().as_deref(), Some("95134"));
        assert_eq!(Cell::Number(1.5).as_text().as_deref(), Some("1.5"));
        assert_eq!(Cell::Empty.as_text(), None);
        assert!(Cell::from_text("   ").is_empty());
    }

    #[test]
    fn test_sfdc_resolution_carries_language_flag() {
        let accounts = sfdc_accounts_from_table(&sfdc_table(), &SfdcColumns::default()).unwrap();
        assert_eq!(accounts.len(), 2);
        assert!(accounts[0].is_english);
        assert!(!accounts[1].is_english);
        assert_eq!(accounts[0].display_address(), "1 Main St, CA");
        assert_eq!(accounts[1].display_address(), "QC");
    }

    #[test]
    fn test_missing_column_fails_before_matching() {
        let columns = SfdcColumns {
            parent: "Ultimate Parent".to_string(),
            ..SfdcColumns::default()
        };
        match sfdc_accounts_from_table(&sfdc_table(), &columns) {
            Err(MatchError::MissingColumn { role, column, .. }) => {
                assert_eq!(role, "parent");
                assert_eq!(column, "Ultimate Parent");
            }
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_top_names_drop_missing_and_duplicates() {
        let table = Table::new(
            vec!["End Customer".into()],
            vec![
                vec![text("Acme Inc.")],
                vec![Cell::Empty],
                vec![text("Globex")],
                vec![text("Acme Inc.")],
            ],
        );
        let names = top_names_from_table(&table, "End Customer").unwrap();
        assert_eq!(names, vec!["Acme Inc.", "Globex"]);
    }

    #[test]
    fn test_sap_display_fields() {
        let sap = SapCustomer {
            customer: Some("100".into()),
            name1: Some("ACME".into()),
            name2: None,
            street: Some("1 Main St".into()),
            city: None,
            region: Some("CA".into()),
            postal: Some("95134".into()),
            is_english: true,
        };
        assert_eq!(sap.display_name(), "ACME");
        assert_eq!(sap.display_address(), "1 Main St, , CA 95134");

        let blank = SapCustomer {
            customer: None,
            name1: None,
            name2: None,
            street: None,
            city: None,
            region: None,
            postal: None,
            is_english: true,
        };
        assert_eq!(blank.display_address(), "");
    }
}
