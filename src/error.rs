// src/error.rs - Error taxonomy for the matching core
use std::fmt;
use std::time::Duration;

use crate::models::stats_models::MatchStage;

#[derive(Debug)]
pub enum MatchError {
    /// A configured column-role name is absent from an input table.
    MissingColumn {
        table: &'static str,
        role: &'static str,
        column: String,
    },
    /// Threshold outside [0, 1] (or NaN).
    InvalidThreshold { stage: MatchStage, value: f64 },
    /// The run was cancelled by its caller.
    Cancelled { stage: MatchStage },
    /// The run deadline passed before the stage finished.
    DeadlineExceeded { stage: MatchStage, elapsed: Duration },
    /// Input table could not be read.
    Io(String),
    /// Input table could be read but not interpreted.
    Parse(String),
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn { table, role, column } => write!(
                f,
                "{table} table: column '{column}' (configured for role '{role}') does not exist"
            ),
            Self::InvalidThreshold { stage, value } => write!(
                f,
                "{} threshold must be within [0, 1], got {value}",
                stage.as_str()
            ),
            Self::Cancelled { stage } => write!(f, "{} matching cancelled", stage.as_str()),
            Self::DeadlineExceeded { stage, elapsed } => write!(
                f,
                "{} matching exceeded its deadline after {:.1?}",
                stage.as_str(),
                elapsed
            ),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for MatchError {}

impl From<std::io::Error> for MatchError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

pub type MatchResult<T> = std::result::Result<T, MatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_message_names_column_and_role() {
        let err = MatchError::MissingColumn {
            table: "SFDC",
            role: "website",
            column: "Web Site".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("SFDC"));
        assert!(msg.contains("'Web Site'"));
        assert!(msg.contains("'website'"));
    }

    #[test]
    fn test_threshold_message_names_stage() {
        let err = MatchError::InvalidThreshold {
            stage: MatchStage::SfdcToSap,
            value: 1.5,
        };
        assert_eq!(
            err.to_string(),
            "SFDC→SAP threshold must be within [0, 1], got 1.5"
        );
    }
}
