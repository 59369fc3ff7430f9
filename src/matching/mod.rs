pub mod address;
pub mod blocking;
pub mod manager;
pub mod name;
pub mod sfdc_sap;
pub mod similarity;
pub mod top_sfdc;
pub mod url;

use indicatif::{MultiProgress, ProgressBar};

use crate::error::{MatchError, MatchResult};
use crate::models::stats_models::MatchStage;
use crate::utils::cancellation::CancellationToken;
use crate::utils::progress_bars::progress_config::stage_progress_bar;

/// Run-scoped collaborators handed to each stage.
#[derive(Clone, Default)]
pub struct StageContext {
    pub token: CancellationToken,
    pub multi_progress: Option<MultiProgress>,
}

impl StageContext {
    pub fn new(token: CancellationToken, multi_progress: Option<MultiProgress>) -> Self {
        Self {
            token,
            multi_progress,
        }
    }

    pub(crate) fn progress_bar(&self, len: usize, label: &str) -> Option<ProgressBar> {
        self.multi_progress
            .as_ref()
            .map(|mp| stage_progress_bar(mp, len, label))
    }
}

pub(crate) fn validate_threshold(stage: MatchStage, value: f64) -> MatchResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(MatchError::InvalidThreshold { stage, value })
    }
}
