// src/matching/top_sfdc.rs - Top list → SFDC account matching
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use crate::error::MatchResult;
use crate::matching::blocking::BlockIndex;
use crate::matching::name::{canonicalize, canonicalize_opt};
use crate::matching::similarity::{round_to, similarity_ratio};
use crate::matching::url::extract_domain;
use crate::matching::{validate_threshold, StageContext};
use crate::models::core::{sfdc_accounts_from_table, top_names_from_table, SfdcColumns, Table};
use crate::models::matching::SfdcMatch;
use crate::models::stats_models::{MatchStage, StageStats};
use crate::utils::constants::{
    COMPOSITE_SCORE_PLACES, DEFAULT_TOP_COLUMN, DEFAULT_TOP_SFDC_THRESHOLD, SCORE_PLACES,
};
use crate::utils::progress_bars::logging::StageLogger;

#[derive(Debug, Clone, PartialEq)]
pub struct TopSfdcConfig {
    pub threshold: f64,
    pub top_column: String,
    pub sfdc_columns: SfdcColumns,
}

impl Default for TopSfdcConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_TOP_SFDC_THRESHOLD,
            top_column: DEFAULT_TOP_COLUMN.to_string(),
            sfdc_columns: SfdcColumns::default(),
        }
    }
}

/// Matches every distinct Top name against the English SFDC accounts in its
/// block. One output row per accepted (name, account) pair, in Top order and
/// then SFDC order.
pub fn match_top_to_sfdc(
    top: &Table,
    sfdc: &Table,
    config: &TopSfdcConfig,
    ctx: &StageContext,
) -> MatchResult<(Vec<SfdcMatch>, StageStats)> {
    let start = Instant::now();
    let stage = MatchStage::TopToSfdc;
    let logger = StageLogger::new(stage);

    validate_threshold(stage, config.threshold)?;
    let top_names = top_names_from_table(top, &config.top_column)?;
    let accounts = sfdc_accounts_from_table(sfdc, &config.sfdc_columns)?;
    logger.log_start(config.threshold, top_names.len(), accounts.len());

    let top_canon: Vec<(&str, String)> = top_names
        .iter()
        .map(|cust| (cust.as_str(), canonicalize(cust)))
        .collect();
    let top_canon_set: HashSet<&str> = top_canon.iter().map(|(_, c)| c.as_str()).collect();

    let eligible = accounts.iter().filter(|a| a.is_english).count();
    logger.log_filtering_results(accounts.len(), eligible, "Language filter on SFDC rows");
    if eligible == 0 && !top_names.is_empty() {
        logger.log_warning("No eligible SFDC accounts, no Top name can match");
    }

    logger.log_phase("Canonicalization", Some("canonical names, domains and parent links"));
    let account_canon: Vec<String> = accounts.iter().map(|a| canonicalize(&a.name)).collect();
    let child_flags: Vec<bool> = accounts
        .iter()
        .map(|a| top_canon_set.contains(canonicalize_opt(a.parent.as_deref()).as_str()))
        .collect();
    let with_domain = accounts
        .iter()
        .filter(|a| a.is_english && !extract_domain(a.website.as_deref()).is_empty())
        .count();
    logger.log_debug(&format!(
        "{} of {} eligible accounts carry a website domain",
        with_domain, eligible
    ));

    let index = BlockIndex::build(&account_canon, |i| accounts[i].is_english);
    logger.log_blocks(index.block_count(), index.indexed_count(), index.largest_block());

    logger.log_phase("Matching", Some(&format!("{} Top names", top_canon.len())));
    let pb = ctx.progress_bar(top_canon.len(), "Top→SFDC names");
    let processed = AtomicUsize::new(0);

    let per_name: Vec<(Vec<SfdcMatch>, usize)> = top_canon
        .par_iter()
        .map(|(cust, cust_canon)| -> MatchResult<(Vec<SfdcMatch>, usize)> {
            ctx.token.check(stage)?;

            let candidates = index.candidates(cust_canon);
            let mut rows = Vec::new();
            for &i in candidates {
                let account = &accounts[i];
                let candidate_canon = &account_canon[i];

                let sim = similarity_ratio(cust_canon, candidate_canon);
                let exact_name = cust_canon == candidate_canon;
                let score = if exact_name { 1.0 } else { sim.min(1.0) };

                if score >= config.threshold {
                    rows.push(SfdcMatch {
                        end_customer: cust.to_string(),
                        acct_sfdc_id: account.id.clone(),
                        sfdc_name: account.name.clone(),
                        address: account.display_address(),
                        similarity: round_to(sim, SCORE_PLACES),
                        exact_name,
                        exact_domain: false,
                        child: child_flags[i],
                        score: round_to(score, COMPOSITE_SCORE_PLACES),
                    });
                }
            }

            let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(pb) = &pb {
                pb.inc(1);
            }
            logger.log_progress_update(done, top_canon.len(), None);

            Ok((rows, candidates.len()))
        })
        .collect::<MatchResult<Vec<_>>>()?;

    if let Some(pb) = &pb {
        pb.finish_with_message("Top→SFDC complete");
    }

    let mut stats = StageStats {
        source_rows: top_canon.len(),
        target_rows: accounts.len(),
        target_rows_eligible: eligible,
        blocks: index.block_count(),
        ..StageStats::default()
    };
    let mut matches = Vec::new();
    for (rows, compared) in per_name {
        stats.pairs_compared += compared;
        if rows.is_empty() {
            stats.sources_without_candidates += 1;
        }
        matches.extend(rows);
    }
    stats.rows_emitted = matches.len();
    stats.duration_secs = start.elapsed().as_secs_f64();
    logger.log_completion(&stats);

    Ok((matches, stats))
}
