// src/matching/sfdc_sap.rs - SFDC account → SAP customer matching and decisions
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use crate::error::MatchResult;
use crate::matching::address::address_score;
use crate::matching::blocking::BlockIndex;
use crate::matching::name::canonicalize;
use crate::matching::similarity::{round_to, similarity_ratio};
use crate::matching::{validate_threshold, StageContext};
use crate::models::core::{sap_customers_from_table, SapColumns, Table};
use crate::models::matching::{AddressScore, Decision, MatchTables, SapMatch, SfdcMatch};
use crate::models::stats_models::{MatchStage, StageStats};
use crate::utils::constants::{DEFAULT_SFDC_SAP_THRESHOLD, SCORE_PLACES};
use crate::utils::progress_bars::logging::StageLogger;

#[derive(Debug, Clone, PartialEq)]
pub struct SfdcSapConfig {
    pub threshold: f64,
    pub sap_columns: SapColumns,
}

impl Default for SfdcSapConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SFDC_SAP_THRESHOLD,
            sap_columns: SapColumns::default(),
        }
    }
}

/// SAP customer after filtering, with its display fields precomputed.
#[derive(Debug, Clone)]
struct SapTarget {
    id: String,
    name: String,
    address: String,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    target: usize,
    name_score: f64,
}

/// English rows only, then the first row per customer identifier.
fn prepare_targets(sap: &Table, columns: &SapColumns) -> MatchResult<(Vec<SapTarget>, usize)> {
    let customers = sap_customers_from_table(sap, columns)?;
    let total = customers.len();
    let mut seen = HashSet::new();
    let targets = customers
        .into_iter()
        .filter(|c| c.is_english)
        .filter(|c| seen.insert(c.customer.clone()))
        .map(|c| SapTarget {
            name: c.display_name(),
            address: c.display_address(),
            id: c.customer.unwrap_or_default(),
        })
        .collect();
    Ok((targets, total))
}

/// Classifies the candidates of one SFDC row.
///
/// With two or more perfect names the address breaks the tie: every perfect
/// candidate whose address also scores 1.0 is auto-matched, and if none does
/// all perfect candidates go to review. Otherwise each candidate is judged on
/// its name alone.
fn decide(sf: &SfdcMatch, candidates: &[Candidate], targets: &[SapTarget]) -> Vec<SapMatch> {
    let row = |c: &Candidate, address_score: AddressScore, decision: Decision| {
        let target = &targets[c.target];
        SapMatch {
            sfdc_id: sf.acct_sfdc_id.clone(),
            sap_id: target.id.clone(),
            sfdc_name: sf.sfdc_name.clone(),
            sap_name: target.name.clone(),
            sfdc_address: sf.address.clone(),
            sap_address: target.address.clone(),
            name_score: c.name_score,
            address_score,
            decision,
        }
    };

    let perfects: Vec<&Candidate> = candidates.iter().filter(|c| c.name_score == 1.0).collect();

    if perfects.len() > 1 {
        let scored: Vec<(&Candidate, f64)> = perfects
            .into_iter()
            .map(|c| (c, address_score(&sf.address, &targets[c.target].address)))
            .collect();

        if scored.iter().any(|(_, addr)| *addr == 1.0) {
            scored
                .iter()
                .filter(|(_, addr)| *addr == 1.0)
                .map(|(c, addr)| {
                    row(*c, AddressScore::Score(*addr), Decision::PerfectNameAndAddressMatch)
                })
                .collect()
        } else {
            scored
                .iter()
                .map(|(c, addr)| {
                    row(*c, AddressScore::Score(*addr), Decision::ReviewNameMatchAddressMismatch)
                })
                .collect()
        }
    } else {
        candidates
            .iter()
            .map(|c| {
                if c.name_score == 1.0 {
                    row(c, AddressScore::NotNeeded, Decision::PerfectNameSingleMatch)
                } else {
                    row(c, AddressScore::NotEvaluated, Decision::NeedReviewNameMismatch)
                }
            })
            .collect()
    }
}

/// Matches every Stage1 row against the SAP customers in its block and
/// splits the classified pairs into auto-match and manual-review tables.
/// Both tables keep Stage1 order, then candidate order.
pub fn match_sfdc_to_sap(
    stage1: &[SfdcMatch],
    sap: &Table,
    config: &SfdcSapConfig,
    ctx: &StageContext,
) -> MatchResult<(MatchTables, StageStats)> {
    let start = Instant::now();
    let stage = MatchStage::SfdcToSap;
    let logger = StageLogger::new(stage);

    validate_threshold(stage, config.threshold)?;
    let (targets, total_sap) = prepare_targets(sap, &config.sap_columns)?;
    logger.log_start(config.threshold, stage1.len(), total_sap);
    logger.log_filtering_results(total_sap, targets.len(), "Language filter and customer dedup on SAP rows");
    if targets.is_empty() && !stage1.is_empty() {
        logger.log_warning("No eligible SAP customers, every SFDC match will be dropped");
    }

    let target_canon: Vec<String> = targets.iter().map(|t| canonicalize(&t.name)).collect();
    let index = BlockIndex::build(&target_canon, |_| true);
    logger.log_blocks(index.block_count(), index.indexed_count(), index.largest_block());

    logger.log_phase("Matching", Some(&format!("{} Stage1 rows", stage1.len())));
    let pb = ctx.progress_bar(stage1.len(), "SFDC→SAP rows");
    let processed = AtomicUsize::new(0);

    let per_row: Vec<(Vec<SapMatch>, usize)> = stage1
        .par_iter()
        .map(|sf| -> MatchResult<(Vec<SapMatch>, usize)> {
            ctx.token.check(stage)?;

            let cust_canon = canonicalize(&sf.sfdc_name);
            let block = index.candidates(&cust_canon);
            let candidates: Vec<Candidate> = block
                .iter()
                .filter_map(|&i| {
                    let sim = similarity_ratio(&cust_canon, &target_canon[i]);
                    (sim >= config.threshold).then(|| Candidate {
                        target: i,
                        name_score: round_to(sim, SCORE_PLACES),
                    })
                })
                .collect();

            let rows = if candidates.is_empty() {
                Vec::new()
            } else {
                decide(sf, &candidates, &targets)
            };

            let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(pb) = &pb {
                pb.inc(1);
            }
            logger.log_progress_update(done, stage1.len(), None);

            Ok((rows, block.len()))
        })
        .collect::<MatchResult<Vec<_>>>()?;

    if let Some(pb) = &pb {
        pb.finish_with_message("SFDC→SAP complete");
    }

    let mut stats = StageStats {
        source_rows: stage1.len(),
        target_rows: total_sap,
        target_rows_eligible: targets.len(),
        blocks: index.block_count(),
        ..StageStats::default()
    };
    let mut tables = MatchTables::default();
    for (rows, compared) in per_row {
        stats.pairs_compared += compared;
        if rows.is_empty() {
            stats.sources_without_candidates += 1;
        }
        for row in rows {
            tables.push(row);
        }
    }
    stats.rows_emitted = tables.len();
    stats.duration_secs = start.elapsed().as_secs_f64();
    logger.log_completion(&stats);

    Ok((tables, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatchError;
    use crate::models::core::Cell;

    const MAIN_ST: &str = "1 Main St, Springfield, IL 62701";

    fn sf_row(id: &str, name: &str, address: &str) -> SfdcMatch {
        SfdcMatch {
            end_customer: name.to_string(),
            acct_sfdc_id: id.to_string(),
            sfdc_name: name.to_string(),
            address: address.to_string(),
            similarity: 1.0,
            exact_name: true,
            exact_domain: false,
            child: false,
            score: 1.0,
        }
    }

    /// customer, name1, name2, street, city, region, postal
    fn sap_table(rows: &[[&str; 7]]) -> Table {
        Table::new(
            vec![
                "Customer".into(),
                "Name 1".into(),
                "Name 2".into(),
                "Street".into(),
                "City".into(),
                "Rg".into(),
                "PostalCode".into(),
            ],
            rows.iter()
                .map(|r| r.iter().map(|v| Cell::from_text(v)).collect())
                .collect(),
        )
    }

    fn run(stage1: &[SfdcMatch], sap: &Table) -> (MatchTables, StageStats) {
        match_sfdc_to_sap(stage1, sap, &SfdcSapConfig::default(), &StageContext::default())
            .unwrap()
    }

    #[test]
    fn test_single_perfect_is_auto_matched_without_address() {
        let sap = sap_table(&[["100", "Acme", "", "9 Elm Rd", "Boston", "MA", "02101"]]);
        let (tables, _) = run(&[sf_row("001", "ACME", MAIN_ST)], &sap);

        assert_eq!(tables.auto_matches.len(), 1);
        assert!(tables.manual_review.is_empty());
        let row = &tables.auto_matches[0];
        assert_eq!(row.decision, Decision::PerfectNameSingleMatch);
        assert_eq!(row.address_score, AddressScore::NotNeeded);
        assert_eq!(row.sap_id, "100");
        assert_eq!(row.sap_address, "9 Elm Rd, Boston, MA 02101");
        assert_eq!(row.sfdc_address, MAIN_ST);
    }

    #[test]
    fn test_perfect_and_near_candidates_split_across_tables() {
        let sap = sap_table(&[
            ["100", "Acme", "", "", "", "", ""],
            ["101", "Acmex", "", "", "", "", ""],
        ]);
        let (tables, _) = run(&[sf_row("001", "ACME", "")], &sap);

        assert_eq!(tables.auto_matches.len(), 1);
        assert_eq!(tables.manual_review.len(), 1);
        let review = &tables.manual_review[0];
        assert_eq!(review.decision, Decision::NeedReviewNameMismatch);
        assert_eq!(review.address_score, AddressScore::NotEvaluated);
        assert_eq!(review.name_score, 0.889);
    }

    #[test]
    fn test_multiple_perfects_broken_by_address() {
        let sap = sap_table(&[
            ["100", "ACME", "", "1 Main St", "Springfield", "IL", "62701"],
            ["101", "Acme", "Inc.", "500 Oak Ave", "Chicago", "IL", "60601"],
        ]);
        let (tables, _) = run(&[sf_row("001", "ACME", MAIN_ST)], &sap);

        assert_eq!(tables.auto_matches.len(), 1);
        assert!(tables.manual_review.is_empty());
        let row = &tables.auto_matches[0];
        assert_eq!(row.sap_id, "100");
        assert_eq!(row.decision, Decision::PerfectNameAndAddressMatch);
        assert_eq!(row.address_score, AddressScore::Score(1.0));
    }

    #[test]
    fn test_multiple_perfects_without_address_match_go_to_review() {
        let sap = sap_table(&[
            ["100", "ACME", "", "77 Pine St", "Seattle", "WA", "98101"],
            ["101", "Acme", "Inc.", "500 Oak Ave", "Chicago", "IL", "60601"],
        ]);
        let (tables, _) = run(&[sf_row("001", "ACME", MAIN_ST)], &sap);

        assert!(tables.auto_matches.is_empty());
        assert_eq!(tables.manual_review.len(), 2);
        for row in &tables.manual_review {
            assert_eq!(row.decision, Decision::ReviewNameMatchAddressMismatch);
            let score = row.address_score.value().unwrap();
            assert!((0.0..1.0).contains(&score));
        }
        assert_eq!(tables.manual_review[1].sap_name, "Acme Inc.");
    }

    #[test]
    fn test_multiple_perfects_with_blank_addresses_auto_match() {
        let sap = sap_table(&[
            ["100", "Acme", "", "", "", "", ""],
            ["101", "ACME", "", "", "", "", ""],
        ]);
        let (tables, _) = run(&[sf_row("001", "ACME", "")], &sap);

        assert!(tables.manual_review.is_empty());
        assert_eq!(tables.auto_matches.len(), 2);
        for row in &tables.auto_matches {
            assert_eq!(row.decision, Decision::PerfectNameAndAddressMatch);
            assert_eq!(row.address_score, AddressScore::Score(1.0));
            assert_eq!(row.sap_address, "");
        }
        assert_eq!(tables.auto_matches[0].sap_id, "100");
        assert_eq!(tables.auto_matches[1].sap_id, "101");
    }

    #[test]
    fn test_blank_sfdc_address_prefers_blank_sap_address() {
        let sap = sap_table(&[
            ["100", "ACME", "", "1 Main St", "Springfield", "IL", "62701"],
            ["101", "Acme", "", "", "", "", ""],
        ]);
        let (tables, _) = run(&[sf_row("001", "ACME", "")], &sap);

        assert!(tables.manual_review.is_empty());
        assert_eq!(tables.auto_matches.len(), 1);
        assert_eq!(tables.auto_matches[0].sap_id, "101");
        assert_eq!(tables.auto_matches[0].decision, Decision::PerfectNameAndAddressMatch);
    }

    #[test]
    fn test_rows_without_candidates_are_dropped() {
        let sap = sap_table(&[["100", "Globex", "", "", "", "", ""]]);
        let (tables, stats) = run(&[sf_row("001", "ACME", "")], &sap);
        assert!(tables.is_empty());
        assert_eq!(stats.sources_without_candidates, 1);
    }

    #[test]
    fn test_language_filter_runs_before_customer_dedup() {
        let sap = sap_table(&[
            ["100", "Acmé", "", "", "", "", ""],
            ["100", "Acme", "", "", "", "", ""],
            ["100", "Acme", "Second", "", "", "", ""],
        ]);
        let (tables, stats) = run(&[sf_row("001", "ACME", "")], &sap);

        assert_eq!(stats.target_rows, 3);
        assert_eq!(stats.target_rows_eligible, 1);
        assert_eq!(tables.auto_matches.len(), 1);
        assert_eq!(tables.auto_matches[0].sap_name, "Acme");
    }

    #[test]
    fn test_every_row_carries_consistent_decision() {
        let sap = sap_table(&[
            ["100", "Acme", "", "1 Main St", "Springfield", "IL", "62701"],
            ["101", "Acme", "", "1 Main St", "Springfield", "IL", "62701"],
            ["102", "Acmex", "", "", "", "", ""],
            ["103", "Globex", "", "", "", "", ""],
        ]);
        let stage1 = vec![
            sf_row("001", "ACME", MAIN_ST),
            sf_row("002", "Acmex", ""),
            sf_row("003", "Globex Corp", ""),
        ];
        let (tables, _) = run(&stage1, &sap);

        for row in tables.auto_matches.iter().chain(tables.manual_review.iter()) {
            match row.decision {
                Decision::PerfectNameAndAddressMatch => {
                    assert_eq!(row.name_score, 1.0);
                    assert_eq!(row.address_score, AddressScore::Score(1.0));
                }
                Decision::ReviewNameMatchAddressMismatch => {
                    assert_eq!(row.name_score, 1.0);
                    assert!(row.address_score.value().is_some());
                }
                Decision::PerfectNameSingleMatch => {
                    assert_eq!(row.name_score, 1.0);
                    assert_eq!(row.address_score, AddressScore::NotNeeded);
                }
                Decision::NeedReviewNameMismatch => {
                    assert!(row.name_score < 1.0);
                    assert_eq!(row.address_score, AddressScore::NotEvaluated);
                }
            }
        }
        // 001 ties on two perfect addresses; 002 and 003 are single perfects
        assert_eq!(tables.auto_matches.len(), 4);
        assert_eq!(tables.auto_matches[0].sfdc_id, "001");
        assert_eq!(tables.auto_matches[1].sfdc_id, "001");
    }

    #[test]
    fn test_missing_sap_column() {
        let table = Table::new(vec!["Customer".into()], Vec::new());
        let err = match_sfdc_to_sap(&[], &table, &SfdcSapConfig::default(), &StageContext::default())
            .unwrap_err();
        assert!(matches!(err, MatchError::MissingColumn { table: "SAP", role: "name1", .. }));
    }
}
