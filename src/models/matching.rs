// src/models/matching.rs - Rows emitted by the two matching stages
use serde::{Serialize, Serializer};
use std::fmt;

use crate::utils::constants::{ADDRESS_NOT_EVALUATED, ADDRESS_NOT_NEEDED};

/// One accepted Top→SFDC pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SfdcMatch {
    #[serde(rename = "End_Customer")]
    pub end_customer: String,
    #[serde(rename = "Acct_SFDC_ID")]
    pub acct_sfdc_id: String,
    #[serde(rename = "SFDC_Name")]
    pub sfdc_name: String,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "Similarity")]
    pub similarity: f64,
    #[serde(rename = "Exact_Name")]
    pub exact_name: bool,
    /// The Top list carries no website, so this is never set.
    #[serde(rename = "Exact_Domain")]
    pub exact_domain: bool,
    /// The account's parent organization is itself on the Top list.
    #[serde(rename = "Child")]
    pub child: bool,
    #[serde(rename = "Score")]
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    PerfectNameAndAddressMatch,
    ReviewNameMatchAddressMismatch,
    PerfectNameSingleMatch,
    NeedReviewNameMismatch,
}

impl Decision {
    pub const ALL: [Decision; 4] = [
        Decision::PerfectNameAndAddressMatch,
        Decision::ReviewNameMatchAddressMismatch,
        Decision::PerfectNameSingleMatch,
        Decision::NeedReviewNameMismatch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::PerfectNameAndAddressMatch => "PERFECT_NAME_AND_ADDRESS_MATCH",
            Decision::ReviewNameMatchAddressMismatch => "REVIEW_NAME_MATCH_ADDRESS_MISMATCH",
            Decision::PerfectNameSingleMatch => "PERFECT_NAME_SINGLE_MATCH",
            Decision::NeedReviewNameMismatch => "NEED_REVIEW_NAME_MISMATCH",
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(
            self,
            Decision::PerfectNameAndAddressMatch | Decision::PerfectNameSingleMatch
        )
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address column of a Stage2 row: a computed score or a sentinel saying
/// why none was computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AddressScore {
    Score(f64),
    NotNeeded,
    NotEvaluated,
}

impl AddressScore {
    pub fn value(&self) -> Option<f64> {
        match self {
            AddressScore::Score(s) => Some(*s),
            _ => None,
        }
    }
}

impl fmt::Display for AddressScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressScore::Score(s) => write!(f, "{}", s),
            AddressScore::NotNeeded => f.write_str(ADDRESS_NOT_NEEDED),
            AddressScore::NotEvaluated => f.write_str(ADDRESS_NOT_EVALUATED),
        }
    }
}

impl Serialize for AddressScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AddressScore::Score(s) => serializer.serialize_f64(*s),
            AddressScore::NotNeeded => serializer.serialize_str(ADDRESS_NOT_NEEDED),
            AddressScore::NotEvaluated => serializer.serialize_str(ADDRESS_NOT_EVALUATED),
        }
    }
}

/// One classified SFDC→SAP pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SapMatch {
    #[serde(rename = "SFDC ID")]
    pub sfdc_id: String,
    #[serde(rename = "SAP ID")]
    pub sap_id: String,
    #[serde(rename = "SFDC Name")]
    pub sfdc_name: String,
    #[serde(rename = "SAP Name")]
    pub sap_name: String,
    #[serde(rename = "SFDC Address")]
    pub sfdc_address: String,
    #[serde(rename = "SAP Address")]
    pub sap_address: String,
    #[serde(rename = "Name Score")]
    pub name_score: f64,
    #[serde(rename = "Address Score")]
    pub address_score: AddressScore,
    #[serde(rename = "Decision")]
    pub decision: Decision,
}

/// Stage2 output, split by decision.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchTables {
    pub auto_matches: Vec<SapMatch>,
    pub manual_review: Vec<SapMatch>,
}

impl MatchTables {
    pub fn push(&mut self, row: SapMatch) {
        if row.decision.is_auto() {
            self.auto_matches.push(row);
        } else {
            self.manual_review.push(row);
        }
    }

    pub fn len(&self) -> usize {
        self.auto_matches.len() + self.manual_review.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
