// src/matching/address.rs - US postal address tagging and address similarity
use log::debug;
use std::collections::HashSet;

use crate::matching::similarity::{round_to, similarity_ratio};
use crate::utils::constants::{POSTAL_WEIGHT, PLACE_WEIGHT, SCORE_PLACES, STATE_WEIGHT, STREET_WEIGHT};

const DIRECTIONAL_ABBREVIATIONS: [&str; 8] = ["N", "S", "E", "W", "NE", "NW", "SE", "SW"];
const DIRECTIONAL_WORDS: [&str; 8] = [
    "NORTH", "SOUTH", "EAST", "WEST", "NORTHEAST", "NORTHWEST", "SOUTHEAST", "SOUTHWEST",
];

const STREET_TYPES: &[&str] = &[
    "ALLEY", "ALY", "AV", "AVE", "AVENUE", "BEND", "BLVD", "BND", "BOULEVARD", "CENTER", "CIR",
    "CIRCLE", "COURT", "CRES", "CRESCENT", "CROSSING", "CT", "CTR", "DR", "DRIVE", "EXPRESSWAY",
    "EXPY", "FREEWAY", "FWY", "HIGHWAY", "HWY", "LANE", "LN", "LOOP", "PARKWAY", "PIKE", "PKWY",
    "PL", "PLACE", "PLAZA", "PLZ", "PT", "POINT", "RD", "ROAD", "ROW", "RUN", "SQ", "SQUARE", "ST",
    "STREET", "TER", "TERRACE", "TPKE", "TRAIL", "TRL", "TURNPIKE", "WAY", "XING",
];

const OCCUPANCY_TYPES: &[&str] = &[
    "APARTMENT", "APT", "BLDG", "BUILDING", "DEPT", "FL", "FLOOR", "LOT", "OFC", "RM", "ROOM",
    "SPACE", "SPC", "STE", "SUITE", "TRLR", "UNIT",
];

const STATE_CODES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA", "KS",
    "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ", "NM", "NY",
    "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA", "WV",
    "WI", "WY", "DC", "PR", "GU", "VI", "AS", "MP",
    // Canadian provinces appear in the same region column
    "AB", "BC", "MB", "NB", "NL", "NS", "NT", "NU", "ON", "PE", "QC", "SK", "YT",
];

const STATE_NAMES: &[&str] = &[
    "ALABAMA", "ALASKA", "ARIZONA", "ARKANSAS", "CALIFORNIA", "COLORADO", "CONNECTICUT",
    "DELAWARE", "FLORIDA", "GEORGIA", "HAWAII", "IDAHO", "ILLINOIS", "INDIANA", "IOWA", "KANSAS",
    "KENTUCKY", "LOUISIANA", "MAINE", "MARYLAND", "MASSACHUSETTS", "MICHIGAN", "MINNESOTA",
    "MISSISSIPPI", "MISSOURI", "MONTANA", "NEBRASKA", "NEVADA", "NEW HAMPSHIRE", "NEW JERSEY",
    "NEW MEXICO", "NEW YORK", "NORTH CAROLINA", "NORTH DAKOTA", "OHIO", "OKLAHOMA", "OREGON",
    "PENNSYLVANIA", "RHODE ISLAND", "SOUTH CAROLINA", "SOUTH DAKOTA", "TENNESSEE", "TEXAS", "UTAH",
    "VERMONT", "VIRGINIA", "WASHINGTON", "WEST VIRGINIA", "WISCONSIN", "WYOMING",
    "DISTRICT OF COLUMBIA", "PUERTO RICO",
];

/// Structural components of a postal address. Street sub-fields keep the
/// spelling found in the input; nothing is expanded or abbreviated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedAddress {
    pub address_number: Option<String>,
    pub street_pre_directional: Option<String>,
    pub street_name: Option<String>,
    pub street_post_type: Option<String>,
    pub street_post_directional: Option<String>,
    pub occupancy: Option<String>,
    pub usps_box: Option<String>,
    pub place_name: Option<String>,
    pub state_name: Option<String>,
    pub zip_code: Option<String>,
}

impl ParsedAddress {
    /// Number, directionals, name and type joined by single spaces.
    pub fn street_line(&self) -> String {
        [
            &self.address_number,
            &self.street_pre_directional,
            &self.street_name,
            &self.street_post_type,
            &self.street_post_directional,
        ]
        .iter()
        .filter_map(|part| part.as_deref())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnparseableReason {
    /// A later comma segment reads as a second street line.
    RepeatedStreet,
    /// A middle comma segment is neither occupancy nor locality.
    AmbiguousSegment,
    /// A postal code appears somewhere other than the end.
    StrayPostalCode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AddressParse {
    Parsed(ParsedAddress),
    Unparseable(UnparseableReason),
}

fn tokenize(segment: &str) -> Vec<String> {
    segment
        .split_whitespace()
        .map(|t| t.trim_matches('.'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_zip(token: &str) -> bool {
    let bytes = token.as_bytes();
    let five = |b: &[u8]| b.len() == 5 && b.iter().all(u8::is_ascii_digit);
    match bytes.len() {
        5 => five(bytes),
        10 => five(&bytes[..5]) && bytes[5] == b'-' && bytes[6..].iter().all(u8::is_ascii_digit),
        _ => false,
    }
}

fn is_directional(token: &str) -> bool {
    DIRECTIONAL_ABBREVIATIONS.contains(&token) || DIRECTIONAL_WORDS.contains(&token)
}

fn is_street_type(token: &str) -> bool {
    STREET_TYPES.contains(&token)
}

fn is_occupancy(token: &str) -> bool {
    token.starts_with('#') || OCCUPANCY_TYPES.contains(&token)
}

fn starts_with_digit(token: &str) -> bool {
    token.chars().next().map_or(false, |c| c.is_ascii_digit())
}

fn is_po_box(tokens: &[String]) -> bool {
    let joined = tokens.join(" ");
    joined.starts_with("PO BOX")
        || joined.starts_with("P O BOX")
        || joined.starts_with("POST OFFICE BOX")
}

/// Pops a trailing state code or full state name off `tokens`.
fn take_state(tokens: &mut Vec<String>) -> Option<String> {
    for width in [3usize, 2] {
        if tokens.len() >= width {
            let tail = tokens[tokens.len() - width..].join(" ");
            if STATE_NAMES.contains(&tail.as_str()) {
                tokens.truncate(tokens.len() - width);
                return Some(tail);
            }
        }
    }
    let last = tokens.last()?;
    if STATE_CODES.contains(&last.as_str()) || STATE_NAMES.contains(&last.as_str()) {
        return tokens.pop();
    }
    None
}

fn drop_empty_tail(segments: &mut Vec<Vec<String>>) {
    while segments.last().map_or(false, Vec::is_empty) {
        segments.pop();
    }
}

/// Fills number, directionals, name and type from one street line that has
/// no occupancy or locality tokens left in it.
fn tag_street_components(tokens: &[String], parsed: &mut ParsedAddress) {
    if tokens.is_empty() {
        return;
    }
    let mut start = 0;
    let mut end = tokens.len();
    if starts_with_digit(&tokens[0]) {
        parsed.address_number = Some(tokens[0].clone());
        start = 1;
    }
    if end - start >= 2 && is_directional(&tokens[start]) {
        parsed.street_pre_directional = Some(tokens[start].clone());
        start += 1;
    }
    if end - start >= 2 && is_directional(&tokens[end - 1]) {
        parsed.street_post_directional = Some(tokens[end - 1].clone());
        end -= 1;
    }
    if end - start >= 2 && is_street_type(&tokens[end - 1]) {
        parsed.street_post_type = Some(tokens[end - 1].clone());
        end -= 1;
    }
    if end > start {
        parsed.street_name = Some(tokens[start..end].join(" "));
    }
}

/// Street line followed by nothing but occupancy.
fn tag_street_segment(tokens: &[String], parsed: &mut ParsedAddress) {
    if is_po_box(tokens) {
        parsed.usps_box = Some(tokens.join(" "));
        return;
    }
    let occupancy_at = tokens
        .iter()
        .skip(1)
        .position(|t| is_occupancy(t))
        .map(|p| p + 1)
        .unwrap_or(tokens.len());
    if occupancy_at < tokens.len() {
        parsed.occupancy = Some(tokens[occupancy_at..].join(" "));
    }
    tag_street_components(&tokens[..occupancy_at], parsed);
}

/// A single comma-free line that may run street, occupancy and place
/// together: "123 MAIN ST STE 4 SAN JOSE".
fn tag_single_line(tokens: &[String], locality_was_separate: bool, parsed: &mut ParsedAddress) {
    if is_po_box(tokens) {
        parsed.usps_box = Some(tokens.join(" "));
        return;
    }

    let has_number = starts_with_digit(&tokens[0]);
    let mut name_start = usize::from(has_number);
    if tokens.len() > name_start + 1 && is_directional(&tokens[name_start]) {
        name_start += 1;
    }
    let street_type_at = tokens
        .iter()
        .enumerate()
        .skip(name_start + 1)
        .find(|(_, t)| is_street_type(t))
        .map(|(i, _)| i);

    let Some(type_at) = street_type_at else {
        if !has_number && locality_was_separate && !tokens.iter().any(|t| is_occupancy(t)) {
            parsed.place_name = Some(tokens.join(" "));
        } else {
            tag_street_segment(tokens, parsed);
        }
        return;
    };

    let mut next = type_at + 1;
    if next < tokens.len()
        && (DIRECTIONAL_ABBREVIATIONS.contains(&tokens[next].as_str())
            || (next + 1 == tokens.len() && is_directional(&tokens[next])))
    {
        next += 1;
    }
    tag_street_components(&tokens[..next], parsed);

    if next < tokens.len() && is_occupancy(&tokens[next]) {
        let keyword = &tokens[next];
        let carries_id = keyword.len() > 1 && keyword.starts_with('#');
        let occupancy_end = if carries_id { next + 1 } else { (next + 2).min(tokens.len()) };
        parsed.occupancy = Some(tokens[next..occupancy_end].join(" "));
        next = occupancy_end;
    }
    if next < tokens.len() {
        parsed.place_name = Some(tokens[next..].join(" "));
    }
}

/// Tags an address into street, place, state and postal components. Returns
/// `Unparseable` when the comma structure cannot be read one way only. A blank
/// address parses to no components at all.
pub fn parse_address(address: &str) -> AddressParse {
    let upper = address.to_uppercase();
    let mut segments: Vec<Vec<String>> = upper
        .split(',')
        .map(tokenize)
        .filter(|t| !t.is_empty())
        .collect();
    if segments.is_empty() {
        return AddressParse::Parsed(ParsedAddress::default());
    }
    let original_segments = segments.len();
    let mut parsed = ParsedAddress::default();

    if let Some(last) = segments.last_mut() {
        if last.last().map_or(false, |t| is_zip(t)) {
            parsed.zip_code = last.pop();
        }
    }
    drop_empty_tail(&mut segments);
    if let Some(last) = segments.last_mut() {
        parsed.state_name = take_state(last);
    }
    drop_empty_tail(&mut segments);
    let locality_was_separate = segments.len() < original_segments;

    match segments.len() {
        0 => {}
        1 => tag_single_line(&segments[0], locality_was_separate, &mut parsed),
        n => {
            let place = &segments[n - 1];
            if segments[1..].iter().flatten().any(|t| is_zip(t)) {
                return AddressParse::Unparseable(UnparseableReason::StrayPostalCode);
            }
            for middle in &segments[1..n - 1] {
                if !is_occupancy(&middle[0]) {
                    return AddressParse::Unparseable(UnparseableReason::AmbiguousSegment);
                }
                parsed.occupancy = Some(middle.join(" "));
            }
            if is_occupancy(&place[0]) {
                parsed.occupancy = Some(place.join(" "));
            } else if starts_with_digit(&place[0]) {
                return AddressParse::Unparseable(UnparseableReason::RepeatedStreet);
            } else {
                parsed.place_name = Some(place.join(" "));
            }
            tag_street_segment(&segments[0], &mut parsed);
        }
    }

    AddressParse::Parsed(parsed)
}

/// Weighted structural similarity of two free-text addresses in [0, 1],
/// rounded to 3 places. Falls back to token Jaccard when either side
/// cannot be tagged.
pub fn address_score(addr1: &str, addr2: &str) -> f64 {
    let a1 = addr1.to_uppercase();
    let a2 = addr2.to_uppercase();
    match (parse_address(&a1), parse_address(&a2)) {
        (AddressParse::Parsed(p1), AddressParse::Parsed(p2)) => structural_score(&p1, &p2),
        (first, second) => {
            debug!(
                "Address fallback to token overlap: {:?} / {:?}",
                unparseable_reason(&first),
                unparseable_reason(&second)
            );
            token_jaccard(&a1, &a2)
        }
    }
}

fn unparseable_reason(parse: &AddressParse) -> Option<UnparseableReason> {
    match parse {
        AddressParse::Unparseable(reason) => Some(*reason),
        AddressParse::Parsed(_) => None,
    }
}

fn structural_score(p1: &ParsedAddress, p2: &ParsedAddress) -> f64 {
    let mut score = 0.0;

    let street_sim = similarity_ratio(&p1.street_line(), &p2.street_line());
    score += STREET_WEIGHT * street_sim;

    let place_sim = similarity_ratio(
        p1.place_name.as_deref().unwrap_or(""),
        p2.place_name.as_deref().unwrap_or(""),
    );
    score += PLACE_WEIGHT * place_sim;

    // absent on both sides counts as agreement
    if p1.state_name == p2.state_name {
        score += STATE_WEIGHT;
    }
    if p1.zip_code == p2.zip_code {
        score += POSTAL_WEIGHT;
    }

    round_to(score.min(1.0), SCORE_PLACES)
}

/// |A ∩ B| / |A ∪ B| over comma/whitespace tokens; 0.0 if either side is empty.
pub fn token_jaccard(a1: &str, a2: &str) -> f64 {
    let tokens = |s: &str| -> HashSet<String> {
        s.replace(',', " ")
            .split_whitespace()
            .map(str::to_string)
            .collect()
    };
    let t1 = tokens(a1);
    let t2 = tokens(a2);
    if t1.is_empty() || t2.is_empty() {
        return 0.0;
    }
    let intersection = t1.intersection(&t2).count();
    let union = t1.union(&t2).count();
    round_to(intersection as f64 / union as f64, SCORE_PLACES)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(address: &str) -> ParsedAddress {
        match parse_address(address) {
            AddressParse::Parsed(p) => p,
            other => panic!("expected {:?} to parse, got {:?}", address, other),
        }
    }

    #[test]
    fn test_full_sap_style_address() {
        let p = parsed("1600 N Amphitheatre Pkwy, Mountain View, CA 94043");
        assert_eq!(p.address_number.as_deref(), Some("1600"));
        assert_eq!(p.street_pre_directional.as_deref(), Some("N"));
        assert_eq!(p.street_name.as_deref(), Some("AMPHITHEATRE"));
        assert_eq!(p.street_post_type.as_deref(), Some("PKWY"));
        assert_eq!(p.place_name.as_deref(), Some("MOUNTAIN VIEW"));
        assert_eq!(p.state_name.as_deref(), Some("CA"));
        assert_eq!(p.zip_code.as_deref(), Some("94043"));
        assert_eq!(p.street_line(), "1600 N AMPHITHEATRE PKWY");
    }

    #[test]
    fn test_sfdc_style_street_and_state() {
        let p = parsed("500 Oracle Parkway Suite 200, California");
        assert_eq!(p.street_line(), "500 ORACLE PARKWAY");
        assert_eq!(p.occupancy.as_deref(), Some("SUITE 200"));
        assert_eq!(p.state_name.as_deref(), Some("CALIFORNIA"));
        assert_eq!(p.place_name, None);
        assert_eq!(p.zip_code, None);
    }

    #[test]
    fn test_single_line_splits_street_from_place() {
        let p = parsed("123 Main St Apt 4 San Jose, CA 95134-1234");
        assert_eq!(p.street_line(), "123 MAIN ST");
        assert_eq!(p.occupancy.as_deref(), Some("APT 4"));
        assert_eq!(p.place_name.as_deref(), Some("SAN JOSE"));
        assert_eq!(p.zip_code.as_deref(), Some("95134-1234"));
    }

    #[test]
    fn test_post_directional() {
        let p = parsed("100 Park Ave South, New York, NY 10017");
        assert_eq!(p.street_name.as_deref(), Some("PARK"));
        assert_eq!(p.street_post_type.as_deref(), Some("AVE"));
        assert_eq!(p.street_post_directional.as_deref(), Some("SOUTH"));
        assert_eq!(p.place_name.as_deref(), Some("NEW YORK"));
    }

    #[test]
    fn test_locality_without_street() {
        let p = parsed("San Jose, CA 95134");
        assert_eq!(p.street_line(), "");
        assert_eq!(p.place_name.as_deref(), Some("SAN JOSE"));
    }

    #[test]
    fn test_unparseable_shapes() {
        assert_eq!(
            parse_address("1 Main St, 2 Elm St"),
            AddressParse::Unparseable(UnparseableReason::RepeatedStreet)
        );
        assert_eq!(
            parse_address("1 Main St, Riverside Campus, Springfield, IL"),
            AddressParse::Unparseable(UnparseableReason::AmbiguousSegment)
        );
        assert_eq!(
            parse_address("1 Main St, 95134 Springfield, IL"),
            AddressParse::Unparseable(UnparseableReason::StrayPostalCode)
        );
    }

    #[test]
    fn test_identical_addresses_score_one() {
        let a = "1600 N Amphitheatre Pkwy, Mountain View, CA 94043";
        assert_eq!(address_score(a, a), 1.0);
        assert_eq!(address_score("1 Main St, CA", "1 MAIN ST, CA"), 1.0);
    }

    #[test]
    fn test_disjoint_addresses_score_low() {
        let score = address_score(
            "123 Main St, Springfield, IL 62701",
            "9 Ocean Blvd, Miami, FL 33101",
        );
        assert!(score < 0.3, "score was {}", score);
    }

    #[test]
    fn test_component_weights() {
        // same street, different city, same state, different zip: 0.4 + 0.2
        let score = address_score(
            "10 Elm St, Dover, DE 19901",
            "10 Elm St, Lewes, DE 19958",
        );
        let expected = round_to(
            0.4 + 0.3 * similarity_ratio("DOVER", "LEWES") + 0.2,
            3,
        );
        assert_eq!(score, expected);
    }

    #[test]
    fn test_fallback_to_jaccard() {
        let a = "1 Main St, 2 Elm St";
        let b = "1 Main St, 3 Oak St";
        let score = address_score(a, b);
        // tokens {1, MAIN, ST, 2, ELM} vs {1, MAIN, ST, 3, OAK}
        assert_eq!(score, round_to(3.0 / 7.0, 3));
        assert!((0.0..=1.0).contains(&score));
        assert_eq!(address_score(a, a), 1.0);
    }

    #[test]
    fn test_blank_address_has_no_components() {
        assert_eq!(
            parse_address("  , "),
            AddressParse::Parsed(ParsedAddress::default())
        );
        assert_eq!(parsed("").street_line(), "");
    }

    #[test]
    fn test_blank_addresses_score_structurally() {
        // nothing on either side: every component agrees
        assert_eq!(address_score("", ""), 1.0);
        assert_eq!(address_score("", " , "), 1.0);
        // street differs, both places absent, state differs, both zips absent
        assert_eq!(address_score("", "1 Main St, CA"), 0.4);
        assert_eq!(token_jaccard("", ""), 0.0);
    }
}
