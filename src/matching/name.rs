// src/matching/name.rs - Name canonicalization and the ASCII language filter
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::core::Cell;

/// Corporate suffixes removed as whole words. Punctuation is blanked first,
/// so "INC." and "CO." reduce to these tokens while "L.L.C." stays as the
/// separate letters "L L C".
pub const CORP_SUFFIXES: [&str; 8] = [
    "INC",
    "CORP",
    "CORPORATION",
    "LLC",
    "LTD",
    "LIMITED",
    "COMPANY",
    "CO",
];

static RE_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]").expect("invalid RE_PUNCTUATION"));
static RE_SUFFIXES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b(?:{})\b", CORP_SUFFIXES.join("|"))).expect("invalid RE_SUFFIXES")
});
static RE_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("invalid RE_WHITESPACE"));

/// Canonical comparison form of an organization name: uppercase ASCII,
/// punctuation turned into spaces, corporate suffixes dropped, whitespace
/// collapsed. Idempotent.
pub fn canonicalize(name: &str) -> String {
    let upper: String = name.to_uppercase().chars().filter(char::is_ascii).collect();
    let no_punct = RE_PUNCTUATION.replace_all(&upper, " ");
    let no_suffix = RE_SUFFIXES.replace_all(&no_punct, " ");
    RE_WHITESPACE.replace_all(&no_suffix, " ").trim().to_string()
}

/// `canonicalize` for a possibly-missing value.
pub fn canonicalize_opt(name: Option<&str>) -> String {
    name.map(canonicalize).unwrap_or_default()
}

/// False when any text cell holds a character outside 7-bit ASCII. Numbers,
/// booleans and missing cells are ignored. This is a byte-range check only,
/// not language detection.
pub fn is_english_row(row: &[Cell]) -> bool {
    row.iter().all(|cell| match cell {
        Cell::Text(s) => s.is_ascii(),
        _ => true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffixes_are_stripped() {
        assert_eq!(canonicalize("Acme Inc."), "ACME");
        assert_eq!(canonicalize("Acme"), "ACME");
        assert_eq!(canonicalize("acme corporation"), "ACME");
        assert_eq!(canonicalize("Acme L.L.C."), "ACME L L C");
        assert_eq!(canonicalize("Acme Co., Ltd"), "ACME");
        assert_eq!(canonicalize("Acme Limited"), "ACME");
    }

    #[test]
    fn test_punctuation_becomes_space() {
        assert_eq!(canonicalize("O'Brien & Sons, LLC"), "O BRIEN SONS");
        assert_eq!(canonicalize("  Hewlett-Packard   Enterprise "), "HEWLETT PACKARD ENTERPRISE");
    }

    #[test]
    fn test_suffix_only_removed_as_whole_word() {
        assert_eq!(canonicalize("Costco Wholesale"), "COSTCO WHOLESALE");
        assert_eq!(canonicalize("Incyte"), "INCYTE");
        assert_eq!(canonicalize("Coca-Cola Company"), "COCA COLA");
    }

    #[test]
    fn test_non_ascii_dropped_not_substituted() {
        assert_eq!(canonicalize("Café Nord"), "CAF NORD");
        assert_eq!(canonicalize("Müller GmbH"), "MLLER GMBH");
        assert!(canonicalize("日本電気").is_empty());
    }

    #[test]
    fn test_idempotent() {
        for raw in [
            "Acme Inc.",
            "O'Brien & Sons, LLC",
            "  the co-op company co ",
            "Café Nord Ltd.",
            "INC",
            "",
            "A_B Corp",
        ] {
            let once = canonicalize(raw);
            assert_eq!(canonicalize(&once), once, "not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn test_missing_name_is_empty() {
        assert_eq!(canonicalize_opt(None), "");
        assert_eq!(canonicalize_opt(Some("Globex Corp")), "GLOBEX");
    }

    #[test]
    fn test_language_filter() {
        let foreign = vec![Cell::Text("Café".into()), Cell::Number(1.0)];
        let english = vec![Cell::Text("Cafe".into()), Cell::Empty, Cell::Bool(true)];
        assert!(!is_english_row(&foreign));
        assert!(is_english_row(&english));
        assert!(is_english_row(&[]));
    }
}
