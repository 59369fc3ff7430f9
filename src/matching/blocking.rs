// src/matching/blocking.rs - First-letter blocking over canonical names
use std::collections::HashMap;

/// First character of a canonical name; `Empty` for the empty name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKey {
    Empty,
    Letter(char),
}

impl BlockKey {
    pub fn of(canonical_name: &str) -> Self {
        canonical_name
            .chars()
            .next()
            .map_or(BlockKey::Empty, BlockKey::Letter)
    }
}

/// Target positions bucketed by block key, input order kept within a bucket.
/// Built once per stage; records whose keys differ are never compared.
#[derive(Debug, Default)]
pub struct BlockIndex {
    blocks: HashMap<BlockKey, Vec<usize>>,
}

impl BlockIndex {
    /// Indexes `canonical_names[i]` for every `i` where `eligible(i)` holds.
    pub fn build<F>(canonical_names: &[String], eligible: F) -> Self
    where
        F: Fn(usize) -> bool,
    {
        let mut blocks: HashMap<BlockKey, Vec<usize>> = HashMap::new();
        for (i, name) in canonical_names.iter().enumerate() {
            if eligible(i) {
                blocks.entry(BlockKey::of(name)).or_default().push(i);
            }
        }
        Self { blocks }
    }

    /// Positions sharing the block key of `canonical_name`.
    pub fn candidates(&self, canonical_name: &str) -> &[usize] {
        self.blocks
            .get(&BlockKey::of(canonical_name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn indexed_count(&self) -> usize {
        self.blocks.values().map(Vec::len).sum()
    }

    pub fn largest_block(&self) -> usize {
        self.blocks.values().map(Vec::len).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_block_key() {
        assert_eq!(BlockKey::of("ACME"), BlockKey::Letter('A'));
        assert_eq!(BlockKey::of(""), BlockKey::Empty);
        assert_eq!(BlockKey::of("3M"), BlockKey::Letter('3'));
    }

    #[test]
    fn test_candidates_keep_input_order_and_respect_eligibility() {
        let canon = names(&["ACME", "GLOBEX", "ACME WEST", "", "ACMEX"]);
        let index = BlockIndex::build(&canon, |i| i != 4);
        assert_eq!(index.candidates("ACE"), &[0, 2]);
        assert_eq!(index.candidates("GLOBAL"), &[1]);
        assert_eq!(index.candidates(""), &[3]);
        assert!(index.candidates("ZETA").is_empty());
        assert_eq!(index.block_count(), 3);
        assert_eq!(index.indexed_count(), 4);
        assert_eq!(index.largest_block(), 2);
    }

    #[test]
    fn test_different_first_letter_never_a_candidate() {
        // "THE ACME" and "ACME" are close but land in different blocks
        let canon = names(&["THE ACME"]);
        let index = BlockIndex::build(&canon, |_| true);
        assert!(index.candidates("ACME").is_empty());
    }
}
