//! Read-only size figures used to compare the three index structures.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSize {
    /// Non-empty keys (terms or biwords).
    pub keys: usize,
    /// (key, document) pairs.
    pub postings: u64,
    /// Recorded token offsets; zero for indexes without positions.
    pub positions: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexComparison {
    pub inverted: IndexSize,
    pub positional: IndexSize,
    pub biword: IndexSize,
}

impl IndexComparison {
    /// Biword keys per single-term key.
    pub fn biword_key_ratio(&self) -> f64 {
        ratio(self.biword.keys as f64, self.inverted.keys as f64)
    }

    /// Biword postings per single-term posting.
    pub fn biword_postings_ratio(&self) -> f64 {
        ratio(self.biword.postings as f64, self.inverted.postings as f64)
    }

    /// Stored entries (postings plus offsets) of the positional index per single-term posting.
    pub fn positional_entries_ratio(&self) -> f64 {
        let entries = self.positional.postings + self.positional.positions;
        ratio(entries as f64, self.inverted.postings as f64)
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratios_guard_against_empty_indexes() {
        let cmp = IndexComparison {
            inverted: IndexSize::default(),
            positional: IndexSize::default(),
            biword: IndexSize { keys: 3, postings: 4, positions: 0 },
        };
        assert_eq!(cmp.biword_key_ratio(), 0.0);

        let cmp = IndexComparison {
            inverted: IndexSize { keys: 2, postings: 4, positions: 0 },
            positional: IndexSize { keys: 2, postings: 4, positions: 6 },
            biword: IndexSize { keys: 3, postings: 2, positions: 0 },
        };
        assert_eq!(cmp.biword_key_ratio(), 1.5);
        assert_eq!(cmp.biword_postings_ratio(), 0.5);
        assert_eq!(cmp.positional_entries_ratio(), 2.5);
    }
}
