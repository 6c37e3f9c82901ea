//! Spelling correction for query terms missing from the vocabulary.
//!
//! Two strategies rank vocabulary terms against an unknown term:
//! Levenshtein edit distance (lower is better) and character n-gram Jaccard
//! similarity (higher is better). Equal scores are ordered by the
//! lexicographically smallest term, so the top candidate is deterministic.

use crate::error::{Result, SearchError};
use crate::vocabulary::Vocabulary;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

const NGRAM_START: char = '\u{2}';
const NGRAM_END: char = '\u{3}';

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionStrategy {
    #[default]
    EditDistance,
    NgramJaccard,
}

impl std::str::FromStr for CorrectionStrategy {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "edit" | "edit_distance" | "levenshtein" => Ok(CorrectionStrategy::EditDistance),
            "jaccard" | "ngram" | "ngram_jaccard" => Ok(CorrectionStrategy::NgramJaccard),
            other => Err(SearchError::InvalidConfig(format!("unknown correction strategy '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectorConfig {
    pub strategy: CorrectionStrategy,
    /// Largest accepted edit distance.
    pub max_edit_distance: usize,
    pub ngram_size: usize,
    /// Smallest accepted Jaccard similarity, in `[0, 1]`.
    pub min_similarity: f64,
    pub max_candidates: usize,
    /// Vocabulary terms found in fewer documents are never proposed.
    pub min_document_frequency: u32,
}

impl Default for CorrectorConfig {
    fn default() -> Self {
        Self {
            strategy: CorrectionStrategy::EditDistance,
            max_edit_distance: 2,
            ngram_size: 2,
            min_similarity: 0.3,
            max_candidates: 5,
            min_document_frequency: 1,
        }
    }
}

impl CorrectorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.ngram_size == 0 {
            return Err(SearchError::InvalidConfig("ngram_size must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.min_similarity) {
            return Err(SearchError::InvalidConfig(format!(
                "min_similarity must be within [0, 1], got {}",
                self.min_similarity
            )));
        }
        Ok(())
    }
}

/// Jaccard similarity kept as an exact fraction so ties compare exactly.
#[derive(Debug, Clone, Copy)]
pub struct Jaccard {
    pub shared: usize,
    pub total: usize,
}

impl Jaccard {
    pub fn value(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.shared as f64 / self.total as f64
        }
    }
}

impl Ord for Jaccard {
    fn cmp(&self, other: &Self) -> Ordering {
        // a/b vs c/d  <=>  a*d vs c*b
        (self.shared * other.total.max(1)).cmp(&(other.shared * self.total.max(1)))
    }
}

impl PartialEq for Jaccard {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Jaccard {}

impl PartialOrd for Jaccard {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Distance(usize),
    Similarity(Jaccard),
}

impl Score {
    /// Orders better scores first.
    fn rank(&self, other: &Score) -> Ordering {
        match (self, other) {
            (Score::Distance(a), Score::Distance(b)) => a.cmp(b),
            (Score::Similarity(a), Score::Similarity(b)) => b.cmp(a),
            (Score::Distance(_), Score::Similarity(_)) => Ordering::Less,
            (Score::Similarity(_), Score::Distance(_)) => Ordering::Greater,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub term: String,
    pub score: Score,
}

/// Levenshtein distance over chars; insertion, deletion and substitution each cost 1.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0usize; b_chars.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Levenshtein distance if it is at most `max_dist`, pruning rows that already exceed it.
pub fn levenshtein_bounded(a: &str, b: &str, max_dist: usize) -> Option<usize> {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.len().abs_diff(b_chars.len()) > max_dist {
        return None;
    }
    let n = b_chars.len();
    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0usize; n + 1];
    for (i, &ca) in a_chars.iter().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];
        for j in 0..n {
            let cost = usize::from(ca != b_chars[j]);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
            row_min = row_min.min(curr[j + 1]);
        }
        if row_min > max_dist {
            return None;
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    Some(prev[n]).filter(|&d| d <= max_dist)
}

/// Character n-grams of `word`, padded with n-1 start and end markers.
pub fn ngrams(word: &str, n: usize) -> BTreeSet<String> {
    let pad = n.saturating_sub(1);
    let chars: Vec<char> = std::iter::repeat(NGRAM_START)
        .take(pad)
        .chain(word.chars())
        .chain(std::iter::repeat(NGRAM_END).take(pad))
        .collect();
    if n == 0 || chars.len() < n {
        return BTreeSet::new();
    }
    chars.windows(n).map(|w| w.iter().collect()).collect()
}

pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> Jaccard {
    let shared = a.intersection(b).count();
    Jaccard { shared, total: a.len() + b.len() - shared }
}

pub struct SpellingCorrector<'a> {
    vocab: &'a Vocabulary,
    config: CorrectorConfig,
}

impl<'a> SpellingCorrector<'a> {
    pub fn new(vocab: &'a Vocabulary, config: CorrectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { vocab, config })
    }

    pub fn config(&self) -> &CorrectorConfig {
        &self.config
    }

    /// Best-first vocabulary terms within the configured threshold.
    ///
    /// Returns nothing for a term that is already in the vocabulary.
    pub fn candidates(&self, term: &str) -> Vec<Candidate> {
        if self.vocab.contains(term) {
            return Vec::new();
        }
        let eligible = self
            .vocab
            .iter()
            .filter(|(_, e)| e.document_frequency >= self.config.min_document_frequency)
            .map(|(_, e)| e.term.as_str());

        let mut scored: Vec<Candidate> = match self.config.strategy {
            CorrectionStrategy::EditDistance => eligible
                .filter_map(|v| {
                    levenshtein_bounded(term, v, self.config.max_edit_distance)
                        .map(|d| Candidate { term: v.to_string(), score: Score::Distance(d) })
                })
                .collect(),
            CorrectionStrategy::NgramJaccard => {
                let query_grams = ngrams(term, self.config.ngram_size);
                eligible
                    .filter_map(|v| {
                        let sim = jaccard(&query_grams, &ngrams(v, self.config.ngram_size));
                        (sim.value() >= self.config.min_similarity && sim.shared > 0)
                            .then(|| Candidate { term: v.to_string(), score: Score::Similarity(sim) })
                    })
                    .collect()
            }
        };
        scored.sort_by(|a, b| a.score.rank(&b.score).then_with(|| a.term.cmp(&b.term)));
        scored.truncate(self.config.max_candidates.max(1));
        scored
    }

    /// The accepted correction for `term`, or `None` if it is known or nothing is close enough.
    pub fn correct(&self, term: &str) -> Option<String> {
        let best = self.candidates(term).into_iter().next()?;
        tracing::debug!(term, correction = %best.term, score = ?best.score, "corrected query term");
        Some(best.term)
    }
}
