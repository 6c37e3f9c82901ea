//! The set of distinct terms in a document collection.
//!
//! Built once from a [`DocumentStore`] and then only read. Term ids follow
//! lexicographic order, so iterating ids visits terms alphabetically.

use crate::document::DocumentStore;
use crate::error::{Result, SearchError};
use crate::TermId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermEntry {
    pub term: String,
    /// Total occurrences across the collection.
    pub collection_frequency: u64,
    /// Number of documents containing the term.
    pub document_frequency: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    entries: Vec<TermEntry>,
    ids: HashMap<String, TermId>,
}

impl Vocabulary {
    pub fn build(store: &DocumentStore) -> Self {
        let mut counts: BTreeMap<&str, (u64, u32)> = BTreeMap::new();
        for doc in store.iter() {
            let mut seen: HashSet<&str> = HashSet::new();
            for token in &doc.tokens {
                let entry = counts.entry(token.as_str()).or_insert((0, 0));
                entry.0 += 1;
                if seen.insert(token.as_str()) {
                    entry.1 += 1;
                }
            }
        }
        let entries = counts
            .into_iter()
            .map(|(term, (cf, df))| TermEntry { term: term.to_string(), collection_frequency: cf, document_frequency: df })
            .collect();
        Self::from_sorted_entries(entries)
    }

    fn from_sorted_entries(entries: Vec<TermEntry>) -> Self {
        let ids = entries.iter().enumerate().map(|(i, e)| (e.term.clone(), i as TermId)).collect();
        Self { entries, ids }
    }

    /// Rebuilds a vocabulary from exported entries, which must be strictly sorted by term.
    pub fn import(entries: Vec<TermEntry>) -> Result<Self> {
        if let Some(w) = entries.windows(2).find(|w| w[0].term >= w[1].term) {
            return Err(SearchError::SnapshotMismatch(format!(
                "vocabulary entries out of order at '{}' / '{}'",
                w[0].term, w[1].term
            )));
        }
        Ok(Self::from_sorted_entries(entries))
    }

    pub fn export(&self) -> Vec<TermEntry> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn id(&self, term: &str) -> Option<TermId> {
        self.ids.get(term).copied()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.ids.contains_key(term)
    }

    /// Panics if `id` did not come from this vocabulary.
    pub fn term(&self, id: TermId) -> &str {
        &self.entries[id as usize].term
    }

    /// Panics if `id` did not come from this vocabulary.
    pub fn entry(&self, id: TermId) -> &TermEntry {
        &self.entries[id as usize]
    }

    /// Entries in lexicographic term order.
    pub fn iter(&self) -> impl Iterator<Item = (TermId, &TermEntry)> {
        self.entries.iter().enumerate().map(|(i, e)| (i as TermId, e))
    }

    /// Terms ranked by collection frequency, most frequent first (Zipf's law input).
    /// Ties are broken alphabetically.
    pub fn rank_frequency(&self) -> Vec<(&str, u64)> {
        let mut ranked: Vec<(&str, u64)> =
            self.entries.iter().map(|e| (e.term.as_str(), e.collection_frequency)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }

    pub fn total_tokens(&self) -> u64 {
        self.entries.iter().map(|e| e.collection_frequency).sum()
    }
}
