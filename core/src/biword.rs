//! Biword index: ordered pair of adjacent terms -> sorted set of document ids.

use crate::document::DocumentStore;
use crate::error::{Result, SearchError};
use crate::inverted::{check_doc_range, TermLookup};
use crate::postings::PostingList;
use crate::stats::IndexSize;
use crate::vocabulary::Vocabulary;
use crate::TermId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BiwordIndex {
    postings: HashMap<(TermId, TermId), PostingList>,
    num_docs: u32,
}

/// Nested form of a [`BiwordIndex`]: first term -> second term -> document ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiwordSnapshot {
    pub num_docs: u32,
    pub postings: BTreeMap<String, BTreeMap<String, PostingList>>,
}

impl BiwordIndex {
    pub fn build(store: &DocumentStore, vocab: &Vocabulary) -> Result<Self> {
        if store.is_empty() {
            return Err(SearchError::EmptyCollection);
        }
        let mut postings: HashMap<(TermId, TermId), PostingList> = HashMap::new();
        for doc in store.iter() {
            let ids = doc
                .tokens
                .iter()
                .map(|t| vocab.id(t).ok_or_else(|| SearchError::TermNotInVocabulary(t.clone())))
                .collect::<Result<Vec<_>>>()?;
            for pair in ids.windows(2) {
                // repeated adjacency within one document is absorbed by the dedup insert
                postings.entry((pair[0], pair[1])).or_default().insert(doc.id);
            }
        }
        let index = Self { postings, num_docs: store.num_docs() };
        tracing::debug!(biwords = index.postings.len(), "built biword index");
        Ok(index)
    }

    pub fn num_docs(&self) -> u32 {
        self.num_docs
    }

    pub fn get(&self, first: TermId, second: TermId) -> Option<&PostingList> {
        self.postings.get(&(first, second))
    }

    /// Every stored biword with its documents, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = ((TermId, TermId), &PostingList)> {
        self.postings.iter().map(|(&pair, list)| (pair, list))
    }

    pub fn lookup<'a>(&'a self, vocab: &Vocabulary, first: &str, second: &str) -> TermLookup<'a> {
        let found = vocab.id(first).zip(vocab.id(second)).and_then(|(a, b)| self.get(a, b));
        match found {
            Some(p) => TermLookup::Found(p),
            None => TermLookup::Unknown,
        }
    }

    pub fn size(&self) -> IndexSize {
        IndexSize {
            keys: self.postings.len(),
            postings: self.postings.values().map(|p| p.len() as u64).sum(),
            positions: 0,
        }
    }

    pub fn export(&self, vocab: &Vocabulary) -> BiwordSnapshot {
        let mut postings: BTreeMap<String, BTreeMap<String, PostingList>> = BTreeMap::new();
        for (&(a, b), list) in &self.postings {
            postings
                .entry(vocab.term(a).to_string())
                .or_default()
                .insert(vocab.term(b).to_string(), list.clone());
        }
        BiwordSnapshot { num_docs: self.num_docs, postings }
    }

    pub fn import(snapshot: BiwordSnapshot, vocab: &Vocabulary) -> Result<Self> {
        let term_id = |term: &str| {
            vocab
                .id(term)
                .ok_or_else(|| SearchError::SnapshotMismatch(format!("biword term '{term}' not in vocabulary")))
        };
        let mut postings = HashMap::new();
        for (first, seconds) in snapshot.postings {
            let a = term_id(&first)?;
            for (second, list) in seconds {
                let b = term_id(&second)?;
                check_doc_range(&list, snapshot.num_docs)?;
                if !list.is_empty() {
                    postings.insert((a, b), list);
                }
            }
        }
        Ok(Self { postings, num_docs: snapshot.num_docs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (DocumentStore, Vocabulary) {
        let store = DocumentStore::from_tokens(vec![
            ("d0", vec!["the", "cat", "sat"]),
            ("d1", vec!["the", "cat", "ran", "the", "cat"]),
            ("d2", vec!["cat"]),
        ]);
        let vocab = Vocabulary::build(&store);
        (store, vocab)
    }

    #[test]
    fn adjacent_pairs_are_indexed_once_per_document() {
        let (store, vocab) = fixture();
        let index = BiwordIndex::build(&store, &vocab).unwrap();
        assert_eq!(index.lookup(&vocab, "the", "cat").to_postings().as_slice(), &[0, 1]);
        assert_eq!(index.lookup(&vocab, "cat", "sat").to_postings().as_slice(), &[0]);
        assert_eq!(index.lookup(&vocab, "cat", "the"), TermLookup::Unknown);
        assert_eq!(index.lookup(&vocab, "ran", "the").to_postings().as_slice(), &[1]);
    }

    #[test]
    fn short_documents_contribute_nothing() {
        let store = DocumentStore::from_tokens(vec![("d0", vec!["solo"]), ("d1", vec![])]);
        let vocab = Vocabulary::build(&store);
        let index = BiwordIndex::build(&store, &vocab).unwrap();
        assert_eq!(index.size(), IndexSize::default());
    }

    #[test]
    fn pair_order_matters() {
        let (store, vocab) = fixture();
        let index = BiwordIndex::build(&store, &vocab).unwrap();
        assert_eq!(index.lookup(&vocab, "cat", "ran").to_postings().as_slice(), &[1]);
        assert_eq!(index.lookup(&vocab, "ran", "cat"), TermLookup::Unknown);
    }

    #[test]
    fn export_nests_by_first_term() {
        let (store, vocab) = fixture();
        let snap = BiwordIndex::build(&store, &vocab).unwrap().export(&vocab);
        let the = &snap.postings["the"];
        assert_eq!(the["cat"].as_slice(), &[0, 1]);
        assert_eq!(snap.postings["cat"].len(), 2);
    }
}
