//! Single-term inverted index: term -> sorted set of document ids.

use crate::document::DocumentStore;
use crate::error::{Result, SearchError};
use crate::postings::PostingList;
use crate::stats::IndexSize;
use crate::vocabulary::Vocabulary;
use crate::TermId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of looking a query term up in an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermLookup<'a> {
    Found(&'a PostingList),
    Unknown,
}

impl<'a> TermLookup<'a> {
    /// Postings of a found term; an unknown term matches nothing.
    pub fn to_postings(self) -> PostingList {
        match self {
            TermLookup::Found(p) => p.clone(),
            TermLookup::Unknown => PostingList::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvertedIndex {
    /// Indexed by term id.
    postings: Vec<PostingList>,
    num_docs: u32,
}

/// Language-neutral form of an [`InvertedIndex`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvertedSnapshot {
    pub num_docs: u32,
    pub postings: BTreeMap<String, PostingList>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvertedStats {
    pub distinct_terms: usize,
    pub documents: u32,
    pub avg_distinct_terms_per_doc: f64,
    pub max_posting_length: usize,
    pub total_postings: u64,
    /// document frequency -> number of terms with that document frequency
    pub document_frequency_histogram: BTreeMap<usize, usize>,
}

impl InvertedIndex {
    pub fn build(store: &DocumentStore, vocab: &Vocabulary) -> Result<Self> {
        if store.is_empty() {
            return Err(SearchError::EmptyCollection);
        }
        let mut postings = vec![PostingList::new(); vocab.len()];
        for doc in store.iter() {
            for token in &doc.tokens {
                let tid = vocab.id(token).ok_or_else(|| SearchError::TermNotInVocabulary(token.clone()))?;
                postings[tid as usize].insert(doc.id);
            }
        }
        let index = Self { postings, num_docs: store.num_docs() };
        tracing::debug!(terms = vocab.len(), postings = index.size().postings, "built inverted index");
        Ok(index)
    }

    pub fn num_docs(&self) -> u32 {
        self.num_docs
    }

    /// All document ids of the collection.
    pub fn universe(&self) -> PostingList {
        PostingList::universe(self.num_docs)
    }

    /// Panics if `term_id` did not come from the vocabulary the index was built with.
    pub fn postings(&self, term_id: TermId) -> &PostingList {
        &self.postings[term_id as usize]
    }

    pub fn lookup<'a>(&'a self, vocab: &Vocabulary, term: &str) -> TermLookup<'a> {
        match vocab.id(term).and_then(|tid| self.postings.get(tid as usize)) {
            Some(p) => TermLookup::Found(p),
            None => TermLookup::Unknown,
        }
    }

    pub fn size(&self) -> IndexSize {
        IndexSize {
            keys: self.postings.iter().filter(|p| !p.is_empty()).count(),
            postings: self.postings.iter().map(|p| p.len() as u64).sum(),
            positions: 0,
        }
    }

    pub fn stats(&self) -> InvertedStats {
        let mut histogram = BTreeMap::new();
        let mut distinct_per_doc = vec![0u64; self.num_docs as usize];
        for p in self.postings.iter().filter(|p| !p.is_empty()) {
            *histogram.entry(p.len()).or_insert(0) += 1;
            for doc_id in p.iter() {
                distinct_per_doc[doc_id as usize] += 1;
            }
        }
        let size = self.size();
        let avg = if self.num_docs == 0 {
            0.0
        } else {
            distinct_per_doc.iter().sum::<u64>() as f64 / self.num_docs as f64
        };
        InvertedStats {
            distinct_terms: size.keys,
            documents: self.num_docs,
            avg_distinct_terms_per_doc: avg,
            max_posting_length: self.postings.iter().map(PostingList::len).max().unwrap_or(0),
            total_postings: size.postings,
            document_frequency_histogram: histogram,
        }
    }

    pub fn export(&self, vocab: &Vocabulary) -> InvertedSnapshot {
        let postings = self
            .postings
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_empty())
            .map(|(tid, p)| (vocab.term(tid as TermId).to_string(), p.clone()))
            .collect();
        InvertedSnapshot { num_docs: self.num_docs, postings }
    }

    pub fn import(snapshot: InvertedSnapshot, vocab: &Vocabulary) -> Result<Self> {
        let mut postings = vec![PostingList::new(); vocab.len()];
        for (term, list) in snapshot.postings {
            let tid = vocab
                .id(&term)
                .ok_or_else(|| SearchError::SnapshotMismatch(format!("inverted term '{term}' not in vocabulary")))?;
            check_doc_range(&list, snapshot.num_docs)?;
            postings[tid as usize] = list;
        }
        Ok(Self { postings, num_docs: snapshot.num_docs })
    }
}

pub(crate) fn check_doc_range(list: &PostingList, num_docs: u32) -> Result<()> {
    match list.as_slice().last() {
        Some(&last) if last >= num_docs => Err(SearchError::SnapshotMismatch(format!(
            "document {last} out of range for {num_docs} documents"
        ))),
        _ => Ok(()),
    }
}

/// Convenience used by the evaluators: postings of `term` or an empty list.
pub fn postings_or_empty(index: &InvertedIndex, vocab: &Vocabulary, term: &str) -> PostingList {
    index.lookup(vocab, term).to_postings()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (DocumentStore, Vocabulary) {
        let store = DocumentStore::from_tokens(vec![
            ("d0", vec!["the", "cat", "sat", "cat"]),
            ("d1", vec!["the", "cat", "ran"]),
            ("d2", vec![]),
        ]);
        let vocab = Vocabulary::build(&store);
        (store, vocab)
    }

    #[test]
    fn postings_are_sorted_and_deduplicated() {
        let (store, vocab) = fixture();
        let index = InvertedIndex::build(&store, &vocab).unwrap();
        assert_eq!(postings_or_empty(&index, &vocab, "cat").as_slice(), &[0, 1]);
        assert_eq!(postings_or_empty(&index, &vocab, "sat").as_slice(), &[0]);
        assert_eq!(index.lookup(&vocab, "dog"), TermLookup::Unknown);
        assert_eq!(index.num_docs(), 3);
    }

    #[test]
    fn empty_collection_is_rejected() {
        let store = DocumentStore::default();
        let vocab = Vocabulary::build(&store);
        assert_eq!(InvertedIndex::build(&store, &vocab), Err(SearchError::EmptyCollection));
    }

    #[test]
    fn foreign_vocabulary_is_rejected() {
        let (store, _) = fixture();
        let other = Vocabulary::build(&DocumentStore::from_tokens(vec![("x", vec!["cat"])]));
        assert!(matches!(InvertedIndex::build(&store, &other), Err(SearchError::TermNotInVocabulary(_))));
    }

    #[test]
    fn stats_summarize_postings() {
        let (store, vocab) = fixture();
        let stats = InvertedIndex::build(&store, &vocab).unwrap().stats();
        assert_eq!(stats.distinct_terms, 4);
        assert_eq!(stats.max_posting_length, 2);
        assert_eq!(stats.total_postings, 6);
        assert!((stats.avg_distinct_terms_per_doc - 2.0).abs() < 1e-9);
        assert_eq!(stats.document_frequency_histogram.get(&2), Some(&2));
    }

    #[test]
    fn import_rejects_out_of_range_documents() {
        let (store, vocab) = fixture();
        let mut snap = InvertedIndex::build(&store, &vocab).unwrap().export(&vocab);
        snap.num_docs = 1;
        assert!(matches!(InvertedIndex::import(snap, &vocab), Err(SearchError::SnapshotMismatch(_))));
    }
}
