//! Positional index: term -> document id -> strictly increasing token offsets.

use crate::document::DocumentStore;
use crate::error::{Result, SearchError};
use crate::postings::PostingList;
use crate::stats::IndexSize;
use crate::vocabulary::Vocabulary;
use crate::{DocId, TermId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocPositions {
    pub doc_id: DocId,
    pub positions: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionalIndex {
    /// Indexed by term id; each list is sorted by document id.
    postings: Vec<Vec<DocPositions>>,
    num_docs: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionalSnapshot {
    pub num_docs: u32,
    pub postings: BTreeMap<String, BTreeMap<DocId, Vec<u32>>>,
}

impl PositionalIndex {
    fn empty(vocab: &Vocabulary, num_docs: u32) -> Self {
        Self { postings: vec![Vec::new(); vocab.len()], num_docs }
    }

    pub fn build(store: &DocumentStore, vocab: &Vocabulary) -> Result<Self> {
        if store.is_empty() {
            return Err(SearchError::EmptyCollection);
        }
        let mut index = Self::empty(vocab, store.num_docs());
        for doc in store.iter() {
            for (offset, token) in doc.tokens.iter().enumerate() {
                let tid = vocab.id(token).ok_or_else(|| SearchError::TermNotInVocabulary(token.clone()))?;
                index.record(vocab, tid, doc.id, offset as u32)?;
            }
        }
        tracing::debug!(terms = vocab.len(), positions = index.size().positions, "built positional index");
        Ok(index)
    }

    /// Builds from explicit `(term, doc_id, offset)` occurrences.
    ///
    /// Occurrences must arrive ordered by document and, within a document,
    /// by strictly increasing offset; anything else fails with
    /// [`SearchError::UnsortedInput`] instead of being reordered.
    pub fn from_occurrences<'t, I>(vocab: &Vocabulary, num_docs: u32, occurrences: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'t str, DocId, u32)>,
    {
        if num_docs == 0 {
            return Err(SearchError::EmptyCollection);
        }
        let mut index = Self::empty(vocab, num_docs);
        for (term, doc_id, offset) in occurrences {
            let tid = vocab.id(term).ok_or_else(|| SearchError::TermNotInVocabulary(term.to_string()))?;
            index.record(vocab, tid, doc_id, offset)?;
        }
        Ok(index)
    }

    fn record(&mut self, vocab: &Vocabulary, tid: TermId, doc_id: DocId, offset: u32) -> Result<()> {
        let list = &mut self.postings[tid as usize];
        let unsorted = || SearchError::UnsortedInput { term: vocab.term(tid).to_string(), doc_id };
        match list.last_mut() {
            Some(last) if last.doc_id == doc_id => {
                if last.positions.last().is_some_and(|&p| p >= offset) {
                    return Err(unsorted());
                }
                last.positions.push(offset);
            }
            Some(last) if last.doc_id > doc_id => return Err(unsorted()),
            _ => list.push(DocPositions { doc_id, positions: vec![offset] }),
        }
        Ok(())
    }

    pub fn num_docs(&self) -> u32 {
        self.num_docs
    }

    /// Panics if `term_id` did not come from the vocabulary the index was built with.
    pub fn entries(&self, term_id: TermId) -> &[DocPositions] {
        &self.postings[term_id as usize]
    }

    pub fn lookup(&self, vocab: &Vocabulary, term: &str) -> Option<&[DocPositions]> {
        vocab.id(term).and_then(|tid| self.postings.get(tid as usize)).map(Vec::as_slice)
    }

    /// `None` if the term does not occur in the document.
    /// Panics if `term_id` did not come from the vocabulary the index was built with.
    pub fn positions(&self, term_id: TermId, doc_id: DocId) -> Option<&[u32]> {
        let list = &self.postings[term_id as usize];
        list.binary_search_by_key(&doc_id, |e| e.doc_id).ok().map(|i| list[i].positions.as_slice())
    }

    /// Documents containing the term, without positions.
    /// Panics if `term_id` did not come from the vocabulary the index was built with.
    pub fn documents(&self, term_id: TermId) -> PostingList {
        self.postings[term_id as usize].iter().map(|e| e.doc_id).collect()
    }

    /// Panics on a foreign `term_id`, like [`PositionalIndex::positions`].
    pub fn term_frequency(&self, term_id: TermId, doc_id: DocId) -> usize {
        self.positions(term_id, doc_id).map_or(0, <[u32]>::len)
    }

    pub fn size(&self) -> IndexSize {
        IndexSize {
            keys: self.postings.iter().filter(|p| !p.is_empty()).count(),
            postings: self.postings.iter().map(|p| p.len() as u64).sum(),
            positions: self.postings.iter().flatten().map(|e| e.positions.len() as u64).sum(),
        }
    }

    pub fn export(&self, vocab: &Vocabulary) -> PositionalSnapshot {
        let postings = self
            .postings
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_empty())
            .map(|(tid, entries)| {
                let docs = entries.iter().map(|e| (e.doc_id, e.positions.clone())).collect();
                (vocab.term(tid as TermId).to_string(), docs)
            })
            .collect();
        PositionalSnapshot { num_docs: self.num_docs, postings }
    }

    pub fn import(snapshot: PositionalSnapshot, vocab: &Vocabulary) -> Result<Self> {
        let mut index = Self::empty(vocab, snapshot.num_docs);
        for (term, docs) in snapshot.postings {
            let tid = vocab
                .id(&term)
                .ok_or_else(|| SearchError::SnapshotMismatch(format!("positional term '{term}' not in vocabulary")))?;
            for (doc_id, positions) in docs {
                if doc_id >= snapshot.num_docs {
                    return Err(SearchError::SnapshotMismatch(format!(
                        "document {doc_id} out of range for {} documents",
                        snapshot.num_docs
                    )));
                }
                for offset in positions {
                    index.record(vocab, tid, doc_id, offset)?;
                }
            }
        }
        Ok(index)
    }
}
