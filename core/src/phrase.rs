//! Phrase queries: biword filtering followed by positional verification.

use crate::biword::BiwordIndex;
use crate::error::{Result, SearchError};
use crate::inverted::{postings_or_empty, InvertedIndex};
use crate::positional::PositionalIndex;
use crate::postings::PostingList;
use crate::vocabulary::Vocabulary;
use crate::{DocId, TermId};

pub struct PhraseEvaluator<'a> {
    vocab: &'a Vocabulary,
    inverted: &'a InvertedIndex,
    biword: &'a BiwordIndex,
    positional: &'a PositionalIndex,
}

impl<'a> PhraseEvaluator<'a> {
    pub fn new(
        vocab: &'a Vocabulary,
        inverted: &'a InvertedIndex,
        biword: &'a BiwordIndex,
        positional: &'a PositionalIndex,
    ) -> Self {
        Self { vocab, inverted, biword, positional }
    }

    /// Documents containing `phrase` as consecutive terms.
    pub fn evaluate<S: AsRef<str>>(&self, phrase: &[S]) -> Result<PostingList> {
        match phrase {
            [] => Err(SearchError::EmptyPhrase),
            [single] => Ok(postings_or_empty(self.inverted, self.vocab, single.as_ref())),
            _ => {
                let candidates = self.biword_candidates(phrase)?;
                Ok(self.verify(phrase, &candidates))
            }
        }
    }

    /// Intersection of the biword postings of every adjacent pair.
    ///
    /// Every match is in this set, but for phrases longer than two terms it may
    /// contain documents where the pairs occur apart from each other.
    pub fn biword_candidates<S: AsRef<str>>(&self, phrase: &[S]) -> Result<PostingList> {
        if phrase.is_empty() {
            return Err(SearchError::EmptyPhrase);
        }
        let mut candidates: Option<PostingList> = None;
        for pair in phrase.windows(2) {
            let postings = self.biword.lookup(self.vocab, pair[0].as_ref(), pair[1].as_ref()).to_postings();
            let next = match candidates {
                None => postings,
                Some(acc) => acc.intersect(&postings),
            };
            if next.is_empty() {
                return Ok(next);
            }
            candidates = Some(next);
        }
        Ok(candidates.unwrap_or_else(|| postings_or_empty(self.inverted, self.vocab, phrase[0].as_ref())))
    }

    /// Phrase evaluation from the positional index alone, without biword filtering.
    pub fn positional_only<S: AsRef<str>>(&self, phrase: &[S]) -> Result<PostingList> {
        if phrase.is_empty() {
            return Err(SearchError::EmptyPhrase);
        }
        let mut candidates: Option<PostingList> = None;
        for term in phrase {
            let docs = match self.vocab.id(term.as_ref()) {
                Some(tid) => self.positional.documents(tid),
                None => return Ok(PostingList::new()),
            };
            candidates = Some(match candidates {
                None => docs,
                Some(acc) => acc.intersect(&docs),
            });
        }
        let candidates = candidates.unwrap_or_default();
        Ok(self.verify(phrase, &candidates))
    }

    fn verify<S: AsRef<str>>(&self, phrase: &[S], candidates: &PostingList) -> PostingList {
        let Some(term_ids) = phrase.iter().map(|t| self.vocab.id(t.as_ref())).collect::<Option<Vec<TermId>>>() else {
            return PostingList::new();
        };
        candidates.iter().filter(|&doc_id| self.has_consecutive_run(&term_ids, doc_id)).collect()
    }

    /// True if some offset `o` has term `i` of the phrase at `o + i` for every `i`.
    fn has_consecutive_run(&self, term_ids: &[TermId], doc_id: DocId) -> bool {
        let Some(lists) = term_ids
            .iter()
            .map(|&tid| self.positional.positions(tid, doc_id))
            .collect::<Option<Vec<&[u32]>>>()
        else {
            return false;
        };
        lists[0].iter().any(|&start| {
            lists
                .iter()
                .enumerate()
                .skip(1)
                .all(|(i, positions)| positions.binary_search(&(start + i as u32)).is_ok())
        })
    }
}
