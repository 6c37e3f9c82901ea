use crate::biword::{BiwordIndex, BiwordSnapshot};
use crate::boolean::BooleanEvaluator;
use crate::document::{DocMeta, DocumentStore};
use crate::error::{Result, SearchError};
use crate::inverted::{InvertedIndex, InvertedSnapshot};
use crate::phrase::PhraseEvaluator;
use crate::positional::{PositionalIndex, PositionalSnapshot};
use crate::stats::IndexComparison;
use crate::tokenizer::NormalizerConfig;
use crate::vocabulary::{TermEntry, Vocabulary};
use crate::DocId;
use serde::{Deserialize, Serialize};

/// Vocabulary, the three indexes and per-document metadata for one collection.
///
/// Built once and never mutated; a changed collection needs a new `IndexSet`.
#[derive(Debug, Clone)]
pub struct IndexSet {
    normalizer: NormalizerConfig,
    documents: Vec<DocMeta>,
    vocabulary: Vocabulary,
    inverted: InvertedIndex,
    positional: PositionalIndex,
    biword: BiwordIndex,
}

/// Serializable form of an [`IndexSet`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub normalizer: NormalizerConfig,
    pub documents: Vec<DocMeta>,
    pub vocabulary: Vec<TermEntry>,
    pub inverted: InvertedSnapshot,
    pub positional: PositionalSnapshot,
    pub biword: BiwordSnapshot,
}

impl IndexSet {
    /// `normalizer` must be the configuration `store` was loaded with; it is
    /// kept so queries are normalized the same way.
    pub fn build(store: &DocumentStore, normalizer: NormalizerConfig) -> Result<Self> {
        if store.is_empty() {
            return Err(SearchError::EmptyCollection);
        }
        let vocabulary = Vocabulary::build(store);
        let inverted = InvertedIndex::build(store, &vocabulary)?;
        let positional = PositionalIndex::build(store, &vocabulary)?;
        let biword = BiwordIndex::build(store, &vocabulary)?;
        tracing::info!(documents = store.len(), terms = vocabulary.len(), "built index set");
        Ok(Self { normalizer, documents: store.metadata(), vocabulary, inverted, positional, biword })
    }

    pub fn normalizer(&self) -> NormalizerConfig {
        self.normalizer
    }

    pub fn num_docs(&self) -> u32 {
        self.documents.len() as u32
    }

    pub fn document(&self, doc_id: DocId) -> Option<&DocMeta> {
        self.documents.get(doc_id as usize)
    }

    pub fn documents(&self) -> &[DocMeta] {
        &self.documents
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn inverted(&self) -> &InvertedIndex {
        &self.inverted
    }

    pub fn positional(&self) -> &PositionalIndex {
        &self.positional
    }

    pub fn biword(&self) -> &BiwordIndex {
        &self.biword
    }

    pub fn boolean(&self) -> BooleanEvaluator<'_> {
        BooleanEvaluator::new(&self.vocabulary, &self.inverted)
    }

    pub fn phrase(&self) -> PhraseEvaluator<'_> {
        PhraseEvaluator::new(&self.vocabulary, &self.inverted, &self.biword, &self.positional)
    }

    pub fn comparison(&self) -> IndexComparison {
        IndexComparison {
            inverted: self.inverted.size(),
            positional: self.positional.size(),
            biword: self.biword.size(),
        }
    }

    pub fn export(&self) -> IndexSnapshot {
        IndexSnapshot {
            normalizer: self.normalizer,
            documents: self.documents.clone(),
            vocabulary: self.vocabulary.export(),
            inverted: self.inverted.export(&self.vocabulary),
            positional: self.positional.export(&self.vocabulary),
            biword: self.biword.export(&self.vocabulary),
        }
    }

    pub fn import(snapshot: IndexSnapshot) -> Result<Self> {
        let num_docs = snapshot.documents.len() as u32;
        if num_docs == 0 {
            return Err(SearchError::EmptyCollection);
        }
        let counts = [snapshot.inverted.num_docs, snapshot.positional.num_docs, snapshot.biword.num_docs];
        if counts.iter().any(|&n| n != num_docs) {
            return Err(SearchError::SnapshotMismatch(format!(
                "document counts disagree: {num_docs} documents, indexes report {counts:?}"
            )));
        }
        let vocabulary = Vocabulary::import(snapshot.vocabulary)?;
        let inverted = InvertedIndex::import(snapshot.inverted, &vocabulary)?;
        let positional = PositionalIndex::import(snapshot.positional, &vocabulary)?;
        let biword = BiwordIndex::import(snapshot.biword, &vocabulary)?;
        check_consistency(&vocabulary, &inverted, &positional, &biword)?;
        Ok(Self { normalizer: snapshot.normalizer, documents: snapshot.documents, vocabulary, inverted, positional, biword })
    }
}

/// The indexes of one collection must agree with each other: a term's
/// positional documents are its inverted postings, its document frequency is
/// their length, and a biword only occurs where both of its terms do.
fn check_consistency(
    vocabulary: &Vocabulary,
    inverted: &InvertedIndex,
    positional: &PositionalIndex,
    biword: &BiwordIndex,
) -> Result<()> {
    for (tid, entry) in vocabulary.iter() {
        let postings = inverted.postings(tid);
        if positional.documents(tid) != *postings {
            return Err(SearchError::SnapshotMismatch(format!(
                "positional and inverted documents differ for '{}'",
                entry.term
            )));
        }
        if postings.len() != entry.document_frequency as usize {
            return Err(SearchError::SnapshotMismatch(format!(
                "'{}' has document frequency {} but {} postings",
                entry.term,
                entry.document_frequency,
                postings.len()
            )));
        }
    }
    for ((a, b), list) in biword.iter() {
        let both = inverted.postings(a).intersect(inverted.postings(b));
        if !list.difference(&both).is_empty() {
            return Err(SearchError::SnapshotMismatch(format!(
                "biword '{} {}' lists documents missing one of its terms",
                vocabulary.term(a),
                vocabulary.term(b)
            )));
        }
    }
    Ok(())
}
