use crate::tokenizer::Normalizer;
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Already-extracted plain text handed over by a document source.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub label: String,
    pub text: String,
}

impl RawDocument {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self { label: label.into(), text: text.into() }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocId,
    pub tokens: Vec<String>,
    pub label: String,
}

/// Metadata kept for every document once the token sequences are no longer needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMeta {
    pub label: String,
    pub token_count: u32,
}

/// One point of the vocabulary growth curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthPoint {
    pub documents: u32,
    pub tokens: u64,
    pub vocabulary: u32,
}

/// Owns the normalized token sequence of every document.
///
/// Ids are assigned densely from zero in load order and never change.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    docs: Vec<Document>,
}

impl DocumentStore {
    pub fn load<I>(raw: I, normalizer: &Normalizer) -> Self
    where
        I: IntoIterator<Item = RawDocument>,
    {
        let docs = raw
            .into_iter()
            .enumerate()
            .map(|(i, d)| Document { id: i as DocId, tokens: normalizer.normalize(&d.text), label: d.label })
            .collect::<Vec<_>>();
        tracing::debug!(num_docs = docs.len(), "loaded document store");
        Self { docs }
    }

    /// Builds a store from token sequences that are already normalized.
    pub fn from_tokens<I, L, T>(docs: I) -> Self
    where
        I: IntoIterator<Item = (L, Vec<T>)>,
        L: Into<String>,
        T: Into<String>,
    {
        let docs = docs
            .into_iter()
            .enumerate()
            .map(|(i, (label, tokens))| Document {
                id: i as DocId,
                tokens: tokens.into_iter().map(Into::into).collect(),
                label: label.into(),
            })
            .collect();
        Self { docs }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn num_docs(&self) -> u32 {
        self.docs.len() as u32
    }

    pub fn get(&self, doc_id: DocId) -> Option<&Document> {
        self.docs.get(doc_id as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.docs.iter()
    }

    pub fn metadata(&self) -> Vec<DocMeta> {
        self.docs
            .iter()
            .map(|d| DocMeta { label: d.label.clone(), token_count: d.tokens.len() as u32 })
            .collect()
    }

    /// Vocabulary size after each document, in load order (Heaps' law input).
    pub fn growth(&self) -> Vec<GrowthPoint> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut tokens = 0u64;
        self.docs
            .iter()
            .enumerate()
            .map(|(i, doc)| {
                tokens += doc.tokens.len() as u64;
                seen.extend(doc.tokens.iter().map(String::as_str));
                GrowthPoint { documents: i as u32 + 1, tokens, vocabulary: seen.len() as u32 }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::NormalizerConfig;

    #[test]
    fn ids_are_dense_in_load_order() {
        let normalizer = Normalizer::new(NormalizerConfig::english());
        let store = DocumentStore::load(
            vec![RawDocument::new("a.txt", "The cat sat"), RawDocument::new("b.txt", ""), RawDocument::new("c.txt", "Dogs run")],
            &normalizer,
        );
        let ids: Vec<DocId> = store.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(store.get(0).unwrap().tokens, vec!["cat", "sat"]);
        assert!(store.get(1).unwrap().tokens.is_empty());
        assert_eq!(store.get(2).unwrap().label, "c.txt");
    }

    #[test]
    fn growth_tracks_new_terms() {
        let store = DocumentStore::from_tokens(vec![("d0", vec!["a", "b", "a"]), ("d1", vec!["b", "c"]), ("d2", vec![])]);
        let g = store.growth();
        assert_eq!(
            g,
            vec![
                GrowthPoint { documents: 1, tokens: 3, vocabulary: 2 },
                GrowthPoint { documents: 2, tokens: 5, vocabulary: 3 },
                GrowthPoint { documents: 3, tokens: 5, vocabulary: 3 },
            ]
        );
    }
}
