use crate::DocId;

pub type Result<T, E = SearchError> = std::result::Result<T, E>;

/// Errors surfaced by index construction and query evaluation.
///
/// Queries that are valid but match nothing (unknown terms, no correction,
/// no matching documents) are not errors; they produce an empty result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// No documents were supplied to a builder.
    #[error("cannot build an index over an empty document collection")]
    EmptyCollection,

    /// Positional offsets for a term/document pair did not arrive strictly increasing.
    #[error("positions for term '{term}' in document {doc_id} are not strictly increasing")]
    UnsortedInput { term: String, doc_id: DocId },

    /// Malformed boolean or phrase query.
    #[error("query syntax error: {0}")]
    QuerySyntax(String),

    /// Phrase query with no terms.
    #[error("phrase query contains no terms")]
    EmptyPhrase,

    /// A builder was given a vocabulary that does not cover the document store.
    #[error("term '{0}' is missing from the vocabulary")]
    TermNotInVocabulary(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A snapshot references terms or documents it does not declare.
    #[error("snapshot mismatch: {0}")]
    SnapshotMismatch(String),
}
