//! Boolean and phrase retrieval over a fixed document collection.
//!
//! A [`DocumentStore`] holds normalized token sequences; from it a
//! [`Vocabulary`] and three immutable indexes are built (single-term inverted,
//! positional and biword). [`QueryPipeline`] normalizes a query, repairs
//! out-of-vocabulary terms with the [`SpellingCorrector`] and evaluates it with
//! the boolean or phrase evaluator.

pub mod biword;
pub mod boolean;
pub mod document;
pub mod error;
pub mod index_set;
pub mod inverted;
pub mod persist;
pub mod phrase;
pub mod pipeline;
pub mod positional;
pub mod postings;
pub mod spelling;
pub mod stats;
pub mod tokenizer;
pub mod vocabulary;

pub type TermId = u32;
pub type DocId = u32;

pub use biword::BiwordIndex;
pub use boolean::{BooleanEvaluator, Expr};
pub use document::{DocMeta, Document, DocumentStore, GrowthPoint, RawDocument};
pub use error::{Result, SearchError};
pub use index_set::{IndexSet, IndexSnapshot};
pub use inverted::{InvertedIndex, TermLookup};
pub use phrase::PhraseEvaluator;
pub use pipeline::{Correction, Query, QueryPipeline, SearchResult};
pub use positional::PositionalIndex;
pub use postings::PostingList;
pub use spelling::{CorrectionStrategy, CorrectorConfig, SpellingCorrector};
pub use tokenizer::{Normalizer, NormalizerConfig, Stemming};
pub use vocabulary::Vocabulary;
