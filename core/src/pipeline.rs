//! normalize query -> correct unknown terms -> evaluate -> sorted document ids.

use crate::boolean::{self, Expr};
use crate::error::{Result, SearchError};
use crate::index_set::IndexSet;
use crate::postings::PostingList;
use crate::spelling::{CorrectorConfig, SpellingCorrector};
use crate::tokenizer::Normalizer;
use serde::Serialize;
use std::cmp::Reverse;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Boolean(Expr),
    Phrase(Vec<String>),
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Boolean(expr) => write!(f, "{expr}"),
            Query::Phrase(terms) => write!(f, "\"{}\"", terms.join(" ")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Correction {
    pub original: String,
    pub corrected: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// The query as evaluated, after normalization and correction.
    pub query: Query,
    pub corrections: Vec<Correction>,
    pub documents: PostingList,
}

pub struct QueryPipeline<'a> {
    index: &'a IndexSet,
    normalizer: Normalizer,
    corrector: Option<SpellingCorrector<'a>>,
}

impl<'a> QueryPipeline<'a> {
    /// A pipeline without spelling correction, normalizing queries the way
    /// the index's documents were normalized.
    pub fn new(index: &'a IndexSet) -> Self {
        Self { index, normalizer: Normalizer::new(index.normalizer()), corrector: None }
    }

    pub fn with_correction(mut self, config: CorrectorConfig) -> Result<Self> {
        self.corrector = Some(SpellingCorrector::new(self.index.vocabulary(), config)?);
        Ok(self)
    }

    /// Parses and normalizes a query string.
    ///
    /// Text wrapped in double quotes is a phrase query; anything else is a
    /// boolean expression.
    pub fn parse(&self, query: &str) -> Result<Query> {
        let trimmed = query.trim();
        if let Some(rest) = trimmed.strip_prefix('"') {
            let inner = rest
                .strip_suffix('"')
                .filter(|inner| !inner.contains('"'))
                .ok_or_else(|| SearchError::QuerySyntax("unbalanced '\"' in phrase query".into()))?;
            let terms = self.normalizer.normalize(inner);
            if terms.is_empty() {
                return Err(SearchError::EmptyPhrase);
            }
            return Ok(Query::Phrase(terms));
        }
        Ok(Query::Boolean(boolean::parse(trimmed)?.normalize(&self.normalizer)))
    }

    /// Replaces unknown terms with their accepted corrections.
    pub fn correct(&self, query: Query) -> (Query, Vec<Correction>) {
        let mut corrections = Vec::new();
        let mut fix = |term: String| -> String {
            match self.corrector.as_ref().and_then(|c| c.correct(&term)) {
                Some(corrected) => {
                    corrections.push(Correction { original: term, corrected: corrected.clone() });
                    corrected
                }
                None => term,
            }
        };
        let query = match query {
            Query::Boolean(expr) => Query::Boolean(expr.rewrite_terms(&mut |t: String| Expr::Term(fix(t)))),
            Query::Phrase(terms) => Query::Phrase(terms.into_iter().map(&mut fix).collect()),
        };
        (query, corrections)
    }

    /// Alternative spellings of `query`, most hits first.
    ///
    /// Every unknown term is replaced in turn by each of its ranked correction
    /// candidates and the combinations are evaluated. At most `max_alternatives`
    /// combinations are generated, preferring better-ranked candidates of
    /// earlier terms. Equal hit counts are ordered by the query text. Without a
    /// corrector, or when every term is known, the only alternative is the query itself.
    pub fn alternatives(&self, query: &str, max_alternatives: usize) -> Result<Vec<(Query, usize)>> {
        let parsed = self.parse(query)?;
        let terms: Vec<String> = match &parsed {
            Query::Boolean(expr) => expr.terms().into_iter().map(str::to_string).collect(),
            Query::Phrase(terms) => terms.clone(),
        };
        let slots: Vec<Vec<String>> = terms.into_iter().map(|term| self.options(term)).collect();

        let cap = max_alternatives.max(1);
        let mut combos: Vec<Vec<String>> = vec![Vec::new()];
        for options in &slots {
            let mut next = Vec::with_capacity(cap.min(combos.len() * options.len()));
            'fill: for prefix in &combos {
                for option in options {
                    if next.len() == cap {
                        break 'fill;
                    }
                    let mut combo = prefix.clone();
                    combo.push(option.clone());
                    next.push(combo);
                }
            }
            combos = next;
        }

        let mut ranked = combos
            .into_iter()
            .map(|combo| -> Result<(Query, usize)> {
                let query = substitute(&parsed, combo);
                let hits = self.evaluate(&query)?.len();
                Ok((query, hits))
            })
            .collect::<Result<Vec<_>>>()?;
        ranked.sort_by_cached_key(|(query, hits)| (Reverse(*hits), query.to_string()));
        tracing::debug!(query, alternatives = ranked.len(), "expanded alternative queries");
        Ok(ranked)
    }

    /// Ranked replacements for an unknown term, or the term itself.
    fn options(&self, term: String) -> Vec<String> {
        let candidates = match &self.corrector {
            Some(corrector) => corrector.candidates(&term),
            None => Vec::new(),
        };
        if candidates.is_empty() {
            vec![term]
        } else {
            candidates.into_iter().map(|c| c.term).collect()
        }
    }

    pub fn evaluate(&self, query: &Query) -> Result<PostingList> {
        match query {
            Query::Boolean(expr) => Ok(self.index.boolean().evaluate(expr)),
            Query::Phrase(terms) => self.index.phrase().evaluate(terms.as_slice()),
        }
    }

    pub fn search(&self, query: &str) -> Result<SearchResult> {
        let parsed = self.parse(query)?;
        let (query, corrections) = self.correct(parsed);
        let documents = self.evaluate(&query)?;
        tracing::debug!(%query, hits = documents.len(), corrections = corrections.len(), "evaluated query");
        Ok(SearchResult { query, corrections, documents })
    }
}

/// `query` with its terms replaced, in order, by `terms`.
fn substitute(query: &Query, terms: Vec<String>) -> Query {
    match query {
        Query::Boolean(expr) => {
            let mut replacements = terms.into_iter();
            Query::Boolean(expr.clone().rewrite_terms(&mut |t: String| Expr::Term(replacements.next().unwrap_or(t))))
        }
        Query::Phrase(_) => Query::Phrase(terms),
    }
}
