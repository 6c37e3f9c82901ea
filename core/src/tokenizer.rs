use crate::error::{Result, SearchError};
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WORD_RE: Regex = Regex::new(r"(?u)[\p{L}\p{N}][\p{L}\p{N}_']*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stemming {
    #[default]
    None,
    /// Snowball English (Porter2) stemmer.
    Porter,
}

impl std::str::FromStr for Stemming {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Stemming::None),
            "porter" | "english" => Ok(Stemming::Porter),
            other => Err(SearchError::InvalidConfig(format!("unknown stemming algorithm '{other}'"))),
        }
    }
}

/// Normalization options. The default is pass-through: text is split on
/// whitespace and every piece is kept verbatim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub lowercase: bool,
    /// Keep only runs of letters/digits (with inner `_` and `'`) instead of whitespace-separated pieces.
    pub strip_punctuation: bool,
    pub stopword_removal: bool,
    pub stemming: Stemming,
    pub unicode_nfkc: bool,
}

impl NormalizerConfig {
    /// NFKC, lowercase, punctuation stripping, English stopwords and stemming.
    pub fn english() -> Self {
        Self {
            lowercase: true,
            strip_punctuation: true,
            stopword_removal: true,
            stemming: Stemming::Porter,
            unicode_nfkc: true,
        }
    }
}

/// Turns raw text into the term sequence shared by every index and by queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalizes `text` into terms. Offsets into the returned vector are the
    /// token positions recorded by the positional index.
    pub fn normalize(&self, text: &str) -> Vec<String> {
        let mut text = if self.config.unicode_nfkc { text.nfkc().collect::<String>() } else { text.to_string() };
        if self.config.lowercase {
            text = text.to_lowercase();
        }

        let pieces: Vec<&str> = if self.config.strip_punctuation {
            WORD_RE
                .find_iter(&text)
                .map(|m| m.as_str().trim_end_matches('\''))
                .collect()
        } else {
            text.split_whitespace().collect()
        };

        let mut terms = Vec::with_capacity(pieces.len());
        for piece in pieces {
            if self.config.stopword_removal && is_stopword(&piece.to_lowercase()) {
                continue;
            }
            let term = match self.config.stemming {
                Stemming::None => piece.to_string(),
                Stemming::Porter => STEMMER.stem(piece).into_owned(),
            };
            if !term.is_empty() {
                terms.push(term);
            }
        }
        terms
    }
}

/// Tokenize text with the full English pipeline into (term, position) pairs.
pub fn tokenize(text: &str) -> Vec<(String, usize)> {
    Normalizer::new(NormalizerConfig::english())
        .normalize(text)
        .into_iter()
        .enumerate()
        .map(|(pos, term)| (term, pos))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Running, runner's run!");
        assert!(t.iter().any(|(w, _)| w == "run"));
    }

    #[test]
    fn default_is_pass_through() {
        let n = Normalizer::default();
        assert_eq!(n.normalize("The  Cat, sat."), vec!["The", "Cat,", "sat."]);
    }

    #[test]
    fn positions_are_dense_after_filtering() {
        let t = tokenize("the cat and the hat");
        let positions: Vec<usize> = t.iter().map(|(_, p)| *p).collect();
        assert_eq!(positions, vec![0, 1]);
    }

    #[test]
    fn stemming_parses_from_str() {
        assert_eq!("Porter".parse::<Stemming>().unwrap(), Stemming::Porter);
        assert_eq!("none".parse::<Stemming>().unwrap(), Stemming::None);
        assert!("lancaster".parse::<Stemming>().is_err());
    }
}
