//! Boolean retrieval over the inverted index.
//!
//! Grammar:
//!
//! ```text
//! expr    := unary ( (AND | OR) unary )*
//! unary   := NOT unary | primary
//! primary := WORD | '(' expr ')'
//! ```
//!
//! AND and OR share a single precedence level and are applied strictly left to
//! right: `a OR b AND c` means `(a OR b) AND c`. Use parentheses to group
//! differently. NOT applies only to its immediate operand. Operators are
//! recognised case-insensitively.

use crate::error::{Result, SearchError};
use crate::inverted::{postings_or_empty, InvertedIndex};
use crate::postings::PostingList;
use crate::tokenizer::Normalizer;
use crate::vocabulary::Vocabulary;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Term(String),
    /// An operand whose text normalized to no terms (e.g. a stopword). Matches nothing.
    Void,
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn and(a: Expr, b: Expr) -> Expr {
        Expr::And(Box::new(a), Box::new(b))
    }

    pub fn or(a: Expr, b: Expr) -> Expr {
        Expr::Or(Box::new(a), Box::new(b))
    }

    pub fn not(a: Expr) -> Expr {
        Expr::Not(Box::new(a))
    }

    /// Replaces every term with the expression `f` returns for it.
    pub fn rewrite_terms<F>(self, f: &mut F) -> Expr
    where
        F: FnMut(String) -> Expr,
    {
        match self {
            Expr::Term(t) => f(t),
            Expr::Void => Expr::Void,
            Expr::Not(e) => Expr::not(e.rewrite_terms(f)),
            Expr::And(a, b) => {
                let a = a.rewrite_terms(f);
                Expr::and(a, b.rewrite_terms(f))
            }
            Expr::Or(a, b) => {
                let a = a.rewrite_terms(f);
                Expr::or(a, b.rewrite_terms(f))
            }
        }
    }

    /// Runs each raw word through the normalizer. A word yielding several
    /// terms becomes their conjunction; a word yielding none becomes [`Expr::Void`].
    pub fn normalize(self, normalizer: &Normalizer) -> Expr {
        self.rewrite_terms(&mut |raw: String| {
            conjunction(normalizer.normalize(&raw).into_iter().map(Expr::Term).collect())
        })
    }

    pub fn terms(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_terms(&mut out);
        out
    }

    fn collect_terms<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Term(t) => out.push(t),
            Expr::Void => {}
            Expr::Not(e) => e.collect_terms(out),
            Expr::And(a, b) | Expr::Or(a, b) => {
                a.collect_terms(out);
                b.collect_terms(out);
            }
        }
    }
}

/// Balanced AND over `terms`, keeping their order; a long hyphenated word
/// must not turn into a deep tree.
fn conjunction(mut terms: Vec<Expr>) -> Expr {
    while terms.len() > 1 {
        let mut next = Vec::with_capacity((terms.len() + 1) / 2);
        let mut pairs = terms.into_iter();
        while let Some(a) = pairs.next() {
            next.push(match pairs.next() {
                Some(b) => Expr::and(a, b),
                None => a,
            });
        }
        terms = next;
    }
    terms.pop().unwrap_or(Expr::Void)
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Term(t) => write!(f, "{t}"),
            Expr::Void => write!(f, "()"),
            Expr::Not(e) => write!(f, "NOT {e}"),
            Expr::And(a, b) => write!(f, "({a} AND {b})"),
            Expr::Or(a, b) => write!(f, "({a} OR {b})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => write!(f, "'{w}'"),
            Token::And => write!(f, "AND"),
            Token::Or => write!(f, "OR"),
            Token::Not => write!(f, "NOT"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
        }
    }
}

fn lex(query: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let flush = |word: &mut String, tokens: &mut Vec<Token>| {
        if word.is_empty() {
            return;
        }
        let tok = match word.to_ascii_uppercase().as_str() {
            "AND" => Token::And,
            "OR" => Token::Or,
            "NOT" => Token::Not,
            _ => Token::Word(word.clone()),
        };
        tokens.push(tok);
        word.clear();
    };
    for c in query.chars() {
        match c {
            '(' | ')' => {
                flush(&mut word, &mut tokens);
                tokens.push(if c == '(' { Token::LParen } else { Token::RParen });
            }
            '"' => {
                return Err(SearchError::QuerySyntax(
                    "quoted phrases cannot be combined with boolean operators".into(),
                ))
            }
            c if c.is_whitespace() => flush(&mut word, &mut tokens),
            c => word.push(c),
        }
    }
    flush(&mut word, &mut tokens);
    Ok(tokens)
}

/// Bound on both parenthesis/NOT nesting and the height of the parsed tree.
/// Evaluation recurses over the tree, so deeper queries are rejected up front.
pub const MAX_QUERY_DEPTH: usize = 256;

fn too_deep() -> SearchError {
    SearchError::QuerySyntax(format!("query nested too deeply (limit {MAX_QUERY_DEPTH})"))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_QUERY_DEPTH {
            return Err(too_deep());
        }
        Ok(())
    }

    // Each parse function returns the expression with its tree height.
    fn expr(&mut self) -> Result<(Expr, usize)> {
        let (mut left, mut height) = self.unary()?;
        loop {
            let combine: fn(Expr, Expr) -> Expr = match self.peek() {
                Some(Token::And) => Expr::and,
                Some(Token::Or) => Expr::or,
                None | Some(Token::RParen) => return Ok((left, height)),
                Some(other) => {
                    return Err(SearchError::QuerySyntax(format!("expected AND or OR before {other}")))
                }
            };
            self.bump();
            let (right, right_height) = self.unary()?;
            height = height.max(right_height) + 1;
            if height > MAX_QUERY_DEPTH {
                return Err(too_deep());
            }
            left = combine(left, right);
        }
    }

    fn unary(&mut self) -> Result<(Expr, usize)> {
        if self.peek() == Some(&Token::Not) {
            self.bump();
            self.enter()?;
            let (inner, height) = self.unary()?;
            self.depth -= 1;
            if height + 1 > MAX_QUERY_DEPTH {
                return Err(too_deep());
            }
            return Ok((Expr::not(inner), height + 1));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<(Expr, usize)> {
        match self.bump() {
            Some(Token::Word(w)) => Ok((Expr::Term(w), 1)),
            Some(Token::LParen) => {
                self.enter()?;
                let inner = self.expr()?;
                self.depth -= 1;
                match self.bump() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(SearchError::QuerySyntax("missing closing ')'".into())),
                }
            }
            Some(other) => Err(SearchError::QuerySyntax(format!("expected a term, found {other}"))),
            None => Err(SearchError::QuerySyntax("expected a term, found end of query".into())),
        }
    }
}

/// Parses a boolean query into an expression over raw (not yet normalized) words.
pub fn parse(query: &str) -> Result<Expr> {
    let tokens = lex(query)?;
    if tokens.is_empty() {
        return Err(SearchError::QuerySyntax("empty query".into()));
    }
    let mut parser = Parser { tokens, pos: 0, depth: 0 };
    let (expr, _) = parser.expr()?;
    if let Some(extra) = parser.peek() {
        return Err(SearchError::QuerySyntax(format!("unbalanced {extra}")));
    }
    Ok(expr)
}

/// Evaluates expressions against an inverted index.
///
/// Terms are looked up as-is: normalization and spelling correction happen
/// before evaluation. An unknown term matches no documents.
pub struct BooleanEvaluator<'a> {
    vocab: &'a Vocabulary,
    index: &'a InvertedIndex,
    universe: PostingList,
}

impl<'a> BooleanEvaluator<'a> {
    pub fn new(vocab: &'a Vocabulary, index: &'a InvertedIndex) -> Self {
        Self { vocab, index, universe: index.universe() }
    }

    pub fn evaluate(&self, expr: &Expr) -> PostingList {
        match expr {
            Expr::Term(t) => postings_or_empty(self.index, self.vocab, t),
            Expr::Void => PostingList::new(),
            Expr::Not(e) => self.universe.difference(&self.evaluate(e)),
            Expr::And(a, b) => self.evaluate(a).intersect(&self.evaluate(b)),
            Expr::Or(a, b) => self.evaluate(a).union(&self.evaluate(b)),
        }
    }

    /// Parses `query`, normalizes its words and evaluates it.
    pub fn evaluate_query(&self, query: &str, normalizer: &Normalizer) -> Result<PostingList> {
        let expr = parse(query)?.normalize(normalizer);
        Ok(self.evaluate(&expr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentStore;

    fn term(t: &str) -> Expr {
        Expr::Term(t.to_string())
    }

    #[test]
    fn and_or_are_left_associative_without_precedence() {
        assert_eq!(parse("a OR b AND c").unwrap(), Expr::and(Expr::or(term("a"), term("b")), term("c")));
        assert_eq!(parse("a AND b OR c").unwrap(), Expr::or(Expr::and(term("a"), term("b")), term("c")));
        assert_eq!(parse("a OR (b AND c)").unwrap(), Expr::or(term("a"), Expr::and(term("b"), term("c"))));
    }

    #[test]
    fn not_binds_its_operand_only() {
        assert_eq!(parse("cat and not ran").unwrap(), Expr::and(term("cat"), Expr::not(term("ran"))));
        assert_eq!(parse("NOT NOT a").unwrap(), Expr::not(Expr::not(term("a"))));
        assert_eq!(parse("NOT a OR b").unwrap(), Expr::or(Expr::not(term("a")), term("b")));
    }

    #[test]
    fn malformed_queries_are_syntax_errors() {
        for q in ["", "   ", "a AND", "AND a", "(a OR b", "a OR b)", "a b", "NOT", "()", "a AND (", "\"a b\" AND c"] {
            assert!(matches!(parse(q), Err(SearchError::QuerySyntax(_))), "query {q:?} should fail");
        }
    }

    #[test]
    fn deep_nesting_is_rejected_not_overflowed() {
        let parens = format!("{}cat{}", "(".repeat(200_000), ")".repeat(200_000));
        assert_eq!(parse(&parens), Err(too_deep()));

        let nots = format!("{}cat", "NOT ".repeat(100_000));
        assert_eq!(parse(&nots), Err(too_deep()));

        let chain = vec!["cat"; 100_000].join(" AND ");
        assert_eq!(parse(&chain), Err(too_deep()));

        let ok = format!("{}cat{}", "(".repeat(MAX_QUERY_DEPTH), ")".repeat(MAX_QUERY_DEPTH));
        assert_eq!(parse(&ok).unwrap(), term("cat"));
        let long_ok = vec!["cat"; MAX_QUERY_DEPTH].join(" OR ");
        assert!(parse(&long_ok).is_ok());
    }

    #[test]
    fn normalize_expands_and_drops_words() {
        let n = Normalizer::new(crate::tokenizer::NormalizerConfig::english());
        let e = parse("The AND cat-dog").unwrap().normalize(&n);
        assert_eq!(e, Expr::and(Expr::Void, Expr::and(term("cat"), term("dog"))));
    }

    #[test]
    fn terms_are_listed_left_to_right() {
        let e = parse("(cat OR dog) AND NOT ran").unwrap();
        assert_eq!(e.terms(), vec!["cat", "dog", "ran"]);
        assert_eq!(e.to_string(), "((cat OR dog) AND NOT ran)");
    }

    #[test]
    fn evaluate_query_normalizes_words() {
        let config = crate::tokenizer::NormalizerConfig { lowercase: true, strip_punctuation: true, ..Default::default() };
        let n = Normalizer::new(config);
        let store = crate::document::DocumentStore::load(
            vec![crate::document::RawDocument::new("d0", "The cat sat."), crate::document::RawDocument::new("d1", "A dog ran.")],
            &n,
        );
        let vocab = Vocabulary::build(&store);
        let index = InvertedIndex::build(&store, &vocab).unwrap();
        let eval = BooleanEvaluator::new(&vocab, &index);
        assert_eq!(eval.evaluate_query("CAT or Dog", &n).unwrap().into_vec(), vec![0, 1]);
        assert!(matches!(eval.evaluate_query("cat AND", &n), Err(SearchError::QuerySyntax(_))));
    }

    #[test]
    fn long_compound_word_stays_shallow() {
        let n = Normalizer::new(crate::tokenizer::NormalizerConfig { strip_punctuation: true, ..Default::default() });
        let word = vec!["a", "b"].repeat(50_000).join("-");
        let e = parse(&word).unwrap().normalize(&n);
        assert_eq!(e.terms().len(), 100_000);
        assert_eq!(e.terms()[..3], ["a", "b", "a"]);

        let store = DocumentStore::from_tokens(vec![("d0", vec!["a", "b"]), ("d1", vec!["a"])]);
        let vocab = Vocabulary::build(&store);
        let index = InvertedIndex::build(&store, &vocab).unwrap();
        assert_eq!(BooleanEvaluator::new(&vocab, &index).evaluate(&e).into_vec(), vec![0]);
    }

    #[test]
    fn evaluates_set_algebra() {
        let store = DocumentStore::from_tokens(vec![
            ("d0", vec!["the", "cat", "sat"]),
            ("d1", vec!["the", "cat", "ran"]),
            ("d2", vec!["a", "dog", "ran"]),
        ]);
        let vocab = Vocabulary::build(&store);
        let index = InvertedIndex::build(&store, &vocab).unwrap();
        let eval = BooleanEvaluator::new(&vocab, &index);
        let run = |q: &str| eval.evaluate(&parse(q).unwrap()).into_vec();

        assert_eq!(run("cat AND NOT ran"), vec![0]);
        assert_eq!(run("cat OR dog"), vec![0, 1, 2]);
        assert_eq!(run("NOT cat"), vec![2]);
        assert_eq!(run("NOT NOT cat"), vec![0, 1]);
        assert_eq!(run("unicorn"), Vec::<u32>::new());
        assert_eq!(run("NOT unicorn"), vec![0, 1, 2]);
        // strict left-to-right: (sat OR dog) AND ran
        assert_eq!(run("sat OR dog AND ran"), vec![2]);
        assert_eq!(run("sat OR (dog AND ran)"), vec![0, 2]);
    }
}
