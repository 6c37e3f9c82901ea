use search_core::{
    CorrectionStrategy, CorrectorConfig, DocumentStore, Expr, IndexSet, Normalizer, NormalizerConfig, PostingList,
    Query, QueryPipeline, RawDocument, SearchError, SpellingCorrector, Vocabulary,
};

fn cat_index() -> IndexSet {
    let config = NormalizerConfig::default();
    let store = DocumentStore::load(
        vec![RawDocument::new("D0", "the cat sat"), RawDocument::new("D1", "the cat ran")],
        &Normalizer::new(config),
    );
    IndexSet::build(&store, config).unwrap()
}

fn ids(list: PostingList) -> Vec<u32> {
    list.into_vec()
}

#[test]
fn biword_and_phrase_over_two_documents() {
    let set = cat_index();
    let biword = set.biword().lookup(set.vocabulary(), "the", "cat").to_postings();
    assert_eq!(ids(biword), vec![0, 1]);

    let phrase = set.phrase();
    assert_eq!(ids(phrase.evaluate(&["the", "cat"]).unwrap()), vec![0, 1]);
    assert_eq!(ids(phrase.evaluate(&["cat", "sat"]).unwrap()), vec![0]);
}

#[test]
fn boolean_and_not() {
    let set = cat_index();
    let pipeline = QueryPipeline::new(&set);
    assert_eq!(ids(pipeline.search("cat AND NOT ran").unwrap().documents), vec![0]);
}

#[test]
fn left_to_right_grouping_differs_from_conventional_precedence() {
    let set = cat_index();
    let pipeline = QueryPipeline::new(&set);
    // (sat OR the) AND ran, not sat OR (the AND ran)
    assert_eq!(ids(pipeline.search("sat OR the AND ran").unwrap().documents), vec![1]);
    assert_eq!(ids(pipeline.search("sat OR (the AND ran)").unwrap().documents), vec![0, 1]);
}

#[test]
fn invalid_queries_are_distinguished_from_empty_results() {
    let set = cat_index();
    let pipeline = QueryPipeline::new(&set);
    assert!(pipeline.search("dog").unwrap().documents.is_empty());
    assert!(matches!(pipeline.search("cat AND"), Err(SearchError::QuerySyntax(_))));
    assert!(matches!(pipeline.search("(cat"), Err(SearchError::QuerySyntax(_))));
    assert_eq!(pipeline.search("\"\""), Err(SearchError::EmptyPhrase));
}

#[test]
fn known_term_is_not_corrected_and_nearest_wins() {
    let store = DocumentStore::from_tokens(vec![("v", vec!["cat", "car", "cart"])]);
    let vocab = Vocabulary::build(&store);
    let corrector = SpellingCorrector::new(&vocab, CorrectorConfig::default()).unwrap();
    assert_eq!(corrector.correct("cart"), None);
    assert_eq!(corrector.correct("cor").as_deref(), Some("car"));
}

#[test]
fn corrected_terms_feed_both_evaluators() {
    let set = cat_index();
    for strategy in [CorrectionStrategy::EditDistance, CorrectionStrategy::NgramJaccard] {
        let config = CorrectorConfig { strategy, min_similarity: 0.2, ..Default::default() };
        let pipeline = QueryPipeline::new(&set).with_correction(config).unwrap();

        let result = pipeline.search("\"the catt\"").unwrap();
        assert_eq!(ids(result.documents), vec![0, 1], "{strategy:?}");
        assert_eq!(result.corrections.len(), 1);

        let result = pipeline.search("catt AND NOT rann").unwrap();
        assert_eq!(ids(result.documents), vec![0], "{strategy:?}");
    }
}

#[test]
fn uncorrectable_term_yields_empty_result_not_error() {
    let set = cat_index();
    let pipeline = QueryPipeline::new(&set).with_correction(CorrectorConfig::default()).unwrap();
    let result = pipeline.search("xylophone").unwrap();
    assert!(result.corrections.is_empty());
    assert!(result.documents.is_empty());
    let result = pipeline.search("NOT xylophone").unwrap();
    assert_eq!(ids(result.documents), vec![0, 1]);
}

#[test]
fn english_pipeline_end_to_end() {
    let config = NormalizerConfig::english();
    let docs = vec![
        RawDocument::new("a", "Real Madrid won the Champions League final."),
        RawDocument::new("b", "Barcelona lost; Real fans celebrated in Madrid."),
        RawDocument::new("c", "The league table after the weekend."),
    ];
    let store = DocumentStore::load(docs, &Normalizer::new(config));
    let set = IndexSet::build(&store, config).unwrap();
    let pipeline = QueryPipeline::new(&set).with_correction(CorrectorConfig::default()).unwrap();

    assert_eq!(ids(pipeline.search("\"Real Madrid\"").unwrap().documents), vec![0]);
    assert_eq!(ids(pipeline.search("real AND madrid").unwrap().documents), vec![0, 1]);
    assert_eq!(ids(pipeline.search("league AND NOT real").unwrap().documents), vec![2]);

    let corrected = pipeline.search("real AND mdrid").unwrap();
    assert_eq!(corrected.corrections[0].corrected, "madrid");
    assert_eq!(ids(corrected.documents), vec![0, 1]);
}

fn vehicle_index() -> IndexSet {
    let config = NormalizerConfig::default();
    let store = DocumentStore::load(
        vec![
            RawDocument::new("D0", "car cat"),
            RawDocument::new("D1", "cart"),
            RawDocument::new("D2", "cat sat"),
            RawDocument::new("D3", "cat"),
        ],
        &Normalizer::new(config),
    );
    IndexSet::build(&store, config).unwrap()
}

fn rendered(alternatives: Vec<(Query, usize)>) -> Vec<(String, usize)> {
    alternatives.into_iter().map(|(q, hits)| (q.to_string(), hits)).collect()
}

#[test]
fn alternatives_rank_by_hits_then_text() {
    let set = vehicle_index();
    let pipeline = QueryPipeline::new(&set).with_correction(CorrectorConfig::default()).unwrap();
    let alternatives = pipeline.alternatives("cor", 10).unwrap();
    assert_eq!(alternatives[0], (Query::Boolean(Expr::Term("cat".into())), 3));
    assert_eq!(
        rendered(alternatives),
        vec![("cat".to_string(), 3), ("car".to_string(), 1), ("cart".to_string(), 1)]
    );
}

#[test]
fn alternatives_are_capped_in_candidate_order() {
    let set = vehicle_index();
    let pipeline = QueryPipeline::new(&set).with_correction(CorrectorConfig::default()).unwrap();
    // "cor" -> car, cart, cat; "sst" -> sat, cat; only the first four combinations are tried
    assert_eq!(
        rendered(pipeline.alternatives("cor AND sst", 4).unwrap()),
        vec![
            ("(car AND cat)".to_string(), 1),
            ("(car AND sat)".to_string(), 0),
            ("(cart AND cat)".to_string(), 0),
            ("(cart AND sat)".to_string(), 0),
        ]
    );
    assert_eq!(pipeline.alternatives("cor AND sst", 0).unwrap().len(), 1);
}

#[test]
fn phrase_alternatives_keep_known_terms() {
    let set = vehicle_index();
    let pipeline = QueryPipeline::new(&set).with_correction(CorrectorConfig::default()).unwrap();
    let alternatives = pipeline.alternatives("\"cor sat\"", 10).unwrap();
    assert_eq!(alternatives.len(), 3);
    assert_eq!(alternatives[0], (Query::Phrase(vec!["cat".into(), "sat".into()]), 1));
    assert!(alternatives[1..].iter().all(|(_, hits)| *hits == 0));
}

#[test]
fn without_corrector_the_query_is_its_only_alternative() {
    let set = vehicle_index();
    let pipeline = QueryPipeline::new(&set);
    assert_eq!(rendered(pipeline.alternatives("cor OR cat", 10).unwrap()), vec![("(cor OR cat)".to_string(), 3)]);
    assert!(matches!(pipeline.alternatives("cor AND", 10), Err(SearchError::QuerySyntax(_))));
}
