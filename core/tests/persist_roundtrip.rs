use search_core::persist::{load_growth, load_index, load_meta, save_growth, save_snapshot, IndexPaths, SnapshotFormat};
use search_core::{DocumentStore, IndexSet, Normalizer, NormalizerConfig, QueryPipeline, RawDocument};
use std::fs;

fn store(config: NormalizerConfig) -> DocumentStore {
    let docs = vec![
        RawDocument::new("match-report", "Real Madrid beat Barcelona in the final."),
        RawDocument::new("transfer", "Barcelona signed a striker from Madrid."),
        RawDocument::new("table", "The league table after the final weekend."),
    ];
    DocumentStore::load(docs, &Normalizer::new(config))
}

fn answers(set: &IndexSet) -> Vec<Vec<u32>> {
    let pipeline = QueryPipeline::new(set);
    ["madrid", "barcelona AND NOT real", "\"real madrid\"", "final OR striker", "(league OR madrid) AND final"]
        .iter()
        .map(|q| pipeline.search(q).unwrap().documents.into_vec())
        .collect()
}

#[test]
fn saved_snapshots_answer_like_the_original() {
    let config = NormalizerConfig::english();
    let set = IndexSet::build(&store(config), config).unwrap();
    let expected = answers(&set);

    for format in [SnapshotFormat::Json, SnapshotFormat::Bincode] {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        save_snapshot(&paths, &set.export(), format, "2026-01-01T00:00:00Z".into()).unwrap();

        let meta = load_meta(&paths).unwrap();
        assert_eq!(meta.num_docs, 3);
        assert_eq!(meta.format, format);
        assert_eq!(meta.normalizer, config);

        let restored = load_index(&paths).unwrap();
        assert_eq!(restored.normalizer(), config);
        assert_eq!(restored.documents(), set.documents());
        assert_eq!(restored.comparison(), set.comparison());
        assert_eq!(answers(&restored), expected, "{format:?}");
    }
}

#[test]
fn growth_curve_is_optional() {
    let config = NormalizerConfig::english();
    let store = store(config);
    let set = IndexSet::build(&store, config).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    save_snapshot(&paths, &set.export(), SnapshotFormat::Json, String::new()).unwrap();
    assert_eq!(load_growth(&paths).unwrap(), None);

    save_growth(&paths, &store.growth()).unwrap();
    let growth = load_growth(&paths).unwrap().unwrap();
    assert_eq!(growth.len(), 3);
    assert_eq!(growth.last().unwrap().vocabulary as usize, set.vocabulary().len());
}

#[test]
fn missing_or_foreign_snapshots_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    assert!(load_index(&paths).is_err());

    let config = NormalizerConfig::default();
    let set = IndexSet::build(&store(config), config).unwrap();
    save_snapshot(&paths, &set.export(), SnapshotFormat::Json, String::new()).unwrap();

    let meta_path = dir.path().join("meta.json");
    let meta = fs::read_to_string(&meta_path).unwrap().replace("\"version\":1", "\"version\":99");
    let meta = meta.replace("\"version\": 1", "\"version\": 99");
    fs::write(&meta_path, meta).unwrap();
    assert!(load_index(&paths).is_err());
}

#[test]
fn unsorted_postings_on_disk_fail_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    let config = NormalizerConfig::default();
    let set = IndexSet::build(&store(config), config).unwrap();
    save_snapshot(&paths, &set.export(), SnapshotFormat::Json, String::new()).unwrap();

    // "Barcelona" occurs in documents 0 and 1
    let inverted_path = dir.path().join("inverted.json");
    let inverted = fs::read_to_string(&inverted_path).unwrap().replace("\"Barcelona\":[0,1]", "\"Barcelona\":[1,0]");
    assert!(inverted.contains("[1,0]"));
    fs::write(&inverted_path, inverted).unwrap();
    assert!(load_index(&paths).is_err());
}
