use docindex::{search, search_with, Category, Index, IndexBuilder, IndexConfig, Record, SearchError, SearchOptions};

fn rec(location: &str, title: &str, text: &str, category: Category) -> Record {
    Record::new(location, "P", title, text, category)
}

fn basis_records() -> Vec<Record> {
    vec![
        rec("#A", "FourierBasis", "Creates fourier features", Category::Type),
        rec("#B", "TileCodingBasis", "Creates tile coding features", Category::Type),
    ]
}

fn locations(results: &[docindex::QueryResult<'_>]) -> Vec<String> {
    results.iter().map(|r| r.record.location.clone()).collect()
}

#[test]
fn fourier_matches_only_its_record() {
    let index = Index::build(&basis_records()).unwrap();
    let results = search(&index, "fourier", 20);
    assert_eq!(locations(&results), vec!["#A"]);
}

#[test]
fn shared_token_ranks_shorter_record_first() {
    // Weighted lengths with default weights: #A = 2 + 3 = 5, #B = 2 + 4 = 6.
    // One text occurrence each, so #A scores 1/ln(6) against 1/ln(7) for #B.
    let index = Index::build(&basis_records()).unwrap();
    let results = search(&index, "features", 20);
    assert_eq!(locations(&results), vec!["#A", "#B"]);
    assert!(results[0].score > results[1].score);
}

#[test]
fn empty_and_stopword_queries_return_nothing() {
    let index = Index::build(&basis_records()).unwrap();
    assert!(search(&index, "", 20).is_empty());
    assert!(search(&index, "the and a", 20).is_empty());
    assert!(search(&index, "?!", 20).is_empty());
}

#[test]
fn zero_limit_returns_nothing() {
    let index = Index::build(&basis_records()).unwrap();
    assert!(search(&index, "features", 0).is_empty());
}

#[test]
fn empty_index_is_queryable() {
    let index = Index::build(&[]).unwrap();
    assert!(index.is_empty());
    assert!(search(&index, "anything", 20).is_empty());
}

#[test]
fn duplicate_location_fails_build() {
    let mut records = basis_records();
    records.push(rec("#A", "Other", "", Category::Function));
    match Index::build(&records) {
        Err(SearchError::DuplicateKey { location, .. }) => assert_eq!(location, "#A"),
        other => panic!("expected duplicate key error, got {other:?}"),
    }
}

#[test]
fn more_distinct_tokens_beat_more_occurrences() {
    let records = vec![
        rec("#x", "Alpha", "fourier fourier fourier fourier fourier", Category::Page),
        rec("#y", "Beta", "fourier basis with a long tail of other words here", Category::Page),
    ];
    let index = Index::build(&records).unwrap();
    let results = search(&index, "fourier basis", 20);
    assert_eq!(locations(&results), vec!["#y", "#x"]);
    assert!(results[0].score >= 2.0);
    assert!(results[1].score < 2.0);
}

#[test]
fn title_occurrence_outweighs_text_occurrence() {
    let records = vec![
        rec("#text", "Beta", "alpha gamma", Category::Section),
        rec("#title", "Alpha", "beta gamma", Category::Section),
    ];
    let index = Index::build(&records).unwrap();
    assert_eq!(locations(&search(&index, "alpha", 20)), vec!["#title", "#text"]);
}

#[test]
fn ties_keep_record_order() {
    let records = vec![
        rec("#1", "Solver", "", Category::Function),
        rec("#2", "Solver", "", Category::Function),
        rec("#3", "Solver", "", Category::Function),
    ];
    let index = Index::build(&records).unwrap();
    let results = search(&index, "solver", 2);
    assert_eq!(locations(&results), vec!["#1", "#2"]);
    assert_eq!(results[0].score, results[1].score);
}

#[test]
fn limit_truncates_and_total_hits_counts_all() {
    let records: Vec<Record> = (0..50)
        .map(|i| rec(&format!("#r{i}"), "Basis", &"filler ".repeat(i), Category::Type))
        .collect();
    let index = Index::build(&records).unwrap();
    let hits = search_with(&index, "basis", &SearchOptions { limit: 5, category: None });
    assert_eq!(hits.total_hits, 50);
    // shortest records first
    assert_eq!(locations(&hits.results), vec!["#r0", "#r1", "#r2", "#r3", "#r4"]);
}

#[test]
fn category_filter_restricts_results() {
    let records = vec![
        rec("#t", "Buffer", "", Category::Type),
        rec("#f", "buffer!", "fills a buffer", Category::Function),
    ];
    let index = Index::build(&records).unwrap();
    let hits = index.search_with("buffer", &SearchOptions { limit: 20, category: Some(Category::Function) });
    assert_eq!(hits.total_hits, 1);
    assert_eq!(locations(&hits.results), vec!["#f"]);
}

#[test]
fn index_owns_its_records() {
    let mut records = basis_records();
    let index = Index::build(&records).unwrap();
    records[0].title = "Replaced".into();
    records.clear();
    assert_eq!(index.get("#A").map(|r| r.title.as_str()), Some("FourierBasis"));
    assert_eq!(locations(&index.search("fourierbasis", 20)), vec!["#A"]);
}

#[test]
fn stemming_matches_inflections() {
    let mut config = IndexConfig::default();
    config.tokenizer.stem = true;
    let index = IndexBuilder::new(config).build(&basis_records()).unwrap();
    assert_eq!(search(&index, "feature", 20).len(), 2);
}

#[test]
fn concurrent_searches_share_one_index() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Index>();

    let index = Index::build(&basis_records()).unwrap();
    let expected = locations(&search(&index, "features tile", 20));
    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                for _ in 0..100 {
                    assert_eq!(locations(&search(&index, "features tile", 20)), expected);
                }
            });
        }
    });
}
