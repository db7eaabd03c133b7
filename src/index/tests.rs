use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use super::*;
use crate::corpus::Source;
use tempfile::TempDir;

/// Counts a few recipe words; fails on any text containing "FAIL"
struct KeywordEmbedder;

impl Embedder for KeywordEmbedder {
    fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, ProviderError> {
        if text.contains("FAIL") {
            return Err(ProviderError::Network {
                provider: "fake".to_string(),
                message: "connection reset".to_string(),
            });
        }
        let lower = text.to_lowercase();
        Ok(["yoğurt", "dereotu", "kıyma"]
            .iter()
            .map(|word| lower.matches(word).count() as f32)
            .collect())
    }

    fn dimension(&self) -> usize {
        3
    }

    fn model(&self) -> &str {
        "fake-embed"
    }
}

fn chunk(text: &str, index: usize) -> Chunk {
    Chunk {
        text: text.to_string(),
        source: Source::file("tarifler.txt"),
        index,
        overlap: 0,
    }
}

fn sample_index(metric: Metric) -> VectorIndex {
    let mut index = VectorIndex::new(2, metric, "manual");
    for (i, vector) in [[1.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]]
        .into_iter()
        .enumerate()
    {
        index
            .insert(chunk(&format!("entry {}", i), i), vector.to_vec())
            .expect("vector has the index dimension");
    }
    index
}

fn hit_texts(hits: &[SearchHit]) -> Vec<&str> {
    hits.iter().map(|hit| hit.chunk.text.as_str()).collect()
}

#[test]
fn cosine_of_zero_vector_is_zero() {
    assert_eq!(Metric::Cosine.score(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    assert!((Metric::Cosine.score(&[2.0, 0.0], &[5.0, 0.0]) - 1.0).abs() < 1e-6);
}

#[test]
fn l2_score_is_negative_distance() {
    assert!((Metric::L2.score(&[0.0, 0.0], &[3.0, 4.0]) + 5.0).abs() < 1e-6);
    assert_eq!(Metric::L2.score(&[1.0, 1.0], &[1.0, 1.0]), 0.0);
}

#[test]
fn search_orders_by_score_and_keeps_ties_in_insertion_order() {
    for metric in [Metric::Cosine, Metric::L2] {
        let index = sample_index(metric);
        let hits = index.search(&[1.0, 0.0], 10).expect("search should work");

        assert_eq!(
            hit_texts(&hits),
            vec!["entry 0", "entry 2", "entry 3", "entry 1"],
            "unexpected order for {}",
            metric
        );
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }
}

#[test]
fn search_returns_at_most_k() {
    let index = sample_index(Metric::Cosine);

    assert_eq!(index.search(&[1.0, 0.0], 2).expect("search").len(), 2);
    assert_eq!(index.search(&[1.0, 0.0], 4).expect("search").len(), 4);
    assert!(index.search(&[1.0, 0.0], 0).expect("search").is_empty());
}

#[test]
fn search_rejects_wrong_query_dimension() {
    let index = sample_index(Metric::Cosine);
    let err = index.search(&[1.0, 0.0, 0.0], 2).unwrap_err();
    assert!(matches!(
        err,
        RecipeError::IncompatibleIndex {
            expected: 2,
            found: 3
        }
    ));
}

#[test]
fn insert_rejects_wrong_dimension() {
    let mut index = VectorIndex::new(3, Metric::Cosine, "manual");
    assert!(index.insert(chunk("a", 0), vec![1.0, 2.0]).is_err());
    assert!(index.is_empty());
}

#[test]
fn build_skips_failing_chunks() {
    let chunks = vec![
        chunk("Yoğurtlu dereotu sosu", 0),
        chunk("FAIL: bozuk sayfa", 1),
        chunk("Kıymalı yoğurtlu mantı", 2),
    ];

    let (index, report) =
        VectorIndex::build(chunks, &KeywordEmbedder, Metric::Cosine).expect("should build");

    assert_eq!(
        report,
        BuildReport {
            embedded: 2,
            skipped: 1
        }
    );
    assert_eq!(index.len(), 2);
    assert_eq!(index.dimension(), 3);
    assert_eq!(index.embedding_model(), "fake-embed");
    assert_eq!(index.entries()[1].chunk.index, 2);
}

#[test]
fn build_with_no_success_is_empty_corpus() {
    let failing = vec![chunk("FAIL one", 0), chunk("FAIL two", 1)];
    let err = VectorIndex::build(failing, &KeywordEmbedder, Metric::Cosine).unwrap_err();
    assert!(matches!(err, RecipeError::EmptyCorpus(ref m) if m.contains("connection reset")));

    let err = VectorIndex::build(Vec::new(), &KeywordEmbedder, Metric::Cosine).unwrap_err();
    assert!(matches!(err, RecipeError::EmptyCorpus(_)));
}

#[test]
fn built_index_answers_by_similarity() {
    let chunks = vec![
        chunk("Kıymalı börek", 0),
        chunk("Yoğurt ve dereotu ile cacık", 1),
        chunk("Sade yoğurt", 2),
    ];
    let (index, _) =
        VectorIndex::build(chunks, &KeywordEmbedder, Metric::Cosine).expect("should build");

    let query = KeywordEmbedder
        .embed("yoğurt, dereotu")
        .expect("query should embed");
    let hits = index.search(&query, 1).expect("search");
    assert_eq!(hit_texts(&hits), vec!["Yoğurt ve dereotu ile cacık"]);
}

#[test]
fn persist_and_load_preserve_entries() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let dir = temp_dir.path().join("index");
    let index = sample_index(Metric::L2);

    index.persist(&dir).expect("should persist");
    assert!(dir.join(MANIFEST_FILE).exists());
    assert!(dir.join(ENTRIES_FILE).exists());

    let loaded = VectorIndex::load(&dir, 2).expect("should load");
    assert_eq!(loaded, index);

    let manifest = read_manifest(&dir).expect("should read manifest");
    assert_eq!(manifest.format_version, FORMAT_VERSION);
    assert_eq!(manifest.chunk_count, 4);
    assert_eq!(manifest.metric, Metric::L2);
    assert!(chrono::DateTime::parse_from_rfc3339(&manifest.created_at).is_ok());
}

#[test]
fn load_rejects_other_dimension() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    sample_index(Metric::Cosine)
        .persist(temp_dir.path())
        .expect("should persist");

    let err = VectorIndex::load(temp_dir.path(), 768).unwrap_err();
    assert!(matches!(
        err,
        RecipeError::IncompatibleIndex {
            expected: 768,
            found: 2
        }
    ));
}

#[test]
fn load_rejects_tampered_vectors() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    sample_index(Metric::Cosine)
        .persist(temp_dir.path())
        .expect("should persist");

    let entries = vec![IndexEntry {
        chunk: chunk("kısa", 0),
        vector: vec![1.0],
    }];
    fs::write(
        temp_dir.path().join(ENTRIES_FILE),
        serde_json::to_vec(&entries).expect("should serialize"),
    )
    .expect("should overwrite entries");

    assert!(matches!(
        VectorIndex::load(temp_dir.path(), 2),
        Err(RecipeError::IncompatibleIndex { found: 1, .. })
    ));
}

#[test]
fn load_without_manifest_is_index_error() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    assert!(matches!(
        VectorIndex::load(temp_dir.path(), 2),
        Err(RecipeError::Index(_))
    ));
}

fn corpus_config(temp_dir: &TempDir) -> Config {
    let corpus = temp_dir.path().join("corpus");
    fs::create_dir_all(&corpus).expect("should create corpus dir");
    fs::write(
        corpus.join("cacik.txt"),
        "Cacık: yoğurt, dereotu ve salatalık.",
    )
    .expect("should write");
    fs::write(corpus.join("kofte.txt"), "Kıymalı köfte, yoğurt ile.").expect("should write");
    fs::write(corpus.join("pilav.txt"), "Sade pilav.").expect("should write");

    let mut config = Config::with_base_dir(temp_dir.path());
    config.corpus.path = corpus;
    config
}

#[test]
fn open_or_build_builds_once_then_loads() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = corpus_config(&temp_dir);

    let (built, report) =
        VectorIndex::open_or_build(&config, &KeywordEmbedder, false).expect("should build");
    // The pilav file does not mention the keyword
    assert_eq!(report.map(|r| r.embedded), Some(2));
    assert!(config.index_path().join(MANIFEST_FILE).exists());

    let (loaded, report) =
        VectorIndex::open_or_build(&config, &KeywordEmbedder, false).expect("should load");
    assert!(report.is_none());
    assert_eq!(loaded.entries(), built.entries());

    let (_, report) =
        VectorIndex::open_or_build(&config, &KeywordEmbedder, true).expect("should rebuild");
    assert!(report.is_some());
}

#[test]
fn open_or_build_reports_filtered_out_corpus() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = corpus_config(&temp_dir);
    config.corpus.keyword = Some("ayran".to_string());

    let err = VectorIndex::open_or_build(&config, &KeywordEmbedder, false).unwrap_err();
    assert!(matches!(err, RecipeError::EmptyCorpus(ref m) if m.contains("ayran")));
}

#[test]
fn shared_index_initializes_once_across_threads() {
    let shared = Arc::new(SharedIndex::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let shared = Arc::clone(&shared);
            let calls = Arc::clone(&calls);
            thread::spawn(move || {
                shared
                    .get_or_try_init(|| {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(20));
                        Ok(sample_index(Metric::Cosine))
                    })
                    .map(|index| index.len())
            })
        })
        .collect();

    for handle in handles {
        let len = handle
            .join()
            .expect("thread should not panic")
            .expect("init should succeed");
        assert_eq!(len, 4);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn shared_index_does_not_cache_failures() {
    let shared = SharedIndex::new();

    let first = shared.get_or_try_init(|| Err(RecipeError::EmptyCorpus("nothing".to_string())));
    assert!(first.is_err());
    assert!(shared.get().is_none());

    let second = shared
        .get_or_try_init(|| Ok(sample_index(Metric::Cosine)))
        .expect("second attempt should succeed");
    assert_eq!(second.len(), 4);
    assert!(shared.get().is_some());
}
