//! End-to-end search pipeline tests against a real LanceDB store, with a
//! deterministic embedder standing in for Ollama.

use bookrec::Result;
use bookrec::catalog::{Book, Catalog};
use bookrec::config::{Config, OllamaConfig, SearchConfig};
use bookrec::database::{BookEmbedding, VectorStore};
use bookrec::engine::{Embedder, Engine};
use tempfile::TempDir;

const DIMENSION: u32 = 3;

/// Maps a handful of known phrases to fixed unit vectors.
struct PhraseEmbedder;

impl Embedder for PhraseEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(match text {
            "desert politics" => vec![1.0, 0.0, 0.0],
            "english romance" => vec![0.0, 1.0, 0.0],
            _ => vec![0.577, 0.577, 0.577],
        })
    }
}

fn book(isbn13: i64, title: &str, rating: f32) -> Book {
    Book {
        isbn13,
        title: title.to_string(),
        authors: "Test Author".to_string(),
        description: format!("Description of {}", title),
        average_rating: rating,
        published_year: Some(2000),
        num_pages: Some(300),
        thumbnail: None,
    }
}

fn embedding(isbn13: i64, vector: Vec<f32>) -> BookEmbedding {
    BookEmbedding {
        id: format!("embedding_{}", isbn13),
        vector,
        isbn13,
        created_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

fn test_config(base_dir: &std::path::Path) -> Config {
    Config {
        ollama: OllamaConfig {
            embedding_dimension: DIMENSION,
            ..OllamaConfig::default()
        },
        base_dir: base_dir.to_path_buf(),
        ..Config::default()
    }
}

async fn build_engine(
    books: Vec<Book>,
    embeddings: Vec<BookEmbedding>,
) -> (Engine, TempDir) {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = test_config(temp_dir.path());

    let store = VectorStore::create(&config, false)
        .await
        .expect("should create vector store");
    store
        .insert_batch(&embeddings)
        .await
        .expect("should insert embeddings");
    drop(store);

    let store = VectorStore::open(&config)
        .await
        .expect("should reopen vector store");

    let engine = Engine::new(
        Catalog::from_books(books),
        Box::new(PhraseEmbedder),
        Box::new(store),
        SearchConfig::default(),
    );
    (engine, temp_dir)
}

#[tokio::test]
async fn search_ranks_by_similarity_and_filters_by_rating() {
    let (engine, _guard) = build_engine(
        vec![
            book(1, "Dune", 4.5),
            book(2, "Emma", 4.0),
            book(3, "Forgettable", 3.0),
        ],
        vec![
            embedding(1, vec![0.95, 0.05, 0.0]),
            embedding(2, vec![0.1, 0.9, 0.0]),
            embedding(3, vec![0.9, 0.1, 0.0]),
        ],
    )
    .await;

    let results = engine
        .recommend("desert politics", Some(10), Some(3.5))
        .await
        .expect("recommend should succeed");

    // "Forgettable" is semantically close but rated below the cutoff.
    let titles: Vec<&str> = results.iter().map(|r| r.book.title.as_str()).collect();
    assert_eq!(titles, vec!["Dune", "Emma"]);

    // Descending similarity
    for pair in results.windows(2) {
        assert!(pair[0].similarity >= pair[1].similarity);
    }
}

#[tokio::test]
async fn disabled_filter_recovers_low_rated_books() {
    let (engine, _guard) = build_engine(
        vec![book(1, "Dune", 4.5), book(3, "Forgettable", 3.0)],
        vec![
            embedding(1, vec![0.95, 0.05, 0.0]),
            embedding(3, vec![0.9, 0.1, 0.0]),
        ],
    )
    .await;

    let results = engine
        .recommend("desert politics", Some(10), Some(0.0))
        .await
        .expect("recommend should succeed");

    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn top_k_limits_result_count() {
    let (engine, _guard) = build_engine(
        vec![
            book(1, "A", 4.0),
            book(2, "B", 4.0),
            book(3, "C", 4.0),
        ],
        vec![
            embedding(1, vec![1.0, 0.0, 0.0]),
            embedding(2, vec![0.9, 0.1, 0.0]),
            embedding(3, vec![0.8, 0.2, 0.0]),
        ],
    )
    .await;

    let results = engine
        .recommend("desert politics", Some(2), None)
        .await
        .expect("recommend should succeed");

    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn empty_store_returns_empty_results() {
    let (engine, _guard) = build_engine(vec![book(1, "A", 4.0)], vec![]).await;

    let results = engine
        .recommend("anything at all", None, None)
        .await
        .expect("recommend should succeed");

    assert!(results.is_empty());
}

#[tokio::test]
async fn store_ids_missing_from_catalog_are_skipped() {
    let (engine, _guard) = build_engine(
        vec![book(1, "Known", 4.0)],
        vec![
            embedding(1, vec![1.0, 0.0, 0.0]),
            embedding(99, vec![0.95, 0.05, 0.0]),
        ],
    )
    .await;

    let results = engine
        .recommend("desert politics", Some(10), None)
        .await
        .expect("recommend should succeed");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].book.title, "Known");
}
