use super::*;
use std::sync::Mutex;

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

fn scored(isbn13: i64, distance: f32) -> ScoredBook {
    ScoredBook {
        isbn13,
        distance,
        similarity: 1.0 - distance,
    }
}

/// Records queries and returns a fixed vector.
struct FakeEmbedder {
    queries: Mutex<Vec<String>>,
}

impl FakeEmbedder {
    fn new() -> Self {
        Self {
            queries: Mutex::new(Vec::new()),
        }
    }
}

impl Embedder for FakeEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.queries
            .lock()
            .expect("lock should not be poisoned")
            .push(text.to_string());
        Ok(vec![0.1, 0.2, 0.3])
    }
}

/// Returns a canned candidate list and records the requested limit.
struct FakeIndex {
    results: Vec<ScoredBook>,
    requested_limits: Mutex<Vec<usize>>,
}

impl FakeIndex {
    fn new(results: Vec<ScoredBook>) -> Self {
        Self {
            results,
            requested_limits: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl VectorIndex for FakeIndex {
    async fn search(&self, _query_vector: &[f32], limit: usize) -> Result<Vec<ScoredBook>> {
        self.requested_limits
            .lock()
            .expect("lock should not be poisoned")
            .push(limit);
        Ok(self.results.iter().take(limit).cloned().collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.results.len() as u64)
    }
}

struct FailingIndex;

#[async_trait::async_trait]
impl VectorIndex for FailingIndex {
    async fn search(&self, _query_vector: &[f32], _limit: usize) -> Result<Vec<ScoredBook>> {
        Err(BookrecError::Store("backend unavailable".to_string()))
    }

    async fn count(&self) -> Result<u64> {
        Err(BookrecError::Store("backend unavailable".to_string()))
    }
}

fn test_engine(books: Vec<Book>, results: Vec<ScoredBook>) -> Engine {
    Engine::new(
        Catalog::from_books(books),
        Box::new(FakeEmbedder::new()),
        Box::new(FakeIndex::new(results)),
        SearchConfig::default(),
    )
}

#[tokio::test]
async fn rating_filter_drops_low_rated_books() {
    let engine = test_engine(
        vec![
            book(1, "Low", 3.0),
            book(2, "Mid", 4.0),
            book(3, "High", 4.5),
        ],
        vec![scored(1, 0.1), scored(2, 0.2), scored(3, 0.3)],
    );

    let results = engine
        .recommend("space opera", Some(10), Some(3.5))
        .await
        .expect("recommend should succeed");

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].book.title, "Mid");
    assert_eq!(results[1].book.title, "High");
}

#[tokio::test]
async fn zero_min_rating_disables_filter() {
    let engine = test_engine(
        vec![book(1, "Low", 1.0), book(2, "High", 4.5)],
        vec![scored(1, 0.1), scored(2, 0.2)],
    );

    let results = engine
        .recommend("anything", Some(10), Some(0.0))
        .await
        .expect("recommend should succeed");

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].book.title, "Low");
}

#[tokio::test]
async fn results_truncated_to_top_k() {
    let engine = test_engine(
        vec![
            book(1, "A", 4.0),
            book(2, "B", 4.0),
            book(3, "C", 4.0),
            book(4, "D", 4.0),
        ],
        vec![
            scored(1, 0.1),
            scored(2, 0.2),
            scored(3, 0.3),
            scored(4, 0.4),
        ],
    );

    let results = engine
        .recommend("query", Some(2), None)
        .await
        .expect("recommend should succeed");

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].book.title, "A");
    assert_eq!(results[1].book.title, "B");
}

#[tokio::test]
async fn overfetch_applied_only_when_filter_active() {
    let shared = std::sync::Arc::new(FakeIndex::new(vec![scored(1, 0.1)]));

    struct SharedIndex(std::sync::Arc<FakeIndex>);

    #[async_trait::async_trait]
    impl VectorIndex for SharedIndex {
        async fn search(&self, query_vector: &[f32], limit: usize) -> Result<Vec<ScoredBook>> {
            self.0.search(query_vector, limit).await
        }

        async fn count(&self) -> Result<u64> {
            self.0.count().await
        }
    }

    let engine = Engine::new(
        Catalog::from_books(vec![book(1, "A", 4.0)]),
        Box::new(FakeEmbedder::new()),
        Box::new(SharedIndex(std::sync::Arc::clone(&shared))),
        SearchConfig::default(),
    );

    engine
        .recommend("q", Some(4), Some(3.5))
        .await
        .expect("recommend should succeed");
    engine
        .recommend("q", Some(4), Some(0.0))
        .await
        .expect("recommend should succeed");

    let limits = shared
        .requested_limits
        .lock()
        .expect("lock should not be poisoned")
        .clone();
    assert_eq!(limits, vec![20, 4]);
}

#[tokio::test]
async fn unknown_ids_are_skipped() {
    let engine = test_engine(
        vec![book(2, "Known", 4.0)],
        vec![scored(1, 0.1), scored(2, 0.2)],
    );

    let results = engine
        .recommend("query", Some(10), None)
        .await
        .expect("recommend should succeed");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].book.title, "Known");
}

#[tokio::test]
async fn empty_store_yields_empty_results() {
    let engine = test_engine(vec![book(1, "A", 4.0)], vec![]);

    let results = engine
        .recommend("query", None, None)
        .await
        .expect("recommend should succeed");

    assert!(results.is_empty());
}

#[tokio::test]
async fn store_failure_surfaces_as_store_error() {
    let engine = Engine::new(
        Catalog::from_books(vec![book(1, "A", 4.0)]),
        Box::new(FakeEmbedder::new()),
        Box::new(FailingIndex),
        SearchConfig::default(),
    );

    let result = engine.recommend("query", None, None).await;
    assert!(matches!(result, Err(BookrecError::Store(_))));
}

#[tokio::test]
async fn invalid_top_k_rejected() {
    let engine = test_engine(vec![book(1, "A", 4.0)], vec![scored(1, 0.1)]);

    assert!(matches!(
        engine.recommend("query", Some(0), None).await,
        Err(BookrecError::InvalidArgument(_))
    ));
    assert!(matches!(
        engine.recommend("query", Some(101), None).await,
        Err(BookrecError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn invalid_min_rating_rejected() {
    let engine = test_engine(vec![book(1, "A", 4.0)], vec![scored(1, 0.1)]);

    assert!(matches!(
        engine.recommend("query", None, Some(5.1)).await,
        Err(BookrecError::InvalidArgument(_))
    ));
    assert!(matches!(
        engine.recommend("query", None, Some(-0.1)).await,
        Err(BookrecError::InvalidArgument(_))
    ));
    assert!(matches!(
        engine.recommend("query", None, Some(f32::NAN)).await,
        Err(BookrecError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn empty_query_is_embedded_unchanged() {
    let embedder = std::sync::Arc::new(FakeEmbedder::new());

    struct SharedEmbedder(std::sync::Arc<FakeEmbedder>);

    impl Embedder for SharedEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.0.embed(text)
        }
    }

    let engine = Engine::new(
        Catalog::from_books(vec![book(1, "A", 4.0)]),
        Box::new(SharedEmbedder(std::sync::Arc::clone(&embedder))),
        Box::new(FakeIndex::new(vec![])),
        SearchConfig::default(),
    );

    engine
        .recommend("", None, None)
        .await
        .expect("recommend should succeed");

    let queries = embedder
        .queries
        .lock()
        .expect("lock should not be poisoned")
        .clone();
    assert_eq!(queries, vec![String::new()]);
}

#[tokio::test]
async fn repeated_queries_are_deterministic() {
    let engine = test_engine(
        vec![book(1, "A", 4.0), book(2, "B", 4.2)],
        vec![scored(1, 0.1), scored(2, 0.2)],
    );

    let first = engine
        .recommend("query", Some(2), None)
        .await
        .expect("recommend should succeed");
    let second = engine
        .recommend("query", Some(2), None)
        .await
        .expect("recommend should succeed");

    let titles = |results: &[Recommendation]| {
        results
            .iter()
            .map(|r| r.book.title.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(titles(&first), titles(&second));
}
