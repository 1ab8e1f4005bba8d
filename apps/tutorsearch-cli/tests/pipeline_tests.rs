use std::cell::Cell;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use tutorsearch_cli::pipeline;
use tutorsearch_core::config::{AppConfig, EmbeddingConfig, PineconeConfig, API_KEY_ENV};
use tutorsearch_core::error::Error;
use tutorsearch_core::filter::MetadataFilter;
use tutorsearch_core::traits::{Embedder, VectorStore};
use tutorsearch_core::types::{IndexDescription, Metadata, QueryMatch, QueryRequest, QueryResponse};
use tutorsearch_embed::FakeEmbedder;

struct RecordingStore {
    description: IndexDescription,
    matches: Vec<QueryMatch>,
    fail: bool,
    seen: Mutex<Vec<QueryRequest>>,
}

impl RecordingStore {
    fn new(dimension: Option<usize>, matches: Vec<QueryMatch>) -> Self {
        Self {
            description: IndexDescription {
                name: "mathtutor-e5-large".into(),
                dimension,
                metric: Some("cosine".into()),
                host: "stub".into(),
                ready: true,
            },
            matches,
            fail: false,
            seen: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<QueryRequest> { self.seen.lock().unwrap().clone() }
}

#[async_trait]
impl VectorStore for RecordingStore {
    fn describe(&self) -> &IndexDescription { &self.description }

    async fn query(&self, request: &QueryRequest) -> anyhow::Result<QueryResponse> {
        self.seen.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(Error::Query("HTTP 503 Service Unavailable".into()).into());
        }
        Ok(QueryResponse { matches: self.matches.clone(), ..QueryResponse::default() })
    }
}

fn metadata(value: serde_json::Value) -> Metadata {
    value.as_object().cloned().unwrap()
}

fn fixture_matches() -> Vec<QueryMatch> {
    vec![
        QueryMatch {
            id: "ex-12#q".into(),
            score: 0.873_14,
            metadata: metadata(json!({
                "exercise_id": "ex-12",
                "chunk_type": "question",
                "topic": "משולשים",
                "grade": "ח",
                "text": "א".repeat(120),
            })),
        },
        QueryMatch { id: "ex-40#s".into(), score: 0.8, metadata: Metadata::new() },
    ]
}

#[tokio::test]
async fn prints_each_match_in_report_format() {
    let config = AppConfig::default();
    let embedder = FakeEmbedder::new(1024);
    let store = RecordingStore::new(Some(1024), fixture_matches());
    let mut out = Vec::new();

    pipeline::run(&config, &embedder, &store, &mut out).await.unwrap();

    let expected = format!(
        "\n--- Search Results for Query: 'נקודות על מערכת צירים עם משולש' ---\n\
         1. Score: 0.8731\n\
         \x20  ID: ex-12#q\n\
         \x20  Exercise ID: ex-12\n\
         \x20  Chunk Type: question\n\
         \x20  Topic: משולשים\n\
         \x20  Grade: ח\n\
         \x20  Text Snippet: {}...\n\
         --------------------\n\
         2. Score: 0.8\n\
         \x20  ID: ex-40#s\n\
         \x20  Exercise ID: N/A\n\
         \x20  Chunk Type: N/A\n\
         \x20  Topic: N/A\n\
         \x20  Grade: N/A\n\
         \x20  Text Snippet: N/A\n\
         --------------------\n",
        "א".repeat(100)
    );
    assert_eq!(String::from_utf8(out).unwrap(), expected);
}

#[tokio::test]
async fn empty_result_prints_no_matches() {
    let mut config = AppConfig::default();
    config.search.query = "slope".into();
    let store = RecordingStore::new(Some(1024), Vec::new());
    let mut out = Vec::new();

    pipeline::run(&config, &FakeEmbedder::new(1024), &store, &mut out).await.unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "\n--- Search Results for Query: 'slope' ---\nNo matches found.\n");
}

#[tokio::test]
async fn request_carries_vector_filter_and_top_k() {
    let mut config = AppConfig::default();
    config.pinecone.namespace = Some("exercises".into());
    let store = RecordingStore::new(None, Vec::new());

    pipeline::search(&config, &FakeEmbedder::new(1024), &store).await.unwrap();

    let requests = store.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.vector.len(), 1024);
    assert_eq!(request.top_k, 5);
    assert!(request.include_metadata);
    assert!(!request.include_values);
    assert_eq!(request.filter, Some(MetadataFilter::new().equals("grade", "ח")));
    assert_eq!(request.namespace.as_deref(), Some("exercises"));
}

#[tokio::test]
async fn empty_filter_is_omitted() {
    let mut config = AppConfig::default();
    config.search.filter.clear();
    let store = RecordingStore::new(Some(1024), Vec::new());

    pipeline::search(&config, &FakeEmbedder::new(1024), &store).await.unwrap();

    let request = &store.requests()[0];
    assert_eq!(request.filter, None);
    let body = serde_json::to_value(request).unwrap();
    assert!(body.get("filter").is_none());
    assert!(body.get("namespace").is_none());
}

#[tokio::test]
async fn dimension_mismatch_stops_before_query() {
    let config = AppConfig::default();
    let store = RecordingStore::new(Some(768), fixture_matches());

    let err = pipeline::search(&config, &FakeEmbedder::new(1024), &store).await.unwrap_err();

    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Embedding(_))), "got {err:#}");
    assert!(store.requests().is_empty());
}

#[tokio::test]
async fn query_failure_ends_the_run_without_output() {
    let config = AppConfig::default();
    let mut store = RecordingStore::new(Some(1024), fixture_matches());
    store.fail = true;
    let mut out = Vec::new();

    let err = pipeline::run(&config, &FakeEmbedder::new(1024), &store, &mut out).await.unwrap_err();

    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Query(_))));
    assert_eq!(store.requests().len(), 1, "no retry");
    assert!(out.is_empty());
}

// The only test in this binary that touches the process environment.
#[tokio::test]
async fn startup_checks_the_key_before_loading_anything() {
    let config = AppConfig::default();
    let model_loaded = Cell::new(false);
    let connected_with = Cell::new(None::<String>);
    let load = |_: &EmbeddingConfig| -> anyhow::Result<Box<dyn Embedder>> {
        model_loaded.set(true);
        Ok(Box::new(FakeEmbedder::new(1024)))
    };
    let connect = |api_key: String, _: PineconeConfig| {
        connected_with.set(Some(api_key));
        async { Ok::<_, anyhow::Error>(RecordingStore::new(Some(1024), Vec::new())) }
    };

    std::env::remove_var(API_KEY_ENV);
    let err = pipeline::start(&config, load, connect).await.err().unwrap();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::MissingCredential)), "got {err:#}");
    assert!(!model_loaded.get());
    assert_eq!(connected_with.take(), None);

    std::env::set_var(API_KEY_ENV, "  pc-test-key ");
    let (embedder, store) = pipeline::start(&config, load, connect).await.unwrap();
    std::env::remove_var(API_KEY_ENV);
    assert!(model_loaded.get());
    assert_eq!(connected_with.take().as_deref(), Some("pc-test-key"));
    assert_eq!(embedder.dim(), 1024);
    assert_eq!(store.describe().name, "mathtutor-e5-large");
}
