use tutorsearch_core::config::EmbeddingConfig;
use tutorsearch_core::error::Error;
use tutorsearch_embed::{load_embedder, FakeEmbedder, SentenceEmbedder, FAKE_EMBEDDINGS_ENV};
use tutorsearch_core::traits::Embedder;

#[test]
fn fake_embedder_shapes_and_determinism() {
    // Force fake embedder to avoid loading large model
    std::env::set_var(FAKE_EMBEDDINGS_ENV, "1");

    let embedder = load_embedder(&EmbeddingConfig::default()).expect("embedder");
    let texts = vec![
        "נקודות על מערכת צירים עם משולש".to_string(),
        "נקודות על מערכת צירים עם משולש".to_string(),
        "slope of a line".to_string(),
    ];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    assert_eq!(embs.len(), 3, "one vector per input");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 1024, "embedding dim is 1024");

    // Norm approximately 1.0
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Deterministic for same input
    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
    assert_ne!(v1, &embs[2]);

    let config = EmbeddingConfig { max_len: 2, ..EmbeddingConfig::default() };
    let embedder = load_embedder(&config).expect("embedder");
    assert_eq!(embedder.max_len(), 2);
    let embs = embedder
        .embed_batch(&["slope of a line".to_string(), "slope of the axis".to_string()])
        .expect("embed_batch");
    assert_eq!(embs[0], embs[1], "tokens past max_len are ignored");
}

#[test]
fn fake_embedder_handles_empty_text() {
    let embedder = FakeEmbedder::new(8);
    let embs = embedder.embed_batch(&[String::new()]).expect("embed_batch");
    let norm: f32 = embs[0].iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-6);
    assert!(embedder.embed_batch(&[]).expect("empty batch").is_empty());
}

#[test]
fn missing_model_dir_is_a_model_load_error() {
    let tmp = tempfile::TempDir::new().expect("tmp");
    let config = EmbeddingConfig {
        model_dir: tmp.path().join("does-not-exist").to_string_lossy().into_owned(),
        ..EmbeddingConfig::default()
    };
    let err = match SentenceEmbedder::load(&config) {
        Ok(_) => panic!("loading without weights must fail"),
        Err(e) => e,
    };
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::ModelLoad(_))), "got {err:#}");
}

#[test]
fn incomplete_model_dir_names_the_missing_file() {
    let tmp = tempfile::TempDir::new().expect("tmp");
    let config = EmbeddingConfig {
        model_dir: tmp.path().to_string_lossy().into_owned(),
        ..EmbeddingConfig::default()
    };
    let err = match SentenceEmbedder::load(&config) {
        Ok(_) => panic!("loading without tokenizer must fail"),
        Err(e) => e,
    };
    assert!(err.to_string().contains("tokenizer.json"), "got {err}");
}
