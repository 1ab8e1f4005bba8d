//! Start up, embed the query, run one filtered query, print the matches.
//!
//! Everything here works against the `Embedder` and `VectorStore` seams, so the
//! binary wires in the real model and index while tests use fakes.

use std::future::Future;
use std::io::Write;

use anyhow::{Context, Result};
use tracing::info;

use tutorsearch_core::config::{api_key_from_env, AppConfig, EmbeddingConfig, PineconeConfig};
use tutorsearch_core::error::Error;
use tutorsearch_core::traits::{Embedder, VectorStore};
use tutorsearch_core::types::{QueryRequest, QueryResponse};

use crate::report;

/// Credential, then model, then index. A missing key stops the run before
/// either loader is called.
pub async fn start<S, C, Fut>(
    config: &AppConfig,
    load_embedder: impl FnOnce(&EmbeddingConfig) -> Result<Box<dyn Embedder>>,
    connect: C,
) -> Result<(Box<dyn Embedder>, S)>
where
    S: VectorStore,
    C: FnOnce(String, PineconeConfig) -> Fut,
    Fut: Future<Output = Result<S>>,
{
    let api_key = api_key_from_env()?;

    let embedder = load_embedder(&config.embedding)?;
    info!(
        model = %config.embedding.model_name,
        dim = embedder.dim(),
        max_len = embedder.max_len(),
        "Embedding model ready"
    );

    let store = connect(api_key, config.pinecone.clone()).await?;
    info!(index = %store.describe().name, host = %store.describe().host, "Connected to index");
    Ok((embedder, store))
}

pub fn embed_query(embedder: &dyn Embedder, query: &str) -> Result<Vec<f32>> {
    let vector = embedder
        .embed_batch(&[query.to_string()])?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Embedding("embedder returned no vector".into()))?;
    info!(dim = vector.len(), "Generated query embedding");
    Ok(vector)
}

pub async fn search(config: &AppConfig, embedder: &dyn Embedder, store: &dyn VectorStore) -> Result<QueryResponse> {
    let vector = embed_query(embedder, &config.search.query)?;
    let index = store.describe();
    if let Some(expected) = index.dimension {
        if expected != vector.len() {
            return Err(Error::Embedding(format!(
                "query vector has {} dimensions but index '{}' expects {}",
                vector.len(),
                index.name,
                expected
            ))
            .into());
        }
    }

    let top_k = config.search.top_k;
    let request = QueryRequest::new(vector, top_k)
        .with_filter(Some(config.search.metadata_filter()))
        .with_namespace(config.pinecone.namespace.clone());
    let response = store.query(&request).await?;
    info!(
        index = %index.name,
        top_k,
        matches = response.matches.len(),
        read_units = response.usage.as_ref().map_or(0, |u| u.read_units),
        "Queried index"
    );
    Ok(response)
}

pub async fn run<W: Write>(
    config: &AppConfig,
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    out: &mut W,
) -> Result<()> {
    let response = search(config, embedder, store).await?;
    report::render(out, &config.search.query, &response.matches, config.search.snippet_chars)
        .context("Failed to write results")?;
    Ok(())
}
