use async_trait::async_trait;

use crate::types::{IndexDescription, QueryRequest, QueryResponse};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    /// One vector per input, in input order.
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    fn describe(&self) -> &IndexDescription;
    async fn query(&self, request: &QueryRequest) -> anyhow::Result<QueryResponse>;
}
