//! Domain types exchanged between the embedder, the vector store and the report.

use serde::{Deserialize, Serialize};

use crate::filter::MetadataFilter;

/// Free-form metadata stored next to each vector in the remote index.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A single similarity query against the remote index.
///
/// Serializes to the camelCase body the data plane expects; `filter` and
/// `namespace` are omitted when unset.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub vector: Vec<f32>,
    pub top_k: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<MetadataFilter>,
    pub include_metadata: bool,
    pub include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl QueryRequest {
    /// Metadata-only query: values are never requested back.
    pub fn new(vector: Vec<f32>, top_k: usize) -> Self {
        Self { vector, top_k, filter: None, include_metadata: true, include_values: false, namespace: None }
    }

    pub fn with_filter(mut self, filter: Option<MetadataFilter>) -> Self {
        self.filter = filter.filter(|f| !f.is_empty());
        self
    }

    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace.filter(|ns| !ns.is_empty());
        self
    }
}

/// One hit returned by the index. Higher `score` is more similar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryMatch {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub metadata: Metadata,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Metadata, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Metadata>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    #[serde(default)]
    pub read_units: u64,
}

/// Matches in service order, best first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    #[serde(default)]
    pub matches: Vec<QueryMatch>,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// What the control plane reports about an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDescription {
    pub name: String,
    pub dimension: Option<usize>,
    pub metric: Option<String>,
    pub host: String,
    pub ready: bool,
}
