//! Minimal Pinecone REST client: resolve an index host through the control
//! plane, then run similarity queries against the data plane.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use tutorsearch_core::config::PineconeConfig;
use tutorsearch_core::error::Error;
use tutorsearch_core::traits::VectorStore;
use tutorsearch_core::types::{IndexDescription, QueryRequest, QueryResponse};

const API_KEY_HEADER: &str = "api-key";
const API_VERSION_HEADER: &str = "x-pinecone-api-version";

/// Control-plane `GET /indexes/{name}` body; fields not listed are ignored.
#[derive(Debug, Deserialize)]
struct DescribeIndexResponse {
    name: String,
    dimension: Option<usize>,
    metric: Option<String>,
    host: String,
    #[serde(default)]
    status: IndexStatus,
}

#[derive(Debug, Default, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    state: Option<String>,
}

pub struct PineconeClient {
    http: Client,
    control_plane_url: String,
}

impl PineconeClient {
    pub fn new(api_key: &str, config: &PineconeConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|_| Error::InvalidConfig("API key contains characters not allowed in a header".into()))?;
        key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key);
        let version = HeaderValue::from_str(&config.api_version)
            .map_err(|_| Error::InvalidConfig(format!("invalid api_version '{}'", config.api_version)))?;
        headers.insert(API_VERSION_HEADER, version);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, control_plane_url: config.control_plane_url.trim_end_matches('/').to_string() })
    }

    pub async fn describe_index(&self, name: &str) -> Result<IndexDescription> {
        let connection_error = |reason: String| Error::IndexConnection { index: name.to_string(), reason };

        let url = format!("{}/indexes/{}", self.control_plane_url, name);
        debug!(%url, "Describing index");
        let response = self.http.get(&url).send().await.map_err(|e| connection_error(e.to_string()))?;
        let response = match response.status() {
            StatusCode::NOT_FOUND => return Err(connection_error("index not found".into()).into()),
            status if !status.is_success() => {
                return Err(connection_error(error_body(status, response).await).into());
            }
            _ => response,
        };
        let body: DescribeIndexResponse = response
            .json()
            .await
            .map_err(|e| connection_error(format!("unexpected describe response: {e}")))?;

        if !body.status.ready {
            warn!(index = %body.name, state = body.status.state.as_deref().unwrap_or("unknown"), "Index is not ready");
        }
        Ok(IndexDescription {
            name: body.name,
            dimension: body.dimension,
            metric: body.metric,
            host: body.host,
            ready: body.status.ready,
        })
    }

    /// Uses `index_host` when configured, otherwise asks the control plane.
    pub async fn connect_index(&self, config: &PineconeConfig) -> Result<PineconeIndex> {
        let description = match config.index_host.as_deref().filter(|h| !h.trim().is_empty()) {
            Some(host) => IndexDescription {
                name: config.index_name.clone(),
                dimension: None,
                metric: None,
                host: host.trim().to_string(),
                ready: true,
            },
            None => self.describe_index(&config.index_name).await?,
        };
        Ok(PineconeIndex { http: self.http.clone(), base_url: base_url(&description.host), description })
    }
}

/// A connected index on the data plane.
pub struct PineconeIndex {
    http: Client,
    base_url: String,
    description: IndexDescription,
}

impl PineconeIndex {
    pub fn base_url(&self) -> &str { &self.base_url }
}

#[async_trait]
impl VectorStore for PineconeIndex {
    fn describe(&self) -> &IndexDescription { &self.description }

    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let url = format!("{}/query", self.base_url);
        debug!(%url, top_k = request.top_k, filtered = request.filter.is_some(), "Querying index");
        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Query(format!("request to {url} failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Query(error_body(status, response).await).into());
        }
        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| Error::Query(format!("failed to parse query response: {e}")))?;
        Ok(body)
    }
}

/// Control-plane hosts come back without a scheme; explicit schemes are kept.
pub fn base_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

async fn error_body(status: StatusCode, response: Response) -> String {
    let text = response.text().await.unwrap_or_default();
    if text.trim().is_empty() { format!("HTTP {status}") } else { format!("HTTP {status}: {}", text.trim()) }
}
