//! Layered configuration and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (nested keys separated by `__`, e.g.
//! `APP_SEARCH__TOP_K=3`). The API key is never part of the config files; it
//! is read from `PINECONE_API_KEY` only.

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::filter::MetadataFilter;

pub const API_KEY_ENV: &str = "PINECONE_API_KEY";

/// Upper bound the query endpoint accepts for `topK`.
pub const MAX_TOP_K: usize = 10_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pinecone: PineconeConfig,
    pub embedding: EmbeddingConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PineconeConfig {
    pub index_name: String,
    /// Data-plane host; when set, the control-plane lookup is skipped.
    pub index_host: Option<String>,
    pub control_plane_url: String,
    pub api_version: String,
    pub namespace: Option<String>,
    pub timeout_secs: u64,
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            index_name: "mathtutor-e5-large".to_string(),
            index_host: None,
            control_plane_url: "https://api.pinecone.io".to_string(),
            api_version: "2024-07".to_string(),
            namespace: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model_name: String,
    pub model_dir: String,
    pub max_len: usize,
    pub dimension: usize,
    /// Prepended to every input before tokenization (e5 models accept `"query: "`).
    pub query_prefix: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_name: "intfloat/multilingual-e5-large".to_string(),
            model_dir: "models/multilingual-e5-large".to_string(),
            max_len: 512,
            dimension: 1024,
            query_prefix: String::new(),
        }
    }
}

impl EmbeddingConfig {
    pub fn model_dir(&self) -> PathBuf { expand_path(&self.model_dir) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub query: String,
    pub top_k: usize,
    pub snippet_chars: usize,
    /// Equality conditions, `field = value`.
    pub filter: BTreeMap<String, serde_json::Value>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            query: "נקודות על מערכת צירים עם משולש".to_string(),
            top_k: 5,
            snippet_chars: 100,
            filter: BTreeMap::from([("grade".to_string(), serde_json::Value::String("ח".to_string()))]),
        }
    }
}

impl SearchConfig {
    pub fn metadata_filter(&self) -> MetadataFilter {
        MetadataFilter::from_equalities(self.filter.iter().map(|(k, v)| (k.clone(), v.clone())))
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> anyhow::Result<Self> {
        let config: Self = Self::figment(env_name)
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn figment(env_name: &str) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default())).merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment.merge(Env::prefixed("APP_").split("__"))
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.pinecone.index_name.trim().is_empty() {
            return Err(Error::InvalidConfig("pinecone.index_name must not be empty".into()));
        }
        if self.search.query.trim().is_empty() {
            return Err(Error::InvalidConfig("search.query must not be empty".into()));
        }
        if self.search.top_k == 0 || self.search.top_k > MAX_TOP_K {
            return Err(Error::InvalidConfig(format!(
                "search.top_k must be between 1 and {MAX_TOP_K}, got {}",
                self.search.top_k
            )));
        }
        if self.embedding.dimension == 0 {
            return Err(Error::InvalidConfig("embedding.dimension must be positive".into()));
        }
        if self.embedding.max_len == 0 {
            return Err(Error::InvalidConfig("embedding.max_len must be positive".into()));
        }
        Ok(())
    }
}

/// Read the API key, failing fast when it is missing or blank.
pub fn api_key_from_env() -> Result<String, Error> {
    match env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(Error::MissingCredential),
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
