//! Sentence embeddings for search queries.
//!
//! `SentenceEmbedder` runs a local XLM-RoBERTa checkpoint (e.g.
//! `intfloat/multilingual-e5-large`) through candle and mean-pools the last
//! hidden state. `FakeEmbedder` gives deterministic vectors without weights and
//! is selected with `APP_USE_FAKE_EMBEDDINGS=1`.

mod device;
mod pool;
mod tokenize;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use tutorsearch_core::config::{resolve_with_base, EmbeddingConfig};
use tutorsearch_core::error::Error;
use tutorsearch_core::traits::Embedder;

pub use device::select_device;
pub use pool::masked_mean_l2;

pub const FAKE_EMBEDDINGS_ENV: &str = "APP_USE_FAKE_EMBEDDINGS";

pub struct SentenceEmbedder {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
    query_prefix: String,
}

impl SentenceEmbedder {
    pub fn load(config: &EmbeddingConfig) -> Result<Self> {
        let start = Instant::now();
        let embedder = Self::load_from(config)
            .map_err(|e| Error::ModelLoad(format!("{} ({e:#})", config.model_name)))?;
        info!(model = %config.model_name, elapsed = ?start.elapsed(), "Loaded embedding model");
        Ok(embedder)
    }

    fn load_from(config: &EmbeddingConfig) -> Result<Self> {
        let device = select_device();
        let model_dir = resolve_model_dir(config)?;

        let tokenizer_path = model_dir.join("tokenizer.json");
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        tokenize::configure(&mut tokenizer, config.max_len)?;

        let config_path = model_dir.join("config.json");
        let raw = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let model_config: XLMRobertaConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        let weights = load_weights(&model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = XLMRobertaModel::new(&model_config, vb).context("Failed to build XLM-RoBERTa model")?;

        Ok(Self {
            model,
            tokenizer,
            device,
            dim: config.dimension,
            max_len: config.max_len,
            query_prefix: config.query_prefix.clone(),
        })
    }

    fn embed_inner(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let inputs: Vec<String> = texts.iter().map(|t| format!("{}{}", self.query_prefix, t)).collect();
        let (input_ids, attention_mask) = tokenize::encode_batch(&self.tokenizer, inputs, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let vectors: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_dtype(DType::F32)?.to_vec2()?;
        if let Some(v) = vectors.iter().find(|v| v.len() != self.dim) {
            return Err(anyhow!("Expected embedding dimension {}, got {}", self.dim, v.len()));
        }
        Ok(vectors)
    }
}

impl Embedder for SentenceEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(Vec::new()); }
        let start = Instant::now();
        let vectors = self.embed_inner(texts).map_err(|e| Error::Embedding(format!("{e:#}")))?;
        debug!(batch = texts.len(), elapsed = ?start.elapsed(), "Embedded batch");
        Ok(vectors)
    }
}

/// Hash-bucket embedder: same text, same unit vector. No model files needed.
pub struct FakeEmbedder { dim: usize, max_len: usize }

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim, max_len: 512 } }

    /// Whitespace tokens past `max_len` are ignored, like model truncation.
    #[must_use]
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;

        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().take(self.max_len).enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = usize::try_from(h % self.dim as u64).unwrap_or(0);
            let val = ((h >> 32) as u32) as f32 / u32::MAX as f32;
            v[idx] += val + (i % 3) as f32 * 0.01;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v { *x /= norm; }
        } else if let Some(first) = v.first_mut() {
            *first = 1.0;
        }
        v
    }
}

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

pub fn fake_embeddings_requested() -> bool {
    std::env::var(FAKE_EMBEDDINGS_ENV)
        .ok()
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

/// The real model, or the fake one when `APP_USE_FAKE_EMBEDDINGS` is set.
pub fn load_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    if fake_embeddings_requested() {
        warn!(dim = config.dimension, "Using FakeEmbedder; results are not semantically meaningful");
        return Ok(Box::new(FakeEmbedder::new(config.dimension).with_max_len(config.max_len)));
    }
    Ok(Box::new(SentenceEmbedder::load(config)?))
}

/// Configured directory first, then the same path one level up (running from
/// inside a member crate).
fn resolve_model_dir(config: &EmbeddingConfig) -> Result<PathBuf> {
    let configured = config.model_dir();
    if configured.is_dir() {
        debug!(dir = %configured.display(), "Using model dir");
        return Ok(configured);
    }
    let parent = resolve_with_base(Path::new(".."), &config.model_dir);
    if parent.is_dir() {
        debug!(dir = %parent.display(), "Using model dir");
        return Ok(parent);
    }
    Err(anyhow!(
        "Could not locate model directory for {}. Checked {} and {}",
        config.model_name,
        configured.display(),
        parent.display()
    ))
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.is_file() {
        return candle_core::safetensors::load(&safetensors, device)
            .with_context(|| format!("Failed to read {}", safetensors.display()));
    }
    let pickle = model_dir.join("pytorch_model.bin");
    if pickle.is_file() {
        let tensors = candle_core::pickle::read_all(&pickle)
            .with_context(|| format!("Failed to read {}", pickle.display()))?;
        return Ok(tensors.into_iter().collect());
    }
    Err(anyhow!("No model.safetensors or pytorch_model.bin in {}", model_dir.display()))
}
