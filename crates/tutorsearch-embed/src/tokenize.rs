use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

/// XLM-RoBERTa `<pad>`; used when the tokenizer file does not name one.
const DEFAULT_PAD_ID: u32 = 1;

/// Truncate every input to `max_len` tokens (special tokens included) and pad
/// batches to their longest row.
pub fn configure(tokenizer: &mut Tokenizer, max_len: usize) -> Result<()> {
    let pad_token = "<pad>".to_string();
    let pad_id = tokenizer.token_to_id(&pad_token).unwrap_or(DEFAULT_PAD_ID);
    tokenizer
        .with_truncation(Some(TruncationParams { max_length: max_len, ..Default::default() }))
        .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;
    tokenizer.with_padding(Some(PaddingParams {
        strategy: PaddingStrategy::BatchLongest,
        pad_id,
        pad_token,
        ..Default::default()
    }));
    Ok(())
}

/// Returns `(input_ids, attention_mask)`, both `[B, T]` u32 on `device`.
pub fn encode_batch(tokenizer: &Tokenizer, texts: Vec<String>, device: &Device) -> Result<(Tensor, Tensor)> {
    let batch = texts.len();
    let encodings = tokenizer.encode_batch(texts, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    let seq_len = encodings.first().map_or(0, |e| e.get_ids().len());
    if seq_len == 0 {
        return Err(anyhow!("Tokenization produced no tokens"));
    }

    let mut ids = Vec::with_capacity(batch * seq_len);
    let mut mask = Vec::with_capacity(batch * seq_len);
    for enc in &encodings {
        ids.extend_from_slice(enc.get_ids());
        mask.extend_from_slice(enc.get_attention_mask());
    }
    let input_ids = Tensor::from_vec(ids, (batch, seq_len), device)?;
    let attention_mask = Tensor::from_vec(mask, (batch, seq_len), device)?;
    Ok((input_ids, attention_mask))
}
