use anyhow::{bail, Result};
use candle_core::{DType, Tensor};

/// Attention-masked mean over the token axis, then L2 normalization.
///
/// `hidden` is `[B, T, H]`, `attention_mask` is `[B, T]` with 1 for real tokens
/// and 0 for padding. Returns `[B, H]` with unit-norm rows.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, seq_len, hidden_dim) = hidden.dims3()?;
    if attention_mask.dims() != [batch, seq_len] {
        bail!("attention mask shape {:?} does not match hidden states [{batch}, {seq_len}, _]", attention_mask.dims());
    }

    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    // All-padding rows would divide by zero; clamp the token count to 1.
    let counts = mask.sum(1)?.maximum(1f64)?;
    let mean = summed.broadcast_div(&counts)?;

    let eps = match hidden.dtype() { DType::F16 | DType::BF16 => 1e-6, _ => 1e-12 };
    let norm = (mean.sqr()?.sum_keepdim(1)?.sqrt()? + eps)?;
    let pooled = mean.broadcast_div(&norm)?;
    debug_assert_eq!(pooled.dims(), [batch, hidden_dim]);
    Ok(pooled)
}
