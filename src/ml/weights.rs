// ============================================================
// Layer 5 — Pretrained Weight Import
// ============================================================
// Copies a Hugging Face BERT `model.safetensors` into a
// BertEncoder.
//
// Name mapping (prefix "bert." is optional and auto-detected):
//
//   embeddings.word_embeddings.weight          → embeddings.word
//   embeddings.position_embeddings.weight      → embeddings.position
//   embeddings.token_type_embeddings.weight    → embeddings.token_type
//   embeddings.LayerNorm.{weight,bias}         → embeddings.norm
//   encoder.layer.{i}.attention.self.query     → layers[i].attention.query.base
//   encoder.layer.{i}.attention.self.key       → layers[i].attention.key.base
//   encoder.layer.{i}.attention.self.value     → layers[i].attention.value
//   encoder.layer.{i}.attention.output.dense   → layers[i].attention.output
//   encoder.layer.{i}.attention.output.LayerNorm → layers[i].attention.norm
//   encoder.layer.{i}.intermediate.dense       → layers[i].feed_forward.intermediate
//   encoder.layer.{i}.output.dense             → layers[i].feed_forward.output
//   encoder.layer.{i}.output.LayerNorm         → layers[i].feed_forward.norm
//
// Older checkpoints name LayerNorm parameters gamma/beta instead
// of weight/bias; both are accepted.
//
// PyTorch stores Linear weights as [out, in]; Burn uses [in, out],
// so every linear weight is transposed on the way in.
//
// LoRA adapter matrices are not part of the checkpoint and keep
// their fresh initialisation.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use burn::{
    module::Param,
    nn::{Embedding, LayerNorm, Linear},
    prelude::*,
    tensor::TensorData,
};
use safetensors::{tensor::TensorView, Dtype, SafeTensors};

use crate::ml::bert::{BertConfig, BertEncoder};

const PREFIX: &str = "bert.";

/// Every tensor name (without prefix) and its PyTorch shape
pub fn expected_tensors(cfg: &BertConfig) -> Vec<(String, Vec<usize>)> {
    let h = cfg.hidden_size;
    let i = cfg.intermediate_size;

    let mut out = vec![
        ("embeddings.word_embeddings.weight".to_string(), vec![cfg.vocab_size, h]),
        ("embeddings.position_embeddings.weight".to_string(), vec![cfg.max_position_embeddings, h]),
        ("embeddings.token_type_embeddings.weight".to_string(), vec![cfg.type_vocab_size, h]),
        ("embeddings.LayerNorm.weight".to_string(), vec![h]),
        ("embeddings.LayerNorm.bias".to_string(), vec![h]),
    ];

    for layer in 0..cfg.num_hidden_layers {
        let p = format!("encoder.layer.{layer}");
        let linears = [
            (format!("{p}.attention.self.query"),   [h, h]),
            (format!("{p}.attention.self.key"),     [h, h]),
            (format!("{p}.attention.self.value"),   [h, h]),
            (format!("{p}.attention.output.dense"), [h, h]),
            (format!("{p}.intermediate.dense"),     [i, h]),
            (format!("{p}.output.dense"),           [h, i]),
        ];
        for (name, [d_out, d_in]) in linears {
            out.push((format!("{name}.weight"), vec![d_out, d_in]));
            out.push((format!("{name}.bias"), vec![d_out]));
        }
        for norm in ["attention.output.LayerNorm", "output.LayerNorm"] {
            out.push((format!("{p}.{norm}.weight"), vec![h]));
            out.push((format!("{p}.{norm}.bias"), vec![h]));
        }
    }
    out
}

/// Load a safetensors checkpoint into `encoder`
pub fn load_encoder<B: Backend>(
    encoder: BertEncoder<B>,
    cfg:     &BertConfig,
    path:    &Path,
    device:  &B::Device,
) -> Result<BertEncoder<B>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Cannot read weights '{}'", path.display()))?;
    let tensors = SafeTensors::deserialize(&bytes)
        .map_err(|e| anyhow!("Invalid safetensors file '{}': {e}", path.display()))?;

    let encoder = load_from_tensors(encoder, cfg, &tensors, device)
        .with_context(|| format!("Cannot import weights from '{}'", path.display()))?;

    tracing::info!(
        "Imported {} pretrained tensors from '{}'",
        expected_tensors(cfg).len(),
        path.display()
    );
    Ok(encoder)
}

/// Load from already-parsed safetensors
pub fn load_from_tensors<B: Backend>(
    mut encoder: BertEncoder<B>,
    cfg:         &BertConfig,
    tensors:     &SafeTensors<'_>,
    device:      &B::Device,
) -> Result<BertEncoder<B>> {
    let reader = WeightReader::<B>::new(tensors, device);

    // Report every problem at once rather than the first one
    let missing: Vec<String> = expected_tensors(cfg)
        .into_iter()
        .filter(|(name, _)| reader.view(name).is_err())
        .map(|(name, _)| name)
        .collect();
    if !missing.is_empty() {
        bail!(
            "{} tensors missing from checkpoint (first: {})",
            missing.len(),
            missing.iter().take(5).cloned().collect::<Vec<_>>().join(", ")
        );
    }

    let emb = &mut encoder.embeddings;
    reader.embedding(&mut emb.word,       "embeddings.word_embeddings")?;
    reader.embedding(&mut emb.position,   "embeddings.position_embeddings")?;
    reader.embedding(&mut emb.token_type, "embeddings.token_type_embeddings")?;
    reader.layer_norm(&mut emb.norm,      "embeddings.LayerNorm")?;

    for (i, layer) in encoder.layers.iter_mut().enumerate() {
        let p   = format!("encoder.layer.{i}");
        let att = &mut layer.attention;
        reader.linear(&mut att.query.base, &format!("{p}.attention.self.query"))?;
        reader.linear(&mut att.key.base,   &format!("{p}.attention.self.key"))?;
        reader.linear(&mut att.value,      &format!("{p}.attention.self.value"))?;
        reader.linear(&mut att.output,     &format!("{p}.attention.output.dense"))?;
        reader.layer_norm(&mut att.norm,   &format!("{p}.attention.output.LayerNorm"))?;

        let ffn = &mut layer.feed_forward;
        reader.linear(&mut ffn.intermediate, &format!("{p}.intermediate.dense"))?;
        reader.linear(&mut ffn.output,       &format!("{p}.output.dense"))?;
        reader.layer_norm(&mut ffn.norm,     &format!("{p}.output.LayerNorm"))?;
    }

    Ok(encoder)
}

// ─── WeightReader ─────────────────────────────────────────────────────────────
struct WeightReader<'a, B: Backend> {
    tensors: &'a SafeTensors<'a>,
    prefix:  &'static str,
    device:  &'a B::Device,
}

impl<'a, B: Backend> WeightReader<'a, B> {
    fn new(tensors: &'a SafeTensors<'a>, device: &'a B::Device) -> Self {
        let prefixed = format!("{PREFIX}embeddings.word_embeddings.weight");
        let prefix = if tensors.names().iter().any(|n| **n == prefixed) { PREFIX } else { "" };
        Self { tensors, prefix, device }
    }

    /// Find a tensor, trying the gamma/beta aliases for LayerNorm
    fn view(&self, name: &str) -> Result<TensorView<'a>> {
        let mut candidates = vec![name.to_string()];
        if name.contains("LayerNorm") {
            if let Some(stem) = name.strip_suffix(".weight") {
                candidates.push(format!("{stem}.gamma"));
            } else if let Some(stem) = name.strip_suffix(".bias") {
                candidates.push(format!("{stem}.beta"));
            }
        }
        candidates
            .iter()
            .find_map(|c| self.tensors.tensor(&format!("{}{c}", self.prefix)).ok())
            .ok_or_else(|| anyhow!("Tensor '{}{}' not found", self.prefix, name))
    }

    /// Read a tensor as f32 values and check its shape
    fn values(&self, name: &str, shape: &[usize]) -> Result<Vec<f32>> {
        let view = self.view(name)?;
        if view.shape() != shape {
            bail!("Tensor '{}' has shape {:?}, expected {:?}", name, view.shape(), shape);
        }
        to_f32(&view).with_context(|| format!("Tensor '{name}'"))
    }

    fn tensor<const D: usize>(&self, name: &str, shape: [usize; D]) -> Result<Tensor<B, D>> {
        let values = self.values(name, &shape)?;
        Ok(Tensor::from_data(TensorData::new(values, shape), self.device))
    }

    fn linear(&self, linear: &mut Linear<B>, name: &str) -> Result<()> {
        let [d_in, d_out] = linear.weight.val().dims();
        let weight = self.tensor(&format!("{name}.weight"), [d_out, d_in])?;
        let bias   = self.tensor(&format!("{name}.bias"), [d_out])?;
        linear.weight = Param::from_tensor(weight.transpose());
        linear.bias   = Some(Param::from_tensor(bias));
        Ok(())
    }

    fn embedding(&self, embedding: &mut Embedding<B>, name: &str) -> Result<()> {
        let dims = embedding.weight.val().dims();
        embedding.weight = Param::from_tensor(self.tensor(&format!("{name}.weight"), dims)?);
        Ok(())
    }

    fn layer_norm(&self, norm: &mut LayerNorm<B>, name: &str) -> Result<()> {
        let dims = norm.gamma.val().dims();
        norm.gamma = Param::from_tensor(self.tensor(&format!("{name}.weight"), dims)?);
        norm.beta  = Param::from_tensor(self.tensor(&format!("{name}.bias"), dims)?);
        Ok(())
    }
}

/// Decode little-endian F32 / F16 / BF16 data
fn to_f32(view: &TensorView<'_>) -> Result<Vec<f32>> {
    let data = view.data();
    let values = match view.dtype() {
        Dtype::F32 => data
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
        Dtype::F16 => data
            .chunks_exact(2)
            .map(|c| half::f16::from_bits(u16::from_le_bytes([c[0], c[1]])).to_f32())
            .collect(),
        Dtype::BF16 => data
            .chunks_exact(2)
            .map(|c| half::bf16::from_bits(u16::from_le_bytes([c[0], c[1]])).to_f32())
            .collect(),
        other => bail!("unsupported dtype {other:?}"),
    };
    Ok(values)
}
