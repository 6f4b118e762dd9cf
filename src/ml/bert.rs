// ============================================================
// Layer 5 — BERT Encoder with LoRA
// ============================================================
// A BERT encoder laid out like the Hugging Face checkpoint so
// pretrained weights map one-to-one onto its fields.
//
//   input_ids ─▶ word + position + token_type embeddings
//             ─▶ LayerNorm ─▶ dropout
//             ─▶ N × BertLayer
//                   self-attention (query/key carry LoRA adapters)
//                   + residual ─▶ LayerNorm
//                   GELU feed-forward
//                   + residual ─▶ LayerNorm
//             ─▶ last hidden state [batch, seq, hidden]
//
// Padding positions are masked by adding -10000 to their
// attention scores before the softmax, so they receive
// effectively zero weight.

use std::path::Path;

use anyhow::{bail, Context, Result};
use burn::{
    nn::{
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation,
};
use serde::{Deserialize, Serialize};

use crate::ml::lora::{LoraConfig, LoraLinear};

const MASKED_SCORE: f64 = -10000.0;

// ─── Configuration ────────────────────────────────────────────────────────────
// Mirrors the fields of a Hugging Face BERT `config.json`.
// Unknown keys in the file are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BertConfig {
    pub vocab_size:          usize,
    pub hidden_size:         usize,
    pub num_hidden_layers:   usize,
    pub num_attention_heads: usize,
    pub intermediate_size:   usize,
    #[serde(default = "default_max_positions")]
    pub max_position_embeddings: usize,
    #[serde(default = "default_type_vocab_size")]
    pub type_vocab_size: usize,
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps: f64,
    #[serde(default = "default_dropout")]
    pub hidden_dropout_prob: f64,
    #[serde(default = "default_dropout")]
    pub attention_probs_dropout_prob: f64,
    #[serde(default = "default_hidden_act")]
    pub hidden_act: String,
}

fn default_max_positions()   -> usize  { 512 }
fn default_type_vocab_size() -> usize  { 2 }
fn default_layer_norm_eps()  -> f64    { 1e-12 }
fn default_dropout()         -> f64    { 0.1 }
fn default_hidden_act()      -> String { "gelu".to_string() }

impl BertConfig {
    /// Architecture with BERT defaults for everything but the sizes
    pub fn new(
        vocab_size:          usize,
        hidden_size:         usize,
        num_hidden_layers:   usize,
        num_attention_heads: usize,
        intermediate_size:   usize,
    ) -> Self {
        Self {
            vocab_size,
            hidden_size,
            num_hidden_layers,
            num_attention_heads,
            intermediate_size,
            max_position_embeddings:      default_max_positions(),
            type_vocab_size:              default_type_vocab_size(),
            layer_norm_eps:               default_layer_norm_eps(),
            hidden_dropout_prob:          default_dropout(),
            attention_probs_dropout_prob: default_dropout(),
            hidden_act:                   default_hidden_act(),
        }
    }

    /// bert-base-uncased
    pub fn base() -> Self {
        Self::new(30522, 768, 12, 12, 3072)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read model config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&json)
            .with_context(|| format!("Invalid model config '{}'", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_attention_heads == 0 || self.hidden_size % self.num_attention_heads != 0 {
            bail!(
                "hidden_size ({}) must be divisible by num_attention_heads ({})",
                self.hidden_size,
                self.num_attention_heads
            );
        }
        if self.hidden_act != "gelu" {
            bail!("Unsupported hidden_act '{}': only 'gelu' is implemented", self.hidden_act);
        }
        Ok(())
    }

    pub fn head_dim(&self) -> usize {
        self.hidden_size / self.num_attention_heads
    }

    /// Build a randomly initialised encoder with LoRA on query and key
    pub fn init<B: Backend>(&self, lora: &LoraConfig, device: &B::Device) -> BertEncoder<B> {
        let embeddings = BertEmbeddings {
            word:       EmbeddingConfig::new(self.vocab_size, self.hidden_size).init(device),
            position:   EmbeddingConfig::new(self.max_position_embeddings, self.hidden_size).init(device),
            token_type: EmbeddingConfig::new(self.type_vocab_size, self.hidden_size).init(device),
            norm:       self.layer_norm(device),
            dropout:    DropoutConfig::new(self.hidden_dropout_prob).init(),
        };
        let layers = (0..self.num_hidden_layers)
            .map(|_| self.build_layer(lora, device))
            .collect();
        BertEncoder { embeddings, layers }
    }

    fn layer_norm<B: Backend>(&self, device: &B::Device) -> LayerNorm<B> {
        LayerNormConfig::new(self.hidden_size)
            .with_epsilon(self.layer_norm_eps)
            .init(device)
    }

    fn build_layer<B: Backend>(&self, lora: &LoraConfig, device: &B::Device) -> BertLayer<B> {
        let h = self.hidden_size;
        let projection = || LinearConfig::new(h, h).init::<B>(device);

        let attention = BertSelfAttention {
            query:          lora.wrap(projection(), device),
            key:            lora.wrap(projection(), device),
            value:          projection(),
            output:         projection(),
            norm:           self.layer_norm(device),
            attn_dropout:   DropoutConfig::new(self.attention_probs_dropout_prob).init(),
            hidden_dropout: DropoutConfig::new(self.hidden_dropout_prob).init(),
            num_heads:      self.num_attention_heads,
        };
        let feed_forward = BertFeedForward {
            intermediate: LinearConfig::new(h, self.intermediate_size).init(device),
            output:       LinearConfig::new(self.intermediate_size, h).init(device),
            norm:         self.layer_norm(device),
            dropout:      DropoutConfig::new(self.hidden_dropout_prob).init(),
        };
        BertLayer { attention, feed_forward }
    }
}

// ─── Embeddings ───────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct BertEmbeddings<B: Backend> {
    pub word:       Embedding<B>,
    pub position:   Embedding<B>,
    pub token_type: Embedding<B>,
    pub norm:       LayerNorm<B>,
    pub dropout:    Dropout,
}

impl<B: Backend> BertEmbeddings<B> {
    /// input_ids: [batch, seq] → [batch, seq, hidden]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch_size, seq_len] = input_ids.dims();
        let device = input_ids.device();

        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &device)
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        // Single-segment input: every token is segment 0
        let token_types = Tensor::<B, 2, Int>::zeros([batch_size, seq_len], &device);

        let x = self.word.forward(input_ids)
            + self.position.forward(positions)
            + self.token_type.forward(token_types);
        self.dropout.forward(self.norm.forward(x))
    }
}

// ─── Self-attention ───────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct BertSelfAttention<B: Backend> {
    pub query:          LoraLinear<B>,
    pub key:            LoraLinear<B>,
    pub value:          Linear<B>,
    pub output:         Linear<B>,
    pub norm:           LayerNorm<B>,
    pub attn_dropout:   Dropout,
    pub hidden_dropout: Dropout,
    pub num_heads:      usize,
}

impl<B: Backend> BertSelfAttention<B> {
    /// x: [batch, seq, hidden], mask_bias: [batch, 1, 1, seq]
    pub fn forward(&self, x: Tensor<B, 3>, mask_bias: Tensor<B, 4>) -> Tensor<B, 3> {
        let [batch_size, seq_len, hidden] = x.dims();
        let head_dim = hidden / self.num_heads;

        // [batch, seq, hidden] → [batch, heads, seq, head_dim]
        let split_heads = |t: Tensor<B, 3>| {
            t.reshape([batch_size, seq_len, self.num_heads, head_dim])
                .swap_dims(1, 2)
        };

        let q = split_heads(self.query.forward(x.clone()));
        let k = split_heads(self.key.forward(x.clone()));
        let v = split_heads(self.value.forward(x.clone()));

        let scores = q
            .matmul(k.swap_dims(2, 3))
            .div_scalar((head_dim as f64).sqrt())
            + mask_bias.expand([batch_size, self.num_heads, seq_len, seq_len]);
        let probs = self.attn_dropout.forward(activation::softmax(scores, 3));

        let context = probs
            .matmul(v)
            .swap_dims(1, 2)
            .reshape([batch_size, seq_len, hidden]);

        let out = self.hidden_dropout.forward(self.output.forward(context));
        self.norm.forward(x + out)
    }

    fn freeze(self) -> Self {
        Self {
            query:  self.query.freeze_base(),
            key:    self.key.freeze_base(),
            value:  self.value.no_grad(),
            output: self.output.no_grad(),
            norm:   self.norm.no_grad(),
            ..self
        }
    }
}

// ─── Feed-forward ─────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct BertFeedForward<B: Backend> {
    pub intermediate: Linear<B>,
    pub output:       Linear<B>,
    pub norm:         LayerNorm<B>,
    pub dropout:      Dropout,
}

impl<B: Backend> BertFeedForward<B> {
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let h   = activation::gelu(self.intermediate.forward(x.clone()));
        let out = self.dropout.forward(self.output.forward(h));
        self.norm.forward(x + out)
    }
}

// ─── Encoder layer ────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct BertLayer<B: Backend> {
    pub attention:    BertSelfAttention<B>,
    pub feed_forward: BertFeedForward<B>,
}

impl<B: Backend> BertLayer<B> {
    pub fn forward(&self, x: Tensor<B, 3>, mask_bias: Tensor<B, 4>) -> Tensor<B, 3> {
        self.feed_forward.forward(self.attention.forward(x, mask_bias))
    }
}

// ─── Encoder ──────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct BertEncoder<B: Backend> {
    pub embeddings: BertEmbeddings<B>,
    pub layers:     Vec<BertLayer<B>>,
}

impl<B: Backend> BertEncoder<B> {
    /// input_ids, attention_mask: [batch, seq] → last hidden state [batch, seq, hidden]
    pub fn forward(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
    ) -> Tensor<B, 3> {
        let [batch_size, seq_len] = attention_mask.dims();

        // 1 → 0.0, 0 → -10000.0
        let mask_bias = attention_mask
            .float()
            .neg()
            .add_scalar(1.0)
            .mul_scalar(MASKED_SCORE)
            .reshape([batch_size, 1, 1, seq_len]);

        let mut x = self.embeddings.forward(input_ids);
        for layer in &self.layers {
            x = layer.forward(x, mask_bias.clone());
        }
        x
    }

    /// Hidden state of the [CLS] position: [batch, hidden]
    pub fn cls(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
    ) -> Tensor<B, 2> {
        let hidden_states = self.forward(input_ids, attention_mask);
        let [batch_size, _, hidden] = hidden_states.dims();
        hidden_states
            .slice([0..batch_size, 0..1, 0..hidden])
            .reshape([batch_size, hidden])
    }

    /// Freeze every pretrained parameter; only LoRA adapters keep gradients
    pub fn freeze(self) -> Self {
        Self {
            embeddings: self.embeddings.no_grad(),
            layers: self
                .layers
                .into_iter()
                .map(|layer| BertLayer {
                    attention:    layer.attention.freeze(),
                    feed_forward: layer.feed_forward.no_grad(),
                })
                .collect(),
        }
    }

    pub fn hidden_size(&self) -> usize {
        self.embeddings.word.weight.val().dims()[1]
    }

    pub fn vocab_size(&self) -> usize {
        self.embeddings.word.weight.val().dims()[0]
    }

    /// Total parameters held by LoRA adapters
    pub fn adapter_params(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.attention.query.adapter_params() + l.attention.key.adapter_params())
            .sum()
    }
}
