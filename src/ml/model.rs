use std::path::PathBuf;

use anyhow::{bail, Result};
use burn::{
    nn::{loss::BinaryCrossEntropyLossConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::sigmoid,
};
use serde::{Deserialize, Serialize};

use crate::data::batcher::TextBatch;
use crate::ml::bert::{BertConfig, BertEncoder};
use crate::ml::lora::LoraConfig;
use crate::ml::weights;

/// Architecture of both encoders plus the shared adapter settings.
/// Saved next to checkpoints so the model can be rebuilt without the hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DualEncoderConfig {
    pub hate: BertConfig,
    pub fake: BertConfig,
    pub lora: LoraConfig,
}

/// Local files for one pretrained encoder
#[derive(Debug, Clone)]
pub struct PretrainedFiles {
    pub config:  PathBuf,
    pub weights: PathBuf,
}

impl DualEncoderConfig {
    pub fn validate(&self) -> Result<()> {
        self.hate.validate()?;
        self.fake.validate()?;
        self.lora.validate()
    }

    /// Check that sequences from a tokenizer fit both encoders
    pub fn check_inputs(&self, tokenizer_vocab: usize, max_length: usize) -> Result<()> {
        for (name, cfg) in [("hate", &self.hate), ("fake", &self.fake)] {
            if tokenizer_vocab > cfg.vocab_size {
                bail!(
                    "Tokenizer has {} tokens but the {} encoder only embeds {}",
                    tokenizer_vocab, name, cfg.vocab_size
                );
            }
            if max_length > cfg.max_position_embeddings {
                bail!(
                    "max_length {} exceeds the {} encoder's {} positions",
                    max_length, name, cfg.max_position_embeddings
                );
            }
        }
        Ok(())
    }

    /// Randomly initialised model (weights to be loaded from a record)
    pub fn init<B: Backend>(&self, device: &B::Device) -> DualEncoderClassifier<B> {
        DualEncoderClassifier::new(
            self.hate.init(&self.lora, device),
            self.fake.init(&self.lora, device),
            device,
        )
    }

    /// Model with pretrained encoders, frozen backbones and fresh adapters/heads
    pub fn init_pretrained<B: Backend>(
        &self,
        hate_files: &PretrainedFiles,
        fake_files: &PretrainedFiles,
        device:     &B::Device,
    ) -> Result<DualEncoderClassifier<B>> {
        let hate = weights::load_encoder(self.hate.init(&self.lora, device), &self.hate, &hate_files.weights, device)?;
        let fake = weights::load_encoder(self.fake.init(&self.lora, device), &self.fake, &fake_files.weights, device)?;
        Ok(DualEncoderClassifier::new(hate, fake, device).freeze_encoders())
    }
}

// ─── Model ────────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct DualEncoderClassifier<B: Backend> {
    pub hate_encoder: BertEncoder<B>,
    pub fake_encoder: BertEncoder<B>,
    pub hate_head:    Linear<B>,
    pub fake_head:    Linear<B>,
}

/// Raw logits, one per sample and task — shape [batch]
pub struct DualOutput<B: Backend> {
    pub hate_logits: Tensor<B, 1>,
    pub fake_logits: Tensor<B, 1>,
}

impl<B: Backend> DualOutput<B> {
    /// Sigmoid probabilities
    pub fn hate_scores(&self) -> Tensor<B, 1> {
        sigmoid(self.hate_logits.clone())
    }

    pub fn fake_scores(&self) -> Tensor<B, 1> {
        sigmoid(self.fake_logits.clone())
    }
}

impl<B: Backend> DualEncoderClassifier<B> {
    pub fn new(hate_encoder: BertEncoder<B>, fake_encoder: BertEncoder<B>, device: &B::Device) -> Self {
        let hate_head = LinearConfig::new(hate_encoder.hidden_size(), 1).init(device);
        let fake_head = LinearConfig::new(fake_encoder.hidden_size(), 1).init(device);
        Self { hate_encoder, fake_encoder, hate_head, fake_head }
    }

    /// Stop gradients through both pretrained backbones; adapters and heads stay trainable
    pub fn freeze_encoders(self) -> Self {
        Self {
            hate_encoder: self.hate_encoder.freeze(),
            fake_encoder: self.fake_encoder.freeze(),
            ..self
        }
    }

    /// input_ids, attention_mask: [batch, seq] → one logit per task per sample
    pub fn forward(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
    ) -> DualOutput<B> {
        let [batch_size, _] = input_ids.dims();

        let hate_cls = self.hate_encoder.cls(input_ids.clone(), attention_mask.clone());
        let fake_cls = self.fake_encoder.cls(input_ids, attention_mask);

        DualOutput {
            hate_logits: self.hate_head.forward(hate_cls).reshape([batch_size]),
            fake_logits: self.fake_head.forward(fake_cls).reshape([batch_size]),
        }
    }

    /// Loss = BCE(hate) + BCE(fake), each averaged over the batch
    pub fn forward_loss(&self, batch: TextBatch<B>) -> (Tensor<B, 1>, DualOutput<B>) {
        let output = self.forward(batch.input_ids, batch.attention_mask);
        let bce = BinaryCrossEntropyLossConfig::new()
            .with_logits(true)
            .init(&output.hate_logits.device());

        let loss = bce.forward(output.hate_logits.clone(), batch.hate_labels)
                 + bce.forward(output.fake_logits.clone(), batch.fake_labels);
        (loss, output)
    }

    /// Parameters that receive gradients: adapters in both encoders plus both heads
    pub fn trainable_params(&self) -> usize {
        self.hate_encoder.adapter_params()
            + self.fake_encoder.adapter_params()
            + self.hate_head.num_params()
            + self.fake_head.num_params()
    }
}
