// ============================================================
// Layer 5 — LoRA Adapter
// ============================================================
// Low-Rank Adaptation (Hu et al., 2021) of a frozen Linear:
//
//   y = W·x + b  +  (α / r) · B·A·dropout(x)
//
//   W, b : pretrained projection, frozen
//   A    : [d_in → r]   Kaiming-uniform init
//   B    : [r → d_out]  zero init
//
// Because B starts at zero, a fresh adapter returns exactly the
// pretrained output; training only moves the 2·r·d parameters of
// A and B instead of the d² of W.

use anyhow::{bail, Result};
use burn::{
    nn::{Dropout, DropoutConfig, Initializer, Linear, LinearConfig},
    prelude::*,
};

#[derive(Config, Debug)]
pub struct LoraConfig {
    /// Rank r of the update B·A
    #[config(default = 8)]
    pub rank: usize,
    /// Scaling numerator α; the update is multiplied by α / r
    #[config(default = 16.0)]
    pub alpha: f64,
    /// Dropout applied to the adapter input only
    #[config(default = 0.1)]
    pub dropout: f64,
}

impl LoraConfig {
    pub fn scaling(&self) -> f64 {
        self.alpha / self.rank as f64
    }

    pub fn validate(&self) -> Result<()> {
        if self.rank == 0 {
            bail!("LoRA rank must be positive");
        }
        if !(0.0..1.0).contains(&self.dropout) {
            bail!("LoRA dropout must be in [0, 1), got {}", self.dropout);
        }
        Ok(())
    }

    /// Attach a fresh adapter to `base`
    pub fn wrap<B: Backend>(&self, base: Linear<B>, device: &B::Device) -> LoraLinear<B> {
        let [d_in, d_out] = base.weight.val().dims();

        let lora_a = LinearConfig::new(d_in, self.rank)
            .with_bias(false)
            .init(device);
        let lora_b = LinearConfig::new(self.rank, d_out)
            .with_bias(false)
            .with_initializer(Initializer::Zeros)
            .init(device);

        LoraLinear {
            base,
            lora_a,
            lora_b,
            dropout: DropoutConfig::new(self.dropout).init(),
            scaling: self.scaling(),
        }
    }
}

#[derive(Module, Debug)]
pub struct LoraLinear<B: Backend> {
    pub base:    Linear<B>,
    pub lora_a:  Linear<B>,
    pub lora_b:  Linear<B>,
    pub dropout: Dropout,
    pub scaling: f64,
}

impl<B: Backend> LoraLinear<B> {
    pub fn forward<const D: usize>(&self, x: Tensor<B, D>) -> Tensor<B, D> {
        let base   = self.base.forward(x.clone());
        let update = self.lora_b.forward(self.lora_a.forward(self.dropout.forward(x)));
        base + update.mul_scalar(self.scaling)
    }

    /// Stop gradients through the pretrained projection
    pub fn freeze_base(self) -> Self {
        Self { base: self.base.no_grad(), ..self }
    }

    /// Parameters owned by the adapter itself
    pub fn adapter_params(&self) -> usize {
        self.lora_a.num_params() + self.lora_b.num_params()
    }
}
