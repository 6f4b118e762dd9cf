// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model code lives here. Other layers hand in
// datasets and get back reports, checkpoints and metrics.
//
//   lora.rs      — Low-rank adapter around a frozen Linear
//
//   bert.rs      — BERT encoder (embeddings, self-attention
//                  with LoRA on query/key, GELU feed-forward,
//                  post-LayerNorm residuals)
//
//   weights.rs   — Imports Hugging Face safetensors into the
//                  encoder
//
//   model.rs     — Two encoders, one per task, each with a
//                  single-logit head on the [CLS] vector;
//                  summed binary cross-entropy loss
//
//   trainer.rs   — Adam training loop with per-epoch
//                  evaluation, metrics and checkpoints
//
//   evaluator.rs — Thresholded predictions and per-task
//                  classification reports
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Devlin et al. (2019) BERT
//            Hu et al. (2021) LoRA

/// Low-rank adapters
pub mod lora;

/// BERT encoder architecture
pub mod bert;

/// Pretrained weight import
pub mod weights;

/// Dual-encoder hate / fake classifier
pub mod model;

/// Training loop with evaluation and checkpointing
pub mod trainer;

/// Evaluation and classification reports
pub mod evaluator;
