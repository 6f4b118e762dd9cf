// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores a saved checkpoint on a labelled CSV:
//
//   Step 1: Open the checkpoint dir, read train_config.json
//   Step 2: Load + clean posts (same preprocessing as training)
//   Step 3: Optionally keep only the held-out test split
//   Step 4: Encode with the tokenizer saved at training time
//   Step 5: Rebuild the model and evaluate (Layer 5 - ml)
//
// With `test_split` the seeded split from training is replayed
// on the same CSV, so the numbers match the last epoch report.

use anyhow::{bail, Result};

use crate::data::{
    dataset::TextDataset,
    encoder::SequenceEncoder,
    splitter::split_train_test,
};
use crate::application::train_use_case::load_processed_posts;
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::TokenizerStore};
use crate::ml::{
    evaluator::{run_evaluation, Evaluation},
    model::DualEncoderConfig,
};

#[derive(Debug, Clone)]
pub struct EvaluateOptions {
    pub checkpoint_dir: String,
    /// CSV to score; defaults to the training CSV
    pub data_path:      Option<String>,
    /// Epoch to load; defaults to the latest
    pub epoch:          Option<usize>,
    /// Use the best epoch instead of the latest
    pub best:           bool,
    /// Replay the training split and score only the test part
    pub test_split:     bool,
}

/// Everything read back from a checkpoint directory, ready to score
struct EvaluationInputs {
    ckpt:       CheckpointManager,
    model_cfg:  DualEncoderConfig,
    epoch:      Option<usize>,
    dataset:    TextDataset,
    batch_size: usize,
}

pub struct EvaluateUseCase {
    options: EvaluateOptions,
}

impl EvaluateUseCase {
    pub fn new(options: EvaluateOptions) -> Self {
        Self { options }
    }

    pub fn execute(&self) -> Result<Evaluation> {
        let inputs = self.prepare()?;

        // ── Step 5: Evaluate ──────────────────────────────────────────────────
        run_evaluation(
            &inputs.model_cfg,
            &inputs.ckpt,
            inputs.epoch,
            inputs.dataset,
            inputs.batch_size,
        )
    }

    fn prepare(&self) -> Result<EvaluationInputs> {
        let opts = &self.options;
        if opts.best && opts.epoch.is_some() {
            bail!("--best and --epoch are mutually exclusive");
        }

        // ── Step 1: Saved run settings ────────────────────────────────────────
        let ckpt = CheckpointManager::open(&opts.checkpoint_dir)?;
        let mut cfg = ckpt.load_config()?;
        if let Some(path) = &opts.data_path {
            cfg.data_path = path.clone();
        }

        // ── Steps 2-3: Posts ──────────────────────────────────────────────────
        let posts = load_processed_posts(&cfg)?;
        let posts = if opts.test_split {
            let (_, test) = split_train_test(posts, cfg.test_fraction, cfg.seed);
            test
        } else {
            posts
        };
        tracing::info!("Evaluating on {} posts", posts.len());

        // ── Step 4: Encode ────────────────────────────────────────────────────
        let tokenizer = TokenizerStore::new(&opts.checkpoint_dir).load()?;
        let encoder   = SequenceEncoder::new(tokenizer, cfg.max_length)?;
        let dataset   = TextDataset::new(encoder.encode_posts(&posts)?);

        let epoch     = if opts.best { Some(ckpt.best_epoch()?) } else { opts.epoch };
        let model_cfg = ckpt.load_model_config()?;
        Ok(EvaluationInputs { ckpt, model_cfg, epoch, dataset, batch_size: cfg.eval_batch_size })
    }
}
