// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the labelled CSV         (Layer 4 - data)
//   Step 2: Clean every post              (Layer 4 - data)
//   Step 3: Seeded train/test split       (Layer 4 - data)
//   Step 4: Resolve + save the tokenizer  (Layer 6 - infra)
//   Step 5: Encode posts into samples     (Layer 4 - data)
//   Step 6: Resolve both encoders         (Layer 6 - infra)
//   Step 7: Check the architecture fits   (Layer 5 - ml)
//   Step 8: Save configs                  (Layer 6 - infra)
//   Step 9: Run training loop             (Layer 5 - ml)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::{
    dataset::TextDataset,
    encoder::SequenceEncoder,
    loader::{ColumnSpec, CsvLoader},
    preprocessor::Preprocessor,
    splitter::split_train_test,
};
use crate::domain::{post::Post, traits::RecordSource};
use crate::infra::{
    checkpoint::CheckpointManager,
    hub::ModelFetcher,
    tokenizer_store::{is_uncased, TokenizerStore},
};
use crate::ml::{
    bert::BertConfig,
    lora::LoraConfig,
    model::DualEncoderConfig,
    trainer::{run_training, TrainingSummary},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a run needs. Saved as train_config.json so `evaluate`
// can rebuild the same preprocessing, tokenisation and split.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub data_path:        String,
    pub text_column:      String,
    pub hate_column:      String,
    pub fake_column:      String,
    pub checkpoint_dir:   String,
    pub hate_model:       String,
    pub fake_model:       String,
    pub tokenizer:        String,
    pub hub_cache_dir:    Option<String>,
    pub max_length:       usize,
    pub train_batch_size: usize,
    pub eval_batch_size:  usize,
    pub epochs:           usize,
    pub lr:               f64,
    pub lora_rank:        usize,
    pub lora_alpha:       f64,
    pub lora_dropout:     f64,
    pub test_fraction:    f64,
    pub seed:             u64,
    /// Corpus-specific words dropped on top of the English stopwords
    pub extra_stopwords:  Vec<String>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        let columns = ColumnSpec::default();
        Self {
            data_path:        "data/translatedDataset(Task_A).csv".to_string(),
            text_column:      columns.text,
            hate_column:      columns.hate,
            fake_column:      columns.fake,
            checkpoint_dir:   "checkpoints".to_string(),
            hate_model:       "Hate-speech-CNERG/dehatebert-mono-english".to_string(),
            fake_model:       "bert-base-uncased".to_string(),
            tokenizer:        "bert-base-uncased".to_string(),
            hub_cache_dir:    None,
            max_length:       128,
            train_batch_size: 16,
            eval_batch_size:  32,
            epochs:           5,
            lr:               1e-5,
            lora_rank:        8,
            lora_alpha:       16.0,
            lora_dropout:     0.1,
            test_fraction:    0.2,
            seed:             42,
            extra_stopwords:  Vec::new(),
        }
    }
}

impl TrainConfig {
    pub fn columns(&self) -> ColumnSpec {
        ColumnSpec {
            text: self.text_column.clone(),
            hate: self.hate_column.clone(),
            fake: self.fake_column.clone(),
        }
    }

    pub fn lora(&self) -> LoraConfig {
        LoraConfig::new()
            .with_rank(self.lora_rank)
            .with_alpha(self.lora_alpha)
            .with_dropout(self.lora_dropout)
    }

    /// The cleaning pipeline shared by `train` and `evaluate`
    pub fn preprocessor(&self) -> Preprocessor {
        Preprocessor::new().with_extra_stopwords(&self.extra_stopwords)
    }

    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            bail!("epochs must be at least 1");
        }
        if self.train_batch_size == 0 || self.eval_batch_size == 0 {
            bail!("batch sizes must be positive");
        }
        if !(self.lr > 0.0) {
            bail!("learning rate must be positive, got {}", self.lr);
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            bail!("test_fraction must be in (0, 1), got {}", self.test_fraction);
        }
        if self.max_length < 2 {
            bail!("max_length must be at least 2, got {}", self.max_length);
        }
        self.lora().validate()
    }
}

/// Load the CSV named by `cfg` and clean every post's text
pub fn load_processed_posts(cfg: &TrainConfig) -> Result<Vec<Post>> {
    tracing::info!("Loading posts from '{}'", cfg.data_path);
    let preprocessor = cfg.preprocessor();
    let posts = CsvLoader::new(&cfg.data_path, cfg.columns()).load_all()?;
    if posts.is_empty() {
        bail!("No labelled posts found in '{}'", cfg.data_path);
    }

    let posts: Vec<Post> = posts
        .iter()
        .map(|p| p.with_text(preprocessor.clean(&p.text)))
        .collect();
    let empty = posts.iter().filter(|p| p.text.is_empty()).count();
    if empty > 0 {
        tracing::debug!("{} posts are empty after cleaning", empty);
    }
    Ok(posts)
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainingSummary> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Steps 1-2: Load and clean ─────────────────────────────────────────
        let posts = load_processed_posts(cfg)?;

        // ── Step 3: Train / test split ────────────────────────────────────────
        let (train_posts, test_posts) = split_train_test(posts, cfg.test_fraction, cfg.seed);
        tracing::info!("Split: {} train, {} test", train_posts.len(), test_posts.len());
        if train_posts.is_empty() {
            bail!("Training split is empty; add more rows or lower test_fraction");
        }

        // ── Step 4: Tokenizer ─────────────────────────────────────────────────
        let fetcher   = ModelFetcher::new(cfg.hub_cache_dir.as_ref().map(PathBuf::from));
        let tok_file  = fetcher.tokenizer(&cfg.tokenizer)?;
        let tokenizer = TokenizerStore::new(&cfg.checkpoint_dir)
            .prepare(&tok_file, is_uncased(&cfg.tokenizer))?;

        // ── Step 5: Encode ────────────────────────────────────────────────────
        let encoder       = SequenceEncoder::new(tokenizer, cfg.max_length)?;
        let train_dataset = TextDataset::new(encoder.encode_posts(&train_posts)?);
        let test_dataset  = TextDataset::new(encoder.encode_posts(&test_posts)?);

        // ── Steps 6-7: Encoders and architecture checks ───────────────────────
        let hate_files = fetcher.encoder(&cfg.hate_model)?;
        let fake_files = fetcher.encoder(&cfg.fake_model)?;
        let model_cfg = DualEncoderConfig {
            hate: BertConfig::from_file(&hate_files.config)?,
            fake: BertConfig::from_file(&fake_files.config)?,
            lora: cfg.lora(),
        };
        model_cfg.validate()?;
        model_cfg.check_inputs(encoder.vocab_size(), cfg.max_length)?;

        // ── Step 8: Save configs for evaluation ───────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir)?;
        ckpt_manager.save_config(cfg)?;
        ckpt_manager.save_model_config(&model_cfg)?;

        // ── Step 9: Training loop (Layer 5) ───────────────────────────────────
        run_training(
            cfg,
            &model_cfg,
            &hate_files,
            &fake_files,
            train_dataset,
            test_dataset,
            &ckpt_manager,
        )
    }
}
