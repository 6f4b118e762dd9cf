// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `evaluate` and
// `preprocess`, and all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::{
    evaluate_use_case::EvaluateOptions,
    train_use_case::TrainConfig,
};

/// The top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fine-tune the dual BERT classifier on a labelled CSV
    Train(TrainArgs),

    /// Score a saved checkpoint and print classification reports
    Evaluate(EvaluateArgs),

    /// Write a cleaned copy of the CSV and show the first rows
    Preprocess(PreprocessArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// CSV with a text column and binary Hate / Fake columns
    #[arg(long, default_value = "data/translatedDataset(Task_A).csv")]
    pub data: String,

    #[arg(long, default_value = "Tweet")]
    pub text_column: String,

    #[arg(long, default_value = "Hate")]
    pub hate_column: String,

    #[arg(long, default_value = "Fake")]
    pub fake_column: String,

    /// Directory to save checkpoints, configs, tokenizer and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Hub id or local directory of the hate-speech encoder
    #[arg(long, default_value = "Hate-speech-CNERG/dehatebert-mono-english")]
    pub hate_model: String,

    /// Hub id or local directory of the fake-news encoder
    #[arg(long, default_value = "bert-base-uncased")]
    pub fake_model: String,

    /// Hub id or local directory of the tokenizer shared by both encoders
    #[arg(long, default_value = "bert-base-uncased")]
    pub tokenizer: String,

    /// Cache directory for hub downloads (hf-hub default if unset)
    #[arg(long)]
    pub hub_cache_dir: Option<String>,

    /// Tokens per post including [CLS] and [SEP]
    #[arg(long, default_value_t = 128)]
    pub max_length: usize,

    #[arg(long, default_value_t = 16)]
    pub train_batch_size: usize,

    #[arg(long, default_value_t = 32)]
    pub eval_batch_size: usize,

    #[arg(long, default_value_t = 5)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-5)]
    pub lr: f64,

    /// Rank of the LoRA update on query / key
    #[arg(long, default_value_t = 8)]
    pub lora_rank: usize,

    /// LoRA scaling numerator (update scaled by alpha / rank)
    #[arg(long, default_value_t = 16.0)]
    pub lora_alpha: f64,

    #[arg(long, default_value_t = 0.1)]
    pub lora_dropout: f64,

    /// Share of posts held out for evaluation
    #[arg(long, default_value_t = 0.2)]
    pub test_fraction: f64,

    /// Seed for the split and the training shuffle
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Comma-separated words to drop on top of the English stopwords
    #[arg(long, value_delimiter = ',')]
    pub extra_stopwords: Vec<String>,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_path:        a.data,
            text_column:      a.text_column,
            hate_column:      a.hate_column,
            fake_column:      a.fake_column,
            checkpoint_dir:   a.checkpoint_dir,
            hate_model:       a.hate_model,
            fake_model:       a.fake_model,
            tokenizer:        a.tokenizer,
            hub_cache_dir:    a.hub_cache_dir,
            max_length:       a.max_length,
            train_batch_size: a.train_batch_size,
            eval_batch_size:  a.eval_batch_size,
            epochs:           a.epochs,
            lr:               a.lr,
            lora_rank:        a.lora_rank,
            lora_alpha:       a.lora_alpha,
            lora_dropout:     a.lora_dropout,
            test_fraction:    a.test_fraction,
            seed:             a.seed,
            extra_stopwords:  a.extra_stopwords,
        }
    }
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// CSV to score (defaults to the one used for training)
    #[arg(long)]
    pub data: Option<String>,

    /// Epoch to load (defaults to the latest)
    #[arg(long, conflicts_with = "best")]
    pub epoch: Option<usize>,

    /// Load the epoch with the best mean F1
    #[arg(long)]
    pub best: bool,

    /// Score only the held-out split used during training
    #[arg(long)]
    pub test_split: bool,
}

impl From<EvaluateArgs> for EvaluateOptions {
    fn from(a: EvaluateArgs) -> Self {
        EvaluateOptions {
            checkpoint_dir: a.checkpoint_dir,
            data_path:      a.data,
            epoch:          a.epoch,
            best:           a.best,
            test_split:     a.test_split,
        }
    }
}

/// All arguments for the `preprocess` command
#[derive(Args, Debug)]
pub struct PreprocessArgs {
    #[arg(long, default_value = "data/translatedDataset(Task_A).csv")]
    pub data: String,

    /// Where to write the cleaned CSV
    #[arg(long, default_value = "data/processed.csv")]
    pub output: String,

    #[arg(long, default_value = "Tweet")]
    pub text_column: String,

    /// Rows to print after writing
    #[arg(long, default_value_t = 5)]
    pub head: usize,

    /// Comma-separated words to drop on top of the English stopwords
    #[arg(long, value_delimiter = ',')]
    pub extra_stopwords: Vec<String>,
}
