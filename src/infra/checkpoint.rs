// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores the fine-tuned classifier using Burn's
// CompactRecorder, plus the JSON needed to rebuild it.
//
// File layout:
//   checkpoints/
//     train_config.json      ← run settings (data, models, split)
//     model_config.json      ← both BERT configs + LoRA settings
//     model_epoch_1.mpk.gz   ← all parameters after epoch 1
//     model_epoch_2.mpk.gz
//     ...
//     latest_epoch.json      ← last epoch written
//     best_epoch.json        ← epoch with the best mean F1
//     tokenizer.json         ← see TokenizerStore
//     metrics.csv            ← see MetricsLogger
//
// model_config.json lets `evaluate` rebuild the exact
// architecture without contacting the hub; the record then
// overwrites every parameter, frozen backbones included.
//
// CompactRecorder writes half-precision MessagePack, gzipped.
// Loading fails if the architecture doesn't match.

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::{DualEncoderClassifier, DualEncoderConfig};

const TRAIN_CONFIG: &str = "train_config.json";
const MODEL_CONFIG: &str = "model_config.json";
const LATEST_EPOCH: &str = "latest_epoch.json";
const BEST_EPOCH:   &str = "best_epoch.json";

/// Manages saving and loading of model checkpoints.
/// All files are stored in one directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create the manager, creating `dir` if it doesn't exist
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Wrap an existing directory without creating it (for evaluation)
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            anyhow::bail!(
                "Checkpoint directory '{}' does not exist. Have you run 'train' first?",
                dir.display()
            );
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn model_path(&self, epoch: usize) -> PathBuf {
        // The recorder appends .mpk.gz
        self.dir.join(format!("model_epoch_{epoch}"))
    }

    /// Save all parameters for `epoch` and advance latest_epoch.json
    pub fn save_model<B: Backend>(&self, model: &DualEncoderClassifier<B>, epoch: usize) -> Result<()> {
        let path = self.model_path(epoch);
        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        self.write_json(LATEST_EPOCH, &epoch)?;
        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load parameters for `epoch`, or the latest epoch if `None`
    pub fn load_model<B: Backend>(
        &self,
        model:  DualEncoderClassifier<B>,
        epoch:  Option<usize>,
        device: &B::Device,
    ) -> Result<DualEncoderClassifier<B>> {
        let epoch = match epoch {
            Some(e) => e,
            None    => self.latest_epoch()?,
        };
        let path = self.model_path(epoch);
        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;
        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.write_json(TRAIN_CONFIG, cfg)
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        self.read_json(TRAIN_CONFIG)
    }

    pub fn save_model_config(&self, cfg: &DualEncoderConfig) -> Result<()> {
        self.write_json(MODEL_CONFIG, cfg)
    }

    pub fn load_model_config(&self) -> Result<DualEncoderConfig> {
        self.read_json(MODEL_CONFIG)
    }

    pub fn save_best_epoch(&self, epoch: usize) -> Result<()> {
        self.write_json(BEST_EPOCH, &epoch)
    }

    pub fn best_epoch(&self) -> Result<usize> {
        self.read_json(BEST_EPOCH)
    }

    /// Returns an error if training hasn't been run yet.
    pub fn latest_epoch(&self) -> Result<usize> {
        self.read_json(LATEST_EPOCH)
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Wrote '{}'", path.display());
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!("Cannot read '{}'. Have you run 'train' first?", path.display())
            })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed '{}'", path.display()))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::tests::tiny_dual;
    use burn::backend::NdArray;

    type B = NdArray;

    #[test]
    fn test_configs_round_trip() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();

        let cfg = TrainConfig { epochs: 3, seed: 7, ..TrainConfig::default() };
        ckpt.save_config(&cfg).unwrap();
        let loaded = ckpt.load_config().unwrap();
        assert_eq!(loaded.epochs, 3);
        assert_eq!(loaded.seed, 7);

        ckpt.save_model_config(&tiny_dual()).unwrap();
        let model_cfg = ckpt.load_model_config().unwrap();
        assert_eq!(model_cfg.hate.hidden_size, 8);
        assert_eq!(model_cfg.lora.rank, 2);
    }

    #[test]
    fn test_model_round_trip_and_epoch_pointers() {
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path()).unwrap();
        let device = Default::default();

        let first: DualEncoderClassifier<B>  = tiny_dual().init(&device);
        let second: DualEncoderClassifier<B> = tiny_dual().init(&device);
        ckpt.save_model(&first, 1).unwrap();
        ckpt.save_model(&second, 2).unwrap();
        ckpt.save_best_epoch(1).unwrap();
        assert_eq!(ckpt.latest_epoch().unwrap(), 2);
        assert_eq!(ckpt.best_epoch().unwrap(), 1);

        let head = |m: &DualEncoderClassifier<B>| -> Vec<f32> {
            m.fake_head.weight.val().into_data().iter::<f32>().collect()
        };
        let close = |a: &[f32], b: &[f32]| a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-3);

        let latest = ckpt.load_model(tiny_dual().init::<B>(&device), None, &device).unwrap();
        assert!(close(&head(&latest), &head(&second)));

        let best = ckpt.load_model(tiny_dual().init::<B>(&device), Some(1), &device).unwrap();
        assert!(close(&head(&best), &head(&first)));
    }

    #[test]
    fn test_missing_checkpoint_is_error() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        assert!(ckpt.latest_epoch().is_err());
        assert!(ckpt.load_config().is_err());
        assert!(CheckpointManager::open(dir.path().join("nope")).is_err());
    }
}
