// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Fine-tunes the dual classifier with Adam over the LoRA
// adapters and the two heads; the pretrained backbones are
// frozen before the loop starts.
//
// Per epoch:
//   1. Shuffled pass over the training split (batch 16),
//      loss = BCE(hate) + BCE(fake), backward, Adam step
//   2. model.valid() → evaluation on the test split (batch 32)
//   3. metrics.csv row, checkpoint, best-epoch pointer
//
// Burn notes:
//   - Training uses TrainBackend (Autodiff<Wgpu>) for gradients
//   - model.valid() returns the model on the inner backend, so
//     the evaluation batcher uses B::InnerBackend as well
//   - Frozen parameters never reach GradientsParams, so Adam
//     only updates what is still trainable
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam,
//            Hu et al. (2021) LoRA

use anyhow::{bail, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::TextBatcher, dataset::TextDataset};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::evaluator::evaluate;
use crate::ml::model::{DualEncoderClassifier, DualEncoderConfig, PretrainedFiles};

type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Outcome of a finished run
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub best:   EpochMetrics,
    pub epochs: usize,
}

/// Build the model from pretrained files and train it on the default GPU device
pub fn run_training(
    cfg:           &TrainConfig,
    model_cfg:     &DualEncoderConfig,
    hate_files:    &PretrainedFiles,
    fake_files:    &PretrainedFiles,
    train_dataset: TextDataset,
    test_dataset:  TextDataset,
    ckpt_manager:  &CheckpointManager,
) -> Result<TrainingSummary> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);

    let model: DualEncoderClassifier<TrainBackend> =
        model_cfg.init_pretrained(hate_files, fake_files, &device)?;
    tracing::info!(
        "Model ready: {} trainable of {} parameters",
        model.trainable_params(),
        model.num_params()
    );

    let metrics = MetricsLogger::new(ckpt_manager.dir())?;
    train_loop(cfg, model, train_dataset, test_dataset, ckpt_manager, &metrics, device)
}

/// The epoch loop, generic over any autodiff backend
pub fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    mut model:     DualEncoderClassifier<B>,
    train_dataset: TextDataset,
    test_dataset:  TextDataset,
    ckpt_manager:  &CheckpointManager,
    metrics:       &MetricsLogger,
    device:        B::Device,
) -> Result<TrainingSummary> {
    if train_dataset.sample_count() == 0 {
        bail!("Training split is empty; nothing to train on");
    }
    if test_dataset.sample_count() == 0 {
        bail!("Test split is empty; cannot evaluate");
    }

    // ── Adam optimiser (default betas and epsilon) ────────────────────────────
    let mut optim = AdamConfig::new().init();

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_loader = DataLoaderBuilder::new(TextBatcher::<B>::new(device.clone()))
        .batch_size(cfg.train_batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(train_dataset);

    // ── Evaluation data loader (InnerBackend — no autodiff overhead) ──────────
    let test_loader = DataLoaderBuilder::new(TextBatcher::<B::InnerBackend>::new(device))
        .batch_size(cfg.eval_batch_size)
        .num_workers(1)
        .build(test_dataset);

    let mut best: Option<EpochMetrics> = None;

    for epoch in 1..=cfg.epochs {
        // ── Training phase ────────────────────────────────────────────────────
        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;

        for batch in train_loader.iter() {
            let (loss, _) = model.forward_loss(batch);
            loss_sum += loss.clone().into_scalar().elem::<f64>();
            batches  += 1;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }
        let train_loss = loss_sum / batches.max(1) as f64;
        println!("Epoch {}/{}, Loss: {}", epoch, cfg.epochs, train_loss);

        // ── Evaluation phase ──────────────────────────────────────────────────
        let eval = evaluate(&model.valid(), test_loader.as_ref())?;

        println!("Hate Speech Classification Report:");
        println!("{}", eval.hate);
        println!("Fake News Classification Report:");
        println!("{}", eval.fake);
        println!(
            "Epoch {} - Hate F1: {:.4}, Fake F1: {:.4}, Hate Acc: {:.4}, Fake Acc: {:.4}",
            epoch, eval.hate_f1(), eval.fake_f1(), eval.hate_accuracy(), eval.fake_accuracy(),
        );

        let row = EpochMetrics::new(
            epoch,
            train_loss,
            eval.loss,
            eval.hate_accuracy(),
            eval.fake_accuracy(),
            eval.hate_f1(),
            eval.fake_f1(),
        );
        metrics.log(&row)?;

        ckpt_manager.save_model(&model, epoch)?;
        tracing::info!("Checkpoint saved for epoch {}", epoch);

        if best.as_ref().map_or(true, |b| row.is_improvement(b)) {
            ckpt_manager.save_best_epoch(epoch)?;
            tracing::info!("New best epoch {} (mean F1 {:.4})", epoch, row.mean_f1());
            best = Some(row);
        }
    }

    let Some(best) = best else {
        bail!("No epochs were run (epochs = {})", cfg.epochs);
    };
    tracing::info!(
        "Training complete! Best epoch: {} (metrics in '{}')",
        best.epoch,
        metrics.csv_path().display()
    );
    Ok(TrainingSummary { best, epochs: cfg.epochs })
}
