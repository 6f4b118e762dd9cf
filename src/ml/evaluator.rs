// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Runs the classifier over an evaluation loader without
// gradients and turns the scores into one classification
// report per task.
//
//   logits ──sigmoid──▶ score ──(> 0.5)──▶ predicted label
//
// The same routine serves the per-epoch evaluation inside the
// training loop (on the inner backend of model.valid()) and the
// standalone `evaluate` command.

use anyhow::{bail, Result};
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    prelude::*,
};

use crate::data::{
    batcher::{TextBatch, TextBatcher},
    dataset::TextDataset,
};
use crate::domain::{report::ClassificationReport, task::Task};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{DualEncoderClassifier, DualEncoderConfig};

type EvalBackend = burn::backend::Wgpu;

pub const THRESHOLD: f32 = 0.5;

/// Reports for both tasks plus the mean evaluation loss
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub hate: ClassificationReport,
    pub fake: ClassificationReport,
    pub loss: f64,
}

impl Evaluation {
    pub fn report(&self, task: Task) -> &ClassificationReport {
        match task {
            Task::Hate => &self.hate,
            Task::Fake => &self.fake,
        }
    }

    pub fn hate_accuracy(&self) -> f64 { self.hate.accuracy }
    pub fn fake_accuracy(&self) -> f64 { self.fake.accuracy }
    pub fn hate_f1(&self) -> f64 { self.hate.positive_f1() }
    pub fn fake_f1(&self) -> f64 { self.fake.positive_f1() }
}

/// Collected labels and thresholded predictions for one task
#[derive(Default)]
struct Predictions {
    labels: Vec<bool>,
    preds:  Vec<bool>,
}

impl Predictions {
    fn extend<B: Backend>(&mut self, scores: Tensor<B, 1>, labels: Tensor<B, 1, Int>) {
        self.preds.extend(scores.into_data().iter::<f32>().map(|s| s > THRESHOLD));
        self.labels.extend(labels.into_data().iter::<i64>().map(|l| l == 1));
    }

    fn report(&self, task: Task) -> ClassificationReport {
        ClassificationReport::from_predictions(&self.labels, &self.preds, task.target_names())
    }
}

/// Evaluate `model` on every batch of `loader`
pub fn evaluate<B: Backend>(
    model:  &DualEncoderClassifier<B>,
    loader: &dyn DataLoader<TextBatch<B>>,
) -> Result<Evaluation> {
    let mut hate = Predictions::default();
    let mut fake = Predictions::default();
    let mut loss_sum = 0.0f64;
    let mut batches  = 0usize;

    for batch in loader.iter() {
        let hate_labels = batch.hate_labels.clone();
        let fake_labels = batch.fake_labels.clone();

        let (loss, output) = model.forward_loss(batch);
        loss_sum += loss.into_scalar().elem::<f64>();
        batches  += 1;

        hate.extend(output.hate_scores(), hate_labels);
        fake.extend(output.fake_scores(), fake_labels);
    }

    if batches == 0 {
        bail!("Evaluation set is empty");
    }

    let evaluation = Evaluation {
        hate: hate.report(Task::Hate),
        fake: fake.report(Task::Fake),
        loss: loss_sum / batches as f64,
    };
    tracing::debug!(
        "Evaluated {} samples in {} batches (loss={:.4})",
        evaluation.hate.total, batches, evaluation.loss
    );
    Ok(evaluation)
}

/// Rebuild the model from `ckpt_manager` on the default GPU device and evaluate it
pub fn run_evaluation(
    model_cfg:    &DualEncoderConfig,
    ckpt_manager: &CheckpointManager,
    epoch:        Option<usize>,
    dataset:      TextDataset,
    batch_size:   usize,
) -> Result<Evaluation> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    evaluate_checkpoint::<EvalBackend>(model_cfg, ckpt_manager, epoch, dataset, batch_size, device)
}

/// Load the record for `epoch` (latest if `None`) into a fresh model and evaluate it
pub fn evaluate_checkpoint<B: Backend>(
    model_cfg:    &DualEncoderConfig,
    ckpt_manager: &CheckpointManager,
    epoch:        Option<usize>,
    dataset:      TextDataset,
    batch_size:   usize,
    device:       B::Device,
) -> Result<Evaluation> {
    let model: DualEncoderClassifier<B> = model_cfg.init(&device);
    let model = ckpt_manager.load_model(model, epoch, &device)?;

    let loader = DataLoaderBuilder::new(TextBatcher::<B>::new(device))
        .batch_size(batch_size)
        .num_workers(1)
        .build(dataset);
    evaluate(&model, loader.as_ref())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::TextSample;
    use crate::ml::model::tests::tiny_dual;
    use burn::backend::NdArray;
    use burn::module::Param;

    type B = NdArray;

    fn samples() -> Vec<TextSample> {
        (0..5)
            .map(|i| TextSample {
                input_ids:      vec![2, 4 + i as u32, 3, 0],
                attention_mask: vec![1, 1, 1, 0],
                hate_label:     i % 2 == 0,
                fake_label:     i < 2,
            })
            .collect()
    }

    /// Force a head to a constant logit by zeroing its weight
    fn constant_head(head: &mut burn::nn::Linear<B>, logit: f32, device: &<B as Backend>::Device) {
        let [d_in, d_out] = head.weight.val().dims();
        head.weight = Param::from_tensor(Tensor::zeros([d_in, d_out], device));
        head.bias   = Some(Param::from_tensor(Tensor::full([d_out], logit, device)));
    }

    #[test]
    fn test_counts_every_sample_across_batches() {
        let device = Default::default();
        let model: DualEncoderClassifier<B> = tiny_dual().init(&device);
        let loader = DataLoaderBuilder::new(TextBatcher::<B>::new(device))
            .batch_size(2)
            .build(TextDataset::new(samples()));

        let eval = evaluate(&model, loader.as_ref()).unwrap();
        assert_eq!(eval.hate.total, 5);
        assert_eq!(eval.fake.total, 5);
        assert_eq!(eval.hate.classes[1].support, 3);
        assert_eq!(eval.fake.classes[1].support, 2);
        assert!(eval.loss.is_finite());
    }

    #[test]
    fn test_threshold_applied_to_scores() {
        let device = Default::default();
        let mut model: DualEncoderClassifier<B> = tiny_dual().init(&device);
        // Hate always predicted positive, fake always negative
        constant_head(&mut model.hate_head, 4.0, &device);
        constant_head(&mut model.fake_head, -4.0, &device);

        let loader = DataLoaderBuilder::new(TextBatcher::<B>::new(device))
            .batch_size(4)
            .build(TextDataset::new(samples()));
        let eval = evaluate(&model, loader.as_ref()).unwrap();

        approx::assert_abs_diff_eq!(eval.hate_accuracy(), 0.6, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(eval.hate.classes[1].recall, 1.0, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(eval.fake_accuracy(), 0.6, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(eval.fake_f1(), 0.0, epsilon = 1e-9);
        assert_eq!(eval.report(Task::Fake).target_names[1], "Fake");
    }

    #[test]
    fn test_empty_loader_is_error() {
        let device = Default::default();
        let model: DualEncoderClassifier<B> = tiny_dual().init(&device);
        let loader = DataLoaderBuilder::new(TextBatcher::<B>::new(device))
            .batch_size(2)
            .build(TextDataset::new(Vec::new()));
        assert!(evaluate(&model, loader.as_ref()).is_err());
    }
}
