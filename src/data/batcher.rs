// ============================================================
// Layer 4 — Text Batcher
// ============================================================
// Implements Burn's Batcher trait to stack TextSamples into
// device tensors.
//
//   Input:  Vec of N TextSamples, each padded to length S
//   Output: TextBatch with
//             input_ids / attention_mask : [N, S]  Int
//             hate_labels / fake_labels  : [N]     Int (0 or 1)
//
// Sequences are pre-padded by the SequenceEncoder, so the
// batcher only has to flatten and reshape.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::TextSample;

/// A batch of posts ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct TextBatch<B: Backend> {
    /// Token ids — shape: [batch_size, seq_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// 1 = real token, 0 = padding — shape: [batch_size, seq_len]
    pub attention_mask: Tensor<B, 2, Int>,

    /// Hate-speech targets — shape: [batch_size]
    pub hate_labels: Tensor<B, 1, Int>,

    /// Fake-news targets — shape: [batch_size]
    pub fake_labels: Tensor<B, 1, Int>,
}

/// Holds the target device so tensors land on the right GPU/CPU.
#[derive(Clone, Debug)]
pub struct TextBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> TextBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<TextSample, TextBatch<B>> for TextBatcher<B> {
    fn batch(&self, items: Vec<TextSample>) -> TextBatch<B> {
        let batch_size = items.len();
        let seq_len    = items.first().map(|s| s.input_ids.len()).unwrap_or(0);

        // Burn Int tensors are built from i32 here
        let input_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.input_ids.iter().map(|&x| x as i32))
            .collect();

        let mask_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.attention_mask.iter().map(|&x| x as i32))
            .collect();

        let hate: Vec<i32> = items.iter().map(|s| s.hate_label as i32).collect();
        let fake: Vec<i32> = items.iter().map(|s| s.fake_label as i32).collect();

        let input_ids = Tensor::<B, 1, Int>::from_ints(
            input_flat.as_slice(), &self.device
        ).reshape([batch_size, seq_len]);

        let attention_mask = Tensor::<B, 1, Int>::from_ints(
            mask_flat.as_slice(), &self.device
        ).reshape([batch_size, seq_len]);

        let hate_labels = Tensor::<B, 1, Int>::from_ints(hate.as_slice(), &self.device);
        let fake_labels = Tensor::<B, 1, Int>::from_ints(fake.as_slice(), &self.device);

        TextBatch {
            input_ids,
            attention_mask,
            hate_labels,
            fake_labels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray;

    #[test]
    fn test_batch_shapes_and_values() {
        let items = vec![
            TextSample {
                input_ids:      vec![2, 4, 3, 0],
                attention_mask: vec![1, 1, 1, 0],
                hate_label:     true,
                fake_label:     false,
            },
            TextSample {
                input_ids:      vec![2, 5, 6, 3],
                attention_mask: vec![1, 1, 1, 1],
                hate_label:     false,
                fake_label:     true,
            },
        ];

        let batch: TextBatch<B> = TextBatcher::<B>::new(Default::default()).batch(items);

        assert_eq!(batch.input_ids.dims(), [2, 4]);
        assert_eq!(batch.attention_mask.dims(), [2, 4]);
        assert_eq!(batch.hate_labels.dims(), [2]);

        let ids: Vec<i64> = batch
            .input_ids
            .into_data()
            .iter::<i64>()
            .collect();
        assert_eq!(ids, vec![2, 4, 3, 0, 2, 5, 6, 3]);

        let hate: Vec<i64> = batch.hate_labels.into_data().iter::<i64>().collect();
        let fake: Vec<i64> = batch.fake_labels.into_data().iter::<i64>().collect();
        assert_eq!(hate, vec![1, 0]);
        assert_eq!(fake, vec![0, 1]);
    }
}
