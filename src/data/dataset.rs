use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One tokenised and padded post with both labels.
/// Sequence format: [CLS] tokens [SEP] [PAD]...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSample {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub hate_label:     bool,
    pub fake_label:     bool,
}

pub struct TextDataset {
    samples: Vec<TextSample>,
}

impl TextDataset {
    pub fn new(samples: Vec<TextSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl Dataset<TextSample> for TextDataset {
    fn get(&self, index: usize) -> Option<TextSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
