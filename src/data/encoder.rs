// ============================================================
// Layer 4 — Sequence Encoder
// ============================================================
// Turns cleaned post text into fixed-length BERT inputs.
//
//   text ──WordPiece──▶ [t1, t2, …, tn]
//        ──frame──────▶ [CLS] t1 … tk [SEP] [PAD] … [PAD]
//
// k = min(n, max_length - 2), so a truncated sequence still
// ends with [SEP] before any padding. The attention mask is 1
// for every framed token and 0 for padding.
//
// Special token ids are looked up by name in the tokenizer
// vocabulary rather than hard-coded, so uncased and cased
// BERT vocabularies both work.

use anyhow::{anyhow, bail, Result};
use tokenizers::Tokenizer;

use crate::data::dataset::TextSample;
use crate::domain::post::Post;

/// Ids of the framing tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTokens {
    pub cls: u32,
    pub sep: u32,
    pub pad: u32,
}

impl SpecialTokens {
    pub fn from_tokenizer(tokenizer: &Tokenizer) -> Result<Self> {
        let id = |tok: &str| {
            tokenizer
                .token_to_id(tok)
                .ok_or_else(|| anyhow!("Tokenizer vocabulary has no '{tok}' token"))
        };
        Ok(Self { cls: id("[CLS]")?, sep: id("[SEP]")?, pad: id("[PAD]")? })
    }
}

pub struct SequenceEncoder {
    tokenizer:  Tokenizer,
    special:    SpecialTokens,
    max_length: usize,
}

impl SequenceEncoder {
    pub fn new(tokenizer: Tokenizer, max_length: usize) -> Result<Self> {
        if max_length < 2 {
            bail!("max_length must be at least 2 to hold [CLS] and [SEP], got {max_length}");
        }
        let special = SpecialTokens::from_tokenizer(&tokenizer)?;
        Ok(Self { tokenizer, special, max_length })
    }

    /// Vocabulary size including added tokens
    pub fn vocab_size(&self) -> usize {
        self.tokenizer.get_vocab_size(true)
    }

    /// Encode one text into `(input_ids, attention_mask)`
    pub fn encode(&self, text: &str) -> Result<(Vec<u32>, Vec<u32>)> {
        let enc = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| anyhow!("Tokenisation error: {e}"))?;
        Ok(self.frame(enc.get_ids()))
    }

    /// Wrap raw token ids in [CLS] … [SEP] and pad to max_length
    pub fn frame(&self, ids: &[u32]) -> (Vec<u32>, Vec<u32>) {
        let keep = ids.len().min(self.max_length - 2);

        let mut input_ids = Vec::with_capacity(self.max_length);
        input_ids.push(self.special.cls);
        input_ids.extend_from_slice(&ids[..keep]);
        input_ids.push(self.special.sep);

        let mut attention_mask = vec![1u32; input_ids.len()];

        input_ids.resize(self.max_length, self.special.pad);
        attention_mask.resize(self.max_length, 0);

        (input_ids, attention_mask)
    }

    /// Encode every post into a training / evaluation sample
    pub fn encode_posts(&self, posts: &[Post]) -> Result<Vec<TextSample>> {
        let mut samples   = Vec::with_capacity(posts.len());
        let mut truncated = 0usize;

        for post in posts {
            let enc = self
                .tokenizer
                .encode(post.text.as_str(), false)
                .map_err(|e| anyhow!("Tokenisation error: {e}"))?;
            if enc.get_ids().len() > self.max_length - 2 {
                truncated += 1;
            }
            let (input_ids, attention_mask) = self.frame(enc.get_ids());
            samples.push(TextSample {
                input_ids,
                attention_mask,
                hate_label: post.hate,
                fake_label: post.fake,
            });
        }

        if truncated > 0 {
            tracing::debug!(
                "{} of {} posts truncated to {} tokens",
                truncated,
                posts.len(),
                self.max_length
            );
        }
        Ok(samples)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokenizers::models::wordlevel::WordLevel;
    use tokenizers::pre_tokenizers::whitespace::Whitespace;
    use tokenizers::pre_tokenizers::PreTokenizerWrapper;

    /// Tiny word-level tokenizer with BERT-style special tokens
    pub(crate) fn toy_tokenizer() -> Tokenizer {
        let words = ["[PAD]", "[UNK]", "[CLS]", "[SEP]", "fake", "news", "hate", "speech", "spreads"];
        let vocab: HashMap<String, u32> = words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.to_string(), i as u32))
            .collect();
        let model = WordLevel::builder()
            .vocab(vocab)
            .unk_token("[UNK]".to_string())
            .build()
            .unwrap();
        let mut tokenizer = Tokenizer::new(model);
        tokenizer.with_pre_tokenizer(PreTokenizerWrapper::from(Whitespace {}));
        tokenizer
    }

    #[test]
    fn test_special_tokens_lookup() {
        let s = SpecialTokens::from_tokenizer(&toy_tokenizer()).unwrap();
        assert_eq!(s, SpecialTokens { cls: 2, sep: 3, pad: 0 });
    }

    #[test]
    fn test_encode_frames_and_pads() {
        let enc = SequenceEncoder::new(toy_tokenizer(), 6).unwrap();
        let (ids, mask) = enc.encode("fake news").unwrap();
        assert_eq!(ids,  vec![2, 4, 5, 3, 0, 0]);
        assert_eq!(mask, vec![1, 1, 1, 1, 0, 0]);
    }

    #[test]
    fn test_truncation_keeps_sep_last() {
        let enc = SequenceEncoder::new(toy_tokenizer(), 4).unwrap();
        let (ids, mask) = enc.encode("fake news spreads hate").unwrap();
        assert_eq!(ids,  vec![2, 4, 5, 3]);
        assert_eq!(mask, vec![1, 1, 1, 1]);
    }

    #[test]
    fn test_empty_text() {
        let enc = SequenceEncoder::new(toy_tokenizer(), 4).unwrap();
        let (ids, mask) = enc.encode("").unwrap();
        assert_eq!(ids,  vec![2, 3, 0, 0]);
        assert_eq!(mask, vec![1, 1, 0, 0]);
    }

    #[test]
    fn test_unknown_words_map_to_unk() {
        let enc = SequenceEncoder::new(toy_tokenizer(), 5).unwrap();
        let (ids, _) = enc.encode("zebra").unwrap();
        assert_eq!(ids, vec![2, 1, 3, 0, 0]);
    }

    #[test]
    fn test_encode_posts_carries_labels() {
        let enc = SequenceEncoder::new(toy_tokenizer(), 5).unwrap();
        let posts = vec![Post::new("hate speech", true, false), Post::new("news", false, true)];
        let samples = enc.encode_posts(&posts).unwrap();
        assert_eq!(samples.len(), 2);
        assert!(samples[0].hate_label && !samples[0].fake_label);
        assert_eq!(samples[1].input_ids, vec![2, 5, 3, 0, 0]);
    }

    #[test]
    fn test_rejects_tiny_max_length() {
        assert!(SequenceEncoder::new(toy_tokenizer(), 1).is_err());
    }
}
