// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Keeps the tokenizer used for training next to the checkpoints
// so `evaluate` encodes text exactly the same way.
//
//   train:    hub / local dir ──▶ Tokenizer ──save──▶ {dir}/tokenizer.json
//   evaluate: {dir}/tokenizer.json ──load──▶ Tokenizer
//
// A source that only ships vocab.txt gets the standard BERT
// pipeline: BertNormalizer (lowercasing for uncased vocabularies)
// → BertPreTokenizer → WordPiece with [UNK].

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tokenizers::{
    models::wordpiece::WordPiece,
    normalizers::{bert::BertNormalizer, NormalizerWrapper},
    pre_tokenizers::{bert::BertPreTokenizer, PreTokenizerWrapper},
    Tokenizer,
};

use crate::infra::hub::TokenizerFile;

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join("tokenizer.json")
    }

    /// Build the tokenizer from `file` and keep a copy in the store
    pub fn prepare(&self, file: &TokenizerFile, lowercase: bool) -> Result<Tokenizer> {
        let tokenizer = match file {
            TokenizerFile::Json(path)  => Self::from_json(path)?,
            TokenizerFile::Vocab(path) => Self::from_vocab(path, lowercase)?,
        };

        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;
        let path = self.path();
        tokenizer
            .save(&path, true)
            .map_err(|e| anyhow!("Cannot save tokenizer to '{}': {e}", path.display()))?;

        tracing::info!(
            "Tokenizer ready ({} tokens), saved to '{}'",
            tokenizer.get_vocab_size(true),
            path.display()
        );
        Ok(tokenizer)
    }

    /// Load the tokenizer saved during training
    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.path();
        Self::from_json(&path).with_context(|| "Have you run 'train' first?")
    }

    fn from_json(path: &Path) -> Result<Tokenizer> {
        Tokenizer::from_file(path)
            .map_err(|e| anyhow!("Cannot load tokenizer from '{}': {}", path.display(), e))
    }

    fn from_vocab(path: &Path, lowercase: bool) -> Result<Tokenizer> {
        let vocab = path
            .to_str()
            .ok_or_else(|| anyhow!("Non UTF-8 vocab path '{}'", path.display()))?;
        let model = WordPiece::from_file(vocab)
            .unk_token("[UNK]".to_string())
            .build()
            .map_err(|e| anyhow!("Cannot read WordPiece vocab '{}': {e}", path.display()))?;

        let mut tokenizer = Tokenizer::new(model);
        tokenizer.with_normalizer(NormalizerWrapper::from(BertNormalizer::new(
            true, true, None, lowercase,
        )));
        tokenizer.with_pre_tokenizer(PreTokenizerWrapper::from(BertPreTokenizer));
        tracing::debug!("Built WordPiece tokenizer from '{}'", path.display());
        Ok(tokenizer)
    }
}

/// Cased checkpoints say so in their name ("bert-base-cased")
pub fn is_uncased(source: &str) -> bool {
    let name = source.to_lowercase();
    name.contains("uncased") || !name.contains("cased")
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn write_vocab(dir: &Path) -> PathBuf {
        let path = dir.join("vocab.txt");
        let words = ["[PAD]", "[UNK]", "[CLS]", "[SEP]", "hello", "world", "fake", "##s", "!"];
        std::fs::write(&path, words.join("\n")).unwrap();
        path
    }

    #[test]
    fn test_vocab_fallback_lowercases_and_splits_wordpieces() {
        let src   = tempfile::tempdir().unwrap();
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        let tok   = store.prepare(&TokenizerFile::Vocab(write_vocab(src.path())), true).unwrap();

        let enc = tok.encode("Hello WORLD fakes!", false).unwrap();
        assert_eq!(enc.get_ids(), &[4, 5, 6, 7, 8]);

        let enc = tok.encode("unknownword", false).unwrap();
        assert_eq!(enc.get_ids(), &[1]);
    }

    #[test]
    fn test_saved_copy_round_trips() {
        let src   = tempfile::tempdir().unwrap();
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        let built = store.prepare(&TokenizerFile::Vocab(write_vocab(src.path())), true).unwrap();
        assert!(store.path().exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded.get_vocab_size(true), built.get_vocab_size(true));
        assert_eq!(
            loaded.encode("hello world", false).unwrap().get_ids(),
            built.encode("hello world", false).unwrap().get_ids()
        );

        // A saved tokenizer.json is also a valid source
        let again = TokenizerStore::new(src.path())
            .prepare(&TokenizerFile::Json(store.path()), true)
            .unwrap();
        assert_eq!(again.token_to_id("world"), Some(5));
    }

    #[test]
    fn test_load_without_training_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TokenizerStore::new(dir.path()).load().is_err());
    }

    #[test]
    fn test_is_uncased() {
        assert!(is_uncased("bert-base-uncased"));
        assert!(is_uncased("Hate-speech-CNERG/dehatebert-mono-english"));
        assert!(!is_uncased("bert-base-cased"));
    }
}
