// ============================================================
// Layer 6 — Model Fetcher
// ============================================================
// Turns a model source into local files.
//
//   "path/to/dir"           → used as is (must contain the files)
//   "org/name" or "name"    → downloaded from the Hugging Face Hub
//                             with the sync hf-hub client, cached
//
// Encoders need config.json + model.safetensors. Tokenizers
// prefer tokenizer.json and fall back to a WordPiece vocab.txt.
//
// Authentication: HF_TOKEN from the environment, if set.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use hf_hub::api::sync::{Api, ApiBuilder};

use crate::ml::model::PretrainedFiles;

pub const CONFIG_FILE:    &str = "config.json";
pub const WEIGHTS_FILE:   &str = "model.safetensors";
pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const VOCAB_FILE:     &str = "vocab.txt";

/// Where a tokenizer definition was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizerFile {
    /// Full Hugging Face tokenizer definition
    Json(PathBuf),
    /// WordPiece vocabulary, one token per line
    Vocab(PathBuf),
}

pub struct ModelFetcher {
    cache_dir: Option<PathBuf>,
    token:     Option<String>,
}

impl ModelFetcher {
    pub fn new(cache_dir: Option<PathBuf>) -> Self {
        Self { cache_dir, token: Self::resolve_token() }
    }

    /// HF_TOKEN, ignoring an empty value
    pub fn resolve_token() -> Option<String> {
        std::env::var("HF_TOKEN").ok().filter(|t| !t.trim().is_empty())
    }

    /// config.json and model.safetensors for one encoder
    pub fn encoder(&self, source: &str) -> Result<PretrainedFiles> {
        let files = PretrainedFiles {
            config:  self.fetch(source, CONFIG_FILE)?,
            weights: self.fetch(source, WEIGHTS_FILE)?,
        };
        tracing::info!("Encoder '{}' resolved to '{}'", source, files.weights.display());
        Ok(files)
    }

    pub fn tokenizer(&self, source: &str) -> Result<TokenizerFile> {
        match self.fetch(source, TOKENIZER_FILE) {
            Ok(path) => Ok(TokenizerFile::Json(path)),
            Err(json_err) => {
                tracing::debug!("No {} for '{}': {:#}", TOKENIZER_FILE, source, json_err);
                let vocab = self.fetch(source, VOCAB_FILE).with_context(|| {
                    format!("'{source}' has neither {TOKENIZER_FILE} nor {VOCAB_FILE}")
                })?;
                Ok(TokenizerFile::Vocab(vocab))
            }
        }
    }

    /// Resolve one file of `source`, locally or from the hub
    pub fn fetch(&self, source: &str, file: &str) -> Result<PathBuf> {
        let local = Path::new(source);
        if local.is_dir() {
            let path = local.join(file);
            if !path.is_file() {
                bail!("'{}' not found in local model directory '{}'", file, local.display());
            }
            return Ok(path);
        }

        tracing::info!("Fetching {}/{} from the Hugging Face Hub", source, file);
        self.api()?
            .model(source.to_string())
            .get(file)
            .map_err(|e| anyhow!("Cannot download '{file}' from '{source}': {e}"))
    }

    fn api(&self) -> Result<Api> {
        let mut builder = ApiBuilder::new().with_token(self.token.clone());
        if let Some(dir) = &self.cache_dir {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create hub cache '{}'", dir.display()))?;
            builder = builder.with_cache_dir(dir.clone());
        }
        builder
            .build()
            .map_err(|e| anyhow!("Failed to initialize HF API: {e}"))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> ModelFetcher {
        ModelFetcher { cache_dir: None, token: None }
    }

    #[test]
    fn test_local_encoder_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{}").unwrap();
        std::fs::write(dir.path().join(WEIGHTS_FILE), b"").unwrap();

        let files = fetcher().encoder(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(files.config, dir.path().join(CONFIG_FILE));
        assert_eq!(files.weights, dir.path().join(WEIGHTS_FILE));
    }

    #[test]
    fn test_local_directory_missing_weights() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{}").unwrap();
        let err = fetcher().encoder(dir.path().to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains(WEIGHTS_FILE));
    }

    #[test]
    fn test_tokenizer_prefers_json_then_vocab() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().to_str().unwrap().to_string();
        std::fs::write(dir.path().join(VOCAB_FILE), "[PAD]\n").unwrap();
        assert_eq!(
            fetcher().tokenizer(&source).unwrap(),
            TokenizerFile::Vocab(dir.path().join(VOCAB_FILE))
        );

        std::fs::write(dir.path().join(TOKENIZER_FILE), "{}").unwrap();
        assert_eq!(
            fetcher().tokenizer(&source).unwrap(),
            TokenizerFile::Json(dir.path().join(TOKENIZER_FILE))
        );
    }

    #[test]
    fn test_local_tokenizer_missing_everything() {
        let dir = tempfile::tempdir().unwrap();
        assert!(fetcher().tokenizer(dir.path().to_str().unwrap()).is_err());
    }
}
