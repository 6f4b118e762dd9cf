// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the raw CSV to device-ready tensor batches.
//
//   corpus.csv
//       │
//       ▼
//   CsvLoader         → reads rows into labelled Posts
//       │
//       ▼
//   Preprocessor      → regex cleaning + stopword filtering
//       │
//       ▼
//   split_train_test  → seeded 80/20 split
//       │
//       ▼
//   SequenceEncoder   → WordPiece ids framed as [CLS] … [SEP] + padding
//       │
//       ▼
//   TextDataset       → implements Burn's Dataset trait
//       │
//       ▼
//   TextBatcher       → stacks samples into tensor batches
//       │
//       ▼
//   DataLoader        → feeds batches to training / evaluation

/// Reads the labelled CSV corpus
pub mod loader;

/// English stopword list
pub mod stopwords;

/// Regex cleaning and stopword filtering
pub mod preprocessor;

/// Tokenisation, truncation and padding
pub mod encoder;

/// Implements Burn's Dataset trait for tokenised posts
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Seeded shuffle and train/test split
pub mod splitter;
