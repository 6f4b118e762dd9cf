// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer only talks to these traits, so a
// different corpus format (JSONL, parquet, a database) only
// needs a new implementation, not a new pipeline.

use anyhow::Result;
use crate::domain::post::Post;

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Any component that can produce labelled posts.
///
/// Implementations:
///   - CsvLoader → reads a CSV file with text + two label columns
pub trait RecordSource {
    /// Load every labelled post available from this source.
    fn load_all(&self) -> Result<Vec<Post>>;
}
