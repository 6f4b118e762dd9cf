// ============================================================
// Layer 4 — CSV Loader
// ============================================================
// Reads the labelled corpus from a CSV file with a header row.
//
// Expected layout (column order does not matter):
//
//   Tweet,Hate,Fake
//   "some post text, possibly with commas",1,0
//   another post,0,1
//
// The three column names are configurable. Any further columns
// are ignored by `load_all` and preserved by `load_table`.
//
// Labels are accepted as 0/1, 0.0/1.0 or true/false. A row
// whose label can't be read is skipped with a warning.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::post::Post;
use crate::domain::traits::RecordSource;

/// Names of the columns holding text and the two labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub text: String,
    pub hate: String,
    pub fake: String,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            text: "Tweet".to_string(),
            hate: "Hate".to_string(),
            fake: "Fake".to_string(),
        }
    }
}

/// The raw CSV contents: header names plus every row as strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows:    Vec<Vec<String>>,
}

impl Table {
    /// Index of a named column, or an error listing what exists
    pub fn column(&self, name: &str) -> Result<usize> {
        match self.headers.iter().position(|h| h == name) {
            Some(i) => Ok(i),
            None => bail!(
                "Column '{}' not found; available columns: {}",
                name,
                self.headers.join(", ")
            ),
        }
    }
}

pub struct CsvLoader {
    path:    PathBuf,
    columns: ColumnSpec,
}

impl CsvLoader {
    pub fn new(path: impl Into<PathBuf>, columns: ColumnSpec) -> Self {
        Self { path: path.into(), columns }
    }

    /// Read the whole file into a `Table`
    pub fn load_table(&self) -> Result<Table> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("Cannot open CSV '{}'", self.path.display()))?;

        let headers: Vec<String> = reader
            .headers()
            .with_context(|| format!("Cannot read CSV header of '{}'", self.path.display()))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record.with_context(|| {
                // +2: one for the header, one for 1-based line numbers
                format!("Malformed CSV record at line {} of '{}'", i + 2, self.path.display())
            })?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        tracing::debug!("Read {} rows from '{}'", rows.len(), self.path.display());
        Ok(Table { headers, rows })
    }
}

impl RecordSource for CsvLoader {
    fn load_all(&self) -> Result<Vec<Post>> {
        let table = self.load_table()?;

        let text_idx = table.column(&self.columns.text)?;
        let hate_idx = table.column(&self.columns.hate)?;
        let fake_idx = table.column(&self.columns.fake)?;

        let mut posts   = Vec::with_capacity(table.rows.len());
        let mut skipped = 0usize;

        for (i, row) in table.rows.iter().enumerate() {
            let cell = |idx: usize| row.get(idx).map(String::as_str).unwrap_or("");

            let labels = parse_label(cell(hate_idx)).zip(parse_label(cell(fake_idx)));
            match labels {
                Some((hate, fake)) => posts.push(Post::new(cell(text_idx), hate, fake)),
                None => {
                    skipped += 1;
                    tracing::warn!(
                        "Skipping row {}: unreadable labels (hate='{}', fake='{}')",
                        i + 2,
                        cell(hate_idx),
                        cell(fake_idx)
                    );
                }
            }
        }

        tracing::info!(
            "Loaded {} posts from '{}' ({} skipped)",
            posts.len(),
            self.path.display(),
            skipped
        );
        Ok(posts)
    }
}

/// Parse a binary label cell
pub fn parse_label(raw: &str) -> Option<bool> {
    let raw = raw.trim();
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true"  => return Some(true),
        "0" | "false" => return Some(false),
        _ => {}
    }
    match raw.parse::<f64>() {
        Ok(v) if v == 1.0 => Some(true),
        Ok(v) if v == 0.0 => Some(false),
        _ => None,
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_parse_label_variants() {
        assert_eq!(parse_label("1"), Some(true));
        assert_eq!(parse_label(" 0 "), Some(false));
        assert_eq!(parse_label("1.0"), Some(true));
        assert_eq!(parse_label("0.0"), Some(false));
        assert_eq!(parse_label("TRUE"), Some(true));
        assert_eq!(parse_label("2"), None);
        assert_eq!(parse_label(""), None);
        assert_eq!(parse_label("yes"), None);
    }

    #[test]
    fn test_loads_posts_with_quoted_commas() {
        let f = write_csv("Id,Tweet,Hate,Fake\n1,\"hello, world\",1,0\n2,plain,0,1\n");
        let posts = CsvLoader::new(f.path(), ColumnSpec::default()).load_all().unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0], Post::new("hello, world", true, false));
        assert_eq!(posts[1], Post::new("plain", false, true));
    }

    #[test]
    fn test_skips_rows_with_bad_labels() {
        let f = write_csv("Tweet,Hate,Fake\na,1,0\nb,,1\nc,0,0\n");
        let posts = CsvLoader::new(f.path(), ColumnSpec::default()).load_all().unwrap();
        let texts: Vec<_> = posts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "c"]);
    }

    #[test]
    fn test_empty_text_cell_is_kept() {
        let f = write_csv("Tweet,Hate,Fake\n,1,1\n");
        let posts = CsvLoader::new(f.path(), ColumnSpec::default()).load_all().unwrap();
        assert_eq!(posts, vec![Post::new("", true, true)]);
    }

    #[test]
    fn test_missing_column_is_error() {
        let f = write_csv("Text,Hate,Fake\nx,1,0\n");
        let err = CsvLoader::new(f.path(), ColumnSpec::default()).load_all().unwrap_err();
        assert!(err.to_string().contains("Tweet"));
    }

    #[test]
    fn test_custom_column_names() {
        let f = write_csv("body,is_hate,is_fake\nx,1,0\n");
        let spec = ColumnSpec {
            text: "body".into(),
            hate: "is_hate".into(),
            fake: "is_fake".into(),
        };
        let posts = CsvLoader::new(f.path(), spec).load_all().unwrap();
        assert_eq!(posts, vec![Post::new("x", true, false)]);
    }

    #[test]
    fn test_missing_file_is_error() {
        let loader = CsvLoader::new("/definitely/not/here.csv", ColumnSpec::default());
        assert!(loader.load_all().is_err());
    }

    #[test]
    fn test_load_table_keeps_all_columns() {
        let f = write_csv("Id,Tweet,Hate,Fake\n7,x,1,0\n");
        let table = CsvLoader::new(f.path(), ColumnSpec::default()).load_table().unwrap();
        assert_eq!(table.headers, vec!["Id", "Tweet", "Hate", "Fake"]);
        assert_eq!(table.rows, vec![vec!["7", "x", "1", "0"]]);
        assert_eq!(table.column("Hate").unwrap(), 2);
    }
}
