// ============================================================
// Layer 2 — PreprocessUseCase
// ============================================================
// Writes a cleaned copy of the corpus for inspection:
//
//   Tweet,Hate,Fake,…            Processed_Tweet,Hate,Fake,…
//   "RT @x So FAKE!! …",0,1  ─▶  fake,0,1
//
// The cleaned column goes first, the raw text column is dropped
// and every other column keeps its order.

use anyhow::{Context, Result};
use std::path::Path;

use crate::data::{
    loader::{ColumnSpec, CsvLoader, Table},
    preprocessor::Preprocessor,
};

/// Longest cell shown by `preview` before it is cut with "..."
const PREVIEW_WIDTH: usize = 40;

pub struct PreprocessUseCase {
    input:           String,
    output:          String,
    text_column:     String,
    extra_stopwords: Vec<String>,
}

impl PreprocessUseCase {
    pub fn new(input: String, output: String, text_column: String) -> Self {
        Self { input, output, text_column, extra_stopwords: Vec::new() }
    }

    pub fn with_extra_stopwords(mut self, words: Vec<String>) -> Self {
        self.extra_stopwords = words;
        self
    }

    /// Clean the text column, write the new CSV and return it
    pub fn execute(&self) -> Result<Table> {
        let columns = ColumnSpec { text: self.text_column.clone(), ..ColumnSpec::default() };
        let table   = CsvLoader::new(&self.input, columns).load_table()?;

        let preprocessor = Preprocessor::new().with_extra_stopwords(&self.extra_stopwords);
        let processed    = process_table(&table, &self.text_column, &preprocessor)?;
        write_table(&processed, Path::new(&self.output))?;

        tracing::info!(
            "Wrote {} processed rows to '{}'",
            processed.rows.len(),
            self.output
        );
        Ok(processed)
    }
}

/// Name of the cleaned column for a given text column
pub fn processed_column(text_column: &str) -> String {
    format!("Processed_{text_column}")
}

/// Replace `text_column` with its cleaned version, moved to the front
pub fn process_table(table: &Table, text_column: &str, preprocessor: &Preprocessor) -> Result<Table> {
    let text_idx = table.column(text_column)?;

    let mut headers = vec![processed_column(text_column)];
    headers.extend(
        table.headers.iter().enumerate()
            .filter(|(i, _)| *i != text_idx)
            .map(|(_, h)| h.clone()),
    );

    let rows = table
        .rows
        .iter()
        .map(|row| {
            let mut out = vec![preprocessor.clean_opt(row.get(text_idx).map(String::as_str))];
            out.extend(
                (0..table.headers.len())
                    .filter(|i| *i != text_idx)
                    .map(|i| row.get(i).cloned().unwrap_or_default()),
            );
            out
        })
        .collect();

    Ok(Table { headers, rows })
}

pub fn write_table(table: &Table, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create '{}'", parent.display()))?;
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Cannot create CSV '{}'", path.display()))?;
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// First `n` rows as an aligned text table with a row index
pub fn preview(table: &Table, n: usize) -> String {
    let cut = |cell: &str| -> String {
        if cell.chars().count() > PREVIEW_WIDTH {
            let head: String = cell.chars().take(PREVIEW_WIDTH - 3).collect();
            format!("{head}...")
        } else {
            cell.to_string()
        }
    };

    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .take(n)
        .map(|r| (0..table.headers.len()).map(|i| cut(r.get(i).map(String::as_str).unwrap_or(""))).collect())
        .collect();

    let index_width = rows.len().saturating_sub(1).to_string().len();
    let widths: Vec<usize> = table
        .headers
        .iter()
        .enumerate()
        .map(|(i, h)| rows.iter().map(|r| r[i].chars().count()).fold(h.chars().count(), usize::max))
        .collect();

    let line = |index: &str, cells: &[String]| -> String {
        let mut s = format!("{index:<index_width$}");
        for (cell, w) in cells.iter().zip(&widths) {
            s.push_str(&format!("  {cell:<w$}"));
        }
        s.trim_end().to_string()
    };

    let mut out = vec![line("", &table.headers)];
    out.extend(rows.iter().enumerate().map(|(i, r)| line(&i.to_string(), r)));
    out.join("\n")
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table {
            headers: vec!["Id".into(), "Tweet".into(), "Hate".into(), "Fake".into()],
            rows: vec![
                vec!["1".into(), "The vaccine is a HOAX!! http://t.co/x".into(), "0".into(), "1".into()],
                vec!["2".into(), "@user you people are vermin #ban".into(), "1".into(), "0".into()],
                // Short row: missing text and labels
                vec!["3".into()],
            ],
        }
    }

    #[test]
    fn test_processed_column_first_and_raw_text_dropped() {
        let out = process_table(&table(), "Tweet", &Preprocessor::new()).unwrap();
        assert_eq!(out.headers, vec!["Processed_Tweet", "Id", "Hate", "Fake"]);
        assert_eq!(out.rows[0], vec!["vaccine hoax", "1", "0", "1"]);
        assert_eq!(out.rows[1], vec!["people vermin", "2", "1", "0"]);
        assert_eq!(out.rows[2], vec!["", "3", "", ""]);
    }

    #[test]
    fn test_unknown_text_column() {
        let err = process_table(&table(), "Text", &Preprocessor::new()).unwrap_err();
        assert!(err.to_string().contains("Text"));
    }

    #[test]
    fn test_execute_writes_csv() {
        let dir   = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, "Tweet,Hate,Fake\n\"Hello, World 42!\",0,1\n").unwrap();
        let output = dir.path().join("out").join("processed.csv");

        let use_case = PreprocessUseCase::new(
            input.to_string_lossy().into_owned(),
            output.to_string_lossy().into_owned(),
            "Tweet".to_string(),
        );
        let table = use_case.execute().unwrap();
        assert_eq!(table.rows.len(), 1);

        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(written, "Processed_Tweet,Hate,Fake\nhello world,0,1\n");
    }

    #[test]
    fn test_execute_drops_extra_stopwords() {
        let dir   = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, "Tweet,Hate,Fake\nRT Hello World,0,1\n").unwrap();
        let output = dir.path().join("processed.csv");

        let table = PreprocessUseCase::new(
            input.to_string_lossy().into_owned(),
            output.to_string_lossy().into_owned(),
            "Tweet".to_string(),
        )
        .with_extra_stopwords(vec!["rt".to_string(), "World".to_string()])
        .execute()
        .unwrap();
        assert_eq!(table.rows[0][0], "hello");
    }

    #[test]
    fn test_preview_aligns_and_limits_rows() {
        let out = process_table(&table(), "Tweet", &Preprocessor::new()).unwrap();
        let text = preview(&out, 2);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "   Processed_Tweet  Id  Hate  Fake");
        assert_eq!(lines[1], "0  vaccine hoax     1   0     1");
    }

    #[test]
    fn test_preview_truncates_long_cells() {
        let t = Table { headers: vec!["Text".into()], rows: vec![vec!["x".repeat(60)]] };
        let text = preview(&t, 5);
        assert!(text.lines().nth(1).unwrap().ends_with("..."));
        assert_eq!(text.lines().nth(1).unwrap().chars().count(), 1 + 2 + PREVIEW_WIDTH);
    }
}
