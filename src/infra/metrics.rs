// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records one row per training epoch in {dir}/metrics.csv.
//
// Columns:
//   epoch      — epoch number, starting at 1
//   train_loss — mean BCE(hate) + BCE(fake) over training batches
//   test_loss  — the same loss on the test split
//   hate_acc / fake_acc — accuracy at the 0.5 threshold
//   hate_f1  / fake_f1  — F1 of the positive class
//
// Example:
//   epoch,train_loss,test_loss,hate_acc,fake_acc,hate_f1,fake_f1
//   1,1.243100,1.198700,0.712000,0.655000,0.684000,0.601000
//
// The header is written once; later runs append below it.

use anyhow::{Context, Result};
use std::{
    fs::{self, File, OpenOptions},
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

const HEADER: [&str; 7] = [
    "epoch", "train_loss", "test_loss", "hate_acc", "fake_acc", "hate_f1", "fake_f1",
];

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:      usize,
    pub train_loss: f64,
    pub test_loss:  f64,
    pub hate_acc:   f64,
    pub fake_acc:   f64,
    pub hate_f1:    f64,
    pub fake_f1:    f64,
}

impl EpochMetrics {
    pub fn new(
        epoch:      usize,
        train_loss: f64,
        test_loss:  f64,
        hate_acc:   f64,
        fake_acc:   f64,
        hate_f1:    f64,
        fake_f1:    f64,
    ) -> Self {
        Self { epoch, train_loss, test_loss, hate_acc, fake_acc, hate_f1, fake_f1 }
    }

    /// Average of the two positive-class F1 scores
    pub fn mean_f1(&self) -> f64 {
        (self.hate_f1 + self.fake_f1) / 2.0
    }

    /// Better mean F1 than `best`; ties go to the lower test loss
    pub fn is_improvement(&self, best: &EpochMetrics) -> bool {
        let (mine, theirs) = (self.mean_f1(), best.mean_f1());
        mine > theirs || (mine == theirs && self.test_loss < best.test_loss)
    }

    fn csv_record(&self) -> [String; 7] {
        let f = |v: f64| format!("{v:.6}");
        [
            self.epoch.to_string(),
            f(self.train_loss),
            f(self.test_loss),
            f(self.hate_acc),
            f(self.fake_acc),
            f(self.hate_f1),
            f(self.fake_f1),
        ]
    }
}

/// Appends epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create `dir` if needed and write the CSV header if the file is new
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let file = File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            let mut writer = csv::Writer::from_writer(file);
            writer.write_record(HEADER)?;
            writer.flush()?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record(m.csv_record())?;
        writer.flush()?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, test_loss={:.4}",
            m.epoch, m.train_loss, m.test_loss,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_improvement() {
        let best = EpochMetrics::new(1, 1.0, 0.9, 0.7, 0.6, 0.6, 0.5);
        let better = EpochMetrics::new(2, 0.9, 1.0, 0.7, 0.6, 0.7, 0.5);
        let worse  = EpochMetrics::new(3, 0.8, 0.5, 0.7, 0.6, 0.5, 0.5);
        assert!(better.is_improvement(&best));
        assert!(!worse.is_improvement(&best));

        // Equal F1, lower loss wins
        let tie = EpochMetrics { epoch: 4, test_loss: 0.8, ..best.clone() };
        assert!(tie.is_improvement(&best));
        assert!(!best.is_improvement(&best));
    }

    #[test]
    fn test_header_written_once_and_rows_appended() {
        let dir = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&EpochMetrics::new(1, 1.5, 1.25, 0.5, 0.25, 0.4, 0.2)).unwrap();

        // A second logger on the same directory keeps the existing file
        let again = MetricsLogger::new(dir.path()).unwrap();
        again.log(&EpochMetrics::new(2, 1.0, 1.0, 0.75, 0.5, 0.6, 0.4)).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HEADER.join(","));
        assert_eq!(lines[1], "1,1.500000,1.250000,0.500000,0.250000,0.400000,0.200000");
        assert!(lines[2].starts_with("2,1.000000"));
    }

    #[test]
    fn test_rows_read_back_by_column_name() {
        let dir = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&EpochMetrics::new(3, 0.5, 0.75, 0.875, 0.625, 0.5, 0.25)).unwrap();

        let rows: Vec<EpochMetrics> = csv::Reader::from_path(logger.csv_path())
            .unwrap()
            .deserialize()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows, vec![EpochMetrics::new(3, 0.5, 0.75, 0.875, 0.625, 0.5, 0.25)]);
    }
}
