// ============================================================
// Layer 3 — Classification Report
// ============================================================
// Binary classification metrics computed from ground-truth
// labels and thresholded predictions.
//
// For each class c:
//   precision = TP_c / (TP_c + FP_c)
//   recall    = TP_c / (TP_c + FN_c)
//   f1        = 2 · precision · recall / (precision + recall)
//   support   = number of samples whose true label is c
//
// Any ratio with a zero denominator is reported as 0.0.
//
// Summary rows:
//   accuracy     — fraction of exact matches
//   macro avg    — unweighted mean over the two classes
//   weighted avg — mean weighted by support

use std::fmt;

use serde::{Deserialize, Serialize};

/// Metrics for a single class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    pub support:   usize,
}

/// Averaged precision / recall / F1 over both classes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Display names, indexed by label value
    pub target_names: [String; 2],
    /// Per-class metrics, indexed by label value
    pub classes:      [ClassMetrics; 2],
    pub accuracy:     f64,
    pub macro_avg:    AverageMetrics,
    pub weighted_avg: AverageMetrics,
    pub total:        usize,
}

impl ClassificationReport {
    /// Build a report from parallel slices of labels and predictions.
    ///
    /// # Panics
    /// Panics if the two slices have different lengths.
    pub fn from_predictions(labels: &[bool], preds: &[bool], target_names: [&str; 2]) -> Self {
        assert_eq!(
            labels.len(),
            preds.len(),
            "labels ({}) and predictions ({}) must have the same length",
            labels.len(),
            preds.len()
        );

        let counts = Confusion::count(labels, preds);
        let classes = [counts.class_metrics(false), counts.class_metrics(true)];
        let total = labels.len();

        let macro_avg = AverageMetrics {
            precision: (classes[0].precision + classes[1].precision) / 2.0,
            recall:    (classes[0].recall    + classes[1].recall)    / 2.0,
            f1:        (classes[0].f1        + classes[1].f1)        / 2.0,
        };

        let weighted = |f: fn(&ClassMetrics) -> f64| {
            ratio(
                classes.iter().map(|c| f(c) * c.support as f64).sum::<f64>(),
                total as f64,
            )
        };
        let weighted_avg = AverageMetrics {
            precision: weighted(|c| c.precision),
            recall:    weighted(|c| c.recall),
            f1:        weighted(|c| c.f1),
        };

        Self {
            target_names: target_names.map(str::to_string),
            classes,
            accuracy: accuracy(labels, preds),
            macro_avg,
            weighted_avg,
            total,
        }
    }

    /// F1 of the positive class (label 1)
    pub fn positive_f1(&self) -> f64 {
        self.classes[1].f1
    }
}

/// Fraction of positions where prediction equals label. 0.0 for empty input.
pub fn accuracy(labels: &[bool], preds: &[bool]) -> f64 {
    let correct = labels.iter().zip(preds).filter(|(l, p)| l == p).count();
    ratio(correct as f64, labels.len() as f64)
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 { 0.0 } else { num / den }
}

// ─── Confusion counts ─────────────────────────────────────────────────────────
#[derive(Debug, Default, Clone, Copy)]
struct Confusion {
    tp: usize,
    fp: usize,
    tn: usize,
    fn_: usize,
}

impl Confusion {
    fn count(labels: &[bool], preds: &[bool]) -> Self {
        let mut c = Self::default();
        for (&label, &pred) in labels.iter().zip(preds) {
            match (label, pred) {
                (true,  true)  => c.tp  += 1,
                (false, true)  => c.fp  += 1,
                (false, false) => c.tn  += 1,
                (true,  false) => c.fn_ += 1,
            }
        }
        c
    }

    /// Metrics treating `positive` as the class of interest
    fn class_metrics(&self, positive: bool) -> ClassMetrics {
        // For the negative class the roles of the cells swap
        let (tp, fp, fn_) = if positive {
            (self.tp, self.fp, self.fn_)
        } else {
            (self.tn, self.fn_, self.fp)
        };

        let precision = ratio(tp as f64, (tp + fp) as f64);
        let recall    = ratio(tp as f64, (tp + fn_) as f64);
        let f1        = ratio(2.0 * precision * recall, precision + recall);

        ClassMetrics { precision, recall, f1, support: tp + fn_ }
    }
}

// ─── Text rendering ───────────────────────────────────────────────────────────
impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .target_names
            .iter()
            .map(String::len)
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(0);

        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;

        for (name, c) in self.target_names.iter().zip(&self.classes) {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.total
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, self.total
            )?;
        }
        Ok(())
    }
}
