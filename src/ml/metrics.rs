//! Evaluation metrics for classifier test runs.

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Outcome counts for a single label.
pub struct LabelStats {
    pub tp: u64,
    pub fp: u64,
    pub fn_: u64,
}

impl LabelStats {
    /// `TP / (TP + FP)`.
    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    /// `TP / (TP + FN)`.
    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    pub fn f1(&self) -> f64 {
        f1_score(self.precision(), self.recall())
    }

    /// Number of examples whose true label is this one.
    pub fn support(&self) -> u64 {
        self.tp + self.fn_
    }
}

/// Running tally of predictions against true labels.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    per_label: BTreeMap<String, LabelStats>,
    correct: u64,
    total: u64,
}

impl Evaluation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one example; `predicted` is `None` when the model had no answer.
    pub fn add(&mut self, truth: &str, predicted: Option<&str>) {
        self.total += 1;
        match predicted {
            Some(predicted) if predicted == truth => {
                self.correct += 1;
                self.per_label.entry(truth.to_string()).or_default().tp += 1;
            }
            Some(predicted) => {
                self.per_label.entry(truth.to_string()).or_default().fn_ += 1;
                self.per_label.entry(predicted.to_string()).or_default().fp += 1;
            }
            None => {
                self.per_label.entry(truth.to_string()).or_default().fn_ += 1;
            }
        }
    }

    pub fn stats(&self, label: &str) -> Option<LabelStats> {
        self.per_label.get(label).copied()
    }

    pub fn correct(&self) -> u64 {
        self.correct
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Fraction of examples predicted correctly; 0 for an empty run.
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct, self.total)
    }

    /// Snapshot with per-label metrics sorted by label name.
    pub fn report(&self) -> EvalReport {
        EvalReport {
            per_label: self
                .per_label
                .iter()
                .map(|(label, stats)| LabelMetric {
                    label: label.clone(),
                    support: stats.support(),
                    tp: stats.tp,
                    fp: stats.fp,
                    fn_: stats.fn_,
                    precision: stats.precision(),
                    recall: stats.recall(),
                    f1: stats.f1(),
                })
                .collect(),
            accuracy: self.accuracy(),
            correct: self.correct,
            total: self.total,
        }
    }
}

/// Serialized evaluation result.
#[derive(Debug, Clone, Serialize)]
pub struct EvalReport {
    pub per_label: Vec<LabelMetric>,
    pub accuracy: f64,
    pub correct: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelMetric {
    pub label: String,
    pub support: u64,
    pub tp: u64,
    pub fp: u64,
    #[serde(rename = "fn")]
    pub fn_: u64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Harmonic mean of precision and recall; 0 when both are 0.
pub fn f1_score(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}
