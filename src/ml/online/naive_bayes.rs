//! Naive-Bayes occurrence counts and the per-label feature reweighting factor.

use crate::ml::sparse::{Feature, FeatureVector};

/// Smallest smoothing used by [`NaiveBayesCounts::factor`].
///
/// Keeps every denominator positive, so a feature seen only under one label
/// always outranks one that also appears elsewhere.
pub const MIN_ALPHA: f64 = 1.0e-9;

/// Occurrence counts used to derive the NB log-count ratio.
///
/// All counters only ever grow.
#[derive(Debug, Clone, Default)]
pub struct NaiveBayesCounts {
    /// `[label][feature]` occurrences.
    per_label: Vec<Vec<u64>>,
    /// Occurrences of each feature across all labels.
    feature_totals: Vec<u64>,
    /// Examples seen per label.
    label_totals: Vec<u64>,
    /// Examples seen overall.
    examples: u64,
}

impl NaiveBayesCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one training example for `label`.
    ///
    /// Each pair counts once, regardless of its value.
    pub fn observe(&mut self, label: usize, features: &[Feature]) {
        if self.per_label.len() <= label {
            self.per_label.resize_with(label + 1, Vec::new);
        }
        if self.label_totals.len() <= label {
            self.label_totals.resize(label + 1, 0);
        }
        self.label_totals[label] += 1;
        self.examples += 1;

        let row = &mut self.per_label[label];
        for feature in features {
            if row.len() <= feature.id {
                row.resize(feature.id + 1, 0);
            }
            if self.feature_totals.len() <= feature.id {
                self.feature_totals.resize(feature.id + 1, 0);
            }
            row[feature.id] += 1;
            self.feature_totals[feature.id] += 1;
        }
    }

    pub fn count(&self, label: usize, feature: usize) -> u64 {
        self.per_label
            .get(label)
            .and_then(|row| row.get(feature))
            .copied()
            .unwrap_or(0)
    }

    pub fn feature_total(&self, feature: usize) -> u64 {
        self.feature_totals.get(feature).copied().unwrap_or(0)
    }

    pub fn label_total(&self, label: usize) -> u64 {
        self.label_totals.get(label).copied().unwrap_or(0)
    }

    pub fn examples(&self) -> u64 {
        self.examples
    }

    /// Reweighting factor `ln(r + 1)` for `feature` under `label`.
    ///
    /// `r` compares the smoothed rate of the feature inside the label with its
    /// rate outside it. `alpha` is raised to [`MIN_ALPHA`] when smaller.
    pub fn factor(&self, label: usize, feature: usize, alpha: f64) -> f64 {
        let alpha = alpha.max(MIN_ALPHA);
        let c = self.count(label, feature) as f64;
        let all = self.feature_total(feature) as f64;
        let c2 = self.label_total(label) as f64;
        let all2 = self.examples as f64;

        let inside_den = c2 + alpha + c2 * alpha;
        let rest = all2 - c2;
        let outside_den = rest + alpha + rest * alpha;
        let outside_num = all - c + alpha;
        let ratio = ((c + alpha) / inside_den) / (outside_num / outside_den);
        (ratio + 1.0).ln()
    }

    /// Scale every value by the factor for `label`, computed from current counts.
    pub fn reweight(&self, label: usize, features: &[Feature], alpha: f64) -> FeatureVector {
        features
            .iter()
            .map(|f| Feature::new(f.id, f.value * self.factor(label, f.id, alpha)))
            .collect()
    }
}
