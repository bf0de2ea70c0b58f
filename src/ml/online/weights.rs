//! Per-label sparse weight tables.
//!
//! [`WeightStore`] carries AdaGrad accumulators and lazy L1 timestamps next to
//! each weight; [`WeightTable`] holds weights only, for learners and the
//! predictor that never read the extra state.

/// One label's parallel arrays, always the same length.
#[derive(Debug, Clone, Default)]
struct LabelRow {
    weights: Vec<f64>,
    /// Running sum of squared applied deltas.
    adagrad: Vec<f64>,
    /// Step at which L1 shrinkage was last caught up.
    last_update: Vec<u64>,
}

impl LabelRow {
    fn len(&self) -> usize {
        self.weights.len()
    }

    fn extend_to(&mut self, feature: usize, now: u64) {
        if self.len() <= feature {
            let len = feature + 1;
            self.weights.resize(len, 0.0);
            self.adagrad.resize(len, 0.0);
            self.last_update.resize(len, now);
        }
    }
}

/// Growable weight table indexed by `(label id, feature id)`.
///
/// Untouched entries are implicit zeros. Weights, accumulators and
/// timestamps are extended together, and new slots are stamped with the
/// step at which they were created.
#[derive(Debug, Clone, Default)]
pub struct WeightStore {
    rows: Vec<LabelRow>,
}

impl WeightStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of label rows (`max touched label id + 1`).
    pub fn labels(&self) -> usize {
        self.rows.len()
    }

    /// Weight row for `label`; empty when the label was never written.
    pub fn row(&self, label: usize) -> &[f64] {
        self.rows
            .get(label)
            .map(|row| row.weights.as_slice())
            .unwrap_or(&[])
    }

    pub fn weight(&self, label: usize, feature: usize) -> f64 {
        self.row(label).get(feature).copied().unwrap_or(0.0)
    }

    pub fn accumulator(&self, label: usize, feature: usize) -> f64 {
        self.rows
            .get(label)
            .and_then(|row| row.adagrad.get(feature))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn last_update(&self, label: usize, feature: usize) -> Option<u64> {
        self.rows
            .get(label)
            .and_then(|row| row.last_update.get(feature))
            .copied()
    }

    /// Make `(label, feature)` addressable, growing rows and columns in lock-step.
    pub fn ensure(&mut self, label: usize, feature: usize, now: u64) {
        if self.rows.len() <= label {
            self.rows.resize_with(label + 1, LabelRow::default);
        }
        self.rows[label].extend_to(feature, now);
    }

    /// AdaGrad rate `1 / sqrt(sum_sq + 1)`; 1.0 for untouched entries.
    pub fn adagrad_rate(&self, label: usize, feature: usize) -> f64 {
        1.0 / (self.accumulator(label, feature) + 1.0).sqrt()
    }

    /// Add `delta` to the weight and its square to the accumulator.
    pub fn add_tracked(&mut self, label: usize, feature: usize, delta: f64, now: u64) {
        self.ensure(label, feature, now);
        let row = &mut self.rows[label];
        row.weights[feature] += delta;
        row.adagrad[feature] += delta * delta;
    }

    /// Catch up L1 shrinkage for one entry as if it had been applied every
    /// step since its last update.
    ///
    /// The shrink per step is `lambda * rate`, where `rate` is the entry's
    /// local learning rate. Entries outside the table are implicit zeros and
    /// are left alone.
    pub fn regularize(
        &mut self,
        label: usize,
        feature: usize,
        now: u64,
        lambda: f64,
        adagrad: bool,
    ) {
        let rate = if adagrad {
            self.adagrad_rate(label, feature)
        } else {
            1.0
        };
        let Some(row) = self.rows.get_mut(label) else {
            return;
        };
        if feature >= row.len() {
            return;
        }
        let elapsed = now.saturating_sub(row.last_update[feature]) as f64;
        row.weights[feature] = shrink_toward_zero(row.weights[feature], elapsed * lambda * rate);
        row.last_update[feature] = now;
    }

    /// Catch up L1 shrinkage on every stored entry.
    pub fn regularize_all(&mut self, now: u64, lambda: f64, adagrad: bool) {
        for label in 0..self.rows.len() {
            for feature in 0..self.rows[label].len() {
                self.regularize(label, feature, now, lambda, adagrad);
            }
        }
    }

    /// Non-zero entries as `(label, feature, weight)`, in id order.
    pub fn nonzero(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.rows.iter().enumerate().flat_map(|(label, row)| {
            row.weights
                .iter()
                .enumerate()
                .filter(|(_, w)| **w != 0.0)
                .map(move |(feature, &w)| (label, feature, w))
        })
    }
}

/// Growable table of weights alone, indexed by `(label id, feature id)`.
///
/// Untouched entries are implicit zeros.
#[derive(Debug, Clone, Default)]
pub struct WeightTable {
    rows: Vec<Vec<f64>>,
}

impl WeightTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labels(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, label: usize) -> &[f64] {
        self.rows.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn weight(&self, label: usize, feature: usize) -> f64 {
        self.row(label).get(feature).copied().unwrap_or(0.0)
    }

    fn slot(&mut self, label: usize, feature: usize) -> &mut f64 {
        if self.rows.len() <= label {
            self.rows.resize_with(label + 1, Vec::new);
        }
        let row = &mut self.rows[label];
        if row.len() <= feature {
            row.resize(feature + 1, 0.0);
        }
        &mut row[feature]
    }

    pub fn add(&mut self, label: usize, feature: usize, delta: f64) {
        *self.slot(label, feature) += delta;
    }

    pub fn set(&mut self, label: usize, feature: usize, weight: f64) {
        *self.slot(label, feature) = weight;
    }

    /// Non-zero entries as `(label, feature, weight)`, in id order.
    pub fn nonzero(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.rows.iter().enumerate().flat_map(|(label, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, weight)| **weight != 0.0)
                .map(move |(feature, weight)| (label, feature, *weight))
        })
    }
}

/// Move `weight` toward zero by `amount`, clipping at zero.
pub fn shrink_toward_zero(weight: f64, amount: f64) -> f64 {
    if weight > 0.0 {
        (weight - amount).max(0.0)
    } else if weight < 0.0 {
        (weight + amount).min(0.0)
    } else {
        weight
    }
}
