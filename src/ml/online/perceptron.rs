use tracing::debug;

use super::schedule::{TrainerState, UpdatePlan, plan_update};
use super::scorer::{Prediction, select_top_two};
use super::weights::WeightTable;
use super::{Classifier, Lexicon, ModelEntry};
use crate::ml::sparse::{Feature, NamedFeature, dot};

const LR_EXPONENT: f64 = 0.1;

/// Multiclass margin perceptron on raw feature values.
///
/// Unlike a plain perceptron it also updates on correct predictions whose
/// margin is below the threshold.
#[derive(Debug, Clone)]
pub struct Perceptron {
    lexicon: Lexicon,
    weights: WeightTable,
    state: TrainerState,
}

impl Perceptron {
    pub fn new(eta: f64) -> Self {
        Self {
            lexicon: Lexicon::default(),
            weights: WeightTable::new(),
            state: TrainerState::new(eta),
        }
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    fn update_from_id(&mut self, label: usize, features: &[Feature], coeff: f64) {
        for feature in features {
            self.weights.add(label, feature.id, feature.value * coeff);
        }
    }
}

impl Classifier for Perceptron {
    fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    fn predict_id(&mut self, features: &[Feature]) -> Prediction {
        let scores = (0..self.weights.labels()).map(|label| dot(self.weights.row(label), features));
        select_top_two(scores)
    }

    fn train_one(&mut self, label: &str, features: &[NamedFeature]) {
        let (truth, resolved) = self.lexicon.intern_example(label, features);
        let prediction = self.predict_id(&resolved);

        let lr = self.state.learning_rate(LR_EXPONENT);
        if self.state.is_diagnostic_step() {
            debug!(
                "step {}: predicted={} truth={} margin={:.2} lr={:.6}",
                self.state.step(),
                prediction.best_id,
                truth,
                prediction.margin,
                lr
            );
        }

        if let UpdatePlan::Adjust { promote, demote } = plan_update(&prediction, truth) {
            self.update_from_id(promote, &resolved, lr);
            if let Some(demote) = demote {
                self.update_from_id(demote, &resolved, -lr);
            }
        }
        self.state.advance();
    }

    fn export(&mut self) -> Vec<ModelEntry> {
        self.weights
            .nonzero()
            .filter_map(|(label, feature, weight)| self.lexicon.entry(label, feature, weight))
            .collect()
    }

    fn steps(&self) -> u64 {
        self.state.step()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mistakes_move_both_labels_by_the_decayed_rate() {
        let mut model = Perceptron::new(0.1);
        model.train_one("A", &[NamedFeature::new("x", 1.0)]);
        model.train_one("B", &[NamedFeature::new("x", 1.0)]);
        let lr0 = 0.1f64.powf(0.1);
        let lr1 = (0.1f64 / 1.1).powf(0.1);
        assert!((model.weights().weight(0, 0) - (lr0 - lr1)).abs() < 1e-12);
        assert!((model.weights().weight(1, 0) - lr1).abs() < 1e-12);
    }

    #[test]
    fn export_keeps_raw_weights() {
        let mut model = Perceptron::new(0.1);
        model.train_one("A", &[NamedFeature::new("x", 3.0)]);
        let entries = model.export();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].label, "A");
        assert_eq!(entries[0].feature, "x");
        assert!((entries[0].weight - 3.0 * 0.1f64.powf(0.1)).abs() < 1e-12);
    }
}
