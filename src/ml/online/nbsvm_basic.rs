use tracing::debug;

use super::naive_bayes::NaiveBayesCounts;
use super::schedule::{TrainerState, UpdatePlan, plan_update};
use super::scorer::{Prediction, select_top_two};
use super::weights::WeightTable;
use super::{Classifier, Lexicon, ModelEntry};
use crate::ml::sparse::{Feature, NamedFeature, dot};

const LR_EXPONENT: f64 = 0.01;

/// Naive-Bayes reweighted learner without per-weight rates or regularization.
///
/// Every update moves a weight by `value * factor * lr`, where `lr` is the
/// global decayed rate.
#[derive(Debug, Clone)]
pub struct NbsvmBasic {
    lexicon: Lexicon,
    weights: WeightTable,
    counts: NaiveBayesCounts,
    state: TrainerState,
    alpha: f64,
}

impl NbsvmBasic {
    pub fn new(alpha: f64, eta: f64) -> Self {
        Self {
            lexicon: Lexicon::default(),
            weights: WeightTable::new(),
            counts: NaiveBayesCounts::new(),
            state: TrainerState::new(eta),
            alpha,
        }
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    fn update_from_id(&mut self, label: usize, features: &[Feature], coeff: f64) {
        let scaled = self.counts.reweight(label, features, self.alpha);
        for feature in &scaled {
            self.weights.add(label, feature.id, feature.value * coeff);
        }
    }
}

impl Classifier for NbsvmBasic {
    fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    fn predict_id(&mut self, features: &[Feature]) -> Prediction {
        let scores: Vec<f64> = (0..self.weights.labels())
            .map(|label| {
                let scaled = self.counts.reweight(label, features, self.alpha);
                dot(self.weights.row(label), &scaled)
            })
            .collect();
        select_top_two(scores)
    }

    fn train_one(&mut self, label: &str, features: &[NamedFeature]) {
        let (truth, resolved) = self.lexicon.intern_example(label, features);
        let prediction = self.predict_id(&resolved);
        self.counts.observe(truth, &resolved);

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
            .filter_map(|(label, feature, weight)| {
                let effective = weight * self.counts.factor(label, feature, self.alpha);
                self.lexicon.entry(label, feature, effective)
            })
            .collect()
    }

    fn steps(&self) -> u64 {
        self.state.step()
    }
}
