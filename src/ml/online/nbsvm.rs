use tracing::debug;

use super::naive_bayes::NaiveBayesCounts;
use super::schedule::{TrainerState, UpdatePlan, plan_update};
use super::scorer::{Prediction, select_top_two};
use super::weights::WeightStore;
use super::{Classifier, Lexicon, ModelEntry};
use crate::ml::sparse::{Feature, FeatureVector, NamedFeature, dot};

/// Exponent of the global learning-rate decay.
const LR_EXPONENT: f64 = 0.01;

/// Hyperparameters shared by the online learners.
#[derive(Debug, Clone)]
pub struct NbsvmOptions {
    /// Additive smoothing for the Naive-Bayes ratio.
    pub alpha: f64,
    /// Base learning rate.
    pub eta: f64,
    /// L1 strength per step.
    pub lambda: f64,
    /// Scale each update by the per-weight AdaGrad rate.
    pub adagrad: bool,
    /// Rescale features by the Naive-Bayes factor before scoring.
    pub naive_bayes: bool,
}

impl Default for NbsvmOptions {
    fn default() -> Self {
        Self {
            alpha: 0.01,
            eta: 0.1,
            lambda: 1.0e-8,
            adagrad: true,
            naive_bayes: true,
        }
    }
}

/// Naive-Bayes reweighted linear learner with AdaGrad and lazy L1.
///
/// L1 shrinkage is deferred per weight: before a weight is scored or updated
/// it receives the shrinkage it missed since its last visit, and `export`
/// catches up every stored weight.
#[derive(Debug, Clone)]
pub struct Nbsvm {
    lexicon: Lexicon,
    weights: WeightStore,
    counts: NaiveBayesCounts,
    state: TrainerState,
    options: NbsvmOptions,
}

impl Nbsvm {
    pub fn new(options: NbsvmOptions) -> Self {
        Self {
            lexicon: Lexicon::default(),
            weights: WeightStore::new(),
            counts: NaiveBayesCounts::new(),
            state: TrainerState::new(options.eta),
            options,
        }
    }

    /// Same engine on raw features.
    pub fn svm(options: NbsvmOptions) -> Self {
        Self::new(NbsvmOptions {
            naive_bayes: false,
            ..options
        })
    }

    pub fn options(&self) -> &NbsvmOptions {
        &self.options
    }

    pub fn weights(&self) -> &WeightStore {
        &self.weights
    }

    pub fn counts(&self) -> &NaiveBayesCounts {
        &self.counts
    }

    fn factor(&self, label: usize, feature: usize) -> f64 {
        if self.options.naive_bayes {
            self.counts.factor(label, feature, self.options.alpha)
        } else {
            1.0
        }
    }

    fn reweight(&self, label: usize, features: &[Feature]) -> FeatureVector {
        if self.options.naive_bayes {
            self.counts.reweight(label, features, self.options.alpha)
        } else {
            features.to_vec()
        }
    }

    /// Catch up shrinkage for every query feature under every label.
    fn regularize_query(&mut self, features: &[Feature]) {
        let now = self.state.step();
        for label in 0..self.weights.labels() {
            for feature in features {
                self.weights.regularize(
                    label,
                    feature.id,
                    now,
                    self.options.lambda,
                    self.options.adagrad,
                );
            }
        }
    }

    fn update_from_id(&mut self, label: usize, features: &[Feature], coeff: f64) {
        let scaled = self.reweight(label, features);
        let now = self.state.step();
        for feature in &scaled {
            self.weights.ensure(label, feature.id, now);
            self.weights.regularize(
                label,
                feature.id,
                now,
                self.options.lambda,
                self.options.adagrad,
            );
            let rate = if self.options.adagrad {
                self.weights.adagrad_rate(label, feature.id)
            } else {
                1.0
            };
            let delta = feature.value * coeff * rate;
            self.weights.add_tracked(label, feature.id, delta, now);
        }
    }
}

impl Classifier for Nbsvm {
    fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    fn predict_id(&mut self, features: &[Feature]) -> Prediction {
        self.regularize_query(features);
        let scores: Vec<f64> = (0..self.weights.labels())
            .map(|label| {
                let scaled = self.reweight(label, features);
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
        self.weights.regularize_all(
            self.state.step(),
            self.options.lambda,
            self.options.adagrad,
        );
        self.weights
            .nonzero()
            .filter_map(|(label, feature, weight)| {
                let effective = weight * self.factor(label, feature);
                self.lexicon.entry(label, feature, effective)
            })
            .collect()
    }

    fn steps(&self) -> u64 {
        self.state.step()
    }
}
