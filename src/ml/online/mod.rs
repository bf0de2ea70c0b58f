//! Online multiclass linear learners for sparse text features.
//!
//! Every learner consumes one `(label, features)` pair at a time and keeps
//! its own vocabularies, weights and counters:
//! - [`Nbsvm`]: Naive-Bayes reweighted features, AdaGrad rates and lazy L1.
//!   With reweighting disabled it doubles as the plain SVM learner.
//! - [`NbsvmBasic`]: Naive-Bayes reweighting with a global decayed rate only.
//! - [`Perceptron`]: margin perceptron on raw features.
//!
//! Trained weights are exported as `(label, feature, weight)` triples with
//! any reweighting baked in, so [`Predictor`] can score them with plain dot
//! products.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ml::sparse::{FeatureVector, NamedFeature, lookup_features, resolve_features};
use crate::ml::vocab::Vocabulary;

mod model_file;
mod naive_bayes;
mod nbsvm;
mod nbsvm_basic;
mod perceptron;
mod predictor;
mod schedule;
mod scorer;
mod weights;

pub use model_file::{ModelEntry, ModelFileError, read_model, write_model};
pub use naive_bayes::{MIN_ALPHA, NaiveBayesCounts};
pub use nbsvm::{Nbsvm, NbsvmOptions};
pub use nbsvm_basic::NbsvmBasic;
pub use perceptron::Perceptron;
pub use predictor::Predictor;
pub use schedule::{DIAGNOSTIC_INTERVAL, MARGIN_THRESHOLD, TrainerState, UpdatePlan, plan_update};
pub use scorer::{Prediction, SCORE_FLOOR, select_top_two};
pub use weights::{WeightStore, WeightTable, shrink_toward_zero};

pub use crate::ml::sparse::Feature;

/// Shared surface of the online learners.
pub trait Classifier {
    /// Label and feature vocabularies owned by the learner.
    fn lexicon(&self) -> &Lexicon;

    /// Score already-resolved features against every label.
    fn predict_id(&mut self, features: &[Feature]) -> Prediction;

    /// Learn from one labelled example; unseen names get fresh ids.
    fn train_one(&mut self, label: &str, features: &[NamedFeature]);

    /// Final weights as named triples, zero weights omitted.
    fn export(&mut self) -> Vec<ModelEntry>;

    /// Training examples processed so far, across all epochs.
    fn steps(&self) -> u64;

    /// Predict a label name and its score, ignoring unknown features.
    ///
    /// Returns `None` until at least one label has been seen.
    fn predict(&mut self, features: &[NamedFeature]) -> Option<(String, f64)> {
        let resolved = self.lexicon().lookup(features);
        let prediction = self.predict_id(&resolved);
        self.lexicon()
            .labels
            .name(prediction.best_id)
            .map(|label| (label.to_string(), prediction.best_score))
    }

    /// Export and write the model as a TSV file.
    fn save(&mut self, path: &Path) -> Result<(), ModelFileError> {
        let entries = self.export();
        write_model(path, &entries)
    }
}

/// Label and feature vocabularies of one learner.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    pub labels: Vocabulary,
    pub features: Vocabulary,
}

impl Lexicon {
    /// Resolve a training example, creating ids for anything new.
    pub fn intern_example(
        &mut self,
        label: &str,
        features: &[NamedFeature],
    ) -> (usize, FeatureVector) {
        let label_id = self.labels.intern(label);
        let resolved = resolve_features(&mut self.features, features, true);
        (label_id, resolved)
    }

    /// Resolve query features, dropping names never seen in training.
    pub fn lookup(&self, features: &[NamedFeature]) -> FeatureVector {
        lookup_features(&self.features, features)
    }

    /// Build a named model entry for a stored weight.
    pub fn entry(&self, label: usize, feature: usize, weight: f64) -> Option<ModelEntry> {
        Some(ModelEntry {
            label: self.labels.name(label)?.to_string(),
            feature: self.features.name(feature)?.to_string(),
            weight,
        })
    }
}

/// Learning rule selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    #[default]
    Nbsvm,
    NbsvmBasic,
    Svm,
    Perceptron,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nbsvm => "nbsvm",
            Self::NbsvmBasic => "nbsvm-basic",
            Self::Svm => "svm",
            Self::Perceptron => "perceptron",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "nbsvm" => Ok(Self::Nbsvm),
            "nbsvm-basic" => Ok(Self::NbsvmBasic),
            "svm" => Ok(Self::Svm),
            "perceptron" => Ok(Self::Perceptron),
            other => Err(format!(
                "Unsupported algorithm: {other} (expected nbsvm, nbsvm-basic, svm or perceptron)"
            )),
        }
    }
}

/// Construct a fresh learner for `algorithm`.
pub fn build_classifier(algorithm: Algorithm, options: &NbsvmOptions) -> Box<dyn Classifier> {
    match algorithm {
        Algorithm::Nbsvm => Box::new(Nbsvm::new(options.clone())),
        Algorithm::Svm => Box::new(Nbsvm::svm(options.clone())),
        Algorithm::NbsvmBasic => Box::new(NbsvmBasic::new(options.alpha, options.eta)),
        Algorithm::Perceptron => Box::new(Perceptron::new(options.eta)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_names_round_trip() {
        for algorithm in [
            Algorithm::Nbsvm,
            Algorithm::NbsvmBasic,
            Algorithm::Svm,
            Algorithm::Perceptron,
        ] {
            assert_eq!(algorithm.as_str().parse::<Algorithm>(), Ok(algorithm));
        }
        assert!("bayes".parse::<Algorithm>().is_err());
    }

    #[test]
    fn predict_on_untrained_learner_returns_none() {
        let mut classifier = build_classifier(Algorithm::Nbsvm, &NbsvmOptions::default());
        assert_eq!(classifier.predict(&[NamedFeature::new("x", 1.0)]), None);
    }

    #[test]
    fn every_algorithm_learns_a_separable_pair() {
        let a = vec![NamedFeature::new("x", 1.0)];
        let b = vec![NamedFeature::new("y", 1.0)];
        for algorithm in [
            Algorithm::Nbsvm,
            Algorithm::NbsvmBasic,
            Algorithm::Svm,
            Algorithm::Perceptron,
        ] {
            let mut classifier = build_classifier(algorithm, &NbsvmOptions::default());
            for _ in 0..5 {
                classifier.train_one("A", &a);
                classifier.train_one("B", &b);
            }
            assert_eq!(classifier.steps(), 10);
            let (label, _) = classifier.predict(&a).unwrap();
            assert_eq!(label, "A", "{algorithm}");
            let (label, _) = classifier.predict(&b).unwrap();
            assert_eq!(label, "B", "{algorithm}");
        }
    }
}
