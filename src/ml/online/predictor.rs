use std::path::Path;

use super::model_file::{ModelEntry, ModelFileError, read_model};
use super::scorer::{Prediction, select_top_two};
use super::Lexicon;
use super::weights::WeightTable;
use crate::ml::sparse::{Feature, NamedFeature, dot};

/// Read-only classifier over an exported weight table.
///
/// Label and feature ids follow first appearance in the model file.
#[derive(Debug, Clone, Default)]
pub struct Predictor {
    lexicon: Lexicon,
    weights: WeightTable,
}

impl Predictor {
    /// Load a model file written by a learner's `save`.
    pub fn load(path: &Path) -> Result<Self, ModelFileError> {
        let entries = read_model(path)?;
        let predictor = Self::from_entries(&entries);
        tracing::info!(
            "Loaded model {} ({} labels, {} features, {} weights)",
            path.display(),
            predictor.lexicon.labels.len(),
            predictor.lexicon.features.len(),
            entries.len()
        );
        Ok(predictor)
    }

    pub fn from_entries(entries: &[ModelEntry]) -> Self {
        let mut predictor = Self::default();
        for entry in entries {
            let label = predictor.lexicon.labels.intern(&entry.label);
            let feature = predictor.lexicon.features.intern(&entry.feature);
            predictor.weights.set(label, feature, entry.weight);
        }
        predictor
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn predict_id(&self, features: &[Feature]) -> Prediction {
        let scores = (0..self.weights.labels()).map(|label| dot(self.weights.row(label), features));
        select_top_two(scores)
    }

    /// Predict a label name and score; unknown features are dropped.
    pub fn predict(&self, features: &[NamedFeature]) -> Option<(String, f64)> {
        let resolved = self.lexicon.lookup(features);
        let prediction = self.predict_id(&resolved);
        self.lexicon
            .labels
            .name(prediction.best_id)
            .map(|label| (label.to_string(), prediction.best_score))
    }
}
