//! Sparse feature vectors and the dot product against a label's weight row.

use super::vocab::Vocabulary;

/// Resolved `(feature id, value)` pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Feature {
    pub id: usize,
    pub value: f64,
}

impl Feature {
    pub fn new(id: usize, value: f64) -> Self {
        Self { id, value }
    }
}

/// `(feature name, value)` pair as read from a training or query line.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedFeature {
    pub name: String,
    pub value: f64,
}

impl NamedFeature {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Ordered feature list for one example.
///
/// Ids are neither sorted nor deduplicated; every pair contributes on its own.
pub type FeatureVector = Vec<Feature>;

/// Resolve named features against `vocab`.
///
/// With `create` set, unknown names get fresh ids; otherwise they are dropped.
pub fn resolve_features(
    vocab: &mut Vocabulary,
    features: &[NamedFeature],
    create: bool,
) -> FeatureVector {
    let mut out = Vec::with_capacity(features.len());
    for feature in features {
        if let Some(id) = vocab.resolve(&feature.name, create) {
            out.push(Feature::new(id, feature.value));
        }
    }
    out
}

/// Same as [`resolve_features`] without creating ids, for read-only vocabularies.
pub fn lookup_features(vocab: &Vocabulary, features: &[NamedFeature]) -> FeatureVector {
    features
        .iter()
        .filter_map(|feature| {
            vocab
                .get(&feature.name)
                .map(|id| Feature::new(id, feature.value))
        })
        .collect()
}

/// Dot product of a weight row with a sparse vector.
///
/// Ids past the end of `weights` are implicit zeros.
pub fn dot(weights: &[f64], features: &[Feature]) -> f64 {
    let mut sum = 0.0;
    for feature in features {
        if let Some(w) = weights.get(feature.id) {
            sum += w * feature.value;
        }
    }
    sum
}
