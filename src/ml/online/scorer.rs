//! Best / runner-up selection over per-label scores.

/// Starting score for both slots, so a lone label still has a runner-up.
pub const SCORE_FLOOR: f64 = f64::MIN;

/// Outcome of scoring one feature vector against every label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub best_id: usize,
    pub best_score: f64,
    pub runner_up_id: usize,
    pub runner_up_score: f64,
    /// `best_score - runner_up_score`.
    pub margin: f64,
}

impl Prediction {
    /// Result for a model with no scored labels.
    pub fn empty() -> Self {
        Self {
            best_id: 0,
            best_score: SCORE_FLOOR,
            runner_up_id: 0,
            runner_up_score: SCORE_FLOOR,
            margin: 0.0,
        }
    }
}

/// Pick the best and second-best scores, visiting labels in id order.
///
/// Only a strictly greater score takes a slot, so the first label seen wins
/// ties. A new best demotes the previous best into the runner-up slot.
pub fn select_top_two<I>(scores: I) -> Prediction
where
    I: IntoIterator<Item = f64>,
{
    let mut out = Prediction::empty();
    for (id, score) in scores.into_iter().enumerate() {
        if score > out.best_score {
            out.runner_up_id = out.best_id;
            out.runner_up_score = out.best_score;
            out.best_id = id;
            out.best_score = score;
        } else if score > out.runner_up_score {
            out.runner_up_id = id;
            out.runner_up_score = score;
        }
    }
    out.margin = out.best_score - out.runner_up_score;
    out
}
