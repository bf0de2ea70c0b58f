//! Global trainer counters and the shared mistake/margin update rule.

use super::scorer::Prediction;

/// Correct predictions closer than this still trigger an update.
pub const MARGIN_THRESHOLD: f64 = 1.0;
/// Steps between training diagnostics.
pub const DIAGNOSTIC_INTERVAL: u64 = 500;

/// Timestep and base learning rate owned by one learner.
#[derive(Debug, Clone)]
pub struct TrainerState {
    step: u64,
    eta: f64,
}

impl TrainerState {
    pub fn new(eta: f64) -> Self {
        Self { step: 0, eta }
    }

    /// Number of training examples processed so far.
    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn eta(&self) -> f64 {
        self.eta
    }

    /// Decayed rate `(eta / (1 + eta * t)) ^ exponent`.
    pub fn learning_rate(&self, exponent: f64) -> f64 {
        (self.eta / (1.0 + self.eta * self.step as f64)).powf(exponent)
    }

    /// Move to the next example.
    pub fn advance(&mut self) {
        self.step += 1;
    }

    pub fn is_diagnostic_step(&self) -> bool {
        self.step % DIAGNOSTIC_INTERVAL == 0
    }
}

/// What a training step should do with the weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePlan {
    /// Correct with a comfortable margin.
    Skip,
    /// Push `promote` up and, when set, `demote` down.
    Adjust {
        promote: usize,
        demote: Option<usize>,
    },
}

/// Decide the update for one example given the prediction made before it.
///
/// A mistake demotes the predicted label; a correct but narrow call demotes
/// the runner-up. The demotion is dropped when it would hit the true label
/// itself, which only happens while fewer than two labels are scored.
pub fn plan_update(prediction: &Prediction, truth: usize) -> UpdatePlan {
    let rival = if prediction.best_id != truth {
        prediction.best_id
    } else if prediction.margin < MARGIN_THRESHOLD {
        prediction.runner_up_id
    } else {
        return UpdatePlan::Skip;
    };
    UpdatePlan::Adjust {
        promote: truth,
        demote: (rival != truth).then_some(rival),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::online::scorer::select_top_two;

    #[test]
    fn learning_rate_decays_slowly() {
        let mut state = TrainerState::new(0.1);
        let first = state.learning_rate(0.01);
        assert!((first - 0.1f64.powf(0.01)).abs() < 1e-12);
        for _ in 0..1_000 {
            state.advance();
        }
        let later = state.learning_rate(0.01);
        assert!(later < first);
        assert!(later > 0.9);
        assert_eq!(state.step(), 1_000);
    }

    #[test]
    fn diagnostics_fire_every_interval() {
        let mut state = TrainerState::new(0.1);
        assert!(state.is_diagnostic_step());
        state.advance();
        assert!(!state.is_diagnostic_step());
    }

    #[test]
    fn mistakes_demote_the_predicted_label() {
        let prediction = select_top_two(vec![3.0, 1.0, 2.0]);
        assert_eq!(
            plan_update(&prediction, 2),
            UpdatePlan::Adjust {
                promote: 2,
                demote: Some(0)
            }
        );
    }

    #[test]
    fn narrow_correct_calls_demote_the_runner_up() {
        let prediction = select_top_two(vec![3.0, 1.0, 2.5]);
        assert_eq!(
            plan_update(&prediction, 0),
            UpdatePlan::Adjust {
                promote: 0,
                demote: Some(2)
            }
        );
    }

    #[test]
    fn wide_margins_skip_the_update() {
        let prediction = select_top_two(vec![3.0, 1.0, 2.0]);
        assert_eq!(plan_update(&prediction, 0), UpdatePlan::Skip);
    }

    #[test]
    fn degenerate_runner_up_is_not_demoted() {
        let prediction = Prediction::empty();
        assert_eq!(
            plan_update(&prediction, 0),
            UpdatePlan::Adjust {
                promote: 0,
                demote: None
            }
        );
    }
}
